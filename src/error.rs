// src/error.rs
use crate::cert::CertOperationError;
use crate::config::ConfigError;
use crate::network::RangeError;
use std::{fmt, io};

/// Everything that can end a run. None of it is retried: the inputs are
/// deterministic, so a second attempt would fail the same way.
#[derive(Debug)]
pub enum RunError {
    MissingCidr,
    Config(ConfigError),
    Range(RangeError),
    Workdir(io::Error),
    Signer(CertOperationError),
    Output(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCidr => write!(f, "no CIDR provided, pass --network-cidr"),
            Self::Config(e) => write!(f, "{}", e),
            Self::Range(e) => write!(f, "{}", e),
            Self::Workdir(e) => write!(f, "failed to create a new tmp directory: {}", e),
            Self::Signer(e) => write!(f, "failed to generate certificates: {}", e),
            Self::Output(e) => write!(f, "failed to write output: {}", e),
        }
    }
}

impl std::error::Error for RunError {}

impl From<ConfigError> for RunError {
    fn from(error: ConfigError) -> Self {
        RunError::Config(error)
    }
}

impl From<RangeError> for RunError {
    fn from(error: RangeError) -> Self {
        RunError::Range(error)
    }
}

impl From<CertOperationError> for RunError {
    fn from(error: CertOperationError) -> Self {
        RunError::Signer(error)
    }
}
