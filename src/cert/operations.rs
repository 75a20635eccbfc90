// src/cert/operations.rs

use super::types::{CertificateRequest, IssuancePlan};
use crate::utils::logging::Logger;
use std::path::{Path, PathBuf};
use std::{fmt, io};

#[derive(Debug)]
pub enum CertOperationError {
    IoError(io::Error),
    OpenSsl(openssl::error::ErrorStack),
    CertGeneration(String),
    Verification(String),
}

impl fmt::Display for CertOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO Error: {}", e),
            Self::OpenSsl(e) => write!(f, "OpenSSL Error: {}", e),
            Self::CertGeneration(s) => write!(f, "Certificate Generation Error: {}", s),
            Self::Verification(s) => write!(f, "Verification Error: {}", s),
        }
    }
}

impl std::error::Error for CertOperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
            Self::OpenSsl(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CertOperationError {
    fn from(error: io::Error) -> Self {
        CertOperationError::IoError(error)
    }
}

impl From<openssl::error::ErrorStack> for CertOperationError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        CertOperationError::OpenSsl(error)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub request: CertificateRequest,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// On-disk result of completing a plan.
#[derive(Debug, Clone)]
pub struct IssuedBundle {
    pub root: PathBuf,
    pub ca_cert: PathBuf,
    pub ca_key: PathBuf,
    pub certificates: Vec<IssuedCertificate>,
}

pub trait CertificateSigner {
    /// Creates the CA and every requested leaf under `dir`.
    fn complete(
        &self,
        plan: IssuancePlan,
        dir: &Path,
        logger: &mut dyn Logger,
    ) -> Result<IssuedBundle, CertOperationError>;
}
