// config/types.rs
use crate::cert::DEFAULT_VALIDITY_DAYS;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, io, path::PathBuf};

const MIN_KEY_SIZE: u32 = 2048;

#[derive(Debug)]
pub enum ConfigError {
    Io(String, io::Error),
    Parse(String, serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "failed to read config {}: {}", path, e),
            Self::Parse(path, e) => write!(f, "failed to parse config {}: {}", path, e),
            Self::Invalid(reason) => write!(f, "invalid config: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SignerConfig {
    pub validity_days: u32,
    pub key_size: u32,
    pub work_root: String,
    pub work_prefix: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            validity_days: DEFAULT_VALIDITY_DAYS,
            key_size: MIN_KEY_SIZE,
            work_root: "/tmp".to_string(),
            work_prefix: "etcdsigner".to_string(),
        }
    }
}

impl SignerConfig {
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let config_str =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_string(), e))?;
        serde_json::from_str(&config_str).map_err(|e| ConfigError::Parse(path.to_string(), e))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validity_days == 0 {
            return Err(ConfigError::Invalid(
                "validity_days must be at least 1".to_string(),
            ));
        }
        if self.key_size < MIN_KEY_SIZE {
            return Err(ConfigError::Invalid(format!(
                "key_size {} is below {} bits",
                self.key_size, MIN_KEY_SIZE
            )));
        }
        if self.work_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("work_prefix is empty".to_string()));
        }
        Ok(())
    }

    pub fn work_root_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.work_root).to_string())
    }
}
