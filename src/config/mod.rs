mod types;

pub use types::{ConfigError, SignerConfig};
