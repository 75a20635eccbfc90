// src/cert/mod.rs
mod openssl;
mod operations;
mod planner;
mod report;
mod scenario;
mod types;
mod verification;

pub use self::openssl::OpenSslSigner;
pub use operations::{CertOperationError, CertificateSigner};
pub use planner::{ScenarioPlanner, DEFAULT_VALIDITY_DAYS};
pub use report::EnvReport;
pub use scenario::ScenarioId;
pub use verification::verify_bundle;

#[cfg(test)]
pub use operations::IssuedBundle;
#[cfg(test)]
pub use types::IssuancePlan;
