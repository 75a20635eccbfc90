// src/network/mod.rs
mod enumerate;
mod types;

pub use enumerate::{enumerate, CLUSTER_SIZE};
pub use types::{NetworkRange, NodeAddress, RangeError};
