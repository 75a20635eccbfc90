// network/types.rs
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::{fmt, net::IpAddr, str::FromStr};

pub type NodeAddress = IpAddr;

/// A CIDR prefix as the operator wrote it.
///
/// The base address keeps any host bits that were supplied (`10.0.0.5/24`
/// starts enumerating after `10.0.0.5`), while membership is always decided
/// against the masked network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRange(IpNet);

impl NetworkRange {
    pub fn base(&self) -> IpAddr {
        self.0.addr()
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.0.contains(addr)
    }
}

impl FromStr for NetworkRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<IpNet>()
            .map(NetworkRange)
            .map_err(|e| RangeError::InvalidCidr {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    InvalidCidr { input: String, reason: String },
    RangeExhausted { address: IpAddr, range: NetworkRange },
    AddressSpaceExhausted { last: IpAddr, range: NetworkRange },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCidr { input, reason } => {
                write!(f, "failed to parse the CIDR {:?}: {}", input, reason)
            }
            Self::RangeExhausted { address, range } => write!(
                f,
                "the CIDR provided is too shallow, {} already does not belong to {}",
                address, range
            ),
            Self::AddressSpaceExhausted { last, range } => write!(
                f,
                "ran out of addresses after {} while enumerating {}",
                last, range
            ),
        }
    }
}

impl std::error::Error for RangeError {}
