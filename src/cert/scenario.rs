// src/cert/scenario.rs
//
// The trust-configuration matrix. Each row lists the leaf certificates every
// node receives; the planner walks the row once per node address.

use super::types::{CertificateRequest, CertificateRole};
use crate::network::NodeAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PEER_LABEL: &str = "peer";
pub const SERVING_LABEL: &str = "serving";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct ScenarioId(u8);

impl ScenarioId {
    pub const DEFAULT: ScenarioId = ScenarioId(1);

    /// Maps any selector to a known scenario. Unknown selectors run scenario 1.
    pub fn from_selector(selector: i64) -> Self {
        if SCENARIOS.iter().any(|s| i64::from(s.id) == selector) {
            ScenarioId(selector as u8)
        } else {
            Self::DEFAULT
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub(super) fn spec(&self) -> &'static ScenarioSpec {
        SCENARIOS
            .iter()
            .find(|s| s.id == self.0)
            .unwrap_or(&SCENARIOS[0])
    }

    pub fn summary(&self) -> &'static str {
        self.spec().summary
    }
}

impl Default for ScenarioId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for ScenarioId {
    fn from(selector: i64) -> Self {
        Self::from_selector(selector)
    }
}

impl From<ScenarioId> for u8 {
    fn from(id: ScenarioId) -> Self {
        id.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) enum Principal {
    NodeAddress,
    Fixed(&'static str),
}

impl Principal {
    fn resolve(&self, addr: &NodeAddress) -> String {
        match self {
            Principal::NodeAddress => addr.to_string(),
            Principal::Fixed(name) => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) enum NodeTemplate {
    Client { label: &'static str, principal: Principal },
    Serving { label: &'static str },
    Peer { label: &'static str, principal: Principal },
}

impl NodeTemplate {
    pub(super) fn label(&self) -> &'static str {
        match self {
            Self::Client { label, .. } | Self::Serving { label } | Self::Peer { label, .. } => {
                *label
            }
        }
    }

    pub(super) fn role(&self) -> CertificateRole {
        match self {
            Self::Client { .. } => CertificateRole::ClientAuth,
            Self::Serving { .. } => CertificateRole::ServerAuth,
            Self::Peer { .. } => CertificateRole::PeerDual,
        }
    }

    pub(super) fn request(&self, addr: &NodeAddress, validity_days: u32) -> CertificateRequest {
        let name = format!("{}-{}", addr, self.label());
        match self {
            Self::Client { principal, .. } => {
                CertificateRequest::client(name, validity_days, principal.resolve(addr))
            }
            Self::Serving { .. } => {
                CertificateRequest::serving(name, validity_days, node_hostnames(addr))
            }
            Self::Peer { principal, .. } => CertificateRequest::peer(
                name,
                validity_days,
                principal.resolve(addr),
                node_hostnames(addr),
            ),
        }
    }
}

fn node_hostnames(addr: &NodeAddress) -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string(), addr.to_string()]
}

#[derive(Debug)]
pub(super) struct ScenarioSpec {
    pub id: u8,
    pub signer_name: &'static str,
    pub summary: &'static str,
    pub templates: &'static [NodeTemplate],
}

impl ScenarioSpec {
    pub(super) fn template(&self, label: &str) -> Option<&NodeTemplate> {
        self.templates.iter().find(|t| t.label() == label)
    }
}

pub(super) static SCENARIOS: [ScenarioSpec; 4] = [
    // Peers present a bare client certificate, so inbound health checks fail
    // with "doesn't contain any IP SANs". Kept on purpose as a negative case.
    ScenarioSpec {
        id: 1,
        signer_name: "etcdsigner-1",
        summary: "peer certs are plain client-auth certs without SANs",
        templates: &[
            NodeTemplate::Client {
                label: PEER_LABEL,
                principal: Principal::NodeAddress,
            },
            NodeTemplate::Serving {
                label: SERVING_LABEL,
            },
        ],
    },
    // Peers present server-only certificates: "incompatible key usage" when
    // the remote side verifies them as TLS clients.
    ScenarioSpec {
        id: 2,
        signer_name: "etcdsigner-2",
        summary: "peer certs are plain server-auth certs",
        templates: &[
            NodeTemplate::Serving {
                label: PEER_LABEL,
            },
            NodeTemplate::Serving {
                label: SERVING_LABEL,
            },
        ],
    },
    // Peer mesh works; the serving certificate still lacks clientAuth, which
    // breaks local clients dialing through it.
    ScenarioSpec {
        id: 3,
        signer_name: "etcdsigner-2",
        summary: "peer certs are server certs with client-auth EKU, serving certs are server-only",
        templates: &[
            NodeTemplate::Peer {
                label: PEER_LABEL,
                principal: Principal::Fixed("etcd-peer"),
            },
            NodeTemplate::Serving {
                label: SERVING_LABEL,
            },
        ],
    },
    ScenarioSpec {
        id: 4,
        signer_name: "etcdsigner-2",
        summary: "peer and serving certs both carry server-auth and client-auth EKU",
        templates: &[
            NodeTemplate::Peer {
                label: PEER_LABEL,
                principal: Principal::Fixed("etcd-peer"),
            },
            NodeTemplate::Peer {
                label: SERVING_LABEL,
                principal: Principal::Fixed("etcd-serving"),
            },
        ],
    },
];
