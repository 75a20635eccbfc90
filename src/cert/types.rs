// cert/types.rs
use super::scenario::ScenarioId;
use crate::network::NodeAddress;
use serde::{Deserialize, Serialize};
use std::{fmt, net::IpAddr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CertificateRole {
    ClientAuth,
    ServerAuth,
    /// Server certificate that also carries the clientAuth EKU.
    PeerDual,
}

impl CertificateRole {
    pub fn client_auth(&self) -> bool {
        matches!(self, Self::ClientAuth | Self::PeerDual)
    }

    pub fn server_auth(&self) -> bool {
        matches!(self, Self::ServerAuth | Self::PeerDual)
    }

    /// File stem used for the `.crt`/`.key` pair of this role.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::ClientAuth => "client",
            Self::ServerAuth => "server",
            Self::PeerDual => "peer",
        }
    }
}

impl fmt::Display for CertificateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientAuth => write!(f, "client-auth"),
            Self::ServerAuth => write!(f, "server-auth"),
            Self::PeerDual => write!(f, "peer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AltName {
    Dns(String),
    Ip(IpAddr),
}

impl AltName {
    /// Hostnames that parse as IP addresses become IP SANs, the rest DNS SANs.
    pub fn from_hostname(hostname: &str) -> Self {
        match hostname.parse::<IpAddr>() {
            Ok(ip) => AltName::Ip(ip),
            Err(_) => AltName::Dns(hostname.to_string()),
        }
    }
}

impl fmt::Display for AltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AltName::Dns(name) => write!(f, "DNS:{}", name),
            AltName::Ip(ip) => write!(f, "IP:{}", ip),
        }
    }
}

/// One leaf certificate to be issued by the plan's CA.
///
/// The constructors pin down the role shape: client certificates carry a
/// principal and no hostnames, serving certificates the reverse, peer
/// certificates both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateRequest {
    name: String,
    role: CertificateRole,
    validity_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    principal: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    hostnames: Vec<String>,
}

impl CertificateRequest {
    pub fn client(name: impl Into<String>, validity_days: u32, principal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: CertificateRole::ClientAuth,
            validity_days,
            principal: Some(principal.into()),
            hostnames: Vec::new(),
        }
    }

    pub fn serving(name: impl Into<String>, validity_days: u32, hostnames: Vec<String>) -> Self {
        Self {
            name: name.into(),
            role: CertificateRole::ServerAuth,
            validity_days,
            principal: None,
            hostnames,
        }
    }

    pub fn peer(
        name: impl Into<String>,
        validity_days: u32,
        principal: impl Into<String>,
        hostnames: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: CertificateRole::PeerDual,
            validity_days,
            principal: Some(principal.into()),
            hostnames,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> CertificateRole {
        self.role
    }

    pub fn validity_days(&self) -> u32 {
        self.validity_days
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn hostnames(&self) -> &[String] {
        &self.hostnames
    }

    pub fn alt_names(&self) -> Vec<AltName> {
        self.hostnames()
            .iter()
            .map(|h| AltName::from_hostname(h))
            .collect()
    }

    /// Subject CN: the principal when there is one, otherwise the first hostname.
    pub fn common_name(&self) -> &str {
        self.principal()
            .or_else(|| self.hostnames().first().map(String::as_str))
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignerIdentity {
    pub name: String,
    pub validity_days: u32,
}

/// Everything the signer needs for one run. Built once by the planner and
/// handed over by value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuancePlan {
    scenario: ScenarioId,
    signer: SignerIdentity,
    nodes: Vec<NodeAddress>,
    requests: Vec<CertificateRequest>,
}

impl IssuancePlan {
    pub(super) fn new(
        scenario: ScenarioId,
        signer: SignerIdentity,
        nodes: Vec<NodeAddress>,
        requests: Vec<CertificateRequest>,
    ) -> Self {
        Self {
            scenario,
            signer,
            nodes,
            requests,
        }
    }

    pub fn scenario(&self) -> ScenarioId {
        self.scenario
    }

    pub fn signer(&self) -> &SignerIdentity {
        &self.signer
    }

    pub fn nodes(&self) -> &[NodeAddress] {
        &self.nodes
    }

    pub fn requests(&self) -> &[CertificateRequest] {
        &self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_eku_and_file_stem() {
        let cases = [
            (CertificateRole::ClientAuth, true, false, "client"),
            (CertificateRole::ServerAuth, false, true, "server"),
            (CertificateRole::PeerDual, true, true, "peer"),
        ];
        for (role, client, server, stem) in cases {
            assert_eq!(role.client_auth(), client, "{role}");
            assert_eq!(role.server_auth(), server, "{role}");
            assert_eq!(role.file_stem(), stem);
        }
    }

    #[test]
    fn hostnames_split_into_dns_and_ip() {
        let request = CertificateRequest::serving(
            "10.0.0.2-serving",
            10,
            vec!["localhost".into(), "127.0.0.1".into(), "fd00::2".into()],
        );
        assert_eq!(
            request.alt_names(),
            vec![
                AltName::Dns("localhost".into()),
                AltName::Ip("127.0.0.1".parse().unwrap()),
                AltName::Ip("fd00::2".parse().unwrap()),
            ]
        );
        assert_eq!(request.common_name(), "localhost");
        assert_eq!(request.principal(), None);
    }

    #[test]
    fn client_request_has_no_hostnames() {
        let request = CertificateRequest::client("client", 10, "etcd-client");
        assert_eq!(request.role(), CertificateRole::ClientAuth);
        assert_eq!(request.common_name(), "etcd-client");
        assert!(request.hostnames().is_empty());

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("hostnames").is_none());
        assert_eq!(json["principal"], "etcd-client");
    }
}
