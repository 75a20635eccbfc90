// src/cert/report.rs
use super::scenario::{PEER_LABEL, SERVING_LABEL};
use super::types::{CertificateRole, IssuancePlan};
use std::{fmt, path::Path};

/// Shell-friendly summary of a run: `CA_PATH=... PEER_FNAME=... PEER_IP0=...`.
///
/// Meant to be captured with `eval` or `export $(...)` by a test harness, not
/// parsed as a stable format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvReport {
    entries: Vec<(String, String)>,
}

impl EnvReport {
    pub fn new(plan: &IssuancePlan, ca_dir: &Path) -> Self {
        let spec = plan.scenario().spec();
        let mut entries = vec![("CA_PATH".to_string(), ca_dir.display().to_string())];

        if let Some(peer) = spec.template(PEER_LABEL) {
            entries.push(("PEER_FNAME".to_string(), peer.role().file_stem().to_string()));
        }
        // harness scripts assume server.crt for serving certs unless told otherwise
        if let Some(serving) = spec.template(SERVING_LABEL) {
            if serving.role() != CertificateRole::ServerAuth {
                entries.push((
                    "SERVING_FNAME".to_string(),
                    serving.role().file_stem().to_string(),
                ));
            }
        }

        for (i, addr) in plan.nodes().iter().enumerate() {
            entries.push((format!("PEER_IP{}", i), addr.to_string()));
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

impl fmt::Display for EnvReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self
            .entries()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::planner::ScenarioPlanner;
    use crate::cert::scenario::ScenarioId;
    use crate::network::NodeAddress;

    fn plan(selector: i64) -> IssuancePlan {
        let nodes: Vec<NodeAddress> = ["10.0.0.2", "10.0.0.3", "10.0.0.4"]
            .iter()
            .map(|a| a.parse().unwrap())
            .collect();
        ScenarioPlanner::default().plan(&nodes, ScenarioId::from_selector(selector))
    }

    #[test]
    fn peer_file_name_follows_the_peer_role() {
        let dir = Path::new("/tmp/etcdsigner123");
        let expected = [(1, "client"), (2, "server"), (3, "peer"), (4, "peer")];
        for (selector, stem) in expected {
            let report = EnvReport::new(&plan(selector), dir);
            assert_eq!(report.entries()[1], ("PEER_FNAME".to_string(), stem.to_string()));
        }
    }

    #[test]
    fn serving_file_name_only_when_unconventional() {
        let dir = Path::new("/tmp/x");
        for selector in 1..=3 {
            let report = EnvReport::new(&plan(selector), dir);
            assert!(report.entries().iter().all(|(k, _)| k != "SERVING_FNAME"));
        }
        let report = EnvReport::new(&plan(4), dir);
        assert!(report
            .entries()
            .contains(&("SERVING_FNAME".to_string(), "peer".to_string())));
    }

    #[test]
    fn renders_single_line() {
        let report = EnvReport::new(&plan(1), Path::new("/tmp/etcdsigner42"));
        assert_eq!(
            report.to_string(),
            "CA_PATH=/tmp/etcdsigner42 PEER_FNAME=client \
             PEER_IP0=10.0.0.2 PEER_IP1=10.0.0.3 PEER_IP2=10.0.0.4"
        );
    }
}
