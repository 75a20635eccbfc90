// src/cert/planner.rs
use super::scenario::ScenarioId;
use super::types::{CertificateRequest, IssuancePlan, SignerIdentity};
use crate::network::NodeAddress;
use std::iter;

pub const CLIENT_REQUEST_NAME: &str = "client";
pub const CLIENT_PRINCIPAL: &str = "etcd-client";
pub const DEFAULT_VALIDITY_DAYS: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioPlanner {
    validity_days: u32,
}

impl Default for ScenarioPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDITY_DAYS)
    }
}

impl ScenarioPlanner {
    pub fn new(validity_days: u32) -> Self {
        Self { validity_days }
    }

    /// Builds the issuance plan for `addresses` under `scenario`.
    ///
    /// The shared operator client comes first, then each node's requests in
    /// address order and table order.
    pub fn plan(&self, addresses: &[NodeAddress], scenario: ScenarioId) -> IssuancePlan {
        let spec = scenario.spec();
        let days = self.validity_days;

        let client = CertificateRequest::client(CLIENT_REQUEST_NAME, days, CLIENT_PRINCIPAL);
        let requests = iter::once(client)
            .chain(addresses.iter().flat_map(|addr| {
                spec.templates
                    .iter()
                    .map(move |template| template.request(addr, days))
            }))
            .collect();

        IssuancePlan::new(
            scenario,
            SignerIdentity {
                name: spec.signer_name.to_string(),
                validity_days: days,
            },
            addresses.to_vec(),
            requests,
        )
    }
}
