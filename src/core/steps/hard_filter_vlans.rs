//! Returns servers which can reach all the networks required by the VM.
//!
//! Servers carry NIC tags on each physical interface; a requested tag is
//! satisfied only by an interface whose link is up. Requested tags are
//! scanned in demand order and the first failing tag decides the rejection
//! reason for that server.

use indexmap::IndexMap;

use crate::core::demand::Demand;
use crate::core::server::{LinkStatus, Server};
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, ReasonMap, StepError, StepOutcome};

pub struct FilterVlans;

impl FilterVlans {
    pub fn new() -> Self {
        Self {}
    }
}

/// Splits a server's tags into those reachable through an up interface and
/// those present only on down interfaces (mapped to the carrying interface).
fn collect_tags(server: &Server) -> (Vec<&str>, IndexMap<&str, (&str, LinkStatus)>) {
    let mut online = Vec::new();
    let mut offline = IndexMap::new();

    for (nic_name, nic) in &server.interfaces {
        for tag in &nic.nic_tags {
            match nic.link_status {
                LinkStatus::Up => online.push(tag.as_str()),
                LinkStatus::Down => {
                    offline
                        .entry(tag.as_str())
                        .or_insert((nic_name.as_str(), nic.link_status));
                }
            }
        }
    }

    (online, offline)
}

impl PipelineStep for FilterVlans {
    fn name(&self) -> &str {
        "Servers supporting required VLANs"
    }

    fn affects_capacity(&self) -> bool {
        true
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        if demand.nic_tags.is_empty() {
            return Ok(StepOutcome::servers(servers));
        }

        let mut reasons = if demand.capacity { None } else { Some(ReasonMap::new()) };

        let adequate = servers
            .into_iter()
            .filter(|server| {
                if server.interfaces.is_empty() {
                    if let Some(reasons) = reasons.as_mut() {
                        reasons.insert(server.uuid.clone(), "Server missing interfaces in sysinfo".to_string());
                    }
                    return false;
                }

                let (online, offline) = collect_tags(server);

                for tag in &demand.nic_tags {
                    if online.iter().any(|&t| t == tag.as_str()) {
                        continue;
                    }

                    if let Some(reasons) = reasons.as_mut() {
                        let reason = match offline.get(tag.as_str()) {
                            Some((nic_name, status)) => {
                                format!("NIC {} for tag \"{}\" is {}", nic_name, tag, status)
                            }
                            None => format!("Server missing vlan \"{}\"", tag),
                        };
                        reasons.insert(server.uuid.clone(), reason);
                    }
                    return false;
                }

                true
            })
            .collect();

        Ok(StepOutcome::with_reasons(adequate, reasons))
    }
}

impl Default for FilterVlans {
    fn default() -> Self {
        Self::new()
    }
}
