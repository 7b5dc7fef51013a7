//! Returns only servers in racks which do not contain any of an owner's VMs.
//!
//! Co-locating more of an owner's workload in one rack defeats fault
//! isolation, so every server in such a rack is excluded, including the one
//! hosting the owner's VM itself. Servers without a rack identifier are
//! never excluded by this step.

use std::collections::HashSet;

use log::trace;

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, ReasonMap, StepError, StepOutcome};

pub struct FilterOwnerSameRacks;

impl FilterOwnerSameRacks {
    pub fn new() -> Self {
        Self {}
    }
}

fn find_racks_with_owner<'a>(servers: &'a [Server], owner_uuid: &str) -> HashSet<&'a str> {
    let mut excluded = HashSet::new();
    for server in servers {
        if let Some(rack) = server.rack_identifier.as_deref() {
            if !excluded.contains(rack) && server.hosts_vm_of(owner_uuid) {
                excluded.insert(rack);
            }
        }
    }
    excluded
}

impl PipelineStep for FilterOwnerSameRacks {
    fn name(&self) -> &str {
        "Servers in racks containing none of an owner's VMs"
    }

    fn affects_capacity(&self) -> bool {
        true
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        let mut reasons = if demand.capacity { None } else { Some(ReasonMap::new()) };
        let excluded_racks: HashSet<String> = find_racks_with_owner(&servers, &demand.owner_uuid)
            .into_iter()
            .map(|r| r.to_string())
            .collect();

        if log::log_enabled!(log::Level::Trace) {
            let racks: Vec<&str> = excluded_racks.iter().map(|r| r.as_str()).collect();
            trace!("Racks excluded: {}", racks.join(", "));
        }

        let adequate = servers
            .into_iter()
            .filter(|server| {
                let excluded = server
                    .rack_identifier
                    .as_ref()
                    .map_or(false, |rack| excluded_racks.contains(rack));
                if excluded {
                    trace!("Due to owner in rack, omitting server: {}", server.uuid);
                    if let (Some(reasons), Some(rack)) = (reasons.as_mut(), server.rack_identifier.as_ref()) {
                        reasons.insert(
                            server.uuid.clone(),
                            format!("VM's owner has another VM in rack {}", rack),
                        );
                    }
                }
                !excluded
            })
            .collect();

        Ok(StepOutcome::with_reasons(adequate, reasons))
    }
}

impl Default for FilterOwnerSameRacks {
    fn default() -> Self {
        Self::new()
    }
}
