//! Returns servers whose inventory records are structurally sound.
//!
//! Kind mismatches in the wire payload are rejected by the collaborator's
//! JSON boundary before objects reach the core; this step covers the
//! presence and consistency checks still expressible on the typed model,
//! keeping the schema-style message format for its reasons.

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, ReasonMap, StepError, StepOutcome};

pub struct FilterInvalidServers;

impl FilterInvalidServers {
    pub fn new() -> Self {
        Self {}
    }
}

fn missing(path: &str) -> String {
    format!("property \"{}\": is missing and it is required", path)
}

/// Returns the first structural defect found, scanning fields in a fixed
/// order so a given record always yields the same reason.
fn validate(server: &Server) -> Option<String> {
    if server.uuid.is_empty() {
        return Some(missing("uuid"));
    }
    if server.memory_total_bytes == 0 {
        return Some(missing("memory_total_bytes"));
    }
    for (vm_uuid, vm) in &server.vms {
        if vm.owner_uuid.is_empty() {
            return Some(missing(&format!("vms.{}.owner_uuid", vm_uuid)));
        }
        if vm.max_physical_memory == 0 {
            return Some(missing(&format!("vms.{}.max_physical_memory", vm_uuid)));
        }
    }
    None
}

impl PipelineStep for FilterInvalidServers {
    fn name(&self) -> &str {
        "Servers which are valid"
    }

    fn affects_capacity(&self) -> bool {
        true
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        let mut reasons = if demand.capacity { None } else { Some(ReasonMap::new()) };

        let adequate = servers
            .into_iter()
            .filter(|server| {
                if let Some(defect) = validate(server) {
                    log::warn!("Omitting invalid server {}: {}", server.uuid, defect);
                    if let Some(reasons) = reasons.as_mut() {
                        reasons.insert(server.uuid.clone(), defect);
                    }
                    return false;
                }
                true
            })
            .collect();

        Ok(StepOutcome::with_reasons(adequate, reasons))
    }
}

impl Default for FilterInvalidServers {
    fn default() -> Self {
        Self::new()
    }
}
