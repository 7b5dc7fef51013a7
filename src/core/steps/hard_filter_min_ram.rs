//! Returns servers with enough unreserved RAM for the requested VM.

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, ReasonMap, StepError, StepOutcome};

pub struct FilterMinRam;

impl FilterMinRam {
    pub fn new() -> Self {
        Self {}
    }
}

impl PipelineStep for FilterMinRam {
    fn name(&self) -> &str {
        "Servers with enough unreserved RAM"
    }

    fn affects_capacity(&self) -> bool {
        true
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        let mut reasons = if demand.capacity { None } else { Some(ReasonMap::new()) };

        let adequate = servers
            .into_iter()
            .filter(|server| {
                let unreserved = server.unreserved_ram();
                if unreserved < demand.ram {
                    if let Some(reasons) = reasons.as_mut() {
                        reasons.insert(
                            server.uuid.clone(),
                            format!(
                                "VM needs {} MiB RAM, but server only has {} MiB",
                                demand.ram, unreserved
                            ),
                        );
                    }
                    return false;
                }
                true
            })
            .collect();

        Ok(StepOutcome::with_reasons(adequate, reasons))
    }
}

impl Default for FilterMinRam {
    fn default() -> Self {
        Self::new()
    }
}
