//! Returns servers which are currently running.

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, ReasonMap, StepError, StepOutcome};

pub struct FilterRunning;

impl FilterRunning {
    pub fn new() -> Self {
        Self {}
    }
}

impl PipelineStep for FilterRunning {
    fn name(&self) -> &str {
        "Servers which are currently running"
    }

    fn affects_capacity(&self) -> bool {
        true
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        let mut reasons = if demand.capacity { None } else { Some(ReasonMap::new()) };

        let adequate = servers
            .into_iter()
            .filter(|server| {
                if server.status != "running" {
                    if let Some(reasons) = reasons.as_mut() {
                        reasons.insert(server.uuid.clone(), format!("Server has status: {}", server.status));
                    }
                    return false;
                }
                true
            })
            .collect();

        Ok(StepOutcome::with_reasons(adequate, reasons))
    }
}

impl Default for FilterRunning {
    fn default() -> Self {
        Self::new()
    }
}
