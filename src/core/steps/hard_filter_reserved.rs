//! Returns servers which are not reserved.

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, ReasonMap, StepError, StepOutcome};

pub struct FilterReserved;

impl FilterReserved {
    pub fn new() -> Self {
        Self {}
    }
}

impl PipelineStep for FilterReserved {
    fn name(&self) -> &str {
        "Servers which are not reserved"
    }

    fn affects_capacity(&self) -> bool {
        true
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        let mut reasons = if demand.capacity { None } else { Some(ReasonMap::new()) };

        let adequate = servers
            .into_iter()
            .filter(|server| {
                if server.reserved {
                    if let Some(reasons) = reasons.as_mut() {
                        reasons.insert(server.uuid.clone(), "Server is reserved".to_string());
                    }
                    return false;
                }
                true
            })
            .collect();

        Ok(StepOutcome::with_reasons(adequate, reasons))
    }
}

impl Default for FilterReserved {
    fn default() -> Self {
        Self::new()
    }
}
