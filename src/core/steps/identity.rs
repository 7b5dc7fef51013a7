//! Passes servers through untouched. Useful as a placeholder in custom
//! chains and when debugging pipeline configurations.

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, StepError, StepOutcome};

pub struct Identity;

impl Identity {
    pub fn new() -> Self {
        Self {}
    }
}

impl PipelineStep for Identity {
    fn name(&self) -> &str {
        "Identity function applied to servers"
    }

    fn affects_capacity(&self) -> bool {
        true
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, _demand: &Demand) -> Result<StepOutcome, StepError> {
        Ok(StepOutcome::servers(servers))
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}
