//! Sorts servers by amount of unreserved RAM, most preferred first.

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, StepError, StepOutcome};

pub struct SortRam;

impl SortRam {
    pub fn new() -> Self {
        Self {}
    }
}

impl PipelineStep for SortRam {
    fn name(&self) -> &str {
        "Sort servers by unreserved RAM"
    }

    fn run(&self, _state: &PipelineState, mut servers: Vec<Server>, _demand: &Demand) -> Result<StepOutcome, StepError> {
        // stable sort keeps the relative order of ties
        servers.sort_by(|a, b| b.unreserved_ram().cmp(&a.unreserved_ram()));
        Ok(StepOutcome::servers(servers))
    }
}

impl Default for SortRam {
    fn default() -> Self {
        Self::new()
    }
}
