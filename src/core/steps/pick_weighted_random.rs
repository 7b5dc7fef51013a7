//! Randomly picks one server from the leading fraction of an already
//! preference-ordered list.
//!
//! Restricting the eligible pool to the head of the list concentrates
//! probability mass on the most preferred servers while still avoiding
//! hammering the single top server on every allocation.

use rand::Rng;

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, StepError, StepOutcome};

pub struct PickWeightedRandom {
    pool_ratio: f64,
}

impl PickWeightedRandom {
    pub fn new(pool_ratio: f64) -> Self {
        Self { pool_ratio }
    }
}

impl PipelineStep for PickWeightedRandom {
    fn name(&self) -> &str {
        "Random weighted server"
    }

    fn run(&self, _state: &PipelineState, mut servers: Vec<Server>, _demand: &Demand) -> Result<StepOutcome, StepError> {
        if servers.is_empty() {
            return Ok(StepOutcome::servers(servers));
        }

        let pool = std::cmp::max(1, ((servers.len() as f64) * self.pool_ratio) as usize);
        let index = rand::thread_rng().gen_range(0..pool);

        Ok(StepOutcome::servers(vec![servers.swap_remove(index)]))
    }
}
