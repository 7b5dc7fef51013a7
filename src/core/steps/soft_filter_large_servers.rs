//! Reserves the largest servers for large allocations.
//!
//! The top fraction of the fleet, by unreserved RAM, is held back so that
//! future large requests still have somewhere to go; requests at or above
//! the large-allocation threshold are instead pointed exclusively at that
//! pool. Fleets too small to carve out a pool pass through unchanged.

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, StepError, StepOutcome};

pub struct FilterLargeServers {
    pool_ratio: f64,
    large_alloc_ram_mib: u64,
}

impl FilterLargeServers {
    pub fn new(pool_ratio: f64, large_alloc_ram_mib: u64) -> Self {
        Self {
            pool_ratio,
            large_alloc_ram_mib,
        }
    }
}

impl PipelineStep for FilterLargeServers {
    fn name(&self) -> &str {
        "Large servers held back for large allocations"
    }

    fn run(&self, _state: &PipelineState, mut servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        let pool = ((servers.len() as f64) * self.pool_ratio) as usize;
        if pool == 0 {
            return Ok(StepOutcome::servers(servers));
        }

        servers.sort_by(|a, b| b.unreserved_ram().cmp(&a.unreserved_ram()));

        let small_servers = servers.split_off(pool);
        let large_servers = servers;

        if demand.ram >= self.large_alloc_ram_mib {
            Ok(StepOutcome::servers(large_servers))
        } else {
            Ok(StepOutcome::servers(small_servers))
        }
    }
}
