//! Sorts servers by their 2-adic ranking of unreserved RAM against the
//! requested RAM, most preferred first.
//!
//! The ratio floor(unreserved / requested) is written in binary, the digits
//! are reversed and read as a binary fraction in [0, 1); servers are sorted
//! descending by that fraction. For power-of-two VM and server sizes this
//! packs VMs so that the more valuable leftover sizes (e.g. 8 GiB free) are
//! preserved longest.
//!
//! Servers with less unreserved RAM than requested are dropped first, both
//! to rule out RAM overprovisioning and because the ranking breaks down on
//! a zero ratio.

use log::trace;

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, StepError, StepOutcome};

pub struct Sort2Adic;

impl Sort2Adic {
    pub fn new() -> Self {
        Self {}
    }
}

/// Reversed-binary fraction of the ratio: bit i (from the least significant)
/// contributes 2^-(i+1).
fn adic_fraction(ratio: u64) -> f64 {
    let mut fraction = 0.0;
    let mut weight = 0.5;
    let mut rest = ratio;
    while rest > 0 {
        if rest & 1 == 1 {
            fraction += weight;
        }
        rest >>= 1;
        weight /= 2.0;
    }
    fraction
}

impl PipelineStep for Sort2Adic {
    fn name(&self) -> &str {
        "Sort servers by 2adic"
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        if demand.ram == 0 {
            return Ok(StepOutcome::servers(servers));
        }

        let mut adics: Vec<(f64, Server)> = servers
            .into_iter()
            .filter(|server| {
                if server.unreserved_ram() < demand.ram {
                    trace!("Discarded {} because it was too small", server.uuid);
                    return false;
                }
                true
            })
            .map(|server| (adic_fraction(server.unreserved_ram() / demand.ram), server))
            .collect();

        // stable sort: equal fractions keep their relative input order
        adics.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(StepOutcome::servers(adics.into_iter().map(|(_, server)| server).collect()))
    }
}

impl Default for Sort2Adic {
    fn default() -> Self {
        Self::new()
    }
}
