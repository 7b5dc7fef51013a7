//! Excludes servers which received an allocation very recently, spreading
//! consecutive allocations across the fleet without starving small fleets.
//!
//! State: server uuid -> epoch millis of its last win, kept only while
//! younger than the window. Each invocation first prunes aged entries, a
//! side effect independent of the filtering outcome. Among the in-window
//! entries, the most recent ones are excluded up to a cap proportional to
//! the candidate pool size.

use std::collections::HashSet;

use log::trace;

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::{now_millis, PipelineState};
use crate::core::step::{PipelineStep, StepError, StepOutcome};

pub struct FilterRecentServers {
    window_millis: u64,
    exclusion_ratio: f64,
}

impl FilterRecentServers {
    pub fn new(window_millis: u64, exclusion_ratio: f64) -> Self {
        Self {
            window_millis,
            exclusion_ratio,
        }
    }
}

impl PipelineStep for FilterRecentServers {
    fn name(&self) -> &str {
        "Servers not allocated to recently"
    }

    fn run(&self, state: &PipelineState, servers: Vec<Server>, _demand: &Demand) -> Result<StepOutcome, StepError> {
        let now = now_millis();
        let mut recent = state
            .recent_servers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        recent.retain(|_, timestamp| now.saturating_sub(*timestamp) < self.window_millis);

        // most recent first
        let mut in_window: Vec<(&String, u64)> = recent.iter().map(|(uuid, ts)| (uuid, *ts)).collect();
        in_window.sort_by(|a, b| b.1.cmp(&a.1));

        let cap = ((servers.len() as f64) * self.exclusion_ratio) as usize;
        let excluded: HashSet<&String> = in_window.iter().take(cap).map(|(uuid, _)| *uuid).collect();

        if !excluded.is_empty() {
            trace!("Excluding {} recently allocated servers", excluded.len());
        }

        let kept = servers
            .into_iter()
            .filter(|server| !excluded.contains(&server.uuid))
            .collect();

        Ok(StepOutcome::servers(kept))
    }

    fn post(&self, state: &PipelineState, winner: &Server) {
        let mut recent = state
            .recent_servers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        recent.insert(winner.uuid.clone(), now_millis());
    }
}
