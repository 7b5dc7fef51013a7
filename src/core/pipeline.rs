//! Pipeline executor: runs the configured step chain over one request.

use log::{debug, trace};
use thiserror::Error;

use crate::core::config::{ConfigError, PipelineConfig};
use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::step::{resolve_step, PipelineStep, ReasonMap, StepError};

/// Failure of one allocation request.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The pipeline eliminated every candidate. Carries per-server
    /// elimination reasons for diagnostics.
    #[error("no suitable server found")]
    NoCandidate { reasons: ReasonMap },
    /// A step failed unexpectedly; the pipeline was aborted.
    #[error("step '{step}' failed: {source}")]
    StepFailed { step: String, source: StepError },
}

/// Executes a configured ordered list of steps over one placement request.
///
/// The executor owns the cross-request heuristic state, so independently
/// configured pipelines (multiple tenants, tests) never share state. One
/// request is a fully synchronous traversal of the step chain; the executor
/// is `Sync` and concurrent requests may run against the same instance.
pub struct AllocationPipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    state: PipelineState,
}

impl AllocationPipeline {
    /// Builds the pipeline from config, resolving every configured step name.
    /// Fails fast on the first unknown name.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let mut steps = Vec::with_capacity(config.steps.len());
        for name in &config.steps {
            steps.push(resolve_step(name, config)?);
        }
        Ok(Self::with_steps(steps))
    }

    /// Builds the default pipeline chain with default tunables.
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::new()).unwrap_or_else(|e| panic!("default pipeline must resolve: {}", e))
    }

    /// Builds a pipeline from pre-constructed steps (custom chains, tests).
    pub fn with_steps(steps: Vec<Box<dyn PipelineStep>>) -> Self {
        Self {
            steps,
            state: PipelineState::new(),
        }
    }

    /// Read access to the heuristic state, for collaborators that report it.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Selects exactly one server for the demand, or fails with the
    /// accumulated reason map. Post-hooks of every step run on the winner.
    pub fn select(&self, demand: &Demand, servers: Vec<Server>) -> Result<Server, AllocationError> {
        let (mut survivors, reasons) = self.run_steps(demand, servers, demand.capacity)?;

        if survivors.is_empty() {
            return Err(AllocationError::NoCandidate { reasons });
        }
        if survivors.len() > 1 {
            debug!(
                "{} servers left after last step, taking the most preferred",
                survivors.len()
            );
        }
        let winner = survivors.swap_remove(0);

        for step in &self.steps {
            step.post(&self.state, &winner);
        }
        Ok(winner)
    }

    /// Capacity mode: runs only capacity-capable steps and returns the
    /// surviving servers (possibly none) for fleet headroom estimation.
    /// No reasons are collected and no post-hooks run.
    pub fn capacity(&self, demand: &Demand, servers: Vec<Server>) -> Result<Vec<Server>, AllocationError> {
        let mut demand = demand.clone();
        demand.capacity = true;
        let (survivors, _) = self.run_steps(&demand, servers, true)?;
        Ok(survivors)
    }

    fn run_steps(
        &self,
        demand: &Demand,
        mut servers: Vec<Server>,
        capacity: bool,
    ) -> Result<(Vec<Server>, ReasonMap), AllocationError> {
        let mut reasons = ReasonMap::new();

        for step in &self.steps {
            if capacity && !step.affects_capacity() {
                trace!("Skipping step '{}' in capacity mode", step.name());
                continue;
            }

            let outcome = step
                .run(&self.state, servers, demand)
                .map_err(|source| AllocationError::StepFailed {
                    step: step.name().to_string(),
                    source,
                })?;
            servers = outcome.servers;
            trace!("Step '{}' kept {} servers", step.name(), servers.len());

            if !capacity {
                if let Some(step_reasons) = outcome.reasons {
                    for (uuid, reason) in step_reasons {
                        // first elimination wins
                        reasons.entry(uuid).or_insert(reason);
                    }
                }
            }

            if servers.is_empty() {
                break;
            }
        }

        Ok((servers, reasons))
    }
}

impl Default for AllocationPipeline {
    fn default() -> Self {
        Self::new()
    }
}
