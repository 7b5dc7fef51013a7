//! Pipeline step contract and the static step registry.

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::config::{ConfigError, PipelineConfig};
use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::PipelineState;
use crate::core::steps::calculate_ticketed_vms::CalculateTicketedVms;
use crate::core::steps::hard_filter_invalid_servers::FilterInvalidServers;
use crate::core::steps::hard_filter_min_ram::FilterMinRam;
use crate::core::steps::hard_filter_owner_same_racks::FilterOwnerSameRacks;
use crate::core::steps::hard_filter_reserved::FilterReserved;
use crate::core::steps::hard_filter_running::FilterRunning;
use crate::core::steps::hard_filter_setup::FilterSetup;
use crate::core::steps::hard_filter_vlans::FilterVlans;
use crate::core::steps::identity::Identity;
use crate::core::steps::pick_weighted_random::PickWeightedRandom;
use crate::core::steps::soft_filter_large_servers::FilterLargeServers;
use crate::core::steps::soft_filter_locality_hints::FilterLocalityHints;
use crate::core::steps::soft_filter_recent_servers::FilterRecentServers;
use crate::core::steps::sort_2adic::Sort2Adic;
use crate::core::steps::sort_ram::SortRam;

/// Server uuid -> human-readable elimination reason. First elimination wins;
/// the executor never overwrites an existing entry.
pub type ReasonMap = IndexMap<String, String>;

/// Result of one step invocation: the surviving (or reordered, or enriched)
/// server list, and elimination reasons for the dropped servers. Reasons are
/// produced only outside capacity mode.
pub struct StepOutcome {
    pub servers: Vec<Server>,
    pub reasons: Option<ReasonMap>,
}

impl StepOutcome {
    pub fn servers(servers: Vec<Server>) -> Self {
        Self { servers, reasons: None }
    }

    pub fn with_reasons(servers: Vec<Server>, reasons: Option<ReasonMap>) -> Self {
        Self { servers, reasons }
    }
}

/// Unexpected per-step failure. Not retried; aborts the whole pipeline,
/// since a partially applied pipeline cannot safely name a winner.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("server {uuid}: {detail}")]
    MalformedServer { uuid: String, detail: String },
    #[error("{0}")]
    Internal(String),
}

/// Trait for implementation of pipeline steps.
///
/// A step is a named unit performing one filter, sort or select operation
/// over the candidate server list. Filter steps must never introduce a server
/// absent from their input; only the ticket augmenter may add synthetic VM
/// records, and even it never adds servers.
///
/// It is possible to implement arbitrary steps and run them in the pipeline.
pub trait PipelineStep: Send + Sync {
    /// Human-readable step identifier.
    fn name(&self) -> &str;

    /// Whether the step participates in capacity-mode estimation.
    fn affects_capacity(&self) -> bool {
        false
    }

    /// Transforms the candidate list for one request.
    fn run(&self, state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError>;

    /// Invoked once per successful allocation with the final winner, in
    /// configured step order, for bookkeeping side effects.
    fn post(&self, _state: &PipelineState, _winner: &Server) {}
}

/// Resolves a registry name to a step implementation, carrying over the
/// relevant tunables from the config. Unknown names are rejected so that a
/// misconfigured pipeline fails at construction, not mid-request.
pub fn resolve_step(name: &str, config: &PipelineConfig) -> Result<Box<dyn PipelineStep>, ConfigError> {
    match name {
        "calculate-ticketed-vms" => Ok(Box::new(CalculateTicketedVms::new(config.kvm_ram_overhead_mib))),
        "hard-filter-min-ram" => Ok(Box::new(FilterMinRam::new())),
        "hard-filter-running" => Ok(Box::new(FilterRunning::new())),
        "hard-filter-setup" => Ok(Box::new(FilterSetup::new())),
        "hard-filter-reserved" => Ok(Box::new(FilterReserved::new())),
        "hard-filter-invalid-servers" => Ok(Box::new(FilterInvalidServers::new())),
        "hard-filter-vlans" => Ok(Box::new(FilterVlans::new())),
        "hard-filter-owner-same-racks" => Ok(Box::new(FilterOwnerSameRacks::new())),
        "soft-filter-recent-servers" => Ok(Box::new(FilterRecentServers::new(
            config.recent_server_window_millis(),
            config.recent_server_exclusion_ratio,
        ))),
        "soft-filter-locality-hints" => Ok(Box::new(FilterLocalityHints::new())),
        "soft-filter-large-servers" => Ok(Box::new(FilterLargeServers::new(
            config.large_pool_ratio,
            config.large_alloc_ram_mib,
        ))),
        "sort-ram" => Ok(Box::new(SortRam::new())),
        "sort-2adic" => Ok(Box::new(Sort2Adic::new())),
        "pick-weighted-random" => Ok(Box::new(PickWeightedRandom::new(config.weighted_pool_ratio))),
        "identity" => Ok(Box::new(Identity::new())),
        _ => Err(ConfigError::UnknownStep(name.to_string())),
    }
}
