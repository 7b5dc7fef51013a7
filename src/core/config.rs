//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Step chain used when the config names no steps, in execution order.
pub const DEFAULT_STEPS: [&str; 9] = [
    "calculate-ticketed-vms",
    "hard-filter-min-ram",
    "hard-filter-running",
    "hard-filter-setup",
    "hard-filter-reserved",
    "hard-filter-vlans",
    "soft-filter-recent-servers",
    "sort-2adic",
    "pick-weighted-random",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("can't parse YAML from config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("unknown step name in config: {0}")]
    UnknownStep(String),
}

/// Holds raw pipeline config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawPipelineConfig {
    pub steps: Option<Vec<String>>,
    pub recent_server_window_secs: Option<u64>,
    pub recent_server_exclusion_ratio: Option<f64>,
    pub weighted_pool_ratio: Option<f64>,
    pub large_pool_ratio: Option<f64>,
    pub large_alloc_ram_mib: Option<u64>,
    pub kvm_ram_overhead_mib: Option<u64>,
}

/// Represents pipeline configuration: the ordered step chain plus the named
/// tunables of the heuristic steps.
#[derive(Debug, PartialEq, Clone)]
pub struct PipelineConfig {
    /// Registry names of the steps to run, in order.
    pub steps: Vec<String>,
    /// Recency anti-affinity window in seconds.
    pub recent_server_window_secs: u64,
    /// Fraction of the candidate pool excluded by the recency filter.
    pub recent_server_exclusion_ratio: f64,
    /// Leading fraction of the ranked list eligible for the random pick.
    pub weighted_pool_ratio: f64,
    /// Fraction of the largest servers held back for large allocations.
    pub large_pool_ratio: f64,
    /// Requested RAM (MiB) from which an allocation counts as large.
    pub large_alloc_ram_mib: u64,
    /// Extra RAM (MiB) added to ticket-synthesized VMs with the kvm brand.
    pub kvm_ram_overhead_mib: u64,
}

impl PipelineConfig {
    /// Creates pipeline config with default parameter values.
    pub fn new() -> Self {
        Self {
            steps: DEFAULT_STEPS.iter().map(|s| s.to_string()).collect(),
            recent_server_window_secs: 5 * 60,
            recent_server_exclusion_ratio: 0.25,
            weighted_pool_ratio: 0.05,
            large_pool_ratio: 0.15,
            large_alloc_ram_mib: 32 * 1024,
            kvm_ram_overhead_mib: 1024,
        }
    }

    /// Creates pipeline config by reading parameter values from .yaml file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(file_name).map_err(|source| ConfigError::Io {
            path: file_name.to_string(),
            source,
        })?;
        let raw: RawPipelineConfig = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: file_name.to_string(),
            source,
        })?;
        let default = PipelineConfig::new();

        Ok(Self {
            steps: raw.steps.unwrap_or(default.steps),
            recent_server_window_secs: raw
                .recent_server_window_secs
                .unwrap_or(default.recent_server_window_secs),
            recent_server_exclusion_ratio: raw
                .recent_server_exclusion_ratio
                .unwrap_or(default.recent_server_exclusion_ratio),
            weighted_pool_ratio: raw.weighted_pool_ratio.unwrap_or(default.weighted_pool_ratio),
            large_pool_ratio: raw.large_pool_ratio.unwrap_or(default.large_pool_ratio),
            large_alloc_ram_mib: raw.large_alloc_ram_mib.unwrap_or(default.large_alloc_ram_mib),
            kvm_ram_overhead_mib: raw.kvm_ram_overhead_mib.unwrap_or(default.kvm_ram_overhead_mib),
        })
    }

    /// Window in milliseconds, matching the epoch-millis recency timestamps.
    pub fn recent_server_window_millis(&self) -> u64 {
        self.recent_server_window_secs * 1000
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
