//! Cross-request heuristic memory.
//!
//! The state is owned by the pipeline instance and namespaced per stateful
//! algorithm, so unrelated steps cannot collide on keys and independently
//! configured pipelines cannot observe each other. Each namespace carries its
//! own lock; concurrent requests serialize per namespace, never globally.
//! Races across the two locks only bias soft preferences and are accepted.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Longer-lived near/far sets for one owner.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OwnerLocality {
    pub near_server_uuids: HashSet<String>,
    pub far_server_uuids: HashSet<String>,
    pub near_rack_ids: HashSet<String>,
    pub far_rack_ids: HashSet<String>,
}

impl OwnerLocality {
    pub fn is_empty(&self) -> bool {
        self.near_server_uuids.is_empty()
            && self.far_server_uuids.is_empty()
            && self.near_rack_ids.is_empty()
            && self.far_rack_ids.is_empty()
    }

    /// Unions another set of locality preferences into this one.
    pub fn merge(&mut self, other: &OwnerLocality) {
        self.near_server_uuids.extend(other.near_server_uuids.iter().cloned());
        self.far_server_uuids.extend(other.far_server_uuids.iter().cloned());
        self.near_rack_ids.extend(other.near_rack_ids.iter().cloned());
        self.far_rack_ids.extend(other.far_rack_ids.iter().cloned());
    }
}

/// In-memory heuristic state shared by all requests of one pipeline instance.
#[derive(Debug, Default)]
pub struct PipelineState {
    /// Server uuid -> epoch millis of its last successful allocation.
    pub recent_servers: Mutex<HashMap<String, u64>>,
    /// Owner uuid -> longer-lived near/far sets.
    pub locality: Mutex<HashMap<String, OwnerLocality>>,
}

impl PipelineState {
    pub fn new() -> Self {
        Default::default()
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
