//! Demand descriptor for a single placement request.

use serde::{Deserialize, Serialize};

/// A locality hint value: a single id or a list of ids. Each id names either
/// a rack present in the snapshot or an existing VM.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum HintIds {
    One(String),
    Many(Vec<String>),
}

impl HintIds {
    pub fn ids(&self) -> Vec<String> {
        match self {
            HintIds::One(id) => vec![id.clone()],
            HintIds::Many(ids) => ids.clone(),
        }
    }
}

/// Caller-supplied near/far placement preferences, valid for this request only.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct Locality {
    #[serde(default)]
    pub near: Option<HintIds>,
    #[serde(default)]
    pub far: Option<HintIds>,
}

/// Lifecycle status of a provisioning ticket.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Queued,
    Active,
    Complete,
    Expired,
}

/// VM dimensions carried by a provisioning ticket. Absent in payloads from
/// older collaborators, in which case the target server cannot be bounded.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct TicketExtra {
    pub owner_uuid: String,
    pub max_physical_memory: u64,
    #[serde(default)]
    pub cpu_cap: Option<u32>,
    #[serde(default)]
    pub quota: Option<u64>,
    #[serde(default)]
    pub brand: String,
}

/// A provisioning reservation for a VM not yet reflected in inventory.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Ticket {
    pub scope: String,
    pub action: String,
    pub status: TicketStatus,
    pub server_uuid: String,
    /// Uuid of the VM being provisioned.
    pub id: String,
    #[serde(default)]
    pub extra: Option<TicketExtra>,
}

impl Ticket {
    /// An open provision ticket describes a VM that will land on its target
    /// server but is not yet visible in the inventory snapshot.
    pub fn is_open_provision(&self) -> bool {
        self.scope == "vm"
            && self.action == "provision"
            && matches!(self.status, TicketStatus::Queued | TicketStatus::Active)
    }
}

/// Read-only view of one request's demand.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Demand {
    /// Requested RAM in MiB.
    pub ram: u64,
    #[serde(default)]
    pub nic_tags: Vec<String>,
    pub owner_uuid: String,
    #[serde(default)]
    pub locality: Option<Locality>,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    /// Capacity-mode flag: estimate fleet headroom instead of picking a winner.
    #[serde(default)]
    pub capacity: bool,
}
