//! Candidate server inventory snapshot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Link state of a physical NIC.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Up,
    Down,
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LinkStatus::Up => write!(f, "up"),
            LinkStatus::Down => write!(f, "down"),
        }
    }
}

/// Physical network interface with the tags of the networks reachable through it.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Nic {
    pub link_status: LinkStatus,
    #[serde(default)]
    pub nic_tags: Vec<String>,
}

/// VM resident on a server, either observed in inventory or synthesized from
/// an open provisioning ticket.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Vm {
    pub owner_uuid: String,
    /// VM memory footprint in MiB.
    pub max_physical_memory: u64,
    #[serde(default)]
    pub cpu_cap: Option<u32>,
    #[serde(default)]
    pub quota: Option<u64>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub state: String,
}

/// One physical server from the inventory snapshot supplied by the caller.
///
/// Read-only within a request, except that the ticket augmenter may insert
/// synthetic entries into `vms`.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Server {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reserved: bool,
    #[serde(default)]
    pub setup: bool,
    #[serde(default)]
    pub memory_total_bytes: u64,
    #[serde(default)]
    pub memory_available_bytes: u64,
    #[serde(default)]
    pub rack_identifier: Option<String>,
    #[serde(default)]
    pub interfaces: IndexMap<String, Nic>,
    #[serde(default)]
    pub vms: IndexMap<String, Vm>,
}

impl Server {
    /// RAM in MiB still available for new VMs: total memory minus the
    /// footprints of all resident VM records. Synthetic records added by the
    /// ticket augmenter lower this figure like real ones.
    pub fn unreserved_ram(&self) -> u64 {
        let used: u64 = self.vms.values().map(|vm| vm.max_physical_memory).sum();
        (self.memory_total_bytes / MIB).saturating_sub(used)
    }

    /// Returns whether any owner's VM resides on this server.
    pub fn hosts_vm_of(&self, owner_uuid: &str) -> bool {
        self.vms.values().any(|vm| vm.owner_uuid == owner_uuid)
    }

    /// Returns whether the given VM resides on this server.
    pub fn hosts_vm(&self, vm_uuid: &str) -> bool {
        self.vms.contains_key(vm_uuid)
    }
}
