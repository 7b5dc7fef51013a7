//! Places the VM near or far from the owner's existing VMs and racks.
//!
//! Caller-supplied near/far hints are resolved against the snapshot (a hint
//! id naming a rack is a rack hint, anything else names a VM and resolves to
//! the server hosting it) and unioned, for this request only, with the
//! owner's longer-lived sets in pipeline state. When the request carries no
//! hints and the owner has no stored sets, default anti-affinity applies:
//! the servers and racks already hosting the owner's VMs become far, and
//! those defaults are stored as the owner's longer-lived sets.
//!
//! Candidates are evaluated as a cascade of tiers, each tried only when all
//! previous tiers came up empty, so a non-empty input always yields a
//! non-empty output at the cost of weaker affinity under contention:
//! 1. servers in a near rack, excluding near and far servers (same rack,
//!    different box);
//! 2. near servers, excluding far servers;
//! 3. servers whose rack is known and not far, excluding far servers;
//! 4. servers that are not far servers;
//! 5. all input servers.

use std::collections::HashSet;

use log::trace;

use crate::core::demand::Demand;
use crate::core::server::Server;
use crate::core::state::{OwnerLocality, PipelineState};
use crate::core::step::{PipelineStep, StepError, StepOutcome};

pub struct FilterLocalityHints;

impl FilterLocalityHints {
    pub fn new() -> Self {
        Self {}
    }
}

/// Default far sets for an owner: the servers hosting their VMs and the
/// racks those servers stand in.
fn owner_footprint(servers: &[Server], owner_uuid: &str) -> OwnerLocality {
    let mut sets = OwnerLocality::default();
    for server in servers {
        if server.hosts_vm_of(owner_uuid) {
            sets.far_server_uuids.insert(server.uuid.clone());
            if let Some(rack) = &server.rack_identifier {
                sets.far_rack_ids.insert(rack.clone());
            }
        }
    }
    sets
}

/// Resolves one hint id list into server uuids and rack ids.
fn resolve_hints(servers: &[Server], ids: &[String], server_set: &mut HashSet<String>, rack_set: &mut HashSet<String>) {
    let racks: HashSet<&str> = servers.iter().filter_map(|s| s.rack_identifier.as_deref()).collect();

    for id in ids {
        if racks.contains(id.as_str()) {
            rack_set.insert(id.clone());
            continue;
        }
        for server in servers {
            if server.hosts_vm(id) {
                server_set.insert(server.uuid.clone());
                if let Some(rack) = &server.rack_identifier {
                    rack_set.insert(rack.clone());
                }
                break;
            }
        }
    }
}

fn in_rack(server: &Server, racks: &HashSet<String>) -> bool {
    server.rack_identifier.as_ref().map_or(false, |rack| racks.contains(rack))
}

impl PipelineStep for FilterLocalityHints {
    fn name(&self) -> &str {
        "Servers compliant with locality hints"
    }

    fn run(&self, state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        let mut sets = {
            let locality = state.locality.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locality.get(&demand.owner_uuid).cloned().unwrap_or_default()
        };

        let hints = demand.locality.as_ref();
        let has_hints = hints.map_or(false, |l| l.near.is_some() || l.far.is_some());

        if has_hints {
            // per-call additions: never written back to state
            if let Some(near) = hints.and_then(|l| l.near.as_ref()) {
                resolve_hints(&servers, &near.ids(), &mut sets.near_server_uuids, &mut sets.near_rack_ids);
            }
            if let Some(far) = hints.and_then(|l| l.far.as_ref()) {
                resolve_hints(&servers, &far.ids(), &mut sets.far_server_uuids, &mut sets.far_rack_ids);
            }
        } else if sets.is_empty() {
            let defaults = owner_footprint(&servers, &demand.owner_uuid);
            if !defaults.is_empty() {
                let mut locality = state.locality.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                locality
                    .entry(demand.owner_uuid.clone())
                    .or_default()
                    .merge(&defaults);
            }
            sets.merge(&defaults);
        }

        // nothing known about this owner: no preference to apply
        if sets.is_empty() {
            return Ok(StepOutcome::servers(servers));
        }

        let keep_in_tier = |tier: u32, s: &Server| match tier {
            1 => {
                in_rack(s, &sets.near_rack_ids)
                    && !sets.near_server_uuids.contains(&s.uuid)
                    && !sets.far_server_uuids.contains(&s.uuid)
            }
            2 => sets.near_server_uuids.contains(&s.uuid) && !sets.far_server_uuids.contains(&s.uuid),
            3 => {
                s.rack_identifier.is_some()
                    && !in_rack(s, &sets.far_rack_ids)
                    && !sets.far_server_uuids.contains(&s.uuid)
            }
            4 => !sets.far_server_uuids.contains(&s.uuid),
            _ => true,
        };

        for tier in 1..=5 {
            if servers.iter().any(|s| keep_in_tier(tier, s)) {
                let kept: Vec<Server> = servers.into_iter().filter(|s| keep_in_tier(tier, s)).collect();
                trace!("Locality tier {} kept {} servers", tier, kept.len());
                return Ok(StepOutcome::servers(kept));
            }
        }

        // empty input only
        Ok(StepOutcome::servers(servers))
    }
}

impl Default for FilterLocalityHints {
    fn default() -> Self {
        Self::new()
    }
}
