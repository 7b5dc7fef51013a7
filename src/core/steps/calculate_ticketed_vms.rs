//! Appends VMs that have open provisioning tickets but have not yet appeared
//! in the inventory snapshot.
//!
//! When a VM creation is accepted, the VM does not show up in inventory
//! immediately. The metadata attached to open provision tickets is used in
//! lieu of that: for every targeted server a placeholder resident-VM record
//! is synthesized, so later RAM and VM-count filters see the true host
//! impact. This step must run near the beginning of the chain.

use std::collections::HashMap;

use crate::core::demand::{Demand, Ticket};
use crate::core::server::{Server, Vm};
use crate::core::state::PipelineState;
use crate::core::step::{PipelineStep, ReasonMap, StepError, StepOutcome};

pub struct CalculateTicketedVms {
    kvm_ram_overhead_mib: u64,
}

impl CalculateTicketedVms {
    pub fn new(kvm_ram_overhead_mib: u64) -> Self {
        Self { kvm_ram_overhead_mib }
    }

    fn synthesize_vm(&self, ticket: &Ticket) -> Option<Vm> {
        let meta = ticket.extra.as_ref()?;
        let mut ram = meta.max_physical_memory;
        // heavier virtualization brands carry a fixed host-side allowance
        if meta.brand == "kvm" {
            ram += self.kvm_ram_overhead_mib;
        }
        Some(Vm {
            owner_uuid: meta.owner_uuid.clone(),
            max_physical_memory: ram,
            cpu_cap: meta.cpu_cap,
            quota: meta.quota,
            brand: meta.brand.clone(),
            state: "running".to_string(),
        })
    }
}

fn find_open_tickets(tickets: &[Ticket]) -> HashMap<&str, Vec<&Ticket>> {
    let mut server_tickets: HashMap<&str, Vec<&Ticket>> = HashMap::new();
    for ticket in tickets.iter().filter(|t| t.is_open_provision()) {
        server_tickets.entry(&ticket.server_uuid).or_default().push(ticket);
    }
    server_tickets
}

impl PipelineStep for CalculateTicketedVms {
    fn name(&self) -> &str {
        "Add VMs which have open provisioning tickets"
    }

    fn affects_capacity(&self) -> bool {
        true
    }

    fn run(&self, _state: &PipelineState, servers: Vec<Server>, demand: &Demand) -> Result<StepOutcome, StepError> {
        let mut reasons = if demand.capacity { None } else { Some(ReasonMap::new()) };
        let open_tickets = find_open_tickets(&demand.tickets);

        let mut kept = Vec::with_capacity(servers.len());
        'servers: for mut server in servers {
            if let Some(tickets) = open_tickets.get(server.uuid.as_str()) {
                for ticket in tickets {
                    match self.synthesize_vm(ticket) {
                        Some(vm) => {
                            if !server.vms.contains_key(&ticket.id) {
                                server.vms.insert(ticket.id.clone(), vm);
                            }
                        }
                        None => {
                            // old collaborator format: the server's true
                            // utilization cannot be bounded
                            if let Some(reasons) = reasons.as_mut() {
                                reasons.insert(
                                    server.uuid.clone(),
                                    format!("Open provision ticket {} is missing metadata", ticket.id),
                                );
                            }
                            continue 'servers;
                        }
                    }
                }
            }
            kept.push(server);
        }

        Ok(StepOutcome::with_reasons(kept, reasons))
    }
}
