#![allow(dead_code)]

use indexmap::IndexMap;

use designation::core::demand::{Demand, HintIds, Locality, Ticket, TicketExtra, TicketStatus};
use designation::core::server::{LinkStatus, Nic, Server, Vm};

pub const MIB: u64 = 1024 * 1024;

pub fn server(uuid: &str, ram_mib: u64) -> Server {
    Server {
        uuid: uuid.to_string(),
        status: "running".to_string(),
        reserved: false,
        setup: true,
        memory_total_bytes: ram_mib * MIB,
        memory_available_bytes: ram_mib * MIB,
        rack_identifier: None,
        interfaces: IndexMap::new(),
        vms: IndexMap::new(),
    }
}

pub fn server_in_rack(uuid: &str, ram_mib: u64, rack: &str) -> Server {
    let mut s = server(uuid, ram_mib);
    s.rack_identifier = Some(rack.to_string());
    s
}

pub fn vm(owner_uuid: &str, ram_mib: u64) -> Vm {
    Vm {
        owner_uuid: owner_uuid.to_string(),
        max_physical_memory: ram_mib,
        cpu_cap: None,
        quota: None,
        brand: "joyent".to_string(),
        state: "running".to_string(),
    }
}

pub fn add_vm(server: &mut Server, vm_uuid: &str, owner_uuid: &str, ram_mib: u64) {
    server.vms.insert(vm_uuid.to_string(), vm(owner_uuid, ram_mib));
}

pub fn nic(link_status: LinkStatus, tags: &[&str]) -> Nic {
    Nic {
        link_status,
        nic_tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn demand(ram_mib: u64, owner_uuid: &str) -> Demand {
    Demand {
        ram: ram_mib,
        nic_tags: Vec::new(),
        owner_uuid: owner_uuid.to_string(),
        locality: None,
        tickets: Vec::new(),
        capacity: false,
    }
}

pub fn demand_with_tags(ram_mib: u64, owner_uuid: &str, tags: &[&str]) -> Demand {
    let mut d = demand(ram_mib, owner_uuid);
    d.nic_tags = tags.iter().map(|t| t.to_string()).collect();
    d
}

pub fn near_hint(ids: &[&str]) -> Option<Locality> {
    Some(Locality {
        near: Some(HintIds::Many(ids.iter().map(|s| s.to_string()).collect())),
        far: None,
    })
}

pub fn far_hint(ids: &[&str]) -> Option<Locality> {
    Some(Locality {
        near: None,
        far: Some(HintIds::Many(ids.iter().map(|s| s.to_string()).collect())),
    })
}

pub fn provision_ticket(server_uuid: &str, vm_uuid: &str, extra: Option<TicketExtra>) -> Ticket {
    Ticket {
        scope: "vm".to_string(),
        action: "provision".to_string(),
        status: TicketStatus::Active,
        server_uuid: server_uuid.to_string(),
        id: vm_uuid.to_string(),
        extra,
    }
}

pub fn ticket_extra(owner_uuid: &str, ram_mib: u64, brand: &str) -> TicketExtra {
    TicketExtra {
        owner_uuid: owner_uuid.to_string(),
        max_physical_memory: ram_mib,
        cpu_cap: Some(100),
        quota: Some(10),
        brand: brand.to_string(),
    }
}

pub fn uuids(servers: &[Server]) -> Vec<String> {
    servers.iter().map(|s| s.uuid.clone()).collect()
}
