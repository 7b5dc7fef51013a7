mod common;

use common::*;

use designation::core::config::{ConfigError, PipelineConfig, DEFAULT_STEPS};
use designation::core::demand::Demand;
use designation::core::pipeline::{AllocationError, AllocationPipeline};
use designation::core::server::Server;
use designation::core::state::PipelineState;
use designation::core::step::{PipelineStep, StepError, StepOutcome};

const OWNER: &str = "d4bb1b60-9172-4c58-964e-fe58a9989708";

fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

#[test]
fn config_defaults_match_the_default_chain() {
    let config = PipelineConfig::new();
    assert_eq!(config.steps, DEFAULT_STEPS.to_vec());
    assert_eq!(config.recent_server_window_secs, 300);
    assert_eq!(config.weighted_pool_ratio, 0.05);
}

#[test]
fn config_from_file_overrides_only_named_fields() {
    let config = PipelineConfig::from_file(&name_wrapper("tunables.yaml")).unwrap();
    assert_eq!(config.recent_server_window_secs, 60);
    assert_eq!(config.recent_server_exclusion_ratio, 0.5);
    assert_eq!(config.large_alloc_ram_mib, 16384);
    // untouched fields keep their defaults
    assert_eq!(config.steps, DEFAULT_STEPS.to_vec());
    assert_eq!(config.kvm_ram_overhead_mib, 1024);
}

#[test]
fn unknown_step_name_fails_pipeline_construction() {
    let mut config = PipelineConfig::new();
    config.steps = vec!["sort-ram".to_string(), "sort-3adic".to_string()];

    match AllocationPipeline::from_config(&config) {
        Err(ConfigError::UnknownStep(name)) => assert_eq!(name, "sort-3adic"),
        other => panic!("expected UnknownStep, got {:?}", other.err()),
    }
}

#[test]
fn end_to_end_allocation_prefers_bigger_servers() {
    let config = PipelineConfig::from_file(&name_wrapper("custom_steps.yaml")).unwrap();
    let pipeline = AllocationPipeline::from_config(&config).unwrap();

    let servers = vec![server("small", 256), server("mid", 512), server("big", 1024)];

    let winner = pipeline.select(&demand(512, OWNER), servers).unwrap();
    assert!(winner.uuid == "big" || winner.uuid == "mid");
}

#[test]
fn default_pipeline_selects_exactly_one_server() {
    let pipeline = AllocationPipeline::new();
    let servers = vec![server("s1", 768), server("s2", 1536), server("s3", 3072)];

    let winner = pipeline.select(&demand(512, OWNER), servers).unwrap();
    assert!(["s1", "s2", "s3"].contains(&winner.uuid.as_str()));
}

#[test]
fn exhausted_pipeline_reports_no_candidate_with_first_reason_winning() {
    let pipeline = AllocationPipeline::new();

    // reserved and also too small: min-RAM runs first in the default chain,
    // and its reason must not be overwritten by the reserved filter
    let mut s1 = server("s1", 256);
    s1.reserved = true;
    let servers = vec![s1];

    match pipeline.select(&demand(512, OWNER), servers) {
        Err(AllocationError::NoCandidate { reasons }) => {
            assert_eq!(reasons["s1"], "VM needs 512 MiB RAM, but server only has 256 MiB");
        }
        other => panic!("expected NoCandidate, got {:?}", other.err()),
    }
}

#[test]
fn empty_fleet_fails_with_no_candidate() {
    let pipeline = AllocationPipeline::new();
    match pipeline.select(&demand(512, OWNER), Vec::new()) {
        Err(AllocationError::NoCandidate { reasons }) => assert!(reasons.is_empty()),
        other => panic!("expected NoCandidate, got {:?}", other.err()),
    }
}

#[test]
fn winning_allocation_feeds_the_recency_state() {
    let pipeline = AllocationPipeline::new();
    let servers = vec![server("s1", 1024)];

    let winner = pipeline.select(&demand(512, OWNER), servers).unwrap();
    assert_eq!(winner.uuid, "s1");

    let recent = pipeline.state().recent_servers.lock().unwrap();
    assert!(recent.contains_key("s1"));
}

struct FailingStep;

impl PipelineStep for FailingStep {
    fn name(&self) -> &str {
        "Always failing"
    }

    fn run(&self, _state: &PipelineState, _servers: Vec<Server>, _demand: &Demand) -> Result<StepOutcome, StepError> {
        Err(StepError::Internal("boom".to_string()))
    }
}

#[test]
fn a_failing_step_aborts_the_whole_pipeline() {
    let pipeline = AllocationPipeline::with_steps(vec![Box::new(FailingStep)]);

    match pipeline.select(&demand(512, OWNER), vec![server("s1", 1024)]) {
        Err(AllocationError::StepFailed { step, .. }) => assert_eq!(step, "Always failing"),
        other => panic!("expected StepFailed, got {:?}", other.err()),
    }
}

#[test]
fn capacity_mode_skips_selection_and_reports_all_survivors() {
    let pipeline = AllocationPipeline::new();

    let mut reserved = server("s1", 2048);
    reserved.reserved = true;
    let servers = vec![reserved, server("s2", 2048), server("s3", 2048), server("s4", 256)];

    let survivors = pipeline.capacity(&demand(512, OWNER), servers).unwrap();

    // reserved and undersized servers drop out, but no single winner is picked
    assert_eq!(uuids(&survivors), vec!["s2", "s3"]);
    // capacity runs leave the recency state untouched
    assert!(pipeline.state().recent_servers.lock().unwrap().is_empty());
}

#[test]
fn ticket_augmentation_reduces_unreserved_ram() {
    let pipeline = AllocationPipeline::new();

    let servers = vec![server("ticketed", 2048), server("free", 1024)];
    let mut demand = demand(512, OWNER);
    demand.tickets = vec![provision_ticket(
        "ticketed",
        "new-vm",
        Some(ticket_extra("other-owner", 600, "kvm")),
    )];

    let winner = pipeline.select(&demand, servers).unwrap();
    // 2048 - (600 + 1024) = 424 MiB < 512: the ticketed server cannot host it
    assert_eq!(winner.uuid, "free");
}

#[test]
fn ticket_without_metadata_excludes_the_server() {
    let pipeline = AllocationPipeline::new();

    let servers = vec![server("ticketed", 4096)];
    let mut demand = demand(512, OWNER);
    demand.tickets = vec![provision_ticket("ticketed", "new-vm", None)];

    match pipeline.select(&demand, servers) {
        Err(AllocationError::NoCandidate { reasons }) => {
            assert_eq!(reasons["ticketed"], "Open provision ticket new-vm is missing metadata");
        }
        other => panic!("expected NoCandidate, got {:?}", other.err()),
    }
}

#[test]
fn ticket_for_an_already_visible_vm_is_not_applied_twice() {
    let pipeline = AllocationPipeline::new();

    let mut ticketed = server("ticketed", 2048);
    add_vm(&mut ticketed, "new-vm", "other-owner", 600);
    let servers = vec![ticketed];

    let mut demand = demand(512, OWNER);
    demand.tickets = vec![provision_ticket(
        "ticketed",
        "new-vm",
        Some(ticket_extra("other-owner", 600, "joyent")),
    )];

    // 2048 - 600 = 1448 MiB stays available; a second synthetic copy would
    // have halved that
    let winner = pipeline.select(&demand, servers).unwrap();
    assert_eq!(winner.uuid, "ticketed");
}

#[test]
fn demand_parses_from_collaborator_json() {
    let demand: Demand = serde_json::from_str(
        r#"{
            "ram": 512,
            "nic_tags": ["external"],
            "owner_uuid": "d4bb1b60-9172-4c58-964e-fe58a9989708",
            "locality": { "near": "some-vm", "far": ["other-vm", "r02"] }
        }"#,
    )
    .unwrap();

    assert_eq!(demand.ram, 512);
    assert_eq!(demand.nic_tags, vec!["external"]);
    assert!(!demand.capacity);
    let locality = demand.locality.unwrap();
    assert_eq!(locality.near.unwrap().ids(), vec!["some-vm"]);
    assert_eq!(locality.far.unwrap().ids(), vec!["other-vm", "r02"]);
}

#[test]
fn server_parses_from_collaborator_json() {
    let server: Server = serde_json::from_str(
        r#"{
            "uuid": "2bb4c1de-16b5-11e4-8e8e-07469af29312",
            "status": "running",
            "reserved": false,
            "setup": true,
            "memory_total_bytes": 2147483648,
            "memory_available_bytes": 1073741824,
            "rack_identifier": "r01",
            "interfaces": {
                "e1000g0": { "link_status": "up", "nic_tags": ["admin"] }
            },
            "vms": {
                "f2c04e6e-1b44-4c3f-a0cb-77f9b22b75c4": {
                    "owner_uuid": "d4bb1b60-9172-4c58-964e-fe58a9989708",
                    "max_physical_memory": 512,
                    "brand": "joyent",
                    "state": "running"
                }
            }
        }"#,
    )
    .unwrap();

    assert_eq!(server.rack_identifier.as_deref(), Some("r01"));
    assert_eq!(server.unreserved_ram(), 2048 - 512);
}
