pub mod calculate_ticketed_vms;
pub mod hard_filter_invalid_servers;
pub mod hard_filter_min_ram;
pub mod hard_filter_owner_same_racks;
pub mod hard_filter_reserved;
pub mod hard_filter_running;
pub mod hard_filter_setup;
pub mod hard_filter_vlans;
pub mod identity;
pub mod pick_weighted_random;
pub mod soft_filter_large_servers;
pub mod soft_filter_locality_hints;
pub mod soft_filter_recent_servers;
pub mod sort_2adic;
pub mod sort_ram;
