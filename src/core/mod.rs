pub mod config;
pub mod demand;
pub mod pipeline;
pub mod server;
pub mod state;
pub mod step;
pub mod steps;
