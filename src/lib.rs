// Library crate for integration tests.
// main.rs has its own mod declarations; this re-exports all modules.

pub mod config;
pub mod error;
pub mod fixes;
pub mod fixtures;
pub mod generation;
pub mod handoff;
pub mod lead;
pub mod log_capture;
pub mod progress;
pub mod report;
pub mod results;
pub mod routes;
pub mod scan;
pub mod screen;
pub mod server;
pub mod setup;
pub mod state;
pub mod store_url;
