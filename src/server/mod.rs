//! HTTP transport around the registry.

mod handler;
mod runner;
mod signal;
mod status;
pub mod state;

pub use runner::{build_router, run_server};
