//! Sheetmap API Server module
//!
//! HTTP REST API for exporting and importing records against the schemas
//! loaded at startup. Run with `sheetmap-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
