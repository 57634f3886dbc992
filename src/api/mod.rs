//! # API Layer
//!
//! HTTP endpoints used by device apps.

pub mod server;

pub use server::{router, run_server, AppState};
