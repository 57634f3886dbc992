//! # Core Module
//!
//! Configuration, time source and persisted-state helpers shared by every feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add state_file module for whole-record JSON persistence
//! - 1.0.0: Initial creation with config and clock modules

pub mod clock;
pub mod config;
pub mod state_file;

// Re-export commonly used items
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ScheduleConfig};
pub use state_file::{load_json, save_json};
