//! # Watcher Feature
//!
//! Periodic change detection over the item store with expiry and delivery.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Added the expiry reaper and removal detection
//! - 1.0.0: Initial release

pub mod detector;
pub mod reaper;
pub mod scheduler;
pub mod snapshot;

pub use detector::{detect, scan, Changes};
pub use reaper::reap;
pub use scheduler::{ChangeWatcher, CycleReport};
pub use snapshot::{ChangeSet, Snapshot};
