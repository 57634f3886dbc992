//! # Features Layer
//!
//! One module per feature. [`get_features`] lists them with their versions
//! for the startup banner.

pub mod delivery;
pub mod reminders;
pub mod schedule;
pub mod subscriptions;
pub mod watcher;

pub use delivery::{ConfirmationCache, DeliveryDispatcher, FcmTransport, LogTransport};
pub use reminders::{ReminderItem, ReminderWriter};
pub use schedule::{ScheduleGenerator, WorkHoursProjector};
pub use subscriptions::SubscriptionRegistry;
pub use watcher::ChangeWatcher;

/// Name and version of a feature module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Crate version from Cargo.toml
pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn get_features() -> Vec<FeatureInfo> {
    vec![
        FeatureInfo { name: "schedule", version: "1.0.0" },
        FeatureInfo { name: "reminders", version: "2.0.0" },
        FeatureInfo { name: "watcher", version: "1.1.0" },
        FeatureInfo { name: "delivery", version: "1.1.0" },
        FeatureInfo { name: "subscriptions", version: "1.0.0" },
    ]
}
