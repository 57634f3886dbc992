// Core layer - shared types and configuration
pub mod core;

// Storage layer - calendar item stores
pub mod store;

// Features layer - all feature modules
pub mod features;

// API layer - HTTP surface for device apps
pub mod api;

pub use core::{Config, ScheduleConfig};
pub use store::{CalendarKey, FsItemStore, ItemStore};

pub use features::{
    // Delivery
    ConfirmationCache, DeliveryDispatcher, FcmTransport, LogTransport,
    // Reminders
    ReminderItem, ReminderWriter,
    // Schedule
    ScheduleGenerator, WorkHoursProjector,
    // Subscriptions
    SubscriptionRegistry,
    // Watcher
    ChangeWatcher,
};
