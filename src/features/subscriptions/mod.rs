//! # Subscriptions Feature
//!
//! Which device tokens listen to which calendar.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod registry;

pub use registry::SubscriptionRegistry;
