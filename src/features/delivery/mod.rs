//! # Delivery Feature
//!
//! Notification payloads, at-least-once dispatch to subscribed devices, and
//! the confirmation cache that suppresses re-sends of acknowledged payloads.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Added removal notices and the confirmation cache
//! - 1.0.0: Initial release with new-item notices over FCM

pub mod confirmations;
pub mod dispatcher;
pub mod payload;
pub mod transport;

pub use confirmations::ConfirmationCache;
pub use dispatcher::{DeliveryDispatcher, DispatchSummary};
pub use payload::{ActionKind, DeliveryKey, NotificationPayload};
pub use transport::{FcmTransport, LogTransport, NotificationTransport};
