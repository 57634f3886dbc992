//! # Reminders Feature
//!
//! Reminder items, their on-disk representation, and the creation path that
//! turns a label plus a growth curve into stored items.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Items are written to the calendar store as VTODO documents
//! - 1.0.0: Initial release

pub mod item;
pub mod writer;

pub use item::{item_id, item_path, parse_item_id, ReminderItem};
pub use writer::ReminderWriter;
