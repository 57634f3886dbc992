//! # Schedule Feature
//!
//! Spaced-repetition instants shaped by a growth factor and warped into the
//! active daily window.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod generator;
pub mod work_hours;

pub use generator::{Curve, ScheduleGenerator};
pub use work_hours::WorkHoursProjector;
