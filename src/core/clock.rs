//! Injectable wall clock
//!
//! Schedules and the active window are local wall-clock notions, so every
//! component asks a [`Clock`] for a naive local timestamp instead of calling
//! `Local::now()` directly.

use chrono::{Local, NaiveDateTime};

/// Source of "now" for schedule generation and expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
