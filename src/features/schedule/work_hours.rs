//! # Work Hours Projection
//!
//! Warps a raw schedule so every instant lands inside the active daily window.
//!
//! The batch is first anchored so its earliest instant starts inside the
//! window. A sweep over end-of-window boundaries then accepts whatever falls
//! before the current boundary and pushes everything else forward by the
//! inactive stretch, one day at a time, until nothing is left pending.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Keep sweeping past the horizon so no instant is dropped
//! - 1.0.0: Initial release

use crate::core::ScheduleConfig;
use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use log::debug;

#[derive(Debug, Clone)]
pub struct WorkHoursProjector {
    start_hour: u32,
    end_hour: u32,
    end_time: NaiveTime,
    inactive: Duration,
    scale_factor: f64,
}

impl WorkHoursProjector {
    pub fn new(config: &ScheduleConfig) -> Result<Self> {
        config.validate()?;
        let end_time = NaiveTime::from_hms_opt(config.active_end_hour, 0, 0)
            .ok_or_else(|| anyhow!("invalid active_end_hour {}", config.active_end_hour))?;

        Ok(Self {
            start_hour: config.active_start_hour,
            end_hour: config.active_end_hour,
            end_time,
            inactive: Duration::hours(config.inactive_hours() as i64),
            scale_factor: config.scale_factor(),
        })
    }

    /// Whether `dt` falls inside `[start_hour, end_hour)` of its own day
    pub fn contains(&self, dt: NaiveDateTime) -> bool {
        (self.start_hour..self.end_hour).contains(&dt.hour())
    }

    /// Project `instants` into the active window, preserving count and order
    pub fn project(&self, instants: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
        if instants.is_empty() {
            return Vec::new();
        }

        let mut pending = instants.to_vec();
        pending.sort();

        let first = pending[0];
        if !self.contains(first) {
            let shift = self.gap_to_window_start(first);
            for dt in pending.iter_mut() {
                *dt += shift;
            }
        }

        let sp = pending[0];
        let last = pending[pending.len() - 1];
        let elapsed_days = (last - sp).num_days();
        let horizon_minutes = elapsed_days as f64 * self.scale_factor * 1440.0;
        let horizon = sp + Duration::minutes(horizon_minutes.round() as i64);

        let mut boundaries = self.day_boundaries(sp, horizon).into_iter();
        let mut boundary = sp.date().and_time(self.end_time);
        let mut accepted = Vec::with_capacity(pending.len());
        let mut sweeps = 0usize;

        while !pending.is_empty() {
            boundary = match boundaries.next() {
                Some(b) => b,
                None => boundary + Duration::days(1),
            };
            sweeps += 1;

            let (fits, deferred): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(|dt| *dt < boundary);
            accepted.extend(fits);
            pending = deferred.into_iter().map(|dt| dt + self.inactive).collect();
        }

        debug!(
            "Projected {} instants into {}:00-{}:00 over {} boundaries",
            accepted.len(),
            self.start_hour,
            self.end_hour,
            sweeps
        );

        // Acceptance follows boundary order, not input order
        accepted.sort();
        accepted
    }

    /// Distance from `dt` to the next window opening at the same minute and second
    fn gap_to_window_start(&self, dt: NaiveDateTime) -> Duration {
        let mut gap = Duration::hours(self.start_hour as i64 - dt.hour() as i64);
        if dt.hour() >= self.end_hour {
            gap += Duration::days(1);
        }
        gap
    }

    /// End-of-window instants for each day from `sp` until three days past `horizon`
    fn day_boundaries(&self, sp: NaiveDateTime, horizon: NaiveDateTime) -> Vec<NaiveDateTime> {
        let limit = horizon + Duration::days(3);
        let mut boundaries = Vec::new();
        let mut current = sp;
        while current < limit {
            boundaries.push(current.date().and_time(self.end_time));
            current += Duration::days(1);
        }
        boundaries
    }
}
