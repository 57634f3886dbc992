//! # Schedule Generator
//!
//! Produces the raw reminder instants for one request. The growth factor picks
//! the curve:
//!
//! - `1.0`: evenly spaced, one step per active-window-scaled day
//! - `> 1.0`: exponential spacing sampled once per day, fast early and slow later
//! - anything else: a single reminder shortly after "now"
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Start sampling at the first future day so growth near 1 still schedules
//! - 1.1.0: Skip past samples on the exponential curve instead of emitting them
//! - 1.0.0: Initial release

use crate::core::ScheduleConfig;
use chrono::{Duration, NaiveDateTime};

const DAY_MINUTES: f64 = 1440.0;

/// Week-plus-a-day pulled off every exponential sample
const CORRECTION_MINUTES: f64 = 8.0 * DAY_MINUTES;

/// Upper bound on curve evaluations past the first future sample
const MAX_CURVE_SAMPLES: u64 = 100_000;

/// Samples past this offset are not scheduled
const HORIZON_MINUTES: f64 = 100.0 * 365.0 * DAY_MINUTES;

/// Shape of the generated series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Uniform,
    Exponential,
    Single,
}

impl Curve {
    pub fn for_growth(growth: f64) -> Self {
        if growth == 1.0 {
            Curve::Uniform
        } else if growth > 1.0 {
            Curve::Exponential
        } else {
            // Also catches NaN
            Curve::Single
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    lead_minutes: f64,
    uniform_samples: usize,
    scale_factor: f64,
}

impl ScheduleGenerator {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            lead_minutes: config.lead_minutes as f64,
            uniform_samples: config.uniform_samples,
            scale_factor: config.scale_factor(),
        }
    }

    /// Generate up to `count` strictly increasing instants after `now`
    ///
    /// The single-reminder curve always yields exactly one instant.
    pub fn generate(&self, now: NaiveDateTime, count: usize, growth: f64) -> Vec<NaiveDateTime> {
        match Curve::for_growth(growth) {
            Curve::Uniform => self.uniform(now, count),
            Curve::Exponential => self.exponential(now, count, growth),
            Curve::Single => vec![now + minutes(self.lead_minutes)],
        }
    }

    fn uniform(&self, now: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
        (0..count.min(self.uniform_samples))
            .map(|i| {
                let offset = self.lead_minutes + i as f64 * DAY_MINUTES / self.scale_factor;
                now + minutes(offset)
            })
            .collect()
    }

    fn exponential(&self, now: NaiveDateTime, count: usize, growth: f64) -> Vec<NaiveDateTime> {
        let mut instants: Vec<NaiveDateTime> = Vec::with_capacity(count.min(64));
        let first = self.first_future_sample(growth);

        for k in first..first.saturating_add(MAX_CURVE_SAMPLES) {
            if instants.len() >= count {
                break;
            }

            let elapsed_days = growth.powf(k as f64);
            let offset = self.lead_minutes + elapsed_days * DAY_MINUTES - CORRECTION_MINUTES;
            if !offset.is_finite() || offset > HORIZON_MINUTES {
                break;
            }

            let instant = now + minutes(offset);
            let after_previous = instants.last().map_or(true, |last| instant > *last);
            if instant > now && after_previous {
                instants.push(instant);
            }
        }

        instants
    }

    /// Day index just before the curve first passes "now"
    ///
    /// Solves `growth^k > (correction - lead) / day` for `k`, one step early
    /// to absorb rounding.
    fn first_future_sample(&self, growth: f64) -> u64 {
        let threshold = (CORRECTION_MINUTES - self.lead_minutes) / DAY_MINUTES;
        if threshold <= 1.0 {
            return 0;
        }

        let k = (threshold.ln() / growth.ln()).ceil();
        if k.is_finite() && k > 1.0 {
            (k - 1.0) as u64
        } else {
            0
        }
    }
}

fn minutes(value: f64) -> Duration {
    Duration::milliseconds((value * 60_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn jan_first() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn generator() -> ScheduleGenerator {
        ScheduleGenerator::new(&ScheduleConfig::default())
    }

    fn gaps(instants: &[NaiveDateTime]) -> Vec<i64> {
        instants
            .windows(2)
            .map(|w| (w[1] - w[0]).num_seconds())
            .collect()
    }

    #[test]
    fn test_curve_selection() {
        assert_eq!(Curve::for_growth(1.0), Curve::Uniform);
        assert_eq!(Curve::for_growth(1.5), Curve::Exponential);
        assert_eq!(Curve::for_growth(0.5), Curve::Single);
        assert_eq!(Curve::for_growth(f64::NAN), Curve::Single);
    }

    #[test]
    fn test_uniform_three_reminders() {
        let now = jan_first();
        let out = generator().generate(now, 3, 1.0);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], now + Duration::minutes(30));
        // 1 day scaled by 14/24 is 840 minutes
        assert_eq!(gaps(&out), vec![840 * 60, 840 * 60]);
        assert!(out.iter().all(|dt| *dt >= now + Duration::minutes(30)));
    }

    #[test]
    fn test_uniform_is_capped_by_sample_count() {
        let out = generator().generate(jan_first(), 100, 1.0);
        assert_eq!(out.len(), 30);
    }

    #[test]
    fn test_exponential_gaps_grow() {
        let now = jan_first();
        let out = generator().generate(now, 5, 2.0);

        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|dt| *dt > now));
        let gaps = gaps(&out);
        assert!(gaps.windows(2).all(|w| w[1] > w[0]), "gaps not growing: {gaps:?}");
    }

    #[test]
    fn test_exponential_skips_past_samples() {
        // With j = 2 the first three day samples land before "now"; the
        // fourth sits exactly on the lead time.
        let now = jan_first();
        let out = generator().generate(now, 3, 2.0);

        assert_eq!(out[0], now + Duration::minutes(30));
        assert_eq!(out[1], now + Duration::minutes(30 + 8 * 1440));
        assert_eq!(out[2], now + Duration::minutes(30 + 24 * 1440));
    }

    #[test]
    fn test_exponential_stops_at_horizon() {
        let out = generator().generate(jan_first(), 50, 100.0);
        assert!(!out.is_empty());
        assert!(out.len() < 50);
    }

    #[test]
    fn test_growth_barely_above_one_still_schedules() {
        let now = jan_first();
        for growth in [1.0001, 1.00002, 1.00001] {
            let out = generator().generate(now, 3, growth);
            assert_eq!(out.len(), 3, "growth {growth}");
            assert!(out.windows(2).all(|w| w[0] < w[1]), "growth {growth}");
            assert!(out.iter().all(|dt| *dt > now), "growth {growth}");
            // The first sample lands within a few minutes of "now"
            assert!(out[0] <= now + Duration::minutes(5), "growth {growth}");
        }
    }

    #[test]
    fn test_first_future_sample() {
        // 2^3 = 8 just clears (11520 - 30) / 1440, so sampling starts at k = 2
        assert_eq!(generator().first_future_sample(2.0), 2);
        assert_eq!(generator().first_future_sample(100.0), 0);
    }

    #[test]
    fn test_single_reminder_ignores_count() {
        let now = jan_first();
        for count in [0, 1, 7] {
            let out = generator().generate(now, count, 0.5);
            assert_eq!(out, vec![now + Duration::minutes(30)]);
        }
    }

    #[test]
    fn test_zero_count() {
        assert!(generator().generate(jan_first(), 0, 1.0).is_empty());
        assert!(generator().generate(jan_first(), 0, 1.3).is_empty());
    }

    #[test]
    fn test_output_strictly_increasing() {
        let now = jan_first();
        for growth in [1.0, 1.01, 1.2, 1.7, 3.0] {
            let out = generator().generate(now, 10, growth);
            assert!(!out.is_empty());
            assert!(out.windows(2).all(|w| w[0] < w[1]), "growth {growth}");
            assert!(out.iter().all(|dt| *dt > now), "growth {growth}");
        }
    }
}
