//! # Reminder Writer
//!
//! The on-demand creation path: generate a schedule, fit it into work hours
//! and write one item per instant. Never touches the watcher's snapshot; new
//! items are announced by the next polling cycle.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::core::{Clock, ScheduleConfig};
use crate::features::reminders::ReminderItem;
use crate::features::schedule::{ScheduleGenerator, WorkHoursProjector};
use crate::store::{CalendarKey, ItemStore};
use anyhow::Result;
use chrono::Duration;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

pub struct ReminderWriter {
    store: Arc<dyn ItemStore>,
    clock: Arc<dyn Clock>,
    generator: ScheduleGenerator,
    projector: WorkHoursProjector,
    due_offset: Duration,
}

impl ReminderWriter {
    pub fn new(
        store: Arc<dyn ItemStore>,
        clock: Arc<dyn Clock>,
        config: &ScheduleConfig,
    ) -> Result<Self> {
        Ok(Self {
            store,
            clock,
            generator: ScheduleGenerator::new(config),
            projector: WorkHoursProjector::new(config)?,
            due_offset: Duration::minutes(config.due_offset_minutes),
        })
    }

    /// Schedule and write `count` reminders for `label` into `calendar`
    ///
    /// Instants that collapse onto an already used second are written once.
    pub async fn create(
        &self,
        label: &str,
        calendar: &CalendarKey,
        count: usize,
        growth: f64,
    ) -> Result<Vec<ReminderItem>> {
        let now = self.clock.now();
        let raw = self.generator.generate(now, count, growth);
        let projected = self.projector.project(&raw);

        let mut seen = HashSet::new();
        let mut written = Vec::with_capacity(projected.len());

        for start in projected {
            let item = ReminderItem::new(label, start, self.due_offset, calendar.clone());
            if !seen.insert(item.id()) {
                warn!("Skipping reminder {} in {calendar}: id already scheduled", item.id());
                continue;
            }
            self.store.write_item(&item).await?;
            written.push(item);
        }

        info!(
            "Created {} reminders in {calendar} (requested {count}, growth {growth})",
            written.len()
        );
        for item in &written {
            info!("  >> {}", item.start.format("%Y-%m-%d %H:%M:%S"));
        }

        Ok(written)
    }
}
