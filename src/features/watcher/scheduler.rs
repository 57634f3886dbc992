//! # Change Watcher
//!
//! The polling loop: reap expired items, diff the store against the last
//! snapshot, notify subscribers, then persist the new snapshot and any fresh
//! delivery confirmations. Cycles run one after another in a single task.
//!
//! - **Version**: 1.1.1
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.1: Abort the cycle instead of panicking on an out-of-range cutoff
//! - 1.1.0: Fold reaped items into the removal notices
//! - 1.0.0: Initial release with new-item detection

use super::detector::{detect, scan, Changes};
use super::reaper::reap;
use super::snapshot::Snapshot;
use crate::core::{load_json, save_json, Clock};
use crate::features::delivery::{ConfirmationCache, DeliveryDispatcher, DispatchSummary};
use crate::store::ItemStore;
use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// What one polling cycle did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub changes: Changes,
    pub dispatch: DispatchSummary,
}

pub struct ChangeWatcher {
    store: Arc<dyn ItemStore>,
    dispatcher: DeliveryDispatcher,
    confirmations: Arc<ConfirmationCache>,
    clock: Arc<dyn Clock>,
    snapshot: Snapshot,
    snapshot_path: Option<PathBuf>,
    confirmations_path: Option<PathBuf>,
    retention: chrono::Duration,
}

impl ChangeWatcher {
    pub fn new(
        store: Arc<dyn ItemStore>,
        dispatcher: DeliveryDispatcher,
        confirmations: Arc<ConfirmationCache>,
        clock: Arc<dyn Clock>,
        retention: chrono::Duration,
    ) -> Self {
        Self {
            store,
            dispatcher,
            confirmations,
            clock,
            snapshot: Snapshot::new(),
            snapshot_path: None,
            confirmations_path: None,
            retention,
        }
    }

    /// Restore the last snapshot from `snapshot_path` and persist state there
    /// (and confirmations to `confirmations_path`) after each cycle
    pub async fn with_persistence(
        mut self,
        snapshot_path: PathBuf,
        confirmations_path: PathBuf,
    ) -> Self {
        self.snapshot = load_json(&snapshot_path).await;
        info!(
            "Restored snapshot with {} known items",
            self.snapshot.item_count()
        );
        self.snapshot_path = Some(snapshot_path);
        self.confirmations_path = Some(confirmations_path);
        self
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Poll forever, one cycle per `interval`
    pub async fn run(mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("[Watcher] Started (interval: {interval:?})");

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_cycle().await {
                error!("[Watcher] Cycle aborted, retrying next interval: {e:#}");
            }
        }
    }

    /// One reap -> detect -> dispatch -> persist pass
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(self.retention)
            .ok_or_else(|| anyhow!("retention {} reaches past the calendar", self.retention))?;

        let mut previous = self.snapshot.clone();
        let reaped = reap(self.store.as_ref(), &previous, cutoff).await;
        previous.subtract(&reaped);

        // On failure the stored snapshot is left alone; anything reaped above
        // is still in it and will surface as a removal once the store is back.
        let current = scan(self.store.as_ref()).await?;

        let mut changes = detect(&current, &previous);
        changes.removed.merge(&reaped);

        if changes.is_empty() {
            debug!("[Watcher] No changes");
            self.flush_confirmations().await;
            return Ok(CycleReport::default());
        }

        info!(
            "[Watcher] {} added, {} removed",
            changes.added.item_count(),
            changes.removed.item_count()
        );

        let dispatch = self.dispatcher.dispatch(&changes).await;

        self.snapshot = current;
        if let Some(path) = &self.snapshot_path {
            save_json(path, &self.snapshot).await?;
        }
        self.flush_confirmations().await;

        Ok(CycleReport { changes, dispatch })
    }

    async fn flush_confirmations(&self) {
        if let Some(path) = &self.confirmations_path {
            if let Err(e) = self.confirmations.flush(path).await {
                warn!("[Watcher] Failed to persist delivery confirmations: {e:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use crate::features::delivery::{ActionKind, NotificationPayload, NotificationTransport};
    use crate::features::subscriptions::SubscriptionRegistry;
    use crate::store::{CalendarKey, MemoryItemStore};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<(String, NotificationPayload)>>);

    #[async_trait]
    impl NotificationTransport for Outbox {
        async fn send(&self, token: &str, payload: &NotificationPayload) -> anyhow::Result<()> {
            self.0.lock().await.push((token.to_string(), payload.clone()));
            Ok(())
        }
    }

    const OLD: &str = "20240101T090000";
    const FRESH: &str = "20240110T090000";

    fn work() -> CalendarKey {
        CalendarKey::new("alice", "work")
    }

    struct Harness {
        store: Arc<MemoryItemStore>,
        outbox: Arc<Outbox>,
        confirmations: Arc<ConfirmationCache>,
        watcher: ChangeWatcher,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryItemStore::new());
        let outbox = Arc::new(Outbox::default());
        let confirmations = Arc::new(ConfirmationCache::new());
        let registry = Arc::new(SubscriptionRegistry::from_entries([(
            "phone".to_string(),
            work(),
        )]));
        let dispatcher = DeliveryDispatcher::new(
            registry,
            confirmations.clone(),
            outbox.clone(),
            Duration::from_secs(1),
        );
        let now = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let watcher = ChangeWatcher::new(
            store.clone(),
            dispatcher,
            confirmations.clone(),
            Arc::new(FixedClock(now)),
            chrono::Duration::hours(24),
        );

        Harness {
            store,
            outbox,
            confirmations,
            watcher,
        }
    }

    #[tokio::test]
    async fn test_new_item_announced_once() {
        let mut h = harness();
        h.store.insert_id(&work(), FRESH).await;

        let first = h.watcher.run_cycle().await.unwrap();
        assert!(first.changes.added.contains(&work(), FRESH));
        assert_eq!(first.dispatch.sent, 1);

        let second = h.watcher.run_cycle().await.unwrap();
        assert!(second.changes.is_empty());
        assert_eq!(h.outbox.0.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_external_removal_announced() {
        let mut h = harness();
        h.store.insert_id(&work(), FRESH).await;
        h.watcher.run_cycle().await.unwrap();

        h.store.remove_id(&work(), FRESH).await;
        let report = h.watcher.run_cycle().await.unwrap();

        assert!(report.changes.removed.contains(&work(), FRESH));
        let outbox = h.outbox.0.lock().await;
        assert_eq!(outbox[1].1.action, ActionKind::Removed);
    }

    #[tokio::test]
    async fn test_expired_item_reaped_and_removed_exactly_once() {
        let mut h = harness();
        h.store.insert_id(&work(), OLD).await;
        h.store.insert_id(&work(), FRESH).await;
        h.watcher.run_cycle().await.unwrap();

        let report = h.watcher.run_cycle().await.unwrap();
        assert_eq!(report.changes.removed.item_count(), 1);
        assert!(report.changes.removed.contains(&work(), OLD));
        assert!(!h.store.ids(&work()).await.contains(OLD));
        assert!(h.store.ids(&work()).await.contains(FRESH));

        let after = h.watcher.run_cycle().await.unwrap();
        assert!(after.changes.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_aborts_without_losing_state() {
        let mut h = harness();
        h.store.insert_id(&work(), FRESH).await;
        h.watcher.run_cycle().await.unwrap();
        let known = h.watcher.snapshot().clone();

        h.store.set_unavailable(true);
        assert!(h.watcher.run_cycle().await.is_err());
        assert_eq!(h.watcher.snapshot(), &known);

        h.store.set_unavailable(false);
        let report = h.watcher.run_cycle().await.unwrap();
        assert!(report.changes.is_empty());
    }

    #[tokio::test]
    async fn test_item_reaped_before_failed_scan_removed_once_on_recovery() {
        let mut h = harness();
        h.store.insert_id(&work(), OLD).await;
        h.store.insert_id(&work(), FRESH).await;
        h.watcher.run_cycle().await.unwrap();

        // Reaping succeeds, then listing the store fails
        h.store.set_listings_failing(true);
        assert!(h.watcher.run_cycle().await.is_err());
        assert!(!h.store.ids(&work()).await.contains(OLD));
        assert!(h.watcher.snapshot().contains(&work(), OLD));

        h.store.set_listings_failing(false);
        let recovered = h.watcher.run_cycle().await.unwrap();
        assert!(recovered.changes.added.is_empty());
        assert_eq!(recovered.changes.removed.item_count(), 1);
        assert!(recovered.changes.removed.contains(&work(), OLD));
        assert_eq!(recovered.dispatch.sent, 1);

        let after = h.watcher.run_cycle().await.unwrap();
        assert!(after.changes.is_empty());
        assert!(!h.watcher.snapshot().contains(&work(), OLD));
    }

    #[tokio::test]
    async fn test_out_of_range_retention_aborts_cycle() {
        let mut h = harness();
        h.watcher.retention = chrono::Duration::days(365 * 280_000);
        h.store.insert_id(&work(), FRESH).await;

        assert!(h.watcher.run_cycle().await.is_err());
        assert!(h.watcher.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_change_set_is_not_resent() {
        let mut h = harness();
        h.store.insert_id(&work(), FRESH).await;
        h.confirmations
            .confirm_files(ActionKind::Added, &[format!("alice/work/{FRESH}.ics")]);

        let report = h.watcher.run_cycle().await.unwrap();
        assert_eq!(report.dispatch.sent, 0);
        assert_eq!(report.dispatch.suppressed, 1);
        assert!(h.outbox.0.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_persisted_and_restored() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("known_files.json");
        let confirmations_path = dir.path().join("delivery_confirmations.json");

        let h = harness();
        h.store.insert_id(&work(), FRESH).await;
        let mut watcher = h
            .watcher
            .with_persistence(snapshot_path.clone(), confirmations_path.clone())
            .await;
        watcher.run_cycle().await.unwrap();
        assert!(snapshot_path.exists());

        // A restarted watcher does not re-announce known items
        let restarted = harness();
        restarted.store.insert_id(&work(), FRESH).await;
        let mut watcher = restarted
            .watcher
            .with_persistence(snapshot_path, confirmations_path)
            .await;
        let report = watcher.run_cycle().await.unwrap();
        assert!(report.changes.is_empty());
        assert!(restarted.outbox.0.lock().await.is_empty());
    }
}
