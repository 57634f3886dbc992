//! # Expiry Reaper
//!
//! Deletes items whose start time is older than the retention cutoff. Runs
//! before detection so expired items are announced together with items
//! removed by users.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use super::snapshot::{ChangeSet, Snapshot};
use crate::features::reminders::parse_item_id;
use crate::store::ItemStore;
use chrono::NaiveDateTime;
use log::{debug, info, warn};

/// Delete every item in `previous` that started before `cutoff`
///
/// Returns the ids that were actually deleted. Ids that do not parse as a
/// timestamp are left alone, and a failed delete is left for the next cycle.
pub async fn reap(store: &dyn ItemStore, previous: &Snapshot, cutoff: NaiveDateTime) -> ChangeSet {
    let mut reaped = ChangeSet::new();

    for (calendar, ids) in previous.calendars() {
        for id in ids {
            let Some(start) = parse_item_id(id) else {
                debug!("Not reaping {calendar}/{id}: id is not a timestamp");
                continue;
            };
            if start >= cutoff {
                continue;
            }

            match store.delete_item(&calendar, id).await {
                Ok(()) => reaped.insert(&calendar, id.as_str()),
                Err(e) => warn!("Failed to reap expired item {calendar}/{id}: {e:#}"),
            }
        }
    }

    if !reaped.is_empty() {
        info!("Reaped {} expired items older than {cutoff}", reaped.item_count());
    }
    reaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::watcher::detector::scan;
    use crate::store::{CalendarKey, MemoryItemStore};
    use chrono::NaiveDate;

    const OLD: &str = "20240101T090000";
    const FRESH: &str = "20240105T090000";

    fn cutoff() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn work() -> CalendarKey {
        CalendarKey::new("alice", "work")
    }

    async fn seeded(ids: &[&str]) -> (MemoryItemStore, Snapshot) {
        let store = MemoryItemStore::new();
        for id in ids {
            store.insert_id(&work(), id).await;
        }
        let snapshot = scan(&store).await.unwrap();
        (store, snapshot)
    }

    #[tokio::test]
    async fn test_reaps_only_expired_items() {
        let (store, previous) = seeded(&[OLD, FRESH]).await;

        let reaped = reap(&store, &previous, cutoff()).await;

        assert_eq!(reaped.item_count(), 1);
        assert!(reaped.contains(&work(), OLD));
        assert_eq!(store.ids(&work()).await.into_iter().collect::<Vec<_>>(), vec![FRESH]);
    }

    #[tokio::test]
    async fn test_item_at_cutoff_survives() {
        let (store, previous) = seeded(&["20240103T000000"]).await;

        let reaped = reap(&store, &previous, cutoff()).await;
        assert!(reaped.is_empty());
        assert_eq!(store.ids(&work()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_ids_are_skipped() {
        let (store, previous) = seeded(&["shopping-list", OLD]).await;

        let reaped = reap(&store, &previous, cutoff()).await;
        assert_eq!(reaped.item_count(), 1);
        assert!(store.ids(&work()).await.contains("shopping-list"));
    }

    #[tokio::test]
    async fn test_failed_delete_is_not_reported_and_others_continue() {
        let (store, previous) = seeded(&[OLD, "20240102T090000"]).await;
        store.fail_deletes_for(OLD).await;

        let reaped = reap(&store, &previous, cutoff()).await;

        assert!(!reaped.contains(&work(), OLD));
        assert!(reaped.contains(&work(), "20240102T090000"));
        assert!(store.ids(&work()).await.contains(OLD));
    }

    #[tokio::test]
    async fn test_failed_delete_is_retried_next_cycle() {
        let (store, previous) = seeded(&[OLD]).await;
        store.fail_deletes_for(OLD).await;
        assert!(reap(&store, &previous, cutoff()).await.is_empty());

        store.clear_delete_failures().await;
        let reaped = reap(&store, &previous, cutoff()).await;
        assert!(reaped.contains(&work(), OLD));
    }
}
