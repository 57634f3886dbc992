//! # Change Detector
//!
//! Enumerates the store into a [`Snapshot`] and diffs it against the previous
//! one. Detection itself is pure; persisting the new snapshot is the caller's
//! job once the diff has been acted on.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use super::snapshot::{ChangeSet, Snapshot};
use crate::store::{CalendarKey, ItemStore};
use anyhow::Result;
use std::collections::BTreeSet;

/// Additions and removals found in one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    pub added: ChangeSet,
    pub removed: ChangeSet,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Enumerate every owner, collection and item id currently in `store`
///
/// Any listing error aborts the scan; a partial view would read as removals.
pub async fn scan(store: &dyn ItemStore) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();

    for owner in store.list_owners().await? {
        for collection in store.list_collections(&owner).await? {
            let calendar = CalendarKey::new(owner.as_str(), collection);
            let ids = store.list_item_ids(&calendar).await?;
            snapshot.extend(&calendar, ids);
        }
    }

    Ok(snapshot)
}

/// `added = current - previous`, `removed = previous - current`, per calendar
pub fn detect(current: &Snapshot, previous: &Snapshot) -> Changes {
    let empty = BTreeSet::new();
    let calendars: BTreeSet<CalendarKey> = current
        .calendars()
        .chain(previous.calendars())
        .map(|(calendar, _)| calendar)
        .collect();

    let mut changes = Changes::default();
    for calendar in calendars {
        let now_ids = current.ids(&calendar).unwrap_or(&empty);
        let old_ids = previous.ids(&calendar).unwrap_or(&empty);

        changes
            .added
            .extend(&calendar, now_ids.difference(old_ids).cloned());
        changes
            .removed
            .extend(&calendar, old_ids.difference(now_ids).cloned());
    }

    changes
}
