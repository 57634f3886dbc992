//! Owner -> collection -> item id sets
//!
//! Used both for the last observed store state and for per-action change sets.
//! Empty collections and owners are never kept, so absence means "nothing".

use crate::store::CalendarKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, BTreeMap<String, BTreeSet<String>>>);

/// Items added or removed in one cycle, same shape as a snapshot
pub type ChangeSet = Snapshot;

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.0
            .values()
            .flat_map(|collections| collections.values())
            .map(BTreeSet::len)
            .sum()
    }

    pub fn insert(&mut self, calendar: &CalendarKey, id: impl Into<String>) {
        self.0
            .entry(calendar.owner.clone())
            .or_default()
            .entry(calendar.collection.clone())
            .or_default()
            .insert(id.into());
    }

    /// Add `ids` under `calendar`; an empty set leaves the snapshot untouched
    pub fn extend<I, S>(&mut self, calendar: &CalendarKey, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.insert(calendar, id);
        }
    }

    pub fn contains(&self, calendar: &CalendarKey, id: &str) -> bool {
        self.ids(calendar).is_some_and(|ids| ids.contains(id))
    }

    pub fn ids(&self, calendar: &CalendarKey) -> Option<&BTreeSet<String>> {
        self.0
            .get(&calendar.owner)
            .and_then(|collections| collections.get(&calendar.collection))
    }

    /// Every calendar with at least one item, in key order
    pub fn calendars(&self) -> impl Iterator<Item = (CalendarKey, &BTreeSet<String>)> + '_ {
        self.0.iter().flat_map(|(owner, collections)| {
            collections
                .iter()
                .map(move |(collection, ids)| (CalendarKey::new(owner, collection), ids))
        })
    }

    /// Remove one id, pruning containers that become empty
    pub fn remove(&mut self, calendar: &CalendarKey, id: &str) -> bool {
        let Some(collections) = self.0.get_mut(&calendar.owner) else {
            return false;
        };
        let Some(ids) = collections.get_mut(&calendar.collection) else {
            return false;
        };

        let removed = ids.remove(id);
        if ids.is_empty() {
            collections.remove(&calendar.collection);
        }
        if collections.is_empty() {
            self.0.remove(&calendar.owner);
        }
        removed
    }

    /// Remove every id listed in `other`
    pub fn subtract(&mut self, other: &Snapshot) {
        for (calendar, ids) in other.calendars() {
            for id in ids {
                self.remove(&calendar, id);
            }
        }
    }

    /// Union `other` into `self`
    pub fn merge(&mut self, other: &Snapshot) {
        for (calendar, ids) in other.calendars() {
            self.extend(&calendar, ids.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work() -> CalendarKey {
        CalendarKey::new("alice", "work")
    }

    #[test]
    fn test_remove_prunes_empty_containers() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(&work(), "a");

        assert!(snapshot.remove(&work(), "a"));
        assert!(snapshot.is_empty());
        assert!(!snapshot.remove(&work(), "a"));
    }

    #[test]
    fn test_extend_with_nothing_stays_sparse() {
        let mut snapshot = Snapshot::new();
        snapshot.extend(&work(), Vec::<String>::new());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_merge_and_subtract() {
        let home = CalendarKey::new("alice", "home");
        let mut left = Snapshot::new();
        left.extend(&work(), ["a", "b"]);

        let mut right = Snapshot::new();
        right.insert(&work(), "c");
        right.insert(&home, "d");

        left.merge(&right);
        assert_eq!(left.item_count(), 4);
        assert!(left.contains(&home, "d"));

        left.subtract(&right);
        assert_eq!(left.item_count(), 2);
        assert!(left.ids(&home).is_none());
    }

    #[test]
    fn test_json_layout() {
        let mut snapshot = Snapshot::new();
        snapshot.extend(&work(), ["b", "a"]);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"alice":{"work":["a","b"]}}"#);
    }
}
