//! In-memory item store
//!
//! Backs unit tests. Test builds can also inject failures: per item id for
//! deletes, for listings only, or for the whole store.

use super::{CalendarKey, ItemStore};
use crate::features::reminders::ReminderItem;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryItemStore {
    /// calendar -> item id -> rendered body
    calendars: RwLock<BTreeMap<CalendarKey, BTreeMap<String, String>>>,
    failing_deletes: RwLock<HashSet<String>>,
    failing_listings: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a bare item id, as if written by another client
    pub async fn insert_id(&self, calendar: &CalendarKey, id: &str) {
        self.calendars
            .write()
            .await
            .entry(calendar.clone())
            .or_default()
            .insert(id.to_string(), String::new());
    }

    /// Remove an item behind the watcher's back
    pub async fn remove_id(&self, calendar: &CalendarKey, id: &str) {
        if let Some(items) = self.calendars.write().await.get_mut(calendar) {
            items.remove(id);
        }
    }

    pub async fn ids(&self, calendar: &CalendarKey) -> BTreeSet<String> {
        self.calendars
            .read()
            .await
            .get(calendar)
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn body(&self, calendar: &CalendarKey, id: &str) -> Option<String> {
        self.calendars
            .read()
            .await
            .get(calendar)
            .and_then(|items| items.get(id).cloned())
    }

    /// Make every delete of `id` fail until cleared
    #[cfg(test)]
    pub async fn fail_deletes_for(&self, id: &str) {
        self.failing_deletes.write().await.insert(id.to_string());
    }

    #[cfg(test)]
    pub async fn clear_delete_failures(&self) {
        self.failing_deletes.write().await.clear();
    }

    /// Fail every operation
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail listings while writes and deletes keep working
    #[cfg(test)]
    pub fn set_listings_failing(&self, failing: bool) {
        self.failing_listings.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(anyhow!("item store unavailable"))
        } else {
            Ok(())
        }
    }

    fn check_listable(&self) -> Result<()> {
        self.check_available()?;
        if self.failing_listings.load(Ordering::SeqCst) {
            Err(anyhow!("item store listing failed"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn list_owners(&self) -> Result<Vec<String>> {
        self.check_listable()?;
        let owners: BTreeSet<String> = self
            .calendars
            .read()
            .await
            .keys()
            .map(|key| key.owner.clone())
            .collect();
        Ok(owners.into_iter().collect())
    }

    async fn list_collections(&self, owner: &str) -> Result<Vec<String>> {
        self.check_listable()?;
        Ok(self
            .calendars
            .read()
            .await
            .keys()
            .filter(|key| key.owner == owner)
            .map(|key| key.collection.clone())
            .collect())
    }

    async fn list_item_ids(&self, calendar: &CalendarKey) -> Result<Vec<String>> {
        self.check_listable()?;
        Ok(self.ids(calendar).await.into_iter().collect())
    }

    async fn write_item(&self, item: &ReminderItem) -> Result<()> {
        self.check_available()?;
        self.calendars
            .write()
            .await
            .entry(item.calendar.clone())
            .or_default()
            .insert(item.id(), item.render_ics());
        Ok(())
    }

    async fn delete_item(&self, calendar: &CalendarKey, id: &str) -> Result<()> {
        self.check_available()?;
        if self.failing_deletes.read().await.contains(id) {
            return Err(anyhow!("injected delete failure for {calendar}/{id}"));
        }

        let mut calendars = self.calendars.write().await;
        let removed = calendars
            .get_mut(calendar)
            .and_then(|items| items.remove(id));
        match removed {
            Some(_) => Ok(()),
            None => Err(anyhow!("no item {id} in {calendar}")),
        }
    }
}
