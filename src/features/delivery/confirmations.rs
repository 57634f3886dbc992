//! # Delivery Confirmation Cache
//!
//! Remembers which `(action, files)` deliveries some recipient acknowledged.
//! Suppression is per payload, not per recipient: once any token confirms a
//! key, no token is sent that payload again. Entries never expire and never
//! flip back to unconfirmed.
//!
//! Confirmations arrive from request handlers while the polling loop reads
//! the cache, so entries live in a `DashMap` and the whole record is flushed
//! to disk by the loop at the end of a cycle.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use super::payload::{ActionKind, DeliveryKey};
use crate::core::{load_json, save_json};
use anyhow::Result;
use dashmap::DashMap;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct ConfirmationCache {
    entries: DashMap<DeliveryKey, bool>,
    dirty: AtomicBool,
}

impl ConfirmationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load persisted confirmations; a missing or corrupt file starts empty
    pub async fn load(path: &Path) -> Self {
        let stored: BTreeMap<DeliveryKey, bool> = load_json(path).await;
        info!("Loaded {} delivery confirmations", stored.len());

        let cache = Self::new();
        for (key, confirmed) in stored {
            cache.entries.insert(key, confirmed);
        }
        cache
    }

    pub fn is_confirmed(&self, key: &DeliveryKey) -> bool {
        self.entries.get(key).is_some_and(|confirmed| *confirmed)
    }

    /// Mark `key` confirmed; returns false if it already was
    pub fn confirm(&self, key: DeliveryKey) -> bool {
        let previous = self.entries.insert(key, true);
        let newly = previous != Some(true);
        if newly {
            self.dirty.store(true, Ordering::SeqCst);
        }
        newly
    }

    /// Confirmation as reported by a recipient
    pub fn confirm_files<S: AsRef<str>>(&self, action: ActionKind, files: &[S]) -> DeliveryKey {
        let key = DeliveryKey::new(action, files);
        if self.confirm(key.clone()) {
            debug!("Confirmed {action} delivery {key} ({} files)", files.len());
        }
        key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite the persisted record if anything changed since the last flush
    pub async fn flush(&self, path: &Path) -> Result<()> {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let record: BTreeMap<DeliveryKey, bool> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        if let Err(e) = save_json(path, &record).await {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }
        debug!("Flushed {} delivery confirmations", record.len());
        Ok(())
    }
}
