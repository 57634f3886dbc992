//! # Item Store
//!
//! Hierarchical storage of reminder items keyed by owner, collection and item id.
//! The watcher and the creation path only see the [`ItemStore`] trait; the
//! filesystem layout is one implementation of it.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod fs;
pub mod memory;

use crate::features::reminders::ReminderItem;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use fs::FsItemStore;
pub use memory::MemoryItemStore;

/// `owner/collection` address of one calendar
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarKey {
    pub owner: String,
    pub collection: String,
}

impl CalendarKey {
    pub fn new(owner: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for CalendarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.collection)
    }
}

impl FromStr for CalendarKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (owner, collection) = s
            .trim_matches('/')
            .split_once('/')
            .ok_or_else(|| anyhow!("Calendar id must look like owner/collection: {s:?}"))?;

        for segment in [owner, collection] {
            if !is_valid_segment(segment) {
                return Err(anyhow!("Invalid calendar id segment {segment:?} in {s:?}"));
            }
        }

        Ok(CalendarKey::new(owner, collection))
    }
}

impl TryFrom<String> for CalendarKey {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CalendarKey> for String {
    fn from(key: CalendarKey) -> Self {
        key.to_string()
    }
}

/// Segments map to directory names, so separators and dot-prefixes are refused
fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains(['/', '\\', '\0'])
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn list_owners(&self) -> Result<Vec<String>>;

    async fn list_collections(&self, owner: &str) -> Result<Vec<String>>;

    async fn list_item_ids(&self, calendar: &CalendarKey) -> Result<Vec<String>>;

    async fn write_item(&self, item: &ReminderItem) -> Result<()>;

    async fn delete_item(&self, calendar: &CalendarKey, id: &str) -> Result<()>;
}
