//! Notification payloads and delivery keys
//!
//! The confirmation endpoint receives the same `(type, files)` pair a client
//! was sent, so both sides derive the key through [`DeliveryKey::new`].

use crate::features::reminders::item_path;
use crate::features::watcher::ChangeSet;
use crate::store::CalendarKey;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "new_files")]
    Added,
    #[serde(rename = "removed_files")]
    Removed,
}

impl ActionKind {
    /// Wire name carried in the payload's `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Added => "new_files",
            ActionKind::Removed => "removed_files",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "new_files" => Ok(ActionKind::Added),
            "removed_files" => Ok(ActionKind::Removed),
            _ => Err(anyhow!("Unknown action type: {}", s)),
        }
    }
}

/// One message for every subscriber of a calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub action: ActionKind,
    pub calendar: CalendarKey,
    /// Sorted item paths relative to the store root
    pub files: Vec<String>,
}

impl NotificationPayload {
    pub fn new(action: ActionKind, calendar: CalendarKey, ids: &BTreeSet<String>) -> Self {
        let files = ids.iter().map(|id| item_path(&calendar, id)).collect();
        Self {
            action,
            calendar,
            files,
        }
    }

    /// One payload per calendar in `changes`
    pub fn from_change_set(action: ActionKind, changes: &ChangeSet) -> Vec<Self> {
        changes
            .calendars()
            .map(|(calendar, ids)| Self::new(action, calendar, ids))
            .collect()
    }

    pub fn key(&self) -> DeliveryKey {
        DeliveryKey::new(self.action, &self.files)
    }

    /// Push data map; values must be strings, so `files` is JSON-encoded
    pub fn to_data(&self) -> Result<HashMap<String, String>> {
        let mut data = HashMap::new();
        data.insert("type".to_string(), self.action.as_str().to_string());
        data.insert("files".to_string(), serde_json::to_string(&self.files)?);
        Ok(data)
    }
}

/// Idempotency key for one `(action, files)` delivery
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryKey(String);

impl DeliveryKey {
    /// Hex SHA-256 over the action and the sorted, de-duplicated paths
    pub fn new<S: AsRef<str>>(action: ActionKind, files: &[S]) -> Self {
        let sorted: BTreeSet<&str> = files.iter().map(AsRef::as_ref).collect();

        let mut hasher = Sha256::new();
        hasher.update(action.as_str().as_bytes());
        for file in sorted {
            hasher.update(b"\n");
            hasher.update(file.as_bytes());
        }
        DeliveryKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
