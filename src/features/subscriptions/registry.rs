//! # Subscription Registry
//!
//! Maps device tokens to the one calendar each token listens to. Registering a
//! token for a calendar evicts every other token registered for that same
//! calendar, so the most recent device wins.
//!
//! The record is rewritten in full on every registration.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::core::{load_json, save_json};
use crate::store::CalendarKey;
use anyhow::Result;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    tokens: RwLock<HashMap<String, CalendarKey>>,
    /// Where the record is persisted; `None` keeps it in memory only
    path: Option<PathBuf>,
}

impl SubscriptionRegistry {
    /// In-memory registry seeded with `(token, calendar)` pairs
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, CalendarKey)>,
    {
        Self {
            tokens: RwLock::new(entries.into_iter().collect()),
            path: None,
        }
    }

    /// Load the persisted record; entries with malformed calendar ids are dropped
    pub async fn load(path: PathBuf) -> Self {
        let stored: HashMap<String, String> = load_json(&path).await;
        let mut tokens = HashMap::with_capacity(stored.len());

        for (token, calendar_id) in stored {
            match calendar_id.parse::<CalendarKey>() {
                Ok(calendar) => {
                    tokens.insert(token, calendar);
                }
                Err(e) => warn!("Dropping subscription with bad calendar id: {e}"),
            }
        }

        info!("Loaded {} subscriptions", tokens.len());
        Self {
            tokens: RwLock::new(tokens),
            path: Some(path),
        }
    }

    /// Subscribe `token` to `calendar`, replacing any other token on that calendar
    pub async fn register(&self, token: &str, calendar: CalendarKey) -> Result<()> {
        let mut tokens = self.tokens.write().await;

        let before = tokens.len();
        tokens.retain(|t, c| !(c == &calendar && t != token));
        let evicted = before - tokens.len();
        tokens.insert(token.to_string(), calendar.clone());

        info!("Registered token for {calendar} ({evicted} previous tokens evicted)");

        if let Some(path) = &self.path {
            let record: BTreeMap<&str, String> = tokens
                .iter()
                .map(|(t, c)| (t.as_str(), c.to_string()))
                .collect();
            save_json(path, &record).await?;
        }
        Ok(())
    }

    /// Tokens subscribed to exactly `calendar`, sorted
    pub async fn tokens_for(&self, calendar: &CalendarKey) -> Vec<String> {
        let mut matching: Vec<String> = self
            .tokens
            .read()
            .await
            .iter()
            .filter(|(_, c)| *c == calendar)
            .map(|(t, _)| t.clone())
            .collect();
        matching.sort();
        matching
    }

    pub async fn calendar_for(&self, token: &str) -> Option<CalendarKey> {
        self.tokens.read().await.get(token).cloned()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work() -> CalendarKey {
        CalendarKey::new("alice", "work")
    }

    fn home() -> CalendarKey {
        CalendarKey::new("alice", "home")
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = SubscriptionRegistry::default();
        registry.register("phone", work()).await.unwrap();

        assert_eq!(registry.tokens_for(&work()).await, vec!["phone"]);
        assert!(registry.tokens_for(&home()).await.is_empty());
        assert_eq!(registry.calendar_for("phone").await, Some(work()));
    }

    #[tokio::test]
    async fn test_new_token_evicts_previous_token_for_calendar() {
        let registry = SubscriptionRegistry::default();
        registry.register("old-phone", work()).await.unwrap();
        registry.register("new-phone", work()).await.unwrap();

        assert_eq!(registry.tokens_for(&work()).await, vec!["new-phone"]);
        assert_eq!(registry.calendar_for("old-phone").await, None);
    }

    #[tokio::test]
    async fn test_token_moves_between_calendars() {
        let registry = SubscriptionRegistry::default();
        registry.register("phone", work()).await.unwrap();
        registry.register("tablet", home()).await.unwrap();
        registry.register("phone", home()).await.unwrap();

        assert!(registry.tokens_for(&work()).await.is_empty());
        assert_eq!(registry.tokens_for(&home()).await, vec!["phone"]);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_seeded_calendar_may_hold_many_tokens() {
        let registry = SubscriptionRegistry::from_entries([
            ("phone".to_string(), work()),
            ("tablet".to_string(), work()),
        ]);
        assert_eq!(registry.tokens_for(&work()).await, vec!["phone", "tablet"]);
    }

    #[tokio::test]
    async fn test_persisted_record_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fcm_tokens.json");

        let registry = SubscriptionRegistry::load(path.clone()).await;
        registry.register("phone", work()).await.unwrap();

        let raw: HashMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["phone"], "alice/work");

        let reloaded = SubscriptionRegistry::load(path).await;
        assert_eq!(reloaded.tokens_for(&work()).await, vec!["phone"]);
    }

    #[tokio::test]
    async fn test_bad_entries_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fcm_tokens.json");
        std::fs::write(&path, r#"{"phone": "alice/work", "tablet": "nonsense"}"#).unwrap();

        let registry = SubscriptionRegistry::load(path).await;
        assert_eq!(registry.len().await, 1);
    }
}
