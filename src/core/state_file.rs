//! Whole-record JSON persistence
//!
//! Snapshot, subscriptions and delivery confirmations are each stored as a
//! single JSON document that is read fully at startup and rewritten fully
//! afterwards. A missing or corrupt file loads as the type's default.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load a JSON state file, falling back to `T::default()` when absent or malformed
pub async fn load_json<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No state file at {}, starting empty", path.display());
            return T::default();
        }
        Err(e) => {
            warn!("Failed to read {}: {e}. Starting empty", path.display());
            return T::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            warn!("Corrupt state file {}: {e}. Starting empty", path.display());
            T::default()
        }
    }
}

/// Rewrite a JSON state file in full
///
/// The record is written to a sibling temp file first and renamed into place,
/// so a crash mid-write leaves the previous version intact.
pub async fn save_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    let data = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &data)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replacing {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: HashMap<String, bool> = load_json(&dir.path().join("absent.json")).await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded: HashMap<String, bool> = load_json(&path).await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut value = HashMap::new();
        value.insert("abc".to_string(), true);
        save_json(&path, &value).await.unwrap();

        let loaded: HashMap<String, bool> = load_json(&path).await;
        assert_eq!(loaded, value);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
