//! Directory-tree item store
//!
//! `<root>/<owner>/<collection>/<id>.ics`, the layout a CalDAV server such as
//! Radicale keeps on disk. Hidden entries (`.Radicale.props`, caches) are ignored.

use super::{CalendarKey, ItemStore};
use crate::features::reminders::item::{item_file_name, ITEM_EXTENSION};
use crate::features::reminders::ReminderItem;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsItemStore {
    root: PathBuf,
}

impl FsItemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn calendar_dir(&self, calendar: &CalendarKey) -> PathBuf {
        self.root.join(&calendar.owner).join(&calendar.collection)
    }

    /// Names of visible subdirectories of `dir`
    async fn list_dirs(dir: &Path) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("listing {}", dir.display()))?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type().await?.is_dir() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl ItemStore for FsItemStore {
    async fn list_owners(&self) -> Result<Vec<String>> {
        // No root yet means nothing has been written
        if !tokio::fs::try_exists(&self.root)
            .await
            .with_context(|| format!("checking {}", self.root.display()))?
        {
            debug!("Collections root {} does not exist yet", self.root.display());
            return Ok(Vec::new());
        }
        Self::list_dirs(&self.root).await
    }

    async fn list_collections(&self, owner: &str) -> Result<Vec<String>> {
        Self::list_dirs(&self.root.join(owner)).await
    }

    async fn list_item_ids(&self, calendar: &CalendarKey) -> Result<Vec<String>> {
        let dir = self.calendar_dir(calendar);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("listing {}", dir.display()))?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ITEM_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn write_item(&self, item: &ReminderItem) -> Result<()> {
        let dir = self.calendar_dir(&item.calendar);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;

        let path = dir.join(item_file_name(&item.id()));
        tokio::fs::write(&path, item.render_ics())
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        debug!("Wrote reminder {}", path.display());
        Ok(())
    }

    async fn delete_item(&self, calendar: &CalendarKey, id: &str) -> Result<()> {
        let path = self.calendar_dir(calendar).join(item_file_name(id));
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("deleting {}", path.display()))?;
        Ok(())
    }
}
