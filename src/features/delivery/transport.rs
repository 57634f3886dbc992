//! # Notification Transports
//!
//! [`NotificationTransport`] is the seam between the dispatcher and whatever
//! actually reaches a device. [`FcmTransport`] posts to the Firebase Cloud
//! Messaging HTTP v1 API; [`LogTransport`] only logs and is used when FCM is
//! not configured.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Re-read the bearer token on every send so it can be rotated externally
//! - 1.0.0: Initial release with FCM and logging transports

use super::payload::NotificationPayload;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, token: &str, payload: &NotificationPayload) -> Result<()>;
}

/// Firebase Cloud Messaging, HTTP v1
pub struct FcmTransport {
    client: reqwest::Client,
    endpoint: String,
    access_token_file: PathBuf,
}

impl FcmTransport {
    pub fn new(project_id: &str, access_token_file: PathBuf, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("https://fcm.googleapis.com/v1/projects/{project_id}/messages:send"),
            access_token_file,
        })
    }

    /// OAuth bearer token maintained by an external refresher
    async fn access_token(&self) -> Result<String> {
        let token = tokio::fs::read_to_string(&self.access_token_file)
            .await
            .with_context(|| format!("reading {}", self.access_token_file.display()))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(anyhow!(
                "{} is empty",
                self.access_token_file.display()
            ));
        }
        Ok(token.to_string())
    }
}

#[async_trait]
impl NotificationTransport for FcmTransport {
    async fn send(&self, token: &str, payload: &NotificationPayload) -> Result<()> {
        let bearer = self.access_token().await?;
        let message = json!({
            "message": {
                "token": token,
                "data": payload.to_data()?,
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(bearer)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("FCM returned {status}: {body}"));
        }

        debug!("FCM accepted {} for {}", payload.action, payload.calendar);
        Ok(())
    }
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl NotificationTransport for LogTransport {
    async fn send(&self, token: &str, payload: &NotificationPayload) -> Result<()> {
        info!(
            "[dry-run] {} to {}: {} ({} files)",
            payload.action,
            token,
            payload.calendar,
            payload.files.len()
        );
        Ok(())
    }
}
