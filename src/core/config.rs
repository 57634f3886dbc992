//! # Configuration
//!
//! Process configuration from environment variables (optionally via `.env`)
//! plus the YAML schedule document describing the active daily window.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Move work-hours settings into schedule.yaml
//! - 1.0.0: Initial release with environment-based config

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SNAPSHOT_FILE: &str = "known_files.json";
const SUBSCRIPTIONS_FILE: &str = "fcm_tokens.json";
const CONFIRMATIONS_FILE: &str = "delivery_confirmations.json";

/// 100 years
const MAX_RETENTION_HOURS: u64 = 100 * 365 * 24;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the owner/collection/item tree
    pub collections_root: PathBuf,
    /// Directory holding the persisted JSON state files
    pub state_dir: PathBuf,
    pub bind_addr: String,
    pub poll_interval: Duration,
    /// Items older than `now - retention` are reaped
    pub retention: chrono::Duration,
    pub send_timeout: Duration,
    pub schedule_config_path: PathBuf,
    pub fcm_project_id: Option<String>,
    pub fcm_access_token_file: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let collections_root = env::var("KAPPA_COLLECTIONS_ROOT")
            .unwrap_or_else(|_| "./collections".to_string())
            .into();
        let state_dir = env::var("KAPPA_STATE_DIR")
            .unwrap_or_else(|_| ".".to_string())
            .into();
        let bind_addr =
            env::var("KAPPA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:6000".to_string());

        let poll_secs = parse_env_u64("KAPPA_POLL_INTERVAL_SECS", 10)?;
        if poll_secs == 0 {
            return Err(anyhow!("KAPPA_POLL_INTERVAL_SECS must be at least 1"));
        }
        let retention = retention_from_hours(parse_env_u64("KAPPA_RETENTION_HOURS", 24)?)?;
        let send_timeout_secs = parse_env_u64("KAPPA_SEND_TIMEOUT_SECS", 10)?;

        let schedule_config_path = env::var("KAPPA_SCHEDULE_CONFIG")
            .unwrap_or_else(|_| "schedule.yaml".to_string())
            .into();

        let fcm_project_id = env::var("FCM_PROJECT_ID").ok().filter(|v| !v.is_empty());
        let fcm_access_token_file = env::var("FCM_ACCESS_TOKEN_FILE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            collections_root,
            state_dir,
            bind_addr,
            poll_interval: Duration::from_secs(poll_secs),
            retention,
            send_timeout: Duration::from_secs(send_timeout_secs),
            schedule_config_path,
            fcm_project_id,
            fcm_access_token_file,
            log_level,
        })
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join(SNAPSHOT_FILE)
    }

    pub fn subscriptions_path(&self) -> PathBuf {
        self.state_dir.join(SUBSCRIPTIONS_FILE)
    }

    pub fn confirmations_path(&self) -> PathBuf {
        self.state_dir.join(CONFIRMATIONS_FILE)
    }
}

fn retention_from_hours(hours: u64) -> Result<chrono::Duration> {
    if hours > MAX_RETENTION_HOURS {
        return Err(anyhow!(
            "KAPPA_RETENTION_HOURS must be at most {MAX_RETENTION_HOURS}, got {hours}"
        ));
    }
    Ok(chrono::Duration::hours(hours as i64))
}

fn parse_env_u64(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Schedule shaping settings loaded from `schedule.yaml`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// First hour of the active daily window (inclusive)
    #[serde(default = "default_start_hour")]
    pub active_start_hour: u32,

    /// Hour the active window closes (exclusive)
    #[serde(default = "default_end_hour")]
    pub active_end_hour: u32,

    /// Offset applied to "now" before the first reminder
    #[serde(default = "default_lead_minutes")]
    pub lead_minutes: i64,

    /// Distance between an item's start and its due time
    #[serde(default = "default_due_offset")]
    pub due_offset_minutes: i64,

    /// Length of the evenly spaced series produced for a growth factor of 1
    #[serde(default = "default_uniform_samples")]
    pub uniform_samples: usize,
}

fn default_start_hour() -> u32 {
    8
}

fn default_end_hour() -> u32 {
    22
}

fn default_lead_minutes() -> i64 {
    30
}

fn default_due_offset() -> i64 {
    5
}

fn default_uniform_samples() -> usize {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            active_start_hour: default_start_hour(),
            active_end_hour: default_end_hour(),
            lead_minutes: default_lead_minutes(),
            due_offset_minutes: default_due_offset(),
            uniform_samples: default_uniform_samples(),
        }
    }
}

impl ScheduleConfig {
    /// Load from a YAML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: ScheduleConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.active_start_hour >= self.active_end_hour {
            return Err(anyhow!(
                "active_start_hour ({}) must be before active_end_hour ({})",
                self.active_start_hour,
                self.active_end_hour
            ));
        }
        if self.active_end_hour > 23 {
            return Err(anyhow!(
                "active_end_hour must be at most 23, got {}",
                self.active_end_hour
            ));
        }
        if self.uniform_samples == 0 {
            return Err(anyhow!("uniform_samples must be at least 1"));
        }
        if self.lead_minutes < 0 || self.due_offset_minutes < 0 {
            return Err(anyhow!("lead_minutes and due_offset_minutes must not be negative"));
        }
        Ok(())
    }

    /// Length of the active window in hours
    pub fn window_hours(&self) -> u32 {
        self.active_end_hour - self.active_start_hour
    }

    /// Hours skipped between the end of one window and the start of the next
    pub fn inactive_hours(&self) -> u32 {
        24 - self.window_hours()
    }

    /// Ratio of a full day to the active window
    pub fn scale_factor(&self) -> f64 {
        24.0 / self.window_hours() as f64
    }
}
