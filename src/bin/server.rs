use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;

use kappa_dav::api::{run_server, AppState};
use kappa_dav::core::{Config, ScheduleConfig, SystemClock};
use kappa_dav::features::delivery::{
    ConfirmationCache, DeliveryDispatcher, FcmTransport, LogTransport, NotificationTransport,
};
use kappa_dav::features::reminders::ReminderWriter;
use kappa_dav::features::subscriptions::SubscriptionRegistry;
use kappa_dav::features::watcher::ChangeWatcher;
use kappa_dav::features::{get_features, get_version};
use kappa_dav::store::{FsItemStore, ItemStore};

fn build_transport(config: &Config) -> Result<Arc<dyn NotificationTransport>> {
    match (&config.fcm_project_id, &config.fcm_access_token_file) {
        (Some(project_id), Some(token_file)) => {
            info!("📨 Delivering notifications through FCM project {project_id}");
            Ok(Arc::new(FcmTransport::new(
                project_id,
                token_file.clone(),
                config.send_timeout,
            )?))
        }
        _ => {
            warn!("FCM_PROJECT_ID or FCM_ACCESS_TOKEN_FILE not set, notifications will only be logged");
            Ok(Arc::new(LogTransport))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting kappa-dav {}...", get_version());
    for feature in get_features() {
        info!("  {} v{}", feature.name, feature.version);
    }

    let schedule = ScheduleConfig::load(&config.schedule_config_path)?;
    info!(
        "📄 Active window {:02}:00-{:02}:00",
        schedule.active_start_hour, schedule.active_end_hour
    );

    let store: Arc<dyn ItemStore> = Arc::new(FsItemStore::new(config.collections_root.clone()));
    let clock = Arc::new(SystemClock);

    let registry = Arc::new(SubscriptionRegistry::load(config.subscriptions_path()).await);
    let confirmations = Arc::new(ConfirmationCache::load(&config.confirmations_path()).await);
    let transport = build_transport(&config)?;

    let dispatcher = DeliveryDispatcher::new(
        registry.clone(),
        confirmations.clone(),
        transport,
        config.send_timeout,
    );

    let watcher = ChangeWatcher::new(
        store.clone(),
        dispatcher,
        confirmations.clone(),
        clock.clone(),
        config.retention,
    )
    .with_persistence(config.snapshot_path(), config.confirmations_path())
    .await;

    let poll_interval = config.poll_interval;
    tokio::spawn(async move {
        watcher.run(poll_interval).await;
    });

    let writer = Arc::new(ReminderWriter::new(store, clock, &schedule)?);
    let state = AppState {
        registry,
        confirmations,
        writer,
    };

    if let Err(e) = run_server(&config.bind_addr, state).await {
        error!("HTTP API stopped: {e:#}");
        return Err(e);
    }

    Ok(())
}
