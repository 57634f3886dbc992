//! # Delivery Dispatcher
//!
//! Turns a cycle's change sets into one payload per calendar and action and
//! sends it to every subscribed token, unless some recipient has already
//! confirmed that exact payload.
//!
//! Sends for one payload run concurrently, each under its own timeout, so a
//! slow recipient cannot stall the cycle. Failures are logged and not retried
//! within the cycle.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use super::confirmations::ConfirmationCache;
use super::payload::{ActionKind, NotificationPayload};
use super::transport::NotificationTransport;
use crate::features::subscriptions::SubscriptionRegistry;
use crate::features::watcher::Changes;
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Outcome counts for one dispatch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Successful sends, one per token
    pub sent: usize,
    /// Tokens skipped because the payload was already confirmed
    pub suppressed: usize,
    /// Sends that errored or timed out
    pub failed: usize,
    /// Payloads dropped because nobody subscribes to the calendar
    pub unsubscribed: usize,
}

pub struct DeliveryDispatcher {
    registry: Arc<SubscriptionRegistry>,
    confirmations: Arc<ConfirmationCache>,
    transport: Arc<dyn NotificationTransport>,
    send_timeout: Duration,
}

impl DeliveryDispatcher {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        confirmations: Arc<ConfirmationCache>,
        transport: Arc<dyn NotificationTransport>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            confirmations,
            transport,
            send_timeout,
        }
    }

    pub async fn dispatch(&self, changes: &Changes) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for (action, change_set) in [
            (ActionKind::Added, &changes.added),
            (ActionKind::Removed, &changes.removed),
        ] {
            for payload in NotificationPayload::from_change_set(action, change_set) {
                self.deliver(&payload, &mut summary).await;
            }
        }

        if summary.sent + summary.failed > 0 {
            info!(
                "Dispatch: {} sent, {} failed, {} suppressed",
                summary.sent, summary.failed, summary.suppressed
            );
        }
        summary
    }

    async fn deliver(&self, payload: &NotificationPayload, summary: &mut DispatchSummary) {
        let tokens = self.registry.tokens_for(&payload.calendar).await;
        if tokens.is_empty() {
            debug!(
                "No subscribers for {}, dropping {} notice",
                payload.calendar, payload.action
            );
            summary.unsubscribed += 1;
            return;
        }

        let key = payload.key();
        if self.confirmations.is_confirmed(&key) {
            debug!(
                "{} notice for {} already confirmed ({key}), skipping {} tokens",
                payload.action,
                payload.calendar,
                tokens.len()
            );
            summary.suppressed += tokens.len();
            return;
        }

        let sends = tokens.iter().map(|token| async move {
            let outcome =
                tokio::time::timeout(self.send_timeout, self.transport.send(token, payload)).await;
            (token, outcome)
        });

        for (token, outcome) in join_all(sends).await {
            match outcome {
                Ok(Ok(())) => summary.sent += 1,
                Ok(Err(e)) => {
                    warn!(
                        "Failed to notify {} about {}: {e:#}",
                        short_token(token),
                        payload.calendar
                    );
                    summary.failed += 1;
                }
                Err(_) => {
                    warn!(
                        "Timed out notifying {} about {} after {:?}",
                        short_token(token),
                        payload.calendar,
                        self.send_timeout
                    );
                    summary.failed += 1;
                }
            }
        }
    }
}

/// Enough of a device token to tell recipients apart in logs
fn short_token(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    if prefix.len() < token.len() {
        format!("{prefix}…")
    } else {
        prefix
    }
}
