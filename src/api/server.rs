//! # HTTP API
//!
//! Request surface for device apps: liveness, token registration, delivery
//! confirmation and reminder creation. Handlers only validate input and call
//! into the registry, the confirmation cache and the reminder writer; they
//! never touch the watcher's snapshot.
//!
//! - **Version**: 1.1.1
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.1: /reminders rejects growth factors that schedule nothing
//! - 1.1.0: Added /confirm_delivery and /reminders
//! - 1.0.0: Initial release with /ping and /register_token

use crate::features::delivery::{ActionKind, ConfirmationCache};
use crate::features::reminders::ReminderWriter;
use crate::features::subscriptions::SubscriptionRegistry;
use crate::store::CalendarKey;
use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Upper bound on reminders created by one request
const MAX_REMINDERS_PER_REQUEST: usize = 365;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SubscriptionRegistry>,
    pub confirmations: Arc<ConfirmationCache>,
    pub writer: Arc<ReminderWriter>,
}

/// Handler error rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(e) => {
                error!("Request failed: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/register_token", post(register_token))
        .route("/confirm_delivery", post(confirm_delivery))
        .route("/reminders", post(create_reminders))
        .with_state(state)
}

pub async fn run_server(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn ping() -> &'static str {
    "pong"
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterTokenRequest {
    #[serde(default)]
    pub fcm_token: Option<String>,
    #[serde(default)]
    pub calendar_id: Option<String>,
}

async fn register_token(
    State(state): State<AppState>,
    Json(request): Json<RegisterTokenRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = non_empty(request.fcm_token);
    let calendar_id = non_empty(request.calendar_id);
    let (Some(token), Some(calendar_id)) = (token, calendar_id) else {
        return Err(ApiError::BadRequest(
            "Missing fcm_token or calendar_id".to_string(),
        ));
    };

    let calendar: CalendarKey = calendar_id
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;

    state.registry.register(&token, calendar).await?;
    Ok(Json(json!({ "status": "Token and calendar_id saved" })))
}

/// `files` as sent in the push data (a JSON string) or as a plain list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FilesField {
    List(Vec<String>),
    Encoded(String),
}

impl FilesField {
    fn into_paths(self) -> Result<Vec<String>, ApiError> {
        match self {
            FilesField::List(files) => Ok(files),
            FilesField::Encoded(raw) => serde_json::from_str(&raw)
                .map_err(|e| ApiError::BadRequest(format!("files is not a JSON list: {e}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmDeliveryRequest {
    #[serde(rename = "type", default)]
    pub action: Option<String>,
    #[serde(default)]
    pub files: Option<FilesField>,
}

async fn confirm_delivery(
    State(state): State<AppState>,
    Json(request): Json<ConfirmDeliveryRequest>,
) -> Result<Json<Value>, ApiError> {
    let action: ActionKind = request
        .action
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Missing type".to_string()))?
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;

    let files = request
        .files
        .ok_or_else(|| ApiError::BadRequest("Missing files".to_string()))?
        .into_paths()?;
    if files.is_empty() {
        return Err(ApiError::BadRequest("files must not be empty".to_string()));
    }

    let key = state.confirmations.confirm_files(action, &files);
    Ok(Json(json!({ "status": "confirmed", "key": key })))
}

#[derive(Debug, Deserialize)]
pub struct CreateRemindersRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub calendar_id: Option<String>,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_growth")]
    pub growth: f64,
}

fn default_count() -> usize {
    1
}

fn default_growth() -> f64 {
    1.0
}

async fn create_reminders(
    State(state): State<AppState>,
    Json(request): Json<CreateRemindersRequest>,
) -> Result<Json<Value>, ApiError> {
    let label = non_empty(request.label)
        .ok_or_else(|| ApiError::BadRequest("Missing label".to_string()))?;
    let calendar: CalendarKey = non_empty(request.calendar_id)
        .ok_or_else(|| ApiError::BadRequest("Missing calendar_id".to_string()))?
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;

    if request.count == 0 || request.count > MAX_REMINDERS_PER_REQUEST {
        return Err(ApiError::BadRequest(format!(
            "count must be between 1 and {MAX_REMINDERS_PER_REQUEST}"
        )));
    }
    if !request.growth.is_finite() {
        return Err(ApiError::BadRequest("growth must be a finite number".to_string()));
    }

    let items = state
        .writer
        .create(&label, &calendar, request.count, request.growth)
        .await?;
    if items.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "growth {} yields no reminders",
            request.growth
        )));
    }
    let created: Vec<String> = items.iter().map(|item| item.id()).collect();

    Ok(Json(json!({ "calendar_id": calendar.to_string(), "created": created })))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
