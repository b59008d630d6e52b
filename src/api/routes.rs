//! JSON route handlers.
//!
//! Every response carries a `success` boolean. Malformed input is rejected
//! with a 400 and a descriptive `error` field before any network call;
//! upstream unavailability is never surfaced as an error here.

use crate::service::{MailwatchService, VerifyStatus};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
}

/// Request body for `POST /api/create-email`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateEmailRequest {
    /// Optional local-part prefix.
    pub prefix: Option<String>,
    /// Number of addresses to generate (default 1).
    pub count: Option<usize>,
}

/// `POST /api/create-email` — generate disposable addresses locally.
pub async fn create_email(
    State(service): State<Arc<MailwatchService>>,
    body: Option<Json<CreateEmailRequest>>,
) -> Json<Value> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let count = request.count.unwrap_or(1);

    let emails = service.create_addresses(request.prefix.as_deref(), count);

    Json(json!({
        "success": true,
        "emails": emails,
        "message": format!("Successfully generated {} temporary email(s)", emails.len()),
    }))
}

/// `GET /api/get-messages/{email}` — one-shot inbox fetch, newest first.
pub async fn get_messages(
    State(service): State<Arc<MailwatchService>>,
    Path(email): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let messages = service
        .fetch_once(&email)
        .await
        .map_err(|_| bad_request("Invalid email address"))?;

    Ok(Json(json!({
        "success": true,
        "email": email,
        "count": messages.len(),
        "messages": messages,
        "timestamp": Utc::now().timestamp_millis(),
    })))
}

/// Request body for `POST /api/check-emails`.
#[derive(Debug, Deserialize)]
pub struct CheckEmailsRequest {
    /// The addresses to check.
    #[serde(default)]
    pub emails: Vec<String>,
}

/// `POST /api/check-emails` — batch fetch with per-address failure isolation.
pub async fn check_emails(
    State(service): State<Arc<MailwatchService>>,
    body: Option<Json<CheckEmailsRequest>>,
) -> Result<Json<Value>, ApiError> {
    let emails = body.map(|Json(r)| r.emails).unwrap_or_default();
    if emails.is_empty() {
        return Err(bad_request("No emails provided"));
    }

    let results: Vec<Value> = service
        .check_many(&emails)
        .await
        .into_iter()
        .map(|check| match check.outcome {
            Ok(messages) => json!({
                "email": check.email,
                "count": messages.len(),
                "hasOTP": messages.iter().any(|m| m.otp.is_some()),
                "messages": messages,
            }),
            Err(e) => json!({
                "email": check.email,
                "error": e.to_string(),
                "messages": [],
                "count": 0,
            }),
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "results": results,
        "timestamp": Utc::now().timestamp_millis(),
    })))
}

/// `GET /api/verify-email/{email}` — pool membership plus a provider probe.
pub async fn verify_email(
    State(service): State<Arc<MailwatchService>>,
    Path(email): Path<String>,
) -> Json<Value> {
    match service.verify(&email).await {
        VerifyStatus::InvalidDomain => Json(json!({
            "success": false,
            "valid": false,
            "message": "Invalid domain",
        })),
        VerifyStatus::Active => Json(json!({
            "success": true,
            "valid": true,
            "message": "Email is valid and active",
        })),
        VerifyStatus::Unreachable => Json(json!({
            "success": true,
            "valid": false,
            "message": "Email does not exist or is not accessible",
        })),
    }
}

/// Request body for `POST /api/start-realtime`.
#[derive(Debug, Deserialize)]
pub struct StartRealtimeRequest {
    /// The address to poll.
    pub email: Option<String>,
    /// The realtime client requesting tracking (informational).
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
}

/// `POST /api/start-realtime` — register polling and hub wiring for an address.
pub async fn start_realtime(
    State(service): State<Arc<MailwatchService>>,
    body: Option<Json<StartRealtimeRequest>>,
) -> Result<Json<Value>, ApiError> {
    let request = body.map(|Json(r)| r);
    let email = request
        .as_ref()
        .and_then(|r| r.email.clone())
        .ok_or_else(|| bad_request("Email is required"))?;

    service
        .start_realtime(&email)
        .map_err(|_| bad_request("Invalid email address"))?;

    let client_id = request.and_then(|r| r.client_id).unwrap_or_default();
    info!(email = %email, client_id = %client_id, "realtime tracking requested");

    Ok(Json(json!({
        "success": true,
        "message": "Real-time checking started",
    })))
}

/// `DELETE /api/delete-email/{email}` — idempotent stop.
pub async fn delete_email(
    State(service): State<Arc<MailwatchService>>,
    Path(email): Path<String>,
) -> Json<Value> {
    service.stop(&email);

    Json(json!({
        "success": true,
        "message": format!("Stopped checking emails for {email}"),
    }))
}

/// `GET /api/stats` — service counters.
pub async fn stats(State(service): State<Arc<MailwatchService>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "stats": service.stats(),
    }))
}
