//! HTTP routing layer.
//!
//! Thin endpoint glue over [`MailwatchService`](crate::MailwatchService):
//! every handler validates its input, calls one service operation, and shapes
//! the JSON envelope. No business logic lives here.

pub mod routes;
pub mod ws;

use crate::service::MailwatchService;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Builds the application router.
pub fn build_router(service: Arc<MailwatchService>) -> Router {
    Router::new()
        .route("/api/create-email", post(routes::create_email))
        .route("/api/get-messages/{email}", get(routes::get_messages))
        .route("/api/check-emails", post(routes::check_emails))
        .route("/api/verify-email/{email}", get(routes::verify_email))
        .route("/api/start-realtime", post(routes::start_realtime))
        .route("/api/delete-email/{email}", delete(routes::delete_email))
        .route("/api/stats", get(routes::stats))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(service)
}
