//! Router and shared state

use crate::error::ApiError;
use crate::handlers::{boards, cards, lists, logs, org};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use std::sync::Arc;
use taskboard_core::{BillingGateway, Taskboard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub taskboard: Taskboard,
    pub gateway: Arc<dyn BillingGateway>,
    /// Webhook signing secret; signatures are only checked when set
    pub webhook_secret: Option<String>,
}

pub type SharedState = Arc<AppState>;

/// Health check endpoint
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn unknown_route() -> ApiError {
    ApiError::UnknownRoute
}

/// Every endpoint, mounted under `/api`
pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        // Boards
        .route("/board", post(boards::create))
        .route("/boards/{organization_id}", get(boards::list))
        .route("/boards/{organization_id}/{board_id}", get(boards::get))
        .route("/board/{id}", patch(boards::rename).delete(boards::delete))
        // Lists
        .route("/list", post(lists::create))
        .route("/lists/{board_id}/{org_id}", get(lists::list))
        .route("/list/order", patch(lists::reorder))
        .route("/list/copy", post(lists::copy))
        .route("/list/{id}", patch(lists::rename).delete(lists::delete))
        // Cards
        .route("/card", post(cards::create))
        .route("/card/order", patch(cards::reorder))
        .route("/card/copy", post(cards::copy))
        .route("/card/{id}", patch(cards::update))
        .route("/card/{id}/{org_id}/{user_id}", delete(cards::delete))
        // Audit trail
        .route("/logs/{org_id}", get(logs::for_org))
        .route("/logs/{entity_id}/{org_id}/{entity_type}", get(logs::for_entity))
        // Limits and billing
        .route("/org-limit/{org_id}", get(org::limit))
        .route("/org-subscription/{org_id}", get(org::subscription))
        .route("/org-subscription", post(org::checkout))
        .route("/webhook", post(org::webhook));

    Router::new()
        .nest("/api", api)
        .fallback(unknown_route)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
