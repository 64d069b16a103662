//! Free-tier limits, subscriptions and payment provider webhooks

use super::success;
use crate::app::SharedState;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, Payload};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskboard_core::billing::verify_webhook_signature;
use taskboard_core::{Error, LimitStatus, WebhookEvent};

/// Header carrying the provider's `t=…,v1=…` signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    user_email: String,
    #[serde(default)]
    org_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    is_valid: bool,
}

pub async fn limit(
    State(state): State<SharedState>,
    Path(org_id): Path<String>,
) -> Json<LimitStatus> {
    Json(state.taskboard.limit_status(&org_id))
}

pub async fn subscription(
    State(state): State<SharedState>,
    Path(org_id): Path<String>,
) -> Json<SubscriptionStatus> {
    Json(SubscriptionStatus {
        is_valid: state.taskboard.is_subscribed(&org_id),
    })
}

/// Checkout URL for a new subscription, or the billing portal for an
/// existing customer
pub async fn checkout(
    State(state): State<SharedState>,
    CurrentUser(_): CurrentUser,
    Payload(req): Payload<CheckoutRequest>,
) -> ApiResult<Json<Value>> {
    let url = state
        .taskboard
        .start_checkout(state.gateway.as_ref(), &req.user_id, &req.user_email, &req.org_id)
        .await?;
    success("Redirecting to billing", "url", url)
}

pub async fn webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::bad_request("Webhook signature is missing"))?;
        let tolerance = state.taskboard.config().billing.webhook_tolerance_secs;
        verify_webhook_signature(&body, signature, secret, Utc::now(), tolerance)?;
    }

    let event = WebhookEvent::parse(&body)?;
    tracing::info!("Webhook event {}", event.event_type);
    let subscription = state
        .taskboard
        .handle_webhook_event(state.gateway.as_ref(), &event)
        .await?;
    success("Webhook handled!", "subscription", subscription)
}
