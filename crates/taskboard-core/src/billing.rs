//! Subscription billing
//!
//! Checkout and renewal go through a payment provider behind
//! [`BillingGateway`]. The provider calls back through signed webhook events;
//! completed checkouts create the organization's subscription and paid
//! invoices extend it.

use crate::config::BillingConfig;
use crate::service::{Taskboard, required};
use crate::subscription::{OrgSubscription, SubscriptionDetails};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Webhook event types that change a subscription
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const INVOICE_PAID: &str = "invoice.payment_succeeded";

/// Hosted checkout for a new subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub org_id: String,
    pub customer_email: String,
    /// Where the provider sends the user afterwards, on success or cancel
    pub return_url: String,
}

/// Payment provider operations
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Start a checkout session and return its URL
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String>;

    /// Open the self-service portal of an existing customer and return its URL
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String>;

    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<SubscriptionDetails>;
}

/// Gateway used when no API key is configured
pub struct DisabledGateway;

#[async_trait]
impl BillingGateway for DisabledGateway {
    async fn create_checkout_session(&self, _request: &CheckoutRequest) -> Result<String> {
        Err(Error::Billing("billing is not configured".into()))
    }

    async fn create_portal_session(&self, _customer_id: &str, _return_url: &str) -> Result<String> {
        Err(Error::Billing("billing is not configured".into()))
    }

    async fn retrieve_subscription(&self, _subscription_id: &str) -> Result<SubscriptionDetails> {
        Err(Error::Billing("billing is not configured".into()))
    }
}

/// Stripe REST client
pub struct StripeGateway {
    client: reqwest::Client,
    api_key: String,
    config: BillingConfig,
}

#[derive(Deserialize)]
struct SessionResponse {
    url: Option<String>,
}

#[derive(Deserialize)]
struct StripeSubscription {
    id: String,
    customer: String,
    current_period_end: Option<i64>,
    items: StripeItems,
}

#[derive(Deserialize)]
struct StripeItems {
    data: Vec<StripeItem>,
}

#[derive(Deserialize)]
struct StripeItem {
    price: StripePrice,
    current_period_end: Option<i64>,
}

#[derive(Deserialize)]
struct StripePrice {
    id: String,
}

impl StripeGateway {
    pub fn new(api_key: impl Into<String>, config: BillingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Fail on non-2xx with the provider's error message
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(body);
        Err(Error::Billing(format!("{}: {}", status.as_u16(), message)))
    }

    async fn post_session(&self, path: &str, form: &[(String, String)]) -> Result<String> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .form(form)
            .send()
            .await
            .map_err(|e| Error::Billing(e.to_string()))?;

        let session: SessionResponse = Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Billing(e.to_string()))?;
        session
            .url
            .ok_or_else(|| Error::Billing("session has no URL".into()))
    }
}

#[async_trait]
impl BillingGateway for StripeGateway {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String> {
        let c = &self.config;
        let item = "line_items[0]";
        let form: Vec<(String, String)> = [
            ("success_url", request.return_url.clone()),
            ("cancel_url", request.return_url.clone()),
            ("payment_method_types[0]", "card".into()),
            ("mode", "subscription".into()),
            ("billing_address_collection", "auto".into()),
            ("customer_email", request.customer_email.clone()),
            ("metadata[orgId]", request.org_id.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .chain([
            (format!("{item}[quantity]"), "1".into()),
            (format!("{item}[price_data][currency]"), c.currency.clone()),
            (format!("{item}[price_data][unit_amount]"), c.unit_amount.to_string()),
            (format!("{item}[price_data][recurring][interval]"), c.interval.clone()),
            (format!("{item}[price_data][product_data][name]"), c.product_name.clone()),
            (
                format!("{item}[price_data][product_data][description]"),
                c.product_description.clone(),
            ),
        ])
        .collect();

        self.post_session("checkout/sessions", &form).await
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String> {
        let form = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];
        self.post_session("billing_portal/sessions", &form).await
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<SubscriptionDetails> {
        let response = self
            .client
            .get(self.url(&format!("subscriptions/{}", subscription_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::Billing(e.to_string()))?;

        let sub: StripeSubscription = Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Billing(e.to_string()))?;

        let item = sub
            .items
            .data
            .first()
            .ok_or_else(|| Error::Billing(format!("subscription {} has no items", sub.id)))?;
        // Newer API versions report the period per item
        let period_end = sub
            .current_period_end
            .or(item.current_period_end)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| Error::Billing(format!("subscription {} has no period end", sub.id)))?;

        Ok(SubscriptionDetails {
            id: sub.id.clone(),
            customer_id: sub.customer,
            price_id: item.price.id.clone(),
            current_period_end: period_end,
        })
    }
}

/// Check a `t=<unix>,v1=<hex>` signature header over `payload`
///
/// The signed message is `"{t}.{payload}"`. Any matching `v1` entry is
/// accepted as long as `t` lies within `tolerance_secs` of `now`.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
    tolerance_secs: i64,
) -> Result<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| Error::bad_request("Webhook signature has no timestamp"))?;
    let fresh = now
        .timestamp()
        .checked_sub(timestamp)
        .map(i64::unsigned_abs)
        .zip(u64::try_from(tolerance_secs).ok())
        .is_some_and(|(age, max)| age <= max);
    if !fresh {
        return Err(Error::bad_request("Webhook signature is too old"));
    }

    let matches = signatures.iter().any(|sig| {
        let Ok(expected) = hex::decode(sig) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    });

    if matches {
        Ok(())
    } else {
        Err(Error::bad_request("Webhook signature does not match"))
    }
}

/// Signature header value for `payload` signed at `timestamp`
pub fn sign_webhook_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Other(format!("invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Incoming provider event; only the fields used here are parsed
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

/// A checkout session or an invoice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookObject {
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: Option<WebhookMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookMetadata {
    #[serde(rename = "orgId", default)]
    pub org_id: Option<String>,
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload)
            .map_err(|e| Error::bad_request(format!("Invalid webhook event: {}", e)))
    }

    fn subscription_id(&self) -> Result<&str> {
        self.data
            .object
            .subscription
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::bad_request("Webhook event has no subscription"))
    }

    fn org_id(&self) -> Option<&str> {
        self.data
            .object
            .metadata
            .as_ref()
            .and_then(|m| m.org_id.as_deref())
            .filter(|s| !s.is_empty())
    }
}

impl Taskboard {
    /// URL where `user_email` manages or starts the subscription of `org_id`
    ///
    /// Organizations that already have a customer get the billing portal;
    /// the rest get a fresh checkout.
    pub async fn start_checkout(
        &self,
        gateway: &dyn BillingGateway,
        user_id: &str,
        user_email: &str,
        org_id: &str,
    ) -> Result<String> {
        required(user_id, "userId")?;
        let user_email = required(user_email, "userEmail")?;
        let org_id = required(org_id, "orgId")?;

        let return_url = self.config().billing.organization_url(&org_id);
        let customer = self.store().read(|db| {
            db.subscriptions
                .get(&org_id)
                .map(|s| s.billing_customer_id.clone())
                .filter(|c| !c.is_empty())
        });

        let url = match customer {
            Some(customer_id) => {
                tracing::info!("Opening billing portal for {}", org_id);
                gateway.create_portal_session(&customer_id, &return_url).await?
            }
            None => {
                tracing::info!("Starting checkout for {}", org_id);
                gateway
                    .create_checkout_session(&CheckoutRequest {
                        org_id,
                        customer_email: user_email,
                        return_url,
                    })
                    .await?
            }
        };
        Ok(url)
    }

    /// Apply a verified provider event
    ///
    /// Returns the subscription it touched, or `None` for ignored events.
    pub async fn handle_webhook_event(
        &self,
        gateway: &dyn BillingGateway,
        event: &WebhookEvent,
    ) -> Result<Option<OrgSubscription>> {
        match event.event_type.as_str() {
            CHECKOUT_COMPLETED => {
                let org_id = event
                    .org_id()
                    .ok_or_else(|| Error::conflict("Organization is required!"))?
                    .to_string();
                let details = gateway.retrieve_subscription(event.subscription_id()?).await?;

                let subscription = self
                    .store()
                    .write(|db| db.upsert_subscription(&org_id, &details).cloned())?;
                tracing::info!(
                    "Organization {} subscribed until {}",
                    org_id,
                    subscription.current_period_end
                );
                Ok(Some(subscription))
            }
            INVOICE_PAID => {
                let details = gateway.retrieve_subscription(event.subscription_id()?).await?;

                let renewed = self
                    .store()
                    .write(|db| Ok(db.renew_subscription(&details).cloned()))?;
                match &renewed {
                    Some(s) => tracing::info!(
                        "Renewed subscription of {} until {}",
                        s.organization_id,
                        s.current_period_end
                    ),
                    None => tracing::warn!("Paid invoice for unknown subscription {}", details.id),
                }
                Ok(renewed)
            }
            other => {
                tracing::debug!("Ignoring webhook event {}", other);
                Ok(None)
            }
        }
    }
}
