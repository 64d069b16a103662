//! Organization subscriptions
//!
//! A subscription is valid while it has a price and its current period end,
//! plus a grace window, lies in the future.

use crate::store::Collections;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgSubscription {
    pub organization_id: String,
    pub billing_customer_id: String,
    pub billing_subscription_id: String,
    pub billing_price_id: String,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrgSubscription {
    pub fn is_valid(&self, now: DateTime<Utc>, grace_ms: i64) -> bool {
        !self.billing_price_id.is_empty()
            && self.current_period_end + Duration::milliseconds(grace_ms) > now
    }
}

/// Subscription details as reported by the payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDetails {
    pub id: String,
    pub customer_id: String,
    pub price_id: String,
    pub current_period_end: DateTime<Utc>,
}

impl Collections {
    pub fn subscription_valid(&self, org_id: &str, now: DateTime<Utc>, grace_ms: i64) -> bool {
        self.subscriptions
            .get(org_id)
            .is_some_and(|s| s.is_valid(now, grace_ms))
    }

    /// Record a completed checkout for `org_id`
    ///
    /// A second checkout for the same organization replaces the stored
    /// subscription; a subscription ID already owned by another organization
    /// is a conflict.
    pub fn upsert_subscription(
        &mut self,
        org_id: &str,
        details: &SubscriptionDetails,
    ) -> Result<&OrgSubscription> {
        if let Some(other) = self
            .subscriptions
            .values()
            .find(|s| s.billing_subscription_id == details.id && s.organization_id != org_id)
        {
            return Err(Error::conflict(format!(
                "Subscription {} already belongs to organization {}",
                details.id, other.organization_id
            )));
        }

        let now = Utc::now();
        let created_at = self
            .subscriptions
            .get(org_id)
            .map_or(now, |existing| existing.created_at);

        self.subscriptions.insert(
            org_id.to_string(),
            OrgSubscription {
                organization_id: org_id.to_string(),
                billing_customer_id: details.customer_id.clone(),
                billing_subscription_id: details.id.clone(),
                billing_price_id: details.price_id.clone(),
                current_period_end: details.current_period_end,
                created_at,
                updated_at: now,
            },
        );
        Ok(&self.subscriptions[org_id])
    }

    /// Refresh price and period of the subscription with this provider ID
    pub fn renew_subscription(&mut self, details: &SubscriptionDetails) -> Option<&OrgSubscription> {
        let subscription = self
            .subscriptions
            .values_mut()
            .find(|s| s.billing_subscription_id == details.id)?;
        subscription.billing_price_id = details.price_id.clone();
        subscription.current_period_end = details.current_period_end;
        subscription.updated_at = Utc::now();
        Some(&*subscription)
    }
}
