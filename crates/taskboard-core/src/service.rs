//! Taskboard service
//!
//! Entry point for every operation the API exposes. Board, list and card
//! mutations live in `boards.rs`, `lists.rs` and `cards.rs`; each runs inside
//! a single store write section together with its audit entry.

use crate::audit::{EntityType, Log};
use crate::limits::LimitStatus;
use crate::{Config, Error, Result, Store};
use chrono::Utc;

pub struct Taskboard {
    store: Store,
    config: Config,
}

impl Taskboard {
    pub fn new(store: Store, config: Config) -> Self {
        Self { store, config }
    }

    /// Build from config: persisted when `data_dir` is set, in memory otherwise
    pub fn open(config: Config) -> Result<Self> {
        let store = match &config.data_dir {
            Some(dir) => Store::open(dir)?,
            None => {
                tracing::warn!("No data directory configured, data is kept in memory only");
                Store::in_memory()
            }
        };
        Ok(Self::new(store, config))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether `org_id` has a subscription that is still valid
    pub fn is_subscribed(&self, org_id: &str) -> bool {
        let grace = self.config.subscription_grace_ms;
        self.store
            .read(|db| db.subscription_valid(org_id, Utc::now(), grace))
    }

    /// Free-tier usage for an organization
    pub fn limit_status(&self, org_id: &str) -> LimitStatus {
        let grace = self.config.subscription_grace_ms;
        let max = self.config.max_free_boards;
        self.store.read(|db| {
            LimitStatus::new(
                db.board_count(org_id),
                max,
                db.subscription_valid(org_id, Utc::now(), grace),
            )
        })
    }

    /// Audit trail of an organization, newest first
    pub fn logs_for_org(&self, org_id: &str, limit: Option<usize>) -> Vec<Log> {
        self.store.read(|db| {
            db.logs
                .iter()
                .rev()
                .filter(|l| l.organization_id == org_id)
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect()
        })
    }

    /// Audit trail of one entity, newest first
    pub fn logs_for_entity(
        &self,
        org_id: &str,
        entity_id: &str,
        entity_type: EntityType,
    ) -> Vec<Log> {
        self.store.read(|db| {
            db.logs
                .iter()
                .rev()
                .filter(|l| {
                    l.organization_id == org_id
                        && l.entity.id == entity_id
                        && l.entity.entity_type == entity_type
                })
                .cloned()
                .collect()
        })
    }
}

/// Trimmed value of a required text field
pub(crate) fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::bad_request(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Like [`required`], for fields that may be omitted
pub(crate) fn optional(value: Option<String>, field: &str) -> Result<Option<String>> {
    value.map(|v| required(&v, field)).transpose()
}
