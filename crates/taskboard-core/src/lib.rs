//! taskboard-core: Core library for the taskboard service
//!
//! Boards hold ordered lists, lists hold ordered cards. Provides the data
//! model, the sibling ordering engine, a JSONL-backed document store, the
//! audit trail, free-tier limits and subscription billing.

pub mod audit;
pub mod billing;
pub mod boards;
pub mod cards;
pub mod config;
pub mod error;
pub mod id;
pub mod limits;
pub mod lists;
pub mod model;
pub mod ordering;
pub mod service;
pub mod store;
pub mod subscription;

#[cfg(test)]
pub(crate) mod test_support;

pub use audit::{Action, Actor, EntityType, Log};
pub use billing::{BillingGateway, DisabledGateway, StripeGateway, WebhookEvent};
pub use boards::DeletedBoard;
pub use config::Config;
pub use error::Error;
pub use id::generate_id;
pub use limits::LimitStatus;
pub use model::{Board, BoardImage, Card, List, ListWithCards};
pub use ordering::OrderUpdate;
pub use service::Taskboard;
pub use store::Store;
pub use subscription::OrgSubscription;

/// Result type for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;
