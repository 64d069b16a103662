//! Audit log entries
//!
//! Append-only: entries are written once by the mutation that caused them and
//! never modified afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "CREATE"),
            Action::Update => write!(f, "UPDATE"),
            Action::Delete => write!(f, "DELETE"),
        }
    }
}

/// Kind of entity a log entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Board,
    List,
    Card,
}

impl std::str::FromStr for EntityType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "board" => Ok(EntityType::Board),
            "list" => Ok(EntityType::List),
            "card" => Ok(EntityType::Card),
            _ => Err(crate::Error::BadRequest(format!(
                "Invalid entity type: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Board => write!(f, "BOARD"),
            EntityType::List => write!(f, "LIST"),
            EntityType::Card => write!(f, "CARD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub title: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, entity_type: EntityType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type,
            title: title.into(),
        }
    }
}

/// The user performing a mutation, as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub id: String,
    pub action: Action,
    pub organization_id: String,
    pub entity: Entity,
    pub user: Actor,
    pub created_at: DateTime<Utc>,
}

impl Log {
    pub fn new(
        id: String,
        action: Action,
        organization_id: String,
        entity: Entity,
        user: Actor,
    ) -> Self {
        Self {
            id,
            action,
            organization_id,
            entity,
            user,
            created_at: Utc::now(),
        }
    }

    /// Human-readable summary, e.g. `created card "Write docs"`
    pub fn summary(&self) -> String {
        let verb = match self.action {
            Action::Create => "created",
            Action::Update => "updated",
            Action::Delete => "deleted",
        };
        format!(
            "{} {} \"{}\"",
            verb,
            self.entity.entity_type.to_string().to_lowercase(),
            self.entity.title
        )
    }
}

/// Pending audit entry produced by a store operation
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: Action,
    pub organization_id: String,
    pub entity: Entity,
}

impl AuditEvent {
    pub fn new(action: Action, organization_id: impl Into<String>, entity: Entity) -> Self {
        Self {
            action,
            organization_id: organization_id.into(),
            entity,
        }
    }
}
