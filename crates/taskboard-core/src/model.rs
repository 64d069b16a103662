//! Board, list and card documents
//!
//! Boards own lists through `List::board_id`; lists own cards through
//! `Card::list_id`. Sibling `order` values are 1-based and contiguous.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cover image picked from the image provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoardImage {
    pub id: String,
    pub thumb_url: String,
    pub full_url: String,
    pub username: String,
    pub link_html: String,
}

impl BoardImage {
    /// Name of the first empty field, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("id", &self.id),
            ("thumbUrl", &self.thumb_url),
            ("fullUrl", &self.full_url),
            ("username", &self.username),
            ("linkHtml", &self.link_html),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub organization_id: String,
    pub title: String,
    pub image: BoardImage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Board {
    pub fn new(id: String, organization_id: String, title: String, image: BoardImage) -> Self {
        let now = Utc::now();
        Self {
            id,
            organization_id,
            title,
            image,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub board_id: String,
    pub title: String,
    /// 1-based position among the board's lists
    pub order: u32,
    /// Bumped on every write; used to reject stale reorders
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    pub fn new(id: String, board_id: String, title: String, order: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            board_id,
            title,
            order,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, title: String) {
        self.title = title;
        self.touch();
    }

    pub fn set_order(&mut self, order: u32) {
        self.order = order;
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub list_id: String,
    pub title: String,
    pub description: Option<String>,
    /// 1-based position among the list's cards
    pub order: u32,
    /// Bumped on every write; used to reject stale reorders
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn new(
        id: String,
        list_id: String,
        title: String,
        description: Option<String>,
        order: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            list_id,
            title,
            description,
            order,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an edit; `None` leaves the field as it is
    pub fn edit(&mut self, title: Option<String>, description: Option<String>) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = Some(description);
        }
        self.touch();
    }

    pub fn set_order(&mut self, order: u32) {
        self.order = order;
        self.touch();
    }

    /// Re-parent under `list_id` at `order`
    pub fn place(&mut self, list_id: &str, order: u32) {
        self.list_id = list_id.to_string();
        self.order = order;
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// A list together with its cards, both sorted by order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWithCards {
    #[serde(flatten)]
    pub list: List,
    pub cards: Vec<Card>,
}

/// Title given to a duplicated list or card
pub fn copy_title(title: &str) -> String {
    format!("{} - Copy", title)
}
