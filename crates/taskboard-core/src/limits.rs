//! Free-tier board counter per organization
//!
//! One `OrgLimit` document per organization, created on first use. The
//! counter only moves through [`Collections::try_acquire_board_slot`] and
//! [`Collections::release_board_slot`], each a single conditional update made
//! under the store's write lock, so concurrent creations cannot overshoot the
//! cap.

use crate::store::Collections;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgLimit {
    pub organization_id: String,
    /// Boards currently counted against the free tier
    pub count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrgLimit {
    fn new(organization_id: &str) -> Self {
        let now = Utc::now();
        Self {
            organization_id: organization_id.to_string(),
            count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Free-tier usage reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitStatus {
    pub count: u32,
    pub max: u32,
    /// Boards left on the free tier; `None` when the organization is subscribed
    pub remaining: Option<u32>,
    pub subscribed: bool,
}

impl Collections {
    /// Boards counted for `org_id`
    pub fn board_count(&self, org_id: &str) -> u32 {
        self.org_limits.get(org_id).map_or(0, |l| l.count)
    }

    /// Take one free-tier slot, failing when `max` are already used
    pub fn try_acquire_board_slot(&mut self, org_id: &str, max: u32) -> Result<u32> {
        if self.board_count(org_id) >= max {
            return Err(Error::LimitReached { max });
        }

        let limit = self
            .org_limits
            .entry(org_id.to_string())
            .or_insert_with(|| OrgLimit::new(org_id));
        limit.count += 1;
        limit.updated_at = Utc::now();
        Ok(limit.count)
    }

    /// Give a slot back; never drops below zero
    pub fn release_board_slot(&mut self, org_id: &str) -> u32 {
        match self.org_limits.get_mut(org_id) {
            Some(limit) => {
                limit.count = limit.count.saturating_sub(1);
                limit.updated_at = Utc::now();
                limit.count
            }
            None => 0,
        }
    }
}

impl LimitStatus {
    pub fn new(count: u32, max: u32, subscribed: bool) -> Self {
        Self {
            count,
            max,
            remaining: (!subscribed).then(|| max.saturating_sub(count)),
            subscribed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_until_cap() {
        let mut db = Collections::default();
        assert_eq!(db.try_acquire_board_slot("org_1", 2).unwrap(), 1);
        assert_eq!(db.try_acquire_board_slot("org_1", 2).unwrap(), 2);
        let err = db.try_acquire_board_slot("org_1", 2).unwrap_err();
        assert!(matches!(err, Error::LimitReached { max: 2 }));
        assert_eq!(db.board_count("org_1"), 2);
        assert_eq!(db.board_count("org_2"), 0);
    }

    #[test]
    fn test_release_floors_at_zero() {
        let mut db = Collections::default();
        assert_eq!(db.release_board_slot("org_1"), 0);
        db.try_acquire_board_slot("org_1", 5).unwrap();
        assert_eq!(db.release_board_slot("org_1"), 0);
        assert_eq!(db.release_board_slot("org_1"), 0);
    }

    #[test]
    fn test_limit_status() {
        let status = LimitStatus::new(3, 5, false);
        assert_eq!(status.remaining, Some(2));
        let full = LimitStatus::new(7, 5, false);
        assert_eq!(full.remaining, Some(0));
        assert_eq!(LimitStatus::new(7, 5, true).remaining, None);
    }
}
