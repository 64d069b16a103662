//! Sibling ordering engine
//!
//! Lists under a board and cards under a list carry a 1-based `order`. After
//! every structural mutation the orders of a parent's children must be exactly
//! `1..=N`. The functions here only *plan* mutations: they look at a snapshot
//! of the siblings, validate the request, and return the `(id, order)`
//! placements to write. The store applies a plan inside one write section, so
//! a rejected plan leaves nothing half-written.

use crate::model::{Card, List};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Anything positioned among siblings
pub trait Ordered {
    fn id(&self) -> &str;
    fn order(&self) -> u32;
    fn version(&self) -> u64;
}

impl Ordered for List {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> u32 {
        self.order
    }
    fn version(&self) -> u64 {
        self.version
    }
}

impl Ordered for Card {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> u32 {
        self.order
    }
    fn version(&self) -> u64 {
        self.version
    }
}

/// One requested position, as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderUpdate {
    #[serde(alias = "_id")]
    pub id: String,
    pub order: u32,
    /// Version the client last read; checked when present
    #[serde(default)]
    pub version: Option<u64>,
}

impl OrderUpdate {
    pub fn new(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
            version: None,
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }
}

/// A planned write: move `id` to `order`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub id: String,
    pub order: u32,
}

impl Placement {
    fn new(id: &str, order: u32) -> Self {
        Self {
            id: id.to_string(),
            order,
        }
    }
}

/// Order for an item appended after `sibling_count` existing siblings
pub fn next_order(sibling_count: usize) -> u32 {
    u32::try_from(sibling_count).map_or(u32::MAX, |n| n.saturating_add(1))
}

/// True when `orders` is a permutation of `1..=len`
pub fn is_contiguous<I>(orders: I) -> bool
where
    I: IntoIterator<Item = u32>,
{
    let mut orders: Vec<u32> = orders.into_iter().collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(idx, &order)| order as usize == idx + 1)
}

/// Plan a reorder among the current siblings of one parent
///
/// `updates` may cover all siblings or a subset; siblings not mentioned keep
/// their order. The result must be contiguous. Only placements that actually
/// change an order are returned.
pub fn plan_reorder<T: Ordered>(siblings: &[T], updates: &[OrderUpdate]) -> Result<Vec<Placement>> {
    let members: Vec<&T> = siblings.iter().collect();
    let placements = validate_batch(&members, updates)?;
    let current: HashMap<&str, u32> = siblings.iter().map(|s| (s.id(), s.order())).collect();

    Ok(placements
        .into_iter()
        .filter(|p| current.get(p.id.as_str()) != Some(&p.order))
        .collect())
}

/// Plan a move of `moving` into a new parent whose current children are
/// `destination`
///
/// `updates` describes the destination after the move and must contain the
/// moving item. Every entry is returned, because each one is re-parented.
/// The source parent is left alone; callers resubmit it with
/// [`plan_reorder`].
pub fn plan_move<T: Ordered>(
    destination: &[T],
    moving: &T,
    updates: &[OrderUpdate],
) -> Result<Vec<Placement>> {
    if !updates.iter().any(|u| u.id == moving.id()) {
        return Err(Error::bad_request(format!(
            "Moved item {} is missing from the destination order",
            moving.id()
        )));
    }

    let mut members: Vec<&T> = destination.iter().filter(|d| d.id() != moving.id()).collect();
    members.push(moving);
    validate_batch(&members, updates)
}

/// Placements that close the gap left by deleting the sibling at `deleted_order`
pub fn plan_compaction<T: Ordered>(remaining: &[T], deleted_order: u32) -> Vec<Placement> {
    remaining
        .iter()
        .filter(|s| s.order() > deleted_order)
        .map(|s| Placement::new(s.id(), s.order() - 1))
        .collect()
}

/// Placements that open a slot right after `source_order`
///
/// The new item goes to `source_order + 1`; the shift must be applied before
/// it is inserted.
pub fn plan_insert_after<T: Ordered>(siblings: &[T], source_order: u32) -> (Vec<Placement>, u32) {
    let shifted = siblings
        .iter()
        .filter(|s| s.order() > source_order)
        .map(|s| Placement::new(s.id(), s.order() + 1))
        .collect();
    (shifted, source_order + 1)
}

/// Check a batch against `members` and return one placement per update
fn validate_batch<T: Ordered>(members: &[&T], updates: &[OrderUpdate]) -> Result<Vec<Placement>> {
    if updates.is_empty() {
        return Err(Error::bad_request("Order list must not be empty"));
    }

    let by_id: HashMap<&str, &T> = members.iter().map(|m| (m.id(), *m)).collect();
    let mut seen = HashSet::new();

    for update in updates {
        if !seen.insert(update.id.as_str()) {
            return Err(Error::bad_request(format!(
                "Item {} appears more than once",
                update.id
            )));
        }
        let member = by_id.get(update.id.as_str()).ok_or_else(|| {
            Error::bad_request(format!("Item {} does not belong to this parent", update.id))
        })?;
        if update.order == 0 {
            return Err(Error::bad_request(format!(
                "Order for {} must start at 1",
                update.id
            )));
        }
        if let Some(version) = update.version
            && version != member.version()
        {
            return Err(Error::conflict(format!(
                "Item {} was modified (version {} != {}), reload and retry",
                update.id,
                version,
                member.version()
            )));
        }
    }

    let requested: HashMap<&str, u32> =
        updates.iter().map(|u| (u.id.as_str(), u.order)).collect();
    let resulting = members
        .iter()
        .map(|m| requested.get(m.id()).copied().unwrap_or_else(|| m.order()));

    if !is_contiguous(resulting) {
        return Err(Error::bad_request(format!(
            "Orders must form the sequence 1..{} without gaps or duplicates",
            members.len()
        )));
    }

    Ok(updates
        .iter()
        .map(|u| Placement::new(&u.id, u.order))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Item {
        id: String,
        order: u32,
        version: u64,
    }

    impl Ordered for Item {
        fn id(&self) -> &str {
            &self.id
        }
        fn order(&self) -> u32 {
            self.order
        }
        fn version(&self) -> u64 {
            self.version
        }
    }

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Item {
                id: id.to_string(),
                order: i as u32 + 1,
                version: 1,
            })
            .collect()
    }

    fn apply(items: &mut [Item], placements: &[Placement]) {
        for p in placements {
            if let Some(item) = items.iter_mut().find(|i| i.id == p.id) {
                item.order = p.order;
            }
        }
    }

    #[test]
    fn test_next_order() {
        assert_eq!(next_order(0), 1);
        assert_eq!(next_order(3), 4);
    }

    #[test]
    fn test_is_contiguous() {
        assert!(is_contiguous([3, 1, 2]));
        assert!(is_contiguous(Vec::<u32>::new()));
        assert!(!is_contiguous([1, 3]));
        assert!(!is_contiguous([1, 1, 2]));
        assert!(!is_contiguous([0, 1]));
    }

    #[test]
    fn test_reorder_swap() {
        let siblings = items(&["a", "b", "c"]);
        let plan = plan_reorder(
            &siblings,
            &[OrderUpdate::new("a", 2), OrderUpdate::new("b", 1)],
        )
        .unwrap();
        assert_eq!(plan, vec![Placement::new("a", 2), Placement::new("b", 1)]);
    }

    #[test]
    fn test_reorder_skips_unchanged() {
        let siblings = items(&["a", "b", "c"]);
        let plan = plan_reorder(
            &siblings,
            &[
                OrderUpdate::new("a", 1),
                OrderUpdate::new("b", 3),
                OrderUpdate::new("c", 2),
            ],
        )
        .unwrap();
        assert_eq!(plan, vec![Placement::new("b", 3), Placement::new("c", 2)]);
    }

    #[test]
    fn test_reorder_rejects_gap() {
        let siblings = items(&["a", "b", "c"]);
        let err = plan_reorder(&siblings, &[OrderUpdate::new("c", 4)]).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_reorder_rejects_duplicate_order() {
        let siblings = items(&["a", "b", "c"]);
        let err = plan_reorder(&siblings, &[OrderUpdate::new("a", 2)]).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_reorder_rejects_empty_and_foreign() {
        let siblings = items(&["a", "b"]);
        assert!(matches!(
            plan_reorder(&siblings, &[]).unwrap_err(),
            Error::BadRequest(_)
        ));
        assert!(matches!(
            plan_reorder(&siblings, &[OrderUpdate::new("z", 1)]).unwrap_err(),
            Error::BadRequest(_)
        ));
        assert!(matches!(
            plan_reorder(
                &siblings,
                &[OrderUpdate::new("a", 2), OrderUpdate::new("a", 1)]
            )
            .unwrap_err(),
            Error::BadRequest(_)
        ));
    }

    #[test]
    fn test_reorder_stale_version_conflicts() {
        let mut siblings = items(&["a", "b"]);
        siblings[0].version = 4;
        let err = plan_reorder(
            &siblings,
            &[
                OrderUpdate::new("a", 2).with_version(3),
                OrderUpdate::new("b", 1).with_version(1),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let ok = plan_reorder(
            &siblings,
            &[
                OrderUpdate::new("a", 2).with_version(4),
                OrderUpdate::new("b", 1),
            ],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_move_into_middle_of_destination() {
        // Card "x" leaves a 3-card list and lands at position 2 of a 2-card list.
        let destination = items(&["d1", "d2"]);
        let moving = Item {
            id: "x".into(),
            order: 3,
            version: 1,
        };
        let plan = plan_move(
            &destination,
            &moving,
            &[
                OrderUpdate::new("d1", 1),
                OrderUpdate::new("x", 2),
                OrderUpdate::new("d2", 3),
            ],
        )
        .unwrap();
        assert_eq!(plan.len(), 3);
        assert!(is_contiguous(plan.iter().map(|p| p.order)));
        assert_eq!(plan.iter().find(|p| p.id == "x").unwrap().order, 2);
    }

    #[test]
    fn test_move_requires_moving_item() {
        let destination = items(&["d1"]);
        let moving = Item {
            id: "x".into(),
            order: 1,
            version: 1,
        };
        let err = plan_move(&destination, &moving, &[OrderUpdate::new("d1", 1)]).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_move_rejects_incomplete_destination() {
        let destination = items(&["d1", "d2"]);
        let moving = Item {
            id: "x".into(),
            order: 1,
            version: 1,
        };
        // d2 keeps order 2, so two items claim it
        let err = plan_move(
            &destination,
            &moving,
            &[OrderUpdate::new("x", 2), OrderUpdate::new("d1", 1)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn test_compaction_after_middle_delete() {
        // Delete order 2 out of {1,2,3,4}
        let mut remaining: Vec<Item> = items(&["a", "b", "c", "d"])
            .into_iter()
            .filter(|i| i.id != "b")
            .collect();
        let plan = plan_compaction(&remaining, 2);
        apply(&mut remaining, &plan);

        let orders: Vec<(&str, u32)> = remaining.iter().map(|i| (i.id.as_str(), i.order)).collect();
        assert_eq!(orders, vec![("a", 1), ("c", 2), ("d", 3)]);
    }

    #[test]
    fn test_compaction_head_and_tail() {
        let remaining: Vec<Item> = items(&["a", "b", "c"]).into_iter().skip(1).collect();
        assert_eq!(plan_compaction(&remaining, 1).len(), 2);

        let remaining: Vec<Item> = items(&["a", "b", "c"]).into_iter().take(2).collect();
        assert!(plan_compaction(&remaining, 3).is_empty());
    }

    #[test]
    fn test_insert_after_middle() {
        // Duplicate order 2 out of {1,2,3}
        let mut siblings = items(&["a", "b", "c"]);
        let (shift, slot) = plan_insert_after(&siblings, 2);
        assert_eq!(slot, 3);
        apply(&mut siblings, &shift);
        siblings.push(Item {
            id: "b-copy".into(),
            order: slot,
            version: 1,
        });

        assert!(is_contiguous(siblings.iter().map(|i| i.order)));
        assert_eq!(siblings.iter().find(|i| i.id == "c").unwrap().order, 4);
    }

    #[test]
    fn test_order_update_accepts_legacy_id_key() {
        let update: OrderUpdate = serde_json::from_str(r#"{"_id":"card-1","order":2}"#).unwrap();
        assert_eq!(update, OrderUpdate::new("card-1", 2));
    }
}
