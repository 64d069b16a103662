//! List operations
//!
//! Lists are ordered within their board. Every structural change keeps the
//! board's list orders at exactly `1..=N`.

use crate::audit::{Action, Actor, AuditEvent, Entity, EntityType};
use crate::id::{CARD_PREFIX, LIST_PREFIX};
use crate::model::{Card, List, ListWithCards, copy_title};
use crate::ordering::{self, OrderUpdate};
use crate::service::{Taskboard, optional, required};
use crate::store::Collections;
use crate::{Error, Result};

impl Taskboard {
    /// Append a list at the end of a board
    pub fn create_list(
        &self,
        actor: &Actor,
        board_id: &str,
        org_id: &str,
        title: &str,
    ) -> Result<List> {
        let board_id = required(board_id, "boardId")?;
        let org_id = required(org_id, "organizationId")?;
        let title = required(title, "title")?;

        let list = self.store().write(|db| {
            owned_board(db, &board_id, &org_id)?;

            let order = ordering::next_order(db.lists_of(&board_id).len());
            let id = db.fresh_id(LIST_PREFIX, |db, id| db.lists.contains_key(id));
            let list = List::new(id, board_id.clone(), title, order);
            db.lists.insert(list.id.clone(), list.clone());
            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Create,
                    &org_id,
                    Entity::new(&list.id, EntityType::List, &list.title),
                ),
            );
            Ok(list)
        })?;

        tracing::info!("Created list {} at order {} on {}", list.id, list.order, list.board_id);
        Ok(list)
    }

    /// Lists of a board with their cards, both sorted by order
    pub fn lists_with_cards(&self, board_id: &str, org_id: &str) -> Result<Vec<ListWithCards>> {
        self.store().read(|db| {
            owned_board(db, board_id, org_id)?;
            Ok(db
                .lists_of(board_id)
                .into_iter()
                .map(|list| {
                    let cards = db.cards_of(&list.id);
                    ListWithCards { list, cards }
                })
                .collect())
        })
    }

    pub fn rename_list(&self, actor: &Actor, list_id: &str, title: &str) -> Result<List> {
        let title = required(title, "title")?;

        self.store().write(|db| {
            let list = db
                .lists
                .get_mut(list_id)
                .ok_or_else(|| Error::not_found("List not found!"))?;
            list.rename(title);
            let list = list.clone();

            if let Some(org_id) = db.org_of_list(&list).map(str::to_string) {
                db.append_log(
                    actor,
                    AuditEvent::new(
                        Action::Update,
                        org_id,
                        Entity::new(&list.id, EntityType::List, &list.title),
                    ),
                );
            }
            Ok(list)
        })
    }

    /// Apply new orders to some or all lists of a board as one batch
    pub fn reorder_lists(&self, board_id: &str, updates: &[OrderUpdate]) -> Result<Vec<List>> {
        let board_id = required(board_id, "boardId")?;

        let lists = self.store().write(|db| {
            if !db.boards.contains_key(&board_id) {
                return Err(Error::not_found("Board not found!"));
            }
            let siblings = db.lists_of(&board_id);
            let plan = ordering::plan_reorder(&siblings, updates)?;
            tracing::debug!("Reordering {} of {} lists on {}", plan.len(), siblings.len(), board_id);

            db.apply_list_placements(&plan);
            Ok(db.lists_of(&board_id))
        })?;

        tracing::info!("Reordered lists on {}", board_id);
        Ok(lists)
    }

    /// Delete a list and its cards, then close the gap among its siblings
    pub fn delete_list(&self, actor: &Actor, list_id: &str) -> Result<List> {
        let deleted = self.store().write(|db| {
            let list = db
                .lists
                .remove(list_id)
                .ok_or_else(|| Error::not_found("List not found!"))?;

            let cards = db.remove_cards_of(&list.id);
            let plan = ordering::plan_compaction(&db.lists_of(&list.board_id), list.order);
            tracing::debug!(
                "Deleted {} cards of {}, shifting {} lists",
                cards,
                list.id,
                plan.len()
            );
            db.apply_list_placements(&plan);

            if let Some(org_id) = db.boards.get(&list.board_id).map(|b| b.organization_id.clone()) {
                db.append_log(
                    actor,
                    AuditEvent::new(
                        Action::Delete,
                        org_id,
                        Entity::new(&list.id, EntityType::List, &list.title),
                    ),
                );
            }
            Ok(list)
        })?;

        tracing::info!("Deleted list {} from {}", deleted.id, deleted.board_id);
        Ok(deleted)
    }

    /// Duplicate a list right after its source, optionally with its cards
    pub fn copy_list(
        &self,
        actor: &Actor,
        list_id: &str,
        title: Option<String>,
        with_cards: bool,
    ) -> Result<ListWithCards> {
        let title = optional(title, "title")?;

        let copied = self.store().write(|db| {
            let source = db
                .lists
                .get(list_id)
                .cloned()
                .ok_or_else(|| Error::not_found("List not found!"))?;
            let org_id = db
                .org_of_list(&source)
                .map(str::to_string)
                .ok_or_else(|| Error::not_found("Board not found!"))?;

            let (shift, slot) = ordering::plan_insert_after(&db.lists_of(&source.board_id), source.order);
            db.apply_list_placements(&shift);

            let id = db.fresh_id(LIST_PREFIX, |db, id| db.lists.contains_key(id));
            let list = List::new(
                id,
                source.board_id.clone(),
                copy_title(title.as_deref().unwrap_or(&source.title)),
                slot,
            );
            db.lists.insert(list.id.clone(), list.clone());

            let cards = if with_cards {
                clone_cards(db, &source.id, &list.id)
            } else {
                Vec::new()
            };

            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Create,
                    org_id,
                    Entity::new(&list.id, EntityType::List, &list.title),
                ),
            );
            Ok(ListWithCards { list, cards })
        })?;

        tracing::info!(
            "Copied list {} to {} with {} cards",
            list_id,
            copied.list.id,
            copied.cards.len()
        );
        Ok(copied)
    }
}

/// Fail unless `board_id` exists and belongs to `org_id`
fn owned_board(db: &Collections, board_id: &str, org_id: &str) -> Result<()> {
    match db.boards.get(board_id) {
        Some(board) if board.organization_id == org_id => Ok(()),
        _ => Err(Error::not_found("Board not found!")),
    }
}

/// Copy every card of `from` into `to`, keeping their order
fn clone_cards(db: &mut Collections, from: &str, to: &str) -> Vec<Card> {
    let mut copies = Vec::new();
    for card in db.cards_of(from) {
        let id = db.fresh_id(CARD_PREFIX, |db, id| db.cards.contains_key(id));
        let copy = Card::new(id, to.to_string(), card.title, card.description, card.order);
        db.cards.insert(copy.id.clone(), copy.clone());
        copies.push(copy);
    }
    copies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::is_contiguous;
    use crate::test_support::{actor, board_with_lists, taskboard};

    fn titles_and_orders(lists: &[List]) -> Vec<(String, u32)> {
        lists.iter().map(|l| (l.title.clone(), l.order)).collect()
    }

    #[test]
    fn test_append_assigns_next_order() {
        let tb = taskboard();
        let (board, lists) = board_with_lists(&tb, &["Todo", "Doing", "Done"]);
        assert_eq!(lists.iter().map(|l| l.order).collect::<Vec<_>>(), vec![1, 2, 3]);

        let other = tb.create_list(&actor(), &board.id, "org_1", "Later").unwrap();
        assert_eq!(other.order, 4);
    }

    #[test]
    fn test_create_list_checks_board_owner() {
        let tb = taskboard();
        let (board, _) = board_with_lists(&tb, &[]);
        assert!(matches!(
            tb.create_list(&actor(), &board.id, "org_2", "Todo"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            tb.create_list(&actor(), "", "org_1", "Todo"),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_lists_with_cards_sorted() {
        let tb = taskboard();
        let (board, lists) = board_with_lists(&tb, &["Todo", "Done"]);
        tb.create_card(&actor(), &lists[1].id, "ship", None).unwrap();
        tb.create_card(&actor(), &lists[0].id, "write", None).unwrap();
        tb.create_card(&actor(), &lists[0].id, "review", None).unwrap();

        let nested = tb.lists_with_cards(&board.id, "org_1").unwrap();
        assert_eq!(nested[0].list.title, "Todo");
        assert_eq!(
            nested[0].cards.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
            vec!["write", "review"]
        );
        assert_eq!(nested[1].cards.len(), 1);
        assert!(tb.lists_with_cards(&board.id, "org_2").is_err());
    }

    #[test]
    fn test_delete_middle_list_compacts() {
        let tb = taskboard();
        let (board, lists) = board_with_lists(&tb, &["A", "B", "C", "D"]);
        tb.create_card(&actor(), &lists[1].id, "orphan?", None).unwrap();

        tb.delete_list(&actor(), &lists[1].id).unwrap();

        let remaining = tb.store().read(|db| db.lists_of(&board.id));
        assert_eq!(
            titles_and_orders(&remaining),
            vec![("A".into(), 1), ("C".into(), 2), ("D".into(), 3)]
        );
        assert!(tb.store().read(|db| db.cards_of(&lists[1].id).is_empty()));
    }

    #[test]
    fn test_delete_head_and_tail() {
        let tb = taskboard();
        let (board, lists) = board_with_lists(&tb, &["A", "B", "C"]);
        tb.delete_list(&actor(), &lists[0].id).unwrap();
        tb.delete_list(&actor(), &lists[2].id).unwrap();

        let remaining = tb.store().read(|db| db.lists_of(&board.id));
        assert_eq!(titles_and_orders(&remaining), vec![("B".into(), 1)]);
        assert!(matches!(
            tb.delete_list(&actor(), &lists[0].id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_copy_middle_list() {
        let tb = taskboard();
        let (board, lists) = board_with_lists(&tb, &["A", "B", "C"]);
        tb.create_card(&actor(), &lists[1].id, "one", Some("first".into())).unwrap();
        tb.create_card(&actor(), &lists[1].id, "two", None).unwrap();

        let copy = tb.copy_list(&actor(), &lists[1].id, None, true).unwrap();
        assert_eq!(copy.list.title, "B - Copy");
        assert_eq!(copy.list.order, 3);
        assert_eq!(copy.cards.len(), 2);
        assert_eq!(copy.cards[0].description.as_deref(), Some("first"));
        assert!(copy.cards.iter().all(|c| c.list_id == copy.list.id));

        let all = tb.store().read(|db| db.lists_of(&board.id));
        assert_eq!(all.len(), 4);
        assert!(is_contiguous(all.iter().map(|l| l.order)));
        assert_eq!(all.iter().find(|l| l.id == lists[2].id).unwrap().order, 4);

        // The source keeps its cards
        assert_eq!(tb.store().read(|db| db.cards_of(&lists[1].id)).len(), 2);
    }

    #[test]
    fn test_copy_without_cards_and_custom_title() {
        let tb = taskboard();
        let (_, lists) = board_with_lists(&tb, &["A"]);
        tb.create_card(&actor(), &lists[0].id, "one", None).unwrap();

        let copy = tb
            .copy_list(&actor(), &lists[0].id, Some("Sprint".into()), false)
            .unwrap();
        assert_eq!(copy.list.title, "Sprint - Copy");
        assert_eq!(copy.list.order, 2);
        assert!(copy.cards.is_empty());
    }

    #[test]
    fn test_reorder_lists() {
        let tb = taskboard();
        let (board, lists) = board_with_lists(&tb, &["A", "B", "C"]);

        let reordered = tb
            .reorder_lists(
                &board.id,
                &[
                    OrderUpdate::new(&lists[2].id, 1),
                    OrderUpdate::new(&lists[0].id, 2),
                    OrderUpdate::new(&lists[1].id, 3),
                ],
            )
            .unwrap();
        assert_eq!(
            titles_and_orders(&reordered),
            vec![("C".into(), 1), ("A".into(), 2), ("B".into(), 3)]
        );
    }

    #[test]
    fn test_invalid_reorder_leaves_lists_untouched() {
        let tb = taskboard();
        let (board, lists) = board_with_lists(&tb, &["A", "B", "C"]);

        let err = tb
            .reorder_lists(
                &board.id,
                &[OrderUpdate::new(&lists[0].id, 3), OrderUpdate::new(&lists[1].id, 1)],
            )
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));

        let current = tb.store().read(|db| db.lists_of(&board.id));
        assert_eq!(
            titles_and_orders(&current),
            vec![("A".into(), 1), ("B".into(), 2), ("C".into(), 3)]
        );
        assert!(matches!(
            tb.reorder_lists("board-missing", &[OrderUpdate::new("x", 1)]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_stale_reorder_conflicts() {
        let tb = taskboard();
        let (board, lists) = board_with_lists(&tb, &["A", "B"]);
        tb.rename_list(&actor(), &lists[0].id, "A2").unwrap();

        let err = tb
            .reorder_lists(
                &board.id,
                &[
                    OrderUpdate::new(&lists[0].id, 2).with_version(lists[0].version),
                    OrderUpdate::new(&lists[1].id, 1).with_version(lists[1].version),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}
