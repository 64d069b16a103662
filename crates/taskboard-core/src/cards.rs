//! Card operations

use crate::audit::{Action, Actor, AuditEvent, Entity, EntityType};
use crate::id::CARD_PREFIX;
use crate::model::{Card, copy_title};
use crate::ordering::{self, OrderUpdate};
use crate::service::{Taskboard, optional, required};
use crate::store::Collections;
use crate::{Error, Result};

impl Taskboard {
    /// Append a card at the end of a list
    pub fn create_card(
        &self,
        actor: &Actor,
        list_id: &str,
        title: &str,
        description: Option<String>,
    ) -> Result<Card> {
        let list_id = required(list_id, "listId")?;
        let title = required(title, "title")?;

        let card = self.store().write(|db| {
            let org_id = list_org(db, &list_id)?;

            let order = ordering::next_order(db.cards_of(&list_id).len());
            let id = db.fresh_id(CARD_PREFIX, |db, id| db.cards.contains_key(id));
            let card = Card::new(id, list_id.clone(), title, description, order);
            db.cards.insert(card.id.clone(), card.clone());
            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Create,
                    org_id,
                    Entity::new(&card.id, EntityType::Card, &card.title),
                ),
            );
            Ok(card)
        })?;

        tracing::info!("Created card {} at order {} in {}", card.id, card.order, card.list_id);
        Ok(card)
    }

    /// Edit title and/or description
    pub fn update_card(
        &self,
        actor: &Actor,
        card_id: &str,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Card> {
        let title = optional(title, "title")?;
        if title.is_none() && description.is_none() {
            return Err(Error::bad_request("Nothing to update"));
        }

        self.store().write(|db| {
            let list_id = db
                .cards
                .get(card_id)
                .map(|c| c.list_id.clone())
                .ok_or_else(|| Error::not_found("Card not found!"))?;
            let org_id = list_org(db, &list_id)?;

            let Some(card) = db.cards.get_mut(card_id) else {
                return Err(Error::not_found("Card not found!"));
            };
            card.edit(title, description);
            let card = card.clone();

            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Update,
                    org_id,
                    Entity::new(&card.id, EntityType::Card, &card.title),
                ),
            );
            Ok(card)
        })
    }

    /// Apply new orders to cards of one list as one batch
    pub fn reorder_cards(&self, list_id: &str, updates: &[OrderUpdate]) -> Result<Vec<Card>> {
        let list_id = required(list_id, "listId")?;

        let cards = self.store().write(|db| {
            if !db.lists.contains_key(&list_id) {
                return Err(Error::not_found("List not found!"));
            }
            let siblings = db.cards_of(&list_id);
            let plan = ordering::plan_reorder(&siblings, updates)?;
            tracing::debug!("Reordering {} of {} cards in {}", plan.len(), siblings.len(), list_id);

            db.apply_card_placements(&plan);
            Ok(db.cards_of(&list_id))
        })?;

        tracing::info!("Reordered cards in {}", list_id);
        Ok(cards)
    }

    /// Move a card into another list of the same board
    ///
    /// `dest_updates` is the full destination after the move, including the
    /// moved card. The source list keeps its orders until it is resubmitted
    /// through [`Taskboard::reorder_cards`]. Without `card_id` the moved card
    /// is the single destination entry that currently lives in the source.
    pub fn move_card(
        &self,
        source_id: &str,
        dest_id: &str,
        card_id: Option<&str>,
        dest_updates: &[OrderUpdate],
    ) -> Result<Vec<Card>> {
        let source_id = required(source_id, "sourceId")?;
        let dest_id = required(dest_id, "destId")?;
        if source_id == dest_id {
            return self.reorder_cards(&dest_id, dest_updates);
        }

        let cards = self.store().write(|db| {
            let source = db
                .lists
                .get(&source_id)
                .ok_or_else(|| Error::not_found("Source list not found!"))?;
            let dest = db
                .lists
                .get(&dest_id)
                .ok_or_else(|| Error::not_found("Destination list not found!"))?;
            if source.board_id != dest.board_id {
                return Err(Error::bad_request(
                    "Cards can only move between lists of the same board",
                ));
            }

            let moving = match card_id {
                Some(id) => db
                    .cards
                    .get(id)
                    .filter(|c| c.list_id == source_id)
                    .cloned()
                    .ok_or_else(|| Error::not_found("Card not found!"))?,
                None => moved_card(db, &source_id, dest_updates)?,
            };

            let plan = ordering::plan_move(&db.cards_of(&dest_id), &moving, dest_updates)?;
            tracing::debug!(
                "Moving {} from {} to {} ({} placements)",
                moving.id,
                source_id,
                dest_id,
                plan.len()
            );
            for placement in &plan {
                if let Some(card) = db.cards.get_mut(&placement.id) {
                    card.place(&dest_id, placement.order);
                }
            }
            Ok(db.cards_of(&dest_id))
        })?;

        tracing::info!("Moved card from {} to {}", source_id, dest_id);
        Ok(cards)
    }

    /// Duplicate a card right after its source in the same list
    pub fn copy_card(
        &self,
        actor: &Actor,
        card_id: &str,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Card> {
        let title = optional(title, "title")?;

        let card = self.store().write(|db| {
            let source = db
                .cards
                .get(card_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Card not found!"))?;
            let org_id = list_org(db, &source.list_id)?;

            let (shift, slot) = ordering::plan_insert_after(&db.cards_of(&source.list_id), source.order);
            db.apply_card_placements(&shift);

            let id = db.fresh_id(CARD_PREFIX, |db, id| db.cards.contains_key(id));
            let card = Card::new(
                id,
                source.list_id.clone(),
                copy_title(title.as_deref().unwrap_or(&source.title)),
                description.or(source.description),
                slot,
            );
            db.cards.insert(card.id.clone(), card.clone());
            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Create,
                    org_id,
                    Entity::new(&card.id, EntityType::Card, &card.title),
                ),
            );
            Ok(card)
        })?;

        tracing::info!("Copied card {} to {}", card_id, card.id);
        Ok(card)
    }

    /// Delete a card of `org_id` and close the gap in its list
    pub fn delete_card(&self, actor: &Actor, card_id: &str, org_id: &str) -> Result<Card> {
        let deleted = self.store().write(|db| {
            let list_id = db
                .cards
                .get(card_id)
                .map(|c| c.list_id.clone())
                .ok_or_else(|| Error::not_found("Card not found!"))?;
            let owner = list_org(db, &list_id)?;
            if owner != org_id {
                return Err(Error::not_found("Card not found!"));
            }

            let Some(card) = db.cards.remove(card_id) else {
                return Err(Error::not_found("Card not found!"));
            };
            let plan = ordering::plan_compaction(&db.cards_of(&card.list_id), card.order);
            db.apply_card_placements(&plan);

            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Delete,
                    owner,
                    Entity::new(&card.id, EntityType::Card, &card.title),
                ),
            );
            Ok(card)
        })?;

        tracing::info!("Deleted card {} from {}", deleted.id, deleted.list_id);
        Ok(deleted)
    }
}

/// Organization owning a list through its board
fn list_org(db: &Collections, list_id: &str) -> Result<String> {
    let list = db
        .lists
        .get(list_id)
        .ok_or_else(|| Error::not_found("List not found!"))?;
    db.org_of_list(list)
        .map(str::to_string)
        .ok_or_else(|| Error::not_found("Board not found!"))
}

/// The one destination entry that still lives in the source list
fn moved_card(db: &Collections, source_id: &str, updates: &[OrderUpdate]) -> Result<Card> {
    let mut from_source = updates
        .iter()
        .filter_map(|u| db.cards.get(&u.id))
        .filter(|c| c.list_id == source_id);

    match (from_source.next(), from_source.next()) {
        (Some(card), None) => Ok(card.clone()),
        (None, _) => Err(Error::bad_request(
            "Moved card is missing from the destination order",
        )),
        (Some(_), Some(_)) => Err(Error::bad_request(
            "Only one card can move between lists at a time",
        )),
    }
}
