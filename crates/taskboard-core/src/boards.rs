//! Board operations

use crate::audit::{Action, Actor, AuditEvent, Entity, EntityType};
use crate::id::BOARD_PREFIX;
use crate::model::{Board, BoardImage};
use crate::service::{Taskboard, required};
use crate::{Error, Result};
use chrono::Utc;

/// What a board deletion removed
#[derive(Debug, Clone)]
pub struct DeletedBoard {
    pub board: Board,
    pub lists: usize,
    pub cards: usize,
}

impl Taskboard {
    /// Create a board, charging the organization's free tier unless it is
    /// subscribed
    pub fn create_board(
        &self,
        actor: &Actor,
        org_id: &str,
        title: &str,
        image: BoardImage,
    ) -> Result<Board> {
        let org_id = required(org_id, "organizationId")?;
        let title = required(title, "title")?;
        if let Some(field) = image.missing_field() {
            return Err(Error::bad_request(format!("image.{} is required", field)));
        }

        let max = self.config().max_free_boards;
        let grace = self.config().subscription_grace_ms;

        let board = self.store().write(|db| {
            if !db.subscription_valid(&org_id, Utc::now(), grace) {
                db.try_acquire_board_slot(&org_id, max)?;
            }

            let id = db.fresh_id(BOARD_PREFIX, |db, id| db.boards.contains_key(id));
            let board = Board::new(id, org_id.clone(), title, image);
            db.boards.insert(board.id.clone(), board.clone());
            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Create,
                    &org_id,
                    Entity::new(&board.id, EntityType::Board, &board.title),
                ),
            );
            Ok(board)
        })?;

        tracing::info!("Created board {} for {}", board.id, board.organization_id);
        Ok(board)
    }

    /// Boards of an organization, newest first
    pub fn boards_for_org(&self, org_id: &str) -> Vec<Board> {
        let mut boards: Vec<Board> = self.store().read(|db| {
            db.boards
                .values()
                .filter(|b| b.organization_id == org_id)
                .cloned()
                .collect()
        });
        boards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        boards
    }

    pub fn board(&self, org_id: &str, board_id: &str) -> Result<Board> {
        self.store()
            .read(|db| {
                db.boards
                    .get(board_id)
                    .filter(|b| b.organization_id == org_id)
                    .cloned()
            })
            .ok_or_else(|| Error::not_found("Board not found!"))
    }

    pub fn rename_board(&self, actor: &Actor, board_id: &str, title: &str) -> Result<Board> {
        let title = required(title, "title")?;

        self.store().write(|db| {
            let board = db
                .boards
                .get_mut(board_id)
                .ok_or_else(|| Error::not_found("Board not found!"))?;
            board.rename(title);
            let board = board.clone();

            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Update,
                    &board.organization_id,
                    Entity::new(&board.id, EntityType::Board, &board.title),
                ),
            );
            Ok(board)
        })
    }

    /// Delete a board with all of its lists and cards
    pub fn delete_board(&self, actor: &Actor, board_id: &str) -> Result<DeletedBoard> {
        let grace = self.config().subscription_grace_ms;

        let deleted = self.store().write(|db| {
            let board = db
                .boards
                .remove(board_id)
                .ok_or_else(|| Error::not_found("Board not found!"))?;

            let list_ids: Vec<String> = db.lists_of(board_id).into_iter().map(|l| l.id).collect();
            let mut cards = 0;
            for list_id in &list_ids {
                cards += db.remove_cards_of(list_id);
                db.lists.remove(list_id);
            }

            if !db.subscription_valid(&board.organization_id, Utc::now(), grace) {
                db.release_board_slot(&board.organization_id);
            }

            db.append_log(
                actor,
                AuditEvent::new(
                    Action::Delete,
                    &board.organization_id,
                    Entity::new(&board.id, EntityType::Board, &board.title),
                ),
            );

            Ok(DeletedBoard {
                board,
                lists: list_ids.len(),
                cards,
            })
        })?;

        tracing::info!(
            "Deleted board {} ({} lists, {} cards)",
            deleted.board.id,
            deleted.lists,
            deleted.cards
        );
        Ok(deleted)
    }
}
