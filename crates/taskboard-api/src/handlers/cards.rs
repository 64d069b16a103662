use super::success;
use crate::app::SharedState;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, Payload};
use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;
use taskboard_core::{Error, OrderUpdate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    #[serde(default)]
    list_id: String,
    #[serde(default)]
    title: String,
    description: Option<String>,
}

/// Drag-and-drop result
///
/// With `sourceId == destId` the cards of `sourceCards` are reordered in
/// place. Otherwise `destCards` is the destination after the move.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardOrderRequest {
    #[serde(default)]
    source_id: String,
    #[serde(default)]
    dest_id: String,
    card_id: Option<String>,
    #[serde(default)]
    source_cards: Vec<OrderUpdate>,
    #[serde(default)]
    dest_cards: Vec<OrderUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCardRequest {
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyCardRequest {
    #[serde(default)]
    card_id: String,
    title: Option<String>,
    description: Option<String>,
}

pub async fn create(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Payload(req): Payload<CreateCardRequest>,
) -> ApiResult<Json<Value>> {
    let card = state
        .taskboard
        .create_card(&actor, &req.list_id, &req.title, req.description)?;
    success(format!("Card \"{}\" created!", card.title), "card", card)
}

pub async fn reorder(
    State(state): State<SharedState>,
    CurrentUser(_): CurrentUser,
    Payload(req): Payload<CardOrderRequest>,
) -> ApiResult<Json<Value>> {
    let cards = if req.source_id == req.dest_id {
        state.taskboard.reorder_cards(&req.source_id, &req.source_cards)?
    } else {
        if !req.source_cards.is_empty() {
            tracing::debug!(
                "Ignoring {} source entries on move; resubmit them as a reorder",
                req.source_cards.len()
            );
        }
        state.taskboard.move_card(
            &req.source_id,
            &req.dest_id,
            req.card_id.as_deref(),
            &req.dest_cards,
        )?
    };
    success("Card order updated!", "cards", cards)
}

pub async fn update(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Payload(req): Payload<UpdateCardRequest>,
) -> ApiResult<Json<Value>> {
    let card = state
        .taskboard
        .update_card(&actor, &id, req.title, req.description)?;
    success(format!("Card \"{}\" updated!", card.title), "card", card)
}

pub async fn copy(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Payload(req): Payload<CopyCardRequest>,
) -> ApiResult<Json<Value>> {
    let card = state
        .taskboard
        .copy_card(&actor, &req.card_id, req.title, req.description)?;
    success(format!("Card \"{}\" copied!", card.title), "card", card)
}

pub async fn delete(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path((id, org_id, user_id)): Path<(String, String, String)>,
) -> ApiResult<Json<Value>> {
    if user_id != actor.id {
        return Err(Error::Forbidden("Forbidden!".into()).into());
    }
    let card = state.taskboard.delete_card(&actor, &id, &org_id)?;
    success(format!("Card \"{}\" deleted!", card.title), "card", card)
}
