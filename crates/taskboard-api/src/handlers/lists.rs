use super::boards::RenameRequest;
use super::success;
use crate::app::SharedState;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, Payload};
use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;
use taskboard_core::{ListWithCards, OrderUpdate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    #[serde(default)]
    board_id: String,
    #[serde(default)]
    organization_id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderListsRequest {
    #[serde(default)]
    board_id: String,
    lists: Vec<OrderUpdate>,
}

fn with_cards_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyListRequest {
    #[serde(default)]
    list_id: String,
    title: Option<String>,
    #[serde(default = "with_cards_default")]
    with_cards: bool,
}

pub async fn create(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Payload(req): Payload<CreateListRequest>,
) -> ApiResult<Json<Value>> {
    let list = state
        .taskboard
        .create_list(&actor, &req.board_id, &req.organization_id, &req.title)?;
    success("List created!", "list", list)
}

/// Lists of a board with nested cards
pub async fn list(
    State(state): State<SharedState>,
    Path((board_id, org_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<ListWithCards>>> {
    Ok(Json(state.taskboard.lists_with_cards(&board_id, &org_id)?))
}

pub async fn reorder(
    State(state): State<SharedState>,
    CurrentUser(_): CurrentUser,
    Payload(req): Payload<ReorderListsRequest>,
) -> ApiResult<Json<Value>> {
    let lists = state.taskboard.reorder_lists(&req.board_id, &req.lists)?;
    success("List reordered!", "lists", lists)
}

pub async fn rename(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Payload(req): Payload<RenameRequest>,
) -> ApiResult<Json<Value>> {
    let list = state.taskboard.rename_list(&actor, &id, &req.title)?;
    success("Updated list!", "list", list)
}

pub async fn delete(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let list = state.taskboard.delete_list(&actor, &id)?;
    success(format!("List \"{}\" deleted!", list.title), "list", list)
}

pub async fn copy(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Payload(req): Payload<CopyListRequest>,
) -> ApiResult<Json<Value>> {
    let copied = state
        .taskboard
        .copy_list(&actor, &req.list_id, req.title, req.with_cards)?;
    success(
        format!("List \"{}\" copied!", copied.list.title),
        "list",
        copied,
    )
}
