use super::success;
use crate::app::SharedState;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, Payload};
use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;
use taskboard_core::{Board, BoardImage};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardRequest {
    #[serde(default)]
    organization_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image: BoardImage,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub title: String,
}

pub async fn create(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Payload(req): Payload<CreateBoardRequest>,
) -> ApiResult<Json<Value>> {
    let board = state
        .taskboard
        .create_board(&actor, &req.organization_id, &req.title, req.image)?;
    success("Create board successfully!", "board", board)
}

/// Boards of an organization, newest first
pub async fn list(
    State(state): State<SharedState>,
    Path(organization_id): Path<String>,
) -> Json<Vec<Board>> {
    Json(state.taskboard.boards_for_org(&organization_id))
}

pub async fn get(
    State(state): State<SharedState>,
    Path((organization_id, board_id)): Path<(String, String)>,
) -> ApiResult<Json<Board>> {
    Ok(Json(state.taskboard.board(&organization_id, &board_id)?))
}

pub async fn rename(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    Payload(req): Payload<RenameRequest>,
) -> ApiResult<Json<Value>> {
    let board = state.taskboard.rename_board(&actor, &id, &req.title)?;
    success(format!("Board \"{}\" updated!", board.title), "board", board)
}

pub async fn delete(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = state.taskboard.delete_board(&actor, &id)?;
    success(
        format!("Board \"{}\" deleted!", deleted.board.title),
        "board",
        deleted.board,
    )
}
