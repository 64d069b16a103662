use crate::app::SharedState;
use crate::error::ApiResult;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use taskboard_core::{EntityType, Log};

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    limit: Option<usize>,
}

/// Audit trail of an organization, newest first
pub async fn for_org(
    State(state): State<SharedState>,
    Path(org_id): Path<String>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Log>>> {
    let Query(query) = query?;
    Ok(Json(state.taskboard.logs_for_org(&org_id, query.limit)))
}

pub async fn for_entity(
    State(state): State<SharedState>,
    Path((entity_id, org_id, entity_type)): Path<(String, String, String)>,
) -> ApiResult<Json<Vec<Log>>> {
    let entity_type: EntityType = entity_type.parse()?;
    Ok(Json(
        state
            .taskboard
            .logs_for_entity(&org_id, &entity_id, entity_type),
    ))
}

#[cfg(test)]
mod tests {
    use crate::app::tests::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_org_logs_newest_first() {
        let app = TestApp::new();
        let board = app.board("Roadmap").await;
        app.list(&board, "Todo").await;
        app.patch(&format!("/api/board/{board}"), json!({ "title": "Plan" }))
            .await;

        let (status, logs) = app.get("/api/logs/org_1").await;
        assert_eq!(status, StatusCode::OK);
        let logs = logs.as_array().unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0]["action"], "UPDATE");
        assert_eq!(logs[0]["entity"]["type"], "BOARD");
        assert_eq!(logs[0]["user"]["id"], "user_1");
        assert_eq!(logs[2]["action"], "CREATE");

        let (_, limited) = app.get("/api/logs/org_1?limit=1").await;
        assert_eq!(limited.as_array().unwrap().len(), 1);

        let (status, _) = app.get("/api/logs/org_1?limit=many").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_entity_type() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/logs/card-1/org_1/widget").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }
}
