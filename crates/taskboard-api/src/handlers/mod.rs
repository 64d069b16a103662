//! Request handlers
//!
//! Reads answer with the raw JSON document(s). Mutations answer with
//! `{message, <key>: data}`.

pub mod boards;
pub mod cards;
pub mod lists;
pub mod logs;
pub mod org;

use crate::error::ApiResult;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use taskboard_core::Error;

/// Success envelope for a mutation
pub fn success<T: Serialize>(message: impl Into<String>, key: &str, data: T) -> ApiResult<Json<Value>> {
    let mut body = Map::new();
    body.insert("message".to_string(), Value::String(message.into()));
    body.insert(key.to_string(), serde_json::to_value(data).map_err(Error::from)?);
    Ok(Json(Value::Object(body)))
}
