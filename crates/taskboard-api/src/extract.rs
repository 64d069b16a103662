//! Request extractors
//!
//! [`Payload`] is `axum::Json` with rejections reported as 400 in the usual
//! error envelope. [`CurrentUser`] reads the acting user from the headers the
//! upstream identity provider sets.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use taskboard_core::{Actor, Error};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_FIRST_NAME_HEADER: &str = "x-user-first-name";
pub const USER_LAST_NAME_HEADER: &str = "x-user-last-name";
pub const USER_IMAGE_HEADER: &str = "x-user-image";
/// RFC 3339 instant after which the session is no longer accepted
pub const SESSION_EXPIRES_HEADER: &str = "x-session-expires-at";

/// JSON request body
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// The authenticated user performing the request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Actor);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers, Utc::now())
            .map(Self)
            .map_err(ApiError::from)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build the acting user from identity headers, checking session expiry
pub fn actor_from_headers(headers: &HeaderMap, now: DateTime<Utc>) -> taskboard_core::Result<Actor> {
    let id = header(headers, USER_ID_HEADER)
        .ok_or_else(|| Error::Unauthorized("Unauthorized".into()))?;

    if let Some(expires) = header(headers, SESSION_EXPIRES_HEADER) {
        let expires = DateTime::parse_from_rfc3339(expires)
            .map_err(|_| Error::Unauthorized("Invalid session expiry".into()))?;
        if expires.with_timezone(&Utc) <= now {
            return Err(Error::SessionExpired);
        }
    }

    let text = |name: &str| header(headers, name).unwrap_or_default().to_string();
    Ok(Actor {
        id: id.to_string(),
        first_name: text(USER_FIRST_NAME_HEADER),
        last_name: text(USER_LAST_NAME_HEADER),
        image: text(USER_IMAGE_HEADER),
    })
}
