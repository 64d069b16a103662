//! HTTP error mapping
//!
//! Every failure leaves the server as `{message, code}` with the HTTP status
//! equal to `code`. Server-side failures never expose their details.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taskboard_core::Error;

/// Non-standard status used when the caller's login session has expired
pub const SESSION_EXPIRED: u16 = 440;

const GENERIC_MESSAGE: &str = "Oops! Something went wrong!";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),

    /// Body or query string that could not be decoded
    #[error("{0}")]
    InvalidRequest(String),

    #[error("This route does not exist!")]
    UnknownRoute,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    code: u16,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UnknownRoute => StatusCode::BAD_REQUEST,
            Self::Core(e) => match e {
                Error::BadRequest(_) | Error::LimitReached { .. } => StatusCode::BAD_REQUEST,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::Conflict(_) => StatusCode::CONFLICT,
                Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                Error::Forbidden(_) => StatusCode::FORBIDDEN,
                Error::SessionExpired => StatusCode::from_u16(SESSION_EXPIRED)
                    .unwrap_or(StatusCode::UNAUTHORIZED),
                Error::Io(_)
                | Error::Json(_)
                | Error::Toml(_)
                | Error::Billing(_)
                | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", detail);
            GENERIC_MESSAGE
        } else {
            tracing::warn!("Rejected request ({}): {}", status.as_u16(), detail);
            detail.as_str()
        };

        let body = ErrorBody {
            message,
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (Error::bad_request("x"), 400),
            (Error::LimitReached { max: 5 }, 400),
            (Error::not_found("x"), 404),
            (Error::conflict("x"), 409),
            (Error::Unauthorized("x".into()), 401),
            (Error::Forbidden("x".into()), 403),
            (Error::SessionExpired, 440),
            (Error::Billing("x".into()), 500),
        ];
        for (error, code) in cases {
            assert_eq!(ApiError::from(error).status_code().as_u16(), code);
        }
        assert_eq!(ApiError::UnknownRoute.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response = ApiError::from(Error::Other("disk on fire".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], GENERIC_MESSAGE);
        assert_eq!(body["code"], 500);
    }
}
