//! Error types for taskboard

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Login session is expired, please login again!")]
    SessionExpired,

    /// Free-tier board cap reached for an unsubscribed organization
    #[error("You have reached your limit of {max} free boards. Please upgrade to create more.")]
    LimitReached { max: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Billing error: {0}")]
    Billing(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict(message.into())
    }

    /// True for errors caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::BadRequest(_)
                | Error::NotFound(_)
                | Error::Conflict(_)
                | Error::Unauthorized(_)
                | Error::Forbidden(_)
                | Error::SessionExpired
                | Error::LimitReached { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(Error::not_found("Board not found!").is_client_error());
        assert!(Error::LimitReached { max: 5 }.is_client_error());
        assert!(Error::SessionExpired.is_client_error());
        assert!(!Error::Billing("timeout".into()).is_client_error());
        assert!(!Error::Io(std::io::Error::other("disk")).is_client_error());
    }

    #[test]
    fn test_limit_message() {
        assert_eq!(
            Error::LimitReached { max: 5 }.to_string(),
            "You have reached your limit of 5 free boards. Please upgrade to create more."
        );
    }
}
