use std::fmt;

use reqwest::StatusCode;

/// Message shown when the backend gives nothing more specific.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend responded with {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a `NotFound` error was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Section(String),
    Lecture(String),
    Content(String),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section(id) => write!(f, "section {id}"),
            Self::Lecture(id) => write!(f, "lecture {id}"),
            Self::Content(id) => write!(f, "content {id}"),
        }
    }
}

impl Error {
    pub fn status(status: StatusCode, message: Option<String>) -> Self {
        Self::Status { status, message }
    }

    /// The text a toast shows for this failure.
    ///
    /// Every failure renders the same way unless the backend supplied a
    /// message of its own.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::InvalidInput(message) => message.clone(),
            _ => GENERIC_FAILURE.to_owned(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_fallback() {
        let err = Error::status(StatusCode::UNPROCESSABLE_ENTITY, Some("Title is required".into()));

        assert_eq!(err.user_message(), "Title is required");
        assert!(err.to_string().contains("422"));
    }

    #[test]
    fn blank_or_missing_message_falls_back() {
        let blank = Error::status(StatusCode::FORBIDDEN, Some("  ".into()));
        let missing = Error::status(StatusCode::INTERNAL_SERVER_ERROR, None);

        assert_eq!(blank.user_message(), GENERIC_FAILURE);
        assert_eq!(missing.user_message(), GENERIC_FAILURE);
        assert_eq!(Error::Decode("eof".into()).user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = Error::NotFound(Entity::Lecture("tmp-1".into()));
        assert_eq!(err.to_string(), "lecture tmp-1 not found");

        let err = Error::NotFound(Entity::Content("10:video".into()));
        assert_eq!(err.to_string(), "content 10:video not found");
    }
}
