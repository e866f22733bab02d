//! Error type definitions.
//!
//! `ChatError` is the single error enum used across the store adapter,
//! identity adapter, directory, conversation model, and HTTP handlers.
//! Each variant maps to an HTTP status code via [`ChatError::status_code`].

use axum::http::StatusCode;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type ChatResult<T> = Result<T, ChatError>;

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A referenced record (user, chat, group, message, invite) does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint was violated (e.g. username already reserved).
    #[error("{0}")]
    Conflict(String),

    /// The target user is already a member of the group.
    #[error("user is already a member of this group")]
    AlreadyMember,

    /// The caller is not allowed to perform this action.
    #[error("{0}")]
    Forbidden(String),

    /// Unknown account or wrong password. Deliberately does not say which.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("email is already registered")]
    EmailInUse,

    /// The image host rejected the upload or could not be reached.
    #[error("image upload failed: {0}")]
    UploadFailed(String),

    /// Malformed request input (bad username, short password, empty text).
    #[error("{0}")]
    Invalid(String),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON encoding/decoding failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session token creation or verification failure.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Anything else.
    #[error("{0}")]
    Unknown(String),
}

impl ChatError {
    /// Shorthand for a `NotFound` describing what was missing.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Shorthand for a `Forbidden` with a human-readable reason.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    /// Shorthand for an `Invalid` input error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::AlreadyMember | Self::EmailInUse => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidCredentials | Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Serialization(_) | Self::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
