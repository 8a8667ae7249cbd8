//! Error types shared by the service layer and the exercise pipeline.
//!
//! `ApiError` covers remote failures and client-side validation; each call
//! site reports its own failure and nothing here is fatal.

use std::fmt;

use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur when talking to the school API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never reached the server, or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Missing or expired credentials (HTTP 401).
    #[error("authentication required: {0}")]
    Unauthorized(String),

    /// The caller may not touch this record (HTTP 403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The record does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other error response.
    #[error("API error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Rejected locally before any request was sent.
    #[error("invalid input: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),
}

impl ApiError {
    /// Message suitable for an inline error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) | ApiError::Timeout(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Unauthorized(_) => "Your session has expired. Please sign in again.".into(),
            ApiError::Forbidden(_) => "You do not have access to this record.".into(),
            ApiError::NotFound(_) => "This record no longer exists.".into(),
            ApiError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
            ApiError::Server { .. } | ApiError::Decode(_) => {
                "The server returned an unexpected response.".into()
            }
            ApiError::Validation(errors) => join_field_errors(errors),
        }
    }

    /// Failures scoped to one record: the view shows an empty state for
    /// that record and leaves sibling data untouched.
    pub fn is_record_scoped(&self) -> bool {
        matches!(self, ApiError::NotFound(_) | ApiError::Forbidden(_))
    }

    /// Whether the request was refused before reaching the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

/// Convenience alias used by every service trait.
pub type ApiResult<T> = Result<T, ApiError>;

/// Reasons a submission is refused.
#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    /// No question has an answer yet.
    #[error("answer at least one question before submitting")]
    NothingAnswered,

    /// A submission for the same attempt has not finished yet.
    #[error("a submission for exercise {exercise_id} attempt {attempt} is already in progress")]
    AlreadyInFlight { exercise_id: String, attempt: u32 },

    /// All allowed attempts are used.
    #[error("no attempts remaining ({max_attempts} allowed)")]
    AttemptsExhausted { max_attempts: u32 },

    /// The server rejected or never received the submission.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SubmitError {
    /// Whether the submission was stopped without a network call.
    pub fn is_local(&self) -> bool {
        !matches!(self, SubmitError::Api(_))
    }
}
