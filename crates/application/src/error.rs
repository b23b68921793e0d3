//! Error envelope and the typed failures handlers raise.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by handlers, boxed so the exception translator can
/// downcast it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationFailed,
    Unauthorized,
    NotFound,
    Conflict,
    Cancelled,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "ValidationFailed",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
}

impl FieldFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The uniform failure outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,

    /// Failing fields, for `ValidationFailed` and `Conflict`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldFailure>,
}

impl ErrorEnvelope {
    /// Message used for every failure nothing more specific was found for.
    pub const INTERNAL_ERROR_MESSAGE: &'static str =
        "An unexpected error occurred while processing the request.";

    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation(errors: Vec<FieldFailure>) -> Self {
        Self {
            kind: ErrorKind::ValidationFailed,
            message: "One or more validation failures have occurred.".to_string(),
            errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::Conflict,
            errors: vec![FieldFailure::new(field, message.clone())],
            message,
        }
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "The request was cancelled.")
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::InternalError, Self::INTERNAL_ERROR_MESSAGE)
    }
}

/// A call to a downstream HTTP API failed.
#[derive(Debug, Error)]
#[error("{service} request failed: {message}")]
pub struct DownstreamApiError {
    /// Name of the called service.
    pub service: &'static str,

    /// HTTP status, if a response was received.
    pub status: Option<u16>,

    pub message: String,
}

/// The current principal may not perform an action.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AccessDenied(pub String);

/// A referenced entity does not exist.
#[derive(Debug, Error)]
#[error("{entity} ({id}) was not found.")]
pub struct NotFound {
    pub entity: &'static str,
    pub id: String,
}

impl NotFound {
    pub fn new(entity: &'static str, id: impl fmt::Display) -> Self {
        Self {
            entity,
            id: id.to_string(),
        }
    }
}

/// Errors raised while composing the mediator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediatorError {
    /// A second handler was registered for one request type.
    #[error("A handler is already registered for {request}")]
    DuplicateHandler { request: &'static str },

    /// Pipeline settings were registered for a request type with no handler.
    #[error("No handler registered for {request}")]
    MissingHandler { request: &'static str },
}
