//! Domain error types.

use thiserror::Error;

/// Errors raised when an entity rejects a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The colour code is not part of the supported palette.
    #[error("Colour \"{0}\" is unsupported")]
    UnsupportedColour(String),

    /// A title was empty or whitespace only.
    #[error("{entity} title must not be empty")]
    EmptyTitle { entity: &'static str },

    /// The priority name is not recognised.
    #[error("Priority level \"{0}\" is unsupported")]
    UnsupportedPriority(String),
}
