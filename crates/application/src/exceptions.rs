//! Translation of unexpected failures into error envelopes.

use std::error::Error;

use domain::DomainError;
use persistence::PersistenceError;

use crate::error::{AccessDenied, DownstreamApiError, ErrorEnvelope, FieldFailure, NotFound};

/// Converts one family of failures into an envelope.
pub trait ErrorConverter: Send + Sync {
    /// Returns an envelope if this converter recognizes the error.
    fn convert(&self, error: &(dyn Error + 'static)) -> Option<ErrorEnvelope>;
}

/// Downstream API failures become a validation envelope naming the service.
pub struct DownstreamApiConverter;

impl ErrorConverter for DownstreamApiConverter {
    fn convert(&self, error: &(dyn Error + 'static)) -> Option<ErrorEnvelope> {
        let err = error.downcast_ref::<DownstreamApiError>()?;
        Some(ErrorEnvelope::validation(vec![FieldFailure::new(
            err.service,
            err.message.clone(),
        )]))
    }
}

pub struct AccessDeniedConverter;

impl ErrorConverter for AccessDeniedConverter {
    fn convert(&self, error: &(dyn Error + 'static)) -> Option<ErrorEnvelope> {
        let err = error.downcast_ref::<AccessDenied>()?;
        Some(ErrorEnvelope::unauthorized(err.to_string()))
    }
}

pub struct NotFoundConverter;

impl ErrorConverter for NotFoundConverter {
    fn convert(&self, error: &(dyn Error + 'static)) -> Option<ErrorEnvelope> {
        let err = error.downcast_ref::<NotFound>()?;
        Some(ErrorEnvelope::not_found(err.to_string()))
    }
}

/// Entity invariant violations become a validation failure on the field
/// the entity rejected.
pub struct DomainErrorConverter;

impl ErrorConverter for DomainErrorConverter {
    fn convert(&self, error: &(dyn Error + 'static)) -> Option<ErrorEnvelope> {
        let err = error.downcast_ref::<DomainError>()?;
        let field = match err {
            DomainError::UnsupportedColour(_) => "colour",
            DomainError::EmptyTitle { .. } => "title",
            DomainError::UnsupportedPriority(_) => "priority",
        };
        Some(ErrorEnvelope::validation(vec![FieldFailure::new(
            field,
            err.to_string(),
        )]))
    }
}

/// Unique-index violations become a conflict on the offending field.
pub struct UniqueIndexConverter;

impl ErrorConverter for UniqueIndexConverter {
    fn convert(&self, error: &(dyn Error + 'static)) -> Option<ErrorEnvelope> {
        let err = error.downcast_ref::<PersistenceError>()?;
        match err {
            PersistenceError::UniqueViolation { field, message, .. } => {
                Some(ErrorEnvelope::conflict(field.clone(), message.clone()))
            }
            _ => None,
        }
    }
}

/// Registry of converters, consulted in registration order before falling
/// back to a generic internal error.
pub struct ErrorTranslator {
    converters: Vec<Box<dyn ErrorConverter>>,
}

impl ErrorTranslator {
    /// Creates a translator with no converters; everything is internal.
    pub fn empty() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    pub fn register(&mut self, converter: impl ErrorConverter + 'static) -> &mut Self {
        self.converters.push(Box::new(converter));
        self
    }

    /// Translates an error. Each error in the source chain is offered to
    /// every converter; the first match wins.
    pub fn translate(&self, error: &(dyn Error + 'static)) -> ErrorEnvelope {
        let mut current = Some(error);
        while let Some(err) = current {
            if let Some(envelope) = self.converters.iter().find_map(|c| c.convert(err)) {
                return envelope;
            }
            current = err.source();
        }
        ErrorEnvelope::internal()
    }
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        let mut translator = Self::empty();
        translator
            .register(DownstreamApiConverter)
            .register(AccessDeniedConverter)
            .register(NotFoundConverter)
            .register(DomainErrorConverter)
            .register(UniqueIndexConverter);
        translator
    }
}
