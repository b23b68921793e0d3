//! Application layer for Exemplum.
//!
//! Requests are sent through a [`Mediator`], which runs each one through a
//! fixed pipeline of stages before its single handler:
//! logging, failure translation, authorization, validation, and (for
//! cacheable requests) response caching.

pub mod cache;
pub mod compose;
pub mod error;
pub mod exceptions;
pub mod mediator;
pub mod pipeline;
pub mod request;
pub mod security;
pub mod todo;
pub mod validation;
pub mod weather;

pub use cache::ResponseCache;
pub use compose::{Services, compose};
pub use error::{
    AccessDenied, BoxError, DownstreamApiError, ErrorEnvelope, ErrorKind, FieldFailure,
    MediatorError, NotFound,
};
pub use exceptions::{ErrorConverter, ErrorTranslator};
pub use mediator::{Mediator, MediatorBuilder};
pub use request::{Handler, Request, RequestContext};
pub use security::{Policy, Principal, permissions};
pub use validation::Validator;
