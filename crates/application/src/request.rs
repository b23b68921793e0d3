//! Requests, handlers, and the per-call context.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::BoxError;
use crate::security::Principal;

/// A query or command sent through the mediator.
pub trait Request: Send + Sync + fmt::Debug + 'static {
    /// Value returned on success.
    type Response: Clone + Send + Sync + 'static;

    /// Request type name, used in logs, metrics, and cache keys.
    const NAME: &'static str;
}

/// Handles one request type. Exactly one handler exists per type.
#[async_trait]
pub trait Handler<R: Request>: Send + Sync {
    async fn handle(&self, request: &R, ctx: &RequestContext) -> Result<R::Response, BoxError>;
}

/// Ambient state of one request: who sent it and whether it was abandoned.
#[derive(Debug, Clone)]
pub struct RequestContext {
    principal: Option<Principal>,
    cancellation: CancellationToken,
    correlation_id: Uuid,
}

impl RequestContext {
    /// Creates a context for an anonymous caller.
    pub fn anonymous() -> Self {
        Self {
            principal: None,
            cancellation: CancellationToken::new(),
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Creates a context for an authenticated caller.
    pub fn for_principal(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            ..Self::anonymous()
        }
    }

    /// Replaces the cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Replaces the correlation id.
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn user_id(&self) -> Option<&common::UserId> {
        self.principal.as_ref().map(Principal::user_id)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
