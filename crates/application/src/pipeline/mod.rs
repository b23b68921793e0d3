//! Request pipeline: an ordered list of stages around handler dispatch.
//!
//! Every request type gets the same fixed order:
//!
//! 1. [`LoggingStage`] records entry, outcome, and elapsed time
//! 2. [`GuardStage`] turns unexpected failures and panics into envelopes
//! 3. [`AuthorizationStage`] checks the declared policies
//! 4. [`ValidationStage`] runs every registered validator
//! 5. [`CachingStage`] serves live cached responses (cacheable types only)
//! 6. handler dispatch
//!
//! A stage receives a [`Next`] continuation and decides whether to run it.

mod authorization;
mod caching;
mod guard;
mod logging;
mod validation;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BoxError, ErrorEnvelope};
use crate::request::{Handler, Request, RequestContext};

pub use authorization::AuthorizationStage;
pub use caching::CachingStage;
pub use guard::GuardStage;
pub use logging::LoggingStage;
pub use validation::ValidationStage;

/// Outcome of a failed stage or handler.
#[derive(Debug)]
pub enum PipelineError {
    /// A typed outcome produced by a stage. Passed through unchanged.
    Rejected(ErrorEnvelope),

    /// An unexpected handler failure, still to be translated.
    Failed(BoxError),
}

impl From<ErrorEnvelope> for PipelineError {
    fn from(envelope: ErrorEnvelope) -> Self {
        PipelineError::Rejected(envelope)
    }
}

/// One step of the pipeline.
#[async_trait]
pub trait Stage<R: Request>: Send + Sync {
    async fn process(
        &self,
        request: &R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError>;
}

/// The rest of the pipeline after the current stage.
pub struct Next<'a, R: Request> {
    stages: &'a [Arc<dyn Stage<R>>],
    handler: &'a dyn Handler<R>,
}

impl<'a, R: Request> Next<'a, R> {
    /// Runs the remaining stages and then the handler.
    pub async fn run(self, request: &R, ctx: &RequestContext) -> Result<R::Response, PipelineError> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    handler: self.handler,
                };
                stage.process(request, ctx, next).await
            }
            None => dispatch(self.handler, request, ctx).await,
        }
    }
}

/// Invokes the handler unless the request is cancelled first.
async fn dispatch<R: Request>(
    handler: &dyn Handler<R>,
    request: &R,
    ctx: &RequestContext,
) -> Result<R::Response, PipelineError> {
    if ctx.is_cancelled() {
        return Err(ErrorEnvelope::cancelled().into());
    }

    tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => {
            tracing::debug!(request = R::NAME, "request cancelled during dispatch");
            Err(ErrorEnvelope::cancelled().into())
        }
        result = handler.handle(request, ctx) => result.map_err(PipelineError::Failed),
    }
}

/// The composed pipeline for one request type.
pub struct Pipeline<R: Request> {
    stages: Vec<Arc<dyn Stage<R>>>,
    handler: Arc<dyn Handler<R>>,
}

impl<R: Request> Pipeline<R> {
    pub fn new(stages: Vec<Arc<dyn Stage<R>>>, handler: Arc<dyn Handler<R>>) -> Self {
        Self { stages, handler }
    }

    /// Runs the request through every stage.
    ///
    /// A `Failed` outcome only escapes when the pipeline has no guard stage;
    /// it is translated to a generic internal error here.
    pub async fn execute(&self, request: &R, ctx: &RequestContext) -> Result<R::Response, ErrorEnvelope> {
        let next = Next {
            stages: &self.stages,
            handler: self.handler.as_ref(),
        };
        next.run(request, ctx).await.map_err(|err| match err {
            PipelineError::Rejected(envelope) => envelope,
            PipelineError::Failed(_) => ErrorEnvelope::internal(),
        })
    }
}
