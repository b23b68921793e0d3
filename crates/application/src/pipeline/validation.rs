use std::sync::Arc;

use async_trait::async_trait;

use super::{Next, PipelineError, Stage};
use crate::error::ErrorEnvelope;
use crate::request::{Request, RequestContext};
use crate::validation::Validator;

/// Runs every validator and rejects the request with all their failures.
pub struct ValidationStage<R: Request> {
    validators: Vec<Arc<dyn Validator<R>>>,
}

impl<R: Request> ValidationStage<R> {
    pub fn new(validators: Vec<Arc<dyn Validator<R>>>) -> Self {
        Self { validators }
    }
}

#[async_trait]
impl<R: Request> Stage<R> for ValidationStage<R> {
    async fn process(
        &self,
        request: &R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError> {
        let failures: Vec<_> = self
            .validators
            .iter()
            .flat_map(|v| v.validate(request))
            .collect();

        if !failures.is_empty() {
            tracing::debug!(request = R::NAME, failures = failures.len(), "validation failed");
            return Err(ErrorEnvelope::validation(failures).into());
        }

        next.run(request, ctx).await
    }
}
