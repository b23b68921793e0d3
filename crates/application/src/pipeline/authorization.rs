use async_trait::async_trait;

use super::{Next, PipelineError, Stage};
use crate::error::ErrorEnvelope;
use crate::request::{Request, RequestContext};
use crate::security::Policy;

/// Rejects the request unless the principal satisfies every policy.
pub struct AuthorizationStage {
    policies: Vec<Policy>,
}

impl AuthorizationStage {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self { policies }
    }
}

#[async_trait]
impl<R: Request> Stage<R> for AuthorizationStage {
    async fn process(
        &self,
        request: &R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError> {
        let principal = ctx.principal();
        if let Some(policy) = self.policies.iter().find(|p| !p.is_satisfied_by(principal)) {
            tracing::info!(
                request = R::NAME,
                policy = policy.name,
                user_id = ?ctx.user_id(),
                "authorization failed"
            );
            return Err(ErrorEnvelope::unauthorized(format!(
                "The '{}' policy requires the '{}' permission.",
                policy.name, policy.required_permission
            ))
            .into());
        }

        next.run(request, ctx).await
    }
}
