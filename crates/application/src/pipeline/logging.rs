use std::time::Instant;

use async_trait::async_trait;

use super::{Next, PipelineError, Stage};
use crate::request::{Request, RequestContext};

/// Logs request entry with the acting user, then outcome and elapsed time.
pub struct LoggingStage;

#[async_trait]
impl<R: Request> Stage<R> for LoggingStage {
    async fn process(
        &self,
        request: &R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError> {
        let user_id = ctx.user_id().map(|u| u.as_str()).unwrap_or("");
        tracing::info!(request = R::NAME, user_id, ?request, "handling request");

        let started = Instant::now();
        let result = next.run(request, ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = match &result {
            Ok(_) => {
                tracing::info!(request = R::NAME, elapsed_ms, "request handled");
                "ok"
            }
            Err(PipelineError::Rejected(envelope)) => {
                tracing::info!(
                    request = R::NAME,
                    elapsed_ms,
                    kind = %envelope.kind,
                    "request rejected"
                );
                envelope.kind.as_str()
            }
            Err(PipelineError::Failed(_)) => {
                tracing::warn!(request = R::NAME, elapsed_ms, "request failed");
                "failed"
            }
        };

        metrics::counter!(
            "pipeline_requests_total",
            "request" => R::NAME,
            "outcome" => outcome
        )
        .increment(1);

        result
    }
}
