use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;

use super::{Next, PipelineError, Stage};
use crate::error::ErrorEnvelope;
use crate::exceptions::ErrorTranslator;
use crate::request::{Request, RequestContext};

/// Catches every failure that is not already an envelope, panics included,
/// logs it, and translates it.
pub struct GuardStage {
    translator: Arc<ErrorTranslator>,
}

impl GuardStage {
    pub fn new(translator: Arc<ErrorTranslator>) -> Self {
        Self { translator }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[async_trait]
impl<R: Request> Stage<R> for GuardStage {
    async fn process(
        &self,
        request: &R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError> {
        match AssertUnwindSafe(next.run(request, ctx)).catch_unwind().await {
            Ok(Err(PipelineError::Failed(err))) => {
                tracing::error!(request = R::NAME, ?request, error = %err, "unhandled failure");
                Err(PipelineError::Rejected(self.translator.translate(err.as_ref())))
            }
            Ok(result) => result,
            Err(payload) => {
                tracing::error!(
                    request = R::NAME,
                    ?request,
                    panic = panic_message(payload.as_ref()),
                    "handler panicked"
                );
                Err(PipelineError::Rejected(ErrorEnvelope::internal()))
            }
        }
    }
}
