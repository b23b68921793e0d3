use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Next, PipelineError, Stage};
use crate::cache::ResponseCache;
use crate::request::{Request, RequestContext};

/// Serves live cached responses and caches fresh ones.
pub struct CachingStage<R> {
    cache: ResponseCache,
    ttl: Duration,
    _request: PhantomData<fn(&R)>,
}

impl<R> CachingStage<R> {
    pub fn new(cache: ResponseCache, ttl: Duration) -> Self {
        Self {
            cache,
            ttl,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Request + Serialize> Stage<R> for CachingStage<R> {
    async fn process(
        &self,
        request: &R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, PipelineError> {
        let key = match ResponseCache::key_for(request) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(request = R::NAME, error = %err, "request not cacheable");
                return next.run(request, ctx).await;
            }
        };

        if let Some(response) = self.cache.get::<R::Response>(&key).await {
            tracing::debug!(%key, "cache hit");
            metrics::counter!("pipeline_cache_hits_total", "request" => R::NAME).increment(1);
            return Ok(response);
        }

        let response = next.run(request, ctx).await?;
        self.cache.insert(key, response.clone(), self.ttl).await;
        Ok(response)
    }
}
