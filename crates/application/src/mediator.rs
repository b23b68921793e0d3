//! Request registry and the single entry point for sending requests.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;

use crate::cache::ResponseCache;
use crate::error::{ErrorEnvelope, MediatorError};
use crate::exceptions::ErrorTranslator;
use crate::pipeline::{
    AuthorizationStage, CachingStage, GuardStage, LoggingStage, Pipeline, Stage, ValidationStage,
};
use crate::request::{Handler, Request, RequestContext};
use crate::security::Policy;
use crate::validation::Validator;

/// Collaborators shared by every composed pipeline.
struct Shared {
    translator: Arc<ErrorTranslator>,
    cache: ResponseCache,
}

type CachingStageFactory<R> = fn(ResponseCache, Duration) -> Arc<dyn Stage<R>>;

fn caching_stage<R: Request + Serialize>(cache: ResponseCache, ttl: Duration) -> Arc<dyn Stage<R>> {
    Arc::new(CachingStage::<R>::new(cache, ttl))
}

/// Everything registered for one request type.
struct Registration<R: Request> {
    handler: Option<Arc<dyn Handler<R>>>,
    validators: Vec<Arc<dyn Validator<R>>>,
    policies: Vec<Policy>,
    caching: Option<(Duration, CachingStageFactory<R>)>,
}

impl<R: Request> Registration<R> {
    fn new() -> Self {
        Self {
            handler: None,
            validators: Vec::new(),
            policies: Vec::new(),
            caching: None,
        }
    }
}

/// A registration whose request type has been erased.
trait PendingPipeline: Send + Sync {
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    fn compose(self: Box<Self>, shared: &Shared) -> Result<Box<dyn Any + Send + Sync>, MediatorError>;
}

impl<R: Request> PendingPipeline for Registration<R> {
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn compose(self: Box<Self>, shared: &Shared) -> Result<Box<dyn Any + Send + Sync>, MediatorError> {
        let handler = self
            .handler
            .ok_or(MediatorError::MissingHandler { request: R::NAME })?;

        let mut stages: Vec<Arc<dyn Stage<R>>> = vec![
            Arc::new(LoggingStage),
            Arc::new(GuardStage::new(shared.translator.clone())),
            Arc::new(AuthorizationStage::new(self.policies)),
            Arc::new(ValidationStage::new(self.validators)),
        ];
        if let Some((ttl, factory)) = self.caching {
            stages.push(factory(shared.cache.clone(), ttl));
        }

        Ok(Box::new(Pipeline::new(stages, handler)))
    }
}

/// Collects handlers and pipeline settings, then composes one pipeline per
/// request type.
pub struct MediatorBuilder {
    registrations: HashMap<TypeId, Box<dyn PendingPipeline>>,
    translator: Arc<ErrorTranslator>,
    cache: ResponseCache,
}

impl MediatorBuilder {
    /// Creates a builder with the default error translator and a fresh cache.
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
            translator: Arc::new(ErrorTranslator::default()),
            cache: ResponseCache::new(),
        }
    }

    /// Replaces the error translator.
    pub fn with_translator(mut self, translator: ErrorTranslator) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// Replaces the response cache.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    fn update<R: Request>(&mut self, apply: impl FnOnce(&mut Registration<R>)) {
        let mut registration = self
            .registrations
            .remove(&TypeId::of::<R>())
            .and_then(|pending| pending.into_any().downcast::<Registration<R>>().ok())
            .unwrap_or_else(|| Box::new(Registration::new()));
        apply(&mut registration);
        self.registrations.insert(TypeId::of::<R>(), registration);
    }

    /// Registers the handler for a request type.
    pub fn register_handler<R, H>(&mut self, handler: H) -> Result<&mut Self, MediatorError>
    where
        R: Request,
        H: Handler<R> + 'static,
    {
        let mut duplicate = false;
        self.update::<R>(|registration| {
            if registration.handler.is_some() {
                duplicate = true;
            } else {
                registration.handler = Some(Arc::new(handler));
            }
        });

        if duplicate {
            return Err(MediatorError::DuplicateHandler { request: R::NAME });
        }
        Ok(self)
    }

    /// Adds a validator for a request type.
    pub fn register_validator<R, V>(&mut self, validator: V) -> &mut Self
    where
        R: Request,
        V: Validator<R> + 'static,
    {
        self.update::<R>(|registration| registration.validators.push(Arc::new(validator)));
        self
    }

    /// Requires a policy for a request type.
    pub fn register_policy<R: Request>(&mut self, policy: Policy) -> &mut Self {
        self.update::<R>(|registration| registration.policies.push(policy));
        self
    }

    /// Caches responses of a request type for `ttl`.
    pub fn register_cacheable<R>(&mut self, ttl: Duration) -> &mut Self
    where
        R: Request + Serialize,
    {
        self.update::<R>(|registration| {
            registration.caching = Some((ttl, caching_stage::<R> as CachingStageFactory<R>));
        });
        self
    }

    /// Composes every pipeline.
    ///
    /// Fails if settings were registered for a request type that has no
    /// handler.
    pub fn build(self) -> Result<Mediator, MediatorError> {
        let shared = Shared {
            translator: self.translator,
            cache: self.cache,
        };

        let pipelines = self
            .registrations
            .into_iter()
            .map(|(type_id, pending)| Ok((type_id, pending.compose(&shared)?)))
            .collect::<Result<HashMap<_, _>, MediatorError>>()?;

        tracing::debug!(request_types = pipelines.len(), "mediator composed");
        Ok(Mediator {
            pipelines,
            cache: shared.cache,
        })
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends requests through their composed pipelines.
pub struct Mediator {
    pipelines: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    cache: ResponseCache,
}

impl Mediator {
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Returns true if a handler is registered for `R`.
    pub fn handles<R: Request>(&self) -> bool {
        self.pipelines.contains_key(&TypeId::of::<R>())
    }

    /// The cache used by cacheable request types.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Sends a request and returns its response or error envelope.
    pub async fn send<R: Request>(
        &self,
        request: R,
        ctx: &RequestContext,
    ) -> Result<R::Response, ErrorEnvelope> {
        let Some(pipeline) = self
            .pipelines
            .get(&TypeId::of::<R>())
            .and_then(|pipeline| pipeline.downcast_ref::<Pipeline<R>>())
        else {
            tracing::error!(request = R::NAME, "no handler registered");
            return Err(ErrorEnvelope::internal());
        };

        let span = tracing::info_span!(
            "request",
            request = R::NAME,
            correlation_id = %ctx.correlation_id()
        );
        pipeline.execute(&request, ctx).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, ErrorKind, FieldFailure, NotFound};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Ping;

    impl Request for Ping {
        type Response = &'static str;
        const NAME: &'static str = "Ping";
    }

    struct PingHandler;

    #[async_trait]
    impl Handler<Ping> for PingHandler {
        async fn handle(&self, _request: &Ping, _ctx: &RequestContext) -> Result<&'static str, BoxError> {
            Ok("pong")
        }
    }

    #[derive(Debug, Serialize)]
    struct Lookup {
        code: u32,
    }

    impl Request for Lookup {
        type Response = u32;
        const NAME: &'static str = "Lookup";
    }

    #[derive(Default)]
    struct LookupHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Handler<Lookup> for Arc<LookupHandler> {
        async fn handle(&self, request: &Lookup, _ctx: &RequestContext) -> Result<u32, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.code == 0 {
                return Err(NotFound::new("Code", 0).into());
            }
            Ok(request.code * 2)
        }
    }

    #[derive(Debug)]
    struct Unregistered;

    impl Request for Unregistered {
        type Response = ();
        const NAME: &'static str = "Unregistered";
    }

    #[test]
    fn second_handler_is_rejected() {
        let mut builder = MediatorBuilder::new();
        builder.register_handler::<Ping, _>(PingHandler).unwrap();

        let err = builder.register_handler::<Ping, _>(PingHandler).err();
        assert_eq!(err, Some(MediatorError::DuplicateHandler { request: "Ping" }));
    }

    #[test]
    fn settings_without_handler_fail_build() {
        let mut builder = MediatorBuilder::new();
        builder.register_policy::<Ping>(Policy::TODO_WRITE_ACCESS);

        let err = builder.build().err();
        assert_eq!(err, Some(MediatorError::MissingHandler { request: "Ping" }));
    }

    #[tokio::test]
    async fn sends_to_registered_handler() {
        let mut builder = MediatorBuilder::new();
        builder.register_handler::<Ping, _>(PingHandler).unwrap();
        let mediator = builder.build().unwrap();

        assert!(mediator.handles::<Ping>());
        assert_eq!(mediator.send(Ping, &RequestContext::anonymous()).await, Ok("pong"));
    }

    #[tokio::test]
    async fn unregistered_request_is_internal_error() {
        let mediator = MediatorBuilder::new().build().unwrap();

        let err = mediator
            .send(Unregistered, &RequestContext::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalError);
    }

    #[tokio::test]
    async fn validators_are_aggregated() {
        let mut builder = MediatorBuilder::new();
        builder
            .register_handler::<Ping, _>(PingHandler)
            .unwrap()
            .register_validator::<Ping, _>(|_: &Ping| vec![FieldFailure::new("a", "bad a")])
            .register_validator::<Ping, _>(|_: &Ping| vec![FieldFailure::new("b", "bad b")]);
        let mediator = builder.build().unwrap();

        let err = mediator
            .send(Ping, &RequestContext::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
        assert_eq!(err.errors.len(), 2);
    }

    #[tokio::test]
    async fn replaced_translator_is_used() {
        let mut builder = MediatorBuilder::new().with_translator(ErrorTranslator::empty());
        builder
            .register_handler::<Lookup, _>(Arc::new(LookupHandler::default()))
            .unwrap();
        let mediator = builder.build().unwrap();

        let err = mediator
            .send(Lookup { code: 0 }, &RequestContext::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalError);
    }

    #[tokio::test]
    async fn default_translator_keeps_not_found() {
        let mut builder = MediatorBuilder::new();
        builder
            .register_handler::<Lookup, _>(Arc::new(LookupHandler::default()))
            .unwrap();
        let mediator = builder.build().unwrap();

        let err = mediator
            .send(Lookup { code: 0 }, &RequestContext::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn provided_cache_is_shared() {
        let cache = ResponseCache::new();
        let handler = Arc::new(LookupHandler::default());
        let mut builder = MediatorBuilder::new().with_cache(cache.clone());
        builder
            .register_handler::<Lookup, _>(handler.clone())
            .unwrap()
            .register_cacheable::<Lookup>(Duration::from_secs(60));
        let mediator = builder.build().unwrap();

        let ctx = RequestContext::anonymous();
        assert_eq!(mediator.send(Lookup { code: 4 }, &ctx).await, Ok(8));
        assert_eq!(mediator.send(Lookup { code: 4 }, &ctx).await, Ok(8));

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
        let key = ResponseCache::key_for(&Lookup { code: 4 }).unwrap();
        assert_eq!(cache.get::<u32>(&key).await, Some(8));
    }
}
