//! End-to-end scenarios through the mediator with in-memory collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use application::todo::{
    self, CreateTodoItem, CreateTodoList, DeleteTodoItem, GetTodoItemsInList, GetTodoLists,
    MarkTodoItemDone, UpdateTodoItem,
};
use application::weather::{self, GetWeatherForecast, StaticForecastService, WeatherForecastService};
use application::{
    BoxError, DownstreamApiError, ErrorKind, Handler, Mediator, MediatorBuilder, Principal, Request,
    RequestContext, permissions,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{TodoItemId, TodoListId};
use domain::{Location, PriorityLevel, TodoEvent, WeatherForecast};
use persistence::{EventPublisher, EventSubscriber, InMemoryTodoStore, SubscriberError, SystemClock, UnitOfWork};
use tokio_util::sync::CancellationToken;

const FORECAST_TTL: Duration = Duration::from_secs(60);

#[derive(Default)]
struct CountCompleted {
    count: AtomicUsize,
}

#[async_trait]
impl EventSubscriber<TodoEvent> for CountCompleted {
    fn name(&self) -> &'static str {
        "CountCompleted"
    }

    async fn handle(&self, _event: &TodoEvent) -> Result<(), SubscriberError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
struct Explode {
    panic: bool,
}

impl Request for Explode {
    type Response = ();
    const NAME: &'static str = "Explode";
}

struct ExplodeHandler;

#[async_trait]
impl Handler<Explode> for ExplodeHandler {
    async fn handle(&self, request: &Explode, _ctx: &RequestContext) -> Result<(), BoxError> {
        if request.panic {
            panic!("handler blew up");
        }
        Err("database password is hunter2".into())
    }
}

#[derive(Debug)]
struct Slow;

impl Request for Slow {
    type Response = ();
    const NAME: &'static str = "Slow";
}

struct SlowHandler;

#[async_trait]
impl Handler<Slow> for SlowHandler {
    async fn handle(&self, _request: &Slow, _ctx: &RequestContext) -> Result<(), BoxError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

struct FailingForecasts;

#[async_trait]
impl WeatherForecastService for FailingForecasts {
    async fn forecast(&self, _location: Location) -> Result<WeatherForecast, DownstreamApiError> {
        Err(DownstreamApiError {
            service: weather::OPEN_WEATHER_MAP,
            status: Some(401),
            message: "Invalid API key".to_string(),
        })
    }
}

struct Harness {
    mediator: Mediator,
    store: InMemoryTodoStore,
    forecasts: Arc<StaticForecastService>,
    completed: Arc<CountCompleted>,
}

fn harness_with(forecasts: Arc<dyn WeatherForecastService>) -> (Mediator, InMemoryTodoStore, Arc<CountCompleted>) {
    let store = InMemoryTodoStore::new();
    let completed = Arc::new(CountCompleted::default());

    let mut publisher = EventPublisher::new();
    todo::subscribe(&mut publisher);
    publisher.subscribe(TodoEvent::ITEM_COMPLETED, completed.clone());

    let uow = Arc::new(UnitOfWork::new(
        Arc::new(store.clone()),
        Arc::new(publisher),
        Arc::new(SystemClock),
    ));

    let mut builder = MediatorBuilder::new();
    todo::register(&mut builder, uow).unwrap();
    weather::register(&mut builder, forecasts, FORECAST_TTL).unwrap();
    builder.register_handler::<Explode, _>(ExplodeHandler).unwrap();
    builder.register_handler::<Slow, _>(SlowHandler).unwrap();

    (builder.build().unwrap(), store, completed)
}

fn harness() -> Harness {
    let forecasts = Arc::new(StaticForecastService::new());
    let (mediator, store, completed) = harness_with(forecasts.clone());
    Harness {
        mediator,
        store,
        forecasts,
        completed,
    }
}

fn writer() -> RequestContext {
    RequestContext::for_principal(
        Principal::new("alice")
            .with_permission(permissions::WRITE_TODO)
            .with_permission(permissions::DELETE_TODO),
    )
}

async fn create_list(mediator: &Mediator, title: &str) -> TodoListId {
    mediator
        .send(
            CreateTodoList {
                title: title.to_string(),
                colour: None,
            },
            &writer(),
        )
        .await
        .unwrap()
}

async fn create_item(mediator: &Mediator, list_id: TodoListId, title: &str) -> TodoItemId {
    mediator
        .send(
            CreateTodoItem {
                list_id,
                title: title.to_string(),
            },
            &writer(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn request_without_validators_is_not_rejected() {
    let h = harness();

    let lists = h
        .mediator
        .send(GetTodoLists, &RequestContext::anonymous())
        .await
        .unwrap();

    assert!(lists.is_empty());
}

#[tokio::test]
async fn create_item_without_write_permission_is_unauthorized() {
    let h = harness();
    let list_id = create_list(&h.mediator, "Groceries").await;
    let reader = RequestContext::for_principal(Principal::new("bob"));

    let err = h
        .mediator
        .send(
            CreateTodoItem {
                list_id,
                title: "Foo".to_string(),
            },
            &reader,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unauthorized);
    assert_eq!(h.store.item_count().await, 0);
}

#[tokio::test]
async fn anonymous_caller_cannot_create_lists() {
    let h = harness();

    let err = h
        .mediator
        .send(
            CreateTodoList {
                title: "Secret".to_string(),
                colour: None,
            },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unauthorized);
    assert_eq!(h.store.list_count().await, 0);
}

#[tokio::test]
async fn validation_failures_are_aggregated() {
    let h = harness();

    let err = h
        .mediator
        .send(
            CreateTodoList {
                title: String::new(),
                colour: Some("#000000".to_string()),
            },
            &writer(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationFailed);
    let fields: Vec<_> = err.errors.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["title", "colour"]);
}

#[tokio::test]
async fn authorization_runs_before_validation() {
    let h = harness();

    let err = h
        .mediator
        .send(
            CreateTodoList {
                title: String::new(),
                colour: None,
            },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn duplicate_list_title_is_conflict_on_title() {
    let h = harness();
    create_list(&h.mediator, "Work").await;

    let err = h
        .mediator
        .send(
            CreateTodoList {
                title: "Work".to_string(),
                colour: None,
            },
            &writer(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.errors[0].field, "title");
    assert_eq!(
        err.message,
        "Duplicate entry. An item already exists that has a 'title' with the value of: 'Work'."
    );
    assert_eq!(h.store.list_count().await, 1);
}

#[tokio::test]
async fn creating_an_item_on_a_missing_list_is_not_found() {
    let h = harness();
    let list_id = TodoListId::new();

    let err = h
        .mediator
        .send(
            CreateTodoItem {
                list_id,
                title: "Orphan".to_string(),
            },
            &writer(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, format!("TodoList ({list_id}) was not found."));
}

#[tokio::test]
async fn marking_done_publishes_one_completion() {
    let h = harness();
    let list_id = create_list(&h.mediator, "Chores").await;
    let item_id = create_item(&h.mediator, list_id, "Dishes").await;

    let item = h
        .mediator
        .send(MarkTodoItemDone { list_id, item_id }, &writer())
        .await
        .unwrap();
    assert!(item.done);
    assert_eq!(h.completed.count.load(Ordering::SeqCst), 1);

    h.mediator
        .send(MarkTodoItemDone { list_id, item_id }, &writer())
        .await
        .unwrap();
    assert_eq!(h.completed.count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn update_and_delete_items() {
    let h = harness();
    let list_id = create_list(&h.mediator, "Garden").await;
    let item_id = create_item(&h.mediator, list_id, "Mow").await;
    let reminder = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();

    let updated = h
        .mediator
        .send(
            UpdateTodoItem {
                list_id,
                item_id,
                title: "Mow the lawn".to_string(),
                note: Some("before noon".to_string()),
                priority: Some("high".to_string()),
                reminder: Some(reminder),
            },
            &writer(),
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Mow the lawn");
    assert_eq!(updated.priority, Some(PriorityLevel::High));
    assert_eq!(updated.reminder, Some(reminder));

    let stored = h
        .mediator
        .send(GetTodoItemsInList { list_id }, &RequestContext::anonymous())
        .await
        .unwrap();
    assert_eq!(stored[0].reminder, Some(reminder));

    h.mediator
        .send(DeleteTodoItem { list_id, item_id }, &writer())
        .await
        .unwrap();

    let items = h
        .mediator
        .send(GetTodoItemsInList { list_id }, &RequestContext::anonymous())
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn item_of_another_list_is_not_found() {
    let h = harness();
    let home = create_list(&h.mediator, "Home").await;
    let work = create_list(&h.mediator, "Work").await;
    let item_id = create_item(&h.mediator, home, "Vacuum").await;

    let err = h
        .mediator
        .send(MarkTodoItemDone { list_id: work, item_id }, &writer())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, format!("TodoItem ({item_id}) was not found."));
}

#[tokio::test]
async fn delete_requires_delete_permission() {
    let h = harness();
    let list_id = create_list(&h.mediator, "Errands").await;
    let item_id = create_item(&h.mediator, list_id, "Post office").await;
    let writer_only =
        RequestContext::for_principal(Principal::new("carol").with_permission(permissions::WRITE_TODO));

    let err = h
        .mediator
        .send(DeleteTodoItem { list_id, item_id }, &writer_only)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unauthorized);
    assert_eq!(h.store.item_count().await, 1);
}

#[tokio::test]
async fn forecast_is_cached_per_location() {
    let h = harness();
    let request = GetWeatherForecast {
        lat: 11.96,
        lon: 108.4,
    };

    let first = h
        .mediator
        .send(request.clone(), &RequestContext::anonymous())
        .await
        .unwrap();
    assert_eq!(h.forecasts.calls(), 1);
    assert_eq!(h.mediator.cache().len().await, 1);

    let second = h
        .mediator
        .send(request, &RequestContext::anonymous())
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(h.forecasts.calls(), 1);

    h.mediator
        .send(
            GetWeatherForecast { lat: 10.0, lon: 108.4 },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap();
    assert_eq!(h.forecasts.calls(), 2);
}

#[tokio::test]
async fn signed_zero_coordinates_share_one_cache_entry() {
    let h = harness();
    let positive = GetWeatherForecast { lat: 0.0, lon: 108.4 };
    let negative = GetWeatherForecast { lat: -0.0, lon: 108.4 };
    assert_eq!(positive, negative);

    let first = h
        .mediator
        .send(positive, &RequestContext::anonymous())
        .await
        .unwrap();
    let second = h
        .mediator
        .send(negative, &RequestContext::anonymous())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(h.forecasts.calls(), 1);
    assert_eq!(h.mediator.cache().len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_forecasts_leave_one_live_entry() {
    let h = harness();
    let request = GetWeatherForecast {
        lat: 11.96,
        lon: 108.4,
    };
    let ctx = RequestContext::anonymous();

    let (a, b, c, d) = tokio::join!(
        h.mediator.send(request.clone(), &ctx),
        h.mediator.send(request.clone(), &ctx),
        h.mediator.send(request.clone(), &ctx),
        h.mediator.send(request.clone(), &ctx),
    );
    let first = a.unwrap();
    assert_eq!(b.unwrap(), first);
    assert_eq!(c.unwrap(), first);
    assert_eq!(d.unwrap(), first);

    assert_eq!(h.mediator.cache().len().await, 1);
    let calls = h.forecasts.calls();
    assert!((1..=4).contains(&calls));

    let cached = h.mediator.send(request, &ctx).await.unwrap();
    assert_eq!(cached, first);
    assert_eq!(h.forecasts.calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn forecast_is_fetched_again_after_ttl() {
    let h = harness();
    let request = GetWeatherForecast {
        lat: 11.96,
        lon: 108.4,
    };

    h.mediator
        .send(request.clone(), &RequestContext::anonymous())
        .await
        .unwrap();

    tokio::time::advance(FORECAST_TTL + Duration::from_secs(1)).await;

    h.mediator
        .send(request, &RequestContext::anonymous())
        .await
        .unwrap();
    assert_eq!(h.forecasts.calls(), 2);
    assert_eq!(h.mediator.cache().len().await, 1);
}

#[tokio::test]
async fn invalid_coordinates_never_reach_the_service() {
    let h = harness();

    let err = h
        .mediator
        .send(
            GetWeatherForecast { lat: 91.0, lon: 0.0 },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationFailed);
    assert_eq!(h.forecasts.calls(), 0);
    assert!(h.mediator.cache().is_empty().await);
}

#[tokio::test]
async fn downstream_failure_is_validation_on_service() {
    let (mediator, _, _) = harness_with(Arc::new(FailingForecasts));

    let err = mediator
        .send(
            GetWeatherForecast { lat: 1.0, lon: 1.0 },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationFailed);
    assert_eq!(err.errors[0].field, "OpenWeatherMap");
    assert!(mediator.cache().is_empty().await);
}

#[tokio::test]
async fn handler_error_is_generic_internal_error() {
    let h = harness();

    let err = h
        .mediator
        .send(Explode { panic: false }, &RequestContext::anonymous())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InternalError);
    assert!(!err.message.contains("hunter2"));
}

#[tokio::test]
async fn handler_panic_is_internal_error() {
    let h = harness();

    let err = h
        .mediator
        .send(Explode { panic: true }, &RequestContext::anonymous())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InternalError);
}

#[tokio::test(start_paused = true)]
async fn cancelled_request_returns_cancelled() {
    let h = harness();
    let token = CancellationToken::new();
    let ctx = RequestContext::anonymous().with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    let err = h.mediator.send(Slow, &ctx).await.unwrap_err();
    canceller.await.unwrap();

    assert_eq!(err.kind, ErrorKind::Cancelled);
}
