//! Wires stores, publishers, and features into a mediator.

use std::sync::Arc;
use std::time::Duration;

use domain::TodoEvent;
use persistence::{Clock, EventPublisher, InMemoryTodoStore, SystemClock, TodoStore, UnitOfWork};

use crate::error::MediatorError;
use crate::mediator::{Mediator, MediatorBuilder};
use crate::todo;
use crate::weather::{self, DEFAULT_FORECAST_TTL, StaticForecastService, WeatherForecastService};

/// Collaborators the features are built on.
pub struct Services {
    pub store: Arc<dyn TodoStore>,
    pub forecasts: Arc<dyn WeatherForecastService>,
    pub clock: Arc<dyn Clock>,
    pub forecast_ttl: Duration,
}

impl Services {
    /// In-memory store and static forecasts.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemoryTodoStore::new()),
            forecasts: Arc::new(StaticForecastService::new()),
            clock: Arc::new(SystemClock),
            forecast_ttl: DEFAULT_FORECAST_TTL,
        }
    }
}

/// Builds the mediator with every feature registered.
pub fn compose(services: Services) -> Result<Mediator, MediatorError> {
    let mut publisher = EventPublisher::<TodoEvent>::new();
    todo::subscribe(&mut publisher);

    let uow = Arc::new(UnitOfWork::new(
        services.store,
        Arc::new(publisher),
        services.clock,
    ));

    let mut builder = MediatorBuilder::new();
    todo::register(&mut builder, uow)?;
    weather::register(&mut builder, services.forecasts, services.forecast_ttl)?;
    builder.build()
}
