//! HTTP API server for the Exemplum todo and weather features.
//!
//! Every route extracts the caller's request context from the bearer token
//! and hands a request to the [`Mediator`]; error envelopes are
//! mapped to HTTP statuses by [`error::ApiError`].

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use application::weather::{HttpForecastService, StaticForecastService, WeatherForecastService};
use application::{Mediator, Services};
use axum::Router;
use axum::routing::{get, put};
use persistence::{InMemoryTodoStore, PersistenceError, PostgresTodoStore, SystemClock, TodoStore};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::{AuthError, Authenticator};
use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub mediator: Arc<Mediator>,

    /// Verifies bearer tokens; tokens are rejected when unset.
    pub authenticator: Option<Authenticator>,

    /// Cancelled when the server shuts down; every request gets a child.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(mediator: Mediator) -> Self {
        Self {
            mediator: Arc::new(mediator),
            authenticator: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = Some(authenticator);
        self
    }
}

/// Failure while assembling the application at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to run migrations: {0}")]
    Migration(#[from] PersistenceError),

    #[error("failed to compose mediator: {0}")]
    Mediator(#[from] application::MediatorError),

    #[error("invalid authentication settings: {0}")]
    Auth(#[from] AuthError),
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/todolists",
            get(routes::todo::list).post(routes::todo::create),
        )
        .route(
            "/todolists/{list_id}/todoitems",
            get(routes::todo::items).post(routes::todo::create_item),
        )
        .route(
            "/todolists/{list_id}/todoitems/{item_id}",
            put(routes::todo::update_item).delete(routes::todo::delete_item),
        )
        .route(
            "/todolists/{list_id}/todoitems/{item_id}/markdone",
            put(routes::todo::mark_done),
        )
        .route("/weatherforecast", get(routes::weather::forecast))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the collaborators selected by the configuration.
///
/// Uses PostgreSQL when `database_url` is set (running pending migrations)
/// and the HTTP forecast client when an API key is set.
pub async fn build_services(config: &Config) -> Result<Services, StartupError> {
    let store: Arc<dyn TodoStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let store = PostgresTodoStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL todo store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory todo store");
            Arc::new(InMemoryTodoStore::new())
        }
    };

    let forecasts: Arc<dyn WeatherForecastService> = match &config.weather_api_key {
        Some(key) => Arc::new(HttpForecastService::new(
            config.weather_api_base_url.clone(),
            key.clone(),
        )),
        None => {
            tracing::warn!("WEATHER_API_KEY not set, serving static forecasts");
            Arc::new(StaticForecastService::new())
        }
    };

    Ok(Services {
        store,
        forecasts,
        clock: Arc::new(SystemClock),
        forecast_ttl: config.forecast_cache_ttl,
    })
}

/// Builds the application state from the configuration.
pub async fn create_state(config: &Config) -> Result<Arc<AppState>, StartupError> {
    let services = build_services(config).await?;
    let mediator = application::compose(services)?;
    let state = AppState::new(mediator);

    match Authenticator::from_settings(&config.auth)? {
        Some(authenticator) => Ok(Arc::new(state.with_authenticator(authenticator))),
        None => {
            tracing::warn!("no token verification key configured, all callers are anonymous");
            Ok(Arc::new(state))
        }
    }
}
