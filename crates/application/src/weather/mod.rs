//! Weather forecasts fetched from a downstream API and cached per location.

mod service;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{Location, WeatherForecast};
use serde::{Deserialize, Serialize};

pub use service::{
    HttpForecastService, OPEN_WEATHER_MAP, StaticForecastService, WeatherForecastService,
};

use crate::error::{BoxError, FieldFailure, MediatorError};
use crate::mediator::MediatorBuilder;
use crate::request::{Handler, Request, RequestContext};
use crate::validation::{Validator, inclusive_between};

/// Default lifetime of a cached forecast.
pub const DEFAULT_FORECAST_TTL: Duration = Duration::from_secs(60);

/// Forecast for a location. Responses are cached per coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetWeatherForecast {
    pub lat: f64,
    pub lon: f64,
}

impl Request for GetWeatherForecast {
    type Response = WeatherForecast;
    const NAME: &'static str = "GetWeatherForecast";
}

pub struct GetWeatherForecastValidator;

impl Validator<GetWeatherForecast> for GetWeatherForecastValidator {
    fn validate(&self, request: &GetWeatherForecast) -> Vec<FieldFailure> {
        let mut failures = Vec::new();
        inclusive_between(&mut failures, "lat", request.lat, -90.0, 90.0);
        inclusive_between(&mut failures, "lon", request.lon, -180.0, 180.0);
        failures
    }
}

pub struct GetWeatherForecastHandler {
    service: Arc<dyn WeatherForecastService>,
}

impl GetWeatherForecastHandler {
    pub fn new(service: Arc<dyn WeatherForecastService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Handler<GetWeatherForecast> for GetWeatherForecastHandler {
    async fn handle(
        &self,
        request: &GetWeatherForecast,
        _ctx: &RequestContext,
    ) -> Result<WeatherForecast, BoxError> {
        let forecast = self
            .service
            .forecast(Location::new(request.lat, request.lon))
            .await?;
        Ok(forecast)
    }
}

/// Registers the forecast handler, its validator, and its cache lifetime.
pub fn register(
    builder: &mut MediatorBuilder,
    service: Arc<dyn WeatherForecastService>,
    ttl: Duration,
) -> Result<(), MediatorError> {
    builder
        .register_handler::<GetWeatherForecast, _>(GetWeatherForecastHandler::new(service))?
        .register_validator::<GetWeatherForecast, _>(GetWeatherForecastValidator)
        .register_cacheable::<GetWeatherForecast>(ttl);
    Ok(())
}
