//! Downstream weather forecast providers.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use domain::{DailyForecast, Location, WeatherForecast};
use serde::Deserialize;

use crate::error::DownstreamApiError;

/// Service name reported in downstream failures.
pub const OPEN_WEATHER_MAP: &str = "OpenWeatherMap";

/// Supplies forecasts for a location.
#[async_trait]
pub trait WeatherForecastService: Send + Sync {
    async fn forecast(&self, location: Location) -> Result<WeatherForecast, DownstreamApiError>;
}

/// Client for the OpenWeatherMap one call API.
#[derive(Clone)]
pub struct HttpForecastService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpForecastService {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn failure(status: Option<u16>, message: impl Into<String>) -> DownstreamApiError {
        DownstreamApiError {
            service: OPEN_WEATHER_MAP,
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    lat: f64,
    lon: f64,
    timezone: String,
    #[serde(default)]
    daily: Vec<OneCallDaily>,
}

#[derive(Debug, Deserialize)]
struct OneCallDaily {
    dt: i64,
    temp: OneCallTemp,
    #[serde(default)]
    weather: Vec<OneCallWeather>,
}

#[derive(Debug, Deserialize)]
struct OneCallTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OneCallWeather {
    description: String,
}

impl OneCallResponse {
    fn into_forecast(self) -> WeatherForecast {
        let daily = self
            .daily
            .into_iter()
            .filter_map(|day| {
                let date = DateTime::<Utc>::from_timestamp(day.dt, 0)?.date_naive();
                Some(DailyForecast {
                    date,
                    min_temp_c: day.temp.min,
                    max_temp_c: day.temp.max,
                    summary: day
                        .weather
                        .into_iter()
                        .next()
                        .map(|w| w.description)
                        .unwrap_or_default(),
                })
            })
            .collect();

        WeatherForecast {
            location: Location::new(self.lat, self.lon),
            timezone: self.timezone,
            daily,
        }
    }
}

#[async_trait]
impl WeatherForecastService for HttpForecastService {
    #[tracing::instrument(skip(self))]
    async fn forecast(&self, location: Location) -> Result<WeatherForecast, DownstreamApiError> {
        let url = format!("{}/data/2.5/onecall", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lon.to_string()),
                ("units", "metric".to_string()),
                ("exclude", "current,minutely,hourly,alerts".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| Self::failure(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "forecast request rejected");
            let message = if body.is_empty() {
                format!("Server returned status: {status}")
            } else {
                body
            };
            return Err(Self::failure(Some(status.as_u16()), message));
        }

        let payload: OneCallResponse = response
            .json()
            .await
            .map_err(|e| Self::failure(Some(status.as_u16()), e.to_string()))?;

        Ok(payload.into_forecast())
    }
}

/// Deterministic forecasts for development and tests.
#[derive(Debug)]
pub struct StaticForecastService {
    start: NaiveDate,
    days: u64,
    calls: AtomicUsize,
}

impl StaticForecastService {
    /// Five days of forecasts starting today.
    pub fn new() -> Self {
        Self::starting(Utc::now().date_naive(), 5)
    }

    pub fn starting(start: NaiveDate, days: u64) -> Self {
        Self {
            start,
            days,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of forecasts served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StaticForecastService {
    fn default() -> Self {
        Self::new()
    }
}

const SUMMARIES: [&str; 5] = ["clear sky", "few clouds", "light rain", "overcast clouds", "moderate rain"];

#[async_trait]
impl WeatherForecastService for StaticForecastService {
    async fn forecast(&self, location: Location) -> Result<WeatherForecast, DownstreamApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Warmer towards the equator.
        let base = 30.0 - location.lat.abs() / 3.0;
        let daily = (0..self.days)
            .filter_map(|offset| {
                let date = self.start.checked_add_days(Days::new(offset))?;
                let swing = offset as f64;
                Some(DailyForecast {
                    date,
                    min_temp_c: base - 5.0 + swing,
                    max_temp_c: base + 3.0 + swing,
                    summary: SUMMARIES[offset as usize % SUMMARIES.len()].to_string(),
                })
            })
            .collect();

        Ok(WeatherForecast {
            location,
            timezone: "UTC".to_string(),
            daily,
        })
    }
}
