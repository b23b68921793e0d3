//! Weather forecast endpoint.

use std::sync::Arc;

use application::weather::GetWeatherForecast;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use domain::WeatherForecast;
use serde::Deserialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ForecastQuery {
    pub lat: f64,
    pub lon: f64,
}

/// GET /weatherforecast?lat=&lon=
#[tracing::instrument(skip_all)]
pub async fn forecast(
    State(state): State<Arc<AppState>>,
    CurrentUser(ctx): CurrentUser,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<WeatherForecast>, ApiError> {
    let Query(ForecastQuery { lat, lon }) = query?;
    let forecast = state
        .mediator
        .send(GetWeatherForecast { lat, lon }, &ctx)
        .await?;
    Ok(Json(forecast))
}
