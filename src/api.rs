use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::constants::{CONUS_BBOX, DEFAULT_DAYS_PARAM};
use crate::error::ApiError;
use crate::geojson::FeatureCollection;
use crate::risk::grid_to_features;
use crate::types::AppState;
use crate::utils::resolve_valid_time;

// The alias paths share the primary handler and do not imply a day count;
// clients select the horizon with `?days=` on any of them.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/weatherData", get(weather_data))
        .route("/api/weatherData/1day", get(weather_data))
        .route("/api/weatherData/3day", get(weather_data))
        .route("/api/weatherData/7day", get(weather_data))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn weather_data(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let days = query.as_deref().and_then(|query| first_query_value(query, "days"));
    match build_risk_collection(&state, days.as_deref(), Utc::now()).await {
        Ok(collection) => Json(collection).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Repeated keys resolve to the first occurrence.
fn first_query_value(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

/// Integer literal with optional sign; single underscores may group digits.
pub(crate) fn parse_days(raw: Option<&str>) -> Result<i32, ApiError> {
    let trimmed = raw.unwrap_or(DEFAULT_DAYS_PARAM).trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if unsigned.split('_').any(str::is_empty) {
        return Err(ApiError::InvalidDays);
    }
    trimmed
        .replace('_', "")
        .parse::<i32>()
        .map_err(|_| ApiError::InvalidDays)
}

pub(crate) async fn build_risk_collection(
    state: &AppState,
    raw_days: Option<&str>,
    now: DateTime<Utc>,
) -> Result<FeatureCollection, ApiError> {
    let days = parse_days(raw_days)?;
    let valid_time = resolve_valid_time(now, days);
    info!("Fetching risk grids for days={days} valid_time={valid_time}");

    let grids = state.provider.fetch(&CONUS_BBOX, valid_time).await?;
    let collection = grid_to_features(&grids, &CONUS_BBOX);
    let (rows, cols) = grids.shape();
    info!(
        "Classified {rows}x{cols} grid into {} risk points",
        collection.features.len()
    );
    Ok(collection)
}
