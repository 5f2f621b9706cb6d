//! Statistics API endpoints
//!
//! - GET /api/statistics - Home page counters (public)
//! - PUT /api/statistics - Partial update (token)

use axum::{extract::State, Json};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::api::responses::StatisticsMessageResponse;
use crate::models::{Statistics, UpdateStatisticsInput};

/// GET /api/statistics
///
/// Creates the record with defaults on first read.
pub async fn get_statistics(State(state): State<AppState>) -> Result<Json<Statistics>, ApiError> {
    Ok(Json(state.statistics_service.get().await?))
}

/// PUT /api/statistics
pub async fn update_statistics(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UpdateStatisticsInput>,
) -> Result<Json<StatisticsMessageResponse>, ApiError> {
    let statistics = state.statistics_service.update(&input).await?;
    Ok(Json(StatisticsMessageResponse {
        message: "הסטטיסטיקות עודכנו בהצלחה",
        statistics,
    }))
}
