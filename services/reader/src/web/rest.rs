//! services/reader/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shelfside_core::domain::{ReadingStats, YearSummary};
use shelfside_core::progress::ProgressAggregator;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(user_stats_handler, user_year_handler),
    components(schemas(ReadingStatsResponse, YearSummaryResponse)),
    tags(
        (name = "Reader API", description = "Reading-progress statistics for the in-browser reader.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The client's UTC offset, so calendar days match the reader's clock.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TzQuery {
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

/// Aggregated statistics for the stats and achievements views.
#[derive(Serialize, ToSchema)]
pub struct ReadingStatsResponse {
    minutes_today: i64,
    pages_today: i64,
    minutes_last_7_days: i64,
    pages_last_7_days: i64,
    current_streak_days: u32,
    longest_streak_days: u32,
    weekly_goal_percent: u8,
}

impl From<ReadingStats> for ReadingStatsResponse {
    fn from(stats: ReadingStats) -> Self {
        Self {
            minutes_today: stats.minutes_today,
            pages_today: stats.pages_today,
            minutes_last_7_days: stats.minutes_last_7_days,
            pages_last_7_days: stats.pages_last_7_days,
            current_streak_days: stats.current_streak_days,
            longest_streak_days: stats.longest_streak_days,
            weekly_goal_percent: stats.weekly_goal_percent,
        }
    }
}

/// Totals for one calendar year of reading activity.
#[derive(Serialize, ToSchema)]
pub struct YearSummaryResponse {
    year: i32,
    total_minutes: i64,
    total_pages: i64,
    active_days: u32,
    avg_minutes_per_day: f64,
}

impl From<YearSummary> for YearSummaryResponse {
    fn from(summary: YearSummary) -> Self {
        Self {
            year: summary.year,
            total_minutes: summary.total_minutes,
            total_pages: summary.total_pages,
            active_days: summary.active_days,
            avg_minutes_per_day: summary.avg_minutes_per_day,
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Aggregated reading statistics for one user.
#[utoipa::path(
    get,
    path = "/users/{user_id}/stats",
    params(
        ("user_id" = Uuid, Path, description = "The unique ID of the user."),
        TzQuery
    ),
    responses(
        (status = 200, description = "Aggregated statistics", body = ReadingStatsResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn user_stats_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(tz): Query<TzQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = app_state
        .store
        .sessions_for_user(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load sessions for {}: {:?}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load reading history".to_string(),
            )
        })?;

    let aggregator = ProgressAggregator::from_offset_minutes(tz.tz_offset_minutes);
    let stats = aggregator.stats(&sessions, Utc::now());
    Ok(Json(ReadingStatsResponse::from(stats)))
}

/// Reading totals for one calendar year.
#[utoipa::path(
    get,
    path = "/users/{user_id}/years/{year}",
    params(
        ("user_id" = Uuid, Path, description = "The unique ID of the user."),
        ("year" = i32, Path, description = "The calendar year to summarize."),
        TzQuery
    ),
    responses(
        (status = 200, description = "Year summary", body = YearSummaryResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn user_year_handler(
    State(app_state): State<Arc<AppState>>,
    Path((user_id, year)): Path<(Uuid, i32)>,
    Query(tz): Query<TzQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = app_state
        .store
        .sessions_for_user(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load sessions for {}: {:?}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load reading history".to_string(),
            )
        })?;

    let aggregator = ProgressAggregator::from_offset_minutes(tz.tz_offset_minutes);
    let summary = aggregator.year_summary(&sessions, year, Utc::now());
    Ok(Json(YearSummaryResponse::from(summary)))
}
