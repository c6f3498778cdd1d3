use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{error::CatalogError, state::AppState};

use super::dto::{parse_date, LogFoodRequest};
use super::repo_types::{DiaryEntry, NutritionTotals};

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/diary/:date", get(list_entries))
        .route("/diary/:date/summary", get(day_summary))
}

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/diary", post(log_food))
        .route("/diary/:date/:id", delete(delete_entry))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<DiaryEntry>>, (StatusCode, String)> {
    let date = parse_date(&date)?;
    Ok(Json(state.diary.entries(date).await?))
}

#[instrument(skip(state))]
pub async fn day_summary(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<NutritionTotals>, (StatusCode, String)> {
    let date = parse_date(&date)?;
    Ok(Json(state.diary.summary(date).await?))
}

/// POST /diary { foodId, servings? }: logs a catalog food for today.
#[instrument(skip(state))]
pub async fn log_food(
    State(state): State<AppState>,
    Json(body): Json<LogFoodRequest>,
) -> Result<(StatusCode, Json<DiaryEntry>), (StatusCode, String)> {
    let catalog = state.catalog.snapshot().await;
    let food = catalog
        .lookup_by_id(&body.food_id)
        .ok_or_else(|| CatalogError::NotFound(format!("food `{}`", body.food_id)))?;

    let entry = state
        .diary
        .log(food, body.servings, OffsetDateTime::now_utc())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path((date, id)): Path<(String, String)>,
) -> Result<StatusCode, (StatusCode, String)> {
    let date = parse_date(&date)?;
    state.diary.delete_entry(date, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
