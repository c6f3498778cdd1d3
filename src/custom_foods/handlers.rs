use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{catalog::model::FoodRecord, state::AppState};

use super::dto::{DeleteOptions, ImportOptions, ImportResponse, NewCustomFood};

pub fn read_router() -> Router<AppState> {
    Router::new().route("/custom-foods", get(list_custom_foods))
}

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/custom-foods", post(add_custom_food))
        .route("/custom-foods/:id", delete(delete_custom_food))
        .route(
            "/custom-foods/import",
            post(import_custom_foods).layer(DefaultBodyLimit::max(5 * 1024 * 1024)), // 5MB
        )
}

#[instrument(skip(state))]
pub async fn list_custom_foods(
    State(state): State<AppState>,
) -> Result<Json<Vec<FoodRecord>>, (StatusCode, String)> {
    Ok(Json(state.catalog.custom_foods().list().await?))
}

#[instrument(skip(state))]
pub async fn add_custom_food(
    State(state): State<AppState>,
    Json(body): Json<NewCustomFood>,
) -> Result<(StatusCode, Json<FoodRecord>), (StatusCode, String)> {
    let food = state.catalog.add_custom_food(body).await?;
    Ok((StatusCode::CREATED, Json(food)))
}

/// DELETE /custom-foods/:id?alsoRemoveFromDiary=true
#[instrument(skip(state))]
pub async fn delete_custom_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(opts): Query<DeleteOptions>,
) -> Result<StatusCode, (StatusCode, String)> {
    let outcome = state.catalog.delete_custom_food(&id, opts).await?;
    info!(%id, diary_entries_removed = outcome.diary_entries_removed, "delete handled");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /custom-foods/import?layout= with the CSV text as the body.
#[instrument(skip(state, body))]
pub async fn import_custom_foods(
    State(state): State<AppState>,
    Query(opts): Query<ImportOptions>,
    body: String,
) -> Result<Json<ImportResponse>, (StatusCode, String)> {
    let imported = state.catalog.import_custom_foods(&body, opts.layout).await?;
    let catalog_size = state.catalog.snapshot().await.len();
    Ok(Json(ImportResponse {
        imported,
        catalog_size,
    }))
}
