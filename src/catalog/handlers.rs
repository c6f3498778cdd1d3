use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{error::CatalogError, state::AppState};

use super::dto::{CatalogSummary, FoodQuery, FoodView};

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods))
        .route("/foods/:id", get(get_food))
        .route("/categories", get(list_categories))
}

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/catalog/refresh", post(refresh_catalog))
        .route("/catalog/reload", post(reload_catalog))
}

/// GET /foods?category=Snacks&q=sam
#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<FoodQuery>,
) -> Json<Vec<FoodView>> {
    let catalog = state.catalog.snapshot().await;
    let foods = catalog
        .query(query.category(), query.text())
        .into_iter()
        .map(FoodView::from)
        .collect();
    Json(foods)
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FoodView>, (StatusCode, String)> {
    let catalog = state.catalog.snapshot().await;
    let food = catalog
        .lookup_by_id(&id)
        .ok_or_else(|| CatalogError::NotFound(format!("food `{}`", id)))?;
    Ok(Json(FoodView::from(food)))
}

#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.snapshot().await.categories().to_vec())
}

/// Re-reads the dataset from its sources, skipping the cache.
#[instrument(skip(state))]
pub async fn refresh_catalog(
    State(state): State<AppState>,
) -> Result<Json<CatalogSummary>, (StatusCode, String)> {
    let catalog = state.catalog.refresh().await?;
    Ok(Json(CatalogSummary::from(catalog.as_ref())))
}

#[instrument(skip(state))]
pub async fn reload_catalog(State(state): State<AppState>) -> Json<CatalogSummary> {
    let catalog = state.catalog.reload().await;
    Json(CatalogSummary::from(catalog.as_ref()))
}

#[cfg(test)]
mod catalog_handler_tests {
    use super::*;
    use crate::catalog::source::SourceOrigin;

    #[tokio::test]
    async fn reload_then_query() {
        let state = AppState::fake();
        let Json(summary) = reload_catalog(State(state.clone())).await;
        assert_eq!(summary.origin, Some(SourceOrigin::StaticSample));
        assert_eq!(summary.total, 10);

        let query = FoodQuery {
            category: Some("Beverages".into()),
            q: Some("chai".into()),
        };
        let Json(foods) = list_foods(State(state.clone()), Query(query)).await;
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].food.name, "Masala Chai");
        assert!(foods[0].has_serving);

        let Json(categories) = list_categories(State(state)).await;
        assert_eq!(categories[..2], ["All".to_string(), "Custom".to_string()]);
    }

    #[tokio::test]
    async fn unknown_food_is_404() {
        let state = AppState::fake();
        state.catalog.reload().await;
        let (status, _) = get_food(State(state), Path("404".into())).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refresh_reports_summary() {
        let state = AppState::fake();
        let Json(summary) = refresh_catalog(State(state)).await.unwrap();
        assert_eq!(summary.total, 10);
        assert!(summary.categories.contains(&"Snacks".to_string()));
    }
}
