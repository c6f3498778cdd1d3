use serde::{Deserialize, Serialize};

use super::{merge::Catalog, model::FoodRecord, normalize::ALL_CATEGORY, source::SourceOrigin};

/// A catalog food plus its derived flags.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodView {
    #[serde(flatten)]
    pub food: FoodRecord,
    pub has_serving: bool,
}

impl From<&FoodRecord> for FoodView {
    fn from(food: &FoodRecord) -> Self {
        Self {
            has_serving: food.has_serving(),
            food: food.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FoodQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

impl FoodQuery {
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(ALL_CATEGORY)
    }

    pub fn text(&self) -> &str {
        self.q.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogSummary {
    pub origin: Option<SourceOrigin>,
    pub total: usize,
    pub categories: Vec<String>,
}

impl From<&Catalog> for CatalogSummary {
    fn from(catalog: &Catalog) -> Self {
        Self {
            origin: catalog.origin(),
            total: catalog.len(),
            categories: catalog.categories().to_vec(),
        }
    }
}
