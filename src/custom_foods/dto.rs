use serde::{Deserialize, Serialize};

use crate::catalog::{
    import::ImportLayout,
    model::{lenient, FoodRecord},
};

/// Body of POST /custom-foods. Category is always `Custom`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomFood {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default)]
    pub serving: Option<String>,
    #[serde(default, alias = "servingSize")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub carbohydrates: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fats: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fiber: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sugar: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DeleteOptions {
    #[serde(default, rename = "alsoRemoveFromDiary")]
    pub also_remove_from_diary: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub removed: FoodRecord,
    pub diary_entries_removed: usize,
}

/// `?layout=spreadsheet|dishes`; detected from the header when absent.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ImportOptions {
    #[serde(default)]
    pub layout: Option<ImportLayout>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub imported: usize,
    pub catalog_size: usize,
}
