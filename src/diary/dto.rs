use serde::Deserialize;
use time::{macros::format_description, Date};

use crate::error::CatalogError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFoodRequest {
    pub food_id: String,
    #[serde(default = "default_servings")]
    pub servings: f64,
}
fn default_servings() -> f64 { 1.0 }

/// Parses a `YYYY-MM-DD` path segment.
pub fn parse_date(raw: &str) -> Result<Date, CatalogError> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| CatalogError::Validation(format!("`{}` is not a YYYY-MM-DD date", raw)))
}
