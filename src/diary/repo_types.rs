use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::model::{lenient, FoodRecord};

/// A logged food, scaled by the number of servings eaten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredEntry")]
pub struct DiaryEntry {
    pub id: String,
    pub food_id: String,
    pub name: String,
    pub category: String,
    pub serving: String,
    /// Quantity text of the logged food, e.g. `"1 cup"`.
    pub portion: String,
    /// Serving multiplier.
    pub quantity: f64,
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fats: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub is_custom: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entries written by the barcode and detail screens spread the whole food
/// into the entry, so `carbs`/`fat`/`servingSize` show up here as well.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    #[serde(default, deserialize_with = "lenient::text")]
    id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    food_id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    category: String,
    #[serde(default, deserialize_with = "lenient::text")]
    serving: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    portion: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    serving_size: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    calories: f64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    carbohydrates: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    protein: f64,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    fats: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    fiber: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    sugar: f64,
    #[serde(default)]
    is_custom: bool,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<StoredEntry> for DiaryEntry {
    fn from(raw: StoredEntry) -> Self {
        Self {
            id: raw.id,
            food_id: raw.food_id,
            name: raw.name,
            category: raw.category,
            serving: raw.serving,
            portion: raw.portion.or(raw.serving_size).unwrap_or_default(),
            quantity: raw.quantity.unwrap_or(1.0),
            calories: raw.calories,
            carbohydrates: lenient::prefer(raw.carbohydrates, raw.carbs),
            protein: raw.protein,
            fats: lenient::prefer(raw.fats, raw.fat),
            fiber: raw.fiber,
            sugar: raw.sugar,
            is_custom: raw.is_custom,
            timestamp: raw.timestamp,
            extra: raw.extra,
        }
    }
}

impl DiaryEntry {
    pub fn scaled(food: &FoodRecord, servings: f64, at: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            food_id: food.id.clone(),
            name: food.name.clone(),
            category: food.category.clone(),
            serving: food.serving.clone(),
            portion: food.quantity.clone(),
            quantity: servings,
            calories: scale(food.calories, servings),
            carbohydrates: scale(food.carbohydrates, servings),
            protein: scale(food.protein, servings),
            fats: scale(food.fats, servings),
            fiber: scale(food.fiber, servings),
            sugar: scale(food.sugar, servings),
            is_custom: food.is_custom,
            timestamp: at,
            extra: Map::new(),
        }
    }
}

/// Multiplies and rounds to two decimals.
pub fn scale(value: f64, servings: f64) -> f64 {
    round2(value * servings)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionTotals {
    pub entries: usize,
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fats: f64,
}

impl NutritionTotals {
    pub fn of(entries: &[DiaryEntry]) -> Self {
        let totals = entries.iter().fold(Self::default(), |acc, e| Self {
            entries: acc.entries + 1,
            calories: acc.calories + e.calories,
            carbohydrates: acc.carbohydrates + e.carbohydrates,
            protein: acc.protein + e.protein,
            fats: acc.fats + e.fats,
        });
        Self {
            calories: round2(totals.calories),
            carbohydrates: round2(totals.carbohydrates),
            protein: round2(totals.protein),
            fats: round2(totals.fats),
            ..totals
        }
    }
}
