use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use super::normalize::{normalize_category, sanitize_number, text_or_dash, FoodFields, NOT_SPECIFIED};

/// One food/nutrition entry of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredFood")]
pub struct FoodRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub serving: String,
    pub quantity: String,
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fats: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub description: String,
    pub is_custom: bool,
    /// Keys this model does not know, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// On-disk shape of a food. Older app versions wrote `carbs`/`fat`/`servingSize`,
/// sometimes next to the current spelling.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFood {
    #[serde(default, deserialize_with = "lenient::text")]
    id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    category: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    serving: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    quantity: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    serving_size: Option<String>,
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
    #[serde(default, deserialize_with = "lenient::text")]
    description: String,
    #[serde(default)]
    is_custom: bool,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<StoredFood> for FoodRecord {
    fn from(raw: StoredFood) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            category: raw.category,
            serving: raw.serving.unwrap_or_else(not_specified),
            quantity: raw.quantity.or(raw.serving_size).unwrap_or_else(not_specified),
            calories: raw.calories,
            carbohydrates: lenient::prefer(raw.carbohydrates, raw.carbs),
            protein: raw.protein,
            fats: lenient::prefer(raw.fats, raw.fat),
            fiber: raw.fiber,
            sugar: raw.sugar,
            description: raw.description,
            is_custom: raw.is_custom,
            extra: raw.extra,
        }
    }
}

fn not_specified() -> String {
    NOT_SPECIFIED.to_string()
}

impl FoodRecord {
    pub fn new(id: impl Into<String>, fields: FoodFields, is_custom: bool) -> Self {
        let description = describe(&fields.name, &fields.category, &fields.quantity);
        Self {
            id: id.into(),
            name: fields.name,
            category: fields.category,
            serving: fields.serving,
            quantity: fields.quantity,
            calories: fields.calories,
            carbohydrates: fields.carbohydrates,
            protein: fields.protein,
            fats: fields.fats,
            fiber: 0.0,
            sugar: 0.0,
            description,
            is_custom,
            extra: Map::new(),
        }
    }

    /// Sets the secondary nutrients the dataset sheet does not carry.
    pub fn with_fiber_and_sugar(mut self, fiber: f64, sugar: f64) -> Self {
        self.fiber = sanitize_number(fiber);
        self.sugar = sanitize_number(sugar);
        self
    }

    /// True when a qualitative serving is given; drives sort order only.
    pub fn has_serving(&self) -> bool {
        let serving = self.serving.trim();
        !serving.is_empty() && serving != NOT_SPECIFIED
    }

    /// Re-applies field normalization to a record read back from storage.
    /// Secondary nutrients and unknown keys are carried over.
    pub fn renormalized(self) -> Self {
        let fields = FoodFields {
            name: self.name.trim().to_string(),
            category: normalize_category(&self.category),
            serving: text_or_dash(&self.serving),
            quantity: text_or_dash(&self.quantity),
            calories: sanitize_number(self.calories),
            carbohydrates: sanitize_number(self.carbohydrates),
            protein: sanitize_number(self.protein),
            fats: sanitize_number(self.fats),
        };
        let mut record = Self::new(self.id, fields, self.is_custom)
            .with_fiber_and_sugar(self.fiber, self.sugar);
        record.extra = self.extra;
        record
    }
}

pub fn describe(name: &str, category: &str, quantity: &str) -> String {
    format!("{} - {} ({})", name, category, quantity)
}

pub(crate) fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Deserializers tolerant of the loosely-typed JSON older app versions wrote.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::catalog::normalize::{coerce_number, sanitize_number};

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_number(d)?.unwrap_or(0.0))
    }

    /// `None` when the key is null or holds something other than a number or string.
    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => Some(sanitize_number(n.as_f64().unwrap_or(0.0))),
            Some(Value::String(s)) => Some(coerce_number(&s)),
            _ => None,
        })
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// The current spelling unless it is absent or zero, then the legacy one.
    pub fn prefer(current: Option<f64>, legacy: Option<f64>) -> f64 {
        match (current, legacy) {
            (Some(v), _) if v > 0.0 => v,
            (_, Some(v)) => v,
            (v, None) => v.unwrap_or(0.0),
        }
    }
}
