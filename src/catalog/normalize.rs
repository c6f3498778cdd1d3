use lazy_static::lazy_static;
use regex::Regex;

use super::parser::{Column, RawRow};

/// Sentinel for "not specified" serving/quantity text.
pub const NOT_SPECIFIED: &str = "-";
pub const OTHER_CATEGORY: &str = "Other";
pub const CUSTOM_CATEGORY: &str = "Custom";
pub const ALL_CATEGORY: &str = "All";

/// Lower-cased synonym → canonical category.
pub const CATEGORY_SYNONYMS: &[(&str, &str)] = &[
    ("beverage", "Beverages"),
    ("beverages", "Beverages"),
    ("drink", "Beverages"),
    ("drinks", "Beverages"),
    ("snack", "Snacks"),
    ("snacks", "Snacks"),
    ("vegetable", "Vegetables"),
    ("vegetables", "Vegetables"),
    ("veggie", "Vegetables"),
    ("veggies", "Vegetables"),
    ("grain", "Grains"),
    ("grains", "Grains"),
    ("cereal", "Grains"),
    ("cereals", "Grains"),
    ("protein", "Protein"),
    ("proteins", "Protein"),
    ("meat", "Protein"),
    ("meats", "Protein"),
    ("dairy", "Dairy"),
    ("milk", "Dairy"),
    ("fruit", "Fruits"),
    ("fruits", "Fruits"),
    ("dessert", "Desserts"),
    ("desserts", "Desserts"),
    ("sweet", "Desserts"),
    ("sweets", "Desserts"),
];

/// Typed nutrition fields of one row; the caller assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodFields {
    pub name: String,
    pub category: String,
    pub serving: String,
    pub quantity: String,
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fats: f64,
}

impl FoodFields {
    /// A named food with every other field at its default.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            category: OTHER_CATEGORY.to_string(),
            serving: NOT_SPECIFIED.to_string(),
            quantity: NOT_SPECIFIED.to_string(),
            calories: 0.0,
            carbohydrates: 0.0,
            protein: 0.0,
            fats: 0.0,
        }
    }
}

/// Maps one parsed row to typed fields. Never fails; bad cells degrade to defaults.
pub fn normalize_row(row: &RawRow) -> FoodFields {
    FoodFields {
        name: row.get(Column::Name).trim().to_string(),
        category: normalize_category(row.get(Column::Category)),
        serving: text_or_dash(row.get(Column::Serving)),
        quantity: text_or_dash(row.get(Column::Quantity)),
        calories: coerce_number(row.get(Column::Calories)),
        carbohydrates: coerce_number(row.get(Column::Carbohydrates)),
        protein: coerce_number(row.get(Column::Protein)),
        fats: coerce_number(row.get(Column::Fats)),
    }
}

/// Strips everything but digits and dots, then reads the leading decimal number.
///
/// `"1,234 kcal"` reads as `1234`, `"12kcal"` as `12`, `"1.2.3"` as `1.2`.
/// Anything without a number reads as `0`.
pub fn coerce_number(raw: &str) -> f64 {
    lazy_static! {
        static ref NON_NUMERIC: Regex = Regex::new(r"[^0-9.]").unwrap();
        static ref LEADING_NUMBER: Regex = Regex::new(r"^(?:\d+\.?\d*|\.\d+)").unwrap();
    }
    let stripped = NON_NUMERIC.replace_all(raw, "");
    LEADING_NUMBER
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(sanitize_number)
        .unwrap_or(0.0)
}

/// Clamps to a finite, non-negative value.
pub fn sanitize_number(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Canonicalizes a raw category label through the synonym table.
pub fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if let Some((_, canonical)) = CATEGORY_SYNONYMS.iter().find(|(syn, _)| *syn == lower) {
        return (*canonical).to_string();
    }
    if trimmed.is_empty() || trimmed == NOT_SPECIFIED {
        OTHER_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn text_or_dash(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod normalize_tests {
    use super::*;
    use crate::catalog::parser::parse_rows;

    #[test]
    fn malformed_numbers_default_to_zero() {
        for raw in ["", "-", "abc", "n/a", ".", "..", "kcal"] {
            assert_eq!(coerce_number(raw), 0.0, "input {:?}", raw);
        }
    }

    #[test]
    fn unit_suffixed_numbers_keep_their_value() {
        assert_eq!(coerce_number("12kcal"), 12.0);
        assert_eq!(coerce_number("1,234 kcal"), 1234.0);
        assert_eq!(coerce_number("$3.50"), 3.5);
        assert_eq!(coerce_number(" 0.5 g "), 0.5);
        assert_eq!(coerce_number(".25"), 0.25);
        assert_eq!(coerce_number("1.2.3"), 1.2);
    }

    #[test]
    fn numbers_are_never_negative() {
        assert_eq!(coerce_number("-15"), 15.0);
        assert_eq!(sanitize_number(-2.0), 0.0);
        assert_eq!(sanitize_number(f64::NAN), 0.0);
        assert_eq!(sanitize_number(f64::INFINITY), 0.0);
    }

    #[test]
    fn categories_resolve_through_synonyms() {
        assert_eq!(normalize_category("beverage"), "Beverages");
        assert_eq!(normalize_category("  DRINKS "), "Beverages");
        assert_eq!(normalize_category("Sweets"), "Desserts");
        assert_eq!(normalize_category("milk"), "Dairy");
    }

    #[test]
    fn unknown_categories_pass_through_trimmed() {
        assert_eq!(normalize_category("  Mixed "), "Mixed");
        assert_eq!(normalize_category("Breakfast"), "Breakfast");
        assert_eq!(normalize_category("Custom"), "Custom");
    }

    #[test]
    fn empty_categories_become_other() {
        assert_eq!(normalize_category(""), "Other");
        assert_eq!(normalize_category("   "), "Other");
        assert_eq!(normalize_category("-"), "Other");
    }

    #[test]
    fn normalizes_a_full_row() {
        let rows = parse_rows(
            "Dish Name,Category,Serving,Quantity,Calories (kcal),Carbohydrates (g),Protein (g),Fats (g)\n\
             Rice,beverage,  ,1 cup,\"1,234 kcal\",45,4,0.5",
        )
        .unwrap();
        let fields = normalize_row(&rows[0]);
        assert_eq!(fields.name, "Rice");
        assert_eq!(fields.category, "Beverages");
        assert_eq!(fields.serving, "-");
        assert_eq!(fields.quantity, "1 cup");
        assert_eq!(fields.calories, 1234.0);
        assert_eq!(fields.fats, 0.5);
    }
}
