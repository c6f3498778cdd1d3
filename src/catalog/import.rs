//! User-imported spreadsheets exported as CSV.
//!
//! Looser than the bundled dataset: headers are matched by exact spelling,
//! nothing is mandatory, and nutrition values are whole numbers. Two layouts
//! are understood, the app's own spreadsheet export and the Indian dish
//! nutrition table keyed by `Dish Name`.

use serde::Deserialize;

use super::{
    model::FoodRecord,
    normalize::{coerce_number, normalize_category, text_or_dash, FoodFields, NOT_SPECIFIED},
    parser::split_records,
};

const UNKNOWN_FOOD: &str = "Unknown Food";
const DEFAULT_SERVING_SIZE: &str = "100g";
const DISH_NAME: &str = "Dish Name";

mod spreadsheet {
    pub const NAME: &[&str] = &["name", "Name", "FOOD_NAME", "food_name"];
    pub const CATEGORY: &[&str] = &["category", "Category", "CATEGORY"];
    pub const SERVING_SIZE: &[&str] = &["servingSize", "serving_size", "ServingSize", "SERVING_SIZE"];
    pub const CALORIES: &[&str] = &["calories", "Calories", "CALORIES"];
    pub const CARBS: &[&str] = &["carbs", "Carbs", "carbohydrates", "CARBS"];
    pub const PROTEIN: &[&str] = &["protein", "Protein", "PROTEIN"];
    pub const FAT: &[&str] = &["fat", "Fat", "FAT"];
    pub const FIBER: &[&str] = &["fiber", "Fiber", "FIBER"];
    pub const SUGAR: &[&str] = &["sugar", "Sugar", "SUGAR"];
    pub const DESCRIPTION: &[&str] = &["description", "Description", "DESCRIPTION"];
}

mod dishes {
    pub const NAME: &[&str] = &[super::DISH_NAME];
    pub const CALORIES: &[&str] = &["Calories (kcal)"];
    pub const CARBS: &[&str] = &["Carbohydrates (g)"];
    pub const PROTEIN: &[&str] = &["Protein (g)"];
    pub const FAT: &[&str] = &["Fats (g)"];
    pub const FIBER: &[&str] = &["Fibre (g)"];
    pub const SUGAR: &[&str] = &["Free Sugar (g)"];
}

/// Column layout of an imported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportLayout {
    /// name/category/calories/carbs/fat/... with values truncated.
    Spreadsheet,
    /// `Dish Name`, `Calories (kcal)`, ...; category guessed from the dish
    /// name and values rounded.
    Dishes,
}

impl ImportLayout {
    pub fn detect(header: &[String]) -> Self {
        if header.iter().any(|h| h.trim() == DISH_NAME) {
            Self::Dishes
        } else {
            Self::Spreadsheet
        }
    }
}

/// One data row with header positions resolved.
struct Row<'a> {
    header: &'a [String],
    record: &'a [String],
}

impl<'a> Row<'a> {
    fn cell(&self, aliases: &[&str]) -> &'a str {
        self.header
            .iter()
            .position(|h| aliases.contains(&h.trim()))
            .and_then(|pos| self.record.get(pos))
            .map(|v| v.trim())
            .unwrap_or_default()
    }

    fn text_or(&self, aliases: &[&str], default: &'a str) -> &'a str {
        match self.cell(aliases) {
            "" => default,
            value => value,
        }
    }

    fn truncated(&self, aliases: &[&str]) -> f64 {
        coerce_number(self.cell(aliases)).trunc()
    }

    fn rounded(&self, aliases: &[&str]) -> f64 {
        coerce_number(self.cell(aliases)).round()
    }
}

/// Converts imported CSV text to custom food records with ids
/// `imported_<stamp_ms>_<index>`. Without an explicit layout, a `Dish Name`
/// header selects [`ImportLayout::Dishes`].
pub fn transform_import(content: &str, layout: Option<ImportLayout>, stamp_ms: i64) -> Vec<FoodRecord> {
    let mut records = split_records(content).into_iter();
    let Some(header) = records.next() else {
        return Vec::new();
    };
    let layout = layout.unwrap_or_else(|| ImportLayout::detect(&header));

    records
        .enumerate()
        .map(|(index, record)| {
            let row = Row {
                header: &header,
                record: &record,
            };
            let id = format!("imported_{}_{}", stamp_ms, index);
            match layout {
                ImportLayout::Spreadsheet => from_spreadsheet(id, &row),
                ImportLayout::Dishes => from_dish_table(id, &row),
            }
        })
        .collect()
}

fn from_spreadsheet(id: String, row: &Row<'_>) -> FoodRecord {
    use spreadsheet::*;

    let fields = FoodFields {
        name: row.text_or(NAME, UNKNOWN_FOOD).to_string(),
        category: normalize_category(row.cell(CATEGORY)),
        serving: NOT_SPECIFIED.to_string(),
        quantity: text_or_dash(row.text_or(SERVING_SIZE, DEFAULT_SERVING_SIZE)),
        calories: row.truncated(CALORIES),
        carbohydrates: row.truncated(CARBS),
        protein: row.truncated(PROTEIN),
        fats: row.truncated(FAT),
    };
    let mut food = FoodRecord::new(id, fields, true)
        .with_fiber_and_sugar(row.truncated(FIBER), row.truncated(SUGAR));
    let description = row.cell(DESCRIPTION);
    if !description.is_empty() {
        food.description = description.to_string();
    }
    food
}

fn from_dish_table(id: String, row: &Row<'_>) -> FoodRecord {
    use dishes::*;

    let name = row.text_or(NAME, UNKNOWN_FOOD);
    let calories = row.rounded(CALORIES);
    let fields = FoodFields {
        name: name.to_string(),
        category: dish_category(name).to_string(),
        serving: NOT_SPECIFIED.to_string(),
        quantity: DEFAULT_SERVING_SIZE.to_string(),
        calories,
        carbohydrates: row.rounded(CARBS),
        protein: row.rounded(PROTEIN),
        fats: row.rounded(FAT),
    };
    let mut food = FoodRecord::new(id, fields, true)
        .with_fiber_and_sugar(row.rounded(FIBER), row.rounded(SUGAR));
    food.description = format!("Indian dish with {} calories per 100g serving.", calories);
    food
}

/// Guesses a meal category from keywords in the dish name.
fn dish_category(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if mentions(&["soup", "stock"]) {
        "Soup"
    } else if mentions(&["sandwich"]) {
        "Snacks"
    } else if mentions(&["tea", "coffee", "drink", "lassi"]) {
        "Beverages"
    } else if mentions(&["paratha", "chapati", "porridge"]) {
        "Breakfast"
    } else {
        "Lunch"
    }
}

#[cfg(test)]
mod import_tests {
    use super::*;

    #[test]
    fn maps_loose_headers_to_whole_numbers() {
        let content = "FOOD_NAME,CATEGORY,CALORIES,Protein,carbs,FAT,servingSize\n\
                       Idli,breakfast,58.9,2.2,12.7,0.4,2 pieces\n\
                       Lassi,drink,120,,,,\n";
        let foods = transform_import(content, None, 1700000000000);

        assert_eq!(foods.len(), 2);
        let idli = &foods[0];
        assert_eq!(idli.id, "imported_1700000000000_0");
        assert_eq!(idli.name, "Idli");
        assert_eq!(idli.category, "breakfast");
        assert_eq!(idli.calories, 58.0);
        assert_eq!(idli.protein, 2.0);
        assert_eq!(idli.carbohydrates, 12.0);
        assert_eq!(idli.fats, 0.0);
        assert_eq!(idli.quantity, "2 pieces");
        assert!(idli.is_custom);

        let lassi = &foods[1];
        assert_eq!(lassi.id, "imported_1700000000000_1");
        assert_eq!(lassi.category, "Beverages");
        assert_eq!(lassi.quantity, "100g");
        assert_eq!(lassi.protein, 0.0);
    }

    #[test]
    fn spreadsheet_keeps_fiber_sugar_and_description() {
        let content = "name,fiber,Sugar,description\nOats,4.8,1.2,Rolled oats\nMuesli,,,\n";
        let foods = transform_import(content, None, 1);

        assert_eq!(foods[0].fiber, 4.0);
        assert_eq!(foods[0].sugar, 1.0);
        assert_eq!(foods[0].description, "Rolled oats");
        assert_eq!(foods[1].description, "Muesli - Other (100g)");
    }

    #[test]
    fn header_spelling_is_exact() {
        let foods = transform_import("NAME,calories\nTea,30\n", None, 1);
        assert_eq!(foods[0].name, "Unknown Food");
        assert_eq!(foods[0].calories, 30.0);
        assert_eq!(foods[0].category, "Other");
    }

    #[test]
    fn dish_table_is_detected_and_rounded() {
        let content = "Dish Name,Calories (kcal),Carbohydrates (g),Protein (g),Fats (g),Free Sugar (g),Fibre (g)\n\
                       Hot tea (Garam Chai),16.14,2.58,0.39,0.53,2.58,0\n\
                       Tomato soup,48.5,6.2,1.4,2.4,3.1,1.6\n\
                       ,10,,,,,\n";
        let foods = transform_import(content, None, 7);

        assert_eq!(foods.len(), 3);
        let tea = &foods[0];
        assert_eq!(tea.id, "imported_7_0");
        assert_eq!(tea.category, "Beverages");
        assert_eq!(tea.calories, 16.0);
        assert_eq!(tea.carbohydrates, 3.0);
        assert_eq!(tea.fats, 1.0);
        assert_eq!(tea.sugar, 3.0);
        assert_eq!(tea.quantity, "100g");
        assert_eq!(tea.description, "Indian dish with 16 calories per 100g serving.");

        assert_eq!(foods[1].category, "Soup");
        assert_eq!(foods[1].calories, 49.0);
        assert_eq!(foods[1].fiber, 2.0);

        assert_eq!(foods[2].name, "Unknown Food");
        assert_eq!(foods[2].category, "Lunch");
    }

    #[test]
    fn dish_categories_follow_name_keywords() {
        assert_eq!(dish_category("Chicken Stock"), "Soup");
        assert_eq!(dish_category("Veg Sandwich"), "Snacks");
        assert_eq!(dish_category("Cold coffee"), "Beverages");
        assert_eq!(dish_category("Aloo Paratha"), "Breakfast");
        assert_eq!(dish_category("Dal makhani"), "Lunch");
    }

    #[test]
    fn explicit_layout_wins_over_detection() {
        let content = "Dish Name,name,calories\nIgnored,Poha,250.6\n";

        let detected = transform_import(content, None, 1);
        assert_eq!(detected[0].name, "Ignored");

        let forced = transform_import(content, Some(ImportLayout::Spreadsheet), 1);
        assert_eq!(forced[0].name, "Poha");
        assert_eq!(forced[0].calories, 250.0);
    }

    #[test]
    fn empty_input_imports_nothing() {
        assert!(transform_import("", None, 1).is_empty());
        assert!(transform_import("name,calories\n", None, 1).is_empty());
    }
}
