use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashSet},
};

use serde::Serialize;
use tracing::warn;

use super::{
    model::FoodRecord,
    normalize::{normalize_category, ALL_CATEGORY, CUSTOM_CATEGORY, OTHER_CATEGORY},
    source::SourceOrigin,
};

/// The merged, sorted, queryable set of foods. Rebuilt, never patched.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    foods: Vec<FoodRecord>,
    categories: Vec<String>,
    origin: Option<SourceOrigin>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            foods: Vec::new(),
            categories: category_facets(std::iter::empty()),
            origin: None,
        }
    }

    /// Custom foods first, then dataset foods; the first record wins on id clash.
    pub fn merge(custom: Vec<FoodRecord>, dataset: Vec<FoodRecord>, origin: SourceOrigin) -> Self {
        let custom = custom.into_iter().map(|f| (f, true));
        let dataset = dataset.into_iter().map(|f| (f, false));

        let mut seen = HashSet::new();
        let mut foods = Vec::new();
        for (mut food, is_custom) in custom.chain(dataset) {
            if food.name.trim().is_empty() {
                warn!(id = %food.id, "dropping food without a name");
                continue;
            }
            if !seen.insert(food.id.clone()) {
                warn!(id = %food.id, name = %food.name, "dropping food with duplicate id");
                continue;
            }
            food.is_custom = is_custom;
            food.category = normalize_category(&food.category);
            foods.push(food);
        }

        sort_foods(&mut foods);
        let categories = category_facets(foods.iter());
        Self {
            foods,
            categories,
            origin: Some(origin),
        }
    }

    pub fn foods(&self) -> &[FoodRecord] {
        &self.foods
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn origin(&self) -> Option<SourceOrigin> {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn lookup_by_id(&self, id: &str) -> Option<&FoodRecord> {
        self.foods.iter().find(|f| f.id == id)
    }

    pub fn filter_by_category(&self, category: &str) -> Vec<&FoodRecord> {
        self.foods
            .iter()
            .filter(|f| in_category(f, category))
            .collect()
    }

    pub fn search(&self, text: &str) -> Vec<&FoodRecord> {
        self.query(ALL_CATEGORY, text)
    }

    /// Category filter, then case-insensitive name search. Order is preserved.
    pub fn query(&self, category: &str, text: &str) -> Vec<&FoodRecord> {
        let needle = text.trim().to_lowercase();
        self.foods
            .iter()
            .filter(|f| in_category(f, category))
            .filter(|f| needle.is_empty() || f.name.to_lowercase().contains(&needle))
            .collect()
    }
}

fn in_category(food: &FoodRecord, category: &str) -> bool {
    match category {
        ALL_CATEGORY => true,
        CUSTOM_CATEGORY => food.is_custom,
        other => food.category == other,
    }
}

/// Foods with a serving first, then by name; ties fall back to exact name and id.
pub fn compare_foods(a: &FoodRecord, b: &FoodRecord) -> Ordering {
    b.has_serving()
        .cmp(&a.has_serving())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_foods(foods: &mut [FoodRecord]) {
    foods.sort_by(compare_foods);
}

/// `All`, `Custom`, the remaining categories alphabetically, `Other` last if present.
pub fn category_facets<'a>(foods: impl Iterator<Item = &'a FoodRecord>) -> Vec<String> {
    let mut has_other = false;
    let mut rest = BTreeSet::new();
    for food in foods {
        match food.category.as_str() {
            ALL_CATEGORY | CUSTOM_CATEGORY => {}
            OTHER_CATEGORY => has_other = true,
            category => {
                rest.insert(category.to_string());
            }
        }
    }

    let mut facets = vec![ALL_CATEGORY.to_string(), CUSTOM_CATEGORY.to_string()];
    facets.extend(rest);
    if has_other {
        facets.push(OTHER_CATEGORY.to_string());
    }
    facets
}
