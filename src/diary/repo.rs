use std::sync::Arc;

use time::{Date, OffsetDateTime, UtcOffset};
use tracing::{debug, info};

use crate::{
    catalog::model::FoodRecord,
    error::CatalogError,
    storage::{self, food_entries_key, KvStore},
};

use super::repo_types::{DiaryEntry, NutritionTotals};

/// Per-day food logs, one JSON array under `foodEntries_<date>`.
#[derive(Clone)]
pub struct DiaryStore {
    store: Arc<dyn KvStore>,
}

impl DiaryStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    async fn read(&self, date: Date) -> Result<Option<Vec<DiaryEntry>>, CatalogError> {
        let key = food_entries_key(date);
        storage::get_json(self.store.as_ref(), &key)
            .await
            .map_err(|e| CatalogError::read_failure(&key, e))
    }

    async fn write(&self, date: Date, entries: &[DiaryEntry]) -> Result<(), CatalogError> {
        let key = food_entries_key(date);
        storage::put_json(self.store.as_ref(), &key, entries)
            .await
            .map_err(|e| CatalogError::write_failure(&key, e))
    }

    pub async fn entries(&self, date: Date) -> Result<Vec<DiaryEntry>, CatalogError> {
        Ok(self.read(date).await?.unwrap_or_default())
    }

    /// Appends a scaled entry to the log of `at`'s UTC date.
    pub async fn log(
        &self,
        food: &FoodRecord,
        servings: f64,
        at: OffsetDateTime,
    ) -> Result<DiaryEntry, CatalogError> {
        if !servings.is_finite() || servings < 1.0 {
            return Err(CatalogError::Validation(format!(
                "servings must be at least 1, got {}",
                servings
            )));
        }

        let at = at.to_offset(UtcOffset::UTC);
        let entry = DiaryEntry::scaled(food, servings, at);
        let mut entries = self.entries(at.date()).await?;
        entries.push(entry.clone());
        self.write(at.date(), &entries).await?;

        info!(id = %entry.id, food_id = %entry.food_id, servings, "logged food");
        Ok(entry)
    }

    pub async fn delete_entry(&self, date: Date, id: &str) -> Result<(), CatalogError> {
        let mut entries = self.entries(date).await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(CatalogError::NotFound(format!("diary entry `{}`", id)));
        }
        self.write(date, &entries).await
    }

    /// Drops every entry named `name`. A day with no log is left untouched.
    pub async fn remove_by_name(&self, date: Date, name: &str) -> Result<usize, CatalogError> {
        let Some(mut entries) = self.read(date).await? else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|e| e.name != name);
        let removed = before - entries.len();
        self.write(date, &entries).await?;

        debug!(%date, %name, removed, "removed diary entries by name");
        Ok(removed)
    }

    pub async fn contains_name(&self, date: Date, name: &str) -> Result<bool, CatalogError> {
        Ok(self.entries(date).await?.iter().any(|e| e.name == name))
    }

    pub async fn summary(&self, date: Date) -> Result<NutritionTotals, CatalogError> {
        Ok(NutritionTotals::of(&self.entries(date).await?))
    }
}

#[cfg(test)]
mod diary_tests {
    use time::macros::{date, datetime};

    use super::*;
    use crate::{catalog::normalize::FoodFields, storage::MemoryStore};

    fn rice() -> FoodRecord {
        let mut fields = FoodFields::named("Rice");
        fields.category = "Grains".into();
        fields.serving = "Bowl".into();
        fields.quantity = "1 cup".into();
        fields.calories = 200.0;
        fields.carbohydrates = 45.0;
        fields.protein = 4.1;
        fields.fats = 0.333;
        FoodRecord::new("1", fields, false)
    }

    fn diary() -> (DiaryStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (DiaryStore::new(store.clone()), store)
    }

    #[tokio::test]
    async fn log_scales_and_rounds() {
        let (diary, _) = diary();
        let entry = diary
            .log(&rice(), 3.0, datetime!(2025-08-01 12:30 UTC))
            .await
            .unwrap();

        assert_eq!(entry.food_id, "1");
        assert_eq!(entry.portion, "1 cup");
        assert_eq!(entry.quantity, 3.0);
        assert_eq!(entry.calories, 600.0);
        assert_eq!(entry.protein, 12.3);
        assert_eq!(entry.fats, 1.0);

        let stored = diary.entries(date!(2025 - 08 - 01)).await.unwrap();
        assert_eq!(stored, vec![entry]);
    }

    #[tokio::test]
    async fn log_uses_the_utc_day() {
        let (diary, store) = diary();
        diary
            .log(&rice(), 1.0, datetime!(2025-08-01 23:30 -2))
            .await
            .unwrap();
        assert_eq!(store.keys().await, vec!["foodEntries_2025-08-02".to_string()]);
    }

    #[tokio::test]
    async fn fractional_servings_below_one_are_rejected() {
        let (diary, store) = diary();
        for servings in [0.0, 0.5, -1.0, f64::NAN] {
            let err = diary
                .log(&rice(), servings, datetime!(2025-08-01 12:00 UTC))
                .await
                .unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)));
        }
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_entry_is_not_found() {
        let (diary, _) = diary();
        let err = diary.delete_entry(date!(2025 - 08 - 01), "nope").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_entry_removes_only_that_entry() {
        let (diary, _) = diary();
        let at = datetime!(2025-08-01 08:00 UTC);
        let first = diary.log(&rice(), 1.0, at).await.unwrap();
        let second = diary.log(&rice(), 2.0, at).await.unwrap();

        diary.delete_entry(at.date(), &first.id).await.unwrap();
        assert_eq!(diary.entries(at.date()).await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn remove_by_name_skips_missing_days() {
        let (diary, store) = diary();
        let removed = diary.remove_by_name(date!(2025 - 08 - 01), "Rice").await.unwrap();
        assert_eq!(removed, 0);
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn remove_by_name_matches_exact_name() {
        let (diary, _) = diary();
        let at = datetime!(2025-08-01 08:00 UTC);
        let mut tea = rice();
        tea.name = "Rice Tea".into();
        diary.log(&rice(), 1.0, at).await.unwrap();
        diary.log(&tea, 1.0, at).await.unwrap();
        diary.log(&rice(), 2.0, at).await.unwrap();

        assert_eq!(diary.remove_by_name(at.date(), "Rice").await.unwrap(), 2);
        assert!(!diary.contains_name(at.date(), "Rice").await.unwrap());
        assert!(diary.contains_name(at.date(), "Rice Tea").await.unwrap());
    }

    #[tokio::test]
    async fn summary_totals_the_day() {
        let (diary, _) = diary();
        let at = datetime!(2025-08-01 08:00 UTC);
        diary.log(&rice(), 1.0, at).await.unwrap();
        diary.log(&rice(), 2.0, at).await.unwrap();

        let totals = diary.summary(at.date()).await.unwrap();
        assert_eq!(totals.entries, 2);
        assert_eq!(totals.calories, 600.0);
        assert_eq!(totals.carbohydrates, 135.0);
        assert_eq!(totals.fats, 1.0);
    }

    #[tokio::test]
    async fn legacy_entries_with_string_numbers_are_read() {
        let (diary, store) = diary();
        let legacy = r#"[{"id":1722500000000,"name":"Chai","calories":"50","protein":2,
            "carbs":8,"quantity":2,"timestamp":"2025-08-01T07:15:00.000Z"}]"#;
        storage::set_string(store.as_ref(), "foodEntries_2025-08-01", legacy)
            .await
            .unwrap();

        let entries = diary.entries(date!(2025 - 08 - 01)).await.unwrap();
        assert_eq!(entries[0].id, "1722500000000");
        assert_eq!(entries[0].calories, 50.0);
        assert_eq!(entries[0].quantity, 2.0);
        assert_eq!(entries[0].carbohydrates, 8.0);
    }

    #[tokio::test]
    async fn scanned_entries_count_legacy_carbs_and_fat() {
        let (diary, store) = diary();
        let scanned = r#"[{"id":"1722500000001","name":"Banana chips","calories":200,"carbs":45,
            "fat":0.5,"protein":4,"fiber":3,"servingSize":"30g","barcode":"8901234567890",
            "quantity":1,"timestamp":"2025-08-01T09:00:00.000Z"}]"#;
        storage::set_string(store.as_ref(), "foodEntries_2025-08-01", scanned)
            .await
            .unwrap();
        let day = date!(2025 - 08 - 01);

        let totals = diary.summary(day).await.unwrap();
        assert_eq!(totals.carbohydrates, 45.0);
        assert_eq!(totals.fats, 0.5);
        assert_eq!(totals.protein, 4.0);

        let entries = diary.entries(day).await.unwrap();
        assert_eq!(entries[0].portion, "30g");
        assert_eq!(entries[0].fiber, 3.0);

        // A rewrite of the day keeps the scanner's extra keys.
        diary.log(&rice(), 1.0, datetime!(2025-08-01 12:00 UTC)).await.unwrap();
        let raw = storage::get_string(store.as_ref(), "foodEntries_2025-08-01")
            .await
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"barcode\":\"8901234567890\""));
    }
}
