use std::sync::Arc;

use rand::Rng;
use time::{Date, OffsetDateTime};
use tracing::info;

use crate::{
    catalog::{
        model::{unix_millis, FoodRecord},
        normalize::{sanitize_number, text_or_dash, FoodFields, CUSTOM_CATEGORY},
    },
    diary::DiaryStore,
    error::CatalogError,
    storage::{self, KvStore, CUSTOM_FOODS_KEY},
};

use super::dto::{DeleteOptions, DeleteOutcome, NewCustomFood};

/// User-authored foods, stored as one JSON array under `customFoods`.
#[derive(Clone)]
pub struct CustomFoodStore {
    store: Arc<dyn KvStore>,
    diary: DiaryStore,
}

impl CustomFoodStore {
    pub fn new(store: Arc<dyn KvStore>, diary: DiaryStore) -> Self {
        Self { store, diary }
    }

    async fn read(&self) -> Result<Vec<FoodRecord>, CatalogError> {
        storage::get_json(self.store.as_ref(), CUSTOM_FOODS_KEY)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| CatalogError::read_failure(CUSTOM_FOODS_KEY, e))
    }

    async fn write(&self, foods: &[FoodRecord]) -> Result<(), CatalogError> {
        storage::put_json(self.store.as_ref(), CUSTOM_FOODS_KEY, foods)
            .await
            .map_err(|e| CatalogError::write_failure(CUSTOM_FOODS_KEY, e))
    }

    /// Every stored custom food, renormalized. Records saved without an id
    /// get `custom_<index>_<millis>`.
    pub async fn list(&self) -> Result<Vec<FoodRecord>, CatalogError> {
        let stamp = unix_millis(OffsetDateTime::now_utc());
        let foods = self
            .read()
            .await?
            .into_iter()
            .enumerate()
            .map(|(index, mut food)| {
                if food.id.trim().is_empty() {
                    food.id = format!("custom_{}_{}", index, stamp);
                }
                food.is_custom = true;
                food.renormalized()
            })
            .collect();
        Ok(foods)
    }

    pub async fn add(&self, new: NewCustomFood) -> Result<FoodRecord, CatalogError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(CatalogError::Validation("name is required".into()));
        }

        let fields = FoodFields {
            name: name.to_string(),
            category: CUSTOM_CATEGORY.to_string(),
            serving: text_or_dash(new.serving.as_deref().unwrap_or_default()),
            quantity: text_or_dash(new.quantity.as_deref().unwrap_or_default()),
            calories: sanitize_number(new.calories),
            carbohydrates: sanitize_number(new.carbohydrates),
            protein: sanitize_number(new.protein),
            fats: sanitize_number(new.fats),
        };
        let food = FoodRecord::new(new_custom_id(OffsetDateTime::now_utc()), fields, true)
            .with_fiber_and_sugar(new.fiber, new.sugar);

        let mut foods = self.read().await?;
        foods.push(food.clone());
        self.write(&foods).await?;

        info!(id = %food.id, name = %food.name, "custom food added");
        Ok(food)
    }

    pub async fn delete(&self, id: &str, opts: DeleteOptions) -> Result<DeleteOutcome, CatalogError> {
        self.delete_on(id, opts, OffsetDateTime::now_utc().date()).await
    }

    /// Deletes by id. With `also_remove_from_diary`, entries of `today` that
    /// share the food's name are removed first; if that fails the custom
    /// list is left as it was.
    pub async fn delete_on(
        &self,
        id: &str,
        opts: DeleteOptions,
        today: Date,
    ) -> Result<DeleteOutcome, CatalogError> {
        let mut foods = self.read().await?;
        let position = foods.iter().position(|f| f.id == id).or_else(|| {
            backfilled_index(id).filter(|&i| foods.get(i).is_some_and(|f| f.id.trim().is_empty()))
        });
        let Some(position) = position else {
            return Err(CatalogError::NotFound(format!("custom food `{}`", id)));
        };

        let mut removed = foods.remove(position);
        removed.id = id.to_string();
        removed.is_custom = true;
        let removed = removed.renormalized();

        let diary_entries_removed = if opts.also_remove_from_diary {
            self.diary.remove_by_name(today, &removed.name).await?
        } else {
            0
        };
        self.write(&foods).await?;

        info!(%id, name = %removed.name, diary_entries_removed, "custom food deleted");
        Ok(DeleteOutcome {
            removed,
            diary_entries_removed,
        })
    }

    /// Appends already-transformed records; returns the new total.
    pub async fn append_imported(&self, records: Vec<FoodRecord>) -> Result<usize, CatalogError> {
        let mut foods = self.read().await?;
        foods.extend(records);
        self.write(&foods).await?;
        Ok(foods.len())
    }
}

/// `<unix-millis>-<4 hex digits>`.
fn new_custom_id(at: OffsetDateTime) -> String {
    let suffix: u16 = rand::thread_rng().gen();
    format!("{}-{:04x}", unix_millis(at), suffix)
}

/// Index encoded in a `custom_<index>_<millis>` id.
fn backfilled_index(id: &str) -> Option<usize> {
    let (index, stamp) = id.strip_prefix("custom_")?.split_once('_')?;
    stamp.parse::<i64>().ok()?;
    index.parse().ok()
}
