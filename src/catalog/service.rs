use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::{
    custom_foods::{
        dto::{DeleteOptions, DeleteOutcome, NewCustomFood},
        repo::CustomFoodStore,
    },
    error::CatalogError,
};

use super::{
    import::{transform_import, ImportLayout},
    merge::Catalog,
    model::{unix_millis, FoodRecord},
    source::SourceResolver,
};

/// Owns the published catalog and every path that rebuilds it.
///
/// Rebuilds and custom-food mutations run one at a time; readers take an
/// `Arc<Catalog>` snapshot and never block a rebuild for long.
pub struct CatalogService {
    resolver: SourceResolver,
    custom_foods: CustomFoodStore,
    current: RwLock<Arc<Catalog>>,
    rebuild_lock: Mutex<()>,
}

impl CatalogService {
    pub fn new(resolver: SourceResolver, custom_foods: CustomFoodStore) -> Self {
        Self {
            resolver,
            custom_foods,
            current: RwLock::new(Arc::new(Catalog::empty())),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    pub fn custom_foods(&self) -> &CustomFoodStore {
        &self.custom_foods
    }

    /// Re-resolves the dataset and re-merges custom foods.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Arc<Catalog> {
        let _guard = self.rebuild_lock.lock().await;
        self.rebuild_locked().await
    }

    /// Drops the cached dataset first, so the next source in line is read again.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<Catalog>, CatalogError> {
        let _guard = self.rebuild_lock.lock().await;
        self.resolver.cache().invalidate().await?;
        Ok(self.rebuild_locked().await)
    }

    pub async fn add_custom_food(&self, new: NewCustomFood) -> Result<FoodRecord, CatalogError> {
        let _guard = self.rebuild_lock.lock().await;
        let food = self.custom_foods.add(new).await?;
        self.rebuild_locked().await;
        Ok(food)
    }

    pub async fn delete_custom_food(
        &self,
        id: &str,
        opts: DeleteOptions,
    ) -> Result<DeleteOutcome, CatalogError> {
        let _guard = self.rebuild_lock.lock().await;
        let outcome = self.custom_foods.delete(id, opts).await;
        // Republish from storage even when the delete failed part-way.
        self.rebuild_locked().await;
        outcome
    }

    /// Imports CSV text as custom foods; returns how many were added.
    /// The layout is detected from the header unless given.
    pub async fn import_custom_foods(
        &self,
        content: &str,
        layout: Option<ImportLayout>,
    ) -> Result<usize, CatalogError> {
        let records = transform_import(content, layout, unix_millis(OffsetDateTime::now_utc()));
        if records.is_empty() {
            return Err(CatalogError::Validation("no rows to import".into()));
        }
        let imported = records.len();

        let _guard = self.rebuild_lock.lock().await;
        self.custom_foods.append_imported(records).await?;
        self.rebuild_locked().await;
        info!(imported, "custom foods imported");
        Ok(imported)
    }

    async fn rebuild_locked(&self) -> Arc<Catalog> {
        let dataset = self.resolver.resolve().await;
        let custom = match self.custom_foods.list().await {
            Ok(custom) => custom,
            Err(e) => {
                warn!(error = %e, "custom foods unreadable; merging dataset only");
                Vec::new()
            }
        };

        let catalog = Arc::new(Catalog::merge(custom, dataset.foods, dataset.origin));
        info!(
            origin = dataset.origin.as_str(),
            total = catalog.len(),
            categories = catalog.categories().len(),
            "catalog rebuilt"
        );
        *self.current.write().await = catalog.clone();
        catalog
    }
}

#[cfg(test)]
mod service_tests {
    use super::*;
    use crate::{
        catalog::source::{DatasetCache, SourceOrigin},
        diary::DiaryStore,
        storage::{self, food_entries_key, MemoryStore, CACHED_CSV_KEY},
    };

    const CACHED: &str = "Dish Name,Category,Serving\nPoha,Breakfast,Plate";

    fn service(store: Arc<MemoryStore>) -> CatalogService {
        let resolver = SourceResolver::new(DatasetCache::new(store.clone()), Vec::new());
        let custom = CustomFoodStore::new(store.clone(), DiaryStore::new(store));
        CatalogService::new(resolver, custom)
    }

    #[tokio::test]
    async fn snapshot_is_empty_until_first_load() {
        let service = service(Arc::new(MemoryStore::new()));
        assert!(service.snapshot().await.is_empty());

        let catalog = service.reload().await;
        assert_eq!(catalog.origin(), Some(SourceOrigin::StaticSample));
        assert_eq!(service.snapshot().await.len(), 10);
    }

    #[tokio::test]
    async fn added_custom_food_appears_under_custom() {
        let service = service(Arc::new(MemoryStore::new()));
        service.reload().await;

        let food = service
            .add_custom_food(NewCustomFood {
                name: "Protein Shake".into(),
                calories: 120.0,
                ..Default::default()
            })
            .await
            .unwrap();

        let catalog = service.snapshot().await;
        let custom = catalog.filter_by_category("Custom");
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0], &food);
        assert!(custom[0].is_custom);
        assert_eq!(custom[0].category, "Custom");
        assert_eq!(catalog.len(), 11);
    }

    #[tokio::test]
    async fn delete_rebuilds_without_the_food() {
        let service = service(Arc::new(MemoryStore::new()));
        let food = service
            .add_custom_food(NewCustomFood {
                name: "Poha".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(service.snapshot().await.lookup_by_id(&food.id).is_some());

        service
            .delete_custom_food(&food.id, DeleteOptions::default())
            .await
            .unwrap();
        assert!(service.snapshot().await.lookup_by_id(&food.id).is_none());
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_published_catalog() {
        let service = service(Arc::new(MemoryStore::new()));
        let before = service.reload().await;

        let err = service
            .delete_custom_food("missing", DeleteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        assert_eq!(service.snapshot().await.foods(), before.foods());
    }

    #[tokio::test]
    async fn failed_diary_cascade_leaves_storage_and_catalog_agreeing() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());
        let food = service
            .add_custom_food(NewCustomFood {
                name: "Poha".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        // An entry without a timestamp makes today's log unreadable.
        let today = food_entries_key(OffsetDateTime::now_utc().date());
        storage::set_string(store.as_ref(), &today, r#"[{"id":"1","name":"Poha"}]"#)
            .await
            .unwrap();

        let opts = DeleteOptions {
            also_remove_from_diary: true,
        };
        let err = service.delete_custom_food(&food.id, opts).await.unwrap_err();
        assert!(matches!(err, CatalogError::PersistenceReadFailure { .. }));

        let stored = service.custom_foods().list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(service.snapshot().await.lookup_by_id(&food.id).is_some());
    }

    #[tokio::test]
    async fn refresh_drops_the_cached_dataset() {
        let store = Arc::new(MemoryStore::new());
        storage::set_string(store.as_ref(), CACHED_CSV_KEY, CACHED).await.unwrap();
        let service = service(store.clone());

        assert_eq!(service.reload().await.origin(), Some(SourceOrigin::Cache));
        let refreshed = service.refresh().await.unwrap();
        assert_eq!(refreshed.origin(), Some(SourceOrigin::StaticSample));
        assert!(storage::get_string(store.as_ref(), CACHED_CSV_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn import_merges_rows_as_custom_foods() {
        let service = service(Arc::new(MemoryStore::new()));
        let imported = service
            .import_custom_foods("name,category,calories\nIdli,breakfast,58\nVada,snack,97\n", None)
            .await
            .unwrap();
        assert_eq!(imported, 2);

        let catalog = service.snapshot().await;
        let custom = catalog.filter_by_category("Custom");
        assert_eq!(custom.len(), 2);
        assert!(custom.iter().all(|f| f.id.starts_with("imported_")));
        assert_eq!(catalog.query("Snacks", "vada").len(), 1);
    }

    #[tokio::test]
    async fn dish_table_import_lands_in_guessed_categories() {
        let service = service(Arc::new(MemoryStore::new()));
        let content = "Dish Name,Calories (kcal),Fibre (g)\nGinger tea,61.4,0.2\nPalak paneer,180,2.6\n";
        let imported = service
            .import_custom_foods(content, Some(ImportLayout::Dishes))
            .await
            .unwrap();
        assert_eq!(imported, 2);

        let catalog = service.snapshot().await;
        let tea = catalog.query("Beverages", "ginger")[0];
        assert!(tea.is_custom);
        assert_eq!(tea.calories, 61.0);
        let paneer = catalog.query("Lunch", "paneer")[0];
        assert_eq!(paneer.fiber, 3.0);
    }

    #[tokio::test]
    async fn empty_import_is_rejected() {
        let service = service(Arc::new(MemoryStore::new()));
        let err = service.import_custom_foods("name\n", None).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }
}
