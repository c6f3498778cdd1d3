use crate::catalog::{
    source::{DatasetCache, SourceResolver},
    CatalogService,
};
use crate::config::{AppConfig, DatasetConfig};
use crate::custom_foods::CustomFoodStore;
use crate::diary::DiaryStore;
use crate::storage::{KvStore, MemoryStore, SqliteStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<CatalogService>,
    pub diary: DiaryStore,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env());

        let db = crate::db::connect(&config.database_url).await?;
        let store = Arc::new(SqliteStore::new(db)) as Arc<dyn KvStore>;

        let state = Self::from_parts(config, store)?;
        state.catalog.reload().await;
        Ok(state)
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let diary = DiaryStore::new(store.clone());
        let resolver = SourceResolver::from_config(DatasetCache::new(store.clone()), &config.dataset)?;
        let custom_foods = CustomFoodStore::new(store, diary.clone());
        let catalog = Arc::new(CatalogService::new(resolver, custom_foods));

        Ok(Self {
            config,
            catalog,
            diary,
        })
    }

    /// In-memory state with no dataset file, so the catalog resolves to the static sample.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            dataset: DatasetConfig {
                asset_path: "does/not/exist/FoodSheet.csv".into(),
                remote_base_url: None,
                remote_paths: Vec::new(),
            },
        });

        let store = Arc::new(MemoryStore::new()) as Arc<dyn KvStore>;
        Self::from_parts(config, store).expect("fake state builds")
    }
}
