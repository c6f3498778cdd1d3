//! Resolution of the bundled nutrition dataset.
//!
//! Origins are tried in strict priority order: the on-device cache, then each
//! configured [`DatasetSource`] (bundled asset, remote fetch), then the static
//! sample compiled into the binary. The resolver never fails; the worst case
//! is the static sample.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::DatasetConfig,
    error::CatalogError,
    storage::{self, KvStore, CACHED_CSV_KEY},
};

use super::{
    model::FoodRecord,
    normalize::{normalize_row, FoodFields},
    parser::parse_rows,
};

/// Ten-row dataset used when nothing else is available. Never cached.
pub const STATIC_SAMPLE: &str = "Dish Name,Category,Serving,Quantity,Calories (kcal),Carbohydrates (g),Protein (g),Fats (g)
Rice,Grains,Bowl,1 cup,200,45,4,0.5
Chicken Curry,Protein,Plate,1 serving,300,10,30,15
Vegetable Salad,Vegetables,Bowl,1 bowl,50,10,3,2
Chapati,Grains,Piece,1 piece,120,25,3,1
Dal Tadka,Protein,Bowl,1 bowl,180,20,12,6
Paneer Butter Masala,Protein,Plate,100g,265,8,18,20
Biryani,Mixed,Plate,1 plate,400,50,15,18
Samosa,Snacks,Piece,1 piece,150,18,3,8
Mango Lassi,Beverages,Glass,1 glass,120,20,8,4
Masala Chai,Beverages,Cup,1 cup,50,8,2,2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    Cache,
    BundledAsset,
    Remote,
    StaticSample,
}

impl SourceOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceOrigin::Cache => "cache",
            SourceOrigin::BundledAsset => "bundled_asset",
            SourceOrigin::Remote => "remote",
            SourceOrigin::StaticSample => "static_sample",
        }
    }
}

/// Parsed dataset plus the origin it came from.
#[derive(Debug, Clone)]
pub struct ResolvedDataset {
    pub origin: SourceOrigin,
    pub foods: Vec<FoodRecord>,
}

/// Parses and normalizes dataset text. Ids are 1-based row positions.
pub fn parse_dataset(content: &str, origin: SourceOrigin) -> Result<Vec<FoodRecord>, CatalogError> {
    let rows = parse_rows(content)?;
    if rows.is_empty() {
        return Err(CatalogError::ZeroRecordsParsed(origin.as_str()));
    }
    Ok(rows
        .iter()
        .enumerate()
        .map(|(i, row)| FoodRecord::new((i + 1).to_string(), normalize_row(row), false))
        .collect())
}

pub fn static_sample() -> ResolvedDataset {
    let foods = match parse_dataset(STATIC_SAMPLE, SourceOrigin::StaticSample) {
        Ok(foods) => foods,
        Err(e) => {
            warn!(error = %e, "static sample failed to parse; using single record");
            let mut rice = FoodFields::named("Rice");
            rice.category = "Grains".into();
            rice.serving = "Bowl".into();
            rice.quantity = "1 cup".into();
            rice.calories = 200.0;
            rice.carbohydrates = 45.0;
            rice.protein = 4.0;
            rice.fats = 0.5;
            vec![FoodRecord::new("1", rice, false)]
        }
    };
    ResolvedDataset {
        origin: SourceOrigin::StaticSample,
        foods,
    }
}

/// Raw dataset text kept in the key-value store under [`CACHED_CSV_KEY`].
#[derive(Clone)]
pub struct DatasetCache {
    store: Arc<dyn KvStore>,
}

impl DatasetCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Cached content, if present and non-empty. Read failures count as a miss.
    pub async fn get(&self) -> Option<String> {
        match storage::get_string(self.store.as_ref(), CACHED_CSV_KEY).await {
            Ok(Some(content)) if !content.trim().is_empty() => Some(content),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "could not read cached dataset");
                None
            }
        }
    }

    pub async fn set(&self, content: &str) -> Result<(), CatalogError> {
        storage::set_string(self.store.as_ref(), CACHED_CSV_KEY, content)
            .await
            .map_err(|e| CatalogError::write_failure(CACHED_CSV_KEY, e))
    }

    pub async fn invalidate(&self) -> Result<(), CatalogError> {
        self.store
            .remove(CACHED_CSV_KEY)
            .await
            .map_err(|e| CatalogError::write_failure(CACHED_CSV_KEY, e))
    }
}

/// An origin that can produce raw dataset text.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    fn origin(&self) -> SourceOrigin;
    async fn fetch(&self) -> Result<String, CatalogError>;
}

/// Dataset file shipped alongside the binary.
pub struct BundledAsset {
    path: PathBuf,
}

impl BundledAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for BundledAsset {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::BundledAsset
    }

    async fn fetch(&self) -> Result<String, CatalogError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CatalogError::SourceUnavailable {
                origin: self.origin().as_str(),
                reason: format!("{}: {}", self.path.display(), e),
            }
        })?;
        if content.trim().is_empty() {
            return Err(CatalogError::SourceUnavailable {
                origin: self.origin().as_str(),
                reason: format!("{} is empty", self.path.display()),
            });
        }
        debug!(path = %self.path.display(), len = content.len(), "loaded bundled dataset");
        Ok(content)
    }
}

/// Static dataset served over HTTP; candidate paths are tried in order.
pub struct RemoteDataset {
    client: reqwest::Client,
    base_url: reqwest::Url,
    paths: Vec<String>,
}

impl RemoteDataset {
    pub fn new(base_url: &str, paths: Vec<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Self::with_client(client, base_url, paths)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        paths: Vec<String>,
    ) -> anyhow::Result<Self> {
        let base_url = reqwest::Url::parse(base_url)?;
        Ok(Self {
            client,
            base_url,
            paths,
        })
    }
}

#[async_trait]
impl DatasetSource for RemoteDataset {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Remote
    }

    async fn fetch(&self) -> Result<String, CatalogError> {
        for path in &self.paths {
            let url = match self.base_url.join(path) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, %path, "invalid dataset path");
                    continue;
                }
            };

            let response = match self.client.get(url.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!(error = %e, %url, "dataset fetch failed");
                    continue;
                }
            };

            if !response.status().is_success() {
                debug!(status = %response.status(), %url, "dataset fetch not ok");
                continue;
            }

            match response.text().await {
                Ok(content) if !content.trim().is_empty() => {
                    debug!(%url, len = content.len(), "fetched remote dataset");
                    return Ok(content);
                }
                Ok(_) => debug!(%url, "remote dataset empty"),
                Err(e) => debug!(error = %e, %url, "reading dataset body failed"),
            }
        }

        Err(CatalogError::SourceUnavailable {
            origin: self.origin().as_str(),
            reason: format!("no candidate path succeeded under {}", self.base_url),
        })
    }
}

pub struct SourceResolver {
    cache: DatasetCache,
    sources: Vec<Box<dyn DatasetSource>>,
}

impl SourceResolver {
    pub fn new(cache: DatasetCache, sources: Vec<Box<dyn DatasetSource>>) -> Self {
        Self { cache, sources }
    }

    /// Bundled asset first, then the remote fetch when a base URL is configured.
    pub fn from_config(cache: DatasetCache, config: &DatasetConfig) -> anyhow::Result<Self> {
        let mut sources: Vec<Box<dyn DatasetSource>> =
            vec![Box::new(BundledAsset::new(config.asset_path.clone()))];
        if let Some(base_url) = &config.remote_base_url {
            sources.push(Box::new(RemoteDataset::new(
                base_url,
                config.remote_paths.clone(),
            )?));
        }
        Ok(Self::new(cache, sources))
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    pub async fn resolve(&self) -> ResolvedDataset {
        if let Some(content) = self.cache.get().await {
            match parse_dataset(&content, SourceOrigin::Cache) {
                Ok(foods) => {
                    info!(count = foods.len(), "dataset loaded from cache");
                    return ResolvedDataset {
                        origin: SourceOrigin::Cache,
                        foods,
                    };
                }
                Err(e) => {
                    // Cached text may be corrupt; sources 2-3 are not retried this call.
                    warn!(error = %e, "cached dataset unusable; purging cache");
                    if let Err(e) = self.cache.invalidate().await {
                        warn!(error = %e, "could not purge cached dataset");
                    }
                    return static_sample();
                }
            }
        }

        for source in &self.sources {
            let origin = source.origin();
            let content = match source.fetch().await {
                Ok(content) => content,
                Err(e) => {
                    warn!(error = %e, origin = origin.as_str(), "dataset source failed");
                    continue;
                }
            };

            match parse_dataset(&content, origin) {
                Ok(foods) => {
                    if let Err(e) = self.cache.set(&content).await {
                        warn!(error = %e, "could not cache dataset");
                    }
                    info!(count = foods.len(), origin = origin.as_str(), "dataset loaded");
                    return ResolvedDataset { origin, foods };
                }
                Err(e) => {
                    warn!(error = %e, origin = origin.as_str(), "dataset did not parse");
                }
            }
        }

        warn!("all dataset sources failed; using static sample");
        static_sample()
    }
}
