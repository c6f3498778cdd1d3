use std::path::PathBuf;

const DEFAULT_REMOTE_PATHS: &str =
    "/assets/FoodSheet.csv,/assets/foodsheet.csv,./assets/FoodSheet.csv,../assets/FoodSheet.csv";

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub asset_path: PathBuf,
    /// Enables the remote fetch when set.
    pub remote_base_url: Option<String>,
    pub remote_paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub dataset: DatasetConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://foodvault.db".into());
        let dataset = DatasetConfig {
            asset_path: std::env::var("DATASET_PATH")
                .unwrap_or_else(|_| "assets/FoodSheet.csv".into())
                .into(),
            remote_base_url: std::env::var("DATASET_REMOTE_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            remote_paths: parse_paths(
                &std::env::var("DATASET_REMOTE_PATHS")
                    .unwrap_or_else(|_| DEFAULT_REMOTE_PATHS.into()),
            ),
        };
        Self {
            database_url,
            dataset,
        }
    }
}

fn parse_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
