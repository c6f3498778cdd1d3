use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

/// Errors raised by the food catalog pipeline and its stores.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The header row has no column matching any alias of a mandatory column.
    #[error("required column `{column}` not found (headers: {headers:?})")]
    MissingRequiredColumn {
        column: &'static str,
        headers: Vec<String>,
    },

    /// A dataset origin could not produce content (missing asset, non-2xx fetch, empty cache).
    #[error("dataset source `{origin}` unavailable: {reason}")]
    SourceUnavailable { origin: &'static str, reason: String },

    /// Content was present but parsed to no records.
    #[error("dataset from `{0}` parsed to zero records")]
    ZeroRecordsParsed(&'static str),

    #[error("failed to persist `{key}`: {reason}")]
    PersistenceWriteFailure { key: String, reason: String },

    #[error("failed to read `{key}`: {reason}")]
    PersistenceReadFailure { key: String, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

impl CatalogError {
    pub(crate) fn write_failure(key: &str, e: impl std::fmt::Display) -> Self {
        Self::PersistenceWriteFailure {
            key: key.to_string(),
            reason: e.to_string(),
        }
    }

    pub(crate) fn read_failure(key: &str, e: impl std::fmt::Display) -> Self {
        Self::PersistenceReadFailure {
            key: key.to_string(),
            reason: e.to_string(),
        }
    }
}

impl CatalogError {
    pub fn status(&self) -> StatusCode {
        match self {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Validation(_)
            | CatalogError::MissingRequiredColumn { .. }
            | CatalogError::ZeroRecordsParsed(_) => StatusCode::BAD_REQUEST,
            CatalogError::SourceUnavailable { .. } => StatusCode::BAD_GATEWAY,
            CatalogError::PersistenceWriteFailure { .. }
            | CatalogError::PersistenceReadFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CatalogError> for (StatusCode, String) {
    fn from(e: CatalogError) -> Self {
        let status = e.status();
        if status.is_server_error() {
            error!(error = %e, "request failed");
        }
        (status, e.to_string())
    }
}
