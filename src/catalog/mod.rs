pub mod dto;
pub mod handlers;
pub mod import;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod service;
pub mod source;

use crate::state::AppState;
use axum::Router;

pub use service::CatalogService;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_router())
        .merge(handlers::write_router())
}
