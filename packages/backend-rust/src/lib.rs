pub mod config;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use shuxue_algo::Catalog;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::seed::SeedError;
use crate::state::AppState;

/// Build the application from environment configuration.
pub async fn create_app() -> Result<axum::Router, SeedError> {
    let config = Config::from_env();
    let catalog = seed::load_catalog(config.catalog_path.as_deref()).await?;
    Ok(create_app_with(config, catalog))
}

pub fn create_app_with(config: Config, catalog: Catalog) -> axum::Router {
    let state = AppState::new(config, catalog);

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
