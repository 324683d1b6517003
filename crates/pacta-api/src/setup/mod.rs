//! Application initialization: database, services, routes, server.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use anyhow::Result;
use axum::Router;
use std::sync::Arc;

use crate::state::AppState;
use pacta_core::Config;

/// Initialize the application: connect the database, run migrations, build
/// state (including the analysis worker pool), and assemble the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = database::setup_database(&config).await?;
    let state = services::build_state(config.clone(), pool).await?;
    let router = routes::setup_routes(&config, state.clone()).await?;
    Ok((state, router))
}
