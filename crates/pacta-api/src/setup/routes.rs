//! Route configuration and setup

pub mod health;

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, AuthState};
use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use pacta_core::Config;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub async fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        tenant_repository: state.db.tenant_repository.clone(),
    });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .with_state(state.clone());

    // Protected routes (require a tenant API key)
    let protected_routes = Router::new()
        .route(
            "/api/v1/documents",
            post(handlers::documents::upload_document).get(handlers::documents::list_documents),
        )
        .route(
            "/api/v1/documents/{id}",
            get(handlers::documents::get_document).patch(handlers::documents::update_document),
        )
        .route(
            "/api/v1/contracts",
            get(handlers::contracts::list_contracts).post(handlers::contracts::create_contract),
        )
        .route(
            "/api/v1/contracts/{id}",
            get(handlers::contracts::get_contract).patch(handlers::contracts::update_contract),
        )
        .route(
            "/api/v1/contracts/{id}/obligations",
            get(handlers::obligations::list_obligations)
                .post(handlers::obligations::create_obligation)
                .put(handlers::obligations::replace_obligations),
        )
        .route(
            "/api/v1/contracts/{id}/documents",
            get(handlers::attachments::list_attachments)
                .post(handlers::attachments::attach_document),
        )
        .route(
            "/api/v1/contracts/upload/analyze/{document_id}",
            post(handlers::analysis::start_analysis),
        )
        .route(
            "/api/v1/contracts/upload/analysis/{analysis_id}",
            get(handlers::analysis::get_analysis),
        )
        .route(
            "/api/v1/contracts/prefill",
            post(handlers::prefills::create_prefill),
        )
        .route(
            "/api/v1/contracts/prefill/{id}",
            get(handlers::prefills::get_prefill),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state.clone());

    // Leave headroom above the file ceiling for multipart framing and fields
    let body_limit = state.documents.max_file_size + 1024 * 1024;

    let app = public_routes
        .merge(protected_routes)
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware));

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let origins = config.cors_origins();

    let cors = if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::PUT,
                Method::DELETE,
            ])
            .allow_headers(Any)
    } else {
        let parsed: Result<Vec<HeaderValue>, _> =
            origins.iter().map(|o| o.parse::<HeaderValue>()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed?))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::PUT,
                Method::DELETE,
            ])
            .allow_headers(Any)
    };

    Ok(cors)
}
