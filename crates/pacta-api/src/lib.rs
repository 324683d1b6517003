//! Pacta REST API.
//!
//! Axum handlers for the document/contract surface, API-key tenancy, the
//! background analysis queue wiring, and OpenAPI docs. The binary in
//! `main.rs` is a thin shell over [`setup::initialize_app`]; integration
//! tests build the same router against a containerized database.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod setup;
pub mod state;
pub mod telemetry;
