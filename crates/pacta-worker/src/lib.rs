//! Background analysis infrastructure for Pacta.
//!
//! The API creates `PENDING` analysis rows; the [`AnalysisQueue`] worker
//! pool claims them, drives the extraction provider, and records terminal
//! states with retry/backoff in between.

pub mod context;
pub mod queue;
pub mod suggest;

pub use context::AnalysisContext;
pub use queue::{process_one, AnalysisQueue, AnalysisQueueConfig};
