//! Pacta database layer.
//!
//! Runtime-checked sqlx repositories over PostgreSQL, one per table. Row
//! structs implement `FromRow` and convert to the domain types from
//! `pacta-core`; status/type enums are stored as text and parsed on read.

pub mod db;

pub use db::analyses::AnalysisRepository;
pub use db::attachments::AttachmentRepository;
pub use db::contracts::{ContractFilters, ContractRepository};
pub use db::documents::{DocumentRepository, NewDocument};
pub use db::obligations::ObligationRepository;
pub use db::prefills::PrefillRepository;
pub use db::tenants::TenantRepository;
