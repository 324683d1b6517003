pub mod analyses;
pub mod attachments;
pub mod contracts;
pub mod documents;
pub mod obligations;
pub mod prefills;
pub mod tenants;
