//! Application use cases. Orchestrate domain logic via ports.

pub mod auth_service;
pub mod batch_importer;
pub mod dedup;
pub mod import_service;

pub use auth_service::AuthService;
pub use batch_importer::{BatchImporter, RunPhase};
pub use dedup::DedupFilter;
pub use import_service::ImportService;
