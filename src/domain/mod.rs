//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod ledger;
pub mod normalizer;
pub mod numbering;
pub mod scanner;
pub mod settings;
pub mod stats;

pub use entities::{
    BatchOutcome, ContactEntry, ImportBatch, ImportEvent, ImportResponse, OperationRecord,
    PhoneRecord, RecordRejection, SignInResult,
};
pub use errors::{DomainError, ParseError};
pub use ledger::{LedgerEntry, OperationLedger, OperationSummary};
pub use normalizer::Normalizer;
pub use scanner::{Candidate, FileScanner};
pub use settings::{FormattingOptions, RunConfig};
pub use stats::{ImportReport, ParseStats};
