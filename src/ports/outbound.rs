//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    ContactEntry, DomainError, ImportEvent, ImportResponse, LedgerEntry, SignInResult,
};

/// Remote contact service (Telegram). One instance = one authorized session;
/// never share it between concurrent runs.
#[async_trait::async_trait]
pub trait ContactGateway: Send + Sync {
    /// Open/verify the connection. `Ok(false)` means reachable but not usable
    /// (e.g. not authorized).
    async fn connect(&self) -> Result<bool, DomainError>;

    async fn is_authenticated(&self) -> Result<bool, DomainError>;

    /// E.164 numbers of the account's existing contacts.
    async fn list_contacts(&self) -> Result<Vec<String>, DomainError>;

    /// Import one batch atomically (one remote call).
    ///
    /// Throttling is reported as `DomainError::FloodWait { seconds }`; any other
    /// error is a batch-level transport failure.
    async fn import_batch(&self, contacts: &[ContactEntry]) -> Result<ImportResponse, DomainError>;
}

/// Login capability. Drives phone code / 2FA against the remote service.
#[async_trait::async_trait]
pub trait AuthPort: Send + Sync {
    async fn is_authenticated(&self) -> Result<bool, DomainError>;

    async fn request_login_code(&self, phone: &str, api_hash: &str) -> Result<(), DomainError>;

    async fn sign_in(&self, code: &str) -> Result<SignInResult, DomainError>;

    async fn check_password(&self, password: &[u8]) -> Result<(), DomainError>;
}

/// Durable sink for ledger entries (append-only).
#[async_trait::async_trait]
pub trait LedgerSink: Send + Sync {
    async fn append(&self, entries: &[LedgerEntry]) -> Result<(), DomainError>;

    /// All stored entries, oldest first.
    async fn load(&self) -> Result<Vec<LedgerEntry>, DomainError>;
}

/// Receives progress events from a running import. Must not block.
pub trait ImportObserver: Send + Sync {
    fn on_event(&self, event: &ImportEvent);
}
