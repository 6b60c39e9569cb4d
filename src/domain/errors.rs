//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Fatal to a run: no batch is submitted when the session is not authorized.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    /// Existing-contact lookup failed. Callers degrade to importing without dedup.
    #[error("Contact lookup failed: {0}")]
    Lookup(String),

    /// Batch-level failure that is not a rate limit (network, RPC error, etc).
    #[error("Batch transport error: {0}")]
    Transport(String),

    /// FloodWait: the server refuses further calls for `seconds` seconds.
    #[error("FloodWait: retry after {seconds} seconds")]
    FloodWait { seconds: u64 },

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Why a candidate string is not a valid phone number. The `Display` text is the
/// `error_reason` stored on the invalid record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty")]
    Empty,

    #[error("not a number: {0}")]
    NotANumber(String),

    #[error("invalid country code")]
    InvalidCountryCode,

    #[error("invalid default region {0}")]
    UnknownRegion(String),

    #[error("too short")]
    TooShort,

    #[error("too long")]
    TooLong,

    #[error("number not in an assigned range for +{0}")]
    NotAssigned(u16),
}
