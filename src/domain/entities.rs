//! Domain entities. Pure data structures for the core business.
//!
//! No Telegram or I/O types here; adapters map into these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const REASON_USER_NOT_FOUND: &str = "user not found";
pub const REASON_PRIVACY: &str = "privacy restriction";

/// One normalized input number. Only the normalizer builds these; fields are
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneRecord {
    raw: String,
    cleaned: String,
    e164: Option<String>,
    country_code: Option<String>,
    is_valid: bool,
    error_reason: Option<String>,
}

impl PhoneRecord {
    pub(crate) fn valid(raw: String, cleaned: String, e164: String, country_code: String) -> Self {
        Self {
            raw,
            cleaned,
            e164: Some(e164),
            country_code: Some(country_code),
            is_valid: true,
            error_reason: None,
        }
    }

    pub(crate) fn invalid(raw: String, cleaned: String, reason: String) -> Self {
        Self {
            raw,
            cleaned,
            e164: None,
            country_code: None,
            is_valid: false,
            error_reason: Some(reason),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    pub fn e164(&self) -> Option<&str> {
        self.e164.as_deref()
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn error_reason(&self) -> Option<&str> {
        self.error_reason.as_deref()
    }

    /// Last four digits of the E.164 form (or of the cleaned text for invalid records).
    pub fn last4(&self) -> &str {
        let s = self.e164.as_deref().unwrap_or(&self.cleaned);
        let start = s
            .char_indices()
            .rev()
            .nth(3)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &s[start..]
    }
}

/// One contact as sent to the remote service. `client_id` is the index of the
/// record inside its batch; the service echoes it back for accepted contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub client_id: i64,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
}

/// A contact the service explicitly refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRejection {
    pub client_id: i64,
    pub reason: String,
}

/// Result of one bulk-import call. Entries in neither list were not accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: Vec<i64>,
    pub rejected: Vec<RecordRejection>,
}

/// An ordered, size-bounded group of valid records submitted in one call.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    /// 1-based position in the run.
    pub number: usize,
    pub records: Vec<PhoneRecord>,
    pub name_prefix: String,
}

impl ImportBatch {
    /// Contacts to submit: `"<prefix> <last4>"` as first name, empty last name.
    pub fn entries(&self) -> Vec<ContactEntry> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                r.e164().map(|e164| ContactEntry {
                    client_id: i as i64,
                    phone: e164.to_string(),
                    first_name: format!("{} {}", self.name_prefix, r.last4()),
                    last_name: String::new(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// How one batch went.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub batch_number: usize,
    /// One entry per batch position, in submission order. `None` means imported,
    /// `Some(reason)` means failed.
    pub results: Vec<(PhoneRecord, Option<String>)>,
    /// Set when the service demanded a pause before the next call.
    pub retry_after_seconds: Option<u64>,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_none()).count()
    }

    pub fn fail_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PhoneRecord, &str)> {
        self.results
            .iter()
            .filter_map(|(record, reason)| reason.as_deref().map(|r| (record, r)))
    }
}

/// Per-number outcome, appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub phone: PhoneRecord,
    pub success: bool,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OperationRecord {
    pub fn succeeded(phone: PhoneRecord) -> Self {
        Self {
            phone,
            success: true,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(phone: PhoneRecord, error: impl Into<String>) -> Self {
        Self {
            phone,
            success: false,
            error_message: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    RunStarted { records: usize, batches: usize },
    BatchStarted { number: usize, size: usize },
    BatchFinished { number: usize, imported: usize, failed: usize },
    RateLimited { number: usize, wait_seconds: u64 },
    RunFinished { successful: usize, failed: usize, cancelled: bool },
}

/// Outcome of submitting a login code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInResult {
    Success,
    /// Account has 2FA enabled; a password is needed.
    PasswordRequired { hint: Option<String> },
}
