//! Ledger export as CSV. Uses the `csv` crate for quoting.

use crate::domain::{DomainError, LedgerEntry};
use std::path::Path;

const HEADER: [&str; 5] = ["rawPhone", "e164", "success", "errorMessage", "timestamp"];

/// Header plus one row per entry, in ledger order.
pub fn ledger_to_csv(entries: &[LedgerEntry]) -> Result<String, DomainError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(HEADER)
        .map_err(|e| DomainError::Io(e.to_string()))?;

    for entry in entries {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        wtr.write_record([
            entry.raw_phone.as_str(),
            entry.e164.as_deref().unwrap_or(""),
            if entry.success { "true" } else { "false" },
            entry.error_message.as_deref().unwrap_or(""),
            timestamp.as_str(),
        ])
        .map_err(|e| DomainError::Io(e.to_string()))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| DomainError::Io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DomainError::Io(e.to_string()))
}

pub async fn write_ledger_csv(path: &Path, entries: &[LedgerEntry]) -> Result<(), DomainError> {
    let csv = ledger_to_csv(entries)?;
    crate::adapters::persistence::report_json::write_atomic(path, csv.as_bytes()).await
}
