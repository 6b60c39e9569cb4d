//! Operation ledger: append-only history of per-number outcomes.

use crate::domain::entities::OperationRecord;
use crate::domain::stats::success_rate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many recent operations `summary()` carries.
const LATEST_OPERATIONS: usize = 10;

/// Flat export shape of one ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub raw_phone: String,
    pub e164: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&OperationRecord> for LedgerEntry {
    fn from(op: &OperationRecord) -> Self {
        Self {
            raw_phone: op.phone.raw().to_string(),
            e164: op.phone.e164().map(String::from),
            success: op.success,
            error_message: op.error_message.clone(),
            timestamp: op.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    pub total_operations: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub latest: Vec<LedgerEntry>,
}

/// In-memory ledger. Records can be appended and read, never changed or removed.
#[derive(Debug, Default, Clone)]
pub struct OperationLedger {
    records: Vec<OperationRecord>,
}

impl OperationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: OperationRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = OperationRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Records appended at or after `start` (e.g. one run's slice).
    pub fn since(&self, start: usize) -> &[OperationRecord] {
        &self.records[start.min(self.records.len())..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ordered export, oldest first.
    pub fn export(&self) -> Vec<LedgerEntry> {
        self.records.iter().map(LedgerEntry::from).collect()
    }

    pub fn summary(&self) -> OperationSummary {
        let total = self.records.len();
        let successful = self.records.iter().filter(|r| r.success).count();
        let latest = self
            .records
            .iter()
            .skip(total.saturating_sub(LATEST_OPERATIONS))
            .map(LedgerEntry::from)
            .collect();
        OperationSummary {
            total_operations: total,
            successful,
            failed: total - successful,
            success_rate: success_rate(successful, total),
            latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalizer::Normalizer;
    use crate::domain::settings::FormattingOptions;

    fn record(n: &str) -> crate::domain::PhoneRecord {
        Normalizer::new("HK", FormattingOptions::default()).normalize(n)
    }

    #[test]
    fn test_empty_summary() {
        let s = OperationLedger::new().summary();
        assert_eq!(s.total_operations, 0);
        assert_eq!(s.success_rate, 0.0);
        assert!(s.latest.is_empty());
    }

    #[test]
    fn test_summary_counts_and_latest() {
        let mut ledger = OperationLedger::new();
        for i in 0..12 {
            let phone = record(&format!("9123 45{:02}", i));
            if i % 3 == 0 {
                ledger.append(OperationRecord::failed(phone, "user not found"));
            } else {
                ledger.append(OperationRecord::succeeded(phone));
            }
        }
        let s = ledger.summary();
        assert_eq!(s.total_operations, 12);
        assert_eq!(s.failed, 4);
        assert_eq!(s.successful, 8);
        assert_eq!(s.latest.len(), 10);
        assert_eq!(s.latest[9].e164.as_deref(), Some("+85291234511"));
    }

    #[test]
    fn test_export_shape() {
        let mut ledger = OperationLedger::new();
        ledger.append(OperationRecord::failed(record("9123 4567"), "privacy restriction"));
        let entries = ledger.export();
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["rawPhone"], "9123 4567");
        assert_eq!(json["e164"], "+85291234567");
        assert_eq!(json["success"], false);
        assert_eq!(json["errorMessage"], "privacy restriction");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_since() {
        let mut ledger = OperationLedger::new();
        ledger.append(OperationRecord::succeeded(record("91234567")));
        ledger.append(OperationRecord::succeeded(record("61234567")));
        assert_eq!(ledger.since(1).len(), 1);
        assert!(ledger.since(5).is_empty());
    }
}
