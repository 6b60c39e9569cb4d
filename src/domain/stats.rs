//! Aggregates: parse statistics for a scanned file and the per-run import report.

use crate::domain::entities::{OperationRecord, PhoneRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// `part / total * 100`, or 0 when `total` is 0.
pub fn success_rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Country calling code -> count, over valid records only.
fn country_histogram<'a>(records: impl Iterator<Item = &'a PhoneRecord>) -> BTreeMap<String, usize> {
    let mut map = BTreeMap::new();
    for cc in records.filter_map(PhoneRecord::country_code) {
        *map.entry(cc.to_string()).or_insert(0) += 1;
    }
    map
}

/// What a file looks like before anything is imported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub success_rate: f64,
    pub country_codes: BTreeMap<String, usize>,
}

impl ParseStats {
    pub fn from_records(records: &[PhoneRecord]) -> Self {
        let total = records.len();
        let valid = records.iter().filter(|r| r.is_valid()).count();
        Self {
            total,
            valid,
            invalid: total - valid,
            success_rate: success_rate(valid, total),
            country_codes: country_histogram(records.iter()),
        }
    }
}

/// Aggregate result of one import run. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success: bool,
    /// Run-level failure (auth, connection, bad settings).
    pub error: Option<String>,
    pub cancelled: bool,
    pub attempted: usize,
    pub successful: usize,
    pub failed: usize,
    /// Valid numbers dropped because they were already contacts or repeated in the input.
    pub skipped_existing: usize,
    pub batches_submitted: usize,
    pub success_rate: f64,
    /// Error strings, capped for display; `total_errors` has the full count.
    pub errors: Vec<String>,
    pub total_errors: usize,
    pub country_codes: BTreeMap<String, usize>,
}

impl ImportReport {
    /// Report over one run's ledger slice.
    pub fn from_operations(
        operations: &[OperationRecord],
        mut errors: Vec<String>,
        error_cap: usize,
    ) -> Self {
        let attempted = operations.len();
        let successful = operations.iter().filter(|op| op.success).count();
        let total_errors = errors.len();
        errors.truncate(error_cap);
        Self {
            success: attempted == 0 || successful > 0,
            error: None,
            cancelled: false,
            attempted,
            successful,
            failed: attempted - successful,
            skipped_existing: 0,
            batches_submitted: 0,
            success_rate: success_rate(successful, attempted),
            errors,
            total_errors,
            country_codes: country_histogram(operations.iter().map(|op| &op.phone)),
        }
    }

    /// A run that could not start or lost its connection.
    pub fn failed_run(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            error: Some(error.clone()),
            cancelled: false,
            attempted: 0,
            successful: 0,
            failed: 0,
            skipped_existing: 0,
            batches_submitted: 0,
            success_rate: 0.0,
            errors: vec![error],
            total_errors: 1,
            country_codes: BTreeMap::new(),
        }
    }

    /// Marks the report as failed with a run-level error, keeping partial counts.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalizer::Normalizer;
    use crate::domain::settings::FormattingOptions;

    #[test]
    fn test_success_rate_zero_total() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(1, 4), 25.0);
    }

    #[test]
    fn test_parse_stats() {
        let n = Normalizer::new("HK", FormattingOptions::default());
        let records: Vec<_> = ["91234567", "+1 202 555 0191", "abc", "61234567"]
            .iter()
            .map(|s| n.normalize(s))
            .collect();
        let stats = ParseStats::from_records(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.valid, 3);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.success_rate, 75.0);
        assert_eq!(stats.country_codes.get("+852"), Some(&2));
        assert_eq!(stats.country_codes.get("+1"), Some(&1));
    }

    #[test]
    fn test_report_from_empty_run() {
        let report = ImportReport::from_operations(&[], vec![], 20);
        assert!(report.success);
        assert_eq!(report.attempted, 0);
        assert_eq!(report.success_rate, 0.0);
    }

    #[test]
    fn test_report_caps_errors() {
        let n = Normalizer::new("HK", FormattingOptions::default());
        let ops: Vec<_> = (0..5)
            .map(|i| OperationRecord::failed(n.normalize(&format!("912345{:02}", i)), "user not found"))
            .collect();
        let errors = (0..5).map(|i| format!("err {}", i)).collect();
        let report = ImportReport::from_operations(&ops, errors, 2);
        assert!(!report.success);
        assert_eq!(report.failed, 5);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.total_errors, 5);
        assert_eq!(report.country_codes.get("+852"), Some(&5));
    }

    #[test]
    fn test_failed_run() {
        let report = ImportReport::failed_run("not authorized");
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("not authorized"));
    }
}
