//! File-backed persistence: ledger history and run reports.

pub mod jsonl_ledger;
pub mod report_json;

pub use jsonl_ledger::JsonlLedger;
pub use report_json::ReportWriter;
