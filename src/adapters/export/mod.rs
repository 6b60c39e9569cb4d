//! Ledger and address-book exports.

pub mod csv_export;
pub mod vcard;

pub use csv_export::{ledger_to_csv, write_ledger_csv};
pub use vcard::{records_to_vcard, write_vcard};
