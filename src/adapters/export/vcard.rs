//! vCard 3.0 export of parsed numbers, for importing into a phone's address book.

use crate::domain::{DomainError, PhoneRecord};
use std::fmt::Write as _;
use std::path::Path;

/// One card per valid record, named `"<prefix> <last4>"`. Invalid records are skipped.
pub fn records_to_vcard(records: &[PhoneRecord], name_prefix: &str) -> String {
    let mut out = String::new();
    for r in records {
        let Some(e164) = r.e164() else { continue };
        let last4 = r.last4();
        // Infallible for String.
        let _ = write!(
            out,
            "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:{} {}\r\nN:{};{};;;\r\nTEL;TYPE=CELL:{}\r\nEND:VCARD\r\n",
            escape(name_prefix),
            last4,
            last4,
            escape(name_prefix),
            e164
        );
    }
    out
}

/// Backslash-escape the characters vCard treats as separators.
fn escape(value: &str) -> String {
    let mut s = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | ',' | ';' => {
                s.push('\\');
                s.push(c);
            }
            '\n' => s.push_str("\\n"),
            _ => s.push(c),
        }
    }
    s
}

/// Returns how many cards were written.
pub async fn write_vcard(
    path: &Path,
    records: &[PhoneRecord],
    name_prefix: &str,
) -> Result<usize, DomainError> {
    let count = records.iter().filter(|r| r.is_valid()).count();
    if count == 0 {
        return Err(DomainError::InvalidInput("no valid phone numbers to export".into()));
    }
    let body = records_to_vcard(records, name_prefix);
    crate::adapters::persistence::report_json::write_atomic(path, body.as_bytes()).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FormattingOptions, Normalizer};

    #[test]
    fn test_cards_for_valid_records_only() {
        let n = Normalizer::new("HK", FormattingOptions::default());
        let records = vec![n.normalize("9123 4567"), n.normalize("abc")];
        let vcf = records_to_vcard(&records, "Lead");
        assert_eq!(vcf.matches("BEGIN:VCARD").count(), 1);
        assert!(vcf.contains("FN:Lead 4567\r\n"));
        assert!(vcf.contains("N:4567;Lead;;;\r\n"));
        assert!(vcf.contains("TEL;TYPE=CELL:+85291234567\r\n"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a;b,c"), "a\\;b\\,c");
    }

    #[tokio::test]
    async fn test_write_vcard_refuses_empty() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_vcard(&dir.path().join("c.vcf"), &[], "Contact")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
