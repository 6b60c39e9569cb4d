//! Implements LedgerSink. One JSON object per line, append-only.
//! `tail` reads backwards from EOF so the stats screen does not scan the whole history.

use crate::domain::{DomainError, LedgerEntry};
use crate::ports::LedgerSink;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

const REVERSE_READ_BLOCK: u64 = 4096;

pub struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Up to `n` most recent entries, oldest first.
    pub async fn tail(&self, n: usize) -> Result<Vec<LedgerEntry>, DomainError> {
        let mut lines = read_lines_reverse(&self.path, n).await?;
        lines.reverse();
        Ok(parse_lines(lines.iter().map(String::as_str)))
    }
}

fn parse_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<LedgerEntry> {
    lines
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| match serde_json::from_str::<LedgerEntry>(l) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping malformed ledger line");
                None
            }
        })
        .collect()
}

/// Last `max_lines` non-empty lines, newest first.
async fn read_lines_reverse(path: &Path, max_lines: usize) -> Result<Vec<String>, DomainError> {
    let mut f = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(DomainError::Ledger(e.to_string())),
    };
    let mut pos = f
        .metadata()
        .await
        .map_err(|e| DomainError::Ledger(e.to_string()))?
        .len();

    let mut lines: Vec<String> = Vec::new();
    let mut pending: Vec<u8> = Vec::new();
    while lines.len() < max_lines && pos > 0 {
        let start = pos.saturating_sub(REVERSE_READ_BLOCK);
        f.seek(SeekFrom::Start(start))
            .await
            .map_err(|e| DomainError::Ledger(e.to_string()))?;
        let mut buf = vec![0u8; (pos - start) as usize];
        f.read_exact(&mut buf)
            .await
            .map_err(|e| DomainError::Ledger(e.to_string()))?;
        pos = start;
        buf.append(&mut pending);

        while lines.len() < max_lines {
            let Some(nl) = buf.iter().rposition(|&b| b == b'\n') else {
                break;
            };
            let line = buf.split_off(nl + 1);
            buf.pop();
            if !line.iter().all(u8::is_ascii_whitespace) {
                lines.push(String::from_utf8_lossy(&line).into_owned());
            }
        }
        pending = buf;
    }
    if lines.len() < max_lines && !pending.iter().all(u8::is_ascii_whitespace) {
        lines.push(String::from_utf8_lossy(&pending).into_owned());
    }
    Ok(lines)
}

#[async_trait::async_trait]
impl LedgerSink for JsonlLedger {
    async fn append(&self, entries: &[LedgerEntry]) -> Result<(), DomainError> {
        if entries.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Ledger(e.to_string()))?;
        }
        let mut buf = String::new();
        for entry in entries {
            let line = serde_json::to_string(entry).map_err(|e| DomainError::Ledger(e.to_string()))?;
            buf.push_str(&line);
            buf.push('\n');
        }
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| DomainError::Ledger(e.to_string()))?;
        f.write_all(buf.as_bytes())
            .await
            .map_err(|e| DomainError::Ledger(e.to_string()))?;
        f.flush()
            .await
            .map_err(|e| DomainError::Ledger(e.to_string()))?;
        debug!(path = %self.path.display(), count = entries.len(), "appended ledger entries");
        Ok(())
    }

    async fn load(&self) -> Result<Vec<LedgerEntry>, DomainError> {
        match fs::read_to_string(&self.path).await {
            Ok(s) => Ok(parse_lines(s.lines())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(DomainError::Ledger(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(n: usize, success: bool) -> LedgerEntry {
        LedgerEntry {
            raw_phone: format!("9123 {:04}", n),
            e164: Some(format!("+8529123{:04}", n)),
            success,
            error_message: (!success).then(|| "user not found".to_string()),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonlLedger::new(dir.path().join("ledger.jsonl"));
        assert!(ledger.load().await.unwrap().is_empty());
        assert!(ledger.tail(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_is_cumulative_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonlLedger::new(dir.path().join("nested/ledger.jsonl"));
        ledger.append(&[entry(1, true), entry(2, false)]).await.unwrap();
        ledger.append(&[entry(3, true)]).await.unwrap();

        let all = ledger.load().await.unwrap();
        let phones: Vec<_> = all.iter().map(|e| e.raw_phone.as_str()).collect();
        assert_eq!(phones, vec!["9123 0001", "9123 0002", "9123 0003"]);
        assert_eq!(all[1].error_message.as_deref(), Some("user not found"));
    }

    #[tokio::test]
    async fn test_tail_spans_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonlLedger::new(dir.path().join("ledger.jsonl"));
        let entries: Vec<_> = (0..300).map(|i| entry(i, i % 2 == 0)).collect();
        ledger.append(&entries).await.unwrap();

        let tail = ledger.tail(10).await.unwrap();
        assert_eq!(tail.len(), 10);
        assert_eq!(tail[0].raw_phone, "9123 0290");
        assert_eq!(tail[9].raw_phone, "9123 0299");
        assert_eq!(ledger.tail(1000).await.unwrap().len(), 300);
    }
}
