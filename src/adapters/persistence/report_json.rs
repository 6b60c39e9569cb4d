//! Writes run reports and ledger exports as pretty JSON.
//!
//! Write-replace: temp file, `sync_all`, then rename over the target, so a
//! crash mid-write never leaves a truncated report behind.

use crate::domain::{DomainError, ImportReport, LedgerEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunFile<'a> {
    finished_at: DateTime<Utc>,
    report: &'a ImportReport,
    operations: &'a [LedgerEntry],
}

pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// `import-<timestamp>.json` with the report and that run's ledger entries.
    pub async fn write_run(
        &self,
        report: &ImportReport,
        operations: &[LedgerEntry],
    ) -> Result<PathBuf, DomainError> {
        let finished_at = Utc::now();
        let path = self
            .dir
            .join(format!("import-{}.json", finished_at.format("%Y%m%d-%H%M%S")));
        let body = RunFile {
            finished_at,
            report,
            operations,
        };
        let json = serde_json::to_string_pretty(&body).map_err(|e| DomainError::Io(e.to_string()))?;
        write_atomic(&path, json.as_bytes()).await?;
        info!(path = %path.display(), "wrote import report");
        Ok(path)
    }
}

pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DomainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::Io(format!("create directory: {}", e)))?;
    }
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    let mut f = fs::File::create(&temp_path)
        .await
        .map_err(|e| DomainError::Io(format!("create temp file: {}", e)))?;
    f.write_all(contents)
        .await
        .map_err(|e| DomainError::Io(format!("write temp file: {}", e)))?;
    f.sync_all()
        .await
        .map_err(|e| DomainError::Io(format!("sync temp file: {}", e)))?;
    drop(f);
    fs::rename(&temp_path, path)
        .await
        .map_err(|e| DomainError::Io(format!("rename report: {}", e)))
}
