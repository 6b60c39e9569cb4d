//! File -> scan -> normalize -> dedup -> batch import.
//!
//! - Scanning and normalization are pure; only the file read touches I/O
//! - Repeats within the input always collapse; the existing-contact lookup only runs with `skip_existing`
//! - Run-level failures come back as a failed `ImportReport`, never as a panic
//! - Every run's ledger slice is appended to the session ledger

use crate::domain::{
    DomainError, FileScanner, ImportReport, Normalizer, OperationLedger, OperationSummary,
    ParseStats, PhoneRecord, RunConfig,
};
use crate::ports::{ContactGateway, ImportObserver, LedgerSink};
use crate::usecases::batch_importer::BatchImporter;
use crate::usecases::dedup::{self, DedupFilter};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Import service. One instance per gateway session.
pub struct ImportService {
    gateway: Arc<dyn ContactGateway>,
    config: RunConfig,
    scanner: FileScanner,
    normalizer: Normalizer,
    observer: Option<Arc<dyn ImportObserver>>,
    sink: Option<Arc<dyn LedgerSink>>,
    ledger: Mutex<OperationLedger>,
}

impl ImportService {
    pub fn new(gateway: Arc<dyn ContactGateway>, config: RunConfig) -> Self {
        let normalizer = Normalizer::new(config.default_country.clone(), config.formatting.clone());
        let scanner = FileScanner::new(config.formatting.min_digit_length);
        Self {
            gateway,
            config,
            scanner,
            normalizer,
            observer: None,
            sink: None,
            ledger: Mutex::new(OperationLedger::new()),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ImportObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_ledger_sink(mut self, sink: Arc<dyn LedgerSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Scan lines and normalize every candidate, in file order.
    pub fn parse_lines<I, S>(&self, lines: I) -> Vec<PhoneRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scanner
            .scan(lines)
            .map(|c| self.normalizer.normalize(&c.text))
            .collect()
    }

    pub async fn parse_file(&self, path: &Path) -> Result<Vec<PhoneRecord>, DomainError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::Io(format!("{}: {}", path.display(), e)))?;
        let records = self.parse_lines(content.lines());
        info!(
            path = %path.display(),
            candidates = records.len(),
            "parsed phone file"
        );
        Ok(records)
    }

    pub async fn preview_file(&self, path: &Path) -> Result<ParseStats, DomainError> {
        let records = self.parse_file(path).await?;
        Ok(ParseStats::from_records(&records))
    }

    /// Import already-normalized records. Invalid ones are dropped before dedup.
    pub async fn import_records(
        &self,
        records: Vec<PhoneRecord>,
        cancel: &CancellationToken,
    ) -> ImportReport {
        let total = records.len();
        let valid: Vec<PhoneRecord> = records.into_iter().filter(PhoneRecord::is_valid).collect();
        if valid.is_empty() {
            warn!(total, "nothing to import");
            return ImportReport::failed_run("No valid phone numbers found");
        }

        let before = valid.len();
        let to_import = if self.config.skip_existing {
            DedupFilter::new(self.gateway.clone()).apply(valid).await
        } else {
            dedup::filter(valid, &HashSet::new())
        };
        let skipped = before - to_import.len();
        if skipped > 0 {
            info!(skipped, "skipping numbers that are already contacts");
        }
        if to_import.is_empty() {
            let mut report = ImportReport::from_operations(&[], Vec::new(), self.config.error_display_cap);
            report.skipped_existing = skipped;
            return report;
        }

        let mut importer = BatchImporter::new(
            self.gateway.clone(),
            Duration::from_millis(self.config.batch_delay_ms),
        )
        .with_error_cap(self.config.error_display_cap);
        if let Some(observer) = &self.observer {
            importer = importer.with_observer(observer.clone());
        }
        if let Some(sink) = &self.sink {
            importer = importer.with_ledger_sink(sink.clone());
        }

        let result = importer
            .run(to_import, self.config.batch_size, &self.config.name_prefix, cancel)
            .await;
        self.ledger
            .lock()
            .await
            .extend(importer.ledger().records().iter().cloned());

        match result {
            Ok(mut report) => {
                report.skipped_existing = skipped;
                report
            }
            Err(e) => {
                warn!(error = %e, "import run could not start");
                ImportReport::failed_run(e.to_string())
            }
        }
    }

    pub async fn import_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<ImportReport, DomainError> {
        let records = self.parse_file(path).await?;
        Ok(self.import_records(records, cancel).await)
    }

    /// Import one number typed by the user. `first_name` overrides the
    /// generated display name prefix.
    pub async fn add_single_contact(
        &self,
        phone: &str,
        first_name: Option<&str>,
    ) -> Result<ImportReport, DomainError> {
        let record = self.normalizer.normalize(phone);
        if !record.is_valid() {
            return Err(DomainError::InvalidInput(format!(
                "{}: {}",
                phone.trim(),
                record.error_reason().unwrap_or("invalid number")
            )));
        }
        let prefix = first_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.config.name_prefix);

        let mut importer = BatchImporter::new(self.gateway.clone(), Duration::ZERO);
        if let Some(sink) = &self.sink {
            importer = importer.with_ledger_sink(sink.clone());
        }
        let report = importer
            .run(vec![record], 1, prefix, &CancellationToken::new())
            .await?;
        self.ledger
            .lock()
            .await
            .extend(importer.into_ledger().records().iter().cloned());
        Ok(report)
    }

    pub async fn summary(&self) -> OperationSummary {
        self.ledger.lock().await.summary()
    }

    pub async fn ledger_snapshot(&self) -> OperationLedger {
        self.ledger.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockContactGateway;
    use std::io::Write;

    fn service(gw: Arc<MockContactGateway>) -> ImportService {
        let config = RunConfig {
            batch_delay_ms: 0,
            ..RunConfig::default()
        };
        ImportService::new(gw, config)
    }

    #[test]
    fn test_parse_lines_skips_noise() {
        let svc = service(Arc::new(MockContactGateway::new()));
        let records = svc.parse_lines([
            "# customers",
            "",
            "Alice: 9123 4567",
            "// old",
            "name,phone",
            "+1 (202) 555-0191",
        ]);
        let e164: Vec<_> = records.iter().filter_map(|r| r.e164()).collect();
        assert_eq!(e164, vec!["+85291234567", "+12025550191"]);
    }

    #[tokio::test]
    async fn test_import_file_with_dedup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "91234567\n61234567\n9123-4567\nnot a phone").unwrap();

        let gw = Arc::new(MockContactGateway::new());
        gw.add_existing("+85261234567");
        let svc = service(gw.clone());

        let stats = svc.preview_file(file.path()).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.valid, 3);

        let report = svc
            .import_file(file.path(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.success);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.skipped_existing, 2);
        assert_eq!(gw.call_count(), 1);
        assert_eq!(svc.summary().await.total_operations, 1);
    }

    #[tokio::test]
    async fn test_repeats_collapse_without_existing_lookup() {
        let gw = Arc::new(MockContactGateway::new());
        let config = RunConfig {
            skip_existing: false,
            batch_delay_ms: 0,
            ..RunConfig::default()
        };
        let svc = ImportService::new(gw.clone(), config);
        let records = svc.parse_lines(["91234567", "9123 4567"]);
        let report = svc.import_records(records, &CancellationToken::new()).await;
        assert!(report.success);
        assert_eq!(report.attempted, 1);
        let calls = gw.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].contacts.len(), 1);
        assert_eq!(calls[0].contacts[0].phone, "+85291234567");
    }

    #[tokio::test]
    async fn test_no_valid_numbers_is_failed_report() {
        let gw = Arc::new(MockContactGateway::new());
        let svc = service(gw.clone());
        let records = svc.parse_lines(["12345678901234567890"]);
        let report = svc.import_records(records, &CancellationToken::new()).await;
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("No valid phone numbers found"));
        assert_eq!(gw.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_run_reports_failure() {
        let gw = Arc::new(MockContactGateway::new());
        gw.set_authenticated(false);
        let svc = service(gw.clone());
        let records = svc.parse_lines(["91234567"]);
        let report = svc.import_records(records, &CancellationToken::new()).await;
        assert!(!report.success);
        assert!(report.error.unwrap().contains("Authentication failed"));
        assert_eq!(gw.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let svc = service(Arc::new(MockContactGateway::new()));
        let err = svc
            .import_file(Path::new("/nonexistent/phones.txt"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Io(_)));
    }

    #[tokio::test]
    async fn test_add_single_contact() {
        let gw = Arc::new(MockContactGateway::new());
        let svc = service(gw.clone());

        let err = svc.add_single_contact("abc", None).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let report = svc.add_single_contact("9123 4567", Some("Alice")).await.unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(gw.calls()[0].contacts[0].first_name, "Alice 4567");
        let summary = svc.summary().await;
        assert_eq!(summary.latest[0].e164.as_deref(), Some("+85291234567"));
    }
}
