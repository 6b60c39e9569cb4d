//! Batch import orchestrator.
//!
//! - Splits valid records into ordered batches of at most `batch_size`
//! - One `import_batch` call per batch, strictly sequential
//! - FloodWait: batch recorded as failed, then a mandatory pause before the next batch
//! - Fixed pacing delay between batches otherwise
//! - Every submitted record gets exactly one ledger entry; cancellation is checked at batch boundaries

use crate::domain::entities::REASON_USER_NOT_FOUND;
use crate::domain::{
    BatchOutcome, DomainError, ImportBatch, ImportEvent, ImportReport, ImportResponse,
    LedgerEntry, OperationLedger, OperationRecord, PhoneRecord,
};
use crate::domain::settings::DEFAULT_ERROR_DISPLAY_CAP;
use crate::ports::{ContactGateway, ImportObserver, LedgerSink};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Partitioning,
    Submitting,
    Waiting,
    Aggregating,
    Done,
}

/// Split into ordered, non-overlapping batches of at most `batch_size`.
pub fn partition(records: Vec<PhoneRecord>, batch_size: usize, name_prefix: &str) -> Vec<ImportBatch> {
    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size.max(1)));
    let mut iter = records.into_iter().peekable();
    while iter.peek().is_some() {
        let chunk: Vec<PhoneRecord> = iter.by_ref().take(batch_size.max(1)).collect();
        batches.push(ImportBatch {
            number: batches.len() + 1,
            records: chunk,
            name_prefix: name_prefix.to_string(),
        });
    }
    batches
}

/// Map the service's answer onto the batch: accepted ids succeed, explicit
/// rejections carry their reason, everything else is "user not found".
fn interpret(batch: &ImportBatch, response: ImportResponse) -> BatchOutcome {
    let imported: std::collections::HashSet<i64> = response.imported.into_iter().collect();
    let rejected: HashMap<i64, String> = response
        .rejected
        .into_iter()
        .map(|r| (r.client_id, r.reason))
        .collect();
    let results = batch
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let id = i as i64;
            let reason = (!imported.contains(&id)).then(|| {
                rejected
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| REASON_USER_NOT_FOUND.to_string())
            });
            (record.clone(), reason)
        })
        .collect();
    BatchOutcome {
        batch_number: batch.number,
        results,
        retry_after_seconds: None,
    }
}

/// Whole batch failed with one reason.
fn fail_all(batch: &ImportBatch, reason: &str, retry_after_seconds: Option<u64>) -> BatchOutcome {
    BatchOutcome {
        batch_number: batch.number,
        results: batch
            .records
            .iter()
            .map(|r| (r.clone(), Some(reason.to_string())))
            .collect(),
        retry_after_seconds,
    }
}

/// Drives one import run against a single gateway session.
pub struct BatchImporter {
    gateway: Arc<dyn ContactGateway>,
    batch_delay: Duration,
    error_cap: usize,
    observer: Option<Arc<dyn ImportObserver>>,
    sink: Option<Arc<dyn LedgerSink>>,
    ledger: OperationLedger,
    phase: RunPhase,
}

impl BatchImporter {
    pub fn new(gateway: Arc<dyn ContactGateway>, batch_delay: Duration) -> Self {
        Self {
            gateway,
            batch_delay,
            error_cap: DEFAULT_ERROR_DISPLAY_CAP,
            observer: None,
            sink: None,
            ledger: OperationLedger::new(),
            phase: RunPhase::Idle,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ImportObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Persist ledger entries after every batch.
    pub fn with_ledger_sink(mut self, sink: Arc<dyn LedgerSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_error_cap(mut self, cap: usize) -> Self {
        self.error_cap = cap;
        self
    }

    pub fn ledger(&self) -> &OperationLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> OperationLedger {
        self.ledger
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(from = ?self.phase, to = ?phase, "import phase");
        self.phase = phase;
    }

    fn emit(&self, event: ImportEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    /// Run the import. Errors only when the run cannot start (bad batch size,
    /// unauthorized or unreachable session); everything after that ends up in
    /// the report and the ledger.
    pub async fn run(
        &mut self,
        records: Vec<PhoneRecord>,
        batch_size: usize,
        name_prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<ImportReport, DomainError> {
        if batch_size == 0 {
            return Err(DomainError::InvalidInput("batch size must be at least 1".into()));
        }
        if !self.gateway.is_authenticated().await? {
            return Err(DomainError::Auth(
                "session is not authorized; log in before importing".into(),
            ));
        }

        self.enter(RunPhase::Partitioning);
        let total = records.len();
        let valid: Vec<PhoneRecord> = records.into_iter().filter(PhoneRecord::is_valid).collect();
        if valid.len() < total {
            warn!(dropped = total - valid.len(), "invalid records are never submitted");
        }
        let batches = partition(valid, batch_size, name_prefix);
        let start = self.ledger.len();
        info!(
            records = batches.iter().map(ImportBatch::len).sum::<usize>(),
            batches = batches.len(),
            batch_size,
            "starting contact import"
        );
        self.emit(ImportEvent::RunStarted {
            records: batches.iter().map(ImportBatch::len).sum(),
            batches: batches.len(),
        });

        let mut errors: Vec<String> = Vec::new();
        let mut submitted = 0usize;
        let mut cancelled = false;
        let mut fatal: Option<String> = None;
        let mut pending_wait: Option<Duration> = None;

        for batch in &batches {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if submitted > 0 {
                // A FloodWait pause replaces the pacing delay for this gap.
                let wait = pending_wait.take().unwrap_or(self.batch_delay);
                self.enter(RunPhase::Waiting);
                let finished = tokio::select! {
                    _ = tokio::time::sleep(wait) => true,
                    _ = cancel.cancelled() => false,
                };
                if !finished {
                    cancelled = true;
                    break;
                }
            }

            self.enter(RunPhase::Submitting);
            self.emit(ImportEvent::BatchStarted {
                number: batch.number,
                size: batch.len(),
            });
            info!(batch = batch.number, of = batches.len(), size = batch.len(), "submitting batch");
            let entries = batch.entries();
            let result = self.gateway.import_batch(&entries).await;
            submitted += 1;

            let outcome = match result {
                Ok(response) => {
                    let outcome = interpret(batch, response);
                    errors.extend(outcome.failures().map(|(r, reason)| {
                        format!("{}: {}", r.e164().unwrap_or(r.raw()), reason)
                    }));
                    outcome
                }
                Err(DomainError::FloodWait { seconds }) => {
                    let reason = format!("rate limited, retry after {}s", seconds);
                    warn!(batch = batch.number, wait_secs = seconds, "FloodWait on batch");
                    errors.push(format!("Batch {}: {}", batch.number, reason));
                    self.emit(ImportEvent::RateLimited {
                        number: batch.number,
                        wait_seconds: seconds,
                    });
                    pending_wait = Some(Duration::from_secs(seconds));
                    fail_all(batch, &reason, Some(seconds))
                }
                Err(e @ (DomainError::Connection(_) | DomainError::Auth(_))) => {
                    let reason = e.to_string();
                    warn!(batch = batch.number, error = %e, "lost the remote session; stopping run");
                    errors.push(format!("Batch {}: {}", batch.number, reason));
                    fatal = Some(reason.clone());
                    fail_all(batch, &reason, None)
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(batch = batch.number, error = %e, "batch failed");
                    errors.push(format!("Batch {}: {}", batch.number, reason));
                    fail_all(batch, &reason, None)
                }
            };

            self.record(batch, &outcome).await;
            info!(
                batch = batch.number,
                imported = outcome.success_count(),
                failed = outcome.fail_count(),
                "batch finished"
            );
            self.emit(ImportEvent::BatchFinished {
                number: batch.number,
                imported: outcome.success_count(),
                failed: outcome.fail_count(),
            });

            if fatal.is_some() {
                break;
            }
        }

        if cancelled {
            info!(submitted, remaining = batches.len() - submitted, "import cancelled");
        }

        self.enter(RunPhase::Aggregating);
        let mut report = ImportReport::from_operations(self.ledger.since(start), errors, self.error_cap);
        report.batches_submitted = submitted;
        report.cancelled = cancelled;
        if let Some(error) = fatal {
            report = report.with_error(error);
        }
        info!(
            attempted = report.attempted,
            successful = report.successful,
            failed = report.failed,
            success_rate = report.success_rate,
            "import finished"
        );
        self.emit(ImportEvent::RunFinished {
            successful: report.successful,
            failed: report.failed,
            cancelled,
        });
        self.enter(RunPhase::Done);
        Ok(report)
    }

    /// One ledger record per batch member, in batch order.
    async fn record(&mut self, batch: &ImportBatch, outcome: &BatchOutcome) {
        let start = self.ledger.len();
        for (record, reason) in &outcome.results {
            let op = match reason {
                Some(reason) => OperationRecord::failed(record.clone(), reason.as_str()),
                None => OperationRecord::succeeded(record.clone()),
            };
            self.ledger.append(op);
        }
        if let Some(sink) = &self.sink {
            let entries: Vec<LedgerEntry> = self.ledger.since(start).iter().map(LedgerEntry::from).collect();
            if let Err(e) = sink.append(&entries).await {
                warn!(batch = batch.number, error = %e, "failed to persist ledger entries");
            }
        }
    }
}
