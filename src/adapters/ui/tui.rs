//! Implements InputPort and LoginPrompt. Inquire-based interactive prompts.

use crate::adapters::export::{write_ledger_csv, write_vcard};
use crate::adapters::persistence::{JsonlLedger, ReportWriter};
use crate::domain::{DomainError, ImportReport, LedgerEntry, ParseStats};
use crate::ports::{InputPort, LedgerSink, LoginPrompt};
use crate::usecases::ImportService;
use async_trait::async_trait;
use inquire::error::InquireError;
use inquire::ui::RenderConfig;
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub fn apply_theme() {
    inquire::set_global_render_config(RenderConfig::default_colored());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Preview,
    Import,
    AddSingle,
    ExportVcard,
    Stats,
    Exit,
}

impl MenuItem {
    const ALL: [MenuItem; 6] = [
        MenuItem::Preview,
        MenuItem::Import,
        MenuItem::AddSingle,
        MenuItem::ExportVcard,
        MenuItem::Stats,
        MenuItem::Exit,
    ];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuItem::Preview => "Preview phone file",
            MenuItem::Import => "Import phone file",
            MenuItem::AddSingle => "Add single contact",
            MenuItem::ExportVcard => "Export phone file as vCard",
            MenuItem::Stats => "Show statistics",
            MenuItem::Exit => "Exit",
        };
        f.write_str(label)
    }
}

fn prompt_error(e: InquireError) -> DomainError {
    DomainError::InvalidInput(e.to_string())
}

/// Esc / Ctrl-C at a prompt.
fn is_abort(e: &InquireError) -> bool {
    matches!(
        e,
        InquireError::OperationCanceled | InquireError::OperationInterrupted
    )
}

fn print_stats(stats: &ParseStats) {
    println!(
        "{} candidates: {} valid, {} invalid ({:.1}% valid)",
        stats.total, stats.valid, stats.invalid, stats.success_rate
    );
    for (cc, count) in &stats.country_codes {
        println!("  +{:<4} {}", cc, count);
    }
}

fn print_report(report: &ImportReport) {
    let status = match (&report.error, report.cancelled) {
        (Some(err), _) => format!("failed: {}", err),
        (None, true) => "cancelled".to_string(),
        (None, false) => "finished".to_string(),
    };
    println!("Import {}", status);
    println!(
        "  attempted {}, imported {}, failed {}, already contacts {} ({:.1}% success)",
        report.attempted,
        report.successful,
        report.failed,
        report.skipped_existing,
        report.success_rate
    );
    for err in &report.errors {
        println!("  - {}", err);
    }
    if report.total_errors > report.errors.len() {
        println!("  ... and {} more", report.total_errors - report.errors.len());
    }
}

pub struct TuiInputPort {
    service: Arc<ImportService>,
    history: Arc<JsonlLedger>,
    reports: ReportWriter,
    export_dir: PathBuf,
}

impl TuiInputPort {
    pub fn new(service: Arc<ImportService>, history: Arc<JsonlLedger>, data_dir: &Path) -> Self {
        Self {
            service,
            history,
            reports: ReportWriter::new(data_dir.join("reports")),
            export_dir: data_dir.join("exports"),
        }
    }

    fn ask_path(&self) -> Result<PathBuf, DomainError> {
        let raw = Text::new("Path to phone list:")
            .with_help_message("plain text, one number per line")
            .prompt()
            .map_err(prompt_error)?;
        Ok(PathBuf::from(raw.trim()))
    }

    async fn preview(&self) -> Result<(), DomainError> {
        let path = self.ask_path()?;
        let stats = self.service.preview_file(&path).await?;
        print_stats(&stats);
        Ok(())
    }

    async fn import(&self) -> Result<(), DomainError> {
        let path = self.ask_path()?;
        let stats = self.service.preview_file(&path).await?;
        print_stats(&stats);
        if stats.valid == 0 {
            println!("No valid phone numbers found");
            return Ok(());
        }
        let go = Confirm::new(&format!("Import {} valid numbers?", stats.valid))
            .with_default(true)
            .prompt()
            .map_err(prompt_error)?;
        if !go {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });
        let result = self.service.import_file(&path, &cancel).await;
        ctrl_c.abort();
        let report = result?;
        print_report(&report);

        let ledger = self.service.ledger_snapshot().await;
        let run_ops: Vec<LedgerEntry> = ledger
            .since(ledger.len().saturating_sub(report.attempted))
            .iter()
            .map(LedgerEntry::from)
            .collect();
        match self.reports.write_run(&report, &run_ops).await {
            Ok(p) => println!("Report saved to {}", p.display()),
            Err(e) => warn!(error = %e, "could not save report"),
        }
        Ok(())
    }

    async fn add_single(&self) -> Result<(), DomainError> {
        let phone = Text::new("Phone number:").prompt().map_err(prompt_error)?;
        let name = Text::new("First name (optional):")
            .with_help_message("leave empty for the default prefix")
            .prompt()
            .map_err(prompt_error)?;
        let name = name.trim();
        match self
            .service
            .add_single_contact(&phone, (!name.is_empty()).then_some(name))
            .await
        {
            Ok(report) => print_report(&report),
            Err(DomainError::InvalidInput(msg)) => println!("Not imported: {}", msg),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn export_vcard(&self) -> Result<(), DomainError> {
        let path = self.ask_path()?;
        let records = self.service.parse_file(&path).await?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contacts".to_string());
        let out = self.export_dir.join(format!("{}.vcf", stem));
        let count = write_vcard(&out, &records, &self.service.config().name_prefix).await?;
        println!("Exported {} contacts to {}", count, out.display());
        Ok(())
    }

    async fn stats(&self) -> Result<(), DomainError> {
        let session = self.service.summary().await;
        println!(
            "This session: {} operations, {} successful, {} failed ({:.1}%)",
            session.total_operations, session.successful, session.failed, session.success_rate
        );
        let history = self.history.load().await?;
        let ok = history.iter().filter(|e| e.success).count();
        println!("All runs: {} operations, {} successful", history.len(), ok);
        for e in self.history.tail(10).await? {
            let outcome = if e.success {
                "ok".to_string()
            } else {
                e.error_message.clone().unwrap_or_default()
            };
            println!(
                "  {} {} {}",
                e.timestamp.format("%Y-%m-%d %H:%M"),
                e.e164.as_deref().unwrap_or(&e.raw_phone),
                outcome
            );
        }
        if !history.is_empty()
            && Confirm::new("Export full history as CSV?")
                .with_default(false)
                .prompt()
                .map_err(prompt_error)?
        {
            let path = self.export_dir.join("ledger.csv");
            write_ledger_csv(&path, &history).await?;
            println!("Exported to {}", path.display());
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let choice = match Select::new("What next?", MenuItem::ALL.to_vec()).prompt() {
                Ok(choice) => choice,
                Err(e) if is_abort(&e) => return Ok(()),
                Err(e) => return Err(prompt_error(e)),
            };
            let result = match choice {
                MenuItem::Preview => self.preview().await,
                MenuItem::Import => self.import().await,
                MenuItem::AddSingle => self.add_single().await,
                MenuItem::ExportVcard => self.export_vcard().await,
                MenuItem::Stats => self.stats().await,
                MenuItem::Exit => return Ok(()),
            };
            // Session-level failures end the menu; everything else is shown and the loop continues.
            match result {
                Err(e @ (DomainError::Auth(_) | DomainError::Connection(_))) => return Err(e),
                Err(e) => println!("Error: {}", e),
                Ok(()) => {}
            }
        }
    }
}

/// Terminal prompts for the login flow.
pub struct TuiLoginPrompt;

#[async_trait]
impl LoginPrompt for TuiLoginPrompt {
    async fn phone_number(&self) -> Result<String, DomainError> {
        Text::new("Phone number of your Telegram account (international format):")
            .prompt()
            .map_err(|e| DomainError::Auth(e.to_string()))
    }

    async fn login_code(&self) -> Result<String, DomainError> {
        Text::new("Login code:")
            .prompt()
            .map_err(|e| DomainError::Auth(e.to_string()))
    }

    async fn password(&self, hint: Option<&str>) -> Result<String, DomainError> {
        let label = match hint {
            Some(h) => format!("2FA password (hint: {}):", h),
            None => "2FA password:".to_string(),
        };
        Password::new(&label)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .map_err(|e| DomainError::Auth(e.to_string()))
    }
}
