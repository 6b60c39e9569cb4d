//! Renders import progress events with an indicatif bar.

use crate::domain::ImportEvent;
use crate::ports::ImportObserver;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

const BAR_TEMPLATE: &str = "{spinner} [{bar:40}] {pos}/{len} {msg}";

#[derive(Default)]
pub struct ProgressObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bar) = guard.as_ref() {
            f(bar);
        }
    }
}

impl ImportObserver for ProgressObserver {
    fn on_event(&self, event: &ImportEvent) {
        match *event {
            ImportEvent::RunStarted { records, batches } => {
                let bar = ProgressBar::new(records as u64);
                bar.set_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("=> "),
                );
                bar.set_message(format!("{} batches", batches));
                *self.bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(bar);
            }
            ImportEvent::BatchStarted { number, size } => {
                self.with_bar(|bar| bar.set_message(format!("batch {} ({} numbers)", number, size)));
            }
            ImportEvent::BatchFinished {
                imported, failed, ..
            } => {
                self.with_bar(|bar| bar.inc((imported + failed) as u64));
            }
            ImportEvent::RateLimited {
                number,
                wait_seconds,
            } => {
                self.with_bar(|bar| {
                    bar.println(format!(
                        "batch {} rate limited; waiting {}s before the next batch",
                        number, wait_seconds
                    ))
                });
            }
            ImportEvent::RunFinished {
                successful,
                failed,
                cancelled,
            } => {
                let done = self.bar.lock().unwrap_or_else(|e| e.into_inner()).take();
                if let Some(bar) = done {
                    let status = if cancelled { "cancelled" } else { "done" };
                    bar.finish_with_message(format!(
                        "{}: {} imported, {} failed",
                        status, successful, failed
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_lifecycle() {
        let observer = ProgressObserver::new();
        observer.on_event(&ImportEvent::BatchFinished {
            number: 1,
            imported: 1,
            failed: 0,
        });
        observer.on_event(&ImportEvent::RunStarted {
            records: 3,
            batches: 1,
        });
        observer.on_event(&ImportEvent::BatchFinished {
            number: 1,
            imported: 2,
            failed: 1,
        });
        let pos = observer.bar.lock().unwrap().as_ref().map(ProgressBar::position);
        assert_eq!(pos, Some(3));
        observer.on_event(&ImportEvent::RunFinished {
            successful: 2,
            failed: 1,
            cancelled: false,
        });
        assert!(observer.bar.lock().unwrap().is_none());
    }
}
