//! Asynchronous error sink.
//!
//! Producers call [`ErrorReporter::report`] from any task without blocking;
//! a single long-lived [`ErrorSink::run`] loop drains the reports and turns
//! them into `tracing` error records. The queue is unbounded so a slow
//! consumer never stalls an unrelated request path.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::Error;

#[derive(Clone, Debug)]
pub struct ErrorReport {
    pub error: String,
    pub context: Option<String>,
    pub reported_at: DateTime<Utc>,
}

/// Cheap, cloneable handle injected into every call site that can fail
/// without surfacing the failure to its caller.
#[derive(Clone, Debug)]
pub struct ErrorReporter {
    tx: mpsc::UnboundedSender<ErrorReport>,
}

pub struct ErrorSink {
    rx: mpsc::UnboundedReceiver<ErrorReport>,
}

/// Create a connected reporter/sink pair.
pub fn channel() -> (ErrorReporter, ErrorSink) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ErrorReporter { tx }, ErrorSink { rx })
}

impl ErrorReporter {
    pub fn report(&self, err: &Error, context: Option<&str>) {
        self.send(ErrorReport {
            error: err.to_string(),
            context: context.map(str::to_string),
            reported_at: Utc::now(),
        });
    }

    fn send(&self, report: ErrorReport) {
        // Sink already stopped: log inline so the report is not lost.
        if let Err(mpsc::error::SendError(report)) = self.tx.send(report) {
            log_report(&report);
        }
    }
}

impl ErrorSink {
    /// Drain reports until `cancel` fires or every reporter is dropped.
    ///
    /// Reports already queued when cancellation is observed are still logged.
    /// Returns the number of reports processed.
    pub async fn run(mut self, cancel: CancellationToken) -> usize {
        let mut processed = 0usize;
        loop {
            tokio::select! {
                biased;
                report = self.rx.recv() => match report {
                    Some(report) => {
                        log_report(&report);
                        processed += 1;
                    }
                    None => break,
                },
                _ = cancel.cancelled() => {
                    self.rx.close();
                    while let Ok(report) = self.rx.try_recv() {
                        log_report(&report);
                        processed += 1;
                    }
                    break;
                }
            }
        }
        info!(processed, "error sink stopped");
        processed
    }
}

fn log_report(report: &ErrorReport) {
    error!(
        error = %report.error,
        context = report.context.as_deref().unwrap_or(""),
        reported_at = %report.reported_at.to_rfc3339(),
        "bot error"
    );
}
