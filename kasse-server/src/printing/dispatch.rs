//! Print dispatch
//!
//! Sends rendered jobs to their printers. All jobs of one batch run
//! concurrently, each under its own timeout; one failing or hanging printer
//! never holds back or cancels the others.

use async_trait::async_trait;
use futures::future::join_all;
use kasse_printer::{
    NetworkPrinter, PrintError, PrintResult, Printer as _, RelayClient, RelayPrinter,
};
use serde::Serialize;
use shared::models::{FontMode, Printer, PrinterEndpoint};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::renderer::ReceiptMode;

/// Rendered, sanitized text bound for one printer
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedJob {
    pub printer: Printer,
    pub mode: ReceiptMode,
    pub text: String,
}

impl RenderedJob {
    pub fn cut(&self) -> bool {
        self.printer.render.cut_after_print
    }
}

/// Where rendered jobs end up
#[async_trait]
pub trait JobSink: Send + Sync {
    async fn send(&self, printer: &Printer, text: &str, cut: bool) -> PrintResult<()>;

    /// Whether the printer answers right now
    async fn is_online(&self, _printer: &Printer) -> bool {
        true
    }
}

/// Sends jobs over the printer's configured transport
#[derive(Debug, Clone)]
pub struct TransportSink {
    relay: Option<RelayClient>,
    connect_timeout: Duration,
}

impl TransportSink {
    pub fn new(relay: Option<RelayClient>, connect_timeout: Duration) -> Self {
        Self {
            relay,
            connect_timeout,
        }
    }

    pub fn relay(&self) -> Option<&RelayClient> {
        self.relay.as_ref()
    }

    fn relay_printer(&self, queue: &str) -> PrintResult<RelayPrinter> {
        self.relay
            .as_ref()
            .map(|relay| relay.printer(queue))
            .ok_or_else(|| PrintError::InvalidConfig("no print relay configured".into()))
    }

    /// Raw TCP printers get the double-width switch as a control sequence;
    /// the relay only takes text, so there the font mode narrows the layout
    /// and nothing else.
    fn network_printer(&self, printer: &Printer, host: &str, port: u16) -> PrintResult<NetworkPrinter> {
        Ok(NetworkPrinter::new(host, port)?
            .with_timeout(self.connect_timeout)
            .with_double_width(printer.render.font_mode == FontMode::DoubleWidth))
    }
}

#[async_trait]
impl JobSink for TransportSink {
    async fn send(&self, printer: &Printer, text: &str, cut: bool) -> PrintResult<()> {
        match &printer.endpoint {
            PrinterEndpoint::Relay { queue } => self.relay_printer(queue)?.print(text, cut).await,
            PrinterEndpoint::Network { host, port } => {
                self.network_printer(printer, host, *port)?
                    .print(text, cut)
                    .await
            }
        }
    }

    async fn is_online(&self, printer: &Printer) -> bool {
        let result = match &printer.endpoint {
            PrinterEndpoint::Relay { queue } => match self.relay_printer(queue) {
                Ok(relay) => Ok(relay.is_online().await),
                Err(e) => Err(e),
            },
            PrinterEndpoint::Network { host, port } => match self.network_printer(printer, host, *port) {
                Ok(network) => Ok(network.is_online().await),
                Err(e) => Err(e),
            },
        };
        result.unwrap_or_else(|e| {
            warn!(printer_id = %printer.id, error = %e, "Printer status unavailable");
            false
        })
    }
}

/// A job that did not reach its printer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedJob {
    pub printer_id: String,
    pub printer: String,
    pub error: String,
}

/// Result of one dispatch batch
///
/// Printing is best effort: a non-empty `failed` list is a warning for the
/// operator, the order stays recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// Display names of printers that accepted their job
    pub sent: Vec<String>,
    pub failed: Vec<FailedJob>,
}

impl DispatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn failed_printers(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.printer.as_str()).collect()
    }
}

/// Sends one job under `timeout`, folding a timeout into the error
pub(crate) async fn send_with_timeout(
    sink: &dyn JobSink,
    job: &RenderedJob,
    timeout: Duration,
) -> PrintResult<()> {
    match tokio::time::timeout(timeout, sink.send(&job.printer, &job.text, job.cut())).await {
        Ok(result) => result,
        Err(_) => Err(PrintError::Timeout(format!(
            "{} did not answer within {} ms",
            job.printer.display_name,
            timeout.as_millis()
        ))),
    }
}

/// Concurrent fire-and-forget dispatcher
#[derive(Clone)]
pub struct Dispatcher {
    sink: Arc<dyn JobSink>,
    timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn JobSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    pub fn sink(&self) -> Arc<dyn JobSink> {
        self.sink.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Reachability check under the dispatch timeout; a timeout counts as offline
    pub async fn is_online(&self, printer: &Printer) -> bool {
        tokio::time::timeout(self.timeout, self.sink.is_online(printer))
            .await
            .unwrap_or(false)
    }

    #[instrument(skip_all, fields(jobs = jobs.len()))]
    pub async fn dispatch(&self, jobs: Vec<RenderedJob>) -> DispatchOutcome {
        let sends = jobs.iter().map(|job| async move {
            let result = send_with_timeout(self.sink.as_ref(), job, self.timeout).await;
            (job, result)
        });

        let mut outcome = DispatchOutcome::default();
        for (job, result) in join_all(sends).await {
            match result {
                Ok(()) => outcome.sent.push(job.printer.display_name.clone()),
                Err(e) => {
                    warn!(
                        printer_id = %job.printer.id,
                        printer = %job.printer.display_name,
                        mode = ?job.mode,
                        error = %e,
                        "Print job failed"
                    );
                    outcome.failed.push(FailedJob {
                        printer_id: job.printer.id.clone(),
                        printer: job.printer.display_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            sent = outcome.sent.len(),
            failed = outcome.failed.len(),
            "Dispatch finished"
        );
        outcome
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sinks for tests

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Records every job; printers in `broken` fail, printers in `hanging`
    /// never answer
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Mutex<Vec<(String, String, bool)>>,
        pub broken: HashSet<String>,
        pub hanging: HashSet<String>,
        pub calls: Mutex<usize>,
    }

    impl RecordingSink {
        pub fn failing(ids: &[&str]) -> Self {
            Self {
                broken: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn hanging(ids: &[&str]) -> Self {
            Self {
                hanging: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn texts_for(&self, printer_id: &str) -> Vec<String> {
            self.sent
                .lock()
                .iter()
                .filter(|(id, _, _)| id == printer_id)
                .map(|(_, text, _)| text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl JobSink for RecordingSink {
        async fn send(&self, printer: &Printer, text: &str, cut: bool) -> PrintResult<()> {
            *self.calls.lock() += 1;
            if self.hanging.contains(&printer.id) {
                std::future::pending::<()>().await;
            }
            if self.broken.contains(&printer.id) {
                return Err(PrintError::Connection(format!("{} unreachable", printer.id)));
            }
            self.sent
                .lock()
                .push((printer.id.clone(), text.to_string(), cut));
            Ok(())
        }

        async fn is_online(&self, printer: &Printer) -> bool {
            if self.hanging.contains(&printer.id) {
                std::future::pending::<()>().await;
            }
            !self.broken.contains(&printer.id)
        }
    }
}
