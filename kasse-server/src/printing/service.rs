//! Print Service
//!
//! Glue between orders and printers: plans the jobs for an order, renders
//! them per printer, archives what was rendered and hands the jobs to the
//! dispatcher. Reprints, test pages and daily reports go through the retry
//! queue.

use chrono::Utc;
use kasse_printer::{PrintError, RelayClient, RelayHealth};
use shared::error::{AppError, ErrorCode};
use shared::models::Printer;
use shared::order::Order;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::dispatch::{DispatchOutcome, Dispatcher, RenderedJob};
use super::queue::PrintQueue;
use super::renderer::{ReceiptMode, ReceiptRenderer};
use super::routing::{self, RouteOptions, RoutingMode};
use crate::archive::{ArchiveError, ArchivedReceipt, ReceiptArchive};
use crate::catalog::{CatalogError, CatalogService};
use crate::orders::DailySummary;

#[derive(Debug, Error)]
pub enum PrintServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("No enabled printer configured")]
    NoPrinter,

    #[error("Printer {0} is disabled")]
    PrinterDisabled(String),

    #[error("No print relay configured")]
    RelayNotConfigured,

    #[error("Print relay unavailable: {0}")]
    RelayUnavailable(#[source] PrintError),
}

impl From<PrintServiceError> for AppError {
    fn from(err: PrintServiceError) -> Self {
        match err {
            PrintServiceError::Catalog(e) => e.into(),
            PrintServiceError::Archive(e) => e.into(),
            PrintServiceError::NoPrinter | PrintServiceError::RelayNotConfigured => {
                AppError::with_message(ErrorCode::NoPrinterConfigured, err.to_string())
            }
            PrintServiceError::PrinterDisabled(ref id) => {
                let id = id.clone();
                AppError::with_message(ErrorCode::PrintFailed, err.to_string())
                    .with_detail("printer_id", id)
            }
            PrintServiceError::RelayUnavailable(_) => {
                AppError::with_message(ErrorCode::PrintRelayUnavailable, err.to_string())
            }
        }
    }
}

pub type PrintServiceResult<T> = Result<T, PrintServiceError>;

/// Reachability of one registered printer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrinterStatus {
    pub printer_id: String,
    pub display_name: String,
    pub enabled: bool,
    pub online: bool,
}

/// Print Service
#[derive(Debug, Clone)]
pub struct PrintService {
    catalog: CatalogService,
    archive: ReceiptArchive,
    renderer: ReceiptRenderer,
    routing: RoutingMode,
    route_options: RouteOptions,
    dispatcher: Dispatcher,
    queue: PrintQueue,
    relay: Option<RelayClient>,
}

impl PrintService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: CatalogService,
        archive: ReceiptArchive,
        renderer: ReceiptRenderer,
        routing: RoutingMode,
        dispatcher: Dispatcher,
        queue: PrintQueue,
        relay: Option<RelayClient>,
    ) -> Self {
        Self {
            catalog,
            archive,
            renderer,
            routing,
            route_options: RouteOptions::default(),
            dispatcher,
            queue,
            relay,
        }
    }

    pub fn with_route_options(mut self, options: RouteOptions) -> Self {
        self.route_options = options;
        self
    }

    pub fn routing_mode(&self) -> RoutingMode {
        self.routing
    }

    pub fn queue(&self) -> &PrintQueue {
        &self.queue
    }

    pub fn renderer(&self) -> &ReceiptRenderer {
        &self.renderer
    }

    /// Render the jobs an order routes to, without sending them
    pub fn render_order(&self, order: &Order) -> PrintServiceResult<Vec<RenderedJob>> {
        let printers = self.catalog.list_printers()?;
        let categories = self.catalog.list_categories()?;
        let jobs = routing::plan(order, &printers, &categories, self.routing, self.route_options);

        Ok(jobs
            .into_iter()
            .map(|job| RenderedJob {
                text: self
                    .renderer
                    .render_items(order, &job.items, job.mode, &job.printer.render),
                printer: job.printer,
                mode: job.mode,
            })
            .collect())
    }

    /// Print an order on every printer it routes to
    ///
    /// Only storage errors fail; printer failures are reported in the outcome.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn print_order(&self, order: &Order) -> PrintServiceResult<DispatchOutcome> {
        let jobs = self.render_order(order)?;
        if jobs.is_empty() {
            warn!(routing = %self.routing, "Order routes to no printer");
            return Ok(DispatchOutcome::default());
        }

        for job in &jobs {
            // the sale is recorded already, an archive failure must not stop printing
            if let Err(e) = self.archive.record(&ArchivedReceipt::from_job(order, job)) {
                warn!(error = %e, "Failed to archive receipt");
            }
        }

        let outcome = self.dispatcher.dispatch(jobs).await;
        if !outcome.is_complete() {
            warn!(
                failed = outcome.failed_count(),
                printers = ?outcome.failed_printers(),
                "Some print jobs failed"
            );
        }
        Ok(outcome)
    }

    fn enabled_printer(&self, printer_id: &str) -> PrintServiceResult<Printer> {
        let printer = self.catalog.get_printer(printer_id)?;
        if !printer.enabled {
            return Err(PrintServiceError::PrinterDisabled(printer.id));
        }
        Ok(printer)
    }

    /// Queue an archived receipt again on its original printer
    pub fn reprint(&self, receipt_id: &str) -> PrintServiceResult<String> {
        let receipt = self.archive.get(receipt_id)?;
        let printer = self.enabled_printer(&receipt.printer_id)?;
        let job_id = self.queue.enqueue(
            RenderedJob {
                printer,
                mode: receipt.mode,
                text: receipt.text,
            },
            format!("Reprint {}", receipt.order_id),
        );
        info!(receipt_id = %receipt_id, job_id = %job_id, "Reprint queued");
        Ok(job_id)
    }

    /// Queue a test page for a printer
    pub fn test_print(&self, printer_id: &str) -> PrintServiceResult<String> {
        let printer = self.enabled_printer(printer_id)?;
        let text = self.renderer.render_test_page(&printer, Utc::now());
        Ok(self.queue.enqueue(
            RenderedJob {
                printer,
                mode: ReceiptMode::Customer,
                text,
            },
            "Testdruck",
        ))
    }

    /// Queue the daily report on the default printer
    pub fn print_daily_summary(&self, summary: &DailySummary) -> PrintServiceResult<String> {
        let printers = self.catalog.list_printers()?;
        let printer = routing::default_printer(&printers)
            .cloned()
            .ok_or(PrintServiceError::NoPrinter)?;
        let text = self.renderer.render_daily_summary(summary, &printer.render);
        Ok(self.queue.enqueue(
            RenderedJob {
                printer,
                mode: ReceiptMode::Customer,
                text,
            },
            format!("Tagesabschluss {}", summary.date),
        ))
    }

    /// Check whether a printer answers, disabled or not
    #[instrument(skip(self))]
    pub async fn printer_status(&self, printer_id: &str) -> PrintServiceResult<PrinterStatus> {
        let printer = self.catalog.get_printer(printer_id)?;
        let online = self.dispatcher.is_online(&printer).await;
        if !online {
            warn!(printer = %printer.display_name, "Printer offline");
        }
        Ok(PrinterStatus {
            printer_id: printer.id,
            display_name: printer.display_name,
            enabled: printer.enabled,
            online,
        })
    }

    /// Ask the print relay whether it is up
    pub async fn relay_health(&self) -> PrintServiceResult<RelayHealth> {
        let relay = self
            .relay
            .as_ref()
            .ok_or(PrintServiceError::RelayNotConfigured)?;
        relay
            .health()
            .await
            .map_err(PrintServiceError::RelayUnavailable)
    }

    pub fn archive(&self) -> &ReceiptArchive {
        &self.archive
    }
}
