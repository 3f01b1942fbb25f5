//! Receipt printing
//!
//! - `routing`: which printer gets which receipt
//! - `renderer`: plain-text receipts per printer width and charset
//! - `dispatch`: concurrent best-effort sending
//! - `queue`: retried background jobs (reprints, test pages, reports)
//! - `service`: wires the above to the catalog and the receipt archive

pub mod dispatch;
pub mod queue;
pub mod renderer;
pub mod routing;
pub mod service;

pub use dispatch::{DispatchOutcome, Dispatcher, FailedJob, JobSink, RenderedJob, TransportSink};
pub use queue::{JobStatus, MAX_ATTEMPTS, PrintQueue, QueuedJob};
pub use renderer::{ReceiptMode, ReceiptRenderer};
pub use routing::{PrintJob, RouteOptions, RoutingMode, default_printer, plan};
pub use service::{PrintService, PrintServiceError, PrintServiceResult, PrinterStatus};
