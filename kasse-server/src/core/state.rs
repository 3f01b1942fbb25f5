use std::sync::Arc;

use serde::Serialize;
use shared::error::{AppError, AppResult};
use shared::order::Order;

use crate::archive::ReceiptArchive;
use crate::catalog::CatalogService;
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::Storage;
use crate::orders::{OrderChange, OrdersManager, Settlement};
use crate::printing::{
    DispatchOutcome, Dispatcher, FailedJob, JobSink, PrintQueue, PrintService, ReceiptRenderer,
    TransportSink,
};
use crate::session::SessionRegistry;
use kasse_printer::RelayClient;

/// Result of a checkout: the recorded order and how printing went
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub print: DispatchOutcome,
}

/// Server state - shared handles to every service
///
/// Cheap to clone; every field is a handle.
///
/// | Field | Purpose |
/// |-------|---------|
/// | config | Immutable configuration |
/// | storage | redb document store |
/// | catalog | Categories, products, tables, printers, deposit |
/// | sessions | In-memory terminal carts |
/// | orders | Order and tab authority |
/// | printing | Routing, rendering, dispatch, retry queue |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub storage: Storage,
    pub catalog: CatalogService,
    pub sessions: Arc<SessionRegistry>,
    pub orders: Arc<OrdersManager>,
    pub printing: PrintService,
}

impl ServerState {
    /// Open the database under `work_dir` and build all services
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        let storage = Storage::open(config.database_path())?;
        tracing::info!(path = %config.database_path().display(), "Database opened");
        Self::with_storage(config, storage)
    }

    /// Build all services on an existing storage (tests use an in-memory one)
    pub fn with_storage(config: &Config, storage: Storage) -> anyhow::Result<Self> {
        let relay = config
            .print_relay_url
            .as_deref()
            .map(RelayClient::new)
            .transpose()?;
        if relay.is_none() {
            tracing::warn!("PRINT_RELAY_URL not set, relay printers will fail");
        }
        let sink = Arc::new(TransportSink::new(relay.clone(), config.print_timeout()));
        Ok(Self::assemble(config, storage, sink, relay))
    }

    /// Wire the services around a print sink
    pub fn assemble(
        config: &Config,
        storage: Storage,
        sink: Arc<dyn JobSink>,
        relay: Option<RelayClient>,
    ) -> Self {
        let catalog = CatalogService::new(storage.clone(), config.default_deposit);
        let archive = ReceiptArchive::new(storage.clone(), config.timezone);
        let printing = PrintService::new(
            catalog.clone(),
            archive,
            ReceiptRenderer::new(config.venue.clone(), config.timezone),
            config.routing_mode,
            Dispatcher::new(sink.clone(), config.print_timeout()),
            PrintQueue::new(sink, config.print_timeout()),
            relay,
        )
        .with_route_options(config.route_options());

        Self {
            config: config.clone(),
            orders: Arc::new(OrdersManager::new(storage.clone(), config.timezone)),
            storage,
            catalog,
            sessions: Arc::new(SessionRegistry::new()),
            printing,
        }
    }

    /// Start the print queue worker and the order change listener
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();
        let shutdown = tasks.shutdown_token();

        let queue = self.printing.queue().clone();
        tasks.spawn("print_queue", TaskKind::Worker, queue.run(shutdown.clone()));

        let mut changes = self.orders.subscribe();
        tasks.spawn("order_changes", TaskKind::Listener, async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    change = changes.recv() => match change {
                        Ok(OrderChange::OrderCreated { order_id }) => {
                            tracing::debug!(order_id = %order_id, "Order created");
                        }
                        Ok(OrderChange::TabUpdated { table_id, total_amount }) => {
                            tracing::debug!(table_id = %table_id, total = %total_amount, "Tab updated");
                        }
                        Ok(OrderChange::TabSettled { table_id, order_ids }) => {
                            tracing::debug!(table_id = %table_id, orders = order_ids.len(), "Tab settled");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Order change listener lagged");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        tasks.log_summary();
        tasks
    }

    /// Check out a terminal's cart
    ///
    /// The order is committed and the cart cleared under the session lock,
    /// so one cart becomes at most one order. Nothing after the commit can
    /// fail the call; printing happens afterwards and its failures only show
    /// up in the outcome.
    pub async fn checkout(
        &self,
        terminal_id: &str,
        settlement: Settlement,
    ) -> AppResult<CheckoutOutcome> {
        let deposit_value = self.catalog.deposit_per_glass()?;
        let order = self
            .sessions
            .with_session(terminal_id, |session| -> AppResult<Order> {
                let order = self.orders.checkout(session.checkout_request(settlement))?;
                session.clear(deposit_value);
                Ok(order)
            })?;

        let print = match self.printing.print_order(&order).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Printing skipped");
                DispatchOutcome {
                    sent: Vec::new(),
                    failed: vec![FailedJob {
                        printer_id: String::new(),
                        printer: "*".into(),
                        error: AppError::from(e).message,
                    }],
                }
            }
        };

        Ok(CheckoutOutcome { order, print })
    }
}
