//! Print retry queue
//!
//! Reprints and test pages go through this queue instead of the one-shot
//! dispatcher. A single worker sends one job at a time and retries failures
//! with a linear backoff.
//!
//! ```text
//! pending -> printing -> success
//!                     -> retrying -> printing -> ...
//!                     -> failed (after MAX_ATTEMPTS)
//! ```
//!
//! The job list is published on a `watch` channel after every change.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatch::{JobSink, RenderedJob, send_with_timeout};

/// Attempts per job before it is marked failed
pub const MAX_ATTEMPTS: u32 = 3;

/// Backoff unit: the wait before attempt `n + 1` is `n` times this
pub const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Worker wake-up interval while nothing is scheduled
const IDLE_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Printing,
    Success,
    Retrying,
    Failed,
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

/// Public view of a queued job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedJob {
    pub id: String,
    pub printer_id: String,
    pub printer_name: String,
    /// What is being printed, e.g. "Reprint 3f2a..." or "Testdruck"
    pub description: String,
    pub status: JobStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct Entry {
    view: QueuedJob,
    job: RenderedJob,
    ready_at: Instant,
}

impl Entry {
    fn is_runnable(&self, now: Instant) -> bool {
        match self.view.status {
            JobStatus::Pending => true,
            JobStatus::Retrying => self.ready_at <= now,
            _ => false,
        }
    }

    fn set_status(&mut self, status: JobStatus) {
        self.view.status = status;
        self.view.updated_at = Utc::now();
    }
}

struct Inner {
    entries: Mutex<Vec<Entry>>,
    state_tx: watch::Sender<Vec<QueuedJob>>,
    wakeup: Notify,
    sink: Arc<dyn JobSink>,
    timeout: Duration,
    backoff: Duration,
}

/// Print retry queue, cheap to clone
#[derive(Clone)]
pub struct PrintQueue {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PrintQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintQueue")
            .field("jobs", &self.inner.entries.lock().len())
            .finish_non_exhaustive()
    }
}

impl PrintQueue {
    pub fn new(sink: Arc<dyn JobSink>, timeout: Duration) -> Self {
        Self::with_backoff(sink, timeout, RETRY_BACKOFF)
    }

    pub fn with_backoff(sink: Arc<dyn JobSink>, timeout: Duration, backoff: Duration) -> Self {
        let (state_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(Vec::new()),
                state_tx,
                wakeup: Notify::new(),
                sink,
                timeout,
                backoff,
            }),
        }
    }

    /// Live job list
    pub fn subscribe(&self) -> watch::Receiver<Vec<QueuedJob>> {
        self.inner.state_tx.subscribe()
    }

    pub fn jobs(&self) -> Vec<QueuedJob> {
        self.inner.entries.lock().iter().map(|e| e.view.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<QueuedJob> {
        self.inner
            .entries
            .lock()
            .iter()
            .find(|e| e.view.id == id)
            .map(|e| e.view.clone())
    }

    fn publish(&self, entries: &[Entry]) {
        self.inner
            .state_tx
            .send_replace(entries.iter().map(|e| e.view.clone()).collect());
    }

    /// Queue a rendered job, returns its id
    pub fn enqueue(&self, job: RenderedJob, description: impl Into<String>) -> String {
        let now = Utc::now();
        let view = QueuedJob {
            id: uuid::Uuid::new_v4().to_string(),
            printer_id: job.printer.id.clone(),
            printer_name: job.printer.display_name.clone(),
            description: description.into(),
            status: JobStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        let id = view.id.clone();
        {
            let mut entries = self.inner.entries.lock();
            entries.push(Entry {
                view,
                job,
                ready_at: Instant::now(),
            });
            self.publish(&entries);
        }
        debug!(job_id = %id, "Print job queued");
        self.inner.wakeup.notify_one();
        id
    }

    /// Remove a job that has not started yet
    pub fn cancel(&self, id: &str) -> bool {
        let mut entries = self.inner.entries.lock();
        let Some(idx) = entries
            .iter()
            .position(|e| e.view.id == id && e.view.status == JobStatus::Pending)
        else {
            return false;
        };
        entries.remove(idx);
        self.publish(&entries);
        true
    }

    /// Put a failed job back in line with a fresh attempt budget
    pub fn retry(&self, id: &str) -> bool {
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries
            .iter_mut()
            .find(|e| e.view.id == id && e.view.status == JobStatus::Failed)
        else {
            return false;
        };
        entry.view.attempts = 0;
        entry.view.last_error = None;
        entry.ready_at = Instant::now();
        entry.set_status(JobStatus::Pending);
        self.publish(&entries);
        drop(entries);
        self.inner.wakeup.notify_one();
        true
    }

    /// Drop succeeded and failed jobs, returns how many were removed
    pub fn clear_completed(&self) -> usize {
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|e| !e.view.status.is_finished());
        let removed = before - entries.len();
        if removed > 0 {
            self.publish(&entries);
        }
        removed
    }

    /// Claim the next runnable job, marking it printing
    fn claim(&self) -> Option<(String, RenderedJob)> {
        let now = Instant::now();
        let mut entries = self.inner.entries.lock();
        let entry = entries.iter_mut().find(|e| e.is_runnable(now))?;
        entry.view.attempts += 1;
        entry.set_status(JobStatus::Printing);
        let claimed = (entry.view.id.clone(), entry.job.clone());
        self.publish(&entries);
        Some(claimed)
    }

    /// Time until the earliest scheduled retry
    fn next_wakeup(&self) -> Duration {
        let now = Instant::now();
        self.inner
            .entries
            .lock()
            .iter()
            .filter(|e| e.view.status == JobStatus::Retrying)
            .map(|e| e.ready_at.saturating_duration_since(now))
            .min()
            .unwrap_or(IDLE_WAIT)
    }

    fn finish(&self, id: &str, result: Result<(), String>) {
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries.iter_mut().find(|e| e.view.id == id) else {
            return;
        };
        match result {
            Ok(()) => {
                entry.view.last_error = None;
                entry.set_status(JobStatus::Success);
                info!(job_id = %id, printer = %entry.view.printer_name, "Queued print job done");
            }
            Err(error) => {
                let attempts = entry.view.attempts;
                entry.view.last_error = Some(error.clone());
                if attempts >= MAX_ATTEMPTS {
                    entry.set_status(JobStatus::Failed);
                    warn!(job_id = %id, attempts, error = %error, "Print job failed for good");
                } else {
                    entry.ready_at = Instant::now() + self.inner.backoff * attempts;
                    entry.set_status(JobStatus::Retrying);
                    warn!(job_id = %id, attempts, error = %error, "Print job failed, retrying");
                }
            }
        }
        self.publish(&entries);
    }

    /// Worker loop, runs until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Print queue worker started");
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            if let Some((id, job)) = self.claim() {
                let result = send_with_timeout(self.inner.sink.as_ref(), &job, self.inner.timeout)
                    .await
                    .map_err(|e| e.to_string());
                self.finish(&id, result);
                continue;
            }
            let wait = self.next_wakeup();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.inner.wakeup.notified() => {}
                _ = tokio::time::sleep(wait) => {}
            }
        }
        info!("Print queue worker stopped");
    }
}
