//! Click recording and per-link statistics.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::click_worker::run_click_worker;
use crate::domain::entities::{Click, NewClick, UrlRecord};
use crate::domain::errors::CoreResult;
use crate::domain::repositories::ClickStore;

/// Default capacity of the click queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Statistics of one link.
#[derive(Debug, Clone)]
pub struct LinkStats {
    pub total: i64,
    /// Most recent clicks, newest first.
    pub items: Vec<Click>,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Queues redirect clicks for the background worker and serves statistics.
///
/// Recording never waits: when the queue is full the click is dropped and counted,
/// so a slow store cannot stall redirects.
pub struct StatsService {
    store: Arc<dyn ClickStore>,
    sender: mpsc::Sender<NewClick>,
    worker: Mutex<Option<Worker>>,
}

impl StatsService {
    /// Creates the service and spawns its worker on the current tokio runtime.
    pub fn start(store: Arc<dyn ClickStore>, capacity: usize) -> Self {
        let (sender, rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_click_worker(rx, store.clone(), cancel.clone()));

        Self {
            store,
            sender,
            worker: Mutex::new(Some(Worker { cancel, handle })),
        }
    }

    /// Queues a click. Returns false if it was dropped.
    pub fn record(&self, click: NewClick) -> bool {
        match self.sender.try_send(click) {
            Ok(()) => true,
            Err(TrySendError::Full(click)) => {
                metrics::counter!("shortlink_clicks_total", "outcome" => "dropped").increment(1);
                warn!(url_id = click.url_id, "Click queue full, dropping click");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Returns the click total and up to `limit` recent clicks of `record`.
    ///
    /// Access control is the caller's job; see
    /// [`LinkService::owned_record`](super::LinkService::owned_record).
    pub async fn for_link(&self, record: &UrlRecord, limit: i64) -> CoreResult<LinkStats> {
        let total = self.store.count_for_url(record.id).await?;
        let items = self.store.list_for_url(record.id, limit).await?;
        Ok(LinkStats { total, items })
    }

    /// Stops the worker after it has written every queued click.
    pub async fn shutdown(&self) {
        let worker = self.worker.lock().ok().and_then(|mut slot| slot.take());

        if let Some(worker) = worker {
            worker.cancel.cancel();
            let _ = worker.handle.await;
            info!("Click worker drained");
        }
    }
}
