//! Background persistence of redirect clicks.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::entities::NewClick;
use crate::domain::repositories::ClickStore;

/// Drains `rx` into `store` until the channel closes or `cancel` fires.
///
/// On cancellation the channel is closed and every click already queued is still
/// written before the worker returns. A failed write is logged and counted; it
/// never stops the worker.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<NewClick>,
    store: Arc<dyn ClickStore>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            click = rx.recv() => match click {
                Some(click) => persist(store.as_ref(), click).await,
                None => break,
            },
            _ = cancel.cancelled() => {
                rx.close();
                while let Some(click) = rx.recv().await {
                    persist(store.as_ref(), click).await;
                }
                break;
            }
        }
    }

    debug!("Click worker stopped");
}

async fn persist(store: &dyn ClickStore, click: NewClick) {
    let url_id = click.url_id;
    match store.record(click).await {
        Ok(_) => metrics::counter!("shortlink_clicks_total", "outcome" => "recorded").increment(1),
        Err(e) => {
            metrics::counter!("shortlink_clicks_total", "outcome" => "failed").increment(1);
            warn!(url_id, error = %e, "Failed to record click");
        }
    }
}
