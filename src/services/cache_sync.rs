//! Workshop cache synchronizer.
//!
//! A long-lived task consuming workshop lifecycle events from a bounded
//! channel and upserting them into the workshop cache. It is the only holder
//! of a [`WorkshopCacheWriter`]. A bad or failing event is logged and
//! skipped; nothing stops the loop except every sender being dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{EventRejection, WorkshopEvent};
use crate::store::WorkshopCacheWriter;

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Inserted(i32),
    Updated(i32),
    Dropped(EventRejection),
}

/// Applies workshop events to the cache.
pub struct WorkshopCacheSynchronizer {
    cache: Arc<dyn WorkshopCacheWriter>,
}

impl WorkshopCacheSynchronizer {
    pub fn new(cache: Arc<dyn WorkshopCacheWriter>) -> Self {
        Self { cache }
    }

    /// Upsert one event. Unusable events are dropped, not reported as errors.
    pub async fn apply(&self, event: WorkshopEvent) -> AppResult<SyncOutcome> {
        let snapshot = match event.into_snapshot() {
            Ok(snapshot) => snapshot,
            Err(rejection) => {
                warn!("Dropping workshop event: {}", rejection);
                return Ok(SyncOutcome::Dropped(rejection));
            }
        };

        let id = snapshot.id;
        // Last applied wins: events carry no version to order them by
        match self.cache.find_by_id(id).await? {
            Some(_) => {
                self.cache.update(snapshot).await?;
                debug!(workshop_id = id, "Workshop cache updated");
                Ok(SyncOutcome::Updated(id))
            }
            None => {
                self.cache.insert(snapshot).await?;
                debug!(workshop_id = id, "Workshop cache inserted");
                Ok(SyncOutcome::Inserted(id))
            }
        }
    }

    /// Decode a raw JSON payload and apply it.
    pub async fn handle_payload(&self, payload: &[u8]) -> AppResult<SyncOutcome> {
        match serde_json::from_slice::<WorkshopEvent>(payload) {
            Ok(event) => self.apply(event).await,
            Err(e) => {
                let rejection = EventRejection::Malformed(e.to_string());
                warn!("Dropping workshop event: {}", rejection);
                Ok(SyncOutcome::Dropped(rejection))
            }
        }
    }

    /// Consume payloads until the channel closes.
    pub async fn run(self, mut events: mpsc::Receiver<Vec<u8>>) {
        info!("Workshop cache synchronizer started");
        while let Some(payload) = events.recv().await {
            if let Err(e) = self.handle_payload(&payload).await {
                error!("Failed to apply workshop event: {}", e);
            }
        }
        info!("Workshop cache synchronizer stopped: event channel closed");
    }
}

/// Producer side of the workshop event channel.
#[derive(Clone)]
pub struct WorkshopEventSender {
    tx: mpsc::Sender<Vec<u8>>,
}

impl WorkshopEventSender {
    /// Queue a raw event payload, waiting for buffer space.
    pub async fn send(&self, payload: Vec<u8>) -> AppResult<()> {
        self.tx.send(payload).await.map_err(|_| {
            AppError::Unavailable("workshop event channel is closed".to_string())
        })
    }

    /// False once the synchronizer has stopped consuming events.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Create the bounded event channel.
pub fn workshop_event_channel(capacity: usize) -> (WorkshopEventSender, mpsc::Receiver<Vec<u8>>) {
    let (tx, rx) = mpsc::channel(capacity);
    (WorkshopEventSender { tx }, rx)
}

/// Start the synchronizer background task.
///
/// Returns the sender that event sources push into.
pub fn start_cache_sync_task(
    cache: Arc<dyn WorkshopCacheWriter>,
    capacity: usize,
) -> (WorkshopEventSender, JoinHandle<()>) {
    let (sender, events) = workshop_event_channel(capacity);
    let synchronizer = WorkshopCacheSynchronizer::new(cache);
    let handle = tokio::spawn(synchronizer.run(events));
    (sender, handle)
}
