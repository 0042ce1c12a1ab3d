//! crates/reviewiz_core/src/feed.rs
//!
//! In-process change notifications backing the live `watch_*` queries.
//! A store publishes a `Change` after every write; each subscription re-reads its
//! result set when a matching change arrives and yields the fresh snapshot.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use uuid::Uuid;

use crate::domain::UserId;
use crate::ports::{PortResult, SnapshotStream};

const FEED_CAPACITY: usize = 256;

/// Which query result set a write may have affected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Change {
    Employees { user_id: UserId },
    Notes { user_id: UserId, employee_id: Uuid },
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Change>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }
}

impl ChangeFeed {
    /// Fans a change out to every live subscription. Having no subscribers is fine.
    pub fn publish(&self, change: Change) {
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.tx.subscribe()
    }

    /// Number of open subscriptions; zero once every stream has been dropped.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Builds a live query over this feed.
    ///
    /// The receiver is taken before the first read so no change between the initial
    /// snapshot and the first `recv` can be lost.
    pub fn snapshots<T, M, F, Fut>(&self, matches: M, fetch: F) -> SnapshotStream<T>
    where
        T: Send + 'static,
        M: Fn(&Change) -> bool + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = PortResult<Vec<T>>> + Send + 'static,
    {
        let mut rx = self.subscribe();
        Box::pin(async_stream::stream! {
            yield fetch().await;
            loop {
                match rx.recv().await {
                    Ok(change) if matches(&change) => yield fetch().await,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Live query lagged behind by {} changes; re-reading.", skipped);
                        yield fetch().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
