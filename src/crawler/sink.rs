//! Progress broadcasting

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors raised by a progress sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Progress sink unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode progress: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives crawl progress updates for a project
pub trait ProgressSink: Send + Sync {
    /// Delivers a progress payload, returning the number of recipients
    fn broadcast(
        &self,
        project_id: i64,
        crawl_id: i64,
        payload: &serde_json::Value,
    ) -> Result<usize, SinkError>;
}

/// A progress update as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressMessage {
    pub project_id: i64,
    pub crawl_id: i64,
    pub payload: serde_json::Value,
}

/// In-process sink fanning progress out over a tokio broadcast channel
///
/// Slow subscribers lag and drop old messages rather than blocking the crawl.
#[derive(Debug, Clone)]
pub struct BroadcastProgressSink {
    sender: broadcast::Sender<ProgressMessage>,
}

impl BroadcastProgressSink {
    /// Creates a sink buffering up to `capacity` messages per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Registers a new subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressMessage> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastProgressSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ProgressSink for BroadcastProgressSink {
    fn broadcast(
        &self,
        project_id: i64,
        crawl_id: i64,
        payload: &serde_json::Value,
    ) -> Result<usize, SinkError> {
        let message = ProgressMessage {
            project_id,
            crawl_id,
            payload: payload.clone(),
        };

        // No subscribers is not a failure, nobody was listening
        match self.sender.send(message) {
            Ok(receivers) => Ok(receivers),
            Err(_) => Ok(0),
        }
    }
}
