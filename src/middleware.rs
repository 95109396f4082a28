//! Outbound reply routing.
//!
//! Handlers reply through [`Context::send`](crate::Context::send), which hands
//! an [`Outgoing`] to the client's [`Transport`]. [`ResponseMiddleware`] covers
//! the two transports the crate ships: a channel to a writer task, and an
//! in-memory buffer used by tests and dry runs.
//!
//! # Slow consumers
//!
//! The direct transport waits at most [`SEND_TIMEOUT`] for queue space. A
//! writer that stops draining makes replies fail with
//! [`TransportError::Timeout`] instead of stalling every handler.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

/// Timeout for attempting to send to a slow consumer before giving up.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// A reply destined for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub channel_id: String,
    pub content: String,
}

impl Outgoing {
    pub fn new(channel_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Anything that can deliver replies.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: Outgoing) -> Result<(), TransportError>;
}

/// Direct forwards to a writer task; Capturing buffers for inspection.
#[derive(Debug, Clone)]
pub enum ResponseMiddleware {
    Direct(mpsc::Sender<Outgoing>),
    Capturing(Arc<Mutex<Vec<Outgoing>>>),
}

impl ResponseMiddleware {
    /// A capturing middleware with an empty buffer.
    pub fn capturing() -> Self {
        Self::Capturing(Arc::new(Mutex::new(Vec::new())))
    }

    /// Drain everything captured so far. Direct middleware returns nothing.
    pub async fn take_captured(&self) -> Vec<Outgoing> {
        match self {
            Self::Direct(_) => Vec::new(),
            Self::Capturing(buf) => std::mem::take(&mut *buf.lock().await),
        }
    }
}

#[async_trait]
impl Transport for ResponseMiddleware {
    async fn send(&self, message: Outgoing) -> Result<(), TransportError> {
        match self {
            Self::Direct(tx) => match tokio::time::timeout(SEND_TIMEOUT, tx.send(message)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(_)) => Err(TransportError::Closed),
                Err(_elapsed) => {
                    tracing::warn!(
                        "reply queue full: writer not draining (timeout after {:?})",
                        SEND_TIMEOUT
                    );
                    Err(TransportError::Timeout(SEND_TIMEOUT))
                }
            },
            Self::Capturing(buf) => {
                buf.lock().await.push(message);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capturing_buffers_in_order() {
        let mw = ResponseMiddleware::capturing();
        mw.send(Outgoing::new("c1", "one")).await.unwrap();
        mw.send(Outgoing::new("c1", "two")).await.unwrap();
        let captured = mw.take_captured().await;
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[1].content, "two");
        assert!(mw.take_captured().await.is_empty());
    }

    #[tokio::test]
    async fn test_direct_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mw = ResponseMiddleware::Direct(tx);
        let err = mw.send(Outgoing::new("c1", "hi")).await.unwrap_err();
        assert_eq!(err, TransportError::Closed);
    }

    #[tokio::test]
    async fn test_direct_forwards() {
        let (tx, mut rx) = mpsc::channel(4);
        let mw = ResponseMiddleware::Direct(tx);
        mw.send(Outgoing::new("c1", "hi")).await.unwrap();
        assert_eq!(rx.recv().await, Some(Outgoing::new("c1", "hi")));
    }
}
