//! Output sessions: the channel through which transfers leave this crate.
//!
//! A session is bound to a destination and owns whatever network resource
//! carries the transfer. The dispatcher only calls [`OutputSession::send`].
//!
//! [`channel_session`] provides an in-process session whose consumer decides
//! when (and whether) each transfer is acknowledged.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::config::DEFAULT_PAYLOAD_BOUND;
use crate::error::SessionError;
use crate::transfer::Transfer;
use crate::types::{NodeId, SubjectId};

/// Where a session sends its transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputSessionSpecifier {
    /// Message subject.
    pub subject: SubjectId,
    /// Remote node for unicast, or `None` to broadcast.
    pub remote_node: Option<NodeId>,
}

impl OutputSessionSpecifier {
    /// A broadcast message session on `subject`.
    pub fn message(subject: SubjectId) -> Self {
        Self {
            subject,
            remote_node: None,
        }
    }

    /// Check if this session broadcasts.
    pub fn is_broadcast(&self) -> bool {
        self.remote_node.is_none()
    }
}

/// Size information a session uses for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadMetadata {
    /// Largest transfer payload, in bytes, the session accepts.
    pub extent_bytes: usize,
}

impl PayloadMetadata {
    pub fn new(extent_bytes: usize) -> Self {
        Self { extent_bytes }
    }

    /// Reject payloads longer than the extent.
    pub fn admit(&self, payload_len: usize) -> Result<(), SessionError> {
        if payload_len > self.extent_bytes {
            return Err(SessionError::PayloadExceedsBound {
                size: payload_len,
                bound: self.extent_bytes,
            });
        }
        Ok(())
    }
}

impl Default for PayloadMetadata {
    fn default() -> Self {
        Self::new(DEFAULT_PAYLOAD_BOUND)
    }
}

/// A transmit channel bound to one destination.
///
/// Implementations serialize concurrent `send` calls themselves and hand
/// fragments to the network in sequence order.
#[async_trait]
pub trait OutputSession: Send + Sync {
    /// The destination this session is bound to.
    fn specifier(&self) -> &OutputSessionSpecifier;

    /// Admission limits for this session.
    fn payload_metadata(&self) -> PayloadMetadata;

    /// Transmit `transfer`, completing once the session has accepted it.
    ///
    /// `deadline` is the latest time any frame may be handed to the network.
    async fn send(&self, transfer: Transfer, deadline: Instant) -> Result<(), SessionError>;
}

#[async_trait]
impl<S: OutputSession + ?Sized> OutputSession for std::sync::Arc<S> {
    fn specifier(&self) -> &OutputSessionSpecifier {
        (**self).specifier()
    }

    fn payload_metadata(&self) -> PayloadMetadata {
        (**self).payload_metadata()
    }

    async fn send(&self, transfer: Transfer, deadline: Instant) -> Result<(), SessionError> {
        (**self).send(transfer, deadline).await
    }
}

/// A transfer waiting for its consumer to acknowledge it.
#[derive(Debug)]
pub struct PendingTransfer {
    /// The submitted transfer.
    pub transfer: Transfer,
    /// The sender's deadline.
    pub deadline: Instant,
    ack: oneshot::Sender<Result<(), SessionError>>,
}

impl PendingTransfer {
    /// Report successful transmission to the sender.
    pub fn acknowledge(self) {
        // The sender may have stopped waiting; nothing to report then.
        let _ = self.ack.send(Ok(()));
    }

    /// Report a transport fault to the sender.
    pub fn fail(self, error: SessionError) {
        let _ = self.ack.send(Err(error));
    }
}

/// The consuming half of a channel session.
#[derive(Debug)]
pub struct TransferReceiver {
    rx: mpsc::Receiver<PendingTransfer>,
}

impl TransferReceiver {
    /// Wait for the next submitted transfer.
    ///
    /// Returns `None` once every session handle is dropped.
    pub async fn recv(&mut self) -> Option<PendingTransfer> {
        self.rx.recv().await
    }

    /// Take a submitted transfer if one is queued.
    pub fn try_recv(&mut self) -> Option<PendingTransfer> {
        self.rx.try_recv().ok()
    }
}

/// An in-process output session backed by a bounded queue.
#[derive(Debug, Clone)]
pub struct ChannelOutputSession {
    specifier: OutputSessionSpecifier,
    metadata: PayloadMetadata,
    tx: mpsc::Sender<PendingTransfer>,
}

/// Create a channel session and its consumer.
///
/// `capacity` bounds the number of transfers queued but not yet received.
///
/// # Panics
///
/// Panics if `capacity` is 0.
pub fn channel_session(
    specifier: OutputSessionSpecifier,
    metadata: PayloadMetadata,
    capacity: usize,
) -> (ChannelOutputSession, TransferReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        ChannelOutputSession {
            specifier,
            metadata,
            tx,
        },
        TransferReceiver { rx },
    )
}

#[async_trait]
impl OutputSession for ChannelOutputSession {
    fn specifier(&self) -> &OutputSessionSpecifier {
        &self.specifier
    }

    fn payload_metadata(&self) -> PayloadMetadata {
        self.metadata
    }

    async fn send(&self, transfer: Transfer, deadline: Instant) -> Result<(), SessionError> {
        self.metadata.admit(transfer.payload_len())?;

        let (ack, completion) = oneshot::channel();
        let pending = PendingTransfer {
            transfer,
            deadline,
            ack,
        };
        self.tx
            .send(pending)
            .await
            .map_err(|_| SessionError::Closed)?;

        completion.await.map_err(|_| SessionError::Closed)?
    }
}
