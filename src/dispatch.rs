//! Transfer dispatch with a deadline.
//!
//! The dispatcher is stateless: transfer IDs come from the caller (see
//! [`TransferIdSequence`](crate::transfer::TransferIdSequence)) and the
//! destination is whatever the supplied session is bound to.

use bytes::Bytes;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, SessionError, TxError};
use crate::session::OutputSession;
use crate::transfer::Transfer;
use crate::types::{Priority, TransferId};

/// Confirmation that an output session accepted a transfer before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// ID of the accepted transfer.
    pub transfer_id: TransferId,
    /// Number of fragments handed to the session.
    pub fragments: usize,
    /// Payload bytes handed to the session.
    pub bytes: usize,
    /// Time the session reported completion.
    pub accepted_at: Instant,
}

/// Packages fragments into transfers and submits them to output sessions.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<C = SystemClock> {
    clock: C,
}

impl Dispatcher<SystemClock> {
    /// Create a dispatcher on the tokio clock.
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> Dispatcher<C> {
    /// Create a dispatcher with a custom time source.
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Get the time source.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Submit `fragments` as one transfer and wait for the session to accept it.
    ///
    /// `transfer_id` is forwarded as given; callers keep it increasing per session.
    ///
    /// # Errors
    ///
    /// - [`TxError::DeadlineInPast`] if `deadline` is not after the current time.
    /// - [`TxError::Timeout`] if the session has not completed by `deadline`,
    ///   or reports [`SessionError::DeadlineElapsed`]. Fragments already
    ///   handed over may still be transmitted.
    /// - [`TxError::TransportFailure`] with the session's fault, unretried.
    pub async fn dispatch<S>(
        &self,
        session: &S,
        fragments: Vec<Bytes>,
        priority: Priority,
        transfer_id: TransferId,
        deadline: Instant,
    ) -> Result<Ack>
    where
        S: OutputSession + ?Sized,
    {
        let now = self.clock.now();
        if deadline <= now {
            return Err(TxError::DeadlineInPast);
        }
        // The deadline is on the injected clock; the wait runs on tokio's timer.
        let wait_until = Instant::now() + deadline.saturating_duration_since(now);

        let transfer = Transfer::new(self.clock.timestamp(), priority, transfer_id, fragments);
        let fragment_count = transfer.fragment_count();
        let bytes = transfer.payload_len();
        let subject = session.specifier().subject;

        debug!(
            %transfer_id,
            %priority,
            %subject,
            fragments = fragment_count,
            bytes,
            "submitting transfer"
        );

        match timeout_at(wait_until, session.send(transfer, wait_until)).await {
            Ok(Ok(())) => {
                let accepted_at = self.clock.now();
                debug!(%transfer_id, "transfer accepted");
                Ok(Ack {
                    transfer_id,
                    fragments: fragment_count,
                    bytes,
                    accepted_at,
                })
            }
            Ok(Err(SessionError::DeadlineElapsed)) | Err(_) => {
                warn!(%transfer_id, "transfer not accepted before deadline");
                Err(TxError::Timeout)
            }
            Ok(Err(error)) => {
                warn!(%transfer_id, %error, "output session failed");
                Err(TxError::TransportFailure(error))
            }
        }
    }
}
