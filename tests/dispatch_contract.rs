//! Dispatcher behaviour against custom output sessions.
#![cfg(feature = "tokio")]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;
use uavcan_tx::{
    Dispatcher, OutputSession, OutputSessionSpecifier, PayloadMetadata, Priority, SessionError,
    SubjectId, Transfer, TransferId, TxError,
};

/// How a [`ScriptedSession`] completes each send.
#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Accept,
    AcceptAfter(Duration),
    Hang,
    Overrun,
    Refuse,
}

#[derive(Debug)]
struct ScriptedSession {
    specifier: OutputSessionSpecifier,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl ScriptedSession {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            specifier: OutputSessionSpecifier::message(SubjectId::new(73).unwrap()),
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutputSession for ScriptedSession {
    fn specifier(&self) -> &OutputSessionSpecifier {
        &self.specifier
    }

    fn payload_metadata(&self) -> PayloadMetadata {
        PayloadMetadata::default()
    }

    async fn send(&self, _transfer: Transfer, _deadline: Instant) -> Result<(), SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Accept => Ok(()),
            Behaviour::AcceptAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Overrun => Err(SessionError::DeadlineElapsed),
            Behaviour::Refuse => Err(SessionError::Closed),
        }
    }
}

fn fragments() -> Vec<Bytes> {
    vec![Bytes::from_static(b"abc"), Bytes::from_static(b"de")]
}

#[tokio::test(start_paused = true)]
async fn hanging_session_times_out_at_deadline() {
    let session = ScriptedSession::new(Behaviour::Hang);
    let dispatcher = Dispatcher::new();
    let deadline = Instant::now() + Duration::from_millis(250);

    let result = dispatcher
        .dispatch(&session, fragments(), Priority::Nominal, TransferId(1), deadline)
        .await;

    assert!(matches!(result, Err(TxError::Timeout)));
    assert!(result.unwrap_err().is_recoverable());
    assert!(Instant::now() >= deadline);
    assert!(Instant::now() - deadline < Duration::from_millis(5));
    assert_eq!(session.calls(), 1);
}

#[tokio::test]
async fn session_reporting_elapsed_deadline_is_timeout() {
    let session = ScriptedSession::new(Behaviour::Overrun);
    let dispatcher = Dispatcher::new();
    let deadline = Instant::now() + Duration::from_secs(1);

    let result = dispatcher
        .dispatch(&session, fragments(), Priority::Nominal, TransferId(1), deadline)
        .await;

    assert!(matches!(result, Err(TxError::Timeout)));
    assert_eq!(session.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_session_within_deadline_is_acknowledged() {
    let session = ScriptedSession::new(Behaviour::AcceptAfter(Duration::from_millis(100)));
    let dispatcher = Dispatcher::new();
    let start = Instant::now();

    let ack = dispatcher
        .dispatch(
            &session,
            fragments(),
            Priority::Fast,
            TransferId(2),
            start + Duration::from_millis(250),
        )
        .await
        .unwrap();

    let elapsed = ack.accepted_at - start;
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(250));
    assert_eq!(ack.bytes, 5);
}

#[tokio::test(start_paused = true)]
async fn past_deadline_never_reaches_session() {
    let session = ScriptedSession::new(Behaviour::Accept);
    let dispatcher = Dispatcher::new();

    let result = dispatcher
        .dispatch(&session, fragments(), Priority::Nominal, TransferId(0), Instant::now())
        .await;

    assert!(matches!(result, Err(TxError::DeadlineInPast)));
    assert_eq!(session.calls(), 0);
}

#[tokio::test]
async fn session_fault_is_wrapped_not_retried() {
    let session = ScriptedSession::new(Behaviour::Refuse);
    let dispatcher = Dispatcher::new();
    let deadline = Instant::now() + Duration::from_secs(1);

    let result = dispatcher
        .dispatch(&session, fragments(), Priority::Nominal, TransferId(0), deadline)
        .await;

    assert!(matches!(
        result,
        Err(TxError::TransportFailure(SessionError::Closed))
    ));
    assert_eq!(session.calls(), 1);
}

#[tokio::test]
async fn dispatch_through_trait_object() {
    let session: Arc<dyn OutputSession> = Arc::new(ScriptedSession::new(Behaviour::Accept));
    let dispatcher = Dispatcher::new();
    let deadline = Instant::now() + Duration::from_secs(1);

    let ack = dispatcher
        .dispatch(&session, fragments(), Priority::Optional, TransferId(7), deadline)
        .await
        .unwrap();

    assert_eq!(ack.transfer_id, TransferId(7));
    assert_eq!(ack.fragments, 2);
}
