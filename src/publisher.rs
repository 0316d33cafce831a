//! Message publisher: payload in, acknowledged transfer out.

use bytes::Bytes;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::PublisherConfig;
use crate::crc::crc32c;
use crate::dispatch::{Ack, Dispatcher};
use crate::error::Result;
use crate::fragment::fragment;
use crate::payload::Payload;
use crate::session::{OutputSession, OutputSessionSpecifier, PayloadMetadata};
use crate::transfer::TransferIdSequence;
use crate::udp::{UdpOutputSession, UdpTransport};

/// Publishes payloads on one output session.
///
/// Every call to [`publish`](Self::publish) consumes one transfer ID, whether
/// or not the transfer is acknowledged.
#[derive(Debug)]
pub struct Publisher<S, C = SystemClock> {
    session: S,
    dispatcher: Dispatcher<C>,
    sequence: TransferIdSequence,
    config: PublisherConfig,
}

impl Publisher<UdpOutputSession> {
    /// Open a UDP session for `config.subject` and wrap it in a publisher.
    pub async fn udp(config: PublisherConfig) -> Result<Self> {
        config.validate()?;
        let session = UdpTransport::from_config(&config)
            .output_session(
                OutputSessionSpecifier::message(config.subject),
                PayloadMetadata::new(config.payload_bound),
            )
            .await?;
        Self::new(session, config)
    }
}

impl<S: OutputSession> Publisher<S> {
    /// Create a publisher on an existing session.
    pub fn new(session: S, config: PublisherConfig) -> Result<Self> {
        Self::with_clock(session, config, SystemClock)
    }
}

impl<S: OutputSession, C: Clock> Publisher<S, C> {
    /// Create a publisher with a custom time source.
    pub fn with_clock(session: S, config: PublisherConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session,
            dispatcher: Dispatcher::with_clock(clock),
            sequence: TransferIdSequence::new(),
            config,
        })
    }

    /// Send `payload` as one transfer, waiting at most the configured timeout.
    pub async fn publish(&self, payload: &Payload) -> Result<Ack> {
        self.publish_raw(payload.as_bytes().clone()).await
    }

    /// Send arbitrary bytes as one transfer.
    pub async fn publish_raw(&self, bytes: Bytes) -> Result<Ack> {
        info!(
            len = bytes.len(),
            crc = format_args!("{:#010x}", crc32c(&bytes)),
            subject = %self.config.subject,
            "publishing payload"
        );

        let fragments = if self.config.fragment_locally {
            fragment(bytes, self.config.max_fragment_size)?
        } else if bytes.is_empty() {
            Vec::new()
        } else {
            vec![bytes]
        };

        let transfer_id = self.sequence.next_id();
        let deadline = self.dispatcher.clock().now() + self.config.send_timeout;

        self.dispatcher
            .dispatch(
                &self.session,
                fragments,
                self.config.priority,
                transfer_id,
                deadline,
            )
            .await
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// The ID the next publish will use.
    pub fn next_transfer_id(&self) -> crate::types::TransferId {
        self.sequence.peek()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TxError;
    use crate::payload::{EtherType, MacAddress};
    use crate::session::{ChannelOutputSession, TransferReceiver, channel_session};
    use crate::types::{Priority, TransferId};
    use std::time::Duration;

    fn channel(config: &PublisherConfig) -> (ChannelOutputSession, TransferReceiver) {
        channel_session(
            OutputSessionSpecifier::message(config.subject),
            PayloadMetadata::new(config.payload_bound),
            8,
        )
    }

    fn payload(len: usize) -> Payload {
        Payload::build(
            MacAddress([0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5]),
            MacAddress([0xb0, 0xb1, 0xb2, 0xb3, 0xb4, 0xb5]),
            EtherType::IPV4,
            vec![b'x'; len],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_publish_fragments_and_acks() {
        let config = PublisherConfig::new().with_priority(Priority::Low);
        let (session, mut rx) = channel(&config);
        let publisher = Publisher::new(session, config).unwrap();

        let consumer = tokio::spawn(async move {
            let pending = rx.recv().await.unwrap();
            let transfer = pending.transfer.clone();
            pending.acknowledge();
            transfer
        });

        let payload = payload(2484);
        let ack = publisher.publish(&payload).await.unwrap();
        assert_eq!(ack.transfer_id, TransferId(0));
        assert_eq!(ack.fragments, 3);
        assert_eq!(ack.bytes, 2500);

        let transfer = consumer.await.unwrap();
        assert_eq!(transfer.priority(), Priority::Low);
        assert_eq!(transfer.payload(), *payload.as_bytes());
        assert_eq!(
            transfer.fragments().iter().map(|f| f.len()).collect::<Vec<_>>(),
            vec![1000, 1000, 500]
        );
    }

    #[tokio::test]
    async fn test_publish_without_local_fragmentation() {
        let config = PublisherConfig::new().without_local_fragmentation();
        let (session, mut rx) = channel(&config);
        let publisher = Publisher::new(session, config).unwrap();

        tokio::spawn(async move {
            let pending = rx.recv().await.unwrap();
            assert_eq!(pending.transfer.fragment_count(), 1);
            pending.acknowledge();
        });

        let ack = publisher.publish(&payload(2484)).await.unwrap();
        assert_eq!(ack.fragments, 1);
        assert_eq!(ack.bytes, 2500);
    }

    #[tokio::test]
    async fn test_transfer_ids_advance_per_publish() {
        let config = PublisherConfig::new();
        let (session, mut rx) = channel(&config);
        let publisher = Publisher::new(session, config).unwrap();

        tokio::spawn(async move {
            while let Some(pending) = rx.recv().await {
                pending.acknowledge();
            }
        });

        for expected in 0..3 {
            let ack = publisher.publish_raw(Bytes::from_static(b"ping")).await.unwrap();
            assert_eq!(ack.transfer_id, TransferId(expected));
        }
        assert_eq!(publisher.next_transfer_id(), TransferId(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_timeout_consumes_transfer_id() {
        let config = PublisherConfig::new().with_send_timeout(Duration::from_millis(50));
        let (session, _rx) = channel(&config);
        let publisher = Publisher::new(session, config).unwrap();

        // Nobody acknowledges.
        let result = publisher.publish(&payload(10)).await;
        assert!(matches!(result, Err(TxError::Timeout)));
        assert_eq!(publisher.next_transfer_id(), TransferId(1));
    }

    #[tokio::test]
    async fn test_publish_over_bound_is_transport_failure() {
        let config = PublisherConfig::new().with_payload_bound(100);
        let (session, _rx) = channel(&config);
        let publisher = Publisher::new(session, config).unwrap();

        let result = publisher.publish(&payload(100)).await;
        assert!(matches!(result, Err(TxError::TransportFailure(_))));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PublisherConfig::new().with_max_fragment_size(0);
        let (session, _rx) = channel(&config);
        assert!(matches!(
            Publisher::new(session, config),
            Err(TxError::InvalidFragmentSize(0))
        ));
    }
}
