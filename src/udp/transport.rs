//! Async UDP output sessions.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::endpoint::subject_endpoint;
use super::header::{FrameHeader, HEADER_SIZE};
use super::{DEFAULT_MTU, FrameSplit, TRANSFER_CRC_SIZE};
use crate::config::PublisherConfig;
use crate::crc::Crc32c;
use crate::error::{Result, SessionError, TxError};
use crate::session::{OutputSession, OutputSessionSpecifier, PayloadMetadata};
use crate::transfer::Transfer;
use crate::types::NodeId;

/// Frame indices are 31 bits wide.
const MAX_FRAMES: usize = 1 << 31;

/// Factory for UDP output sessions sharing one set of link settings.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    local_addr: Ipv4Addr,
    mtu: usize,
    split: FrameSplit,
    source_node: Option<NodeId>,
    remote: Option<SocketAddr>,
}

impl UdpTransport {
    /// Create a transport on the interface with address `local_addr`.
    pub fn new(local_addr: Ipv4Addr) -> Self {
        Self {
            local_addr,
            mtu: DEFAULT_MTU,
            split: FrameSplit::default(),
            source_node: None,
            remote: None,
        }
    }

    /// Create a transport from publisher settings.
    pub fn from_config(config: &PublisherConfig) -> Self {
        Self {
            local_addr: config.local_addr,
            mtu: config.mtu,
            split: config.frame_split,
            source_node: config.source_node,
            remote: config.remote,
        }
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn with_frame_split(mut self, split: FrameSplit) -> Self {
        self.split = split;
        self
    }

    pub fn with_source_node(mut self, node: NodeId) -> Self {
        self.source_node = Some(node);
        self
    }

    /// Send to `remote` instead of the subject's multicast group.
    pub fn with_remote(mut self, remote: SocketAddr) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Open a session for `specifier`, binding a fresh socket.
    pub async fn output_session(
        &self,
        specifier: OutputSessionSpecifier,
        metadata: PayloadMetadata,
    ) -> Result<UdpOutputSession> {
        if self.mtu <= HEADER_SIZE {
            return Err(TxError::invalid_config(format!(
                "MTU of {} bytes leaves no room after the {HEADER_SIZE}-byte frame header",
                self.mtu
            )));
        }

        let socket = UdpSocket::bind(SocketAddrV4::new(self.local_addr, 0)).await?;
        let destination = self
            .remote
            .unwrap_or_else(|| SocketAddr::V4(subject_endpoint(specifier.subject)));

        debug!(
            local = %socket.local_addr()?,
            %destination,
            subject = %specifier.subject,
            mtu = self.mtu,
            "opened UDP output session"
        );

        Ok(UdpOutputSession {
            socket,
            destination,
            specifier,
            metadata,
            mtu: self.mtu,
            split: self.split,
            source_node: self.source_node,
            send_lock: Mutex::new(()),
        })
    }
}

/// An output session writing frames to one UDP destination.
#[derive(Debug)]
pub struct UdpOutputSession {
    socket: UdpSocket,
    destination: SocketAddr,
    specifier: OutputSessionSpecifier,
    metadata: PayloadMetadata,
    mtu: usize,
    split: FrameSplit,
    source_node: Option<NodeId>,
    send_lock: Mutex<()>,
}

impl UdpOutputSession {
    /// Get the bound local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Address every frame is sent to.
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Encode `transfer` into datagrams, headers and transfer CRC included.
    pub fn frames(&self, transfer: &Transfer) -> std::result::Result<Vec<Bytes>, SessionError> {
        self.metadata.admit(transfer.payload_len())?;

        let crc = transfer
            .fragments()
            .iter()
            .fold(Crc32c::new(), |crc, fragment| crc.chain(fragment))
            .finalize()
            .to_le_bytes();

        let bodies = match self.split {
            FrameSplit::Mtu => self.split_by_mtu(transfer, &crc),
            FrameSplit::PerFragment => self.split_per_fragment(transfer, &crc)?,
        };
        if bodies.len() > MAX_FRAMES {
            return Err(SessionError::TooManyFrames(bodies.len()));
        }

        let last = bodies.len() - 1;
        let frames = bodies
            .into_iter()
            .enumerate()
            .map(|(index, body)| {
                let header = FrameHeader {
                    source_node: self.source_node,
                    destination_node: self.specifier.remote_node,
                    frame_index: index as u32,
                    end_of_transfer: index == last,
                    ..FrameHeader::message(
                        transfer.priority(),
                        self.specifier.subject,
                        transfer.transfer_id(),
                    )
                };
                let mut frame = BytesMut::with_capacity(HEADER_SIZE + body.len());
                frame.put_slice(&header.to_bytes());
                frame.put_slice(&body);
                frame.freeze()
            })
            .collect();
        Ok(frames)
    }

    fn split_by_mtu(&self, transfer: &Transfer, crc: &[u8]) -> Vec<Bytes> {
        let mut stream = BytesMut::with_capacity(transfer.payload_len() + TRANSFER_CRC_SIZE);
        for fragment in transfer.fragments() {
            stream.put_slice(fragment);
        }
        stream.put_slice(crc);
        let stream = stream.freeze();

        let room = self.mtu - HEADER_SIZE;
        (0..stream.len())
            .step_by(room)
            .map(|start| stream.slice(start..(start + room).min(stream.len())))
            .collect()
    }

    fn split_per_fragment(
        &self,
        transfer: &Transfer,
        crc: &[u8],
    ) -> std::result::Result<Vec<Bytes>, SessionError> {
        let mut bodies = transfer.fragments().to_vec();
        match bodies.last_mut() {
            Some(last) => {
                let mut tail = BytesMut::with_capacity(last.len() + TRANSFER_CRC_SIZE);
                tail.put_slice(last);
                tail.put_slice(crc);
                *last = tail.freeze();
            }
            None => bodies.push(Bytes::copy_from_slice(crc)),
        }

        if let Some(body) = bodies.iter().find(|b| HEADER_SIZE + b.len() > self.mtu) {
            return Err(SessionError::FrameExceedsMtu {
                size: HEADER_SIZE + body.len(),
                mtu: self.mtu,
            });
        }
        Ok(bodies)
    }
}

#[async_trait]
impl OutputSession for UdpOutputSession {
    fn specifier(&self) -> &OutputSessionSpecifier {
        &self.specifier
    }

    fn payload_metadata(&self) -> PayloadMetadata {
        self.metadata
    }

    async fn send(
        &self,
        transfer: Transfer,
        deadline: Instant,
    ) -> std::result::Result<(), SessionError> {
        let frames = self.frames(&transfer)?;
        let transfer_id = transfer.transfer_id();

        // Frames of concurrent transfers must not interleave.
        let _guard = self.send_lock.lock().await;
        for (index, frame) in frames.iter().enumerate() {
            if Instant::now() >= deadline {
                return Err(SessionError::DeadlineElapsed);
            }
            self.socket.send_to(frame, self.destination).await?;
            trace!(%transfer_id, index, len = frame.len(), "frame sent");
        }

        debug!(
            %transfer_id,
            frames = frames.len(),
            destination = %self.destination,
            "transfer sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc32c;
    use crate::transfer::Timestamp;
    use crate::types::{Priority, SubjectId, TransferId};
    use std::time::Duration;

    fn specifier() -> OutputSessionSpecifier {
        OutputSessionSpecifier::message(SubjectId::new(73).unwrap())
    }

    fn transfer(fragments: Vec<Bytes>) -> Transfer {
        Transfer::new(Timestamp::now(), Priority::Low, TransferId(5), fragments)
    }

    async fn session(transport: UdpTransport) -> UdpOutputSession {
        transport
            .with_remote("127.0.0.1:9".parse().unwrap())
            .output_session(specifier(), PayloadMetadata::default())
            .await
            .unwrap()
    }

    fn header(frame: &Bytes) -> FrameHeader {
        FrameHeader::from_bytes(frame).unwrap()
    }

    #[tokio::test]
    async fn test_default_destination_is_subject_group() {
        let session = UdpTransport::new(Ipv4Addr::LOCALHOST)
            .output_session(specifier(), PayloadMetadata::default())
            .await
            .unwrap();
        assert_eq!(
            session.destination(),
            "239.0.0.73:9382".parse::<SocketAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_rejects_mtu_without_room() {
        let result = UdpTransport::new(Ipv4Addr::LOCALHOST)
            .with_mtu(HEADER_SIZE)
            .output_session(specifier(), PayloadMetadata::default())
            .await;
        assert!(matches!(result, Err(TxError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_frames_split_by_mtu() {
        let session = session(UdpTransport::new(Ipv4Addr::LOCALHOST)).await;
        let payload = Bytes::from((0..2000u32).map(|i| i as u8).collect::<Vec<_>>());
        let frames = session
            .frames(&transfer(vec![payload.slice(..1000), payload.slice(1000..)]))
            .unwrap();

        // 2000 payload bytes + 4 CRC bytes over 1176-byte frame bodies.
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), DEFAULT_MTU);
        assert_eq!(frames[1].len(), HEADER_SIZE + 828);

        let first = header(&frames[0]);
        let last = header(&frames[1]);
        assert_eq!((first.frame_index, first.end_of_transfer), (0, false));
        assert_eq!((last.frame_index, last.end_of_transfer), (1, true));
        assert_eq!(first.priority, Priority::Low);
        assert_eq!(first.transfer_id, TransferId(5));

        let mut body = frames[0][HEADER_SIZE..].to_vec();
        body.extend_from_slice(&frames[1][HEADER_SIZE..]);
        assert_eq!(&body[..2000], &payload[..]);
        assert_eq!(&body[2000..], &crc32c(&payload).to_le_bytes());
    }

    #[tokio::test]
    async fn test_frames_per_fragment() {
        let session =
            session(UdpTransport::new(Ipv4Addr::LOCALHOST).with_frame_split(FrameSplit::PerFragment))
                .await;
        let fragments = vec![
            Bytes::from(vec![1u8; 1000]),
            Bytes::from(vec![2u8; 1000]),
            Bytes::from(vec![3u8; 5]),
        ];
        let frames = session.frames(&transfer(fragments)).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].len(), HEADER_SIZE + 1000);
        assert_eq!(frames[2].len(), HEADER_SIZE + 5 + TRANSFER_CRC_SIZE);
        assert!(header(&frames[2]).end_of_transfer);
        assert_eq!(header(&frames[1]).frame_index, 1);
    }

    #[tokio::test]
    async fn test_per_fragment_rejects_oversized_frame() {
        let session =
            session(UdpTransport::new(Ipv4Addr::LOCALHOST).with_frame_split(FrameSplit::PerFragment))
                .await;
        // Fits alone, but not once the CRC is appended.
        let room = DEFAULT_MTU - HEADER_SIZE;
        let fragments = vec![Bytes::from(vec![0u8; room - 3])];

        let result = session.frames(&transfer(fragments));
        assert!(matches!(
            result,
            Err(SessionError::FrameExceedsMtu {
                size: 1201,
                mtu: 1200
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_transfer_sends_crc_frame() {
        for split in [FrameSplit::Mtu, FrameSplit::PerFragment] {
            let session =
                session(UdpTransport::new(Ipv4Addr::LOCALHOST).with_frame_split(split)).await;
            let frames = session.frames(&transfer(Vec::new())).unwrap();

            assert_eq!(frames.len(), 1);
            assert_eq!(&frames[0][HEADER_SIZE..], &[0, 0, 0, 0]);
            assert!(header(&frames[0]).end_of_transfer);
        }
    }

    #[tokio::test]
    async fn test_frames_respect_admission() {
        let session = UdpTransport::new(Ipv4Addr::LOCALHOST)
            .with_remote("127.0.0.1:9".parse().unwrap())
            .output_session(specifier(), PayloadMetadata::new(16))
            .await
            .unwrap();
        let result = session.frames(&transfer(vec![Bytes::from(vec![0u8; 17])]));
        assert!(matches!(
            result,
            Err(SessionError::PayloadExceedsBound { size: 17, bound: 16 })
        ));
    }

    #[tokio::test]
    async fn test_source_node_written() {
        let session =
            session(UdpTransport::new(Ipv4Addr::LOCALHOST).with_source_node(NodeId(42))).await;
        let frames = session
            .frames(&transfer(vec![Bytes::from_static(b"x")]))
            .unwrap();
        let parsed = header(&frames[0]);
        assert_eq!(parsed.source_node, Some(NodeId(42)));
        assert_eq!(parsed.destination_node, None);
    }

    #[tokio::test]
    async fn test_send_after_deadline_sends_nothing() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let session = UdpTransport::new(Ipv4Addr::LOCALHOST)
            .with_remote(receiver.local_addr().unwrap())
            .output_session(specifier(), PayloadMetadata::default())
            .await
            .unwrap();

        let result = session
            .send(transfer(vec![Bytes::from_static(b"late")]), Instant::now())
            .await;
        assert!(matches!(result, Err(SessionError::DeadlineElapsed)));

        let mut buf = [0u8; 64];
        let nothing =
            tokio::time::timeout(Duration::from_millis(50), receiver.recv(&mut buf)).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_send_over_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let session = UdpTransport::new(Ipv4Addr::LOCALHOST)
            .with_remote(receiver.local_addr().unwrap())
            .output_session(specifier(), PayloadMetadata::default())
            .await
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(1);
        session
            .send(transfer(vec![Bytes::from_static(b"hello")]), deadline)
            .await
            .unwrap();

        let mut buf = [0u8; 1500];
        let (len, from) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(from, session.local_addr().unwrap());
        assert_eq!(len, HEADER_SIZE + 5 + TRANSFER_CRC_SIZE);
        assert_eq!(&buf[HEADER_SIZE..HEADER_SIZE + 5], b"hello");
    }
}
