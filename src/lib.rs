//! UAVCAN/Cyphal transfer transmission built on tokio.
//!
//! This crate takes an application payload, splits it into fragments and
//! hands the fragments, as one transfer, to an output session that puts
//! them on the network before a deadline.
//!
//! # Features
//!
//! - Fixed-layout payload encoding (MAC addresses, EtherType, length-prefixed content)
//! - CRC-32C over payloads, CRC-16-CCITT-FALSE over frame headers
//! - Zero-copy fragmentation with [`bytes::Bytes`]
//! - Deadline-bounded dispatch to any [`OutputSession`]
//! - Cyphal/UDP framing with multicast subject endpoints
//! - In-process channel sessions for tests and custom transports
//!
//! # Example
//!
//! ```no_run
//! use uavcan_tx::{EtherType, MacAddress, Payload, Publisher, PublisherConfig};
//!
//! # async fn run() -> uavcan_tx::Result<()> {
//! let payload = Payload::build(
//!     MacAddress([0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5]),
//!     MacAddress([0xb0, 0xb1, 0xb2, 0xb3, 0xb4, 0xb5]),
//!     EtherType::IPV4,
//!     b"hello".as_slice(),
//! )?;
//!
//! let publisher = Publisher::udp(PublisherConfig::default()).await?;
//! let ack = publisher.publish(&payload).await?;
//! println!("transfer {} accepted", ack.transfer_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Payload Layout
//!
//! Every payload starts with a 16-byte header followed by its content.
//! Multi-byte fields are little-endian:
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+
//! |              Destination MAC                        |  (6 bytes)
//! +--------+--------+--------+--------+--------+--------+
//! |              Source MAC                             |  (6 bytes)
//! +--------+--------+--------+--------+--------+--------+
//! |   EtherType     |  Content length |                    (4 bytes)
//! +--------+--------+--------+--------+
//! |           Content ...             |                    (0..=65535 bytes)
//! +--------+--------+--------+--------+
//! ```
//!
//! See [`udp`] for how transfers are framed on the wire.

pub mod config;
pub mod crc;
pub mod error;
pub mod fragment;
pub mod payload;
pub mod transfer;
pub mod types;
pub mod udp;

// Async modules (require tokio feature)
#[cfg(feature = "tokio")]
pub mod clock;
#[cfg(feature = "tokio")]
pub mod dispatch;
#[cfg(feature = "tokio")]
pub mod publisher;
#[cfg(feature = "tokio")]
pub mod session;

// Re-export commonly used types at the crate root
pub use config::PublisherConfig;
pub use crc::{Crc32c, crc32c};
pub use error::{Result, SessionError, TxError};
pub use fragment::{DEFAULT_MAX_FRAGMENT_SIZE, fragment};
pub use payload::{EtherType, FrameRecord, MacAddress, PAYLOAD_HEADER_SIZE, Payload, PayloadBuilder};
pub use transfer::{Timestamp, Transfer, TransferIdSequence};
pub use types::{NodeId, Priority, SubjectId, TransferId};
pub use udp::{FrameHeader, FrameSplit};

#[cfg(feature = "tokio")]
pub use clock::{Clock, SystemClock};
#[cfg(feature = "tokio")]
pub use dispatch::{Ack, Dispatcher};
#[cfg(feature = "tokio")]
pub use publisher::Publisher;
#[cfg(feature = "tokio")]
pub use session::{
    ChannelOutputSession, OutputSession, OutputSessionSpecifier, PayloadMetadata,
    PendingTransfer, TransferReceiver, channel_session,
};
#[cfg(feature = "tokio")]
pub use udp::{UdpOutputSession, UdpTransport};
