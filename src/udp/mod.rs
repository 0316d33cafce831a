//! Cyphal/UDP framing and transport.
//!
//! Each datagram carries one frame: a 24-byte [`FrameHeader`] followed by a
//! slice of the transfer payload. The last frame of every transfer ends with
//! the CRC-32C of the whole payload, little-endian:
//!
//! ```text
//! +----------------+------------------------+
//! | header (24 B)  | payload slice          |   frame 0 .. n-2
//! +----------------+------------------------+
//! | header (24 B)  | payload slice | CRC32C |   frame n-1 (end of transfer)
//! +----------------+------------------------+
//! ```
//!
//! Message transfers go to the subject's multicast group (see
//! [`subject_endpoint`]) unless the transport is given an explicit remote.

mod endpoint;
mod header;
#[cfg(feature = "tokio")]
mod transport;

pub use endpoint::{SUBJECT_PORT, subject_endpoint, subject_multicast_group};
pub use header::{FrameHeader, HEADER_SIZE, HEADER_VERSION};
#[cfg(feature = "tokio")]
pub use transport::{UdpOutputSession, UdpTransport};

/// Size of the transfer CRC trailing the last frame.
pub const TRANSFER_CRC_SIZE: usize = 4;

/// Default datagram size limit, frame header included.
pub const DEFAULT_MTU: usize = 1200;

/// How a UDP session maps transfer fragments onto datagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSplit {
    /// Concatenate the fragments and re-split by MTU.
    #[default]
    Mtu,
    /// Send each fragment in its own frame. A fragment that does not fit in
    /// one datagram fails the transfer.
    PerFragment,
}
