//! Publisher and transport configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{Result, TxError};
use crate::fragment::DEFAULT_MAX_FRAGMENT_SIZE;
use crate::types::{NodeId, Priority, SubjectId};
use crate::udp::{DEFAULT_MTU, FrameSplit, HEADER_SIZE};

/// Default payload size bound in bytes.
pub const DEFAULT_PAYLOAD_BOUND: usize = 4096;

/// Default time allowed for a transfer to be accepted.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Default subject for published transfers.
pub const DEFAULT_SUBJECT: u16 = 73;

/// Settings for a [`Publisher`](crate::publisher::Publisher) and its UDP transport.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Local interface address to bind.
    pub local_addr: Ipv4Addr,
    /// Explicit destination. `None` sends to the subject's multicast group.
    pub remote: Option<SocketAddr>,
    /// Subject to publish on.
    pub subject: SubjectId,
    /// Node ID written into frame headers. `None` is anonymous.
    pub source_node: Option<NodeId>,
    /// Limit applied by the fragmenter.
    pub max_fragment_size: usize,
    /// Whether the publisher fragments payloads before dispatch.
    pub fragment_locally: bool,
    /// Datagram size limit, frame header included.
    pub mtu: usize,
    /// How the UDP session maps fragments onto datagrams.
    pub frame_split: FrameSplit,
    /// Priority of published transfers.
    pub priority: Priority,
    /// Largest payload the session admits.
    pub payload_bound: usize,
    /// Deadline offset applied to each publish.
    pub send_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            local_addr: Ipv4Addr::LOCALHOST,
            remote: None,
            subject: SubjectId::from_truncating(DEFAULT_SUBJECT),
            source_node: None,
            max_fragment_size: DEFAULT_MAX_FRAGMENT_SIZE,
            fragment_locally: true,
            mtu: DEFAULT_MTU,
            frame_split: FrameSplit::default(),
            priority: Priority::default(),
            payload_bound: DEFAULT_PAYLOAD_BOUND,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

impl PublisherConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_addr(mut self, addr: Ipv4Addr) -> Self {
        self.local_addr = addr;
        self
    }

    pub fn with_remote(mut self, remote: SocketAddr) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_subject(mut self, subject: SubjectId) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_source_node(mut self, node: NodeId) -> Self {
        self.source_node = Some(node);
        self
    }

    pub fn with_max_fragment_size(mut self, size: usize) -> Self {
        self.max_fragment_size = size;
        self
    }

    /// Hand whole payloads to the session instead of fragmenting first.
    pub fn without_local_fragmentation(mut self) -> Self {
        self.fragment_locally = false;
        self
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn with_frame_split(mut self, split: FrameSplit) -> Self {
        self.frame_split = split;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_payload_bound(mut self, bound: usize) -> Self {
        self.payload_bound = bound;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Check the settings for values no transfer could be sent with.
    pub fn validate(&self) -> Result<()> {
        if self.max_fragment_size == 0 {
            return Err(TxError::InvalidFragmentSize(0));
        }
        if self.mtu <= HEADER_SIZE {
            return Err(TxError::invalid_config(format!(
                "MTU of {} bytes leaves no room after the {HEADER_SIZE}-byte frame header",
                self.mtu
            )));
        }
        if self.send_timeout.is_zero() {
            return Err(TxError::invalid_config("send timeout must be non-zero"));
        }
        Ok(())
    }
}
