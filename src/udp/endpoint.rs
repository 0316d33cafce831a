//! Subject to multicast endpoint mapping.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::types::SubjectId;

/// UDP port shared by all message subjects.
pub const SUBJECT_PORT: u16 = 9382;

/// Base of the message multicast range (239.0.0.0).
const MULTICAST_BASE: u32 = 0xEF00_0000;

/// Multicast group that carries `subject`.
pub fn subject_multicast_group(subject: SubjectId) -> Ipv4Addr {
    Ipv4Addr::from(MULTICAST_BASE | u32::from(subject.get()))
}

/// Socket address that carries `subject`.
pub fn subject_endpoint(subject: SubjectId) -> SocketAddrV4 {
    SocketAddrV4::new(subject_multicast_group(subject), SUBJECT_PORT)
}
