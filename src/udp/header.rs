//! Cyphal/UDP frame header.

use crc_any::CRCu16;

use crate::error::{Result, TxError};
use crate::types::{NodeId, Priority, SUBJECT_ID_MAX, SubjectId, TransferId};

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Header format version written to every frame.
pub const HEADER_VERSION: u8 = 1;

/// Node ID value meaning "anonymous" (source) or "broadcast" (destination).
const NODE_ID_UNSET: u16 = 0xFFFF;

/// End-of-transfer flag in the frame index word.
const END_OF_TRANSFER: u32 = 0x8000_0000;

/// Header fields covered by the header CRC.
const CRC_COVERED: usize = HEADER_SIZE - 2;

/// Frame header (24 bytes).
///
/// Multi-byte fields are little-endian except the trailing header CRC,
/// which is big-endian so that the CRC of the full header is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub priority: Priority,
    /// Sending node, `None` if anonymous.
    pub source_node: Option<NodeId>,
    /// Receiving node, `None` for broadcast.
    pub destination_node: Option<NodeId>,
    pub subject: SubjectId,
    pub transfer_id: TransferId,
    /// Position of this frame within its transfer (31 bits).
    pub frame_index: u32,
    /// Set on the last frame of a transfer.
    pub end_of_transfer: bool,
    /// Opaque user data, zero unless set by the application.
    pub user_data: u16,
}

impl FrameHeader {
    /// Create a broadcast message header for the first and only frame.
    pub fn message(priority: Priority, subject: SubjectId, transfer_id: TransferId) -> Self {
        Self {
            priority,
            source_node: None,
            destination_node: None,
            subject,
            transfer_id,
            frame_index: 0,
            end_of_transfer: true,
            user_data: 0,
        }
    }

    /// Parse a header from bytes, verifying its CRC.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(TxError::MessageTooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }
        let data = &data[..HEADER_SIZE];

        let mut crc = header_crc();
        crc.digest(data);
        if crc.get_crc() != 0 {
            return Err(TxError::invalid_header("header CRC mismatch"));
        }

        if data[0] != HEADER_VERSION {
            return Err(TxError::invalid_header(format!(
                "unsupported header version {}",
                data[0]
            )));
        }

        let priority = Priority::from_u8(data[1])
            .ok_or_else(|| TxError::invalid_header(format!("invalid priority {}", data[1])))?;
        let source = u16::from_le_bytes([data[2], data[3]]);
        let destination = u16::from_le_bytes([data[4], data[5]]);
        let subject = u16::from_le_bytes([data[6], data[7]]);
        if subject > SUBJECT_ID_MAX {
            return Err(TxError::invalid_header(format!(
                "data specifier {subject:#06x} is not a message subject"
            )));
        }
        let mut transfer_id = [0u8; 8];
        transfer_id.copy_from_slice(&data[8..16]);
        let index_word = u32::from_le_bytes([data[16], data[17], data[18], data[19]]);
        let user_data = u16::from_le_bytes([data[20], data[21]]);

        Ok(Self {
            priority,
            source_node: node_from_wire(source),
            destination_node: node_from_wire(destination),
            subject: SubjectId::from_truncating(subject),
            transfer_id: TransferId(u64::from_le_bytes(transfer_id)),
            frame_index: index_word & !END_OF_TRANSFER,
            end_of_transfer: index_word & END_OF_TRANSFER != 0,
            user_data,
        })
    }

    /// Serialize the header to bytes, header CRC included.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];

        let mut index_word = self.frame_index & !END_OF_TRANSFER;
        if self.end_of_transfer {
            index_word |= END_OF_TRANSFER;
        }

        buf[0] = HEADER_VERSION;
        buf[1] = self.priority as u8;
        buf[2..4].copy_from_slice(&node_to_wire(self.source_node).to_le_bytes());
        buf[4..6].copy_from_slice(&node_to_wire(self.destination_node).to_le_bytes());
        buf[6..8].copy_from_slice(&self.subject.get().to_le_bytes());
        buf[8..16].copy_from_slice(&self.transfer_id.0.to_le_bytes());
        buf[16..20].copy_from_slice(&index_word.to_le_bytes());
        buf[20..22].copy_from_slice(&self.user_data.to_le_bytes());

        let mut crc = header_crc();
        crc.digest(&buf[..CRC_COVERED]);
        buf[CRC_COVERED..].copy_from_slice(&crc.get_crc().to_be_bytes());

        buf
    }
}

/// CRC-16-CCITT-FALSE, as used for the header checksum.
fn header_crc() -> CRCu16 {
    CRCu16::crc16ccitt_false()
}

fn node_from_wire(raw: u16) -> Option<NodeId> {
    (raw != NODE_ID_UNSET).then_some(NodeId(raw))
}

fn node_to_wire(node: Option<NodeId>) -> u16 {
    node.map_or(NODE_ID_UNSET, |n| n.0)
}
