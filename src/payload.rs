//! Payload assembly for ethernet-frame-shaped messages.
//!
//! The payload layout mirrors `uavcan.metatransport.ethernet.Frame`:
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+
//! |              Destination MAC (6 bytes)              |
//! +--------+--------+--------+--------+--------+--------+
//! |                Source MAC (6 bytes)                 |
//! +--------+--------+--------+--------+--------+--------+
//! | EtherType (LE)  | Length (LE)     |  Content ...    |
//! +--------+--------+--------+--------+--------+--------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, TxError};

/// Size of a MAC address field in bytes.
pub const MAC_ADDRESS_SIZE: usize = 6;

/// Size of the fixed part of the payload (two addresses, EtherType, length).
pub const PAYLOAD_HEADER_SIZE: usize = 16;

/// Largest content length the 16-bit length field can describe.
pub const MAX_CONTENT_LEN: usize = u16::MAX as usize;

/// A 6-byte hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; MAC_ADDRESS_SIZE]);

impl TryFrom<&[u8]> for MacAddress {
    type Error = TxError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let octets: [u8; MAC_ADDRESS_SIZE] =
            bytes.try_into().map_err(|_| TxError::InvalidFieldLength {
                expected: MAC_ADDRESS_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(octets))
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// EtherType tag, encoded little-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EtherType(pub u16);

impl EtherType {
    pub const IPV4: EtherType = EtherType(0x0800);
    pub const ARP: EtherType = EtherType(0x0806);
    pub const IPV6: EtherType = EtherType(0x86DD);
}

impl std::fmt::Display for EtherType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// The typed fields of a payload, before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    /// Destination hardware address.
    pub destination: MacAddress,
    /// Source hardware address.
    pub source: MacAddress,
    /// EtherType tag.
    pub ether_type: EtherType,
    /// Variable-length content.
    pub content: Bytes,
}

impl FrameRecord {
    /// Create a record from its fields.
    pub fn new(
        destination: MacAddress,
        source: MacAddress,
        ether_type: EtherType,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            destination,
            source,
            ether_type,
            content: content.into(),
        }
    }

    /// Encode this record into a payload.
    pub fn encode(&self) -> Result<Payload> {
        let len = self.content.len();
        if len > MAX_CONTENT_LEN {
            return Err(TxError::PayloadTooLarge {
                size: len,
                max: MAX_CONTENT_LEN,
            });
        }

        let mut buf = BytesMut::with_capacity(PAYLOAD_HEADER_SIZE + len);
        buf.put_slice(&self.destination.0);
        buf.put_slice(&self.source.0);
        buf.put_u16_le(self.ether_type.0);
        buf.put_u16_le(len as u16);
        buf.put_slice(&self.content);

        Ok(Payload {
            bytes: buf.freeze(),
        })
    }

    /// Parse a record from an encoded payload.
    ///
    /// Trailing bytes after the declared content are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < PAYLOAD_HEADER_SIZE {
            return Err(TxError::MessageTooShort {
                expected: PAYLOAD_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let destination = MacAddress::try_from(&data[0..6])?;
        let source = MacAddress::try_from(&data[6..12])?;
        let ether_type = EtherType(u16::from_le_bytes([data[12], data[13]]));
        let declared = u16::from_le_bytes([data[14], data[15]]) as usize;

        let available = data.len() - PAYLOAD_HEADER_SIZE;
        if available < declared {
            return Err(TxError::LengthMismatch {
                declared,
                actual: available,
            });
        }

        let content =
            Bytes::copy_from_slice(&data[PAYLOAD_HEADER_SIZE..PAYLOAD_HEADER_SIZE + declared]);

        Ok(Self {
            destination,
            source,
            ether_type,
            content,
        })
    }
}

/// An immutable, encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Bytes,
}

impl Payload {
    /// Assemble a payload from its fields.
    ///
    /// Fails with [`TxError::PayloadTooLarge`] if `content` is longer than 65535 bytes.
    pub fn build(
        destination: MacAddress,
        source: MacAddress,
        ether_type: EtherType,
        content: impl Into<Bytes>,
    ) -> Result<Self> {
        FrameRecord::new(destination, source, ether_type, content).encode()
    }

    /// Start a payload builder.
    pub fn builder() -> PayloadBuilder {
        PayloadBuilder::new()
    }

    /// Get the encoded bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consume the payload, returning the encoded bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Total encoded length (header + content).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Never true for a built payload; the header is always present.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length of the variable content.
    pub fn content_len(&self) -> usize {
        self.bytes.len() - PAYLOAD_HEADER_SIZE
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builder for constructing payloads.
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    destination: MacAddress,
    source: MacAddress,
    ether_type: EtherType,
    content: Bytes,
}

impl PayloadBuilder {
    /// Create a builder with zeroed addresses, EtherType 0 and empty content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the destination address.
    pub fn destination(mut self, destination: MacAddress) -> Self {
        self.destination = destination;
        self
    }

    /// Set the source address.
    pub fn source(mut self, source: MacAddress) -> Self {
        self.source = source;
        self
    }

    /// Set the EtherType tag.
    pub fn ether_type(mut self, ether_type: EtherType) -> Self {
        self.ether_type = ether_type;
        self
    }

    /// Set the content.
    pub fn content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = content.into();
        self
    }

    /// Build the payload.
    pub fn build(self) -> Result<Payload> {
        Payload::build(self.destination, self.source, self.ether_type, self.content)
    }
}
