//! Core UAVCAN types and identifier newtypes.

use crate::error::{Result, TxError};

/// Largest valid subject ID (13 bits).
pub const SUBJECT_ID_MAX: u16 = 8191;

/// Transfer priority levels.
///
/// Lower numeric values are more urgent, so `Exceptional < Optional` under `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Priority {
    /// Failure or emergency traffic.
    Exceptional = 0,
    Immediate = 1,
    Fast = 2,
    High = 3,
    /// Regular traffic.
    #[default]
    Nominal = 4,
    Low = 5,
    Slow = 6,
    /// Traffic that may be dropped without consequence.
    Optional = 7,
}

impl Priority {
    /// Create a Priority from a raw value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Exceptional),
            1 => Some(Self::Immediate),
            2 => Some(Self::Fast),
            3 => Some(Self::High),
            4 => Some(Self::Nominal),
            5 => Some(Self::Low),
            6 => Some(Self::Slow),
            7 => Some(Self::Optional),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Exceptional => "exceptional",
            Self::Immediate => "immediate",
            Self::Fast => "fast",
            Self::High => "high",
            Self::Nominal => "nominal",
            Self::Low => "low",
            Self::Slow => "slow",
            Self::Optional => "optional",
        };
        f.write_str(name)
    }
}

/// Subject ID - identifies a message topic (0..=8191).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubjectId(u16);

impl SubjectId {
    /// Create a subject ID, rejecting values wider than 13 bits.
    pub fn new(id: u16) -> Result<Self> {
        if id > SUBJECT_ID_MAX {
            return Err(TxError::invalid_config(format!(
                "subject ID {id} exceeds maximum of {SUBJECT_ID_MAX}"
            )));
        }
        Ok(Self(id))
    }

    /// Create a subject ID from the low 13 bits of `id`.
    pub const fn from_truncating(id: u16) -> Self {
        Self(id & SUBJECT_ID_MAX)
    }

    /// Get the raw value.
    pub fn get(&self) -> u16 {
        self.0
    }
}

/// Node ID - identifies a node on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u16);

/// Transfer ID - increases monotonically per output session, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TransferId(pub u64);

impl TransferId {
    /// The identifier following this one, wrapping at `u64::MAX`.
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
