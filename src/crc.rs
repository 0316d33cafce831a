//! Cyclic redundancy checks.
//!
//! [`Crc32c`] (Castagnoli, reflected, init and final XOR all-ones) covers
//! transfer payloads. Frame headers use CRC-16-CCITT-FALSE, see
//! [`FrameHeader`](crate::udp::FrameHeader).

use crc_any::CRCu32;

/// A streaming CRC-32C calculation.
///
/// Feeding a byte sequence in one call or in several consecutive chunks
/// yields the same final value.
pub struct Crc32c {
    inner: CRCu32,
}

impl Crc32c {
    /// Start a new calculation.
    pub fn new() -> Self {
        Self {
            inner: CRCu32::crc32c(),
        }
    }

    /// Add bytes to the calculation.
    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.digest(bytes);
    }

    /// Add bytes and return the updated calculation.
    pub fn chain(mut self, bytes: &[u8]) -> Self {
        self.update(bytes);
        self
    }

    /// The CRC of all bytes added so far.
    ///
    /// More bytes may be added afterwards.
    pub fn finalize(&mut self) -> u32 {
        self.inner.get_crc()
    }
}

impl Default for Crc32c {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32c {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32c").finish_non_exhaustive()
    }
}

/// CRC-32C of `bytes` in one call.
pub fn crc32c(bytes: &[u8]) -> u32 {
    Crc32c::new().chain(bytes).finalize()
}
