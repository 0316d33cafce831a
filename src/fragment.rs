//! Splitting payloads into datagram-sized fragments.
//!
//! Fragmentation here is transport-agnostic: the caller supplies the limit.
//! Transports that frame the stream themselves (see [`crate::udp::FrameSplit`])
//! may make this step unnecessary, so it is never applied implicitly.

use bytes::Bytes;

use crate::error::{Result, TxError};

/// Default maximum fragment size in bytes.
pub const DEFAULT_MAX_FRAGMENT_SIZE: usize = 1000;

/// Split `payload` into consecutive fragments of at most `max_fragment_size` bytes.
///
/// Fragment `i` covers `payload[i * max .. min((i + 1) * max, len)]`. An empty
/// payload yields no fragments. Fragments share the payload's buffer.
pub fn fragment(payload: impl Into<Bytes>, max_fragment_size: usize) -> Result<Vec<Bytes>> {
    if max_fragment_size == 0 {
        return Err(TxError::InvalidFragmentSize(max_fragment_size));
    }

    let payload = payload.into();
    let mut fragments = Vec::with_capacity(fragment_count(payload.len(), max_fragment_size));
    let mut offset = 0;

    while offset < payload.len() {
        let end = (offset + max_fragment_size).min(payload.len());
        fragments.push(payload.slice(offset..end));
        offset = end;
    }

    Ok(fragments)
}

/// Number of fragments [`fragment`] produces for `len` bytes.
///
/// Returns 0 when `max_fragment_size` is 0.
pub fn fragment_count(len: usize, max_fragment_size: usize) -> usize {
    if max_fragment_size == 0 {
        return 0;
    }
    len.div_ceil(max_fragment_size)
}

/// Check if `len` bytes need more than one fragment.
pub fn needs_fragmentation(len: usize, max_fragment_size: usize) -> bool {
    len > max_fragment_size
}

/// Total byte length of a fragment sequence.
pub fn total_len(fragments: &[Bytes]) -> usize {
    fragments.iter().map(Bytes::len).sum()
}

/// Concatenate fragments in order.
pub fn concat(fragments: &[Bytes]) -> Bytes {
    match fragments {
        [] => Bytes::new(),
        [single] => single.clone(),
        _ => Bytes::from(fragments.concat()),
    }
}
