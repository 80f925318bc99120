//! The canonical, deterministic binary codec for all consensus-critical data.
//!
//! Grounded on the teacher kernel's `ioi_types::codec` module: a thin wrapper
//! around `parity-scale-codec` (SCALE). SCALE is deterministic and
//! self-describing enough for fixed-shape Rust types, which is exactly what
//! spec.md §4.2 requires ("canonical form MUST be deterministic across
//! implementations"). `serde`/`serde_json` remains available on types for
//! human-facing config and CLI surfaces, never for hashed/signed bytes.

use crate::error::CodecError;
use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical byte representation.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Vec<u8> {
    v.encode()
}

/// Decodes a value from its canonical byte representation, failing on any
/// trailing or malformed bytes.
pub fn from_bytes_canonical<T: Decode>(bytes: &[u8]) -> Result<T, CodecError> {
    T::decode_all(&mut &*bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Two's-complement, big-endian, minimal-length encoding of a signed integer,
/// as required by spec.md §4.2 for `BigInteger` storage values.
pub fn bigint_to_bytes(value: i128) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }
    let mut bytes = value.to_be_bytes().to_vec();
    // Strip redundant leading sign-extension bytes while keeping the
    // two's-complement sign bit meaningful.
    while bytes.len() > 1 {
        let (first, second) = (bytes[0], bytes[1]);
        let redundant = (first == 0x00 && second & 0x80 == 0) || (first == 0xFF && second & 0x80 != 0);
        if redundant {
            bytes.remove(0);
        } else {
            break;
        }
    }
    bytes
}

/// Inverse of [`bigint_to_bytes`].
pub fn bigint_from_bytes(bytes: &[u8]) -> Result<i128, CodecError> {
    if bytes.is_empty() || bytes.len() > 16 {
        return Err(CodecError::Decode(format!(
            "invalid BigInteger encoding length {}",
            bytes.len()
        )));
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut buf = [if negative { 0xFF } else { 0x00 }; 16];
    let start = 16 - bytes.len();
    buf[start..].copy_from_slice(bytes);
    Ok(i128::from_be_bytes(buf))
}
