//! Snapshot wire codec.
//!
//! Snapshots travel as MessagePack maps, one frame per WebSocket binary
//! message. Map encoding keeps the format self-describing: a consumer in
//! any language reads `ts`, `seq`, `bids` and `asks` by key without a
//! schema.

use super::sampler::BookSnapshot;
use std::fmt;

/// Encode a snapshot as one MessagePack frame.
///
/// # Errors
/// [`WireError::Encode`] when serialization fails.
pub fn encode_snapshot(snapshot: &BookSnapshot) -> Result<Vec<u8>, WireError> {
    rmp_serde::to_vec_named(snapshot).map_err(|error| WireError::Encode {
        message: error.to_string(),
    })
}

/// Decode one MessagePack frame back into a snapshot.
///
/// # Errors
/// [`WireError::Decode`] when the frame is malformed or truncated.
pub fn decode_snapshot(bytes: &[u8]) -> Result<BookSnapshot, WireError> {
    rmp_serde::from_slice(bytes).map_err(|error| WireError::Decode {
        message: error.to_string(),
    })
}

/// Errors from the snapshot wire codec.
#[derive(Debug)]
#[non_exhaustive]
pub enum WireError {
    /// A snapshot could not be serialized.
    Encode {
        /// Underlying serializer message.
        message: String,
    },

    /// A frame could not be deserialized.
    Decode {
        /// Underlying deserializer message.
        message: String,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Encode { message } => write!(f, "snapshot encode error: {message}"),
            WireError::Decode { message } => write!(f, "snapshot decode error: {message}"),
        }
    }
}

impl std::error::Error for WireError {}
