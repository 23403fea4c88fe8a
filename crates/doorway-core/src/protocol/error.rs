//! Protocol error types for envelope encoding and decoding.

use thiserror::Error;

/// Maximum envelope size in bytes (64 KiB).
///
/// Envelopes are size-checked BEFORE decoding so a hostile sender cannot
/// force a large allocation from an unauthenticated request body.
pub const MAX_ENVELOPE_SIZE: usize = 64 * 1024;

/// Errors produced while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Input exceeds [`MAX_ENVELOPE_SIZE`].
    #[error("envelope too large: {size} bytes exceeds maximum {max} bytes")]
    EnvelopeTooLarge {
        /// Actual input size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// The input is not a well-formed envelope.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] prost::DecodeError),
}
