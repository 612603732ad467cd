//! Codec error types.

use thiserror::Error;

/// Message codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Header invariant violated, or the supplied key does not match the
    /// declared encryption type; detected before any bytes are emitted
    #[error("unsupported message encoding: {0}")]
    UnsupportedMessageEncoding(&'static str),

    /// Truncated or oversized input on decode
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),

    /// HMAC-SHA1 integrity tag mismatch (CTR+SHA1 suite)
    #[error("integrity check failed")]
    IntegrityCheckFailed,

    /// EAX authentication tag mismatch
    #[error("authentication failed")]
    AuthenticationFailed,
}
