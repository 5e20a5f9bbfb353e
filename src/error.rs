//! # Error Types
//!
//! Error handling for the PROXY protocol codec and connection adapter.
//!
//! The codec is all-or-nothing: any failure aborts the decode immediately and
//! reports one of a closed set of kinds, so callers can tell "the client never
//! finished sending a header" apart from "the client sent garbage" apart from
//! "the client speaks a version we don't handle".
//!
//! ## Error Categories
//! - **IncompleteHeader**: input ended before a required delimiter/terminator
//! - **MalformedHeader**: structural mismatch in the header bytes
//! - **UnsupportedVersion**: recognized signature for a version we don't handle
//! - **HeaderTimeout**: the header did not arrive within the configured deadline
//! - **Io**: transport faults while reading or accepting
//!
//! All errors implement `std::error::Error` for interoperability.
//!
//! ## Example Usage
//! ```rust
//! use proxy_protocol::error::ProxyError;
//!
//! let err = ProxyError::malformed(6, "expected family token");
//! assert!(err.is_malformed());
//! assert!(!err.is_timeout());
//! ```

use std::io;
use thiserror::Error;

/// The primary error type for all codec and adapter operations.
///
/// Decode errors carry the byte offset at which the failure was observed,
/// counted from the first header byte.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Input ended before a required delimiter or terminator was found.
    /// Covers empty input and truncated streams.
    #[error("incomplete PROXY header: input ended at byte {offset}")]
    IncompleteHeader {
        /// Number of header bytes consumed before the input ended.
        offset: usize,
    },

    /// Structural mismatch: bad signature, unknown family token, unparsable
    /// address literal, out-of-range port, missing CRLF, oversized header.
    #[error("malformed PROXY header at byte {offset}: {detail}")]
    MalformedHeader {
        /// Byte offset of the first offending byte.
        offset: usize,
        /// Expected-versus-found context for diagnostics.
        detail: String,
    },

    /// A recognized header for a protocol version this implementation does
    /// not handle in the requested direction.
    #[error("unsupported PROXY protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The header did not fully arrive within the configured read deadline.
    #[error("timed out waiting for PROXY header")]
    HeaderTimeout,

    /// I/O failure on the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProxyError {
    /// Build a [`ProxyError::MalformedHeader`] from an offset and detail text.
    pub fn malformed(offset: usize, detail: impl Into<String>) -> Self {
        Self::MalformedHeader {
            offset,
            detail: detail.into(),
        }
    }

    /// True if the input ended before the header was complete.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::IncompleteHeader { .. })
    }

    /// True if the header bytes were structurally invalid.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedHeader { .. })
    }

    /// True if the header read deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::HeaderTimeout)
    }
}

/// Type alias for Results using ProxyError
pub type Result<T> = std::result::Result<T, ProxyError>;
