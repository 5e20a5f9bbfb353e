//! Protocol version detection.
//!
//! Classifies the start of a byte source as PROXY v1, PROXY v2, or neither by
//! peeking at most 12 bytes. Nothing is consumed; the version decoders
//! re-read the signature themselves.

use tokio::io::AsyncRead;

use crate::core::cursor::Cursor;
use crate::error::{ProxyError, Result};

/// v1 signature: the first five header bytes.
pub const V1_SIGNATURE: &[u8] = b"PROXY";

/// v2 signature: the fixed 12-byte magic.
pub const V2_SIGNATURE: &[u8] = b"\r\n\r\n\x00\r\nQUIT\n";

/// Outcome of signature classification. Ephemeral, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Text header, `PROXY ...`.
    V1,
    /// Binary header behind the 12-byte magic.
    V2,
    /// Definitely not a PROXY header: a peeked byte differs from both
    /// signatures.
    Unrecognized,
}

/// Classify the byte source by peeking its prefix.
///
/// Distinguishes "definitely not a match" (some peeked byte differs from both
/// signatures, reported as [`Detection::Unrecognized`]) from "insufficient
/// data" (the input ended while still a strict prefix of a signature,
/// reported as [`ProxyError::IncompleteHeader`]). A live stream blocks for
/// more bytes instead of hitting the latter.
pub async fn detect<R: AsyncRead + Unpin>(cursor: &mut Cursor<R>) -> Result<Detection> {
    let head = cursor.peek_prefix(V1_SIGNATURE.len()).await?;

    if head.len() < V1_SIGNATURE.len() {
        // Source ended inside the shortest signature prefix.
        return if V1_SIGNATURE.starts_with(head) || V2_SIGNATURE.starts_with(head) {
            Err(ProxyError::IncompleteHeader { offset: head.len() })
        } else {
            Ok(Detection::Unrecognized)
        };
    }

    if head == V1_SIGNATURE {
        return Ok(Detection::V1);
    }

    // Only keep waiting for the full 12-byte magic if the first five bytes
    // could still be it; otherwise classify without blocking.
    if head != &V2_SIGNATURE[..V1_SIGNATURE.len()] {
        return Ok(Detection::Unrecognized);
    }

    let magic = cursor.peek_prefix(V2_SIGNATURE.len()).await?;
    if magic == V2_SIGNATURE {
        Ok(Detection::V2)
    } else if magic.len() < V2_SIGNATURE.len() && V2_SIGNATURE.starts_with(magic) {
        Err(ProxyError::IncompleteHeader {
            offset: magic.len(),
        })
    } else {
        Ok(Detection::Unrecognized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn detect_slice(input: &[u8]) -> Result<Detection> {
        let mut cursor = Cursor::new(input);
        detect(&mut cursor).await
    }

    #[tokio::test]
    async fn classifies_v1() {
        let result = detect_slice(b"PROXY TCP4 1.2.3.4 5.6.7.8 1 2\r\n").await;
        assert_eq!(result.unwrap(), Detection::V1);
    }

    #[tokio::test]
    async fn classifies_v2() {
        let mut input = V2_SIGNATURE.to_vec();
        input.extend_from_slice(&[0x21, 0x11, 0x00, 0x0C]);
        assert_eq!(detect_slice(&input).await.unwrap(), Detection::V2);
    }

    #[tokio::test]
    async fn rejects_http_request_line() {
        let result = detect_slice(b"GET / HTTP/1.1\r\n").await;
        assert_eq!(result.unwrap(), Detection::Unrecognized);
    }

    #[tokio::test]
    async fn signature_prefix_wants_more_bytes() {
        for input in [&b""[..], b"P", b"PROX", b"\r\n\r\n\x00\r\nQU"] {
            let err = detect_slice(input).await.unwrap_err();
            assert!(err.is_incomplete(), "{input:?} should be incomplete");
        }
    }

    #[tokio::test]
    async fn first_differing_byte_settles_it() {
        for input in [&b"Q"[..], b"PROXX", b"\r\n\r\n\x01", b"\r\n\r\n\x00\r\nQUIP\n"] {
            let result = detect_slice(input).await.unwrap();
            assert_eq!(result, Detection::Unrecognized, "{input:?}");
        }
    }

    #[tokio::test]
    async fn detection_consumes_nothing() {
        let mut cursor = Cursor::new(&b"PROXY UNKNOWN\r\n"[..]);
        detect(&mut cursor).await.unwrap();
        assert_eq!(cursor.offset(), 0);
    }
}
