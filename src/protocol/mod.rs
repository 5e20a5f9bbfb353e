//! # Header Codec
//!
//! Detection, decoding, and encoding of PROXY protocol headers.
//!
//! ## Components
//! - **Detector**: classifies a bounded prefix as v1, v2, or neither
//! - **v1 / v2 decoders**: consume exactly the header bytes, yield a [`Header`]
//! - **Encoder**: serializes a [`Header`] back to wire bytes (v1)
//!
//! The codec is a pure function of its input bytes: no retries, no partial
//! recovery, no shared state. Concurrent decodes on independent inputs never
//! interact.

pub mod detect;
pub mod encode;
pub mod v1;
pub mod v2;

use tokio::io::AsyncRead;

use crate::core::cursor::Cursor;
use crate::core::header::Header;
use crate::error::{ProxyError, Result};

pub use detect::{detect, Detection, V1_SIGNATURE, V2_SIGNATURE};
pub use encode::encode;
pub use v1::V1_MAX_HEADER_BYTES;
pub use v2::V2_MAX_HEADER_BYTES;

/// Decode a PROXY header from the start of a byte source.
///
/// Consumes exactly the header bytes and nothing after them. Works on any
/// [`AsyncRead`]: a live stream or an in-memory buffer (`&[u8]`).
///
/// ```rust
/// use proxy_protocol::{decode_header, Family};
///
/// tokio_test::block_on(async {
///     let mut input = &b"PROXY TCP4 192.0.2.1 192.0.2.2 56324 443\r\n"[..];
///     let header = decode_header(&mut input).await.unwrap();
///     assert_eq!(header.family(), Family::Tcp4);
///     assert_eq!(header.source(), "192.0.2.1:56324".parse().unwrap());
/// });
/// ```
pub async fn decode_header<R: AsyncRead + Unpin>(source: &mut R) -> Result<Header> {
    let mut cursor = Cursor::new(source);
    decode_with_cursor(&mut cursor).await
}

/// Decode against an existing cursor, so callers that need the unconsumed
/// lookahead back (the connection adapter) can recover it.
pub(crate) async fn decode_with_cursor<R: AsyncRead + Unpin>(
    cursor: &mut Cursor<R>,
) -> Result<Header> {
    match detect::detect(cursor).await? {
        Detection::V1 => v1::decode(cursor).await,
        Detection::V2 => v2::decode(cursor).await,
        Detection::Unrecognized => Err(ProxyError::malformed(
            cursor.offset(),
            "no PROXY protocol signature",
        )),
    }
}
