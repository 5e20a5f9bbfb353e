//! PROXY protocol header encoder.
//!
//! Only the v1 text form is emitted. Asking for a v2 header is reported as
//! [`ProxyError::UnsupportedVersion`] rather than silently producing bytes a
//! peer would reject.

use bytes::{BufMut, Bytes, BytesMut};

use crate::core::header::{Family, Header, Version};
use crate::error::{ProxyError, Result};
use crate::protocol::v1::V1_MAX_HEADER_BYTES;

/// Serialize a header to its wire form.
///
/// `PROXY <family> <src-ip> <dst-ip> <src-port> <dst-port>\r\n` for the TCP
/// families; the minimal `PROXY UNKNOWN\r\n` when the family is unknown.
pub fn encode(header: &Header) -> Result<Bytes> {
    if header.version() != Version::V1 {
        return Err(ProxyError::UnsupportedVersion(header.version().number()));
    }

    let mut out = BytesMut::with_capacity(V1_MAX_HEADER_BYTES);
    match header.family() {
        Family::Unknown => out.put_slice(b"PROXY UNKNOWN\r\n"),
        family => {
            let source = header.source();
            let destination = header.destination();
            out.put_slice(
                format!(
                    "PROXY {} {} {} {} {}\r\n",
                    family,
                    source.ip(),
                    destination.ip(),
                    source.port(),
                    destination.port()
                )
                .as_bytes(),
            );
        }
    }
    Ok(out.freeze())
}
