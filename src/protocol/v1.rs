//! PROXY protocol v1 (text) decoder.
//!
//! Grammar, ASCII and case-sensitive:
//!
//! ```text
//! PROXY <SP> FAMILY <SP> SRC-IP <SP> DST-IP <SP> SRC-PORT <SP> DST-PORT CRLF
//! ```
//!
//! `FAMILY` is one of `TCP4`, `TCP6`, `UNKNOWN`. For `UNKNOWN` the sender may
//! put anything (or nothing) between the token and the terminating CRLF; it
//! is discarded and the endpoints are reported as zero.

use std::net::{IpAddr, SocketAddr};

use tokio::io::AsyncRead;

use crate::core::cursor::Cursor;
use crate::core::header::{Family, Header, Version};
use crate::error::{ProxyError, Result};
use crate::protocol::detect::V1_SIGNATURE;

/// Maximum total v1 header length, signature and CRLF included.
///
/// The classic haproxy bound: 107 bytes after the first signature byte, 108
/// in total. Anything longer is malformed, not merely slow.
pub const V1_MAX_HEADER_BYTES: usize = 108;

/// Decode a v1 header. The cursor must be positioned at the `P` of `PROXY`.
pub(crate) async fn decode<R: AsyncRead + Unpin>(cursor: &mut Cursor<R>) -> Result<Header> {
    cursor.set_limit(V1_MAX_HEADER_BYTES);

    let signature = cursor.read_exact(V1_SIGNATURE.len()).await?;
    if signature != V1_SIGNATURE {
        return Err(ProxyError::malformed(0, "expected v1 signature \"PROXY\""));
    }
    cursor.expect_byte(b' ').await?;

    let family = read_family_token(cursor).await?;

    if family == Family::Unknown {
        // Everything up to the terminator is free-form and discarded; the
        // protocol forbids relying on any of it.
        cursor.read_until_crlf().await?;
        return Ok(Header::unknown(Version::V1));
    }

    cursor.expect_byte(b' ').await?;
    let source_ip = read_ip_literal(cursor).await?;
    cursor.expect_byte(b' ').await?;
    let destination_ip = read_ip_literal(cursor).await?;
    cursor.expect_byte(b' ').await?;
    let source_port = cursor.read_decimal_u16().await?;
    cursor.expect_byte(b' ').await?;
    let destination_port = cursor.read_decimal_u16().await?;
    cursor.expect_crlf().await?;

    Ok(Header::new(
        Version::V1,
        family,
        SocketAddr::new(source_ip, source_port),
        SocketAddr::new(destination_ip, destination_port),
    ))
}

/// Read the family token and match it against the closed set.
///
/// The token ends at the next space, or at the CR of the terminator for the
/// minimal `PROXY UNKNOWN\r\n` form. The delimiter is left unconsumed.
async fn read_family_token<R: AsyncRead + Unpin>(cursor: &mut Cursor<R>) -> Result<Family> {
    let offset = cursor.offset();
    let mut token = Vec::with_capacity(8);
    loop {
        match cursor.peek_byte().await? {
            None => {
                return Err(ProxyError::IncompleteHeader {
                    offset: cursor.offset(),
                })
            }
            Some(b' ') | Some(b'\r') => break,
            Some(_) => token.push(cursor.next_byte().await?),
        }
    }

    Family::from_token(&token).ok_or_else(|| {
        ProxyError::malformed(
            offset,
            format!("unknown family token {:?}", String::from_utf8_lossy(&token)),
        )
    })
}

/// Read a space-delimited token and parse it as an IPv4 or IPv6 literal.
///
/// The parsed address family is deliberately not cross-validated against the
/// `TCP4`/`TCP6` token: the reference implementation accepts the mismatch and
/// so does this one.
async fn read_ip_literal<R: AsyncRead + Unpin>(cursor: &mut Cursor<R>) -> Result<IpAddr> {
    let offset = cursor.offset();
    let literal = cursor.read_until(b' ').await?;
    let text = std::str::from_utf8(&literal)
        .map_err(|_| ProxyError::malformed(offset, "address literal is not ASCII"))?;
    text.parse::<IpAddr>()
        .map_err(|_| ProxyError::malformed(offset, format!("unparsable address literal {text:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn decode_slice(input: &[u8]) -> Result<Header> {
        let mut cursor = Cursor::new(input);
        decode(&mut cursor).await
    }

    #[tokio::test]
    async fn decodes_tcp4_with_extreme_values() {
        let header = decode_slice(b"PROXY TCP4 255.255.255.255 255.255.255.254 65535 65534\r\n")
            .await
            .unwrap();
        assert_eq!(header.version(), Version::V1);
        assert_eq!(header.family(), Family::Tcp4);
        assert_eq!(header.source(), "255.255.255.255:65535".parse().unwrap());
        assert_eq!(header.destination(), "255.255.255.254:65534".parse().unwrap());
    }

    #[tokio::test]
    async fn decodes_tcp6() {
        let header = decode_slice(b"PROXY TCP6 2001:db8::1 ::1 4242 443\r\n")
            .await
            .unwrap();
        assert_eq!(header.family(), Family::Tcp6);
        assert_eq!(header.source(), "[2001:db8::1]:4242".parse().unwrap());
        assert_eq!(header.destination(), "[::1]:443".parse().unwrap());
    }

    #[tokio::test]
    async fn unknown_discards_trailing_fields() {
        let header = decode_slice(b"PROXY UNKNOWN 1.2.3.4 5.6.7.8 1 2\r\n")
            .await
            .unwrap();
        assert_eq!(header, Header::unknown(Version::V1));
    }

    #[tokio::test]
    async fn unknown_minimal_form() {
        let header = decode_slice(b"PROXY UNKNOWN\r\n").await.unwrap();
        assert_eq!(header, Header::unknown(Version::V1));
    }

    #[tokio::test]
    async fn family_token_set_is_closed() {
        let err = decode_slice(b"PROXY UDP4 1.2.3.4 5.6.7.8 1 2\r\n")
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn lowercase_family_is_rejected() {
        let err = decode_slice(b"PROXY tcp4 1.2.3.4 5.6.7.8 1 2\r\n")
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn bad_address_literal_is_rejected() {
        let err = decode_slice(b"PROXY TCP4 999.0.0.1 5.6.7.8 1 2\r\n")
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn family_is_not_cross_validated_against_literal() {
        // Deliberate leniency: TCP4 with IPv6 literals decodes.
        let header = decode_slice(b"PROXY TCP4 ::1 ::2 1 2\r\n").await.unwrap();
        assert_eq!(header.family(), Family::Tcp4);
        assert_eq!(header.source(), "[::1]:1".parse().unwrap());
    }

    #[tokio::test]
    async fn truncation_is_incomplete() {
        for input in [
            &b"PROXY"[..],
            b"PROXY ",
            b"PROXY TCP4 1.2.3.4",
            b"PROXY TCP4 1.2.3.4 5.6.7.8 1 2",
            b"PROXY TCP4 1.2.3.4 5.6.7.8 1 2\r",
            b"PROXY UNKNOWN anything goes",
        ] {
            let err = decode_slice(input).await.unwrap_err();
            assert!(err.is_incomplete(), "{input:?}: {err:?}");
        }
    }

    #[tokio::test]
    async fn missing_crlf_is_malformed() {
        let err = decode_slice(b"PROXY TCP4 1.2.3.4 5.6.7.8 1 2\n")
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn oversized_header_is_malformed() {
        let mut input = b"PROXY UNKNOWN ".to_vec();
        input.extend_from_slice(&vec![b'x'; 200]);
        input.extend_from_slice(b"\r\n");
        let err = decode_slice(&input).await.unwrap_err();
        match err {
            ProxyError::MalformedHeader { detail, .. } => {
                assert!(detail.contains("108"), "{detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn longest_legal_header_fits_the_bound() {
        // 107 bytes: worst-case TCP6 header per the classic bound.
        let input = b"PROXY TCP6 ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff \
ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff 65535 65535\r\n";
        assert!(input.len() <= V1_MAX_HEADER_BYTES);
        let header = decode_slice(input).await.unwrap();
        assert_eq!(header.source().port(), 65535);
    }

    #[tokio::test]
    async fn six_digit_port_is_malformed() {
        let err = decode_slice(b"PROXY TCP4 1.2.3.4 5.6.7.8 111111 2\r\n")
            .await
            .unwrap_err();
        assert!(err.is_malformed());
    }
}
