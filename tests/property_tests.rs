//! Property-based tests using proptest
//!
//! These validate codec invariants across randomly generated inputs: the
//! encode/decode roundtrip, the UNKNOWN discard carve-out, and the rule that
//! no byte soup can panic the decoder.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use proptest::prelude::*;
use proxy_protocol::{decode_header, encode, Family, Header, Version};
use tokio_test::block_on;

fn decode_bytes(input: &[u8]) -> proxy_protocol::Result<Header> {
    let mut input = input;
    block_on(decode_header(&mut input))
}

fn tcp4_header() -> impl Strategy<Value = Header> {
    (any::<u32>(), any::<u32>(), any::<u16>(), any::<u16>()).prop_map(|(src, dst, sp, dp)| {
        Header::new(
            Version::V1,
            Family::Tcp4,
            SocketAddr::new(IpAddr::V4(Ipv4Addr::from(src)), sp),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::from(dst)), dp),
        )
    })
}

fn tcp6_header() -> impl Strategy<Value = Header> {
    (any::<u128>(), any::<u128>(), any::<u16>(), any::<u16>()).prop_map(|(src, dst, sp, dp)| {
        Header::new(
            Version::V1,
            Family::Tcp6,
            SocketAddr::new(IpAddr::V6(Ipv6Addr::from(src)), sp),
            SocketAddr::new(IpAddr::V6(Ipv6Addr::from(dst)), dp),
        )
    })
}

// Property: decode(encode(h)) == h for every valid v1 header
proptest! {
    #[test]
    fn prop_v1_roundtrip(header in prop_oneof![tcp4_header(), tcp6_header()]) {
        let bytes = encode(&header).expect("v1 encoding should not fail");
        let decoded = decode_bytes(&bytes).expect("own encoding should decode");

        prop_assert_eq!(decoded, header);
    }
}

// Property: encoding is deterministic
proptest! {
    #[test]
    fn prop_encoding_deterministic(header in tcp4_header()) {
        let first = encode(&header).expect("encoding should not fail");
        let second = encode(&header).expect("encoding should not fail");

        prop_assert_eq!(first, second);
    }
}

// Property: UNKNOWN discards any junk before the terminator
proptest! {
    #[test]
    fn prop_unknown_discards_free_form(junk in prop::collection::vec(
        any::<u8>().prop_filter("no CR", |b| *b != b'\r'),
        0..80,
    )) {
        let mut input = b"PROXY UNKNOWN ".to_vec();
        input.extend_from_slice(&junk);
        input.extend_from_slice(b"\r\n");

        let header = decode_bytes(&input).expect("UNKNOWN junk should decode");
        prop_assert_eq!(header, Header::unknown(Version::V1));
    }
}

// Property: arbitrary bytes never panic the decoder
proptest! {
    #[test]
    fn prop_decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_bytes(&data);
    }
}

// Property: arbitrary bytes behind a valid signature never panic either
proptest! {
    #[test]
    fn prop_decode_after_signature_never_panics(data in prop::collection::vec(any::<u8>(), 0..128)) {
        let mut v1 = b"PROXY ".to_vec();
        v1.extend_from_slice(&data);
        let _ = decode_bytes(&v1);

        let mut v2 = b"\r\n\r\n\x00\r\nQUIT\n".to_vec();
        v2.extend_from_slice(&data);
        let _ = decode_bytes(&v2);
    }
}

// Property: out-of-range ports are always rejected
proptest! {
    #[test]
    fn prop_oversized_port_rejected(port in 65536u32..1_000_000) {
        let input = format!("PROXY TCP4 1.2.3.4 5.6.7.8 {port} 80\r\n");
        let err = decode_bytes(input.as_bytes()).expect_err("port should be rejected");

        prop_assert!(err.is_malformed());
    }
}
