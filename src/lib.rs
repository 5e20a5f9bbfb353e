//! # proxy-protocol
//!
//! Codec and connection adapter for the
//! [PROXY protocol](https://www.haproxy.org/download/2.8/doc/proxy-protocol.txt),
//! the header that load balancers and reverse proxies prepend to a forwarded
//! connection so the backend can see the original client address.
//!
//! This crate decodes (and encodes) that header and splices the result into
//! the stream types an application already uses. It does not proxy or
//! forward traffic itself - it only extracts metadata that an upstream proxy
//! put on the wire.
//!
//! ## Wire Formats
//! ```text
//! v1: PROXY <FAMILY> <SRC-IP> <DST-IP> <SRC-PORT> <DST-PORT>\r\n
//! v2: [Magic(12)] [VerCmd(1)] [FamProto(1)] [Length(2, BE)] [Addresses(Length)]
//! ```
//!
//! ## Decoding from a buffer or stream
//! ```rust
//! use proxy_protocol::{decode_header, Family, Version};
//!
//! tokio_test::block_on(async {
//!     let mut input = &b"PROXY TCP4 203.0.113.7 192.0.2.10 56324 443\r\n"[..];
//!     let header = decode_header(&mut input).await.unwrap();
//!     assert_eq!(header.version(), Version::V1);
//!     assert_eq!(header.family(), Family::Tcp4);
//!     assert_eq!(header.source(), "203.0.113.7:56324".parse().unwrap());
//! });
//! ```
//!
//! ## Accepting proxied connections
//! ```rust,no_run
//! use proxy_protocol::{ProxyConfig, ProxyListener};
//! use std::time::Duration;
//! use tokio::net::TcpListener;
//!
//! # async fn run() -> proxy_protocol::Result<()> {
//! let listener = TcpListener::bind("0.0.0.0:8080").await?;
//! let config = ProxyConfig::with_header_read_timeout(Duration::from_secs(5));
//! let listener = ProxyListener::new(listener, config);
//!
//! loop {
//!     let (stream, _proxy_addr) = listener.accept().await?;
//!     // Reads begin at the first payload byte; the header never leaks.
//!     println!("client: {}", stream.proxied_remote_addr());
//! }
//! # }
//! ```
//!
//! ## Error Model
//! Decoding distinguishes [`IncompleteHeader`](ProxyError::IncompleteHeader)
//! (the input ended early), [`MalformedHeader`](ProxyError::MalformedHeader)
//! (the bytes are structurally wrong), and
//! [`UnsupportedVersion`](ProxyError::UnsupportedVersion); the adapter adds
//! [`HeaderTimeout`](ProxyError::HeaderTimeout) and I/O errors. A bad header
//! is fatal to that one connection and nothing else.

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;

pub use crate::config::ProxyConfig;
pub use crate::core::header::{Family, Header, Version, ZERO_ENDPOINT};
pub use crate::error::{ProxyError, Result};
pub use crate::protocol::{decode_header, detect, encode, Detection};
pub use crate::transport::{ProxyListener, ProxyStream};
