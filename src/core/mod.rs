//! # Core Codec Components
//!
//! Low-level building blocks for the PROXY protocol codec.
//!
//! ## Components
//! - **Cursor**: forward-only, single-pass reader over any byte source
//! - **Header**: the parsed result - version, family, source and destination
//!
//! ## Wire Formats
//! ```text
//! v1: PROXY <FAMILY> <SRC-IP> <DST-IP> <SRC-PORT> <DST-PORT>\r\n
//! v2: [Magic(12)] [VerCmd(1)] [FamProto(1)] [Length(2, BE)] [Addresses(Length)]
//! ```

pub mod cursor;
pub mod header;
