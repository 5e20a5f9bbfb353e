//! PROXY protocol v2 (binary) decoder.
//!
//! Layout after the 12-byte magic:
//!
//! ```text
//! [VerCmd(1)] [FamProto(1)] [Length(2, BE)] [Address block(Length)]
//! ```
//!
//! The version nibble must be 2. The command nibble is LOCAL (0, health
//! checks and the like - no proxied address) or PROXY (1). The address block
//! is shaped by the family nibble: INET carries 4+4 byte addresses and 2+2
//! byte ports, INET6 16+16 and 2+2, UNIX a 108+108 byte path pair, UNSPEC
//! nothing in particular. Bytes inside the declared length beyond the fixed
//! fields are TLV extensions and are skipped; bytes beyond the declared
//! length are payload and are never consumed.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::{Buf, BytesMut};
use tokio::io::AsyncRead;

use crate::core::cursor::Cursor;
use crate::core::header::{Family, Header, Version};
use crate::error::{ProxyError, Result};
use crate::protocol::detect::V2_SIGNATURE;

/// Fixed part of a v2 header: magic, version/command, family/protocol,
/// address block length.
pub const V2_PREFIX_BYTES: usize = 16;

/// Largest possible v2 header: fixed prefix plus a maximal address block.
pub const V2_MAX_HEADER_BYTES: usize = V2_PREFIX_BYTES + u16::MAX as usize;

const COMMAND_LOCAL: u8 = 0x0;
const COMMAND_PROXY: u8 = 0x1;

const FAMILY_UNSPEC: u8 = 0x0;
const FAMILY_INET: u8 = 0x1;
const FAMILY_INET6: u8 = 0x2;
const FAMILY_UNIX: u8 = 0x3;

/// INET address block: 4+4 byte addresses, 2+2 byte ports.
const INET_BLOCK_BYTES: usize = 12;
/// INET6 address block: 16+16 byte addresses, 2+2 byte ports.
const INET6_BLOCK_BYTES: usize = 36;
/// UNIX address block: 108+108 byte paths.
const UNIX_BLOCK_BYTES: usize = 216;

/// Decode a v2 header. The cursor must be positioned at the first magic byte.
pub(crate) async fn decode<R: AsyncRead + Unpin>(cursor: &mut Cursor<R>) -> Result<Header> {
    cursor.set_limit(V2_MAX_HEADER_BYTES);

    let magic = cursor.read_exact(V2_SIGNATURE.len()).await?;
    if magic != V2_SIGNATURE {
        return Err(ProxyError::malformed(0, "expected v2 magic"));
    }

    let offset = cursor.offset();
    let ver_cmd = cursor.next_byte().await?;
    let version = ver_cmd >> 4;
    if version != 2 {
        return Err(ProxyError::UnsupportedVersion(version));
    }
    let command = ver_cmd & 0x0F;
    if command != COMMAND_LOCAL && command != COMMAND_PROXY {
        return Err(ProxyError::malformed(
            offset,
            format!("invalid command nibble {command:#x}"),
        ));
    }

    let offset = cursor.offset();
    let fam_proto = cursor.next_byte().await?;
    let family = fam_proto >> 4;
    let protocol = fam_proto & 0x0F;
    if family > FAMILY_UNIX {
        return Err(ProxyError::malformed(
            offset,
            format!("invalid address family nibble {family:#x}"),
        ));
    }
    if protocol > 0x2 {
        return Err(ProxyError::malformed(
            offset,
            format!("invalid transport protocol nibble {protocol:#x}"),
        ));
    }

    let length = cursor.read_exact(2).await?.get_u16() as usize;

    // Consume exactly the declared address block, no more. Anything after it
    // on the stream is payload.
    let block = cursor.read_exact(length).await?;

    if command == COMMAND_LOCAL {
        // LOCAL means "no real proxied address"; the block (if any) is
        // ignored, like v1's UNKNOWN.
        return Ok(Header::unknown(Version::V2));
    }

    let block_offset = cursor.offset() - length;
    match family {
        FAMILY_INET => decode_inet_block(block, block_offset),
        FAMILY_INET6 => decode_inet6_block(block, block_offset),
        FAMILY_UNIX => {
            // Validated but not exposed: path addresses have no place in a
            // socket-address model.
            if block.len() < UNIX_BLOCK_BYTES {
                return Err(short_block(block_offset, block.len(), UNIX_BLOCK_BYTES));
            }
            Ok(Header::unknown(Version::V2))
        }
        _ => Ok(Header::unknown(Version::V2)),
    }
}

fn decode_inet_block(mut block: BytesMut, offset: usize) -> Result<Header> {
    if block.len() < INET_BLOCK_BYTES {
        return Err(short_block(offset, block.len(), INET_BLOCK_BYTES));
    }
    let source_ip = IpAddr::V4(Ipv4Addr::from(block.get_u32()));
    let destination_ip = IpAddr::V4(Ipv4Addr::from(block.get_u32()));
    let source_port = block.get_u16();
    let destination_port = block.get_u16();
    Ok(Header::new(
        Version::V2,
        Family::Tcp4,
        SocketAddr::new(source_ip, source_port),
        SocketAddr::new(destination_ip, destination_port),
    ))
}

fn decode_inet6_block(mut block: BytesMut, offset: usize) -> Result<Header> {
    if block.len() < INET6_BLOCK_BYTES {
        return Err(short_block(offset, block.len(), INET6_BLOCK_BYTES));
    }
    let source_ip = IpAddr::V6(Ipv6Addr::from(block.get_u128()));
    let destination_ip = IpAddr::V6(Ipv6Addr::from(block.get_u128()));
    let source_port = block.get_u16();
    let destination_port = block.get_u16();
    Ok(Header::new(
        Version::V2,
        Family::Tcp6,
        SocketAddr::new(source_ip, source_port),
        SocketAddr::new(destination_ip, destination_port),
    ))
}

fn short_block(offset: usize, declared: usize, needed: usize) -> ProxyError {
    ProxyError::malformed(
        offset,
        format!("address block of {declared} bytes, family needs {needed}"),
    )
}
