//! Parsed PROXY header model.
//!
//! A [`Header`] is what both decoders produce and what the encoder consumes:
//! the protocol version the sender used, the declared address family, and the
//! source/destination endpoints of the original (pre-proxy) connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// PROXY protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// Human-readable text form, `PROXY ...\r\n`.
    V1,
    /// Binary form behind the 12-byte magic.
    V2,
}

impl Version {
    /// The version number as it appears on the wire.
    pub fn number(&self) -> u8 {
        match self {
            Version::V1 => 1,
            Version::V2 => 2,
        }
    }
}

/// Declared address family of a PROXY header.
///
/// This is a closed enumeration: decode rejects any token outside this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// IPv4 over TCP.
    Tcp4,
    /// IPv6 over TCP.
    Tcp6,
    /// The sender could not or would not identify the original addresses.
    /// Endpoint fields are meaningless and must be ignored.
    Unknown,
}

impl Family {
    /// The ASCII token used in v1 headers.
    pub fn token(&self) -> &'static str {
        match self {
            Family::Tcp4 => "TCP4",
            Family::Tcp6 => "TCP6",
            Family::Unknown => "UNKNOWN",
        }
    }

    /// Map a v1 token to a family. Case-sensitive, exact match only.
    pub fn from_token(token: &[u8]) -> Option<Family> {
        match token {
            b"TCP4" => Some(Family::Tcp4),
            b"TCP6" => Some(Family::Tcp6),
            b"UNKNOWN" => Some(Family::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// The endpoint reported when the header carries no usable address
/// (family `UNKNOWN`, v2 `LOCAL` command, or an AF_UNIX address block).
pub const ZERO_ENDPOINT: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

/// A decoded PROXY protocol header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: Version,
    family: Family,
    source: SocketAddr,
    destination: SocketAddr,
}

impl Header {
    /// Build a header carrying real proxied addresses.
    pub fn new(
        version: Version,
        family: Family,
        source: SocketAddr,
        destination: SocketAddr,
    ) -> Self {
        Self {
            version,
            family,
            source,
            destination,
        }
    }

    /// Build an `UNKNOWN`-family header. Both endpoints are pinned to
    /// [`ZERO_ENDPOINT`] so the invariant "unknown family carries no
    /// addresses" cannot be violated by construction.
    pub fn unknown(version: Version) -> Self {
        Self {
            version,
            family: Family::Unknown,
            source: ZERO_ENDPOINT,
            destination: ZERO_ENDPOINT,
        }
    }

    /// Protocol version the sender used.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Declared address family.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Original client endpoint. [`ZERO_ENDPOINT`] when the family is
    /// [`Family::Unknown`].
    pub fn source(&self) -> SocketAddr {
        self.source
    }

    /// Original destination endpoint (what the client connected to).
    /// [`ZERO_ENDPOINT`] when the family is [`Family::Unknown`].
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}
