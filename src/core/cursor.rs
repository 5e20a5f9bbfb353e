//! Forward-only byte cursor over an abstract byte source.
//!
//! The cursor is the single reader both decoders are written against. It is
//! generic over [`AsyncRead`], which covers the two sources the codec needs:
//! an in-memory buffer (`&[u8]` implements `AsyncRead` and reports end of
//! input immediately) and a live stream (which blocks until bytes arrive).
//!
//! Two properties matter for correctness:
//!
//! - The cursor pulls from the source only what the current operation needs,
//!   so header parsing can never swallow payload bytes that follow on the
//!   same stream. Any lookahead that was peeked but not consumed is
//!   recoverable via [`Cursor::into_residue`].
//! - A byte budget caps how much the cursor will ever pull. Scans that would
//!   cross the budget fail as malformed instead of reading unboundedly.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{ProxyError, Result};

/// Forward-only, single-pass reader with peeking and bounded scans.
pub struct Cursor<R> {
    source: R,
    /// Bytes pulled from the source but not yet consumed.
    lookahead: BytesMut,
    /// Total bytes handed out so far; decode errors carry this offset.
    consumed: usize,
    /// Hard cap on `consumed + lookahead` bytes pulled from the source.
    limit: usize,
}

impl<R: AsyncRead + Unpin> Cursor<R> {
    /// Wrap a byte source. The budget starts unlimited; decoders narrow it
    /// with [`Cursor::set_limit`] once the protocol version is known.
    pub fn new(source: R) -> Self {
        Self {
            source,
            lookahead: BytesMut::with_capacity(64),
            consumed: 0,
            limit: usize::MAX,
        }
    }

    /// Cap the total number of bytes (from the start of input) this cursor
    /// may pull from its source.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.consumed
    }

    /// Recover lookahead that was pulled from the source but never consumed.
    /// These bytes belong to whatever follows the header.
    pub fn into_residue(self) -> BytesMut {
        self.lookahead
    }

    /// Pull bytes until the lookahead holds `target` unconsumed bytes or the
    /// source reports end of input. Never pulls past the byte budget.
    async fn fill(&mut self, target: usize) -> Result<()> {
        if self.lookahead.len() >= target {
            return Ok(());
        }
        if self.consumed + target > self.limit {
            return Err(ProxyError::malformed(
                self.consumed,
                format!("header exceeds {} bytes", self.limit),
            ));
        }
        let mut chunk = [0u8; 64];
        while self.lookahead.len() < target {
            let want = (target - self.lookahead.len()).min(chunk.len());
            let n = self.source.read(&mut chunk[..want]).await?;
            if n == 0 {
                break;
            }
            self.lookahead.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }

    /// Hand out `n` bytes from the lookahead. Callers must have filled first.
    fn advance(&mut self, n: usize) -> BytesMut {
        debug_assert!(self.lookahead.len() >= n);
        self.consumed += n;
        self.lookahead.split_to(n)
    }

    /// Peek the next byte without consuming it. `None` means end of input.
    pub async fn peek_byte(&mut self) -> Result<Option<u8>> {
        self.fill(1).await?;
        Ok(self.lookahead.first().copied())
    }

    /// Peek up to `n` bytes without consuming them. The returned slice is
    /// shorter than `n` only if the source ended first.
    pub async fn peek_prefix(&mut self, n: usize) -> Result<&[u8]> {
        self.fill(n).await?;
        let have = self.lookahead.len().min(n);
        Ok(&self.lookahead[..have])
    }

    /// Consume and return the next byte.
    pub async fn next_byte(&mut self) -> Result<u8> {
        self.fill(1).await?;
        if self.lookahead.is_empty() {
            return Err(ProxyError::IncompleteHeader {
                offset: self.consumed,
            });
        }
        Ok(self.advance(1).get_u8())
    }

    /// Consume exactly `n` bytes. If fewer are available, what was seen is
    /// consumed and the error reports where the input ended.
    pub async fn read_exact(&mut self, n: usize) -> Result<BytesMut> {
        self.fill(n).await?;
        if self.lookahead.len() < n {
            let have = self.lookahead.len();
            self.advance(have);
            return Err(ProxyError::IncompleteHeader {
                offset: self.consumed,
            });
        }
        Ok(self.advance(n))
    }

    /// Consume bytes up to (not including) the delimiter. The delimiter is
    /// left in place for the caller to consume explicitly.
    pub async fn read_until(&mut self, delimiter: u8) -> Result<BytesMut> {
        let mut out = BytesMut::new();
        loop {
            match self.peek_byte().await? {
                None => {
                    return Err(ProxyError::IncompleteHeader {
                        offset: self.consumed,
                    })
                }
                Some(b) if b == delimiter => return Ok(out),
                Some(_) => out.extend_from_slice(&self.advance(1)),
            }
        }
    }

    /// Consume bytes through the next CRLF, returning everything before it.
    /// A lone CR is ordinary content; the scan only ends on the full CRLF
    /// sequence.
    pub async fn read_until_crlf(&mut self) -> Result<BytesMut> {
        let mut out = BytesMut::new();
        loop {
            let b = self.next_byte().await?;
            if b == b'\r' {
                match self.peek_byte().await? {
                    Some(b'\n') => {
                        self.advance(1);
                        return Ok(out);
                    }
                    Some(_) => out.extend_from_slice(b"\r"),
                    None => {
                        return Err(ProxyError::IncompleteHeader {
                            offset: self.consumed,
                        })
                    }
                }
            } else {
                out.extend_from_slice(&[b]);
            }
        }
    }

    /// Consume a maximal run of ASCII digits and parse it as a port number.
    /// An empty run, a run longer than five digits, or a value above 65535
    /// is malformed.
    pub async fn read_decimal_u16(&mut self) -> Result<u16> {
        let start = self.consumed;
        let mut digits = 0usize;
        let mut value = 0u32;

        while let Some(b) = self.peek_byte().await? {
            if !b.is_ascii_digit() {
                break;
            }
            self.advance(1);
            digits += 1;
            if digits > 5 {
                return Err(ProxyError::malformed(start, "port exceeds 65535"));
            }
            value = value * 10 + u32::from(b - b'0');
        }

        if digits == 0 {
            return Err(ProxyError::malformed(start, "expected decimal digits"));
        }
        if value > u32::from(u16::MAX) {
            return Err(ProxyError::malformed(
                start,
                format!("port {value} exceeds 65535"),
            ));
        }
        Ok(value as u16)
    }

    /// Consume one byte and require it to equal `expected`.
    pub async fn expect_byte(&mut self, expected: u8) -> Result<()> {
        let offset = self.consumed;
        let found = self.next_byte().await?;
        if found != expected {
            return Err(ProxyError::malformed(
                offset,
                format!(
                    "expected {:?}, found {:?}",
                    expected.escape_ascii().to_string(),
                    found.escape_ascii().to_string()
                ),
            ));
        }
        Ok(())
    }

    /// Consume the CRLF terminator.
    pub async fn expect_crlf(&mut self) -> Result<()> {
        self.expect_byte(b'\r').await?;
        self.expect_byte(b'\n').await
    }
}
