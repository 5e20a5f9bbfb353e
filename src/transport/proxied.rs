//! Listener and stream adapters that splice the header codec into ordinary
//! transport I/O.
//!
//! The accept path is: take a transport connection, decode the PROXY header
//! inline (under the configured deadline, if any), and hand back a
//! [`ProxyStream`] whose reads start at the first payload byte. A connection
//! whose header times out, is malformed, or speaks an unsupported version is
//! closed before the error reaches the caller - an accepted-but-unusable
//! transport is never leaked.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use crate::config::ProxyConfig;
use crate::core::cursor::Cursor;
use crate::core::header::Header;
use crate::error::{ProxyError, Result};
use crate::protocol::decode_with_cursor;

/// A TCP listener whose accepted connections arrive with their PROXY header
/// already decoded.
///
/// Mirrors the capability set of the listener it wraps (`accept`,
/// `local_addr`), so it is a drop-in substitute in accept loops. Callers that
/// want many connections in flight run the accept loop under their own
/// concurrency model; this type takes no position on that.
pub struct ProxyListener {
    inner: TcpListener,
    header_read_timeout: Duration,
}

impl ProxyListener {
    /// Wrap a bound listener with the given configuration.
    pub fn new(inner: TcpListener, config: ProxyConfig) -> Self {
        Self {
            inner,
            header_read_timeout: config.header_read_timeout,
        }
    }

    /// Accept a connection and decode its PROXY header before returning.
    ///
    /// The returned address is the *transport* peer (the proxy itself); the
    /// original client address is on the stream via
    /// [`ProxyStream::proxied_remote_addr`]. The configured header read
    /// timeout budgets only the decode, and a failed or timed-out decode
    /// closes the transport before the error is returned, so the listener
    /// stays usable for subsequent accepts.
    pub async fn accept(&self) -> Result<(ProxyStream<TcpStream>, SocketAddr)> {
        let (transport, peer) = self.inner.accept().await?;
        match ProxyStream::accept(transport, self.header_read_timeout).await {
            Ok(stream) => {
                debug!(
                    transport_peer = %peer,
                    client = %stream.proxied_remote_addr(),
                    "accepted proxied connection"
                );
                Ok((stream, peer))
            }
            Err(err) => {
                // `transport` was consumed and dropped inside `accept`, which
                // closed it; only the error escapes.
                warn!(transport_peer = %peer, error = %err, "rejecting connection");
                Err(err)
            }
        }
    }

    /// The local address this listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Unwrap the underlying listener.
    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}

/// A bidirectional stream with its PROXY header stripped and retained.
///
/// Reads start at the byte immediately after the header; no header byte is
/// ever visible to the caller. Writes, flush, and shutdown forward to the
/// transport unchanged, and dropping or shutting down the stream closes the
/// transport exactly once.
///
/// There are no per-stream deadline setters here: the header read deadline
/// belongs to the accept path, and payload-phase deadlines are the caller's
/// `tokio::time::timeout` around individual reads and writes.
#[derive(Debug)]
pub struct ProxyStream<S> {
    header: Header,
    /// Bytes pulled past the header during decode; served before the
    /// transport is touched again.
    residue: BytesMut,
    inner: S,
}

impl<S: AsyncRead + AsyncWrite + Unpin> ProxyStream<S> {
    /// Decode the PROXY header from `transport` and wrap it.
    ///
    /// A non-zero `header_read_timeout` bounds the whole decode; once the
    /// header is in, the deadline no longer applies to anything. On any
    /// failure the transport is dropped, which closes it.
    pub async fn accept(mut transport: S, header_read_timeout: Duration) -> Result<Self> {
        let decoded = if header_read_timeout.is_zero() {
            read_header(&mut transport).await
        } else {
            match tokio::time::timeout(header_read_timeout, read_header(&mut transport)).await {
                Ok(result) => result,
                Err(_) => Err(ProxyError::HeaderTimeout),
            }
        };

        let (header, residue) = decoded?;
        Ok(Self {
            header,
            residue,
            inner: transport,
        })
    }

    /// The decoded PROXY header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The original client endpoint as declared by the proxy.
    ///
    /// When the header's family is `UNKNOWN` (or a v2 LOCAL/AF_UNIX header),
    /// this is the zero-endpoint placeholder `0.0.0.0:0`.
    pub fn proxied_remote_addr(&self) -> SocketAddr {
        self.header.source()
    }

    /// Shared reference to the underlying transport.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutable reference to the underlying transport.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap into the transport and any payload bytes already buffered.
    pub fn into_inner(self) -> (S, BytesMut) {
        (self.inner, self.residue)
    }
}

impl ProxyStream<TcpStream> {
    /// The local address of the underlying socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// The transport-level peer (the proxy), as opposed to
    /// [`ProxyStream::proxied_remote_addr`].
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }
}

/// Run the codec against the transport and keep whatever lookahead it pulled
/// but did not consume.
async fn read_header<S: AsyncRead + Unpin>(transport: &mut S) -> Result<(Header, BytesMut)> {
    let mut cursor = Cursor::new(transport);
    let header = decode_with_cursor(&mut cursor).await?;
    Ok((header, cursor.into_residue()))
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncRead for ProxyStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.residue.is_empty() {
            let n = this.residue.len().min(buf.remaining());
            buf.put_slice(&this.residue.split_to(n));
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncWrite for ProxyStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, data)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
