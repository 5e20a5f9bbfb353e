//! # Connection Adapter
//!
//! Wraps an accept-capable listener so every accepted connection has its
//! PROXY header decoded before the caller sees the stream. The wrapped
//! stream is a drop-in substitute for the transport it contains, with one
//! accessor overridden: the remote endpoint it reports is the decoded
//! original client address.

mod proxied;

pub use proxied::{ProxyListener, ProxyStream};
