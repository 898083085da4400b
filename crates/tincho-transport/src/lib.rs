//! Socket layer for Tincho.
//!
//! The server only ever sees the [`Listener`] and [`PlayerSocket`] traits:
//! accept a socket, read frames from it, push frames to it. Framing is a
//! whole message per call; the protocol crate owns what the bytes mean.
//!
//! A [`PlayerSocket`] is driven from two tasks at once, one parked in
//! [`recv`](PlayerSocket::recv) and one pushing room updates with
//! [`send`](PlayerSocket::send). Implementations must keep the two
//! directions independent.
//!
//! # Feature Flags
//!
//! - `websocket` (default): browser-facing transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketListener, WebSocketPlayer};

use std::net::SocketAddr;

/// Hands out newly connected player sockets.
pub trait Listener: Send + Sync + 'static {
    type Socket: PlayerSocket;

    /// Waits for the next peer and completes its handshake.
    async fn accept(&mut self) -> Result<Self::Socket, TransportError>;

    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// One connected player.
pub trait PlayerSocket: Send + Sync + 'static {
    /// Pushes one whole message to the peer.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Next whole message from the peer. `Ok(None)` once the peer hung up.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Keepalive probe. Browsers answer it without any client code.
    async fn ping(&self) -> Result<(), TransportError>;

    /// Starts the closing handshake. Later sends fail.
    async fn close(&self) -> Result<(), TransportError>;

    fn peer_addr(&self) -> SocketAddr;
}
