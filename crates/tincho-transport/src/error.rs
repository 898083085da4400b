use std::net::SocketAddr;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while listening for or talking to player sockets.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The TCP accept itself failed. Usually transient (fd exhaustion).
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The peer connected but never completed the WebSocket upgrade.
    #[error("websocket upgrade from {peer} failed: {source}")]
    Upgrade {
        peer: SocketAddr,
        #[source]
        source: BoxError,
    },

    /// Reading or writing an established socket failed.
    #[error("socket to {peer} failed: {source}")]
    Socket {
        peer: SocketAddr,
        #[source]
        source: BoxError,
    },
}

impl TransportError {
    pub(crate) fn socket(
        peer: SocketAddr,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Socket {
            peer,
            source: source.into(),
        }
    }
}
