//! WebSocket sockets over `tokio-tungstenite`.
//!
//! Each socket is split once at accept time. The write half and the read
//! half sit behind separate locks so a reader parked in `recv` never holds
//! up the update writer.

use std::net::SocketAddr;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Listener, PlayerSocket, TransportError};

type WsStream = WebSocketStream<TcpStream>;

/// Accepts browser connections on a TCP port.
pub struct WebSocketListener {
    listener: TcpListener,
}

impl WebSocketListener {
    /// Binds to `addr`. Port 0 lets the OS choose; read it back with
    /// [`Listener::local_addr`].
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            TransportError::Bind {
                addr: addr.to_owned(),
                source,
            }
        })?;
        tracing::info!(addr, "listening for players");
        Ok(Self { listener })
    }
}

impl Listener for WebSocketListener {
    type Socket = WebSocketPlayer;

    async fn accept(&mut self) -> Result<WebSocketPlayer, TransportError> {
        let (stream, peer) =
            self.listener.accept().await.map_err(TransportError::Accept)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(
            |source| TransportError::Upgrade {
                peer,
                source: source.into(),
            },
        )?;
        tracing::debug!(%peer, "websocket upgraded");

        let (sink, stream) = ws.split();
        Ok(WebSocketPlayer {
            peer,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A player's browser tab.
pub struct WebSocketPlayer {
    peer: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketPlayer {
    async fn push(&self, msg: Message) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| TransportError::socket(self.peer, e))
    }
}

impl PlayerSocket for WebSocketPlayer {
    /// JSON goes out as text frames. Non-UTF-8 payloads fall back to
    /// binary frames.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text.to_owned()),
            Err(_) => Message::binary(data.to_vec()),
        };
        self.push(msg).await
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        while let Some(frame) = stream.next().await {
            match frame.map_err(|e| TransportError::socket(self.peer, e))? {
                Message::Text(text) => return Ok(Some(text.as_bytes().to_vec())),
                Message::Binary(data) => return Ok(Some(data.to_vec())),
                Message::Close(_) => return Ok(None),
                // Pongs and pings are handled by tungstenite.
                _ => {}
            }
        }
        Ok(None)
    }

    async fn ping(&self) -> Result<(), TransportError> {
        self.push(Message::Ping(Default::default())).await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::socket(self.peer, e))
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
