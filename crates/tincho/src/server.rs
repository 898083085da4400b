//! `TinchoServer` builder and accept loop.
//!
//! This is the entry point for running a Tincho server. It ties together
//! all the layers: transport → protocol → room.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tincho_protocol::{Codec, JsonCodec};
use tincho_room::{RegistryConfig, RoomManager};
use tincho_transport::{Listener, TransportError, WebSocketListener};
use tokio::sync::Mutex;

use crate::TinchoError;
use crate::handler::handle_connection;

/// What every connection task shares. The registry lock is held for
/// bookkeeping only, never while waiting on a room.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Tincho server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), tincho::TinchoError> {
/// let server = tincho::TinchoServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TinchoServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
}

impl TinchoServerBuilder {
    /// Loopback on 8080, default registry limits.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            registry_config: RegistryConfig::default(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets room limits and the template for new rooms.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Binds the listener. Uses `JsonCodec` over `WebSocketListener`,
    /// which is what the browser client speaks.
    pub async fn build(self) -> Result<TinchoServer<JsonCodec>, TinchoError> {
        self.registry_config.room.validate()?;
        let listener = WebSocketListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(self.registry_config)),
            codec: JsonCodec,
        });

        Ok(TinchoServer { listener, state })
    }
}

impl Default for TinchoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server that has not started accepting yet.
pub struct TinchoServer<C: Codec> {
    listener: WebSocketListener,
    state: Arc<ServerState<C>>,
}

impl TinchoServer<JsonCodec> {
    pub fn builder() -> TinchoServerBuilder {
        TinchoServerBuilder::new()
    }
}

impl<C: Codec> TinchoServer<C> {
    /// Useful after binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), TinchoError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then closes every
    /// room so connected sockets flush and disconnect.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), TinchoError> {
        tracing::info!("Tincho server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(socket) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(socket, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e @ TransportError::Upgrade { .. }) => {
                        tracing::debug!(error = %e, "upgrade failed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutting down, closing all rooms");
        self.state.rooms.lock().await.close_all();
        Ok(())
    }
}
