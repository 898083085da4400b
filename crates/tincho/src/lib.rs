//! # Tincho
//!
//! Authoritative multiplayer server for Tincho, a draw-and-discard card
//! game where the lowest hand wins the round and the first player past
//! 100 points loses the game.
//!
//! Every table runs as its own room actor (see [`tincho_room`]); this
//! crate accepts WebSocket connections, performs the join handshake and
//! relays actions and updates between sockets and rooms.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tincho::prelude::*;
//!
//! # async fn run() -> Result<(), TinchoError> {
//! let config = ServerConfig::from_env()?;
//! let server = TinchoServer::builder()
//!     .bind(&config.bind_addr)
//!     .registry_config(config.registry)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::TinchoError;
pub use server::{TinchoServer, TinchoServerBuilder};

pub use tincho_game;
pub use tincho_protocol;
pub use tincho_room;
pub use tincho_transport;

/// Everything needed to run a server or write a client in one import.
pub mod prelude {
    pub use crate::{
        ConfigError, ServerConfig, TinchoError, TinchoServer,
        TinchoServerBuilder,
    };
    pub use tincho_game::{
        Card, CardEffect, Deck, DrawSource, EffectRules, GameError, Hand,
        Player, PlayerId, Suit, Tincho,
    };
    pub use tincho_protocol::{
        Action, Codec, CreateRoom, JoinRoom, JsonCodec, ProtocolError,
        Recipient, Reply, Request, RoomId, RoomListEntry, Update,
    };
    pub use tincho_room::{
        RegistryConfig, RoomConfig, RoomError, RoomHandle, RoomManager,
        RoomState,
    };
    pub use tincho_transport::TransportError;
}
