//! Rooms for Tincho.
//!
//! Each room runs as an isolated Tokio task (actor model) that is the only
//! writer of its [`Tincho`](tincho_game::Tincho) state. Everything a room
//! hears arrives through channels and is handled one event at a time, so
//! all actions within a room are totally ordered.
//!
//! # Key types
//!
//! - [`RoomManager`]: creates rooms, checks passwords, reclaims closed ones
//! - [`RoomHandle`]: join a running room, read its state, close it
//! - [`ConnectionHandle`]: a seated player's way to send actions in
//! - [`JoinTicket`]: what a successful join hands back
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`], [`RegistryConfig`]: limits and timeouts

mod actions;
mod config;
mod connection;
mod error;
mod manager;
mod room;

pub use config::{
    MAX_PLAYERS, MIN_PLAYERS, RegistryConfig, RoomConfig, RoomState,
};
pub use connection::{ConnectionHandle, JoinTicket, generate_session_token};
pub use error::RoomError;
pub use manager::{RoomListing, RoomManager};
pub use room::{RoomHandle, spawn_room};
