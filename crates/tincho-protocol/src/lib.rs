//! Wire protocol for Tincho.
//!
//! This crate defines the "language" spoken between players and the server:
//!
//! - **Actions** ([`Action`]): what a player asks the room to do.
//! - **Updates** ([`Update`]): what the room tells players happened.
//! - **Handshake** ([`Request`], [`Reply`]): the first exchange on a new
//!   socket: create a room, join one, or list them.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! Every message is an envelope `{"type": ..., "data": ...}`. The `type`
//! discriminant picks the shape of `data`.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and rooms. It
//! doesn't know about connections or rooms, only about message shapes.
//!
//! ```text
//! Transport (bytes) → Protocol (Action / Update) → Room (game state)
//! ```

mod action;
mod codec;
mod error;
mod handshake;
mod types;
mod update;

pub use action::{
    Action, CutData, DiscardData, DrawData, PeekOtherData, PeekOwnData,
    SwapData,
};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use handshake::{CreateRoom, JoinRoom, Reply, Request, RoomListEntry};
pub use types::{PlayerHand, PlayerView, Recipient, RoomId};
pub use update::{
    CutUpdate, DiscardUpdate, DrawUpdate, EffectPeekUpdate,
    EffectSwapUpdate, EndGameUpdate, ErrorUpdate, FailedDoubleDiscardUpdate,
    GameConfigUpdate, PlayerPeekedUpdate, PlayersChangedUpdate,
    RejoinUpdate, RoundStartUpdate, TurnUpdate, Update,
};

// Game vocabulary that appears in messages.
pub use tincho_game::{Card, CardEffect, DrawSource, PlayerId, Round, Suit};
