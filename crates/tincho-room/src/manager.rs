//! Room manager: creates, tracks, and hands out rooms.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tincho_game::{Deck, STARTING_HAND_SIZE, Tincho};
use tincho_protocol::{RoomId, RoomListEntry};

use crate::room::spawn_room;
use crate::{RegistryConfig, RoomConfig, RoomError, RoomHandle};

const ROOM_ID_LEN: usize = 4;

struct ManagedRoom {
    handle: RoomHandle,
    password: Option<String>,
}

/// Owns every live room, keyed by its short id.
///
/// This is the entry point for room operations from the server's accept
/// loop. It never waits on a room actor, so it is safe to keep behind a
/// lock that is released before joining.
pub struct RoomManager {
    rooms: HashMap<RoomId, ManagedRoom>,
    config: RegistryConfig,
}

impl RoomManager {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Shuffles `deck` and starts a room around it.
    ///
    /// The deck must cover a full table: every seat's starting hand plus
    /// the first discard. Closed rooms are reclaimed first, so they never
    /// count against the room limit.
    pub fn create_room(
        &mut self,
        mut deck: Deck,
        max_players: Option<usize>,
        password: Option<String>,
    ) -> Result<RoomId, RoomError> {
        let config = RoomConfig {
            max_players: max_players.unwrap_or(self.config.room.max_players),
            ..self.config.room.clone()
        };
        config.validate()?;
        let needed = config.max_players * STARTING_HAND_SIZE + 1;
        if deck.len() < needed {
            return Err(RoomError::InvalidConfig(format!(
                "deck has {} cards, {} players need {needed}",
                deck.len(),
                config.max_players
            )));
        }

        self.clear_closed_rooms();
        if self.rooms.len() >= self.config.max_rooms {
            return Err(RoomError::RoomsLimitReached);
        }

        let mut rng = rand::rng();
        let room_id = loop {
            let candidate = random_room_id(&mut rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        deck.shuffle(&mut rng);
        let game = Tincho::with_rng(
            deck,
            config.effects.clone(),
            StdRng::from_rng(&mut rng),
        );

        let handle = spawn_room(room_id.clone(), config, game);
        let password = password.filter(|p| !p.is_empty());
        tracing::info!(
            %room_id,
            max_players = handle.max_players(),
            has_password = password.is_some(),
            "room created"
        );
        self.rooms
            .insert(room_id.clone(), ManagedRoom { handle, password });
        Ok(room_id)
    }

    /// Looks up a live room and checks the password.
    ///
    /// A player resuming a seat proves themselves with their session
    /// token, so the password is not asked again. The room checks that
    /// token against an existing seat in [`RoomHandle::join`].
    pub fn admit(
        &self,
        room_id: &RoomId,
        password: Option<&str>,
        resuming: bool,
    ) -> Result<RoomHandle, RoomError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        if room.handle.is_closed() {
            return Err(RoomError::Closed(room_id.clone()));
        }
        if let Some(expected) = &room.password {
            if !resuming && password != Some(expected.as_str()) {
                return Err(RoomError::InvalidPassword(room_id.clone()));
            }
        }
        Ok(room.handle.clone())
    }

    /// Returns a handle to the room, closed or not.
    pub fn get(&self, room_id: &RoomId) -> Option<&RoomHandle> {
        self.rooms.get(room_id).map(|room| &room.handle)
    }

    /// Handles to every live room. Reading them does not need the
    /// manager, so callers can drop their lock before awaiting
    /// [`RoomListing::entries`].
    pub fn listing(&self) -> RoomListing {
        let rooms = self
            .rooms
            .values()
            .filter(|room| !room.handle.is_closed())
            .map(|room| (room.handle.clone(), room.password.is_some()))
            .collect();
        RoomListing { rooms }
    }

    /// Drops every closed room. Returns how many were removed.
    pub fn clear_closed_rooms(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|room_id, room| {
            let keep = !room.handle.is_closed();
            if !keep {
                tracing::debug!(%room_id, "reclaiming closed room");
            }
            keep
        });
        before - self.rooms.len()
    }

    /// Closes every room, e.g. on server shutdown.
    pub fn close_all(&self) {
        for room in self.rooms.values() {
            room.handle.close();
        }
    }

    /// Rooms tracked, including closed ones not yet reclaimed.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

/// Live rooms captured by [`RoomManager::listing`].
pub struct RoomListing {
    rooms: Vec<(RoomHandle, bool)>,
}

impl RoomListing {
    /// Summaries ordered by room id.
    pub async fn entries(self) -> Vec<RoomListEntry> {
        let mut entries = Vec::with_capacity(self.rooms.len());
        for (handle, has_password) in self.rooms {
            let (players, playing) = handle
                .read(|game| {
                    let ids = game.players().iter().map(|p| p.id.clone());
                    (ids.collect(), game.playing())
                })
                .await;
            entries.push(RoomListEntry {
                room: handle.room_id().clone(),
                players,
                max_players: handle.max_players(),
                playing,
                has_password,
            });
        }
        entries.sort_by(|a, b| a.room.as_str().cmp(b.room.as_str()));
        entries
    }
}

/// Four uppercase ASCII letters, e.g. `"QWER"`.
fn random_room_id<R: Rng + ?Sized>(rng: &mut R) -> RoomId {
    let id: String = (0..ROOM_ID_LEN)
        .map(|_| char::from(rng.random_range(b'A'..=b'Z')))
        .collect();
    RoomId::new(id)
}
