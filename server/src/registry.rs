//! Session registry: owns every running game and the participant → room table
//!
//! The registry is the only owner of [`GameSession`] values. Participants are
//! looked up by id on every command, so nothing about a game is tied to the
//! lifetime of a network connection; dropping a connection is just a call to
//! [`SessionRegistry::release`].
//!
//! Rooms are created lazily on first join, or explicitly by matchmaking, and
//! are kept until the process exits.

use crate::error::GameError;
use crate::game::GameSession;
use log::info;
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared::Color;
use std::collections::HashMap;

const ROOM_ID_LEN: usize = 8;

/// Longest room id a participant may ask for, in bytes. Every state packet
/// echoes the id, so it has to stay well inside one datagram.
pub const MAX_ROOM_ID_LEN: usize = 64;

/// A participant's seat was given up, by leaving or by moving to another room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub room_id: String,
    pub color: Color,
    /// True if this ended a game that was still running
    pub forfeited: bool,
}

/// Result of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub color: Color,
    /// Seat given up in the room the participant was in before, if any
    pub previous: Option<Release>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, GameSession>,
    bindings: HashMap<u32, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room with this id, creating it if needed
    pub fn ensure_session(&mut self, room_id: &str) -> &mut GameSession {
        self.sessions.entry(room_id.to_string()).or_insert_with(|| {
            info!("Created room {}", room_id);
            GameSession::new()
        })
    }

    /// Creates a room under a freshly generated id and returns the id
    pub fn create_session<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let room_id = loop {
            let suffix: String = (0..ROOM_ID_LEN)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect();
            let candidate = format!("room-{}", suffix);
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        self.ensure_session(&room_id);
        room_id
    }

    pub fn get(&self, room_id: &str) -> Option<&GameSession> {
        self.sessions.get(room_id)
    }

    pub(crate) fn get_mut(&mut self, room_id: &str) -> Option<&mut GameSession> {
        self.sessions.get_mut(room_id)
    }

    #[cfg(test)]
    pub(crate) fn insert_session(&mut self, room_id: &str, session: GameSession) {
        self.sessions.insert(room_id.to_string(), session);
    }

    /// Seats `participant` in `room_id`, creating the room if it does not exist.
    ///
    /// Fails with [`GameError::RoomFull`] if two others are already seated;
    /// in that case nothing changes and any previous seat is kept. On success
    /// a seat held in a different room is released.
    pub fn bind_participant(
        &mut self,
        room_id: &str,
        participant: u32,
        requested: Option<Color>,
    ) -> Result<Binding, GameError> {
        let color = self.ensure_session(room_id).bind(participant, requested)?;

        let moving = self
            .bindings
            .get(&participant)
            .map_or(false, |current| current.as_str() != room_id);
        let previous = if moving {
            self.release(participant)
        } else {
            None
        };
        self.bindings.insert(participant, room_id.to_string());

        info!("Participant {} joined {} as {}", participant, room_id, color);
        Ok(Binding { color, previous })
    }

    /// Gives up the participant's seat.
    ///
    /// A running game is forfeited in favour of the other colour.
    pub fn release(&mut self, participant: u32) -> Option<Release> {
        let room_id = self.bindings.remove(&participant)?;
        let session = self.sessions.get_mut(&room_id)?;
        let color = session.unbind(participant)?;
        let forfeited = session.forfeit(color);

        info!("Participant {} left {} ({})", participant, room_id, color);
        Some(Release {
            room_id,
            color,
            forfeited,
        })
    }

    pub fn session_of(&self, participant: u32) -> Option<&str> {
        self.bindings.get(&participant).map(String::as_str)
    }

    pub fn color_of(&self, participant: u32) -> Option<Color> {
        let room_id = self.session_of(participant)?;
        self.sessions.get(room_id)?.color_of(participant)
    }

    /// Ids of everyone seated in the room
    pub fn participants(&self, room_id: &str) -> Vec<u32> {
        self.sessions
            .get(room_id)
            .map(|session| session.participants().into_iter().map(|(id, _)| id).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
