//! Command dispatch for participant actions
//!
//! [`Coordinator::handle`] takes one command from one participant, updates the
//! registry and waiting queue, and returns the packets that should go out.
//! It never touches the network, so the transport decides how and when those
//! packets are delivered and tests can call it directly.
//!
//! Calls must be serialised: the server loop owns the coordinator and feeds it
//! one command at a time in arrival order.

use crate::error::GameError;
use crate::game::MoveOutcome;
use crate::matchmaking::WaitingQueue;
use crate::registry::{Release, SessionRegistry, MAX_ROOM_ID_LEN};
use log::debug;
use rand::Rng;
use shared::{Coord, GameResult, Notice, Packet};

/// Participant actions, decoded from their packets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    JoinQueue,
    CancelQueue,
    JoinRoom { room_id: String },
    Place { row: i32, col: i32 },
    Restart,
    /// Connection closed or timed out
    Disconnect,
}

impl Command {
    /// Maps inbound packets to commands; connection-level packets give `None`
    pub fn from_packet(packet: &Packet) -> Option<Self> {
        match packet {
            Packet::JoinQueue => Some(Command::JoinQueue),
            Packet::CancelQueue => Some(Command::CancelQueue),
            Packet::JoinRoom { room_id } => Some(Command::JoinRoom {
                room_id: room_id.clone(),
            }),
            Packet::Place { row, col } => Some(Command::Place {
                row: *row,
                col: *col,
            }),
            Packet::Restart => Some(Command::Restart),
            Packet::Disconnect => Some(Command::Disconnect),
            _ => None,
        }
    }
}

/// An outbound packet for one participant
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipient: u32,
    pub packet: Packet,
}

pub struct Coordinator<R: Rng> {
    registry: SessionRegistry,
    queue: WaitingQueue,
    rng: R,
}

impl<R: Rng> Coordinator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            registry: SessionRegistry::new(),
            queue: WaitingQueue::new(),
            rng,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &WaitingQueue {
        &self.queue
    }

    pub fn handle(&mut self, participant: u32, command: Command) -> Vec<Notification> {
        let mut out = Vec::new();
        match command {
            Command::JoinQueue => self.join_queue(participant, &mut out),
            Command::CancelQueue => {
                self.queue.cancel(participant);
                reply(&mut out, participant, Packet::QueueCancelled);
            }
            Command::JoinRoom { room_id } => self.join_room(participant, &room_id, &mut out),
            Command::Place { row, col } => {
                if let Err(err) = self.place(participant, row, col, &mut out) {
                    debug!("Rejected move from {}: {}", participant, err);
                    reply(&mut out, participant, invalid(err));
                }
            }
            Command::Restart => {
                if let Err(err) = self.restart(participant, &mut out) {
                    debug!("Rejected restart from {}: {}", participant, err);
                    reply(&mut out, participant, invalid(err));
                }
            }
            Command::Disconnect => {
                self.queue.cancel(participant);
                if let Some(release) = self.registry.release(participant) {
                    self.announce_release(&release, &mut out);
                }
            }
        }
        out
    }

    fn join_queue(&mut self, participant: u32, out: &mut Vec<Notification>) {
        if let Some(release) = self.registry.release(participant) {
            self.announce_release(&release, out);
        }
        self.queue.enqueue(participant);
        reply(out, participant, Packet::QueueJoined);

        while let Some(pairing) = self.queue.pair_next(&mut self.registry, &mut self.rng) {
            for release in &pairing.released {
                self.announce_release(release, out);
            }
            for (id, color) in pairing.players {
                reply(
                    out,
                    id,
                    Packet::MatchFound {
                        room_id: pairing.room_id.clone(),
                        color,
                    },
                );
            }
            self.broadcast_state(&pairing.room_id, None, out);
        }
    }

    fn join_room(&mut self, participant: u32, room_id: &str, out: &mut Vec<Notification>) {
        if room_id.len() > MAX_ROOM_ID_LEN {
            debug!("Participant {} sent a {} byte room id", participant, room_id.len());
            reply(out, participant, invalid(GameError::InvalidRoomId));
            return;
        }

        let binding = match self.registry.bind_participant(room_id, participant, None) {
            Ok(binding) => binding,
            Err(err) => {
                debug!("Participant {} refused from {}: {}", participant, room_id, err);
                reply(out, participant, Packet::RoomFull);
                return;
            }
        };

        self.queue.cancel(participant);
        if let Some(previous) = &binding.previous {
            self.announce_release(previous, out);
        }

        reply(
            out,
            participant,
            Packet::RoomJoined {
                room_id: room_id.to_string(),
                color: binding.color,
            },
        );
        self.broadcast_state(room_id, None, out);
    }

    fn place(
        &mut self,
        participant: u32,
        row: i32,
        col: i32,
        out: &mut Vec<Notification>,
    ) -> Result<(), GameError> {
        let room_id = self
            .registry
            .session_of(participant)
            .ok_or(GameError::NoActiveSession)?
            .to_string();
        let color = self
            .registry
            .color_of(participant)
            .ok_or(GameError::NoActiveSession)?;
        let session = self
            .registry
            .get_mut(&room_id)
            .ok_or(GameError::NoActiveSession)?;

        if session.is_terminal() || session.turn() != color {
            return Err(GameError::NotYourTurn);
        }
        // Out-of-range coordinates are just another cell with nothing to flip
        let coord = Coord::from_signed(row, col).ok_or(GameError::IllegalMove)?;

        let outcome = session.play(color, coord)?;

        let message = match outcome {
            MoveOutcome::Continue => None,
            MoveOutcome::Pass { passed } => {
                self.broadcast(
                    &room_id,
                    Packet::Message {
                        kind: Notice::Pass,
                        color: passed,
                    },
                    out,
                );
                Some(format!("{} has no legal move and passes", passed))
            }
            MoveOutcome::Finished(result) => Some(result_message(result)),
        };

        self.broadcast_state(&room_id, message, out);
        Ok(())
    }

    fn restart(&mut self, participant: u32, out: &mut Vec<Notification>) -> Result<(), GameError> {
        let room_id = self
            .registry
            .session_of(participant)
            .ok_or(GameError::NoActiveSession)?
            .to_string();
        self.registry
            .get_mut(&room_id)
            .ok_or(GameError::NoActiveSession)?
            .restart();

        self.broadcast_state(&room_id, Some("Game restarted".to_string()), out);
        Ok(())
    }

    /// Tells whoever is still in the room that a seat was given up
    fn announce_release(&self, release: &Release, out: &mut Vec<Notification>) {
        self.broadcast(
            &release.room_id,
            Packet::Message {
                kind: Notice::Left,
                color: release.color,
            },
            out,
        );
        let message = if release.forfeited {
            format!("{} left the game", release.color)
        } else {
            format!("{} left the room", release.color)
        };
        self.broadcast_state(&release.room_id, Some(message), out);
    }

    fn broadcast(&self, room_id: &str, packet: Packet, out: &mut Vec<Notification>) {
        for recipient in self.registry.participants(room_id) {
            reply(out, recipient, packet.clone());
        }
    }

    fn broadcast_state(&self, room_id: &str, message: Option<String>, out: &mut Vec<Notification>) {
        if let Some(session) = self.registry.get(room_id) {
            let snapshot = session.snapshot(room_id, message);
            self.broadcast(room_id, Packet::State(snapshot), out);
        }
    }
}

fn reply(out: &mut Vec<Notification>, recipient: u32, packet: Packet) {
    out.push(Notification { recipient, packet });
}

fn invalid(err: GameError) -> Packet {
    Packet::Invalid {
        reason: err.reason().to_string(),
    }
}

fn result_message(result: GameResult) -> String {
    match result {
        GameResult::Draw => "Game over: draw".to_string(),
        other => format!("Game over: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::game::GameSession;
    use shared::{Board, Color, GameSnapshot, Score};

    fn coordinator() -> Coordinator<StdRng> {
        Coordinator::new(StdRng::seed_from_u64(5))
    }

    fn packets_for(out: &[Notification], recipient: u32) -> Vec<Packet> {
        out.iter()
            .filter(|n| n.recipient == recipient)
            .map(|n| n.packet.clone())
            .collect()
    }

    fn last_state(out: &[Notification], recipient: u32) -> GameSnapshot {
        packets_for(out, recipient)
            .into_iter()
            .rev()
            .find_map(|p| match p {
                Packet::State(snapshot) => Some(snapshot),
                _ => None,
            })
            .expect("no state packet")
    }

    fn invalid_reason(out: &[Notification], recipient: u32) -> String {
        match packets_for(out, recipient).as_slice() {
            [Packet::Invalid { reason }] => reason.clone(),
            other => panic!("expected a single invalid packet, got {:?}", other),
        }
    }

    /// Seats 1 as Black and 2 as White in room "r"
    fn seated() -> Coordinator<StdRng> {
        seated_at(GameSession::new())
    }

    /// Like [`seated`], with room "r" starting from `session`
    fn seated_at(session: GameSession) -> Coordinator<StdRng> {
        let mut c = coordinator();
        c.registry.insert_session("r", session);
        c.handle(1, Command::JoinRoom { room_id: "r".into() });
        c.handle(2, Command::JoinRoom { room_id: "r".into() });
        c
    }

    #[test]
    fn test_from_packet() {
        assert_eq!(
            Command::from_packet(&Packet::Place { row: 2, col: 3 }),
            Some(Command::Place { row: 2, col: 3 })
        );
        assert_eq!(Command::from_packet(&Packet::Heartbeat), None);
        assert_eq!(Command::from_packet(&Packet::QueueJoined), None);
    }

    #[test]
    fn test_join_room_replies_and_broadcasts() {
        let mut c = coordinator();
        let out = c.handle(1, Command::JoinRoom { room_id: "r".into() });

        assert_eq!(
            packets_for(&out, 1)[0],
            Packet::RoomJoined {
                room_id: "r".into(),
                color: Color::Black
            }
        );
        assert_eq!(last_state(&out, 1).board, Board::initial());

        let out = c.handle(2, Command::JoinRoom { room_id: "r".into() });
        assert_eq!(
            packets_for(&out, 2)[0],
            Packet::RoomJoined {
                room_id: "r".into(),
                color: Color::White
            }
        );
        // Both players get the new state
        assert_eq!(last_state(&out, 1).room_id, "r");
        assert_eq!(last_state(&out, 2).room_id, "r");
    }

    #[test]
    fn test_third_join_gets_room_full() {
        let mut c = seated();
        let out = c.handle(3, Command::JoinRoom { room_id: "r".into() });

        assert_eq!(out, vec![Notification { recipient: 3, packet: Packet::RoomFull }]);
        assert_eq!(c.registry().session_of(3), None);
    }

    #[test]
    fn test_rejoining_same_room_keeps_color() {
        let mut c = seated();
        let out = c.handle(2, Command::JoinRoom { room_id: "r".into() });

        assert_eq!(
            packets_for(&out, 2)[0],
            Packet::RoomJoined {
                room_id: "r".into(),
                color: Color::White
            }
        );
        assert!(last_state(&out, 1).result.is_none());
    }

    #[test]
    fn test_place_broadcasts_state() {
        let mut c = seated();
        let out = c.handle(1, Command::Place { row: 2, col: 3 });

        for id in [1, 2] {
            let state = last_state(&out, id);
            assert_eq!(state.turn, Color::White);
            assert_eq!(state.score, Score { black: 4, white: 1 });
            assert_eq!(state.last_move.unwrap().coord, Coord::new(2, 3).unwrap());
        }
    }

    #[test]
    fn test_place_out_of_turn() {
        let mut c = seated();
        let out = c.handle(2, Command::Place { row: 2, col: 4 });

        assert_eq!(invalid_reason(&out, 2), "Not your turn");
        assert!(packets_for(&out, 1).is_empty());
    }

    #[test]
    fn test_place_illegal_cell() {
        let mut c = seated();
        for (row, col) in [(0, 0), (3, 3), (-1, 2), (8, 8)] {
            let out = c.handle(1, Command::Place { row, col });
            assert_eq!(invalid_reason(&out, 1), "Invalid move");
        }
        assert_eq!(*c.registry().get("r").unwrap().board(), Board::initial());
    }

    #[test]
    fn test_place_without_room() {
        let mut c = coordinator();
        let out = c.handle(9, Command::Place { row: 2, col: 3 });
        assert_eq!(invalid_reason(&out, 9), "Not in a room");

        let out = c.handle(9, Command::Restart);
        assert_eq!(invalid_reason(&out, 9), "Not in a room");
    }

    #[test]
    fn test_pass_notice() {
        let board = Board::empty()
            .with_stone(Coord::new(0, 0).unwrap(), Color::Black)
            .with_stone(Coord::new(0, 1).unwrap(), Color::White)
            .with_stone(Coord::new(7, 7).unwrap(), Color::Black)
            .with_stone(Coord::new(7, 6).unwrap(), Color::White);
        let mut c = seated_at(GameSession::from_position(board, Color::Black));

        let out = c.handle(1, Command::Place { row: 0, col: 2 });

        let to_white = packets_for(&out, 2);
        assert_eq!(
            to_white[0],
            Packet::Message {
                kind: Notice::Pass,
                color: Color::White
            }
        );
        let state = last_state(&out, 2);
        assert_eq!(state.turn, Color::Black);
        assert!(state.message.unwrap().contains("passes"));
    }

    #[test]
    fn test_game_over_then_restart() {
        let board = Board::empty()
            .with_stone(Coord::new(0, 0).unwrap(), Color::Black)
            .with_stone(Coord::new(0, 1).unwrap(), Color::White);
        let mut c = seated_at(GameSession::from_position(board, Color::Black));

        let out = c.handle(1, Command::Place { row: 0, col: 2 });
        let state = last_state(&out, 2);
        assert_eq!(state.result, Some(GameResult::Won(Color::Black)));

        let out = c.handle(1, Command::Place { row: 0, col: 3 });
        assert_eq!(invalid_reason(&out, 1), "Not your turn");

        let out = c.handle(2, Command::Restart);
        let state = last_state(&out, 1);
        assert_eq!(state.board, Board::initial());
        assert_eq!(state.turn, Color::Black);
        assert!(state.result.is_none());
        assert!(state.last_move.is_none());
        assert_eq!(c.registry().color_of(1), Some(Color::Black));
        assert_eq!(c.registry().color_of(2), Some(Color::White));
    }

    #[test]
    fn test_restart_mid_game() {
        let mut c = seated();
        c.handle(1, Command::Place { row: 2, col: 3 });
        c.handle(2, Command::Place { row: 2, col: 2 });
        assert_eq!(c.registry().get("r").unwrap().turn(), Color::Black);

        // White is not to move and may still restart
        let out = c.handle(2, Command::Restart);

        for id in [1, 2] {
            let state = last_state(&out, id);
            assert_eq!(state.board, Board::initial());
            assert_eq!(state.turn, Color::Black);
            assert!(state.last_move.is_none());
            assert!(state.result.is_none());
            assert_eq!(state.message.as_deref(), Some("Game restarted"));
        }
        assert_eq!(c.registry().color_of(1), Some(Color::Black));
        assert_eq!(c.registry().color_of(2), Some(Color::White));
    }

    #[test]
    fn test_join_room_rejects_long_id() {
        let mut c = coordinator();
        let room_id = "x".repeat(MAX_ROOM_ID_LEN + 1);
        let out = c.handle(1, Command::JoinRoom { room_id });

        assert_eq!(invalid_reason(&out, 1), "Invalid room id");
        assert!(c.registry().is_empty());
        assert_eq!(c.registry().session_of(1), None);

        let room_id = "x".repeat(MAX_ROOM_ID_LEN);
        let out = c.handle(1, Command::JoinRoom { room_id });
        assert!(matches!(packets_for(&out, 1)[0], Packet::RoomJoined { .. }));
    }

    #[test]
    fn test_queue_pairing_announces_released_seat() {
        let mut c = seated();
        c.queue.enqueue(1);
        let out = c.handle(3, Command::JoinQueue);

        assert_eq!(
            packets_for(&out, 2)[0],
            Packet::Message {
                kind: Notice::Left,
                color: Color::Black
            }
        );
        assert_eq!(
            last_state(&out, 2).result,
            Some(GameResult::Forfeit(Color::White))
        );
        assert_ne!(c.registry().session_of(1), Some("r"));
    }

    #[test]
    fn test_disconnect_of_turn_holder_forfeits() {
        let mut c = seated();
        let out = c.handle(1, Command::Disconnect);

        assert_eq!(
            packets_for(&out, 2)[0],
            Packet::Message {
                kind: Notice::Left,
                color: Color::Black
            }
        );
        let state = last_state(&out, 2);
        assert_eq!(state.result, Some(GameResult::Forfeit(Color::White)));
        assert!(packets_for(&out, 1).is_empty());

        let out = c.handle(2, Command::Place { row: 2, col: 4 });
        assert_eq!(invalid_reason(&out, 2), "Not your turn");
    }

    #[test]
    fn test_disconnect_unknown_participant_is_noop() {
        let mut c = coordinator();
        assert!(c.handle(42, Command::Disconnect).is_empty());
    }

    #[test]
    fn test_queue_pairs_two_participants() {
        let mut c = coordinator();
        let out = c.handle(1, Command::JoinQueue);
        assert_eq!(out, vec![Notification { recipient: 1, packet: Packet::QueueJoined }]);

        let out = c.handle(2, Command::JoinQueue);
        assert!(c.queue().is_empty());

        let found = |id: u32| -> (String, Color) {
            packets_for(&out, id)
                .into_iter()
                .find_map(|p| match p {
                    Packet::MatchFound { room_id, color } => Some((room_id, color)),
                    _ => None,
                })
                .expect("no match found")
        };
        let (room_a, color_a) = found(1);
        let (room_b, color_b) = found(2);

        assert_eq!(room_a, room_b);
        assert_ne!(color_a, color_b);
        assert_eq!(c.registry().participants(&room_a).len(), 2);
        assert_eq!(last_state(&out, 1).room_id, room_a);
    }

    #[test]
    fn test_queue_duplicate_and_cancel() {
        let mut c = coordinator();
        c.handle(1, Command::JoinQueue);
        let out = c.handle(1, Command::JoinQueue);
        assert_eq!(out, vec![Notification { recipient: 1, packet: Packet::QueueJoined }]);
        assert_eq!(c.queue().len(), 1);

        let out = c.handle(1, Command::CancelQueue);
        assert_eq!(out, vec![Notification { recipient: 1, packet: Packet::QueueCancelled }]);
        assert!(c.queue().is_empty());

        // Cancelling again is harmless
        c.handle(1, Command::CancelQueue);
        assert!(c.queue().is_empty());
    }

    #[test]
    fn test_disconnect_leaves_queue() {
        let mut c = coordinator();
        c.handle(1, Command::JoinQueue);
        c.handle(1, Command::Disconnect);
        c.handle(2, Command::JoinQueue);

        assert_eq!(c.queue().len(), 1);
        assert!(c.registry().is_empty());
    }

    #[test]
    fn test_joining_queue_from_room_forfeits() {
        let mut c = seated();
        let out = c.handle(2, Command::JoinQueue);

        assert_eq!(
            last_state(&out, 1).result,
            Some(GameResult::Forfeit(Color::Black))
        );
        assert_eq!(c.registry().session_of(2), None);
        assert!(c.queue().contains(2));
    }

    #[test]
    fn test_join_room_cancels_queue() {
        let mut c = coordinator();
        c.handle(1, Command::JoinQueue);
        c.handle(1, Command::JoinRoom { room_id: "r".into() });
        assert!(c.queue().is_empty());
    }
}
