pub mod board;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use board::{Board, Color, Coord, BOARD_SIZE};
pub use rules::{flips_for, has_legal_move, is_terminal, legal_moves, score, Move, Score};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Heartbeat,
    JoinQueue,
    CancelQueue,
    JoinRoom {
        room_id: String,
    },
    Place {
        row: i32,
        col: i32,
    },
    Restart,
    Disconnect,

    Connected {
        client_id: u32,
    },
    Disconnected {
        reason: String,
    },
    QueueJoined,
    QueueCancelled,
    MatchFound {
        room_id: String,
        color: Color,
    },
    RoomFull,
    RoomJoined {
        room_id: String,
        color: Color,
    },
    State(GameSnapshot),
    Invalid {
        reason: String,
    },
    Message {
        kind: Notice,
        color: Color,
    },
}

/// Side-channel notices sent to everyone in a room
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// `color` had no legal move and was skipped
    Pass,
    /// The participant playing `color` disconnected
    Left,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Draw,
    Won(Color),
    /// The other side left while the game was running
    Forfeit(Color),
}

impl GameResult {
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameResult::Draw => None,
            GameResult::Won(color) | GameResult::Forfeit(color) => Some(*color),
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Draw => write!(f, "Draw"),
            GameResult::Won(color) => write!(f, "{} wins", color),
            GameResult::Forfeit(color) => write!(f, "{} wins (opponent left)", color),
        }
    }
}

/// Everything a participant needs to draw the room, broadcast after each change
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameSnapshot {
    pub room_id: String,
    pub board: Board,
    pub turn: Color,
    pub last_move: Option<Move>,
    pub result: Option<GameResult>,
    pub score: Score,
    pub message: Option<String>,
}
