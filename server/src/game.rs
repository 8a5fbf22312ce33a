use crate::error::GameError;
use log::info;
use shared::{
    flips_for, has_legal_move, score, Board, Color, Coord, GameResult, GameSnapshot, Move,
};
use std::collections::HashMap;

/// What happened after an accepted move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The turn passed to the opponent
    Continue,
    /// The opponent had no legal move, so the mover plays again
    Pass { passed: Color },
    Finished(GameResult),
}

/// State of one match: board, turn, result and who plays which colour.
///
/// While `result` is `None` the game is in progress and `turn` always has a
/// legal move. Only [`play`](Self::play), [`restart`](Self::restart) and
/// [`forfeit`](Self::forfeit) change the position.
#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    turn: Color,
    result: Option<GameResult>,
    last_move: Option<Move>,
    players: HashMap<u32, Color>,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            board: Board::initial(),
            turn: Color::FIRST,
            result: None,
            last_move: None,
            players: HashMap::new(),
        }
    }

    /// Session starting from an arbitrary position, for tests
    #[cfg(test)]
    pub(crate) fn from_position(board: Board, turn: Color) -> Self {
        Self {
            board,
            turn,
            ..Self::new()
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.result.is_some()
    }

    /// Applies a placement by `color` at `coord`.
    ///
    /// On error nothing is changed.
    pub fn play(&mut self, color: Color, coord: Coord) -> Result<MoveOutcome, GameError> {
        if self.is_terminal() || color != self.turn {
            return Err(GameError::NotYourTurn);
        }

        let flips = flips_for(&self.board, color, coord);
        if flips.is_empty() {
            return Err(GameError::IllegalMove);
        }

        self.board = self.board.with_move_applied(color, coord, &flips);
        self.last_move = Some(Move { coord, flips });

        let opponent = color.opponent();
        if has_legal_move(&self.board, opponent) {
            self.turn = opponent;
            return Ok(MoveOutcome::Continue);
        }
        if has_legal_move(&self.board, color) {
            return Ok(MoveOutcome::Pass { passed: opponent });
        }

        let result = match score(&self.board).leader() {
            Some(winner) => GameResult::Won(winner),
            None => GameResult::Draw,
        };
        self.result = Some(result);
        Ok(MoveOutcome::Finished(result))
    }

    /// Starts over with a fresh board; players keep their colours
    pub fn restart(&mut self) {
        self.board = Board::initial();
        self.turn = Color::FIRST;
        self.result = None;
        self.last_move = None;
    }

    /// Ends a running game in favour of the side that did not leave.
    ///
    /// Returns false if the game had already ended.
    pub fn forfeit(&mut self, leaving: Color) -> bool {
        if self.is_terminal() {
            return false;
        }
        let winner = leaving.opponent();
        info!("{} forfeits, {} wins", leaving, winner);
        self.result = Some(GameResult::Forfeit(winner));
        true
    }

    /// Assigns a colour to `participant`.
    ///
    /// A participant already seated keeps their colour. Otherwise the
    /// requested colour is used if free, else the first free one.
    pub fn bind(&mut self, participant: u32, requested: Option<Color>) -> Result<Color, GameError> {
        if let Some(color) = self.players.get(&participant) {
            return Ok(*color);
        }
        if self.players.len() >= 2 {
            return Err(GameError::RoomFull);
        }

        let taken = |color: Color| self.players.values().any(|c| *c == color);
        let color = match requested {
            Some(color) if !taken(color) => color,
            _ => {
                if taken(Color::FIRST) {
                    Color::FIRST.opponent()
                } else {
                    Color::FIRST
                }
            }
        };

        self.players.insert(participant, color);
        Ok(color)
    }

    pub fn unbind(&mut self, participant: u32) -> Option<Color> {
        self.players.remove(&participant)
    }

    pub fn color_of(&self, participant: u32) -> Option<Color> {
        self.players.get(&participant).copied()
    }

    /// Seated participants, ordered by colour (Black first)
    pub fn participants(&self) -> Vec<(u32, Color)> {
        let mut players: Vec<(u32, Color)> = self.players.iter().map(|(id, c)| (*id, *c)).collect();
        players.sort_by_key(|(_, color)| *color != Color::FIRST);
        players
    }

    pub fn snapshot(&self, room_id: &str, message: Option<String>) -> GameSnapshot {
        GameSnapshot {
            room_id: room_id.to_string(),
            board: self.board,
            turn: self.turn,
            last_move: self.last_move.clone(),
            result: self.result,
            score: score(&self.board),
            message,
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
