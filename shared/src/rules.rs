//! Rule engine: legal moves, flips, scoring and the end-of-game test
//!
//! Everything here is a pure function of a [`Board`]; the same board and colour
//! always give the same answer.

use crate::board::{Board, Color, Coord};
use serde::{Deserialize, Serialize};

const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A legal placement together with the opposing stones it turns over
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Move {
    pub coord: Coord,
    pub flips: Vec<Coord>,
}

/// Stone count per colour
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub black: usize,
    pub white: usize,
}

impl Score {
    pub fn of(&self, color: Color) -> usize {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    /// The colour with strictly more stones, `None` on a tie
    pub fn leader(&self) -> Option<Color> {
        match self.black.cmp(&self.white) {
            std::cmp::Ordering::Greater => Some(Color::Black),
            std::cmp::Ordering::Less => Some(Color::White),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Opposing stones captured in one direction from `from`.
///
/// The run counts only if it has at least one stone and is closed by a stone
/// of `color`; running into an empty cell or off the board yields nothing.
fn ray_flips(board: &Board, color: Color, from: Coord, dr: isize, dc: isize) -> Vec<Coord> {
    let opponent = color.opponent();
    let mut run = Vec::new();
    let mut cursor = from.offset(dr, dc);

    while let Some(coord) = cursor {
        match board.get(coord) {
            Some(stone) if stone == opponent => run.push(coord),
            Some(_) => return run,
            None => break,
        }
        cursor = coord.offset(dr, dc);
    }

    Vec::new()
}

/// All stones that placing `color` at `coord` would flip.
///
/// Empty when the cell is occupied or no direction captures anything.
pub fn flips_for(board: &Board, color: Color, coord: Coord) -> Vec<Coord> {
    if !board.is_empty_at(coord) {
        return Vec::new();
    }

    DIRECTIONS
        .iter()
        .flat_map(|&(dr, dc)| ray_flips(board, color, coord, dr, dc))
        .collect()
}

/// Every legal move for `color`, in row-major order
pub fn legal_moves(board: &Board, color: Color) -> Vec<Move> {
    Board::coords()
        .filter_map(|coord| {
            let flips = flips_for(board, color, coord);
            if flips.is_empty() {
                None
            } else {
                Some(Move { coord, flips })
            }
        })
        .collect()
}

pub fn has_legal_move(board: &Board, color: Color) -> bool {
    Board::coords().any(|coord| !flips_for(board, color, coord).is_empty())
}

pub fn score(board: &Board) -> Score {
    Score {
        black: board.count(Color::Black),
        white: board.count(Color::White),
    }
}

/// The game is over exactly when neither colour can move
pub fn is_terminal(board: &Board) -> bool {
    !has_legal_move(board, Color::Black) && !has_legal_move(board, Color::White)
}
