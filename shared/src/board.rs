//! Board model for the 8x8 stone-placement grid
//!
//! A [`Board`] is a plain value: it is `Copy`, and every change produces a new
//! board instead of mutating one in place. The rule engine in [`crate::rules`]
//! decides which placements are legal; this module only stores stones.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_SIZE: usize = 8;

/// Stone colour. Black always moves first.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The colour that opens every game
    pub const FIRST: Color = Color::Black;

    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "Black"),
            Color::White => write!(f, "White"),
        }
    }
}

/// A cell position, always inside the board
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Converts wire coordinates, which may be negative or too large
    pub fn from_signed(row: i32, col: i32) -> Option<Self> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        Self::new(row, col)
    }

    /// Steps one cell in direction `(dr, dc)`, or `None` when leaving the board
    pub fn offset(self, dr: isize, dc: isize) -> Option<Self> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        Self::new(row, col)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Color>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Empty board with no stones, mostly useful for building test positions
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Standard opening: two stones of each colour on the diagonals of the centre
    pub fn initial() -> Self {
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        cells[3][3] = Some(Color::White);
        cells[3][4] = Some(Color::Black);
        cells[4][3] = Some(Color::Black);
        cells[4][4] = Some(Color::White);
        Self { cells }
    }

    pub fn get(&self, coord: Coord) -> Option<Color> {
        self.cells[coord.row][coord.col]
    }

    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.get(coord).is_none()
    }

    pub fn cells(&self) -> &[[Option<Color>; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Returns a copy of the board with `color` placed at `coord` and every
    /// cell in `flips` turned to `color`.
    ///
    /// The flips are trusted as given; callers compute them with
    /// [`crate::rules::flips_for`] on this same board and colour.
    pub fn with_move_applied(&self, color: Color, coord: Coord, flips: &[Coord]) -> Board {
        let mut next = *self;
        next.cells[coord.row][coord.col] = Some(color);
        for flip in flips {
            next.cells[flip.row][flip.col] = Some(color);
        }
        next
    }

    /// Places a single stone without any rule checks
    pub fn with_stone(&self, coord: Coord, color: Color) -> Board {
        let mut next = *self;
        next.cells[coord.row][coord.col] = Some(color);
        next
    }

    pub fn count(&self, color: Color) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell == Some(color))
            .count()
    }

    /// Iterates over every coordinate in row-major order
    pub fn coords() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord { row, col }))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  0 1 2 3 4 5 6 7")?;
        for (r, row) in self.cells.iter().enumerate() {
            write!(f, "{}", r)?;
            for cell in row {
                let glyph = match cell {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, " {}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
