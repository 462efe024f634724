//! The rectangular tile grid and board coordinates.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MapError, Tile};

/// A board position. `row` grows downward, `col` grows rightward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True when `other` is exactly one orthogonal step away.
    pub fn is_adjacent(self, other: Coord) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A rectangular grid of tiles, stored row-major.
///
/// Serializes as the bare nested array used by map documents. Ragged input
/// is rejected on deserialization, so every `Grid` in memory is rectangular.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Tile>>", into = "Vec<Vec<Tile>>")]
pub struct Grid {
    rows: Vec<Vec<Tile>>,
}

impl Grid {
    /// Builds a grid, rejecting rows of unequal length.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, MapError> {
        let expected = rows.first().map_or(0, Vec::len);
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.len()))
            .find(|(_, len)| *len != expected)
        {
            return Err(MapError::RaggedRow {
                row,
                expected,
                found,
            });
        }
        Ok(Self { rows })
    }

    /// A `height` x `width` grid filled with copies of `tile`.
    pub fn filled(height: usize, width: usize, tile: Tile) -> Self {
        Self {
            rows: vec![vec![tile; width]; height],
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn cell_count(&self) -> usize {
        self.height() * self.width()
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.row < self.height() && at.col < self.width()
    }

    /// True for cells on the first/last row or column.
    pub fn is_on_edge(&self, at: Coord) -> bool {
        at.row == 0
            || at.col == 0
            || at.row + 1 == self.height()
            || at.col + 1 == self.width()
    }

    pub fn get(&self, at: Coord) -> Option<&Tile> {
        self.rows.get(at.row).and_then(|r| r.get(at.col))
    }

    pub fn get_mut(&mut self, at: Coord) -> Option<&mut Tile> {
        self.rows.get_mut(at.row).and_then(|r| r.get_mut(at.col))
    }

    /// Like [`get_mut`](Self::get_mut) but reports the coordinate on failure.
    pub fn tile_mut(&mut self, at: Coord) -> Result<&mut Tile, MapError> {
        self.get_mut(at).ok_or(MapError::OutOfBounds(at))
    }

    /// All cells with their coordinates, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Tile)> {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, tile)| (Coord::new(row, col), tile))
        })
    }

    /// Mutable cells with their coordinates, in row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Coord, &mut Tile)> {
        self.rows.iter_mut().enumerate().flat_map(|(row, cells)| {
            cells
                .iter_mut()
                .enumerate()
                .map(move |(col, tile)| (Coord::new(row, col), tile))
        })
    }

    /// In-bounds orthogonal neighbors (up, down, left, right).
    pub fn neighbors(&self, at: Coord) -> impl Iterator<Item = Coord> + '_ {
        let up = at.row.checked_sub(1).map(|r| Coord::new(r, at.col));
        let down = Some(Coord::new(at.row + 1, at.col));
        let left = at.col.checked_sub(1).map(|c| Coord::new(at.row, c));
        let right = Some(Coord::new(at.row, at.col + 1));
        [up, down, left, right]
            .into_iter()
            .flatten()
            .filter(|c| self.contains(*c))
    }

    /// Breadth-first search from `start` over cells accepted by `passable`.
    ///
    /// Returns the visited cells in visit order; `start` is first. An
    /// impassable or out-of-bounds start yields an empty list.
    pub fn flood<F>(&self, start: Coord, passable: F) -> Vec<Coord>
    where
        F: Fn(&Tile) -> bool,
    {
        let Some(tile) = self.get(start) else {
            return Vec::new();
        };
        if !passable(tile) {
            return Vec::new();
        }

        let mut seen = vec![vec![false; self.width()]; self.height()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen[start.row][start.col] = true;

        while let Some(at) = queue.pop_front() {
            order.push(at);
            for next in self.neighbors(at) {
                if seen[next.row][next.col] {
                    continue;
                }
                if self.get(next).is_some_and(&passable) {
                    seen[next.row][next.col] = true;
                    queue.push_back(next);
                }
            }
        }
        order
    }
}

impl TryFrom<Vec<Vec<Tile>>> for Grid {
    type Error = MapError;

    fn try_from(rows: Vec<Vec<Tile>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<Tile>> {
    fn from(grid: Grid) -> Self {
        grid.rows
    }
}
