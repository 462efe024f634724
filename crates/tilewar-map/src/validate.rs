//! Structural rules a map must satisfy before it is saved or played.
//!
//! Each rule is a pure predicate over the grid. [`validate`] runs all of
//! them and collects every violation so the map author sees the full list
//! at once.

use serde::{Deserialize, Serialize};

use crate::{Coord, GameMode, Grid, ItemKind, MapSize, Tile, TileKind};

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    /// One human-readable message per violated rule.
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Records a violation.
    pub fn push(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.push(message);
        }
    }
}

fn is_open(tile: &Tile) -> bool {
    !tile.kind.is_wall()
}

/// True iff every non-wall cell is reachable from the first non-wall cell
/// in row-major order. A grid without any open cell is not connected.
pub fn is_fully_connected(grid: &Grid) -> bool {
    match grid.iter().find(|(_, t)| is_open(t)) {
        Some((start, _)) => is_fully_connected_from(grid, start),
        None => false,
    }
}

/// Connectivity check starting from an arbitrary open cell.
///
/// The answer does not depend on which open cell is chosen: either all
/// open cells form one region or none of them reaches every other.
pub fn is_fully_connected_from(grid: &Grid, start: Coord) -> bool {
    let open = grid.iter().filter(|(_, t)| is_open(t)).count();
    if open == 0 {
        return false;
    }
    grid.flood(start, is_open).len() == open
}

/// True iff grass, water and ice tiles make up strictly more than half of
/// the grid.
pub fn is_terrain_ratio_valid(grid: &Grid) -> bool {
    let terrain = grid.iter().filter(|(_, t)| t.kind.is_terrain()).count();
    terrain * 2 > grid.cell_count()
}

/// True iff every door sits inside the grid between two walls, with
/// terrain on both sides of the passage.
pub fn is_door_placement_valid(grid: &Grid) -> bool {
    grid.iter()
        .filter(|(_, t)| t.kind.is_door())
        .all(|(at, _)| is_door_valid_at(grid, at))
}

fn is_door_valid_at(grid: &Grid, at: Coord) -> bool {
    if grid.is_on_edge(at) {
        return false;
    }
    let kind = |row: usize, col: usize| {
        grid.get(Coord::new(row, col)).map(|t| t.kind)
    };
    let (Some(up), Some(down), Some(left), Some(right)) = (
        kind(at.row - 1, at.col),
        kind(at.row + 1, at.col),
        kind(at.row, at.col - 1),
        kind(at.row, at.col + 1),
    ) else {
        return false;
    };

    let horizontal_passage = left.is_terrain()
        && right.is_terrain()
        && up == TileKind::Wall
        && down == TileKind::Wall;
    let vertical_passage = up.is_terrain()
        && down.is_terrain()
        && left == TileKind::Wall
        && right == TileKind::Wall;
    horizontal_passage || vertical_passage
}

/// True iff the number of spawn markers matches the size class.
pub fn is_spawn_count_valid(grid: &Grid, size: MapSize) -> bool {
    let spawns = grid.iter().filter(|(_, t)| t.has_item(ItemKind::Spawn)).count();
    spawns == size.spawn_count()
}

/// Capture-the-flag maps need at least one flag; other modes always pass.
pub fn is_capture_the_flag_valid(grid: &Grid, mode: GameMode) -> bool {
    match mode {
        GameMode::Classic => true,
        GameMode::CaptureTheFlag => {
            grid.iter().any(|(_, t)| t.has_item(ItemKind::Flag))
        }
    }
}

/// True iff the grid is square with the size class's side length.
pub fn is_dimension_valid(grid: &Grid, size: MapSize) -> bool {
    grid.height() == size.dimension() && grid.width() == size.dimension()
}

/// Runs every rule and reports all violations.
pub fn validate(
    grid: &Grid,
    size: MapSize,
    mode: GameMode,
    description: &str,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    report.check(
        is_dimension_valid(grid, size),
        "the grid does not match the map size",
    );
    report.check(
        is_fully_connected(grid),
        "some tiles are unreachable because of wall placement",
    );
    report.check(
        is_terrain_ratio_valid(grid),
        "terrain tiles must cover more than half of the map",
    );
    report.check(
        is_door_placement_valid(grid),
        "every door must sit between two walls with terrain on both sides",
    );
    report.check(
        is_spawn_count_valid(grid, size),
        "the number of spawn points does not match the map size",
    );
    report.check(
        is_capture_the_flag_valid(grid, mode),
        "capture-the-flag maps need a flag",
    );
    report.check(
        !description.trim().is_empty(),
        "the map must have a description",
    );

    if !report.valid {
        tracing::debug!(errors = report.errors.len(), "map failed validation");
    }
    report
}
