//! Tile grid, map documents and map validation for Tilewar.
//!
//! The validator is shared by two callers: the map-persistence
//! collaborator runs it before accepting a save, and the room layer runs
//! it again before a session starts.
//!
//! # Key types
//!
//! - [`Tile`], [`TileKind`], [`ItemKind`] — closed variants, no dispatch
//! - [`Grid`], [`Coord`] — the rectangular board
//! - [`MapDocument`] — `{name, description, size, mode, tiles, isVisible}`
//! - [`validate`] / [`ValidationReport`] — the full rule set

mod document;
mod error;
mod grid;
mod tile;
mod validate;

pub use document::{GameMode, MapDocument, MapSize};
pub use error::MapError;
pub use grid::{Coord, Grid};
pub use tile::{ItemKind, Tile, TileKind};
pub use validate::{
    ValidationReport, is_capture_the_flag_valid, is_dimension_valid,
    is_door_placement_valid, is_fully_connected, is_fully_connected_from,
    is_spawn_count_valid, is_terrain_ratio_valid, validate,
};
