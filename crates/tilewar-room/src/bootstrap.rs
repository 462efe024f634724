//! Board setup run once when a game starts.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use tilewar_map::{Coord, Grid, ItemKind, MapDocument};
use tilewar_protocol::{Player, PlayerId};

use crate::BootstrapError;

/// The board a game starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSetup {
    /// Tiles with every random placeholder resolved.
    pub tiles: Grid,
    /// Spawn point of each player, in arrival order.
    pub spawns: Vec<(PlayerId, Coord)>,
    pub turn_order: Vec<PlayerId>,
}

/// Validates the map, then resolves items, spawns and turn order.
pub fn bootstrap<R: Rng>(
    map: &MapDocument,
    players: &[Player],
    rng: &mut R,
) -> Result<BoardSetup, BootstrapError> {
    let report = map.validate();
    if !report.valid {
        return Err(BootstrapError::InvalidMap(report.errors));
    }

    let mut tiles = map.tiles.clone();
    resolve_random_items(&mut tiles, rng)?;
    let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
    let spawns = assign_spawn_points(&mut tiles, &ids, rng)?;
    let turn_order = compute_turn_order(players, rng);

    Ok(BoardSetup {
        tiles,
        spawns,
        turn_order,
    })
}

/// Replaces each random placeholder with a concrete item type that is not
/// yet on the board.
///
/// Fails instead of looping when every concrete type is already placed.
pub fn resolve_random_items<R: Rng>(grid: &mut Grid, rng: &mut R) -> Result<(), BootstrapError> {
    let mut placed: HashSet<ItemKind> = grid
        .iter()
        .filter_map(|(_, t)| t.item)
        .filter(|item| item.is_drawable())
        .collect();

    for (at, tile) in grid.iter_mut() {
        if tile.item != Some(ItemKind::Random) {
            continue;
        }
        let pool: Vec<ItemKind> = ItemKind::ALL
            .into_iter()
            .filter(|item| item.is_drawable() && !placed.contains(item))
            .collect();
        if pool.is_empty() {
            return Err(BootstrapError::ItemPoolExhausted(at));
        }
        let item = pool[rng.random_range(0..pool.len())];
        tile.item = Some(item);
        placed.insert(item);
    }
    Ok(())
}

/// Binds each player, in order, to a spawn point drawn uniformly from
/// those still free. Unused spawn markers are cleared from the board.
pub fn assign_spawn_points<R: Rng>(
    grid: &mut Grid,
    players: &[PlayerId],
    rng: &mut R,
) -> Result<Vec<(PlayerId, Coord)>, BootstrapError> {
    let mut free: Vec<Coord> = grid
        .iter()
        .filter(|(_, t)| t.has_item(ItemKind::Spawn))
        .map(|(at, _)| at)
        .collect();
    if players.len() > free.len() {
        return Err(BootstrapError::TooManyPlayers {
            players: players.len(),
            spawns: free.len(),
        });
    }

    let assignment = players
        .iter()
        .map(|&id| (id, free.swap_remove(rng.random_range(0..free.len()))))
        .collect();

    for at in free {
        if let Some(tile) = grid.get_mut(at) {
            tile.item = None;
        }
    }
    Ok(assignment)
}

/// Fastest first. Players tied on speed are shuffled among themselves
/// only.
pub fn compute_turn_order<R: Rng>(players: &[Player], rng: &mut R) -> Vec<PlayerId> {
    let mut order: Vec<(u32, PlayerId)> = players
        .iter()
        .map(|p| (p.attributes.speed, p.id))
        .collect();
    order.sort_by(|a, b| b.0.cmp(&a.0));
    for tied in order.chunk_by_mut(|a, b| a.0 == b.0) {
        tied.shuffle(rng);
    }
    order.into_iter().map(|(_, id)| id).collect()
}
