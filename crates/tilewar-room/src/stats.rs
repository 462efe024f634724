//! End-of-game counters.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tilewar_map::{Coord, Grid, ItemKind};
use tilewar_protocol::{
    AttackReport, GameStatistics, GlobalStatistics, Player, PlayerId, PlayerStatistics,
};

#[derive(Debug, Clone, Default)]
struct PlayerCounters {
    name: String,
    combats: u32,
    evasions: u32,
    victories: u32,
    defeats: u32,
    health_lost: u32,
    damage_dealt: u32,
    items_collected: u32,
    visited: HashSet<Coord>,
}

/// Per-player and room-wide counters for one game.
#[derive(Debug, Clone)]
pub struct StatisticsTracker {
    started: Instant,
    order: Vec<PlayerId>,
    players: HashMap<PlayerId, PlayerCounters>,
    open_tiles: usize,
    terrain_tiles: HashSet<Coord>,
    door_tiles: HashSet<Coord>,
    terrain_visited: HashSet<Coord>,
    doors_used: HashSet<Coord>,
    flag_holders: HashSet<PlayerId>,
    total_turns: u32,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

impl StatisticsTracker {
    pub fn new(board: &Grid, players: &[Player]) -> Self {
        let terrain_tiles = board
            .iter()
            .filter(|(_, t)| t.kind.is_terrain())
            .map(|(at, _)| at)
            .collect();
        let door_tiles = board
            .iter()
            .filter(|(_, t)| t.kind.is_door())
            .map(|(at, _)| at)
            .collect();
        let open_tiles = board.iter().filter(|(_, t)| !t.kind.is_wall()).count();
        Self {
            started: Instant::now(),
            order: players.iter().map(|p| p.id).collect(),
            players: players
                .iter()
                .map(|p| {
                    let counters = PlayerCounters {
                        name: p.name.clone(),
                        ..Default::default()
                    };
                    (p.id, counters)
                })
                .collect(),
            open_tiles,
            terrain_tiles,
            door_tiles,
            terrain_visited: HashSet::new(),
            doors_used: HashSet::new(),
            flag_holders: HashSet::new(),
            total_turns: 0,
        }
    }

    fn counters(&mut self, id: PlayerId) -> Option<&mut PlayerCounters> {
        self.players.get_mut(&id)
    }

    /// A player stood on `at` (spawn or move).
    pub fn record_visit(&mut self, id: PlayerId, at: Coord) {
        if let Some(c) = self.counters(id) {
            c.visited.insert(at);
        }
        if self.terrain_tiles.contains(&at) {
            self.terrain_visited.insert(at);
        }
    }

    pub fn record_door(&mut self, at: Coord) {
        if self.door_tiles.contains(&at) {
            self.doors_used.insert(at);
        }
    }

    pub fn record_item(&mut self, id: PlayerId, item: ItemKind) {
        if let Some(c) = self.counters(id) {
            c.items_collected += 1;
        }
        if item == ItemKind::Flag {
            self.flag_holders.insert(id);
        }
    }

    pub fn record_combat(&mut self, first: PlayerId, second: PlayerId) {
        for id in [first, second] {
            if let Some(c) = self.counters(id) {
                c.combats += 1;
            }
        }
    }

    pub fn record_attack(&mut self, report: &AttackReport) {
        if !report.hit {
            return;
        }
        if let Some(c) = self.counters(report.attacker) {
            c.damage_dealt += 1;
        }
        if let Some(c) = self.counters(report.defender) {
            c.health_lost += 1;
        }
    }

    /// Counts an evasion attempt, successful or not.
    pub fn record_evasion(&mut self, id: PlayerId) {
        if let Some(c) = self.counters(id) {
            c.evasions += 1;
        }
    }

    pub fn record_battle_result(&mut self, winner: PlayerId, loser: PlayerId) {
        if let Some(c) = self.counters(winner) {
            c.victories += 1;
        }
        if let Some(c) = self.counters(loser) {
            c.defeats += 1;
        }
    }

    pub fn record_turn(&mut self) {
        self.total_turns += 1;
    }

    pub fn victories(&self, id: PlayerId) -> u32 {
        self.players.get(&id).map_or(0, |c| c.victories)
    }

    pub fn report(&self) -> GameStatistics {
        let players = self
            .order
            .iter()
            .filter_map(|id| self.players.get(id).map(|c| (*id, c)))
            .map(|(player_id, c)| PlayerStatistics {
                player_id,
                name: c.name.clone(),
                combats: c.combats,
                evasions: c.evasions,
                victories: c.victories,
                defeats: c.defeats,
                health_lost: c.health_lost,
                damage_dealt: c.damage_dealt,
                items_collected: c.items_collected,
                tiles_visited_percent: percent(c.visited.len(), self.open_tiles),
            })
            .collect();

        GameStatistics {
            players,
            global: GlobalStatistics {
                duration_secs: self.started.elapsed().as_secs(),
                total_turns: self.total_turns,
                terrain_visited_percent: percent(
                    self.terrain_visited.len(),
                    self.terrain_tiles.len(),
                ),
                doors_used_percent: percent(self.doors_used.len(), self.door_tiles.len()),
                flag_holders: self.flag_holders.len(),
            },
        }
    }
}
