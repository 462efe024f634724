//! Game timing settings and the room state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room of a server.
///
/// Missing fields fall back to their defaults when deserialized, so a
/// config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Seconds a player has for one movement turn.
    pub turn_secs: u32,

    /// Seconds per battle turn.
    pub battle_turn_secs: u32,

    /// Seconds per battle turn once the acting fighter has no evasion
    /// attempts left.
    pub battle_turn_secs_no_evasion: u32,

    /// Clock period in milliseconds. Timers count in ticks.
    pub tick_period_ms: u64,

    /// Random draws tried before access-code generation gives up.
    pub code_attempts: u32,

    /// Battle wins needed to win a classic game.
    pub battle_wins_to_victory: u32,

    /// Capacity of each room's command channel.
    pub channel_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_secs: 30,
            battle_turn_secs: 5,
            battle_turn_secs_no_evasion: 3,
            tick_period_ms: 1_000,
            code_attempts: 1_000,
            battle_wins_to_victory: 3,
            channel_size: 64,
        }
    }
}

impl GameConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Lobby → InGame → Finished
/// ```
///
/// - **Lobby**: players join, leave and get kicked; the organizer locks,
///   unlocks and adds virtual players.
/// - **InGame**: the board exists and the clock runs. No one can join.
/// - **Finished**: someone won. Players can only leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Lobby,
    InGame,
    Finished,
}

impl RoomState {
    pub fn is_lobby(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::InGame)
    }

    /// The only state reachable from this one.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::InGame),
            Self::InGame => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InGame => write!(f, "InGame"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
