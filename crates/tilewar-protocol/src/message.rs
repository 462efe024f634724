//! Inbound and outbound messages.
//!
//! Both enums are internally tagged by a camelCase `type` field with
//! camelCase fields, e.g. `{"type":"joinRoom","accessCode":1234}`.

use serde::{Deserialize, Serialize};
use tilewar_map::{Coord, Grid, ItemKind};

use crate::{AccessCode, AiBehavior, Player, PlayerId, PlayerProfile};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a connected client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    // -- Room management --
    CreateRoom {
        map_id: String,
        organizer: PlayerProfile,
    },
    /// Probe a code before character creation.
    JoinRoom {
        access_code: AccessCode,
    },
    /// Enter the room with a finished character.
    AddPlayerToRoom {
        access_code: AccessCode,
        player: PlayerProfile,
    },
    AddVirtualPlayer {
        access_code: AccessCode,
        behavior: AiBehavior,
    },
    LockRoom {
        access_code: AccessCode,
    },
    UnlockRoom {
        access_code: AccessCode,
    },
    KickPlayer {
        player_id: PlayerId,
    },
    LeaveGame {
        access_code: AccessCode,
    },
    StartGame {
        access_code: AccessCode,
    },

    // -- In game --
    UserEndTurn,
    UserMoved {
        from: Coord,
        to: Coord,
    },
    UserDidDoorAction {
        tile: Coord,
    },
    UserDidBattleAction {
        enemy_id: PlayerId,
    },
    UserAttacked,
    UserTriedEscape,
}

impl ClientMessage {
    /// Whether the message is handled by a running game rather than the
    /// room lobby.
    pub fn is_in_game(&self) -> bool {
        matches!(
            self,
            Self::UserEndTurn
                | Self::UserMoved { .. }
                | Self::UserDidDoorAction { .. }
                | Self::UserDidBattleAction { .. }
                | Self::UserAttacked
                | Self::UserTriedEscape
        )
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Why a join attempt was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinFailure {
    /// No live room has this code.
    CodeInvalid,
    /// The room is locked.
    LockedRoom,
    /// The room closed while the character was being created.
    NoMoreExisting,
    /// The room locked while the character was being created.
    LockedAfterJoin,
}

/// Where a player stands on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPosition {
    pub player_id: PlayerId,
    pub tile: Coord,
}

/// Full arithmetic of one attack, for replay on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackReport {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    /// Attack die result.
    pub attack_roll: u32,
    /// Defense die result, or the shield block value.
    pub defense_roll: u32,
    pub attack_value: u32,
    pub defense_value: u32,
    /// `attack_value - defense_value`.
    pub net: i64,
    pub hit: bool,
    pub shield_blocked: bool,
    pub healed: bool,
    pub attacker_health: u32,
    pub defender_health: u32,
}

/// End-of-game counters for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatistics {
    pub player_id: PlayerId,
    pub name: String,
    pub combats: u32,
    pub evasions: u32,
    pub victories: u32,
    pub defeats: u32,
    pub health_lost: u32,
    pub damage_dealt: u32,
    pub items_collected: u32,
    pub tiles_visited_percent: f64,
}

/// End-of-game counters for the whole room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatistics {
    pub duration_secs: u64,
    pub total_turns: u32,
    pub terrain_visited_percent: f64,
    pub doors_used_percent: f64,
    pub flag_holders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatistics {
    pub players: Vec<PlayerStatistics>,
    pub global: GlobalStatistics,
}

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    // -- Room lifecycle --
    RoomCreated {
        access_code: AccessCode,
    },
    RoomState {
        room_id: String,
        access_code: AccessCode,
        players: Vec<Player>,
        organizer: PlayerId,
        is_locked: bool,
        max_players: usize,
    },
    RoomLocked {
        message: String,
        is_locked: bool,
    },
    RoomUnlocked {
        message: String,
        is_locked: bool,
    },
    JoinGameResponse {
        access_code: AccessCode,
        valid: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<JoinFailure>,
    },
    PlayerKicked {
        kicked_player_id: PlayerId,
    },
    OrganizerLeft {
        new_organizer: PlayerId,
    },
    RoomClosed,

    // -- Turns --
    GameStarted {
        tiles: Grid,
        positions: Vec<PlayerPosition>,
        turn_order: Vec<PlayerId>,
    },
    StartTurn {
        player_id: PlayerId,
    },
    EndTurn {
        player_id: PlayerId,
    },
    TurnTimer {
        remaining: u32,
    },
    PlayerMoved {
        player_id: PlayerId,
        from: Coord,
        to: Coord,
        movement_left: u32,
    },
    ItemPickedUp {
        player_id: PlayerId,
        item: ItemKind,
        tile: Coord,
    },
    /// A battle loser dropped a carried item (the flag) onto the board.
    ItemDropped {
        player_id: PlayerId,
        item: ItemKind,
        tile: Coord,
    },
    /// A battle loser was sent back to their spawn area.
    PlayerRespawned {
        player_id: PlayerId,
        tile: Coord,
    },
    DoorToggled {
        tile: Coord,
        open: bool,
    },

    // -- Battle --
    BattleStarted {
        first: PlayerId,
        second: PlayerId,
        current_turn: PlayerId,
    },
    BattleTurn {
        player_id: PlayerId,
    },
    BattleTimer {
        remaining: u32,
    },
    OpponentAttacked {
        result: AttackReport,
    },
    OpponentTriedEscape {
        player_id: PlayerId,
        succeeded: bool,
        evasions_left: u8,
    },
    FirstPlayerWonBattle {
        winner: PlayerId,
        loser: PlayerId,
    },
    SecondPlayerWonBattle {
        winner: PlayerId,
        loser: PlayerId,
    },
    BattleEnded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<PlayerId>,
    },

    // -- End of game --
    GameBoardPlayerWon {
        player_id: PlayerId,
    },
    GameStatistics(GameStatistics),

    /// A request was rejected. Nothing changed.
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
