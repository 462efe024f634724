//! Error types for the room layer.

use tilewar_combat::BattleError;
use tilewar_map::Coord;
use tilewar_protocol::{AccessCode, JoinFailure, PlayerId};

/// Errors from registry and lobby operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(AccessCode),

    #[error("room {0} is locked")]
    Locked(AccessCode),

    #[error("room {0} is full")]
    Full(AccessCode),

    /// The connection already belongs to a room.
    #[error("player {0} is already in a room")]
    AlreadyInRoom(PlayerId),

    #[error("player {0} is not in this room")]
    NotInRoom(PlayerId),

    /// Only the organizer may do this.
    #[error("player {0} is not the organizer")]
    NotOrganizer(PlayerId),

    #[error("the organizer cannot kick themself")]
    CannotKickSelf,

    /// The operation does not fit the room's lifecycle state.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    #[error("at least {needed} players are needed, found {found}")]
    NotEnoughPlayers { found: usize, needed: usize },

    /// Every random draw hit a live code.
    #[error("no free access code after {0} attempts")]
    CodeSpaceExhausted(u32),

    #[error("failed to start the game: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(AccessCode),
}

impl RoomError {
    /// The `joinRoom` failure reason for this error, if it has one.
    pub fn join_check_failure(&self) -> Option<JoinFailure> {
        match self {
            Self::NotFound(_) => Some(JoinFailure::CodeInvalid),
            Self::Locked(_) | Self::Full(_) => Some(JoinFailure::LockedRoom),
            _ => None,
        }
    }

    /// The `addPlayerToRoom` failure reason: the room vanished or locked
    /// while the character was being created.
    pub fn admission_failure(&self) -> Option<JoinFailure> {
        match self {
            Self::NotFound(_) => Some(JoinFailure::NoMoreExisting),
            Self::Locked(_) | Self::Full(_) => Some(JoinFailure::LockedAfterJoin),
            _ => None,
        }
    }
}

/// Fatal configuration problems found while setting up a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    #[error("map is invalid: {}", .0.join("; "))]
    InvalidMap(Vec<String>),

    /// Every concrete item type is already on the board.
    #[error("no unused item type left for the random item at {0}")]
    ItemPoolExhausted(Coord),

    #[error("{players} players but only {spawns} spawn points")]
    TooManyPlayers { players: usize, spawns: usize },
}

/// Rejected in-game actions. State is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("player {0} is not in the game")]
    NotInGame(PlayerId),

    #[error("a battle is in progress")]
    BattleInProgress,

    #[error("there is no battle in progress")]
    NoBattle,

    #[error("the action for this turn was already used")]
    ActionUsed,

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("the door at {0} is blocked")]
    DoorBlocked(Coord),

    #[error("the game is over")]
    GameOver,

    /// A lobby message reached the game dispatcher.
    #[error("not an in-game action")]
    NotAnAction,

    #[error(transparent)]
    Battle(#[from] BattleError),
}
