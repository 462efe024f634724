//! Rooms and live game sessions for Tilewar.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! lobby, its game session and its clock. The [`RoomRegistry`] holds
//! handles to every live room and routes players to them.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates/destroys rooms, routes players by access code
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`Room`] — lobby membership, organizer role and lock
//! - [`bootstrap`] — item resolution, spawn assignment and turn order
//! - [`GameSession`] — the in-game dispatcher
//! - [`TurnScheduler`] / [`BattlePhase`] — movement and battle turns
//! - [`StatisticsTracker`] — end-of-game counters

mod actor;
mod battle;
mod bootstrap;
mod config;
mod error;
mod game;
mod lobby;
mod registry;
mod stats;
mod turn;

pub use actor::{PlayerSender, RoomHandle, RoomInfo};
pub use battle::BattlePhase;
pub use bootstrap::{
    BoardSetup, assign_spawn_points, bootstrap, compute_turn_order, resolve_random_items,
};
pub use config::{GameConfig, RoomState};
pub use error::{BootstrapError, GameError, RoomError};
pub use game::{GameSession, Outbound};
pub use lobby::{Departure, Room};
pub use registry::RoomRegistry;
pub use stats::StatisticsTracker;
pub use turn::{TurnPhase, TurnScheduler};
