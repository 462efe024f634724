//! Battle resolution for Tilewar.
//!
//! Pure state machines driven by an injected random source, so callers
//! (and tests) decide whether dice are seeded.
//!
//! - [`Fighter`] — per-battle snapshot of one player
//! - [`resolve_attack`] — one attack roll and its effects
//! - [`BattleSession`] — turn order, escape attempts and the end condition

mod error;
mod fighter;
mod session;

pub use error::BattleError;
pub use fighter::{
    Fighter, ICE_PENALTY, SHIELD_BLOCK_CHANCE, SHIELD_BLOCK_VALUE, STARTING_EVASIONS,
    resolve_attack,
};
pub use session::{
    AttackResolution, BattleOutcome, BattleSession, ESCAPE_CHANCE, EscapeResolution,
};
