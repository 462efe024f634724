//! Wire protocol for Tilewar.
//!
//! - **Identities** ([`PlayerId`], [`AccessCode`]) and routing ([`Recipient`])
//! - **Players** ([`Player`], [`PlayerProfile`], [`Inventory`])
//! - **Messages** ([`ClientMessage`] inbound, [`ServerMessage`] outbound)
//! - **Codec** ([`Codec`] trait, [`JsonCodec`])
//!
//! The protocol layer knows nothing about rooms or connections; it only
//! describes what crosses the wire.

mod codec;
mod error;
mod message;
mod player;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{
    AttackReport, ClientMessage, GameStatistics, GlobalStatistics, JoinFailure,
    PlayerPosition, PlayerStatistics, ServerMessage,
};
pub use player::{
    AiBehavior, Attributes, DiceSize, INVENTORY_SLOTS, Inventory, MAX_ATTRIBUTE, MAX_NAME_LEN,
    Player, PlayerProfile,
};
pub use types::{AccessCode, PlayerId, Recipient};
