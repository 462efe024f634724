//! Identity types and message routing.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one player.
///
/// Human players get the id of the connection they arrived on; computer
/// players get ids from [`PlayerId::VIRTUAL_BASE`] upward so the two
/// ranges never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// First id reserved for virtual players.
    pub const VIRTUAL_BASE: u64 = 1 << 48;

    /// Whether this id lies in the virtual-player range.
    pub fn is_virtual(self) -> bool {
        self.0 >= Self::VIRTUAL_BASE
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The 4-digit code players type to find a live room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessCode(pub u16);

impl AccessCode {
    pub const MIN: u16 = 1000;
    pub const MAX: u16 = 9999;

    /// Returns the code if it has exactly four digits.
    pub fn new(code: u16) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&code).then_some(Self(code))
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive an outbound message from a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the room.
    All,
    /// One player.
    Player(PlayerId),
}
