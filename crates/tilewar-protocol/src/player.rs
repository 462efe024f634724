//! Players as they travel on the wire.

use serde::{Deserialize, Serialize};
use tilewar_map::ItemKind;

use crate::{PlayerId, ProtocolError};

/// Number of inventory slots every player has.
pub const INVENTORY_SLOTS: usize = 2;

/// Longest display name accepted from a client.
pub const MAX_NAME_LEN: usize = 20;

/// Highest value character creation allows for any attribute.
pub const MAX_ATTRIBUTE: u32 = 10;

/// Die used for attack or defense rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiceSize {
    D4,
    D6,
}

impl DiceSize {
    pub fn faces(self) -> u32 {
        match self {
            Self::D4 => 4,
            Self::D6 => 6,
        }
    }
}

/// Base character attributes chosen at character creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub life: u32,
    pub speed: u32,
    pub attack: u32,
    pub defense: u32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            life: 4,
            speed: 4,
            attack: 4,
            defense: 4,
        }
    }
}

/// How a computer-controlled player behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AiBehavior {
    /// Always attacks in battle.
    Aggressive,
    /// Tries to escape while evasion attempts remain.
    Defensive,
}

/// Fixed-size inventory. Empty slots are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory([Option<ItemKind>; INVENTORY_SLOTS]);

impl Inventory {
    /// Puts `item` in the first free slot. Returns `false` when full.
    pub fn add(&mut self, item: ItemKind) -> bool {
        match self.0.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(item);
                true
            }
            None => false,
        }
    }

    /// Removes one copy of `item`. Returns `false` if it was not held.
    pub fn remove(&mut self, item: ItemKind) -> bool {
        match self.0.iter_mut().find(|slot| **slot == Some(item)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, item: ItemKind) -> bool {
        self.0.contains(&Some(item))
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// The held items, skipping empty slots.
    pub fn items(&self) -> impl Iterator<Item = ItemKind> + '_ {
        self.0.iter().flatten().copied()
    }
}

/// What a client submits after character creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    pub attributes: Attributes,
    pub attack_dice: DiceSize,
    pub defense_dice: DiceSize,
}

impl PlayerProfile {
    /// Rejects blank or overlong names, zero life/speed and attributes
    /// above [`MAX_ATTRIBUTE`].
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "player name must not be empty".into(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ProtocolError::InvalidMessage(format!(
                "player name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        if self.attributes.life == 0 || self.attributes.speed == 0 {
            return Err(ProtocolError::InvalidMessage(
                "life and speed must be positive".into(),
            ));
        }
        let Attributes {
            life,
            speed,
            attack,
            defense,
        } = self.attributes;
        if [life, speed, attack, defense]
            .into_iter()
            .any(|value| value > MAX_ATTRIBUTE)
        {
            return Err(ProtocolError::InvalidMessage(format!(
                "attributes must be at most {MAX_ATTRIBUTE}"
            )));
        }
        Ok(())
    }
}

/// A player in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub avatar: String,
    pub attributes: Attributes,
    pub attack_dice: DiceSize,
    pub defense_dice: DiceSize,
    pub inventory: Inventory,
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<AiBehavior>,
}

impl Player {
    /// A human player built from a submitted profile.
    pub fn from_profile(id: PlayerId, profile: PlayerProfile) -> Self {
        Self {
            id,
            name: profile.name.trim().to_string(),
            avatar: profile.avatar,
            attributes: profile.attributes,
            attack_dice: profile.attack_dice,
            defense_dice: profile.defense_dice,
            inventory: Inventory::default(),
            is_virtual: false,
            behavior: None,
        }
    }

    /// A computer-controlled player. Aggressive players trade life for
    /// speed and a bigger attack die; defensive players do the opposite.
    pub fn virtual_player(id: PlayerId, name: String, behavior: AiBehavior) -> Self {
        let (attributes, attack_dice, defense_dice) = match behavior {
            AiBehavior::Aggressive => (
                Attributes {
                    speed: 6,
                    ..Attributes::default()
                },
                DiceSize::D6,
                DiceSize::D4,
            ),
            AiBehavior::Defensive => (
                Attributes {
                    life: 6,
                    ..Attributes::default()
                },
                DiceSize::D4,
                DiceSize::D6,
            ),
        };
        Self {
            id,
            name,
            avatar: String::new(),
            attributes,
            attack_dice,
            defense_dice,
            inventory: Inventory::default(),
            is_virtual: true,
            behavior: Some(behavior),
        }
    }

    /// Movement points for one turn: speed plus item bonuses.
    pub fn movement_points(&self) -> u32 {
        self.inventory
            .items()
            .map(ItemKind::movement_bonus)
            .fold(self.attributes.speed, u32::saturating_add)
    }
}
