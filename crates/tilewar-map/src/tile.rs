//! Tile and item variants.
//!
//! A tile is a closed [`TileKind`] plus an optional [`ItemKind`] sitting on
//! it. Every predicate the board needs ("is this terrain?", "can I walk
//! here?") is a `match` over these enums, so adding a variant forces every
//! rule to be revisited at compile time.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TileKind
// ---------------------------------------------------------------------------

/// The ground type of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileKind {
    Grass,
    Water,
    Ice,
    Wall,
    OpenDoor,
    ClosedDoor,
}

impl TileKind {
    /// Grass, water and ice. These count toward the terrain ratio and are
    /// the only valid door neighbors along the passage axis.
    pub fn is_terrain(self) -> bool {
        matches!(self, Self::Grass | Self::Water | Self::Ice)
    }

    pub fn is_door(self) -> bool {
        matches!(self, Self::OpenDoor | Self::ClosedDoor)
    }

    pub fn is_wall(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Whether an avatar may stand on this tile.
    pub fn is_walkable(self) -> bool {
        self.is_terrain() || matches!(self, Self::OpenDoor)
    }

    /// Movement points spent to step onto this tile, or `None` if the
    /// tile cannot be entered at all.
    pub fn movement_cost(self) -> Option<u32> {
        match self {
            Self::Ice => Some(0),
            Self::Grass | Self::OpenDoor => Some(1),
            Self::Water => Some(2),
            Self::Wall | Self::ClosedDoor => None,
        }
    }

    /// The door on the other side of a toggle. Non-doors are unchanged.
    pub fn toggled(self) -> Self {
        match self {
            Self::OpenDoor => Self::ClosedDoor,
            Self::ClosedDoor => Self::OpenDoor,
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// ItemKind
// ---------------------------------------------------------------------------

/// Everything that can sit on a tile or in an inventory slot.
///
/// `Random`, `Spawn` and `Flag` are placement markers authored in the map
/// editor; the rest are concrete items. An empty tile or slot is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// Replaced by a concrete item when a session starts.
    Random,
    /// A player start position.
    Spawn,
    /// The capture-the-flag objective.
    Flag,
    /// Cancels the ice penalty.
    IceSkates,
    /// Chance to fully block a hit at 1 remaining health.
    MagicShield,
    /// Heals 1 on every successful attack while hurt.
    ReviveTotem,
    Sword,
    Armor,
    Boots,
}

impl ItemKind {
    /// Every variant, in declaration order.
    pub const ALL: [ItemKind; 9] = [
        Self::Random,
        Self::Spawn,
        Self::Flag,
        Self::IceSkates,
        Self::MagicShield,
        Self::ReviveTotem,
        Self::Sword,
        Self::Armor,
        Self::Boots,
    ];

    /// Items a `Random` marker may resolve into.
    pub fn is_drawable(self) -> bool {
        !matches!(self, Self::Random | Self::Spawn | Self::Flag)
    }

    /// Items a player can pick up and carry.
    pub fn is_collectible(self) -> bool {
        !matches!(self, Self::Random | Self::Spawn)
    }

    pub fn attack_bonus(self) -> u32 {
        match self {
            Self::Sword => 2,
            _ => 0,
        }
    }

    pub fn defense_bonus(self) -> u32 {
        match self {
            Self::Armor => 2,
            _ => 0,
        }
    }

    pub fn movement_bonus(self) -> u32 {
        match self {
            Self::Boots => 2,
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemKind>,
}

impl Tile {
    pub fn new(kind: TileKind) -> Self {
        Self { kind, item: None }
    }

    pub fn with_item(kind: TileKind, item: ItemKind) -> Self {
        Self {
            kind,
            item: Some(item),
        }
    }

    pub fn has_item(&self, item: ItemKind) -> bool {
        self.item == Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkable_covers_terrain_and_open_doors() {
        assert!(TileKind::Grass.is_walkable());
        assert!(TileKind::Ice.is_walkable());
        assert!(TileKind::OpenDoor.is_walkable());
        assert!(!TileKind::ClosedDoor.is_walkable());
        assert!(!TileKind::Wall.is_walkable());
    }

    #[test]
    fn test_door_is_not_terrain() {
        assert!(!TileKind::OpenDoor.is_terrain());
        assert!(TileKind::OpenDoor.is_door());
        assert!(TileKind::ClosedDoor.is_door());
    }

    #[test]
    fn test_toggled_flips_doors_only() {
        assert_eq!(TileKind::OpenDoor.toggled(), TileKind::ClosedDoor);
        assert_eq!(TileKind::ClosedDoor.toggled(), TileKind::OpenDoor);
        assert_eq!(TileKind::Grass.toggled(), TileKind::Grass);
    }

    #[test]
    fn test_drawable_excludes_markers() {
        let drawable: Vec<_> =
            ItemKind::ALL.into_iter().filter(|i| i.is_drawable()).collect();
        assert_eq!(drawable.len(), 6);
        assert!(!drawable.contains(&ItemKind::Flag));
        assert!(!drawable.contains(&ItemKind::Random));
        assert!(!drawable.contains(&ItemKind::Spawn));
    }

    #[test]
    fn test_tile_serializes_without_empty_item() {
        let json = serde_json::to_value(Tile::new(TileKind::OpenDoor)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "openDoor" }));

        let json =
            serde_json::to_value(Tile::with_item(TileKind::Ice, ItemKind::IceSkates))
                .unwrap();
        assert_eq!(json["item"], "iceSkates");
    }
}
