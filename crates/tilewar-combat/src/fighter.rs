//! A combatant's battle-time snapshot and the attack arithmetic.

use rand::Rng;
use tilewar_map::ItemKind;
use tilewar_protocol::{AttackReport, Attributes, DiceSize, PlayerId};

/// Attack and defense reduction while standing on ice.
pub const ICE_PENALTY: u32 = 2;

/// Chance that a magic shield at 1 health blocks a hit outright.
pub const SHIELD_BLOCK_CHANCE: f64 = 0.5;

/// Defense roll substituted by a magic shield block. Larger than any
/// reachable attack value.
pub const SHIELD_BLOCK_VALUE: u32 = 1_000;

/// Evasion attempts each fighter starts a battle with.
pub const STARTING_EVASIONS: u8 = 2;

/// One side of a battle.
///
/// Health here is a snapshot taken when the battle starts; the player's
/// permanent life attribute is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fighter {
    pub id: PlayerId,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub attack_dice: DiceSize,
    pub defense_dice: DiceSize,
    pub max_health: u32,
    pub health: u32,
    pub evasions_left: u8,
    pub on_ice: bool,
    pub items: Vec<ItemKind>,
}

impl Fighter {
    pub fn new(
        id: PlayerId,
        attributes: Attributes,
        attack_dice: DiceSize,
        defense_dice: DiceSize,
    ) -> Self {
        Self {
            id,
            attack: attributes.attack,
            defense: attributes.defense,
            speed: attributes.speed,
            attack_dice,
            defense_dice,
            max_health: attributes.life,
            health: attributes.life,
            evasions_left: STARTING_EVASIONS,
            on_ice: false,
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = ItemKind>) -> Self {
        self.items = items.into_iter().collect();
        self
    }

    pub fn standing_on_ice(mut self, on_ice: bool) -> Self {
        self.on_ice = on_ice;
        self
    }

    pub fn holds(&self, item: ItemKind) -> bool {
        self.items.contains(&item)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    fn ice_penalty(&self) -> u32 {
        if self.on_ice && !self.holds(ItemKind::IceSkates) {
            ICE_PENALTY
        } else {
            0
        }
    }

    /// Attack attribute with item bonuses, minus the ice penalty.
    pub fn effective_attack(&self) -> u32 {
        let bonus = self.items.iter().map(|i| i.attack_bonus()).fold(0, u32::saturating_add);
        self.attack
            .saturating_add(bonus)
            .saturating_sub(self.ice_penalty())
    }

    /// Defense attribute with item bonuses, minus the ice penalty.
    pub fn effective_defense(&self) -> u32 {
        let bonus = self.items.iter().map(|i| i.defense_bonus()).fold(0, u32::saturating_add);
        self.defense
            .saturating_add(bonus)
            .saturating_sub(self.ice_penalty())
    }
}

/// Rolls one attack and applies its effects to both fighters.
///
/// A strictly positive `attack - defense` costs the defender 1 health.
/// A revive totem then heals the attacker by 1 if they are hurt.
pub fn resolve_attack<R: Rng>(
    attacker: &mut Fighter,
    defender: &mut Fighter,
    rng: &mut R,
) -> AttackReport {
    let attack_roll = rng.random_range(1..=attacker.attack_dice.faces());
    let attack_value = attacker.effective_attack().saturating_add(attack_roll);

    let shield_blocked = defender.holds(ItemKind::MagicShield)
        && defender.health == 1
        && rng.random_bool(SHIELD_BLOCK_CHANCE);
    let defense_roll = if shield_blocked {
        SHIELD_BLOCK_VALUE
    } else {
        rng.random_range(1..=defender.defense_dice.faces())
    };
    let defense_value = defender.effective_defense().saturating_add(defense_roll);

    let net = i64::from(attack_value) - i64::from(defense_value);
    let hit = net > 0;
    let mut healed = false;
    if hit {
        defender.health = defender.health.saturating_sub(1);
        if attacker.holds(ItemKind::ReviveTotem) && attacker.health < attacker.max_health {
            attacker.health += 1;
            healed = true;
        }
    }

    AttackReport {
        attacker: attacker.id,
        defender: defender.id,
        attack_roll,
        defense_roll,
        attack_value,
        defense_value,
        net,
        hit,
        shield_blocked,
        healed,
        attacker_health: attacker.health,
        defender_health: defender.health,
    }
}
