//! A battle plus its per-turn countdown.

use tilewar_combat::{BattleSession, Fighter};
use tilewar_protocol::PlayerId;
use tilewar_tick::{Countdown, CountdownTick};

use crate::GameConfig;

/// The battle currently running in a room, if any.
#[derive(Debug, Clone)]
pub struct BattlePhase {
    session: BattleSession,
    countdown: Countdown,
    turn_ticks: u32,
    no_evasion_ticks: u32,
}

impl BattlePhase {
    pub fn new(challenger: Fighter, defender: Fighter, config: &GameConfig) -> Self {
        let mut phase = Self {
            session: BattleSession::new(challenger, defender),
            countdown: Countdown::new(config.battle_turn_secs),
            turn_ticks: config.battle_turn_secs,
            no_evasion_ticks: config.battle_turn_secs_no_evasion,
        };
        phase.restart_countdown();
        phase
    }

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BattleSession {
        &mut self.session
    }

    pub fn current_turn(&self) -> PlayerId {
        self.session.current_turn()
    }

    /// Starts the acting fighter's countdown, shorter once they have no
    /// evasion attempts left.
    pub fn restart_countdown(&mut self) {
        let ticks = if self.session.current_fighter().evasions_left == 0 {
            self.no_evasion_ticks
        } else {
            self.turn_ticks
        };
        self.countdown.reset(ticks);
    }

    pub fn tick(&mut self) -> CountdownTick {
        self.countdown.tick()
    }

    pub fn remaining(&self) -> u32 {
        self.countdown.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tilewar_protocol::{Attributes, DiceSize};

    fn fighter(id: u64) -> Fighter {
        Fighter::new(PlayerId(id), Attributes::default(), DiceSize::D6, DiceSize::D4)
    }

    #[test]
    fn test_countdown_starts_at_battle_turn_length() {
        let phase = BattlePhase::new(fighter(1), fighter(2), &GameConfig::default());
        assert_eq!(phase.remaining(), 5);
    }

    #[test]
    fn test_countdown_shortens_without_evasions() {
        let mut tired = fighter(1);
        tired.evasions_left = 0;
        let mut phase = BattlePhase::new(tired, fighter(2), &GameConfig::default());
        assert_eq!(phase.current_turn(), PlayerId(1));
        assert_eq!(phase.remaining(), 3);

        let mut rng = StdRng::seed_from_u64(0);
        phase.session_mut().attack(PlayerId(1), &mut rng).unwrap();
        phase.restart_countdown();
        assert_eq!(phase.current_turn(), PlayerId(2));
        assert_eq!(phase.remaining(), 5);
    }
}
