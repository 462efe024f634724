//! One battle between two adjacent players.

use rand::Rng;
use tilewar_protocol::{AttackReport, PlayerId};

use crate::{BattleError, Fighter, resolve_attack};

/// Chance that an evasion attempt succeeds.
pub const ESCAPE_CHANCE: f64 = 0.4;

/// What happens after a battle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// The battle goes on; `next` acts now.
    Continues { next: PlayerId },
    /// One side reached 0 health or forfeited.
    Won { winner: PlayerId, loser: PlayerId },
    /// A fighter got away. Nobody wins.
    Escaped { by: PlayerId },
}

impl BattleOutcome {
    pub fn is_over(&self) -> bool {
        !matches!(self, Self::Continues { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackResolution {
    pub report: AttackReport,
    pub outcome: BattleOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeResolution {
    pub player_id: PlayerId,
    pub succeeded: bool,
    pub evasions_left: u8,
    pub outcome: BattleOutcome,
}

/// Turn state and health snapshots of a running battle.
///
/// Index 0 is the challenger (the "first player"), index 1 the defender.
/// The faster fighter acts first; the challenger wins speed ties.
#[derive(Debug, Clone)]
pub struct BattleSession {
    fighters: [Fighter; 2],
    turn: usize,
    over: bool,
}

impl BattleSession {
    pub fn new(challenger: Fighter, defender: Fighter) -> Self {
        let turn = usize::from(defender.speed > challenger.speed);
        tracing::debug!(
            challenger = %challenger.id,
            defender = %defender.id,
            first_turn = %if turn == 0 { challenger.id } else { defender.id },
            "battle started"
        );
        Self {
            fighters: [challenger, defender],
            turn,
            over: false,
        }
    }

    /// The challenger.
    pub fn first(&self) -> PlayerId {
        self.fighters[0].id
    }

    /// The defender.
    pub fn second(&self) -> PlayerId {
        self.fighters[1].id
    }

    pub fn current_turn(&self) -> PlayerId {
        self.fighters[self.turn].id
    }

    /// The fighter whose turn it is.
    pub fn current_fighter(&self) -> &Fighter {
        &self.fighters[self.turn]
    }

    pub fn fighter(&self, id: PlayerId) -> Option<&Fighter> {
        self.fighters.iter().find(|f| f.id == id)
    }

    pub fn fighters(&self) -> &[Fighter; 2] {
        &self.fighters
    }

    pub fn involves(&self, id: PlayerId) -> bool {
        self.fighter(id).is_some()
    }

    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        let idx = self.index_of(id)?;
        Some(self.fighters[1 - idx].id)
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.fighters.iter().position(|f| f.id == id)
    }

    /// Checks that `who` may act now and returns their index.
    fn authorize(&self, who: PlayerId) -> Result<usize, BattleError> {
        if self.over {
            return Err(BattleError::Finished);
        }
        let idx = self.index_of(who).ok_or(BattleError::NotInBattle(who))?;
        if idx != self.turn {
            return Err(BattleError::NotYourTurn(who));
        }
        Ok(idx)
    }

    fn pass_turn(&mut self) -> BattleOutcome {
        self.turn = 1 - self.turn;
        BattleOutcome::Continues {
            next: self.current_turn(),
        }
    }

    /// `attacker` strikes the other fighter.
    pub fn attack<R: Rng>(
        &mut self,
        attacker: PlayerId,
        rng: &mut R,
    ) -> Result<AttackResolution, BattleError> {
        let idx = self.authorize(attacker)?;
        let [first, second] = &mut self.fighters;
        let (atk, def) = if idx == 0 {
            (first, second)
        } else {
            (second, first)
        };
        let report = resolve_attack(atk, def, rng);

        let outcome = if def.is_alive() {
            self.pass_turn()
        } else {
            self.over = true;
            BattleOutcome::Won {
                winner: report.attacker,
                loser: report.defender,
            }
        };
        Ok(AttackResolution { report, outcome })
    }

    /// `who` tries to flee. Spends one evasion attempt whatever happens.
    pub fn escape<R: Rng>(
        &mut self,
        who: PlayerId,
        rng: &mut R,
    ) -> Result<EscapeResolution, BattleError> {
        let idx = self.authorize(who)?;
        let fighter = &mut self.fighters[idx];
        if fighter.evasions_left == 0 {
            return Err(BattleError::NoEvasionsLeft(who));
        }
        fighter.evasions_left -= 1;
        let evasions_left = fighter.evasions_left;

        let succeeded = rng.random_bool(ESCAPE_CHANCE);
        let outcome = if succeeded {
            self.over = true;
            BattleOutcome::Escaped { by: who }
        } else {
            self.pass_turn()
        };
        Ok(EscapeResolution {
            player_id: who,
            succeeded,
            evasions_left,
            outcome,
        })
    }

    /// `who` leaves the battle; the opponent wins. Allowed out of turn.
    pub fn forfeit(&mut self, who: PlayerId) -> Result<BattleOutcome, BattleError> {
        if self.over {
            return Err(BattleError::Finished);
        }
        let idx = self.index_of(who).ok_or(BattleError::NotInBattle(who))?;
        self.over = true;
        Ok(BattleOutcome::Won {
            winner: self.fighters[1 - idx].id,
            loser: who,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tilewar_protocol::{Attributes, DiceSize};

    fn fighter(id: u64, speed: u32) -> Fighter {
        Fighter::new(
            PlayerId(id),
            Attributes {
                speed,
                ..Attributes::default()
            },
            DiceSize::D6,
            DiceSize::D4,
        )
    }

    #[test]
    fn test_faster_defender_goes_first() {
        let battle = BattleSession::new(fighter(1, 4), fighter(2, 6));
        assert_eq!(battle.current_turn(), PlayerId(2));
        assert_eq!(battle.first(), PlayerId(1));
    }

    #[test]
    fn test_speed_tie_favors_challenger() {
        let battle = BattleSession::new(fighter(1, 4), fighter(2, 4));
        assert_eq!(battle.current_turn(), PlayerId(1));
    }

    #[test]
    fn test_attack_out_of_turn_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut battle = BattleSession::new(fighter(1, 4), fighter(2, 4));
        assert_eq!(
            battle.attack(PlayerId(2), &mut rng).unwrap_err(),
            BattleError::NotYourTurn(PlayerId(2))
        );
        assert_eq!(
            battle.attack(PlayerId(9), &mut rng).unwrap_err(),
            BattleError::NotInBattle(PlayerId(9))
        );
    }

    #[test]
    fn test_attack_passes_turn_while_alive() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut battle = BattleSession::new(fighter(1, 4), fighter(2, 4));
        let res = battle.attack(PlayerId(1), &mut rng).unwrap();
        assert_eq!(res.outcome, BattleOutcome::Continues { next: PlayerId(2) });
        assert_eq!(battle.current_turn(), PlayerId(2));
    }

    #[test]
    fn test_forfeit_hands_victory_to_opponent() {
        let mut battle = BattleSession::new(fighter(1, 4), fighter(2, 4));
        let outcome = battle.forfeit(PlayerId(2)).unwrap();
        assert_eq!(
            outcome,
            BattleOutcome::Won {
                winner: PlayerId(1),
                loser: PlayerId(2)
            }
        );
        assert!(battle.is_over());
        assert_eq!(battle.forfeit(PlayerId(1)).unwrap_err(), BattleError::Finished);
    }

    #[test]
    fn test_opponent_of() {
        let battle = BattleSession::new(fighter(1, 4), fighter(2, 4));
        assert_eq!(battle.opponent_of(PlayerId(1)), Some(PlayerId(2)));
        assert_eq!(battle.opponent_of(PlayerId(3)), None);
    }
}
