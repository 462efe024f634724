use rand::SeedableRng;
use rand::rngs::StdRng;
use tilewar_combat::{BattleError, BattleOutcome, BattleSession, Fighter, STARTING_EVASIONS};
use tilewar_protocol::{Attributes, DiceSize, PlayerId};

const STRONG: PlayerId = PlayerId(1);
const WEAK: PlayerId = PlayerId(2);

/// Attack 50 always beats a defense of at most 0 + 4, and attack 0 + 4
/// never beats defense 50 + 1.
fn lopsided(weak_life: u32) -> BattleSession {
    let strong = Fighter::new(
        STRONG,
        Attributes {
            life: 4,
            speed: 6,
            attack: 50,
            defense: 50,
        },
        DiceSize::D6,
        DiceSize::D4,
    );
    let weak = Fighter::new(
        WEAK,
        Attributes {
            life: weak_life,
            speed: 2,
            attack: 0,
            defense: 0,
        },
        DiceSize::D4,
        DiceSize::D4,
    );
    BattleSession::new(strong, weak)
}

#[test]
fn test_battle_ends_after_exactly_initial_health_hits() {
    let mut rng = StdRng::seed_from_u64(99);
    let life = 5;
    let mut battle = lopsided(life);
    let mut strong_attacks = 0;

    loop {
        let res = battle.attack(STRONG, &mut rng).unwrap();
        strong_attacks += 1;
        assert!(res.report.hit);
        if let BattleOutcome::Won { winner, loser } = res.outcome {
            assert_eq!(winner, STRONG);
            assert_eq!(loser, WEAK);
            break;
        }
        let res = battle.attack(WEAK, &mut rng).unwrap();
        assert!(!res.report.hit);
        assert_eq!(res.outcome, BattleOutcome::Continues { next: STRONG });
    }

    assert_eq!(strong_attacks, life);
    assert!(battle.is_over());
    assert_eq!(
        battle.attack(STRONG, &mut rng).unwrap_err(),
        BattleError::Finished
    );
}

#[test]
fn test_fighter_health_is_a_snapshot() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut battle = lopsided(3);
    battle.attack(STRONG, &mut rng).unwrap();
    assert_eq!(battle.fighter(WEAK).unwrap().health, 2);
    assert_eq!(battle.fighter(WEAK).unwrap().max_health, 3);
}

#[test]
fn test_escape_attempts_are_bounded() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let mut battle = lopsided(100);
        let mut attempts = 0;
        loop {
            // strong side always acts first and burns its turn on an attack
            battle.attack(STRONG, &mut rng).unwrap();
            match battle.escape(WEAK, &mut rng) {
                Ok(res) => {
                    attempts += 1;
                    assert_eq!(res.evasions_left, STARTING_EVASIONS - attempts);
                    if res.succeeded {
                        assert_eq!(res.outcome, BattleOutcome::Escaped { by: WEAK });
                        break;
                    }
                }
                Err(err) => {
                    assert_eq!(err, BattleError::NoEvasionsLeft(WEAK));
                    assert_eq!(battle.current_turn(), WEAK);
                    break;
                }
            }
        }
        assert!(attempts <= STARTING_EVASIONS);
    }
}

#[test]
fn test_failed_escape_passes_turn() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut saw_failure = false;
    for _ in 0..50 {
        let mut battle = lopsided(100);
        battle.attack(STRONG, &mut rng).unwrap();
        let res = battle.escape(WEAK, &mut rng).unwrap();
        if !res.succeeded {
            assert_eq!(res.outcome, BattleOutcome::Continues { next: STRONG });
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[test]
fn test_escape_out_of_turn_is_rejected() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut battle = lopsided(4);
    assert_eq!(
        battle.escape(WEAK, &mut rng).unwrap_err(),
        BattleError::NotYourTurn(WEAK)
    );
    assert_eq!(
        battle.fighter(WEAK).unwrap().evasions_left,
        STARTING_EVASIONS
    );
}
