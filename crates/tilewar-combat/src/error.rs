//! Error types for battle actions.

use tilewar_protocol::PlayerId;

/// Reasons a battle action is refused. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    /// The player is not one of the two fighters.
    #[error("player {0} is not in this battle")]
    NotInBattle(PlayerId),

    /// The player acted out of turn.
    #[error("it is not {0}'s battle turn")]
    NotYourTurn(PlayerId),

    /// The player has used all evasion attempts.
    #[error("player {0} has no evasion attempts left")]
    NoEvasionsLeft(PlayerId),

    /// The battle already ended.
    #[error("the battle is over")]
    Finished,
}
