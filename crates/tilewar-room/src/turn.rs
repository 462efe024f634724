//! Movement-phase turn rotation.

use tilewar_protocol::PlayerId;
use tilewar_tick::{Countdown, CountdownTick};

use crate::GameError;

/// Where the rotation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Built but not started.
    Idle,
    /// `order[cursor]` holds the turn.
    Movement,
    GameOver,
}

/// Whose movement turn it is and how long they have left.
///
/// The holder only ever moves forward through `order`, wrapping at the
/// end. Battles pause the countdown but never touch the order.
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    order: Vec<PlayerId>,
    cursor: usize,
    phase: TurnPhase,
    countdown: Countdown,
    turn_ticks: u32,
    turns_taken: u32,
}

impl TurnScheduler {
    pub fn new(order: Vec<PlayerId>, turn_ticks: u32) -> Self {
        Self {
            order,
            cursor: 0,
            phase: TurnPhase::Idle,
            countdown: Countdown::new(turn_ticks),
            turn_ticks,
            turns_taken: 0,
        }
    }

    pub fn order(&self) -> &[PlayerId] {
        &self.order
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The turn holder, if a turn is running.
    pub fn current(&self) -> Option<PlayerId> {
        match self.phase {
            TurnPhase::Movement => self.order.get(self.cursor).copied(),
            TurnPhase::Idle | TurnPhase::GameOver => None,
        }
    }

    pub fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    pub fn remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    /// Hands the first turn to the head of the order.
    pub fn start(&mut self) -> Option<PlayerId> {
        if self.order.is_empty() {
            return None;
        }
        self.phase = TurnPhase::Movement;
        self.cursor = 0;
        self.begin_turn();
        self.current()
    }

    fn begin_turn(&mut self) {
        self.countdown.reset(self.turn_ticks);
        self.turns_taken += 1;
    }

    /// Ends the turn on the holder's request.
    pub fn end_turn(&mut self, requester: PlayerId) -> Result<PlayerId, GameError> {
        if self.current() != Some(requester) {
            return Err(GameError::NotYourTurn(requester));
        }
        self.advance().ok_or(GameError::GameOver)
    }

    /// Passes the turn to the next player, wrapping after the last.
    pub fn advance(&mut self) -> Option<PlayerId> {
        if self.phase != TurnPhase::Movement || self.order.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.order.len();
        self.begin_turn();
        self.current()
    }

    /// One clock tick of the movement countdown.
    pub fn tick(&mut self) -> CountdownTick {
        if self.phase != TurnPhase::Movement {
            return CountdownTick::Held;
        }
        self.countdown.tick()
    }

    pub fn pause(&mut self) {
        self.countdown.pause();
    }

    pub fn resume(&mut self) {
        self.countdown.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.countdown.is_paused()
    }

    /// Drops a player from the rotation.
    ///
    /// Returns `true` if they held the turn; the next player in order then
    /// holds it with a fresh countdown.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        let Some(index) = self.order.iter().position(|p| *p == id) else {
            return false;
        };
        let was_holder = self.current() == Some(id);
        self.order.remove(index);

        if self.order.is_empty() {
            self.cursor = 0;
            return was_holder;
        }
        if index < self.cursor {
            self.cursor -= 1;
        } else if was_holder {
            self.cursor %= self.order.len();
            self.begin_turn();
        }
        was_holder
    }

    pub fn finish(&mut self) {
        self.phase = TurnPhase::GameOver;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> TurnScheduler {
        TurnScheduler::new(vec![PlayerId(1), PlayerId(2), PlayerId(3)], 3)
    }

    #[test]
    fn test_idle_until_started() {
        let mut s = scheduler();
        assert_eq!(s.current(), None);
        assert_eq!(s.tick(), CountdownTick::Held);
        assert_eq!(s.start(), Some(PlayerId(1)));
        assert_eq!(s.phase(), TurnPhase::Movement);
    }

    #[test]
    fn test_end_turn_only_from_holder() {
        let mut s = scheduler();
        s.start();
        assert_eq!(
            s.end_turn(PlayerId(2)).unwrap_err(),
            GameError::NotYourTurn(PlayerId(2))
        );
        assert_eq!(s.current(), Some(PlayerId(1)));
        assert_eq!(s.end_turn(PlayerId(1)).unwrap(), PlayerId(2));
    }

    #[test]
    fn test_advance_wraps_around() {
        let mut s = scheduler();
        s.start();
        s.advance();
        s.advance();
        assert_eq!(s.advance(), Some(PlayerId(1)));
        assert_eq!(s.turns_taken(), 4);
    }

    #[test]
    fn test_countdown_expires_and_resets_on_advance() {
        let mut s = scheduler();
        s.start();
        assert_eq!(s.tick(), CountdownTick::Running(2));
        assert_eq!(s.tick(), CountdownTick::Running(1));
        assert_eq!(s.tick(), CountdownTick::Expired);
        s.advance();
        assert_eq!(s.remaining(), 3);
    }

    #[test]
    fn test_paused_countdown_is_held() {
        let mut s = scheduler();
        s.start();
        s.pause();
        assert_eq!(s.tick(), CountdownTick::Held);
        s.resume();
        assert_eq!(s.tick(), CountdownTick::Running(2));
    }

    #[test]
    fn test_remove_holder_passes_turn_to_next() {
        let mut s = scheduler();
        s.start();
        s.advance();
        assert!(s.remove(PlayerId(2)));
        assert_eq!(s.current(), Some(PlayerId(3)));
    }

    #[test]
    fn test_remove_last_holder_wraps_to_front() {
        let mut s = scheduler();
        s.start();
        s.advance();
        s.advance();
        assert!(s.remove(PlayerId(3)));
        assert_eq!(s.current(), Some(PlayerId(1)));
    }

    #[test]
    fn test_remove_before_cursor_keeps_holder() {
        let mut s = scheduler();
        s.start();
        s.advance();
        s.advance();
        assert!(!s.remove(PlayerId(1)));
        assert_eq!(s.current(), Some(PlayerId(3)));
        assert_eq!(s.order(), &[PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn test_finish_clears_holder() {
        let mut s = scheduler();
        s.start();
        s.finish();
        assert_eq!(s.current(), None);
        assert_eq!(s.advance(), None);
    }
}
