/// Result of advancing a [`Countdown`] by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Paused or already expired; nothing happened.
    Held,
    /// Still running with this many ticks left.
    Running(u32),
    /// Just reached zero. Reported once.
    Expired,
}

/// A whole-tick timer such as the turn or battle clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    paused: bool,
}

impl Countdown {
    pub fn new(ticks: u32) -> Self {
        Self {
            remaining: ticks,
            paused: false,
        }
    }

    pub fn tick(&mut self) -> CountdownTick {
        if self.paused || self.remaining == 0 {
            return CountdownTick::Held;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            CountdownTick::Expired
        } else {
            CountdownTick::Running(self.remaining)
        }
    }

    /// Restarts with `ticks` left and clears any pause.
    pub fn reset(&mut self, ticks: u32) {
        self.remaining = ticks;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_down_then_expires_once() {
        let mut c = Countdown::new(3);
        assert_eq!(c.tick(), CountdownTick::Running(2));
        assert_eq!(c.tick(), CountdownTick::Running(1));
        assert_eq!(c.tick(), CountdownTick::Expired);
        assert_eq!(c.tick(), CountdownTick::Held);
        assert!(c.is_expired());
    }

    #[test]
    fn test_paused_countdown_holds() {
        let mut c = Countdown::new(5);
        c.tick();
        c.pause();
        assert_eq!(c.tick(), CountdownTick::Held);
        assert_eq!(c.remaining(), 4);
        c.resume();
        assert_eq!(c.tick(), CountdownTick::Running(3));
    }

    #[test]
    fn test_reset_clears_pause() {
        let mut c = Countdown::new(1);
        c.pause();
        c.reset(30);
        assert!(!c.is_paused());
        assert_eq!(c.remaining(), 30);
    }

    #[test]
    fn test_zero_countdown_never_fires() {
        let mut c = Countdown::new(0);
        assert_eq!(c.tick(), CountdownTick::Held);
    }
}
