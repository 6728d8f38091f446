//! Nullable random: deterministic index selection.

use relaybot_types::RandomSource;
use std::sync::Mutex;

/// Returns pre-configured picks in order, wrapping around.
///
/// Each pick is reduced modulo the requested length, so `NullRandom::new(vec![0])`
/// always selects the first candidate.
pub struct NullRandom {
    picks: Vec<usize>,
    next: Mutex<usize>,
}

impl NullRandom {
    pub fn new(picks: Vec<usize>) -> Self {
        assert!(!picks.is_empty(), "NullRandom needs at least one pick");
        Self {
            picks,
            next: Mutex::new(0),
        }
    }

    /// Always pick the first candidate.
    pub fn first() -> Self {
        Self::new(vec![0])
    }
}

impl Default for NullRandom {
    fn default() -> Self {
        Self::first()
    }
}

impl RandomSource for NullRandom {
    fn index(&self, len: usize) -> usize {
        let mut next = self.next.lock().unwrap();
        let pick = self.picks[*next % self.picks.len()];
        *next += 1;
        pick % len
    }
}
