//! Uniform random selection backed by the thread RNG.

use relaybot_types::RandomSource;

#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        rand::random_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_stay_in_range() {
        for len in 1..50 {
            assert!(ThreadRandom.index(len) < len);
        }
    }

    #[test]
    fn every_index_is_reachable() {
        let mut seen = [false; 3];
        for _ in 0..300 {
            seen[ThreadRandom.index(3)] = true;
        }
        assert_eq!(seen, [true; 3]);
    }
}
