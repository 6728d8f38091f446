//! Randomness abstraction for participant selection.

/// Source of uniform random indices.
pub trait RandomSource: Send + Sync {
    /// A uniformly distributed index in `0..len`. `len` is never zero.
    fn index(&self, len: usize) -> usize;
}
