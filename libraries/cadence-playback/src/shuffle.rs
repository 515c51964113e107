//! Shuffle engine
//!
//! Unbiased Fisher-Yates permutation of a playlist, expressed as an order of
//! snapshot indices so the snapshot itself is never reordered.

use rand::{thread_rng, Rng};

/// Shuffle a slice in place using the thread-local RNG
pub fn shuffle<T>(items: &mut [T]) {
    shuffle_with(items, &mut thread_rng());
}

/// Fisher-Yates shuffle driven by a caller-supplied RNG
///
/// Walks from the last element down to index 1, swapping each element with
/// a uniformly chosen element at or below it. Every permutation is equally
/// likely and the multiset of elements is preserved.
pub fn shuffle_with<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// A shuffled traversal order over a playlist snapshot
///
/// Each entry is an index into the snapshot. The order is a permutation of
/// `0..len`, so it holds exactly the snapshot's tracks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShuffleOrder {
    indices: Vec<usize>,
}

impl ShuffleOrder {
    /// Generate a fresh order for a snapshot of `len` tracks
    pub fn generate(len: usize) -> Self {
        Self::generate_with(len, &mut thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut indices: Vec<usize> = (0..len).collect();
        shuffle_with(&mut indices, rng);
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Snapshot index at a position in the shuffled order
    pub fn get(&self, position: usize) -> Option<usize> {
        self.indices.get(position).copied()
    }

    /// Position in the shuffled order of a snapshot index
    pub fn position_of(&self, snapshot_index: usize) -> Option<usize> {
        self.indices.iter().position(|&i| i == snapshot_index)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }
}
