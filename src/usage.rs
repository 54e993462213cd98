//! Per-index usage counts and weighted index sampling.
//!
//! The tracker counts how many accepted constraints reference each byte of the secret. Sampling
//! favours the least used positions so that constraints spread over the whole secret instead of
//! piling up on a few bytes.

use rand::{
    distr::{weighted::WeightedIndex, Distribution},
    Rng,
};

use crate::{Error, Result};

/// Generation counts, one per secret byte.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexUsage {
    counts: Vec<usize>,
}

impl IndexUsage {
    /// Creates a tracker for `size` indexes, all with a count of zero.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            counts: vec![0; size],
        }
    }

    /// Returns the number of tracked indexes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if no index is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Returns the count recorded for `index`, if it is tracked.
    #[must_use]
    pub fn count(&self, index: usize) -> Option<usize> {
        self.counts.get(index).copied()
    }

    /// Returns all counts, indexed like the secret.
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Increments the count of every index in `indexes`.
    ///
    /// Untracked indexes are ignored.
    pub fn record(&mut self, indexes: &[usize]) {
        for &index in indexes {
            if let Some(count) = self.counts.get_mut(index) {
                *count += 1;
            }
        }
    }

    /// Draws `k` distinct indexes, biased toward the least used ones.
    ///
    /// Each draw weighs every remaining index by `max_count - count`, where `max_count` is taken
    /// over the remaining pool. When all remaining counts are equal, `max_count` is bumped by one
    /// so that the draw falls back to a uniform choice instead of an all-zero distribution. No
    /// remaining index is ever given a zero weight unless another one has a positive weight.
    ///
    /// # Arguments
    ///
    /// * `rng` - The randomness source.
    /// * `k` - Number of distinct indexes to draw.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SampleOutOfRange`] if `k` exceeds the number of tracked indexes.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, k: usize) -> Result<Vec<usize>> {
        if k > self.counts.len() {
            return Err(Error::SampleOutOfRange {
                requested: k,
                available: self.counts.len(),
            });
        }

        let mut pool: Vec<usize> = (0..self.counts.len()).collect();
        let mut chosen = Vec::with_capacity(k);
        for _ in 0..k {
            let counts: Vec<usize> = pool.iter().map(|&i| self.counts[i]).collect();
            let min_count = counts.iter().copied().min().unwrap_or(0);
            let mut max_count = counts.iter().copied().max().unwrap_or(0);
            if min_count == max_count {
                max_count += 1;
            }

            let weights = counts.iter().map(|&count| max_count - count);
            let dist = WeightedIndex::new(weights)?;
            chosen.push(pool.remove(dist.sample(rng)));
        }

        Ok(chosen)
    }
}
