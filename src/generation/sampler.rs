//! # Frequency-Biased Sampler
//!
//! Index selection that favors rarely chosen candidates.
//!
//! Every index carries a weight of `1 / (draws + 1)^2`. A fresh index is
//! four times as likely as one drawn once and nine times as likely as one
//! drawn twice, so repeated favorites fall off quickly while no index ever
//! reaches zero weight. Over many draws the distribution flattens towards
//! uniform coverage.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Rejected draws tolerated by [`FrequencySampler::draw_below`] before it
/// picks directly among the indices below the limit.
const MAX_REJECTIONS: usize = 64;

/// Seeded inverse-square frequency sampler over `[0, N)`.
#[derive(Debug, Clone)]
pub struct FrequencySampler {
    counts: Vec<u32>,
    cumulative: Vec<f64>,
    rng: StdRng,
}

impl FrequencySampler {
    /// Creates a sampler over `bound` indices with all counts at zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilestitch::FrequencySampler;
    ///
    /// let mut sampler = FrequencySampler::new(4, 7);
    /// let index = sampler.draw().unwrap();
    /// assert!(index < 4);
    /// assert_eq!(sampler.count(index), 1);
    /// ```
    pub fn new(bound: usize, seed: u64) -> Self {
        let mut sampler = Self {
            counts: vec![0; bound],
            cumulative: Vec::with_capacity(bound),
            rng: StdRng::seed_from_u64(seed),
        };
        sampler.recompute();
        sampler
    }

    /// Number of indices the sampler draws from.
    pub fn bound(&self) -> usize {
        self.counts.len()
    }

    /// How many times `index` has been drawn.
    pub fn count(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// Current selection weight of `index`.
    pub fn weight(&self, index: usize) -> f64 {
        let n = f64::from(self.count(index)) + 1.0;
        1.0 / (n * n)
    }

    fn recompute(&mut self) {
        self.cumulative.clear();
        let mut total = 0.0;
        for index in 0..self.counts.len() {
            total += self.weight(index);
            self.cumulative.push(total);
        }
    }

    /// Picks an index from the current weights without recording it.
    fn pick(&mut self) -> Option<usize> {
        let total = *self.cumulative.last()?;
        let roll = self.rng.gen::<f64>() * total;
        let index = self.cumulative.partition_point(|&c| c <= roll);
        Some(index.min(self.counts.len() - 1))
    }

    /// Picks an index below `limit` from the weights of that prefix alone.
    fn pick_below(&mut self, limit: usize) -> usize {
        let prefix = &self.cumulative[..limit];
        let roll = self.rng.gen::<f64>() * prefix[limit - 1];
        prefix.partition_point(|&c| c <= roll).min(limit - 1)
    }

    fn record(&mut self, index: usize) {
        self.counts[index] += 1;
        self.recompute();
    }

    /// Draws an index in `[0, bound)` and counts it. `None` if the bound is 0.
    pub fn draw(&mut self) -> Option<usize> {
        let index = self.pick()?;
        self.record(index);
        Some(index)
    }

    /// Draws an index below `limit`, re-drawing whenever the sampler lands
    /// past the end of the caller's current candidate list.
    ///
    /// The caller's list may be shorter than the sampler's bound. Only the
    /// accepted draw is counted, so indices past a limit that stays small keep
    /// full weight while the accepted ones decay, and rejections grow roughly
    /// with the square of the accepted count. After `MAX_REJECTIONS` misses
    /// the draw is taken from the weights below the limit instead. Returns
    /// `None` when no valid index exists.
    pub fn draw_below(&mut self, limit: usize) -> Option<usize> {
        let limit = limit.min(self.bound());
        if limit == 0 {
            return None;
        }

        for _ in 0..MAX_REJECTIONS {
            let index = self.pick()?;
            if index < limit {
                self.record(index);
                return Some(index);
            }
        }

        let index = self.pick_below(limit);
        self.record(index);
        Some(index)
    }
}
