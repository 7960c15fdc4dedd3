//! Fixed-capacity ring of the most recent normalized position samples.
//!
//! Index 0 is the newest sample and index `len() - 1` the oldest. A push
//! moves the head back one slot and overwrites the oldest sample, so the
//! cost is O(1) regardless of the window length.

use crate::types::Axis;

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: Vec<[f64; 3]>,
    // Slot holding the newest sample
    head: usize,
}

impl HistoryBuffer {
    /// Buffer of `capacity` zero samples. `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![[0.0; 3]; capacity.max(1)],
            head: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with collections.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Insert `sample` as index 0, evicting the oldest entry.
    #[inline]
    pub fn push(&mut self, sample: [f64; 3]) {
        let n = self.samples.len();
        self.head = (self.head + n - 1) % n;
        self.samples[self.head] = sample;
    }

    /// Sample taken `age` cycles ago (0 = newest).
    #[inline]
    pub fn get(&self, age: usize) -> Option<[f64; 3]> {
        if age >= self.samples.len() {
            return None;
        }
        Some(self.samples[(self.head + age) % self.samples.len()])
    }

    /// Values of one axis, newest first.
    pub fn column(&self, axis: Axis) -> impl ExactSizeIterator<Item = f64> + '_ {
        let n = self.samples.len();
        let i = axis.index();
        (0..n).map(move |age| self.samples[(self.head + age) % n][i])
    }

    /// Reset every slot to `sample`.
    pub fn fill(&mut self, sample: [f64; 3]) {
        self.samples.iter_mut().for_each(|s| *s = sample);
        self.head = 0;
    }
}
