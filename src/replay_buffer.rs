use rand::Rng;
use rand::seq::index;

use crate::agent::State;
use crate::snake::Action;

/// A single experience tuple (s, a, r, s', done).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f32,
    pub next_state: State,
    pub done: bool,
}

/// Bounded FIFO of transitions backed by a ring.
pub struct ReplayBuffer {
    cap: usize,
    buf: Vec<Transition>,
    idx: usize, // next overwrite position, also the oldest entry once full
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay capacity must be positive");
        Self { cap: capacity, buf: Vec::with_capacity(capacity.min(1 << 16)), idx: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Appends, evicting the oldest transition when full.
    pub fn push(&mut self, tr: Transition) {
        if self.buf.len() < self.cap {
            self.buf.push(tr);
        } else {
            self.buf[self.idx] = tr;
            self.idx = (self.idx + 1) % self.cap;
        }
    }

    /// `i`-th oldest transition.
    pub fn get(&self, i: usize) -> Option<&Transition> {
        if i >= self.buf.len() {
            return None;
        }
        self.buf.get((self.idx + i) % self.buf.len())
    }

    /// Transitions in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> + '_ {
        let (newer, older) = self.buf.split_at(self.idx);
        older.iter().chain(newer.iter())
    }

    /// `n` distinct transitions drawn uniformly. Panics if `n > len()`.
    pub fn sample<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<Transition> {
        assert!(n <= self.buf.len(), "cannot sample {n} of {} transitions", self.buf.len());
        index::sample(rng, self.buf.len(), n)
            .into_iter()
            .map(|i| self.buf[i])
            .collect()
    }
}
