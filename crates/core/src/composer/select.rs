//! Weighted, phase-ordered selection without repetition inside one composition.

use crate::content::Snippet;
use crate::rng::KeyedRng;
use crate::types::Phase;

/// Weighted pick among `candidates`; returns the index into `candidates`.
pub fn weighted_pick(rng: &mut KeyedRng, candidates: &[&Snippet]) -> Option<usize> {
    let weights: Vec<f64> = candidates.iter().map(|snippet| snippet.weight).collect();
    rng.weighted_index(&weights)
}

pub(super) struct Selection<'c> {
    remaining: Vec<&'c Snippet>,
    exclude: &'c [String],
    picked: Vec<&'c Snippet>,
    max_lines: usize,
}

impl<'c> Selection<'c> {
    pub(super) fn new(eligible: Vec<&'c Snippet>, exclude: &'c [String], max_lines: usize) -> Self {
        Self { remaining: eligible, exclude, picked: Vec::new(), max_lines }
    }

    fn full(&self) -> bool {
        self.picked.len() >= self.max_lines
    }

    fn excluded(&self, snippet: &Snippet) -> bool {
        self.exclude.iter().any(|key| *key == snippet.key)
    }

    /// Indices into `remaining` for a phase pool, preferring entries not used
    /// last time and falling back to the whole pool when that leaves nothing.
    fn phase_pool(&self, phase: Phase) -> Vec<usize> {
        let matching: Vec<usize> = self
            .remaining
            .iter()
            .enumerate()
            .filter(|(_, snippet)| snippet.phase == Some(phase))
            .map(|(index, _)| index)
            .collect();
        let fresh: Vec<usize> = matching
            .iter()
            .copied()
            .filter(|index| !self.excluded(self.remaining[*index]))
            .collect();
        if fresh.is_empty() { matching } else { fresh }
    }

    fn take_from(&mut self, rng: &mut KeyedRng, pool: &[usize]) -> bool {
        let candidates: Vec<&Snippet> = pool.iter().map(|index| self.remaining[*index]).collect();
        let Some(choice) = weighted_pick(rng, &candidates) else {
            return false;
        };
        let snippet = self.remaining.remove(pool[choice]);
        self.picked.push(snippet);
        true
    }

    pub(super) fn pinned(mut self, rng: &mut KeyedRng, phase: Phase) -> Vec<&'c Snippet> {
        while !self.full() {
            let pool = self.phase_pool(phase);
            if !self.take_from(rng, &pool) {
                break;
            }
        }
        self.picked
    }

    pub(super) fn progressive(mut self, rng: &mut KeyedRng) -> Vec<&'c Snippet> {
        for phase in Phase::ORDER {
            if self.full() {
                return self.picked;
            }
            let pool = self.phase_pool(phase);
            self.take_from(rng, &pool);
        }
        while !self.full() {
            let pool: Vec<usize> = (0..self.remaining.len())
                .filter(|index| !self.excluded(self.remaining[*index]))
                .collect();
            if !self.take_from(rng, &pool) {
                break;
            }
        }
        self.picked
    }
}
