//! Deterministic keying of pseudo-random streams.
//!
//! Every random decision in the core is drawn from a stream keyed by
//! `(seed, purpose, scope...)`. No generator outlives the decision it was
//! built for, so outcomes depend on inputs and never on call order.

use std::hash::Hasher;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};
use xxhash_rust::xxh3::Xxh3;

use crate::types::{Coord, clamp_probability};

/// Scope tags that keep unrelated decisions on disjoint streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Purpose {
    RunSeed,
    WorldLayout,
    WorldObjects,
    WorldGate,
    RoomBuild,
    FrontierRoom,
    FrontierExits,
    FrontierObjects,
    FrontierGate,
    SpawnTopUp,
    SpawnPulse,
    MovePulse,
    ActorTraits,
    Atmosphere,
    Compose,
    FearWord,
    DialogueRoot,
}

impl Purpose {
    fn tag(self) -> u64 {
        match self {
            Self::RunSeed => 0x01,
            Self::WorldLayout => 0x10,
            Self::WorldObjects => 0x11,
            Self::WorldGate => 0x12,
            Self::RoomBuild => 0x13,
            Self::FrontierRoom => 0x20,
            Self::FrontierExits => 0x21,
            Self::FrontierObjects => 0x22,
            Self::FrontierGate => 0x23,
            Self::SpawnTopUp => 0x30,
            Self::SpawnPulse => 0x31,
            Self::MovePulse => 0x32,
            Self::ActorTraits => 0x33,
            Self::Atmosphere => 0x40,
            Self::Compose => 0x50,
            Self::FearWord => 0x51,
            Self::DialogueRoot => 0x52,
        }
    }
}

pub fn mix_seed_stream(seed: u64, stream: u64) -> u64 {
    let mut mixed = seed ^ stream.wrapping_mul(0xD6E8_FD9A_5B89_7A4D);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    mixed ^ (mixed >> 33)
}

/// Hashes an ordered scope tuple into a single 64-bit key.
pub fn key(seed: u64, purpose: Purpose, scope: &[u64]) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.write_u64(seed);
    hasher.write_u64(purpose.tag());
    hasher.write_u64(scope.len() as u64);
    for part in scope {
        hasher.write_u64(*part);
    }
    mix_seed_stream(hasher.finish(), purpose.tag())
}

/// Sign-extends both axes into scope words.
pub fn coord_scope(coord: Coord) -> [u64; 2] {
    [i64::from(coord.x) as u64, i64::from(coord.y) as u64]
}

/// Seed used when a run is created without one.
pub fn derive_run_seed(run_index: u64) -> u64 {
    key(0x4E55_4C4C_5345_4544, Purpose::RunSeed, &[run_index])
}

pub struct KeyedRng {
    inner: ChaCha8Rng,
}

impl KeyedRng {
    pub fn new(seed: u64, purpose: Purpose, scope: &[u64]) -> Self {
        Self { inner: ChaCha8Rng::seed_from_u64(key(seed, purpose, scope)) }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Inclusive range; a reversed range collapses to `min_value`.
    pub fn range_u64(&mut self, min_value: u64, max_value: u64) -> u64 {
        if max_value <= min_value {
            return min_value;
        }
        let span = max_value - min_value;
        if span == u64::MAX {
            return self.next_u64();
        }
        min_value + self.next_u64() % (span + 1)
    }

    pub fn range_usize(&mut self, min_value: usize, max_value: usize) -> usize {
        self.range_u64(min_value as u64, max_value as u64) as usize
    }

    pub fn range_u32(&mut self, min_value: u32, max_value: u32) -> u32 {
        self.range_u64(u64::from(min_value), u64::from(max_value)) as u32
    }

    pub fn range_i32(&mut self, min_value: i32, max_value: i32) -> i32 {
        if max_value <= min_value {
            return min_value;
        }
        let span = (i64::from(max_value) - i64::from(min_value)) as u64;
        (i64::from(min_value) + self.range_u64(0, span) as i64) as i32
    }

    /// Uniform in `[0, 1)` with 53 bits of precision.
    pub fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.unit() < clamp_probability(probability)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.range_usize(0, items.len() - 1);
        items.get(index)
    }

    /// Cumulative-sum roll over `weights`. Non-positive and non-finite weights
    /// are never chosen; `None` when nothing is selectable.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let usable = |weight: f64| weight.is_finite() && weight > 0.0;
        let total: f64 = weights.iter().copied().filter(|weight| usable(*weight)).sum();
        if total <= 0.0 {
            return None;
        }
        let roll = self.unit() * total;
        let mut cumulative = 0.0;
        let mut last_usable = None;
        for (index, weight) in weights.iter().copied().enumerate() {
            if !usable(weight) {
                continue;
            }
            cumulative += weight;
            last_usable = Some(index);
            if roll < cumulative {
                return Some(index);
            }
        }
        last_usable
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for upper in (1..items.len()).rev() {
            let swap_with = self.range_usize(0, upper);
            items.swap(upper, swap_with);
        }
    }
}
