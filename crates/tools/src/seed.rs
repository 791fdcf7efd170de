use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use hollow_core::rng::mix_seed_stream;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedChoice {
    Cli(u64),
    Generated(u64),
}

impl SeedChoice {
    /// Uses the flag when given, otherwise draws a fresh runtime seed.
    pub fn resolve(flag: Option<u64>) -> Self {
        match flag {
            Some(seed) => Self::Cli(seed),
            None => Self::Generated(generate_runtime_seed()),
        }
    }

    pub fn value(self) -> u64 {
        match self {
            Self::Cli(seed) | Self::Generated(seed) => seed,
        }
    }
}

static GENERATED_SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn generate_runtime_seed() -> u64 {
    let now_nanos =
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0_u128, |duration| duration.as_nanos());
    let counter = GENERATED_SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
    let entropy =
        (now_nanos as u64) ^ ((now_nanos >> 64) as u64) ^ u64::from(process::id()).rotate_left(17);
    mix_seed_stream(entropy, counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_generation() {
        assert_eq!(SeedChoice::resolve(Some(4242)), SeedChoice::Cli(4242));
        assert_eq!(SeedChoice::resolve(Some(4242)).value(), 4242);
    }

    #[test]
    fn missing_flag_generates() {
        assert!(matches!(SeedChoice::resolve(None), SeedChoice::Generated(_)));
    }

    #[test]
    fn generated_seed_changes_between_calls() {
        assert_ne!(generate_runtime_seed(), generate_runtime_seed());
    }
}
