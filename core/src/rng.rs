//! Deterministic random number generation.
//!
//! RULE: Nothing here may call any platform RNG.
//! Two kinds of randomness exist and they never mix:
//!
//!   - Block sizes come from one sequential stream: a `Pcg64Mcg` seeded
//!     with `seed_from_u64(seed)` driving `rand_distr::Poisson<f64>`.
//!     Changing either the generator or the sampler changes every layout.
//!
//!   - Event seeds are never drawn from a stream. Each one is a pure
//!     function of (seed roots, realization, event, plugin name) built
//!     from the SplitMix64 finalizer, so any worker can derive any
//!     event's seeds without having seen any other event.
//!
//! Event seed derivation (fixed, never reordered):
//!
//! ```text
//! realization_key = mix64(realization_root ^ mix64(realization * GOLDEN))
//! stream_key      = mix64(event_root ^ mix64(fnv1a(plugin) + GOLDEN))
//! seed            = mix64(stream_key ^ realization_key ^ mix64(event * GOLDEN))
//! ```
//!
//! Every step is a bijection in `event` once plugin and realization are
//! fixed, so two events of one plugin stream in one realization never
//! share a seed.

use crate::{
    error::{SeedError, SeedResult},
    types::{EventIndex, RealizationIndex, Seed},
};
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson};
use rand_pcg::Pcg64Mcg;

/// 2^64 / phi, odd, so multiplying by it is a bijection on u64.
pub const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// SplitMix64 finalizer.
pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Stable 64-bit key for a plugin name (FNV-1a over its UTF-8 bytes).
pub fn plugin_key(name: &str) -> u64 {
    name.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// The two seed roots every event seed is derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedRoots {
    event_root: u64,
    realization_root: u64,
}

impl SeedRoots {
    pub fn new(initial_event_seed: i64, initial_realization_seed: i64) -> Self {
        Self {
            event_root: initial_event_seed as u64,
            realization_root: initial_realization_seed as u64,
        }
    }

    /// Per-realization perturbation.
    pub fn realization_key(&self, realization: RealizationIndex) -> u64 {
        mix64(self.realization_root ^ mix64((realization as u64).wrapping_mul(GOLDEN)))
    }

    /// Per-plugin stream key. Independent of every other plugin name.
    pub fn stream_key(&self, plugin: &str) -> u64 {
        mix64(self.event_root ^ mix64(plugin_key(plugin).wrapping_add(GOLDEN)))
    }

    /// Final seed for one event of one plugin stream.
    pub fn event_seed(&self, stream_key: u64, realization_key: u64, event: EventIndex) -> Seed {
        let event_key = mix64((event as u64).wrapping_mul(GOLDEN));
        mix64(stream_key ^ realization_key ^ event_key) as Seed
    }

    /// Convenience for a single (realization, event, plugin) tuple.
    pub fn derive(&self, realization: RealizationIndex, event: EventIndex, plugin: &str) -> Seed {
        self.event_seed(self.stream_key(plugin), self.realization_key(realization), event)
    }
}

/// Sequential sampler of block sizes.
pub struct BlockSizeSampler {
    inner: Pcg64Mcg,
    poisson: Poisson<f64>,
}

impl BlockSizeSampler {
    /// `mean` must be positive; callers validate configuration first.
    pub fn new(seed: i64, mean: u32) -> SeedResult<Self> {
        let poisson = Poisson::new(mean as f64).map_err(|e| {
            SeedError::config("target_events_per_block", format!("rejected by sampler: {e}"))
        })?;
        Ok(Self {
            inner: Pcg64Mcg::seed_from_u64(seed as u64),
            poisson,
        })
    }

    /// Draw the next block's event count. Zero is a legal draw.
    pub fn next_count(&mut self) -> u32 {
        self.poisson.sample(&mut self.inner) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn mix64_is_stable() {
        // Reference values of the SplitMix64 finalizer.
        assert_eq!(mix64(0), 0);
        assert_eq!(mix64(GOLDEN), 0xe220_a839_7b1d_cdaf);
    }

    #[test]
    fn fnv1a_matches_reference() {
        assert_eq!(plugin_key(""), FNV_OFFSET);
        assert_eq!(plugin_key("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn sampler_is_deterministic() {
        let mut a = BlockSizeSampler::new(1234, 5).unwrap();
        let mut b = BlockSizeSampler::new(1234, 5).unwrap();
        let draws_a: Vec<u32> = (0..50).map(|_| a.next_count()).collect();
        let draws_b: Vec<u32> = (0..50).map(|_| b.next_count()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn sampler_mean_is_close_to_target() {
        let mut sampler = BlockSizeSampler::new(7, 20).unwrap();
        let n = 10_000;
        let total: u64 = (0..n).map(|_| sampler.next_count() as u64).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 20.0).abs() < 0.5, "sample mean {mean} too far from 20");
    }

    #[test]
    fn different_plugins_get_different_streams() {
        let roots = SeedRoots::new(42, 99);
        assert_ne!(roots.stream_key("hydrology"), roots.stream_key("hydraulics"));
        assert_ne!(roots.derive(1, 1, "hydrology"), roots.derive(1, 1, "hydraulics"));
    }

    #[test]
    fn events_within_one_stream_never_collide() {
        let roots = SeedRoots::new(42, 99);
        let seeds: HashSet<Seed> = (1..=50_000).map(|e| roots.derive(3, e, "hydrology")).collect();
        assert_eq!(seeds.len(), 50_000);
    }

    #[test]
    fn realization_root_perturbs_seeds() {
        let a = SeedRoots::new(42, 1);
        let b = SeedRoots::new(42, 2);
        assert_ne!(a.derive(1, 10, "hydrology"), b.derive(1, 10, "hydrology"));
    }
}
