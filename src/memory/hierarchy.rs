//! Inclusive multi-level cache hierarchy

use serde::{Deserialize, Serialize};

use super::cache::{Cache, CacheConfig};
use super::stats::HierarchyStats;
use super::AccessOutcome;
use crate::error::ConfigError;
use crate::trace::AccessRecord;

fn default_main_memory_latency() -> u32 {
    100
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// L1 first
    #[serde(rename = "level")]
    pub levels: Vec<CacheConfig>,
    #[serde(default = "default_main_memory_latency")]
    pub main_memory_latency: u32,
}

impl Default for HierarchyConfig {
    /// Two levels modelled after a small L1/L2 pair
    fn default() -> Self {
        Self {
            levels: vec![
                CacheConfig::make("L1", 512, 32, 2, 1),
                CacheConfig::make("L2", 4096, 64, 4, 10),
            ],
            main_memory_latency: default_main_memory_latency(),
        }
    }
}

impl HierarchyConfig {
    /// A hierarchy made of a single cache
    pub fn single(level: CacheConfig, main_memory_latency: u32) -> Self {
        Self { levels: vec![level], main_memory_latency }
    }
}

/// Where an access was satisfied
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServedBy {
    Level(usize),
    MainMemory,
}

/// Result of one access through the hierarchy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyAccess {
    /// One outcome per probed level, L1 first
    pub outcomes: Vec<AccessOutcome>,
    pub served_by: ServedBy,
    /// Hit latencies of the probed levels, plus main memory on a full miss
    pub latency: u64,
}

/// We maintain n (n >= 1) caches in front of main memory.
/// The order of the levels is fixed at construction.
#[derive(Clone, Debug)]
pub struct CacheHierarchy {
    levels: Box<[Cache]>,
    main_memory_latency: u32,
}

impl CacheHierarchy {
    pub fn make(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        let levels = config
            .levels
            .iter()
            .cloned()
            .map(Cache::make)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_levels(levels, config.main_memory_latency)
    }

    pub fn from_levels(
        levels: Vec<Cache>,
        main_memory_latency: u32,
    ) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for pair in levels.windows(2) {
            if pair[1].hit_latency() < pair[0].hit_latency() {
                log::warn!(
                    "{} is faster than {} ({} < {}), levels are kept in the given order",
                    pair[1].name(),
                    pair[0].name(),
                    pair[1].hit_latency(),
                    pair[0].hit_latency()
                );
            }
        }
        Ok(Self { levels: levels.into_boxed_slice(), main_memory_latency })
    }

    pub fn n(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[Cache] {
        &self.levels
    }

    pub fn level(&self, k: usize) -> &Cache {
        &self.levels[k]
    }

    pub fn main_memory_latency(&self) -> u32 {
        self.main_memory_latency
    }

    /// Access the hierarchy, stopping at the first level that hits.
    ///
    /// Every probed level that missed allocates the block on the way,
    /// so after a hit at level k (or a fill from main memory) all
    /// levels closer to the CPU hold the block as well.
    pub fn access(&mut self, address: u64) -> HierarchyAccess {
        self.access_with(|cache| cache.access(address))
    }

    pub fn access_record(&mut self, record: &AccessRecord) -> HierarchyAccess {
        self.access_with(|cache| cache.access_record(record))
    }

    fn access_with(
        &mut self,
        mut probe: impl FnMut(&mut Cache) -> AccessOutcome,
    ) -> HierarchyAccess {
        let mut outcomes = Vec::with_capacity(self.levels.len());
        let mut latency = 0u64;
        for (k, cache) in self.levels.iter_mut().enumerate() {
            latency += cache.hit_latency() as u64;
            let outcome = probe(cache);
            outcomes.push(outcome);
            if outcome.is_hit() {
                return HierarchyAccess { outcomes, served_by: ServedBy::Level(k), latency };
            }
        }
        latency += self.main_memory_latency as u64;
        HierarchyAccess { outcomes, served_by: ServedBy::MainMemory, latency }
    }

    /// Invalidate the lines of level k, keeping its statistics
    pub fn flush_level(&mut self, k: usize) {
        self.levels[k].flush();
    }

    /// Invalidate every level and clear all statistics
    pub fn reset(&mut self) {
        for cache in self.levels.iter_mut() {
            cache.reset();
        }
    }

    pub fn stats(&self) -> HierarchyStats {
        HierarchyStats {
            levels: self.levels.iter().map(Cache::stats).collect(),
            main_memory_latency: self.main_memory_latency,
        }
    }

    pub fn amat(&self) -> f64 {
        self.stats().amat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::replacement::PolicyKind;
    use crate::testing::init_logging;

    fn two_levels(memory_latency: u32) -> CacheHierarchy {
        CacheHierarchy::make(&HierarchyConfig {
            levels: vec![
                CacheConfig::make("L1", 64, 16, 1, 1),
                CacheConfig::make("L2", 1024, 16, 4, 10),
            ],
            main_memory_latency: memory_latency,
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_configs() {
        init_logging();
        let empty = HierarchyConfig { levels: vec![], main_memory_latency: 100 };
        assert_eq!(CacheHierarchy::make(&empty).unwrap_err(), ConfigError::NoLevels);

        let mut config = HierarchyConfig::default();
        config.levels[1].total_size = 4000;
        assert!(matches!(
            CacheHierarchy::make(&config),
            Err(ConfigError::Indivisible { .. })
        ));
    }

    #[test]
    fn test_full_miss_latency() {
        init_logging();
        let mut mem = two_levels(100);
        let access = mem.access(0x1234);
        assert_eq!(access.served_by, ServedBy::MainMemory);
        assert_eq!(access.outcomes, vec![AccessOutcome::Miss, AccessOutcome::Miss]);
        assert_eq!(access.latency, 1 + 10 + 100);

        // Both levels were filled
        let access = mem.access(0x1234);
        assert_eq!(access.served_by, ServedBy::Level(0));
        assert_eq!(access.outcomes, vec![AccessOutcome::Hit]);
        assert_eq!(access.latency, 1);
        assert_eq!(mem.level(1).stats().accesses(), 1);
    }

    #[test]
    fn test_l2_hit_fills_l1() {
        init_logging();
        let mut mem = two_levels(100);
        // 0 and 64 conflict in the 4-set direct-mapped L1
        mem.access(0);
        mem.access(64);
        assert!(!mem.level(0).contains(0));
        assert!(mem.level(1).contains(0));

        let access = mem.access(0);
        assert_eq!(access.served_by, ServedBy::Level(1));
        assert_eq!(access.latency, 11);
        assert!(mem.level(0).contains(0));
    }

    #[test]
    fn test_forced_empty_l1() {
        init_logging();
        let mut mem = two_levels(100);
        let trace = [0u64, 16, 32, 0, 16, 4096, 0, 32, 4096];
        let mut served = vec![];
        for address in trace {
            mem.flush_level(0);
            served.push(mem.access(address).served_by);
        }
        assert!(served.iter().all(|s| *s != ServedBy::Level(0)));

        let stats = mem.stats();
        assert_eq!(stats.levels[0].hit_ratio(), 0.0);
        assert_eq!(stats.levels[0].misses, trace.len() as u64);
        assert_eq!(stats.levels[1].hits, 5);
        assert_eq!(stats.memory_accesses(), 4);
        assert_eq!(stats.amat(), 1.0 + stats.amat_from(1));
    }

    #[test]
    fn test_amat_monotone_in_memory_latency() {
        init_logging();
        let trace: Vec<u64> = (0..2000u64).map(|i| (i * 2654435761) % 8192).collect();
        let mut previous = 0.0;
        for latency in [0, 1, 20, 100, 400] {
            let mut mem = two_levels(latency);
            for address in &trace {
                mem.access(*address);
            }
            let stats = mem.stats();
            assert_eq!(
                stats.levels[0].hit_ratio() + stats.levels[0].miss_ratio(),
                1.0
            );
            assert!(mem.amat() >= previous);
            previous = mem.amat();
        }
    }

    #[test]
    fn test_amat_matches_probe_time() {
        init_logging();
        let mut mem = CacheHierarchy::make(&HierarchyConfig::default()).unwrap();
        let mut probe_time = 0;
        for i in 0..5000u64 {
            probe_time += mem.access((i * 40503) % 16384).latency;
        }
        let stats = mem.stats();
        assert!((stats.total_access_time() - probe_time as f64).abs() < 1e-6);
    }

    #[test]
    fn test_random_levels_are_independent() {
        init_logging();
        let config = HierarchyConfig {
            levels: vec![
                CacheConfig::make("L1", 256, 16, 4, 1)
                    .with_policy(PolicyKind::Random)
                    .with_seed(1),
                CacheConfig::make("L2", 2048, 16, 8, 8)
                    .with_policy(PolicyKind::Random)
                    .with_seed(2),
            ],
            main_memory_latency: 50,
        };
        let run = || {
            let mut mem = CacheHierarchy::make(&config).unwrap();
            (0..3000u64)
                .map(|i| mem.access((i * 7) % 5000 * 16).served_by)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_reset() {
        init_logging();
        let mut mem = CacheHierarchy::make(&HierarchyConfig::default()).unwrap();
        assert_eq!(mem.n(), 2);
        mem.access(0);
        mem.access(0);
        mem.reset();
        assert_eq!(mem.n(), 2);
        assert_eq!(mem.stats().accesses(), 0);
        assert!(!mem.level(0).contains(0));
    }
}
