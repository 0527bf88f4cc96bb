//! Statistics snapshots.
//! Ratios and AMAT are derived from the raw counters on demand.

use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub reads: u64,
    pub writes: u64,
    pub hit_latency: u32,
}

impl CacheStats {
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// 0 for a cache that was never accessed
    pub fn hit_ratio(&self) -> f64 {
        match self.accesses() {
            0 => 0.0,
            accesses => self.hits as f64 / accesses as f64,
        }
    }

    /// Always `1 - hit_ratio`; a cold cache counts as missing everything
    pub fn miss_ratio(&self) -> f64 {
        1.0 - self.hit_ratio()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyStats {
    pub levels: Vec<CacheStats>,
    pub main_memory_latency: u32,
}

impl HierarchyStats {
    /// Accesses issued to the hierarchy, i.e. those seen by L1
    pub fn accesses(&self) -> u64 {
        self.levels.first().map_or(0, CacheStats::accesses)
    }

    /// Accesses that missed every level
    pub fn memory_accesses(&self) -> u64 {
        self.levels.last().map_or(0, |level| level.misses)
    }

    /// AMAT of the sub-hierarchy starting at level `k`.
    /// `k == levels.len()` yields the main-memory latency; panics when `k` is larger.
    pub fn amat_from(&self, k: usize) -> f64 {
        let mut result = self.main_memory_latency as f64;
        for level in self.levels[k..].iter().rev() {
            result = level.hit_latency as f64 + level.miss_ratio() * result;
        }
        result
    }

    pub fn amat(&self) -> f64 {
        self.amat_from(0)
    }

    pub fn total_access_time(&self) -> f64 {
        self.accesses() as f64 * self.amat()
    }

    /// Fraction of accesses served by some level, 0 for a cold hierarchy
    pub fn hit_ratio(&self) -> f64 {
        match self.accesses() {
            0 => 0.0,
            accesses => (accesses - self.memory_accesses()) as f64 / accesses as f64,
        }
    }

    /// Fraction of accesses that reached main memory
    pub fn miss_ratio(&self) -> f64 {
        1.0 - self.hit_ratio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(hits: u64, misses: u64, hit_latency: u32) -> CacheStats {
        CacheStats { name: "L".into(), hits, misses, hit_latency, ..Default::default() }
    }

    #[test]
    fn test_ratios_sum_to_one() {
        for (hits, misses) in [(0, 0), (1, 0), (0, 1), (1, 2), (7, 3), (1, 9999), (12345, 678)] {
            let stats = level(hits, misses, 1);
            assert_eq!(stats.hit_ratio() + stats.miss_ratio(), 1.0);
        }
    }

    #[test]
    fn test_amat_recursion() {
        let stats = HierarchyStats {
            levels: vec![level(90, 10, 1), level(5, 5, 10)],
            main_memory_latency: 100,
        };
        // 1 + 0.1 * (10 + 0.5 * 100)
        assert!((stats.amat() - 7.0).abs() < 1e-9);
        assert!((stats.amat_from(1) - 60.0).abs() < 1e-9);
        assert!((stats.total_access_time() - 700.0).abs() < 1e-9);
        assert_eq!(stats.memory_accesses(), 5);
        assert!((stats.hit_ratio() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_overall_ratios() {
        let cold = HierarchyStats { levels: vec![level(0, 0, 1)], main_memory_latency: 100 };
        assert_eq!((cold.hit_ratio(), cold.miss_ratio()), (0.0, 1.0));

        // One level: the overall ratio is exactly the L1 ratio
        for (hits, misses) in [(1, 4), (7, 3), (1, 9999), (12345, 678)] {
            let stats = HierarchyStats {
                levels: vec![level(hits, misses, 1)],
                main_memory_latency: 100,
            };
            assert_eq!(stats.hit_ratio(), stats.levels[0].hit_ratio());
            assert_eq!(stats.hit_ratio() + stats.miss_ratio(), 1.0);
        }

        let stats = HierarchyStats {
            levels: vec![level(3, 7, 1), level(2, 5, 10)],
            main_memory_latency: 100,
        };
        assert_eq!(stats.hit_ratio(), 0.5);
        assert_eq!(stats.hit_ratio() + stats.miss_ratio(), 1.0);
    }

    #[test]
    fn test_amat_from_last_level_is_memory() {
        let stats = HierarchyStats {
            levels: vec![level(90, 10, 1), level(5, 5, 10)],
            main_memory_latency: 100,
        };
        assert_eq!(stats.amat_from(2), 100.0);
    }

    #[test]
    fn test_amat_monotone_in_memory_latency() {
        let mut stats = HierarchyStats {
            levels: vec![level(3, 4, 1), level(1, 3, 4)],
            main_memory_latency: 0,
        };
        let mut previous = stats.amat();
        for latency in [1, 10, 50, 100, 1000] {
            stats.main_memory_latency = latency;
            assert!(stats.amat() >= previous);
            previous = stats.amat();
        }
    }
}
