//! Replacement policies choosing a victim within a full set

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::cache::Line;
use crate::error::PolicyError;

/// Picks the line to evict from a set whose lines are all valid
pub trait ReplacementPolicy {
    fn select_victim(&mut self, set: &[Line]) -> usize;
}

/// Index of the first minimum under `key`, earlier lines win ties
fn argmin_by_key<K: Ord>(set: &[Line], key: impl Fn(&Line) -> K) -> usize {
    assert!(!set.is_empty());
    let mut result = 0;
    for i in 1..set.len() {
        if key(&set[i]) < key(&set[result]) {
            result = i;
        }
    }
    result
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Lru;

impl ReplacementPolicy for Lru {
    fn select_victim(&mut self, set: &[Line]) -> usize {
        argmin_by_key(set, |line| line.last_access)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Fifo;

impl ReplacementPolicy for Fifo {
    fn select_victim(&mut self, set: &[Line]) -> usize {
        argmin_by_key(set, |line| line.inserted)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Lfu;

impl ReplacementPolicy for Lfu {
    fn select_victim(&mut self, set: &[Line]) -> usize {
        argmin_by_key(set, |line| (line.ref_count, line.inserted))
    }
}

/// Uniform victim selection backed by its own generator,
/// so that configurations never share random state
#[derive(Clone, Debug)]
pub struct Random {
    rng: ChaCha8Rng,
}

impl Random {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }
}

impl ReplacementPolicy for Random {
    fn select_victim(&mut self, set: &[Line]) -> usize {
        self.rng.gen_range(0..set.len())
    }
}

/// Name of a replacement policy as it appears in configurations
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum PolicyKind {
    #[default]
    Lru,
    Fifo,
    Random,
    Lfu,
}

impl PolicyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Lru => "LRU",
            PolicyKind::Fifo => "FIFO",
            PolicyKind::Random => "Random",
            PolicyKind::Lfu => "LFU",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LRU" => Ok(PolicyKind::Lru),
            "FIFO" => Ok(PolicyKind::Fifo),
            "RANDOM" => Ok(PolicyKind::Random),
            "LFU" => Ok(PolicyKind::Lfu),
            _ => Err(PolicyError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for PolicyKind {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PolicyKind> for String {
    fn from(kind: PolicyKind) -> Self {
        kind.name().to_string()
    }
}

/// Policy instance owned by a single cache
#[derive(Clone, Debug)]
pub enum Policy {
    Lru(Lru),
    Fifo(Fifo),
    Random(Random),
    Lfu(Lfu),
}

impl Policy {
    pub fn make(kind: PolicyKind, seed: Option<u64>) -> Self {
        match kind {
            PolicyKind::Lru => Policy::Lru(Lru),
            PolicyKind::Fifo => Policy::Fifo(Fifo),
            PolicyKind::Random => Policy::Random(Random::new(seed)),
            PolicyKind::Lfu => Policy::Lfu(Lfu),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Lru(_) => PolicyKind::Lru,
            Policy::Fifo(_) => PolicyKind::Fifo,
            Policy::Random(_) => PolicyKind::Random,
            Policy::Lfu(_) => PolicyKind::Lfu,
        }
    }
}

impl ReplacementPolicy for Policy {
    fn select_victim(&mut self, set: &[Line]) -> usize {
        match self {
            Policy::Lru(policy) => policy.select_victim(set),
            Policy::Fifo(policy) => policy.select_victim(set),
            Policy::Random(policy) => policy.select_victim(set),
            Policy::Lfu(policy) => policy.select_victim(set),
        }
    }
}
