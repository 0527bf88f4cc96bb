//! Cache implementation

use serde::{Deserialize, Serialize};

use super::replacement::{Policy, PolicyKind, ReplacementPolicy};
use super::stats::CacheStats;
use super::{AccessOutcome, AccessType};
use crate::error::ConfigError;
use crate::trace::AccessRecord;

pub fn get_log_2(value: u64) -> u32 {
    assert!(value > 0);
    63 - value.leading_zeros()
}

pub fn is_pow_2(value: u64) -> bool {
    value != 0 && value & (value - 1) == 0
}

pub fn get_mask(bits: u32) -> u64 {
    (1 << bits) - 1
}

/// An address split into its cache coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedAddress {
    pub tag: u64,
    pub index: u64,
    pub offset: u64,
}

/// Maps byte addresses to (tag, index, offset).
///
/// An address looks like this:
/// | tag | index | offset |
///
/// The block size is always a power of two, so the offset is masked.
/// The index is masked as well when the number of sets is a power of two,
/// and computed with modulo arithmetic otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressLayout {
    block_size: u64,
    num_sets: u64,
    offset_bits: u32,
    offset_mask: u64,
    /// `Some(bits)` iff the number of sets is a power of two
    index_bits: Option<u32>,
}

impl AddressLayout {
    /// # Panics
    ///
    /// Panics unless `block_size` is a power of two and `num_sets` is positive.
    /// [`CacheConfig::validate`] guarantees both for [`Cache`].
    pub fn make(block_size: u64, num_sets: u64) -> Self {
        assert!(is_pow_2(block_size));
        assert!(num_sets > 0);
        let offset_bits = get_log_2(block_size);
        Self {
            block_size,
            num_sets,
            offset_bits,
            offset_mask: get_mask(offset_bits),
            index_bits: is_pow_2(num_sets).then(|| get_log_2(num_sets)),
        }
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn num_sets(&self) -> u64 {
        self.num_sets
    }

    pub fn decode(&self, address: u64) -> DecodedAddress {
        let offset = address & self.offset_mask;
        let block = address >> self.offset_bits;
        let (tag, index) = match self.index_bits {
            Some(bits) => (block >> bits, block & get_mask(bits)),
            None => (block / self.num_sets, block % self.num_sets),
        };
        DecodedAddress { tag, index, offset }
    }

    /// Inverse of [`AddressLayout::decode`]
    pub fn compose(&self, decoded: &DecodedAddress) -> u64 {
        let block = match self.index_bits {
            Some(bits) => (decoded.tag << bits) | decoded.index,
            None => decoded.tag * self.num_sets + decoded.index,
        };
        (block << self.offset_bits) | decoded.offset
    }
}

/// Configuration of a single cache level
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub total_size: u64,
    pub block_size: u64,
    pub associativity: u64,
    #[serde(default = "default_hit_latency")]
    pub hit_latency: u32,
    #[serde(default, alias = "policy")]
    pub replacement_policy: PolicyKind,
    /// Seed for the random policy, OS entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_name() -> String {
    "L1".to_string()
}

fn default_hit_latency() -> u32 {
    1
}

impl Default for CacheConfig {
    /// 1KB direct-mapped cache with 32B blocks
    fn default() -> Self {
        Self::make("L1", 1024, 32, 1, 1)
    }
}

impl CacheConfig {
    pub fn make(
        name: &str,
        total_size: u64,
        block_size: u64,
        associativity: u64,
        hit_latency: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            total_size,
            block_size,
            associativity,
            hit_latency,
            replacement_policy: PolicyKind::default(),
            seed: None,
        }
    }

    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.replacement_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Only meaningful once [`CacheConfig::validate`] succeeded
    pub fn num_sets(&self) -> u64 {
        self.total_size / (self.block_size * self.associativity)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("total_size", self.total_size),
            ("block_size", self.block_size),
            ("associativity", self.associativity),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositive {
                    name: self.name.clone(),
                    field,
                });
            }
        }
        if !is_pow_2(self.block_size) {
            return Err(ConfigError::BlockSizeNotPow2(
                self.block_size,
                self.name.clone(),
            ));
        }
        let indivisible = || ConfigError::Indivisible {
            name: self.name.clone(),
            total_size: self.total_size,
            block_size: self.block_size,
            associativity: self.associativity,
        };
        let set_bytes = self
            .block_size
            .checked_mul(self.associativity)
            .ok_or_else(indivisible)?;
        // total_size = num_sets * associativity * block_size, num_sets >= 1
        if self.total_size % set_bytes != 0 || self.total_size < set_bytes {
            return Err(indivisible());
        }
        Ok(())
    }
}

/// A cache line and its replacement metadata
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Line {
    pub valid: bool,
    pub tag: u64,
    /// Clock value of the latest hit or fill
    pub last_access: u64,
    /// Clock value of the fill, untouched by hits
    pub inserted: u64,
    /// 1 on fill, incremented on every hit
    pub ref_count: u64,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CacheHistory {
    pub num_hit: u64,
    pub num_miss: u64,
    pub num_read: u64,
    pub num_write: u64,
}

/// Zeroed line storage for a validated configuration
fn allocate_lines(config: &CacheConfig) -> Result<Vec<Line>, ConfigError> {
    let too_large = || ConfigError::TooLarge {
        name: config.name.clone(),
        num_lines: config.total_size / config.block_size,
    };
    let num_lines = usize::try_from(config.total_size / config.block_size)
        .map_err(|_| too_large())?;
    let mut lines = Vec::new();
    lines.try_reserve_exact(num_lines).map_err(|_| too_large())?;
    lines.resize(num_lines, Line::default());
    Ok(lines)
}

/// One cache level.
/// Lines are stored flat; set `i` owns `lines[i * associativity..(i + 1) * associativity]`
#[derive(Clone, Debug)]
pub struct Cache {
    config: CacheConfig,
    layout: AddressLayout,
    history: CacheHistory,
    policy: Policy,
    lines: Vec<Line>,
    /// Logical time, advanced once per access
    clock: u64,
}

impl Cache {
    pub fn make(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let num_sets = config.num_sets();
        let layout = AddressLayout::make(config.block_size, num_sets);
        let lines = allocate_lines(&config)?;
        let policy = Policy::make(config.replacement_policy, config.seed);
        log::debug!(
            "{}: {} bytes, {} sets x {} ways x {} bytes, {} replacement",
            config.name,
            config.total_size,
            num_sets,
            config.associativity,
            config.block_size,
            config.replacement_policy
        );

        Ok(Self {
            config,
            layout,
            history: CacheHistory::default(),
            policy,
            lines,
            clock: 0,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn layout(&self) -> &AddressLayout {
        &self.layout
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn hit_latency(&self) -> u32 {
        self.config.hit_latency
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    fn associativity(&self) -> usize {
        self.config.associativity as usize
    }

    fn set_bounds(&self, index: u64) -> (usize, usize) {
        let begin = index as usize * self.associativity();
        (begin, begin + self.associativity())
    }

    /// The lines of the set with the given index
    pub fn set(&self, index: u64) -> &[Line] {
        let (begin, end) = self.set_bounds(index);
        &self.lines[begin..end]
    }

    /// Return the line index (within its set) holding the address
    pub fn lookup(&self, address: u64) -> Option<usize> {
        let decoded = self.layout.decode(address);
        self.set(decoded.index)
            .iter()
            .position(|line| line.valid && line.tag == decoded.tag)
    }

    pub fn contains(&self, address: u64) -> bool {
        self.lookup(address).is_some()
    }

    /// Access the cache, allocating the block on a miss
    pub fn access(&mut self, address: u64) -> AccessOutcome {
        self.clock += 1;
        let now = self.clock;
        let decoded = self.layout.decode(address);
        let (begin, end) = self.set_bounds(decoded.index);

        if let Some(way) = self.lookup(address) {
            self.history.num_hit += 1;
            let line = &mut self.lines[begin + way];
            line.last_access = now;
            line.ref_count += 1;
            return AccessOutcome::Hit;
        }

        self.history.num_miss += 1;
        let set = &self.lines[begin..end];
        // Empty slots are used before the policy is consulted
        let way = match set.iter().position(|line| !line.valid) {
            Some(way) => way,
            None => {
                let victim = self.policy.select_victim(set);
                log::trace!(
                    "{}: evict tag {:#x} from set {}",
                    self.config.name,
                    set[victim].tag,
                    decoded.index
                );
                victim
            }
        };
        self.lines[begin + way] = Line {
            valid: true,
            tag: decoded.tag,
            last_access: now,
            inserted: now,
            ref_count: 1,
        };
        AccessOutcome::Miss
    }

    /// Like [`Cache::access`], additionally counting the operation type
    pub fn access_record(&mut self, record: &AccessRecord) -> AccessOutcome {
        match record.access_type {
            AccessType::Read => self.history.num_read += 1,
            AccessType::Write => self.history.num_write += 1,
        }
        self.access(record.address)
    }

    /// Invalidate every line, keeping the statistics
    pub fn flush(&mut self) {
        self.lines.fill(Line::default());
    }

    /// Invalidate every line and clear the statistics
    pub fn reset(&mut self) {
        self.flush();
        self.history = CacheHistory::default();
        self.clock = 0;
    }

    pub fn history(&self) -> CacheHistory {
        self.history
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            name: self.config.name.clone(),
            hits: self.history.num_hit,
            misses: self.history.num_miss,
            reads: self.history.num_read,
            writes: self.history.num_write,
            hit_latency: self.config.hit_latency,
        }
    }
}
