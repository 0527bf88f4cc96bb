//! Memory structure

pub mod cache;
pub mod hierarchy;
pub mod replacement;
pub mod stats;

pub use cache::{AddressLayout, Cache, CacheConfig};
pub use hierarchy::{CacheHierarchy, HierarchyAccess, HierarchyConfig, ServedBy};
pub use replacement::PolicyKind;
pub use stats::{CacheStats, HierarchyStats};

/// Only counted; writes never mark lines dirty
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccessType {
    #[default]
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessOutcome {
    Hit,
    Miss,
}

impl AccessOutcome {
    pub fn is_hit(&self) -> bool {
        *self == AccessOutcome::Hit
    }
}
