use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::Contradiction;

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

/// A set of ids believed to denote the same item. Members are sorted and
/// unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster<K> {
    pub members: Vec<K>,
}

impl<K: Ord> Cluster<K> {
    pub fn new(mut members: Vec<K>) -> Self {
        members.sort();
        members.dedup();
        Self { members }
    }
}

impl<K> Cluster<K> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

impl<K: fmt::Display> fmt::Display for Cluster<K> {
    /// Set literal form: `{1, 2, 3}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, id) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("}")
    }
}

// ---------------------------------------------------------------------------
// ClusterStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub records: usize,
    pub duplicate_records: usize,
    pub not_duplicate_records: usize,
    pub ids: usize,
    pub clusters: usize,
    pub singletons: usize,
    pub largest_cluster: usize,
    pub merges: usize,
    pub contradictions: usize,
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

/// Final, read-only result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clustering<K> {
    /// Ordered by smallest member.
    pub clusters: Vec<Cluster<K>>,
    /// In input order.
    pub contradictions: Vec<Contradiction<K>>,
    pub stats: ClusterStats,
}

impl<K: Ord> Clustering<K> {
    /// The cluster containing `id`, if it was ever seen.
    pub fn cluster_containing(&self, id: &K) -> Option<&Cluster<K>> {
        self.clusters
            .iter()
            .find(|c| c.members.binary_search(id).is_ok())
    }
}
