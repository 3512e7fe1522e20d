//! Incremental duplicate clustering.
//!
//! Records must be fed in input order: whether a `not_duplicate` record is a
//! contradiction depends on every `duplicate` record processed before it.
//! Clusters only grow and merge, nothing is ever split or undone.

use std::fmt;
use std::hash::Hash;

use tracing::{debug, info};

use crate::error::DupResult;
use crate::partition::{Cluster, ClusterStats, Clustering};
use crate::record::{Contradiction, RelationRecord};
use crate::union_find::{ClusterHandle, DisjointSet, Union};

/// What a single `process` call did to the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Both ids were new; they now form a cluster of their own.
    Created(ClusterHandle),
    /// One id was new and joined the other's cluster.
    Extended(ClusterHandle),
    /// Two existing clusters were merged.
    Merged {
        survivor: ClusterHandle,
        absorbed: ClusterHandle,
    },
    /// Both ids were already in the same cluster.
    AlreadyJoined(ClusterHandle),
    /// `not_duplicate` record whose ids are in different clusters.
    /// `created` counts ids that were new and got a singleton.
    Separated { created: usize },
    /// `not_duplicate` record whose ids already share a cluster.
    Contradiction(ClusterHandle),
}

pub struct ClusterEngine<K> {
    set: DisjointSet<K>,
    contradictions: Vec<Contradiction<K>>,
    records: usize,
    duplicate_records: usize,
    merges: usize,
}

impl<K> Default for ClusterEngine<K> {
    fn default() -> Self {
        Self {
            set: DisjointSet::default(),
            contradictions: Vec::new(),
            records: 0,
            duplicate_records: 0,
            merges: 0,
        }
    }
}

impl<K> ClusterEngine<K>
where
    K: Clone + Eq + Hash + Ord + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one record to the partition.
    pub fn process(&mut self, record: RelationRecord<K>) -> Outcome {
        self.records += 1;
        if record.label.is_duplicate() {
            self.duplicate_records += 1;
            self.link(record.id_a, record.id_b)
        } else {
            self.separate(record)
        }
    }

    /// Process records in order, stopping at the first error. Records before
    /// the failing one stay applied; the failing one is not. Returns the number
    /// of records processed.
    pub fn ingest<I>(&mut self, records: I) -> DupResult<usize>
    where
        I: IntoIterator<Item = DupResult<RelationRecord<K>>>,
    {
        let mut n = 0;
        for record in records {
            self.process(record?);
            n += 1;
        }
        Ok(n)
    }

    fn link(&mut self, id_a: K, id_b: K) -> Outcome {
        let seen_a = self.set.contains(&id_a);
        let seen_b = self.set.contains(&id_b);

        match (seen_a, seen_b) {
            (false, false) => {
                self.set.insert(id_a.clone());
                self.set.insert(id_b.clone());
                Outcome::Created(self.join(&id_a, &id_b).handle())
            }
            // The new id joins the existing cluster, so the existing id goes
            // first and wins the size tie against a singleton.
            (true, false) => {
                self.set.insert(id_b.clone());
                Outcome::Extended(self.join(&id_a, &id_b).handle())
            }
            (false, true) => {
                self.set.insert(id_a.clone());
                Outcome::Extended(self.join(&id_b, &id_a).handle())
            }
            (true, true) => match self.join(&id_a, &id_b) {
                Union::Merged {
                    survivor,
                    absorbed,
                    size,
                } => {
                    self.merges += 1;
                    debug!(
                        id_a = ?id_a,
                        id_b = ?id_b,
                        survivor = survivor.index(),
                        absorbed = absorbed.index(),
                        size,
                        "merged clusters"
                    );
                    Outcome::Merged { survivor, absorbed }
                }
                Union::AlreadyJoined(h) => Outcome::AlreadyJoined(h),
            },
        }
    }

    fn separate(&mut self, record: RelationRecord<K>) -> Outcome {
        let (ha, new_a) = self.set.insert(record.id_a.clone());
        let (hb, new_b) = self.set.insert(record.id_b.clone());

        if ha != hb {
            return Outcome::Separated {
                created: usize::from(new_a) + usize::from(new_b),
            };
        }

        debug!(
            position = self.records,
            id_a = ?record.id_a,
            id_b = ?record.id_b,
            "contradiction: not_duplicate pair already clustered"
        );
        self.contradictions.push(Contradiction {
            position: self.records,
            id_a: record.id_a,
            id_b: record.id_b,
            text_a: record.text_a,
            text_b: record.text_b,
        });
        Outcome::Contradiction(ha)
    }

    fn join(&mut self, a: &K, b: &K) -> Union {
        self.set
            .union(a, b)
            .expect("invariant: both ids are in the partition before union")
    }

    // --- Queries ---

    /// Handle of the cluster containing `id`. Handles of absorbed clusters go
    /// stale after a merge.
    pub fn cluster_of(&self, id: &K) -> Option<ClusterHandle> {
        self.set.find_root(id)
    }

    pub fn same_cluster(&self, a: &K, b: &K) -> bool {
        match (self.set.find_root(a), self.set.find_root(b)) {
            (Some(ha), Some(hb)) => ha == hb,
            _ => false,
        }
    }

    pub fn contains(&self, id: &K) -> bool {
        self.set.contains(id)
    }

    pub fn id_count(&self) -> usize {
        self.set.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.set.set_count()
    }

    pub fn records_processed(&self) -> usize {
        self.records
    }

    pub fn contradictions(&self) -> &[Contradiction<K>] {
        &self.contradictions
    }

    /// Snapshot of the current partition, ordered by smallest member.
    pub fn clusters(&self) -> Vec<Cluster<K>> {
        let mut clusters: Vec<Cluster<K>> = self
            .set
            .groups()
            .into_iter()
            .map(|(_, members)| Cluster::new(members.into_iter().cloned().collect()))
            .collect();
        clusters.sort_by(|a, b| a.members.first().cmp(&b.members.first()));
        clusters
    }

    pub fn stats(&self) -> ClusterStats {
        self.stats_for(&self.clusters())
    }

    fn stats_for(&self, clusters: &[Cluster<K>]) -> ClusterStats {
        ClusterStats {
            records: self.records,
            duplicate_records: self.duplicate_records,
            not_duplicate_records: self.records - self.duplicate_records,
            ids: self.set.len(),
            clusters: clusters.len(),
            singletons: clusters.iter().filter(|c| c.is_singleton()).count(),
            largest_cluster: clusters.iter().map(Cluster::len).max().unwrap_or(0),
            merges: self.merges,
            contradictions: self.contradictions.len(),
        }
    }

    /// Consume the engine and hand back the final partition and log.
    pub fn finalize(self) -> Clustering<K> {
        let clusters = self.clusters();
        let stats = self.stats_for(&clusters);
        assert_eq!(
            clusters.iter().map(Cluster::len).sum::<usize>(),
            stats.ids,
            "partition does not cover every observed id exactly once"
        );
        info!(
            records = stats.records,
            ids = stats.ids,
            clusters = stats.clusters,
            contradictions = stats.contradictions,
            "clustering finished"
        );
        Clustering {
            clusters,
            contradictions: self.contradictions,
            stats,
        }
    }
}
