//! Keyed disjoint-set forest.
//!
//! Keys are interned to dense indices on first sight. `union` halves paths
//! as it walks them and links by size, so lookups and merges stay close to
//! constant amortized cost on large inputs.

use std::collections::HashMap;
use std::hash::Hash;

/// Identifies a live set. Only meaningful until the next merge that absorbs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterHandle(usize);

impl ClusterHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Result of a `union` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Union {
    Merged {
        survivor: ClusterHandle,
        absorbed: ClusterHandle,
        /// Size of the surviving set after the merge.
        size: usize,
    },
    AlreadyJoined(ClusterHandle),
}

impl Union {
    /// Handle of the set both keys belong to afterwards.
    pub fn handle(self) -> ClusterHandle {
        match self {
            Self::Merged { survivor, .. } => survivor,
            Self::AlreadyJoined(h) => h,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisjointSet<K> {
    index: HashMap<K, usize>,
    keys: Vec<K>,
    parent: Vec<usize>,
    size: Vec<usize>,
    sets: usize,
}

impl<K> Default for DisjointSet<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            keys: Vec::new(),
            parent: Vec::new(),
            size: Vec::new(),
            sets: 0,
        }
    }
}

impl<K: Clone + Eq + Hash> DisjointSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys seen.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of disjoint sets.
    pub fn set_count(&self) -> usize {
        self.sets
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Add `key` as a singleton unless it is already present. Returns the
    /// handle of its set and whether it was newly inserted.
    pub fn insert(&mut self, key: K) -> (ClusterHandle, bool) {
        if let Some(&i) = self.index.get(&key) {
            return (ClusterHandle(self.root_mut(i)), false);
        }
        let i = self.keys.len();
        self.index.insert(key.clone(), i);
        self.keys.push(key);
        self.parent.push(i);
        self.size.push(1);
        self.sets += 1;
        (ClusterHandle(i), true)
    }

    /// Handle of the set containing `key`.
    pub fn find_root(&self, key: &K) -> Option<ClusterHandle> {
        let i = *self.index.get(key)?;
        Some(ClusterHandle(self.root(i)))
    }

    /// Size of the set identified by `handle`.
    pub fn set_size(&self, handle: ClusterHandle) -> usize {
        self.size[self.root(handle.0)]
    }

    /// Merge the sets of `a` and `b`. The larger set survives; on a tie the
    /// set of `a` survives. Returns `None` if either key is unknown.
    pub fn union(&mut self, a: &K, b: &K) -> Option<Union> {
        let ra = self.root_mut(*self.index.get(a)?);
        let rb = self.root_mut(*self.index.get(b)?);
        if ra == rb {
            return Some(Union::AlreadyJoined(ClusterHandle(ra)));
        }

        let (survivor, absorbed) = if self.size[rb] > self.size[ra] {
            (rb, ra)
        } else {
            (ra, rb)
        };
        self.parent[absorbed] = survivor;
        self.size[survivor] += self.size[absorbed];
        self.sets -= 1;

        Some(Union::Merged {
            survivor: ClusterHandle(survivor),
            absorbed: ClusterHandle(absorbed),
            size: self.size[survivor],
        })
    }

    /// Members of every set, grouped by root. Sets appear in the order their
    /// root was first inserted; members in insertion order.
    pub fn groups(&self) -> Vec<(ClusterHandle, Vec<&K>)> {
        let mut slot: HashMap<usize, usize> = HashMap::with_capacity(self.sets);
        let mut out: Vec<(ClusterHandle, Vec<&K>)> = Vec::with_capacity(self.sets);
        for (i, key) in self.keys.iter().enumerate() {
            let root = self.root(i);
            let pos = *slot.entry(root).or_insert_with(|| {
                out.push((ClusterHandle(root), Vec::with_capacity(self.size[root])));
                out.len() - 1
            });
            out[pos].1.push(key);
        }
        debug_assert_eq!(out.len(), self.sets, "set count out of sync with forest");
        out
    }

    fn root(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }

    // Path halving: every visited node is pointed at its grandparent.
    fn root_mut(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            let grand = self.parent[self.parent[i]];
            self.parent[i] = grand;
            i = grand;
        }
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut ds = DisjointSet::new();
        let (h1, new1) = ds.insert(10u32);
        let (h2, new2) = ds.insert(10u32);
        assert!(new1);
        assert!(!new2);
        assert_eq!(h1, h2);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.set_count(), 1);
    }

    #[test]
    fn test_find_unknown() {
        let mut ds: DisjointSet<u32> = DisjointSet::new();
        assert!(ds.find_root(&1).is_none());
        assert!(ds.union(&1, &2).is_none());
    }

    #[test]
    fn test_union_tie_keeps_first_argument() {
        let mut ds = DisjointSet::new();
        let (ha, _) = ds.insert("a");
        let (hb, _) = ds.insert("b");
        let result = ds.union(&"a", &"b").unwrap();
        assert_eq!(
            result,
            Union::Merged {
                survivor: ha,
                absorbed: hb,
                size: 2
            }
        );
        assert_eq!(ds.find_root(&"b"), Some(ha));
        assert_eq!(ds.set_count(), 1);
    }

    #[test]
    fn test_union_larger_set_survives() {
        let mut ds = DisjointSet::new();
        for k in ["a", "b", "c", "d"] {
            ds.insert(k);
        }
        ds.union(&"c", &"d");
        let hc = ds.find_root(&"c").unwrap();
        // {a} is smaller than {c, d}, so c's root survives even though a is first.
        match ds.union(&"a", &"c").unwrap() {
            Union::Merged { survivor, size, .. } => {
                assert_eq!(survivor, hc);
                assert_eq!(size, 3);
            }
            other => panic!("expected merge, got {other:?}"),
        }
    }

    #[test]
    fn test_union_already_joined() {
        let mut ds = DisjointSet::new();
        ds.insert(1u8);
        ds.insert(2u8);
        ds.union(&1, &2);
        let h = ds.find_root(&1).unwrap();
        assert_eq!(ds.union(&2, &1), Some(Union::AlreadyJoined(h)));
        assert_eq!(ds.set_count(), 1);
    }

    #[test]
    fn test_groups_cover_all_keys() {
        let mut ds = DisjointSet::new();
        for k in 0..10u32 {
            ds.insert(k);
        }
        for k in (0..10u32).step_by(2).skip(1) {
            ds.union(&0, &k);
        }
        let groups = ds.groups();
        assert_eq!(groups.len(), ds.set_count());
        assert_eq!(groups.len(), 6);
        let total: usize = groups.iter().map(|(_, m)| m.len()).sum();
        assert_eq!(total, 10);
        let evens = groups.iter().find(|(_, m)| m.contains(&&0)).unwrap();
        assert_eq!(evens.1.len(), 5);
        assert_eq!(ds.set_size(evens.0), 5);
    }

    #[test]
    fn test_long_chain_single_root() {
        let mut ds = DisjointSet::new();
        for k in 0..1000u32 {
            ds.insert(k);
            if k > 0 {
                ds.union(&k, &(k - 1));
            }
        }
        let root = ds.find_root(&0).unwrap();
        for k in 0..1000u32 {
            assert_eq!(ds.find_root(&k), Some(root));
        }
        assert_eq!(ds.set_count(), 1);
        assert_eq!(ds.set_size(root), 1000);
    }
}
