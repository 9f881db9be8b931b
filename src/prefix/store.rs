//! Per-model prefix index store.
//!
//! Maps chained block fingerprints to the pods observed to hold the
//! corresponding cached prefix. Sharded by model: every insert and lookup
//! touches exactly one model's shard, so capacity pressure on a hot model
//! never blocks scoring for the others, and cross-model lookups can never
//! succeed by construction.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

use crate::config::PrefixStoreConfig;
use crate::pod::PodRef;
use crate::telemetry;

/// One fingerprint node: the pods known to hold this chain prefix.
///
/// The chained fingerprint already encodes the model seed and every
/// preceding block, so a flat node per fingerprint answers prefix queries
/// without a trie. Parent links and child counts are kept so eviction can
/// prefer leaves: removing an interior node would orphan its tail, since a
/// lookup stops at the first missing link.
struct Node {
    /// Pods ordered least-recently-associated first; bounded by
    /// `max_pods_per_entry`.
    pods: Vec<PodRef>,
    parent: Option<u64>,
    children: usize,
    access_id: u64,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.children == 0
    }
}

/// All index state for one model.
struct ModelShard {
    nodes: HashMap<u64, Node>,
    /// Lazy LRU queue of `(fingerprint, access_id)` leaf candidates. A node
    /// touched again gets a fresh pair pushed; stale pairs and pairs for
    /// nodes that have since grown children are skipped at eviction time.
    lru: VecDeque<(u64, u64)>,
    access_counter: u64,
}

impl ModelShard {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            lru: VecDeque::new(),
            access_counter: 0,
        }
    }

    fn next_access_id(&mut self) -> u64 {
        self.access_counter = self.access_counter.wrapping_add(1);
        self.access_counter
    }

    /// Refresh a node's recency stamp.
    fn touch(&mut self, fingerprint: u64) {
        let id = self.next_access_id();
        if let Some(node) = self.nodes.get_mut(&fingerprint) {
            node.access_id = id;
            if node.is_leaf() {
                self.lru.push_back((fingerprint, id));
            }
        }
    }

    /// Record `pod` under `fingerprint`, creating the node if needed and
    /// capping pod fan-out at `max_pods`. `parent` is the preceding link of
    /// the chain, `None` for the first block.
    fn record(&mut self, fingerprint: u64, parent: Option<u64>, pod: &PodRef, max_pods: usize) {
        let id = self.next_access_id();
        if !self.nodes.contains_key(&fingerprint) {
            if let Some(parent_fp) = parent {
                if let Some(parent_node) = self.nodes.get_mut(&parent_fp) {
                    parent_node.children += 1;
                }
            }
            self.nodes.insert(
                fingerprint,
                Node {
                    pods: Vec::new(),
                    parent,
                    children: 0,
                    access_id: id,
                },
            );
        }
        let node = match self.nodes.get_mut(&fingerprint) {
            Some(node) => node,
            None => return,
        };
        node.access_id = id;
        if let Some(pos) = node.pods.iter().position(|p| p == pod) {
            // Re-associating moves the pod to most-recent.
            let existing = node.pods.remove(pos);
            node.pods.push(existing);
        } else {
            if node.pods.len() >= max_pods {
                node.pods.remove(0);
            }
            node.pods.push(pod.clone());
        }
        if node.is_leaf() {
            self.lru.push_back((fingerprint, id));
        }
    }

    /// Evict least-recently-used leaf nodes until within `max_entries`.
    ///
    /// Only leaves are victims; an interior node becomes eligible once its
    /// last child is gone and it rejoins the queue.
    fn evict_to_capacity(&mut self, max_entries: usize) -> usize {
        let mut evicted = 0;
        while self.nodes.len() > max_entries {
            let Some((fingerprint, id)) = self.lru.pop_front() else {
                break;
            };
            match self.nodes.get(&fingerprint) {
                // Stale queue entry: the node was touched since, or has
                // grown children and is no longer a leaf.
                Some(node) if node.access_id != id || !node.is_leaf() => continue,
                Some(_) => {}
                None => continue,
            }
            let Some(node) = self.nodes.remove(&fingerprint) else {
                continue;
            };
            evicted += 1;
            if let Some(parent_fp) = node.parent {
                if let Some(parent) = self.nodes.get_mut(&parent_fp) {
                    parent.children = parent.children.saturating_sub(1);
                    if parent.is_leaf() {
                        // The parent's stamp predates its evicted child's,
                        // so it rejoins at the old end of the queue.
                        let pair = (parent_fp, parent.access_id);
                        self.lru.push_front(pair);
                    }
                }
            }
        }
        evicted
    }

    /// Drop stale queue pairs once the queue dwarfs the node count, so the
    /// lazy LRU bookkeeping stays bounded under touch-heavy traffic.
    fn compact_lru(&mut self) {
        if self.lru.len() <= self.nodes.len().saturating_mul(4).max(64) {
            return;
        }
        let nodes = &self.nodes;
        self.lru.retain(|(fingerprint, id)| {
            nodes
                .get(fingerprint)
                .is_some_and(|n| n.access_id == *id && n.is_leaf())
        });
    }
}

/// Concurrent, capacity-bounded prefix index, isolated per model.
///
/// `add` and `lookup` may race freely from many threads; a lookup racing an
/// in-flight add may or may not observe the new entry, which is the ordinary
/// read-after-write slack of a cache.
pub struct ModelPrefixStore {
    shards: DashMap<String, Arc<Mutex<ModelShard>>>,
    config: PrefixStoreConfig,
}

impl ModelPrefixStore {
    pub fn new(config: PrefixStoreConfig) -> Self {
        Self {
            shards: DashMap::new(),
            config,
        }
    }

    fn shard(&self, model: &str) -> Arc<Mutex<ModelShard>> {
        if let Some(shard) = self.shards.get(model) {
            return shard.value().clone();
        }
        self.shards
            .entry(model.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ModelShard::new())))
            .value()
            .clone()
    }

    /// Record that `pod` holds cache state for every prefix of
    /// `fingerprints`. Eviction runs synchronously within the model's shard
    /// when a bound is exceeded.
    pub fn add(&self, model: &str, fingerprints: &[u64], pod: &PodRef) {
        if fingerprints.is_empty() {
            return;
        }
        let shard = self.shard(model);
        let mut shard = shard.lock();
        let mut parent = None;
        for &fingerprint in fingerprints {
            shard.record(fingerprint, parent, pod, self.config.max_pods_per_entry);
            parent = Some(fingerprint);
        }
        let evicted = shard.evict_to_capacity(self.config.max_entries_per_model);
        shard.compact_lru();
        if evicted > 0 {
            trace!(model, evicted, "evicted prefix nodes at capacity");
            telemetry::record_store_eviction(evicted);
        }
        telemetry::record_store_size(model, shard.nodes.len());
    }

    /// Longest-prefix match depth per candidate pod.
    ///
    /// Walks the fingerprint chain in order and stops at the first node the
    /// model's index does not hold; a pod's depth is the count of leading
    /// nodes that record it. Every candidate appears in the result, at depth
    /// 0 when nothing matches.
    pub fn lookup(
        &self,
        model: &str,
        fingerprints: &[u64],
        pods: &[PodRef],
    ) -> HashMap<PodRef, usize> {
        let mut depths: HashMap<PodRef, usize> =
            pods.iter().map(|pod| (pod.clone(), 0)).collect();
        if fingerprints.is_empty() || pods.is_empty() {
            return depths;
        }
        let Some(shard) = self.shards.get(model).map(|s| s.value().clone()) else {
            return depths;
        };
        let mut shard = shard.lock();

        let mut alive: Vec<&PodRef> = pods.iter().collect();
        for &fingerprint in fingerprints {
            match shard.nodes.get(&fingerprint) {
                Some(node) => alive.retain(|pod| node.pods.contains(*pod)),
                // Chain break: nothing deeper can match for any pod.
                None => break,
            }
            shard.touch(fingerprint);
            if alive.is_empty() {
                break;
            }
            for pod in &alive {
                if let Some(depth) = depths.get_mut(*pod) {
                    *depth += 1;
                }
            }
        }
        // Touches queue fresh recency pairs; without compaction here a
        // read-heavy shard that never sees an add grows its queue forever.
        shard.compact_lru();
        depths
    }

    /// Number of fingerprint nodes currently tracked for `model`.
    pub fn node_count(&self, model: &str) -> usize {
        self.shards
            .get(model)
            .map(|shard| shard.lock().nodes.len())
            .unwrap_or(0)
    }

    /// True when no entries are tracked for `model`.
    pub fn is_empty(&self, model: &str) -> bool {
        self.node_count(model) == 0
    }

    #[cfg(test)]
    fn lru_len(&self, model: &str) -> usize {
        self.shards
            .get(model)
            .map(|shard| shard.lock().lru.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(max_entries: usize, max_pods: usize) -> ModelPrefixStore {
        ModelPrefixStore::new(PrefixStoreConfig {
            max_entries_per_model: max_entries,
            max_pods_per_entry: max_pods,
        })
    }

    fn pod(name: &str) -> PodRef {
        PodRef::new("ns1", name)
    }

    #[test]
    fn add_then_lookup_returns_full_depth() {
        let store = store(100, 5);
        let p = pod("pod1");
        let seq = [11, 22, 33];
        store.add("m", &seq, &p);
        let depths = store.lookup("m", &seq, std::slice::from_ref(&p));
        assert_eq!(depths[&p], 3);
    }

    #[test]
    fn partial_overlap_reports_partial_depth() {
        let store = store(100, 5);
        let p = pod("pod1");
        store.add("m", &[11, 22], &p);
        let depths = store.lookup("m", &[11, 22, 33, 44], std::slice::from_ref(&p));
        assert_eq!(depths[&p], 2);
    }

    #[test]
    fn models_are_isolated() {
        let store = store(100, 5);
        let p = pod("pod1");
        store.add("model-a", &[11, 22], &p);
        let depths = store.lookup("model-b", &[11, 22], std::slice::from_ref(&p));
        assert_eq!(depths[&p], 0);
        assert!(store.is_empty("model-b"));
    }

    #[test]
    fn unknown_pod_scores_zero_but_is_present() {
        let store = store(100, 5);
        let known = pod("known");
        let unknown = pod("unknown");
        store.add("m", &[11], &known);
        let depths = store.lookup("m", &[11], &[known.clone(), unknown.clone()]);
        assert_eq!(depths[&known], 1);
        assert_eq!(depths[&unknown], 0);
        assert_eq!(depths.len(), 2);
    }

    #[test]
    fn node_capacity_evicts_lru() {
        let store = store(2, 5);
        let p = pod("pod1");
        store.add("m", &[1], &p);
        store.add("m", &[2], &p);
        // Touch node 1 so node 2 is the LRU victim.
        store.lookup("m", &[1], std::slice::from_ref(&p));
        store.add("m", &[3], &p);
        assert_eq!(store.node_count("m"), 2);
        assert_eq!(store.lookup("m", &[1], std::slice::from_ref(&p))[&p], 1);
        assert_eq!(store.lookup("m", &[2], std::slice::from_ref(&p))[&p], 0);
    }

    #[test]
    fn pod_fanout_evicts_least_recently_associated() {
        let store = store(100, 2);
        let first = pod("first");
        let second = pod("second");
        let third = pod("third");
        store.add("m", &[7], &first);
        store.add("m", &[7], &second);
        store.add("m", &[7], &third);
        let candidates = [first.clone(), second.clone(), third.clone()];
        let depths = store.lookup("m", &[7], &candidates);
        assert_eq!(depths[&first], 0);
        assert_eq!(depths[&second], 1);
        assert_eq!(depths[&third], 1);
    }

    #[test]
    fn lookup_only_traffic_keeps_lru_bookkeeping_bounded() {
        let store = store(100, 5);
        let p = pod("pod1");
        let seq = [11, 22, 33];
        store.add("m", &seq, &p);

        // A read-heavy shard with no further adds must not accumulate
        // recency pairs without bound.
        for _ in 0..5_000 {
            store.lookup("m", &seq, std::slice::from_ref(&p));
        }
        assert!(store.lru_len("m") <= 64 + seq.len());
        assert_eq!(store.lookup("m", &seq, std::slice::from_ref(&p))[&p], 3);
    }

    #[test]
    fn interior_chain_nodes_outlive_their_tails() {
        let store = store(3, 5);
        let p = pod("pod1");
        store.add("m", &[1, 2, 3], &p);
        // One more node over capacity: the chain's tail goes, never its
        // head, so the surviving prefix stays reachable.
        store.add("m", &[9], &p);

        assert_eq!(store.node_count("m"), 3);
        let depths = store.lookup("m", &[1, 2, 3], std::slice::from_ref(&p));
        assert_eq!(depths[&p], 2);
        assert_eq!(store.lookup("m", &[9], std::slice::from_ref(&p))[&p], 1);
    }

    #[test]
    fn evicting_a_tail_makes_its_parent_the_next_victim() {
        let store = store(2, 5);
        let p = pod("pod1");
        store.add("m", &[1, 2], &p);
        store.add("m", &[8], &p);
        store.add("m", &[9], &p);

        // Tail 2 went first, then head 1 once it became a leaf.
        assert_eq!(store.node_count("m"), 2);
        assert_eq!(store.lookup("m", &[1, 2], std::slice::from_ref(&p))[&p], 0);
        assert_eq!(store.lookup("m", &[8], std::slice::from_ref(&p))[&p], 1);
        assert_eq!(store.lookup("m", &[9], std::slice::from_ref(&p))[&p], 1);
    }

    #[test]
    fn empty_sequence_is_a_no_op() {
        let store = store(100, 5);
        let p = pod("pod1");
        store.add("m", &[], &p);
        assert!(store.is_empty("m"));
        let depths = store.lookup("m", &[], std::slice::from_ref(&p));
        assert_eq!(depths[&p], 0);
    }
}
