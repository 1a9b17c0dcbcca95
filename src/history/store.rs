use std::collections::HashMap;

use super::format::HistoryRecord;

pub const MAX_DELTA: u32 = 5;
pub const MAX_DELTA_FALLOFF: f64 = 0.95;

/// Largest delta an item at `index` may carry. Shrinks geometrically with rank.
pub fn max_delta(index: usize) -> u32 {
    let exponent = i32::try_from(index).unwrap_or(i32::MAX);
    (f64::from(MAX_DELTA) * MAX_DELTA_FALLOFF.powi(exponent)).floor() as u32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    action_name: String,
    index: usize,
    delta: u32,
}

impl HistoryItem {
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Rank in the history, 0 being the most used action.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Activation credit over the next ranked item.
    pub fn delta(&self) -> u32 {
        self.delta
    }
}

type NodeId = usize;

#[derive(Debug)]
struct Node {
    item: HistoryItem,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// Ranked action history: an arena-backed doubly-linked list plus a
/// name index, so relinking any item is O(1) and never invalidates lookups.
#[derive(Debug, Default)]
pub struct HistoryStore {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    by_name: HashMap<String, NodeId>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn contains(&self, action_name: &str) -> bool {
        self.by_name.contains_key(action_name)
    }

    pub fn get(&self, action_name: &str) -> Option<&HistoryItem> {
        self.by_name
            .get(action_name)
            .map(|&id| &self.node(id).item)
    }

    /// Items in rank order, most used first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.by_name.clear();
    }

    /// Evicts lowest ranked items until at most `max_len` remain.
    pub fn truncate(&mut self, max_len: usize) {
        while self.len() > max_len {
            self.pop_back();
        }
    }

    /// Counts one activation of `action_name`, adding it at the tail when new
    /// and promoting it past exhausted predecessors.
    ///
    /// Exclusion and the disabled (`max_len == 0`) case are the caller's
    /// concern.
    pub fn record(&mut self, action_name: &str, max_len: usize) {
        if max_len == 0 {
            return;
        }
        self.truncate(max_len);

        let existing = self.by_name.get(action_name).copied();
        let id = match existing {
            Some(id) => id,
            None => {
                if self.len() == max_len {
                    self.pop_back();
                }
                self.push_back(action_name.to_string(), 0)
            }
        };

        if self.node(id).item.index > 0 {
            self.promote(id);
        }

        let item = &mut self.node_mut(id).item;
        if item.delta < max_delta(item.index) {
            item.delta += 1;
        }
    }

    fn promote(&mut self, id: NodeId) {
        let Some(first_prev) = self.node(id).prev else {
            return;
        };

        if self.node(first_prev).item.delta == 0 {
            let mut anchor = Some(first_prev);
            while let Some(prev) = anchor {
                if self.node(prev).item.delta > 0 {
                    break;
                }
                let carried = self.node(id).item.delta;
                {
                    let prev_item = &mut self.node_mut(prev).item;
                    prev_item.index += 1;
                    prev_item.delta = carried;
                }
                let item = &mut self.node_mut(id).item;
                item.index -= 1;
                item.delta = 0;
                anchor = self.node(prev).prev;
            }

            self.unlink(id);
            match anchor {
                Some(anchor) => self.link_after(anchor, id),
                None => self.link_front(id),
            }
        }

        if self.node(id).item.index > 0 {
            if let Some(prev) = self.node(id).prev {
                let prev_item = &mut self.node_mut(prev).item;
                prev_item.delta = prev_item.delta.saturating_sub(1);
            }
        }
    }

    /// Appends persisted records in order, skipping names already present or
    /// rejected by `is_excluded`. Stops once `max_items` records were taken.
    /// Returns how many records were added.
    pub fn load_records<I, F>(&mut self, records: I, max_items: usize, is_excluded: F) -> usize
    where
        I: IntoIterator<Item = HistoryRecord>,
        F: Fn(&str) -> bool,
    {
        let mut loaded = 0;
        for record in records {
            if loaded >= max_items {
                break;
            }
            if is_excluded(&record.action_name) || self.contains(&record.action_name) {
                tracing::debug!(action = %record.action_name, "skipping action history record");
                continue;
            }
            let index = self.len();
            let delta = record.delta.clamp(0, i64::from(max_delta(index)));
            let delta = u32::try_from(delta).unwrap_or(0);
            self.push_back(record.action_name, delta);
            loaded += 1;
        }
        loaded
    }

    fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id) {
            Some(Some(node)) => node,
            _ => unreachable!("history node {id} is not live"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id) {
            Some(Some(node)) => node,
            _ => unreachable!("history node {id} is not live"),
        }
    }

    fn push_back(&mut self, action_name: String, delta: u32) -> NodeId {
        let node = Node {
            item: HistoryItem {
                action_name: action_name.clone(),
                index: self.len(),
                delta: delta.min(max_delta(self.len())),
            },
            prev: self.tail,
            next: None,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.by_name.insert(action_name, id);
        id
    }

    fn pop_back(&mut self) -> Option<HistoryItem> {
        let id = self.tail?;
        self.unlink(id);
        let node = self.nodes[id].take()?;
        self.free.push(id);
        self.by_name.remove(&node.item.action_name);
        tracing::trace!(action = %node.item.action_name, "evicted from action history");
        Some(node.item)
    }

    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(id);
        node.prev = None;
        node.next = None;
    }

    fn link_after(&mut self, anchor: NodeId, id: NodeId) {
        let next = self.node(anchor).next;
        {
            let node = self.node_mut(id);
            node.prev = Some(anchor);
            node.next = next;
        }
        self.node_mut(anchor).next = Some(id);
        match next {
            Some(next) => self.node_mut(next).prev = Some(id),
            None => self.tail = Some(id),
        }
    }

    fn link_front(&mut self, id: NodeId) {
        let head = self.head;
        {
            let node = self.node_mut(id);
            node.prev = None;
            node.next = head;
        }
        match head {
            Some(head) => self.node_mut(head).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }
}

pub struct Iter<'a> {
    store: &'a HistoryStore,
    cursor: Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a HistoryItem;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.store.node(self.cursor?);
        self.cursor = node.next;
        Some(&node.item)
    }
}

impl<'a> IntoIterator for &'a HistoryStore {
    type Item = &'a HistoryItem;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::format::{parse_records, write_records};

    fn snapshot(store: &HistoryStore) -> Vec<(String, usize, u32)> {
        store
            .iter()
            .map(|item| (item.action_name().to_string(), item.index(), item.delta()))
            .collect()
    }

    fn names(store: &HistoryStore) -> Vec<&str> {
        store.iter().map(HistoryItem::action_name).collect()
    }

    fn assert_invariants(store: &HistoryStore, max_len: usize) {
        assert!(store.len() <= max_len, "store grew past {max_len}");
        let items: Vec<_> = store.iter().collect();
        assert_eq!(items.len(), store.len());
        for (position, item) in items.iter().enumerate() {
            assert_eq!(item.index(), position, "index gap at {}", item.action_name());
            assert!(
                item.delta() <= max_delta(item.index()),
                "{} delta {} over cap {}",
                item.action_name(),
                item.delta(),
                max_delta(item.index())
            );
            assert_eq!(store.get(item.action_name()), Some(*item));
        }
    }

    /// xorshift, enough to drive activation sequences reproducibly.
    struct Sequence(u64);

    impl Sequence {
        fn next(&mut self, bound: usize) -> usize {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 % bound as u64) as usize
        }
    }

    #[test]
    fn max_delta_falls_off_geometrically() {
        assert_eq!(max_delta(0), 5);
        assert_eq!(max_delta(1), 4);
        assert_eq!(max_delta(2), 4);
        assert_eq!(max_delta(5), 3);
        assert_eq!(max_delta(31), 1);
        assert_eq!(max_delta(32), 0);
        assert_eq!(max_delta(usize::MAX), 0);
        for index in 0..200 {
            assert!(max_delta(index + 1) <= max_delta(index));
        }
    }

    #[test]
    fn first_activation_inserts_at_tail_and_earns_credit() {
        let mut store = HistoryStore::new();
        store.record("a", 10);
        store.record("b", 10);
        store.record("c", 10);

        assert_eq!(
            snapshot(&store),
            vec![
                ("a".to_string(), 0, 0),
                ("b".to_string(), 1, 0),
                ("c".to_string(), 2, 1),
            ]
        );
    }

    #[test]
    fn capacity_three_evicts_tail_before_inserting() {
        let mut store = HistoryStore::new();
        for name in ["a", "b", "c", "d"] {
            store.record(name, 3);
        }

        assert_eq!(
            snapshot(&store),
            vec![
                ("d".to_string(), 0, 1),
                ("a".to_string(), 1, 0),
                ("b".to_string(), 2, 0),
            ]
        );
        assert!(!store.contains("c"));
    }

    #[test]
    fn repeated_activation_overtakes_single_use() {
        let mut store = HistoryStore::new();
        store.record("a", 10);
        for _ in 0..10 {
            store.record("b", 10);
        }

        assert_eq!(names(&store), vec!["b", "a"]);
        assert_eq!(store.get("b").map(HistoryItem::index), Some(0));
        assert_eq!(store.get("b").map(HistoryItem::delta), Some(max_delta(0)));
        assert_eq!(store.get("a").map(HistoryItem::index), Some(1));
        assert_invariants(&store, 10);
    }

    #[test]
    fn promotion_stops_behind_predecessor_with_credit() {
        let mut store = HistoryStore::new();
        store.record("a", 10);
        store.record("a", 10);
        store.record("b", 10);
        store.record("c", 10);
        // a(0,1) b(1,0) c(2,1)
        store.record("c", 10);

        assert_eq!(
            snapshot(&store),
            vec![
                ("a".to_string(), 0, 0),
                ("c".to_string(), 1, 1),
                ("b".to_string(), 2, 1),
            ]
        );
        assert_invariants(&store, 10);
    }

    #[test]
    fn shrinking_capacity_trims_on_next_activation() {
        let mut store = HistoryStore::new();
        for name in ["a", "b", "c", "d", "e"] {
            store.record(name, 10);
        }
        store.record("a", 2);

        assert_eq!(store.len(), 2);
        assert!(store.contains("a"));
        assert_invariants(&store, 2);
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut store = HistoryStore::new();
        store.record("a", 0);
        assert!(store.is_empty());
    }

    #[test]
    fn random_activations_preserve_rank_and_delta_invariants() {
        let pool: Vec<String> = (0..40).map(|i| format!("action-{i}")).collect();
        for (seed, max_len) in [(0x9e37_79b9_u64, 8usize), (0xdead_beef, 25), (42, 60)] {
            let mut store = HistoryStore::new();
            let mut sequence = Sequence(seed);
            for _ in 0..2_000 {
                // Skew towards low ids so some actions become hot.
                let pick = sequence.next(pool.len()).min(sequence.next(pool.len()));
                store.record(&pool[pick], max_len);
                assert_invariants(&store, max_len);
            }
        }
    }

    #[test]
    fn repeated_activation_moves_forward_monotonically_to_front() {
        let mut store = HistoryStore::new();
        let mut sequence = Sequence(7);
        for _ in 0..500 {
            let name = format!("warm-{}", sequence.next(20));
            store.record(&name, 30);
        }
        store.record("target", 30);
        let mut last_index = store.get("target").map(HistoryItem::index).unwrap_or(0);

        let mut calls = 0;
        while last_index > 0 {
            store.record("target", 30);
            calls += 1;
            let index = store.get("target").map(HistoryItem::index).unwrap_or(usize::MAX);
            assert!(index <= last_index, "target moved backwards");
            last_index = index;
            assert!(calls < 30 * (MAX_DELTA as usize + 2), "target never reached the front");
        }
        assert_invariants(&store, 30);
    }

    #[test]
    fn written_history_reloads_identically_for_random_activations() {
        let pool: Vec<String> = (0..30).map(|i| format!("action-{i}")).collect();
        let runs = [(1_u64, 5usize), (0x5eed, 12), (0xfeed_face, 29), (99, 100)];
        for (seed, max_len) in runs {
            let mut store = HistoryStore::new();
            let mut sequence = Sequence(seed);
            for _ in 0..1_500 {
                let pick = sequence.next(pool.len()).min(sequence.next(pool.len()));
                store.record(&pool[pick], max_len);
            }
            if max_len <= pool.len() / 2 {
                assert_eq!(store.len(), max_len, "seed {seed:#x} should have evicted");
            }

            let text = write_records(store.iter().map(|item| (item.action_name(), item.delta())));
            let mut reloaded = HistoryStore::new();
            let loaded = reloaded.load_records(parse_records(&text), max_len, |_| false);

            assert_eq!(loaded, store.len(), "seed {seed:#x}");
            assert_eq!(snapshot(&reloaded), snapshot(&store), "seed {seed:#x}");
            assert_invariants(&reloaded, max_len);
        }
    }

    #[test]
    fn load_records_clamps_deltas_and_skips_duplicates_and_exclusions() {
        let records = vec![
            HistoryRecord { action_name: "a".into(), delta: 99 },
            HistoryRecord { action_name: "edit-undo".into(), delta: 1 },
            HistoryRecord { action_name: "b".into(), delta: -3 },
            HistoryRecord { action_name: "a".into(), delta: 2 },
            HistoryRecord { action_name: "c".into(), delta: 2 },
            HistoryRecord { action_name: "d".into(), delta: 1 },
        ];
        let mut store = HistoryStore::new();
        let loaded = store.load_records(records, 3, |name| name == "edit-undo");

        assert_eq!(loaded, 3);
        assert_eq!(
            snapshot(&store),
            vec![
                ("a".to_string(), 0, 5),
                ("b".to_string(), 1, 0),
                ("c".to_string(), 2, 2),
            ]
        );
    }

    #[test]
    fn clear_empties_items_and_lookups() {
        let mut store = HistoryStore::new();
        store.record("a", 5);
        store.record("b", 5);
        store.clear();

        assert!(store.is_empty());
        assert!(store.get("a").is_none());
        assert_eq!(store.iter().count(), 0);

        store.record("c", 5);
        assert_eq!(snapshot(&store), vec![("c".to_string(), 0, 1)]);
    }
}
