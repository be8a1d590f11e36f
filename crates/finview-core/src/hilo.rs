// File: crates/finview-core/src/hilo.rs
// Summary: Hi-lo query cache: bounded LRU (arena linked list + hash map) over integer row ranges.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use crate::table::Table;
use crate::types::HiLo;

const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Least-recently-used map with O(1) touch, insert and evict.
/// Nodes live in a slot arena; `head` is the oldest entry, `tail` the newest.
pub struct Lru<K, V> {
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    head: usize,
    tail: usize,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> Lru<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self { map: HashMap::with_capacity(capacity + 1), nodes: Vec::with_capacity(capacity + 1), head: NIL, tail: NIL, capacity: capacity.max(1) }
    }

    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }
    pub fn contains(&self, key: &K) -> bool { self.map.contains_key(key) }

    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Look up `key` and mark it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.unlink(idx);
        self.push_back(idx);
        Some(&self.nodes[idx].value)
    }

    /// Insert as most recently used. Returns the evicted key, if the capacity was exceeded.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if let Some(&idx) = self.map.get(&key) {
            self.nodes[idx].value = value;
            self.unlink(idx);
            self.push_back(idx);
            return None;
        }
        let mut evicted = None;
        let idx = if self.map.len() >= self.capacity {
            // reuse the oldest slot
            let old = self.head;
            self.unlink(old);
            let node = &mut self.nodes[old];
            let old_key = std::mem::replace(&mut node.key, key.clone());
            node.value = value;
            self.map.remove(&old_key);
            evicted = Some(old_key);
            old
        } else {
            self.nodes.push(Node { key: key.clone(), value, prev: NIL, next: NIL });
            self.nodes.len() - 1
        };
        self.map.insert(key, idx);
        self.push_back(idx);
        evicted
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len());
        let mut cur = self.head;
        while cur != NIL {
            out.push(self.nodes[cur].key.clone());
            cur = self.nodes[cur].next;
        }
        out
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev != NIL { self.nodes[prev].next = next; } else { self.head = next; }
        if next != NIL { self.nodes[next].prev = prev; } else { self.tail = prev; }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn push_back(&mut self, idx: usize) {
        self.nodes[idx].prev = self.tail;
        self.nodes[idx].next = NIL;
        if self.tail != NIL { self.nodes[self.tail].next = idx; } else { self.head = idx; }
        self.tail = idx;
    }
}

/// Canonical integer bounds of a fractional row range.
/// Equal bounds truncate to the same row; otherwise the left edge is rounded up a half.
pub fn canonical_key(x0: f64, x1: f64) -> (i64, i64) {
    if x0 == x1 {
        let x = x1 as i64;
        (x, x)
    } else {
        ((x0 + 0.5) as i64, x1 as i64)
    }
}

/// Full scan of `scale_cols` over rows `lo..=hi` (clipped to the table).
pub fn scan(table: &Table, scale_cols: &[usize], lo: i64, hi: i64) -> HiLo {
    let n = table.len() as i64;
    let start = lo.max(0);
    let end = hi.min(n - 1);
    if n == 0 || start > end { return HiLo::EMPTY; }
    let (start, end) = (start as usize, end as usize);
    let t0 = table.value(0, start);
    let t1 = table.value(0, end);
    let mut high = f64::NAN;
    let mut low = f64::NAN;
    for &c in scale_cols {
        if let Some(vals) = table.columns.get(c).and_then(|col| col.data.as_numeric()) {
            for &v in &vals[start..=end] {
                high = high.max(v);
                low = low.min(v);
            }
        }
    }
    HiLo { t0, t1, hi: high, lo: low, count: end - start + 1 }
}

/// Memoized hi-lo queries for one store. Entries are dropped whenever the underlying
/// table generation changes or the scale columns are redefined.
pub struct HiLoCache {
    lru: Lru<(i64, i64), HiLo>,
    generation: u64,
}

impl HiLoCache {
    pub fn new(capacity: usize) -> Self {
        Self { lru: Lru::new(capacity), generation: 0 }
    }

    pub fn len(&self) -> usize { self.lru.len() }
    pub fn is_empty(&self) -> bool { self.lru.is_empty() }
    pub fn capacity(&self) -> usize { self.lru.capacity() }
    pub fn keys(&self) -> Vec<(i64, i64)> { self.lru.keys() }
    pub fn invalidate(&mut self) { self.lru.clear(); }

    pub fn query(&mut self, table: &Table, scale_cols: &[usize], x0: f64, x1: f64) -> HiLo {
        if table.generation() != self.generation {
            self.lru.clear();
            self.generation = table.generation();
        }
        let key = canonical_key(x0, x1);
        if let Some(v) = self.lru.get(&key) {
            trace!(lo = key.0, hi = key.1, "hilo cache hit");
            return *v;
        }
        let v = scan(table, scale_cols, key.0, key.1);
        if let Some(old) = self.lru.insert(key, v) {
            trace!(lo = old.0, hi = old.1, "hilo cache evict");
        }
        v
    }
}
