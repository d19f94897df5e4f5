//! LinearProbeTable: single-level open-addressed table with textual keys.
//!
//! Collisions are resolved by scanning forward (wrapping) from the hashed
//! slot. Deletion leaves no tombstone; instead the rest of the probe cluster
//! after the freed slot is re-placed so every remaining key stays reachable.

use crate::error::{Result, TableError};
use crate::hashing::rolling_hash;
use crate::sizes::TableSizes;
use core::fmt;
use core::mem;
use log::{debug, warn};

/// What a probe is looking for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProbeMode {
    /// Stop at the key's slot or at the first empty slot.
    Insert,
    /// Stop only at the key's slot.
    Lookup,
}

type Slot<V> = Option<(String, V)>;

fn empty_slots<V>(capacity: usize) -> Vec<Slot<V>> {
    core::iter::repeat_with(|| None).take(capacity).collect()
}

#[derive(Debug)]
pub struct LinearProbeTable<V> {
    slots: Vec<Slot<V>>,
    sizes: TableSizes,
    size_index: usize,
    count: usize,
    /// Set once the ceiling warning has been logged.
    ceiling_logged: bool,
}

impl<V> Default for LinearProbeTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over occupied slots in slot order.
pub struct Iter<'a, V> {
    it: core::slice::Iter<'a, Slot<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .by_ref()
            .find_map(|s| s.as_ref().map(|(k, v)| (k.as_str(), v)))
    }
}

/// Iterator over occupied slots in slot order, with mutable values.
pub struct IterMut<'a, V> {
    it: core::slice::IterMut<'a, Slot<V>>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a str, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .by_ref()
            .find_map(|s| s.as_mut().map(|(k, v)| (k.as_str(), v)))
    }
}

impl<V> LinearProbeTable<V> {
    pub fn new() -> Self {
        Self::with_sizes(TableSizes::default())
    }

    /// Empty table at the first capacity of `sizes`.
    pub fn with_sizes(sizes: TableSizes) -> Self {
        Self {
            slots: empty_slots(sizes.first()),
            sizes,
            size_index: 0,
            count: 0,
            ceiling_logged: false,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current capacity (number of slots).
    pub fn table_size(&self) -> usize {
        self.slots.len()
    }

    pub fn sizes(&self) -> &TableSizes {
        &self.sizes
    }

    /// Home slot of `key` at the current capacity.
    pub fn hash(&self, key: &str) -> usize {
        rolling_hash(key, self.table_size())
    }

    /// Scan from the home slot of `key`.
    ///
    /// Returns the slot holding `key`, or in `Insert` mode the first empty
    /// slot met. Fails `NotFound` in `Lookup` mode when an empty slot or a
    /// full wrap is reached, and `Full` in `Insert` mode after a full wrap.
    pub fn probe(&self, key: &str, mode: ProbeMode) -> Result<usize> {
        let cap = self.table_size();
        let mut pos = self.hash(key);
        for _ in 0..cap {
            match &self.slots[pos] {
                None => {
                    return match mode {
                        ProbeMode::Insert => Ok(pos),
                        ProbeMode::Lookup => Err(TableError::NotFound),
                    }
                }
                Some((k, _)) if k == key => return Ok(pos),
                Some(_) => pos = (pos + 1) % cap,
            }
        }
        match mode {
            ProbeMode::Insert => Err(TableError::Full),
            ProbeMode::Lookup => Err(TableError::NotFound),
        }
    }

    pub fn get(&self, key: &str) -> Result<&V> {
        let pos = self.probe(key, ProbeMode::Lookup)?;
        self.slots[pos]
            .as_ref()
            .map(|(_, v)| v)
            .ok_or(TableError::NotFound)
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut V> {
        let pos = self.probe(key, ProbeMode::Lookup)?;
        self.slots[pos]
            .as_mut()
            .map(|(_, v)| v)
            .ok_or(TableError::NotFound)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.probe(key, ProbeMode::Lookup).is_ok()
    }

    /// Insert or overwrite. Returns the previous value for `key`, if any.
    ///
    /// A new key that pushes the load above one half grows the table.
    pub fn set(&mut self, key: &str, value: V) -> Result<Option<V>> {
        let pos = self.probe(key, ProbeMode::Insert)?;
        if let Some((_, current)) = &mut self.slots[pos] {
            return Ok(Some(mem::replace(current, value)));
        }
        self.slots[pos] = Some((key.to_owned(), value));
        self.count += 1;
        if self.is_overloaded() {
            self.grow();
        }
        Ok(None)
    }

    /// Remove `key` and return its value, then repair the probe cluster
    /// that followed it.
    pub fn delete(&mut self, key: &str) -> Result<V> {
        let pos = self.probe(key, ProbeMode::Lookup)?;
        let (_, value) = self.slots[pos].take().ok_or(TableError::NotFound)?;
        self.count -= 1;
        self.repair_cluster(pos);
        Ok(value)
    }

    /// Step to the next capacity and re-place every entry.
    ///
    /// Returns `false`, leaving capacity and entries alone, when the size
    /// sequence is exhausted. The ceiling is logged on the first such call
    /// only.
    pub fn grow(&mut self) -> bool {
        let Some(new_cap) = self.sizes.get(self.size_index + 1) else {
            if !self.ceiling_logged {
                warn!(
                    "linear probe table at its largest size ({} slots, {} entries); not growing",
                    self.table_size(),
                    self.count
                );
                self.ceiling_logged = true;
            }
            return false;
        };
        let old_cap = self.table_size();
        self.size_index += 1;
        let old = mem::replace(&mut self.slots, empty_slots(new_cap));
        for entry in old.into_iter().flatten() {
            self.place(entry);
        }
        debug!(
            "linear probe table grew from {old_cap} to {new_cap} slots ({} entries)",
            self.count
        );
        true
    }

    /// Entry stored at slot `index`, as found by `probe`.
    pub(crate) fn entry_at(&self, index: usize) -> Option<(&str, &V)> {
        self.slots
            .get(index)?
            .as_ref()
            .map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn entry_at_mut(&mut self, index: usize) -> Option<(&str, &mut V)> {
        self.slots
            .get_mut(index)?
            .as_mut()
            .map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn is_overloaded(&self) -> bool {
        self.count * 2 > self.table_size()
    }

    /// Put an entry whose key is known to be absent into the first empty
    /// slot of its probe sequence. Callers guarantee an empty slot exists.
    fn place(&mut self, entry: (String, V)) {
        let cap = self.table_size();
        let start = self.hash(&entry.0);
        let vacant = (0..cap)
            .map(|i| (start + i) % cap)
            .find(|&p| self.slots[p].is_none());
        debug_assert!(vacant.is_some(), "placement requires an empty slot");
        if let Some(p) = vacant {
            self.slots[p] = Some(entry);
        }
    }

    /// Re-place each entry of the cluster following the freed slot `hole`,
    /// stopping at the next empty slot or after one full pass.
    fn repair_cluster(&mut self, hole: usize) {
        let cap = self.table_size();
        let mut pos = (hole + 1) % cap;
        for _ in 1..cap {
            let Some(entry) = self.slots[pos].take() else {
                break;
            };
            self.place(entry);
            pos = (pos + 1) % cap;
        }
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, v)| v)
    }
}

impl<V: fmt::Display> fmt::Display for LinearProbeTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in self.iter() {
            writeln!(f, "({k}, {v})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeSet;

    // Counts warnings per test thread so parallel tests do not interfere.
    struct WarnCounter;

    thread_local! {
        static WARNINGS: Cell<usize> = const { Cell::new(0) };
    }

    impl log::Log for WarnCounter {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record<'_>) {
            if record.level() == log::Level::Warn {
                WARNINGS.with(|w| w.set(w.get() + 1));
            }
        }

        fn flush(&self) {}
    }

    static WARN_COUNTER: WarnCounter = WarnCounter;

    fn warnings_so_far() -> usize {
        let _ = log::set_logger(&WARN_COUNTER);
        log::set_max_level(log::LevelFilter::Warn);
        WARNINGS.with(Cell::get)
    }

    fn sizes(s: &[usize]) -> TableSizes {
        TableSizes::new(s).unwrap()
    }

    /// Invariant: set/get round-trip; a second set overwrites in place and
    /// returns the old value without changing `len`.
    #[test]
    fn set_get_and_overwrite() {
        let mut t: LinearProbeTable<i32> = LinearProbeTable::new();
        assert_eq!(t.set("k", 1), Ok(None));
        assert_eq!(t.get("k"), Ok(&1));
        assert_eq!(t.set("k", 2), Ok(Some(1)));
        assert_eq!(t.get("k"), Ok(&2));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("missing"), Err(TableError::NotFound));
    }

    #[test]
    fn probe_modes_on_empty_table() {
        let t: LinearProbeTable<()> = LinearProbeTable::new();
        assert_eq!(t.probe("a", ProbeMode::Insert), Ok(t.hash("a")));
        assert_eq!(t.probe("a", ProbeMode::Lookup), Err(TableError::NotFound));
    }

    /// 'a', 'h', 'o', 'v' all hash to slot 6 of 7, so they form one cluster
    /// that wraps to slots 0, 1 and 2.
    #[test]
    fn colliding_keys_wrap_around() {
        let mut t = LinearProbeTable::with_sizes(sizes(&[7]));
        for (i, k) in ["a", "h", "o", "v"].iter().enumerate() {
            assert_eq!(t.hash(k), 6);
            t.set(k, i).unwrap();
        }
        assert_eq!(t.probe("a", ProbeMode::Lookup), Ok(6));
        assert_eq!(t.probe("h", ProbeMode::Lookup), Ok(0));
        assert_eq!(t.probe("o", ProbeMode::Lookup), Ok(1));
        assert_eq!(t.probe("v", ProbeMode::Lookup), Ok(2));
    }

    /// Invariant: deleting the head of a cluster keeps every later member
    /// reachable and shifts them back toward their home slot.
    #[test]
    fn delete_head_of_cluster_repairs_it() {
        let mut t = LinearProbeTable::with_sizes(sizes(&[7]));
        for (i, k) in ["a", "h", "o", "v"].iter().enumerate() {
            t.set(k, i).unwrap();
        }
        assert_eq!(t.delete("a"), Ok(0));
        assert_eq!(t.len(), 3);
        assert!(!t.contains("a"));
        assert_eq!(t.get("h"), Ok(&1));
        assert_eq!(t.get("o"), Ok(&2));
        assert_eq!(t.get("v"), Ok(&3));
        assert_eq!(t.probe("h", ProbeMode::Lookup), Ok(6));
        assert_eq!(t.probe("v", ProbeMode::Lookup), Ok(1));
    }

    /// Invariant: deleting from the middle of a cluster leaves entries that
    /// did not collide with it in their home slots.
    #[test]
    fn delete_mid_cluster_keeps_unrelated_entries() {
        let mut t = LinearProbeTable::with_sizes(sizes(&[7]));
        t.set("a", 0).unwrap(); // home 6
        t.set("h", 1).unwrap(); // home 6 -> 0
        t.set("b", 2).unwrap(); // home 98 % 7 = 0 -> 1
        t.set("o", 3).unwrap(); // home 6 -> 2
        assert_eq!(t.delete("h"), Ok(1));
        assert_eq!(t.probe("b", ProbeMode::Lookup), Ok(0));
        assert_eq!(t.probe("o", ProbeMode::Lookup), Ok(1));
        assert_eq!(t.get("a"), Ok(&0));
        assert_eq!(t.get("b"), Ok(&2));
        assert_eq!(t.get("o"), Ok(&3));
    }

    #[test]
    fn delete_missing_is_not_found_and_harmless() {
        let mut t = LinearProbeTable::new();
        t.set("x", 1).unwrap();
        assert_eq!(t.delete("y"), Err(TableError::NotFound));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("x"), Ok(&1));
    }

    /// Invariant: growth is triggered past half load and never changes the
    /// key -> value mapping.
    #[test]
    fn growth_is_transparent() {
        let mut t = LinearProbeTable::new();
        assert_eq!(t.table_size(), 5);
        for i in 0..200 {
            t.set(&format!("key{i}"), i).unwrap();
            assert!(t.len() * 2 <= t.table_size());
        }
        assert_eq!(t.table_size(), 769);
        for i in 0..200 {
            assert_eq!(t.get(&format!("key{i}")), Ok(&i));
        }
    }

    /// At the largest size growth becomes a no-op; the table fills to
    /// capacity, then new keys fail `Full` while existing ones stay
    /// readable and writable.
    #[test]
    fn capped_growth_fills_then_reports_full() {
        let mut t = LinearProbeTable::with_sizes(sizes(&[3]));
        t.set("a", 1).unwrap();
        t.set("b", 2).unwrap();
        t.set("c", 3).unwrap();
        assert_eq!(t.table_size(), 3);
        assert_eq!(t.set("d", 4), Err(TableError::Full));
        assert_eq!(t.len(), 3);
        assert_eq!(t.set("b", 20), Ok(Some(2)));
        assert_eq!(t.get("d"), Err(TableError::NotFound));
        for (k, v) in [("a", 1), ("b", 20), ("c", 3)] {
            assert_eq!(t.get(k), Ok(&v));
        }
    }

    /// Deleting from a completely full table terminates and keeps the rest.
    #[test]
    fn delete_from_full_table() {
        let mut t = LinearProbeTable::with_sizes(sizes(&[3]));
        for k in ["a", "b", "c"] {
            t.set(k, k.to_string()).unwrap();
        }
        assert_eq!(t.delete("b"), Ok("b".to_string()));
        assert_eq!(t.get("a").map(String::as_str), Ok("a"));
        assert_eq!(t.get("c").map(String::as_str), Ok("c"));
        t.set("d", "d".to_string()).unwrap();
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn grow_reports_whether_capacity_changed() {
        let mut t: LinearProbeTable<u8> = LinearProbeTable::with_sizes(sizes(&[2, 3]));
        assert!(t.grow());
        assert_eq!(t.table_size(), 3);
        assert!(!t.grow());
        assert_eq!(t.table_size(), 3);
    }

    #[test]
    fn iteration_and_mutation() {
        let mut t = LinearProbeTable::new();
        for (i, k) in ["k1", "k2", "k3"].iter().enumerate() {
            t.set(k, i as i32).unwrap();
        }
        let keys: BTreeSet<&str> = t.keys().collect();
        assert_eq!(keys, ["k1", "k2", "k3"].into_iter().collect());
        for v in t.values_mut() {
            *v += 10;
        }
        let mut values: Vec<i32> = t.values().copied().collect();
        values.sort();
        assert_eq!(values, vec![10, 11, 12]);
        *t.get_mut("k2").unwrap() = 0;
        assert_eq!(t.get("k2"), Ok(&0));
    }

    #[test]
    fn display_lists_occupied_slots() {
        let mut t = LinearProbeTable::with_sizes(sizes(&[7]));
        t.set("a", 1).unwrap();
        t.set("h", 2).unwrap();
        // "h" wrapped to slot 0, ahead of "a" in slot 6.
        assert_eq!(t.to_string(), "(h, 2)\n(a, 1)\n");
    }

    #[test]
    fn empty_key_is_a_regular_key() {
        let mut t = LinearProbeTable::new();
        t.set("", 7).unwrap();
        assert_eq!(t.hash(""), 0);
        assert_eq!(t.get(""), Ok(&7));
        assert_eq!(t.delete(""), Ok(7));
        assert!(t.is_empty());
    }

    /// Filling a table that cannot grow past half load and beyond reports
    /// the ceiling once, not on every insert.
    #[test]
    fn ceiling_warning_is_logged_once() {
        let mut t = LinearProbeTable::with_sizes(sizes(&[101]));
        let before = warnings_so_far();
        for i in 0..100 {
            t.set(&format!("key{i}"), i).unwrap();
        }
        assert!(!t.grow());
        assert_eq!(t.len(), 100);
        assert_eq!(t.table_size(), 101);
        assert_eq!(warnings_so_far() - before, 1);
    }
}
