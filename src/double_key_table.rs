//! DoubleKeyTable: maps a (primary, secondary) key pair to a value.
//!
//! The outer level is a `LinearProbeTable` from primary key to an owned
//! inner `LinearProbeTable` from secondary key to value. Each level probes
//! and grows with its own capacity sequence. An inner table is created on
//! the first insert under its primary key and destroyed together with the
//! outer slot when its last entry is deleted.

use crate::error::{Result, TableError};
use crate::hashing::rolling_hash;
use crate::linear_probe::{self, LinearProbeTable, ProbeMode};
use crate::sizes::TableSizes;
use core::fmt;
use log::debug;

#[derive(Debug)]
pub struct DoubleKeyTable<V> {
    outer: LinearProbeTable<LinearProbeTable<V>>,
    inner_sizes: TableSizes,
    count: usize,
}

impl<V> Default for DoubleKeyTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> DoubleKeyTable<V> {
    pub fn new() -> Self {
        Self::with_sizes(TableSizes::default(), TableSizes::default())
    }

    /// Table whose outer level steps through `outer` and whose inner tables
    /// step through `inner`.
    pub fn with_sizes(outer: TableSizes, inner: TableSizes) -> Self {
        Self {
            outer: LinearProbeTable::with_sizes(outer),
            inner_sizes: inner,
            count: 0,
        }
    }

    /// Number of (primary, secondary) pairs.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of distinct primary keys (occupied outer slots).
    pub fn primary_len(&self) -> usize {
        self.outer.len()
    }

    /// Current outer capacity.
    pub fn table_size(&self) -> usize {
        self.outer.table_size()
    }

    pub fn hash1(&self, primary: &str) -> usize {
        self.outer.hash(primary)
    }

    pub fn hash2(&self, secondary: &str, sub_table: &LinearProbeTable<V>) -> usize {
        sub_table.hash(secondary)
    }

    /// Resolve a key pair to `(outer slot, inner slot)`.
    ///
    /// The outer array is probed for `primary`, then that primary's inner
    /// table is probed for `secondary`. In `Insert` mode a vacant outer slot
    /// is accepted and the inner slot is the home slot `secondary` would get
    /// in a freshly created inner table.
    pub fn locate(&self, primary: &str, secondary: &str, mode: ProbeMode) -> Result<(usize, usize)> {
        let outer = self.outer.probe(primary, mode)?;
        let inner = match self.outer.entry_at(outer) {
            Some((_, sub)) => sub.probe(secondary, mode)?,
            None => rolling_hash(secondary, self.inner_sizes.first()),
        };
        Ok((outer, inner))
    }

    pub fn get(&self, primary: &str, secondary: &str) -> Result<&V> {
        let (outer, inner) = self.locate(primary, secondary, ProbeMode::Lookup)?;
        self.outer
            .entry_at(outer)
            .and_then(|(_, sub)| sub.entry_at(inner))
            .map(|(_, v)| v)
            .ok_or(TableError::NotFound)
    }

    pub fn get_mut(&mut self, primary: &str, secondary: &str) -> Result<&mut V> {
        let (outer, inner) = self.locate(primary, secondary, ProbeMode::Lookup)?;
        self.outer
            .entry_at_mut(outer)
            .and_then(|(_, sub)| sub.entry_at_mut(inner))
            .map(|(_, v)| v)
            .ok_or(TableError::NotFound)
    }

    pub fn contains(&self, primary: &str, secondary: &str) -> bool {
        self.locate(primary, secondary, ProbeMode::Lookup).is_ok()
    }

    /// Insert or overwrite the value for a key pair. Returns the previous
    /// value, if any.
    ///
    /// A new primary key that pushes the outer load above one half triggers
    /// an outer rehash; inner tables grow on their own.
    pub fn set(&mut self, primary: &str, secondary: &str, value: V) -> Result<Option<V>> {
        let (outer, _) = self.locate(primary, secondary, ProbeMode::Insert)?;
        if let Some((_, sub)) = self.outer.entry_at_mut(outer) {
            let previous = sub.set(secondary, value)?;
            if previous.is_none() {
                self.count += 1;
            }
            return Ok(previous);
        }

        let mut sub = LinearProbeTable::with_sizes(self.inner_sizes.clone());
        sub.set(secondary, value)?;
        let before = self.outer.table_size();
        self.outer.set(primary, sub)?;
        self.count += 1;
        if self.outer.table_size() != before {
            self.grow_loaded_sub_tables();
        }
        Ok(None)
    }

    /// Remove a key pair and return its value.
    ///
    /// Deleting the last pair under a primary key clears the outer slot,
    /// dropping the inner table, and repairs the outer probe cluster.
    pub fn delete(&mut self, primary: &str, secondary: &str) -> Result<V> {
        let (outer, _) = self.locate(primary, secondary, ProbeMode::Lookup)?;
        let (_, sub) = self.outer.entry_at_mut(outer).ok_or(TableError::NotFound)?;
        let value = if sub.len() == 1 {
            let mut sub = self.outer.delete(primary)?;
            sub.delete(secondary)?
        } else {
            sub.delete(secondary)?
        };
        self.count -= 1;
        Ok(value)
    }

    /// Step the outer level to its next capacity and re-place every primary
    /// key, then grow any inner table still above half load.
    ///
    /// Returns `false` when the outer size sequence is exhausted.
    pub fn grow(&mut self) -> bool {
        let grown = self.outer.grow();
        if grown {
            self.grow_loaded_sub_tables();
        }
        grown
    }

    fn grow_loaded_sub_tables(&mut self) {
        for sub in self.outer.values_mut() {
            if sub.is_overloaded() {
                sub.grow();
            }
        }
        debug!(
            "double key table rehashed to {} outer slots ({} primaries, {} pairs)",
            self.outer.table_size(),
            self.outer.len(),
            self.count
        );
    }

    /// All primary keys when `primary` is `None`; otherwise the secondary
    /// keys stored under `primary` (empty if it is absent). Slot order.
    pub fn iter_keys(&self, primary: Option<&str>) -> Keys<'_, V> {
        let inner = match primary {
            None => KeysInner::Primary(self.outer.iter()),
            Some(p) => match self.outer.get(p) {
                Ok(sub) => KeysInner::Secondary(sub.iter()),
                Err(_) => KeysInner::Empty,
            },
        };
        Keys { inner }
    }

    /// All values when `primary` is `None`, flattened in outer then inner
    /// slot order; otherwise the values stored under `primary`.
    pub fn iter_values(&self, primary: Option<&str>) -> Values<'_, V> {
        match primary {
            None => Values {
                outer: Some(self.outer.iter()),
                current: None,
            },
            Some(p) => Values {
                outer: None,
                current: self.outer.get(p).ok().map(LinearProbeTable::iter),
            },
        }
    }

    pub fn keys(&self, primary: Option<&str>) -> Vec<String> {
        self.iter_keys(primary).map(str::to_owned).collect()
    }

    pub fn values(&self, primary: Option<&str>) -> Vec<&V> {
        self.iter_values(primary).collect()
    }

    /// Every `(primary, secondary, value)` triple in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &V)> {
        self.outer
            .iter()
            .flat_map(|(p, sub)| sub.iter().map(move |(s, v)| (p, s, v)))
    }
}

/// Iterator returned by [`DoubleKeyTable::iter_keys`].
pub struct Keys<'a, V> {
    inner: KeysInner<'a, V>,
}

enum KeysInner<'a, V> {
    Primary(linear_probe::Iter<'a, LinearProbeTable<V>>),
    Secondary(linear_probe::Iter<'a, V>),
    Empty,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a str;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            KeysInner::Primary(it) => it.next().map(|(k, _)| k),
            KeysInner::Secondary(it) => it.next().map(|(k, _)| k),
            KeysInner::Empty => None,
        }
    }
}

/// Iterator returned by [`DoubleKeyTable::iter_values`].
pub struct Values<'a, V> {
    outer: Option<linear_probe::Iter<'a, LinearProbeTable<V>>>,
    current: Option<linear_probe::Iter<'a, V>>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, v)) = self.current.as_mut().and_then(Iterator::next) {
                return Some(v);
            }
            let (_, sub) = self.outer.as_mut()?.next()?;
            self.current = Some(sub.iter());
        }
    }
}

impl<V: fmt::Display> fmt::Display for DoubleKeyTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (primary, sub) in self.outer.iter() {
            writeln!(f, "{primary}")?;
            write!(f, "{sub}")?;
        }
        Ok(())
    }
}
