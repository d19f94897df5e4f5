//! InfiniteHashTable: collisions grow a child table one character deeper
//! instead of probing or rehashing.
//!
//! Nodes live in a `SlotMap` arena and refer to their children by key. A
//! node at depth `level` routes a key by its char at position `level`; keys
//! that end at that depth take the last (sentinel) slot. A slot is empty,
//! holds a leaf, or points at a child node that holds at least two leaves.
//! Deleting down to one leaf in a child folds that leaf back into the
//! parent slot and frees the child node.

use crate::error::{Result, TableError};
use crate::hashing::char_slot;
use core::fmt;
use core::mem;
use log::trace;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct NodeKey;
}

/// Slot count per node used when no width is given: 26 routed slots plus
/// the sentinel.
pub const DEFAULT_WIDTH: usize = 27;

#[derive(Debug)]
enum Slot<V> {
    Empty,
    Leaf { key: String, value: V },
    /// `prefix` is the first `level + 1` chars of the key that was split.
    Child { prefix: String, node: NodeKey },
}

#[derive(Debug)]
struct Node<V, const WIDTH: usize> {
    level: usize,
    slots: [Slot<V>; WIDTH],
    /// Leaves reachable from this node.
    count: usize,
}

impl<V, const WIDTH: usize> Node<V, WIDTH> {
    fn new(level: usize) -> Self {
        Self {
            level,
            slots: core::array::from_fn(|_| Slot::Empty),
            count: 0,
        }
    }
}

#[derive(Debug)]
pub struct InfiniteHashTable<V, const WIDTH: usize = DEFAULT_WIDTH> {
    nodes: SlotMap<NodeKey, Node<V, WIDTH>>,
    root: NodeKey,
}

impl<V, const WIDTH: usize> Default for InfiniteHashTable<V, WIDTH> {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `a` and `b`, which collide at every depth below `level`, take
/// different slots at some depth from `level` on. Distinct keys of equal
/// length whose remaining chars agree modulo `width - 1` never separate.
fn routes_apart(a: &str, b: &str, level: usize, width: usize) -> bool {
    let modulus = width - 1;
    let mut a = a.chars().skip(level);
    let mut b = b.chars().skip(level);
    loop {
        match (a.next(), b.next()) {
            (None, None) => return false,
            (Some(x), Some(y)) if x as usize % modulus == y as usize % modulus => {}
            _ => return true,
        }
    }
}

impl<V, const WIDTH: usize> InfiniteHashTable<V, WIDTH> {
    pub fn new() -> Self {
        assert!(WIDTH >= 2, "InfiniteHashTable needs at least two slots per node");
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(0));
        Self { nodes, root }
    }

    pub fn len(&self) -> usize {
        self.nodes[self.root].count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot that `key` takes in a node at depth `level`.
    pub fn hash(key: &str, level: usize) -> usize {
        char_slot(key, level, WIDTH)
    }

    /// Node and slot index of the leaf holding `key`.
    fn find_leaf(&self, key: &str) -> Result<(NodeKey, usize)> {
        let mut node = self.root;
        loop {
            let n = &self.nodes[node];
            let index = Self::hash(key, n.level);
            match &n.slots[index] {
                Slot::Empty => return Err(TableError::NotFound),
                Slot::Child { node: child, .. } => node = *child,
                Slot::Leaf { key: k, .. } if k == key => return Ok((node, index)),
                Slot::Leaf { .. } => return Err(TableError::NotFound),
            }
        }
    }

    pub fn get(&self, key: &str) -> Result<&V> {
        let (node, index) = self.find_leaf(key)?;
        match &self.nodes[node].slots[index] {
            Slot::Leaf { value, .. } => Ok(value),
            _ => Err(TableError::NotFound),
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut V> {
        let (node, index) = self.find_leaf(key)?;
        match &mut self.nodes[node].slots[index] {
            Slot::Leaf { value, .. } => Ok(value),
            _ => Err(TableError::NotFound),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find_leaf(key).is_ok()
    }

    /// Slot indices visited from the root down to the leaf holding `key`.
    pub fn get_location(&self, key: &str) -> Result<Vec<usize>> {
        let mut path = Vec::new();
        let mut node = self.root;
        loop {
            let n = &self.nodes[node];
            let index = Self::hash(key, n.level);
            path.push(index);
            match &n.slots[index] {
                Slot::Empty => return Err(TableError::NotFound),
                Slot::Child { node: child, .. } => node = *child,
                Slot::Leaf { key: k, .. } if k == key => return Ok(path),
                Slot::Leaf { .. } => return Err(TableError::NotFound),
            }
        }
    }

    /// Insert or overwrite. Returns the previous value for `key`, if any.
    ///
    /// Fails `Invalid`, leaving the table unchanged, if `key` collides with
    /// a stored key at every remaining depth (e.g. "a" and "{" at the
    /// default width).
    pub fn set(&mut self, key: &str, value: V) -> Result<Option<V>> {
        self.insert_at(self.root, key.to_owned(), value)
    }

    fn insert_at(&mut self, node: NodeKey, key: String, value: V) -> Result<Option<V>> {
        let level = self.nodes[node].level;
        let index = Self::hash(&key, level);
        let slot = &mut self.nodes[node].slots[index];
        match mem::replace(slot, Slot::Empty) {
            Slot::Empty => *slot = Slot::Leaf { key, value },
            Slot::Child { prefix, node: child } => {
                *slot = Slot::Child {
                    prefix,
                    node: child,
                };
                let previous = self.insert_at(child, key, value)?;
                if previous.is_none() {
                    self.nodes[node].count += 1;
                }
                return Ok(previous);
            }
            Slot::Leaf {
                key: existing,
                value: current,
            } if existing == key => {
                *slot = Slot::Leaf {
                    key: existing,
                    value,
                };
                return Ok(Some(current));
            }
            Slot::Leaf {
                key: existing,
                value: current,
            } => {
                if !routes_apart(&existing, &key, level + 1, WIDTH) {
                    let err = TableError::Invalid(format!(
                        "key {key:?} cannot be routed apart from {existing:?}"
                    ));
                    *slot = Slot::Leaf {
                        key: existing,
                        value: current,
                    };
                    return Err(err);
                }
                self.split(node, index, existing, current, key, value)?;
            }
        }
        self.nodes[node].count += 1;
        Ok(None)
    }

    /// Replace the leaf that was in `node`'s slot `index` with a child table
    /// one level deeper holding both the displaced leaf and the new entry.
    fn split(
        &mut self,
        node: NodeKey,
        index: usize,
        existing_key: String,
        existing_value: V,
        key: String,
        value: V,
    ) -> Result<()> {
        let level = self.nodes[node].level;
        let prefix: String = existing_key.chars().take(level + 1).collect();
        let child = self.nodes.insert(Node::new(level + 1));
        self.insert_at(child, existing_key, existing_value)?;
        self.insert_at(child, key, value)?;
        trace!("split slot {index} at level {level} into child for prefix {prefix:?}");
        self.nodes[node].slots[index] = Slot::Child {
            prefix,
            node: child,
        };
        Ok(())
    }

    /// Remove `key` and return its value, collapsing any child table left
    /// with a single leaf.
    pub fn delete(&mut self, key: &str) -> Result<V> {
        self.remove_at(self.root, key)
    }

    fn remove_at(&mut self, node: NodeKey, key: &str) -> Result<V> {
        let index = Self::hash(key, self.nodes[node].level);
        let slot = &mut self.nodes[node].slots[index];
        let value = match mem::replace(slot, Slot::Empty) {
            Slot::Empty => return Err(TableError::NotFound),
            Slot::Leaf { key: k, value } if k == key => value,
            leaf @ Slot::Leaf { .. } => {
                *slot = leaf;
                return Err(TableError::NotFound);
            }
            Slot::Child { prefix, node: child } => {
                *slot = Slot::Child {
                    prefix,
                    node: child,
                };
                let value = self.remove_at(child, key)?;
                if self.nodes[child].count == 1 {
                    self.collapse(node, index, child);
                }
                value
            }
        };
        self.nodes[node].count -= 1;
        Ok(value)
    }

    /// Move the only leaf of `child` into `node`'s slot `index` and free
    /// `child`.
    fn collapse(&mut self, node: NodeKey, index: usize, child: NodeKey) {
        let Some(removed) = self.nodes.remove(child) else {
            return;
        };
        let survivor = removed
            .slots
            .into_iter()
            .find(|s| !matches!(s, Slot::Empty));
        debug_assert!(
            matches!(survivor, Some(Slot::Leaf { .. })),
            "a child with one leaf holds it directly"
        );
        if let Some(leaf) = survivor {
            trace!(
                "collapsed child at level {} into slot {index}",
                removed.level
            );
            self.nodes[node].slots[index] = leaf;
        }
    }

    /// Smallest leaf count over all non-root nodes; `None` when the root is
    /// the only node.
    #[cfg(test)]
    pub(crate) fn min_child_count(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|(k, _)| *k != self.root)
            .map(|(_, n)| n.count)
            .min()
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, node: NodeKey) -> fmt::Result
    where
        V: fmt::Display,
    {
        let n = &self.nodes[node];
        let indent = "  ".repeat(n.level);
        for (index, slot) in n.slots.iter().enumerate() {
            match slot {
                Slot::Empty => {}
                Slot::Leaf { key, value } => writeln!(f, "{indent}{index}: {key} => {value}")?,
                Slot::Child { prefix, node } => {
                    writeln!(f, "{indent}{index}: {prefix}*")?;
                    self.fmt_node(f, *node)?;
                }
            }
        }
        Ok(())
    }
}

impl<V: fmt::Display, const WIDTH: usize> fmt::Display for InfiniteHashTable<V, WIDTH> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.root)
    }
}
