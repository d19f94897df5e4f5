//! Capacity sequences for the probing tables.

use crate::error::{Result, TableError};
use std::sync::Arc;

const DEFAULT_SIZES: [usize; 19] = [
    5, 13, 29, 53, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613,
    393241, 786433, 1572869,
];

/// A strictly ascending sequence of table capacities, each at least 2.
///
/// A table starts at the first size and steps to the next one each time it
/// grows. Cloning is cheap; tables created by a `DoubleKeyTable` share the
/// same sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSizes(Arc<[usize]>);

impl TableSizes {
    pub fn new(sizes: &[usize]) -> Result<Self> {
        if sizes.is_empty() {
            return Err(TableError::Invalid("size sequence is empty".into()));
        }
        if let Some(&s) = sizes.iter().find(|&&s| s < 2) {
            return Err(TableError::Invalid(format!(
                "table size {s} is below the minimum of 2"
            )));
        }
        if let Some(w) = sizes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(TableError::Invalid(format!(
                "size sequence is not strictly ascending at {} -> {}",
                w[0], w[1]
            )));
        }
        Ok(Self(sizes.into()))
    }

    /// Capacity at `index`, if the sequence reaches that far.
    pub fn get(&self, index: usize) -> Option<usize> {
        self.0.get(index).copied()
    }

    pub fn first(&self) -> usize {
        self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true: construction rejects empty sequences.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl Default for TableSizes {
    fn default() -> Self {
        Self(Arc::from(&DEFAULT_SIZES[..]))
    }
}
