//! layered-hash: associative storage engines over textual keys, built
//! without relying on a library map type.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keyed lookup with hand-written collision resolution and growth,
//!   in layers that can be reasoned about independently.
//! - Layers:
//!   - LinearProbeTable<V>: single-level open-addressed table. Linear
//!     probing from a polynomial rolling hash; grows through a fixed
//!     capacity sequence when load passes one half; deletion repairs the
//!     following probe cluster instead of leaving tombstones.
//!   - DoubleKeyTable<V>: a LinearProbeTable from primary key to an owned
//!     LinearProbeTable from secondary key to value. Both levels probe and
//!     grow independently, each with its own capacity sequence.
//!   - InfiniteHashTable<V, WIDTH>: recursive per-character table. Each
//!     level routes by one char; a collision grows a child table one level
//!     deeper, and a child left with one leaf collapses back into its
//!     parent slot. Nodes live in a `slotmap` arena.
//!
//! Constraints
//! - Single-threaded and synchronous; every operation runs to completion.
//!   No locking is provided; share behind your own synchronization.
//! - Keys are `String`s hashed by char; queries borrow `&str`.
//! - Failed `set`/`delete` leave the table unchanged: probing and routing
//!   are read-only until the target slot is chosen.
//!
//! Capacity ceiling
//! - Growth stops silently (with a `log::warn!`) once the last size of the
//!   sequence is reached. The table then fills up to 100% load, after which
//!   inserting a new key fails with `TableError::Full`. Entries are never
//!   dropped.
//!
//! Infinite table routing
//! - The default width of 27 maps chars to `code % 26` plus a sentinel for
//!   keys that end at a node's depth. Distinct keys of equal length whose
//!   chars agree modulo 26 at every position cannot be separated; inserting
//!   the second one fails with `TableError::Invalid`.
//! - Terminal leaves always have their key compared, so a lookup never
//!   returns the value of a different key that shares the slot path.
//!
//! Logging
//! - Uses the `log` facade: `debug!` on growth, `warn!` at the capacity
//!   ceiling, `trace!` on split and collapse. No logger is installed.

pub mod double_key_table;
mod error;
pub mod hashing;
pub mod infinite_hash_table;
pub mod linear_probe;
mod sizes;

// Public surface
pub use double_key_table::DoubleKeyTable;
pub use error::{Result, TableError};
pub use infinite_hash_table::{InfiniteHashTable, DEFAULT_WIDTH};
pub use linear_probe::{LinearProbeTable, ProbeMode};
pub use sizes::TableSizes;
