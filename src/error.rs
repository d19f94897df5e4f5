//! Error type shared by every table in the crate.

/// Failures reported by table operations.
///
/// A failed `set` or `delete` leaves the table exactly as it was before the
/// call: probing and routing are read-only until a target slot is chosen.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TableError {
    /// Lookup or removal of a key that is not present.
    #[error("key not found")]
    NotFound,

    /// Insertion of a new key into a table with no empty slot left.
    ///
    /// Only reachable once the capacity sequence is exhausted, since tables
    /// grow whenever they pass half load.
    #[error("table is full")]
    Full,

    /// Malformed configuration or a key the table cannot route.
    #[error("invalid input: {0}")]
    Invalid(String),
}

pub type Result<T> = core::result::Result<T, TableError>;
