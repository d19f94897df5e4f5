//! Pure, deterministic hash functions over textual keys.
//!
//! Both functions iterate the key's `char`s (Unicode scalar values), so a
//! key's "length" here is its number of chars, not bytes.

/// Multiplier base of the rolling hash.
pub const HASH_BASE: u128 = 31;

/// Initial multiplier of the rolling hash.
pub const HASH_SEED: u128 = 31415;

/// Polynomial rolling hash of `key` into `0..capacity`.
///
/// For each char: `value = (code + a * value) % capacity`, then
/// `a = a * HASH_BASE % (capacity - 1)`. Arithmetic is done in `u128` so any
/// `usize` capacity is safe. `capacity` must be at least 2.
pub fn rolling_hash(key: &str, capacity: usize) -> usize {
    debug_assert!(capacity >= 2, "capacity must be at least 2");
    let cap = capacity as u128;
    let mut value: u128 = 0;
    let mut a = HASH_SEED;
    for ch in key.chars() {
        value = (u128::from(ch as u32) + a * value) % cap;
        a = a * HASH_BASE % (cap - 1);
    }
    value as usize
}

/// Slot that `key` occupies at depth `level` of a per-character table with
/// `width` slots.
///
/// The char at position `level` selects one of the first `width - 1` slots;
/// keys with no char at that position (they end at this depth) take the
/// sentinel slot `width - 1`.
pub fn char_slot(key: &str, level: usize, width: usize) -> usize {
    debug_assert!(width >= 2, "width must be at least 2");
    match key.chars().nth(level) {
        Some(ch) => ch as usize % (width - 1),
        None => width - 1,
    }
}
