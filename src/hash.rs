//! Key hashing strategies.

/// A hash strategy over raw key bytes.
///
/// Any `Fn(&[u8]) -> u32` is a strategy, so plain functions and closures can
/// be handed to [`Table::with_capacity_and_hasher`](crate::Table::with_capacity_and_hasher).
pub trait KeyHasher {
    fn hash(&self, key: &[u8]) -> u32;
}

impl<F> KeyHasher for F
where
    F: Fn(&[u8]) -> u32,
{
    #[inline]
    fn hash(&self, key: &[u8]) -> u32 {
        self(key)
    }
}

/// Default strategy: Jenkins one-at-a-time.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OneAtATime;

impl KeyHasher for OneAtATime {
    #[inline]
    fn hash(&self, key: &[u8]) -> u32 {
        one_at_a_time(key)
    }
}

/// Jenkins one-at-a-time hash.
///
/// See <https://en.wikipedia.org/wiki/Jenkins_hash_function>.
pub fn one_at_a_time(key: &[u8]) -> u32 {
    let mut hash: u32 = 0;
    for &b in key {
        hash = hash.wrapping_add(b as u32);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}
