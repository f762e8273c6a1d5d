//! Table-owned records and the destructor strategy.

use core::mem;

use crate::error::TableError;

/// Size of the fixed part of every record: the key buffer and the
/// record-size field. Declared record sizes below this are rejected.
pub const HEADER_SIZE: usize = mem::size_of::<Box<[u8]>>() + mem::size_of::<usize>();

/// A record owned by a [`Table`](crate::Table).
///
/// The key is an independent heap copy of the bytes handed to `set`; the
/// caller's buffer is never aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item<V> {
    key: Box<[u8]>,
    record_size: usize,
    value: V,
}

impl<V> Item<V> {
    /// Record size used by [`Table::set`](crate::Table::set).
    pub const DEFAULT_RECORD_SIZE: usize = HEADER_SIZE + mem::size_of::<V>();

    pub(crate) fn new(key: Box<[u8]>, record_size: usize, value: V) -> Self {
        Self {
            key,
            record_size,
            value,
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn key_len(&self) -> usize {
        self.key.len()
    }

    /// Declared total size of the record, as given at insertion.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Split a detached item into its key buffer and value.
    pub fn into_parts(self) -> (Box<[u8]>, V) {
        (self.key, self.value)
    }

    /// Byte equality against a query key: same length, identical bytes.
    #[inline]
    pub fn matches(&self, key: &[u8]) -> bool {
        *self.key == *key
    }
}

/// Releases an item the table no longer keeps.
///
/// Called on overwrite, on `remove`, and on teardown; never on `pop` or
/// lookups. Custom destructors release whatever the value owns outside the
/// record and then let the item drop.
pub type Destructor<V> = Box<dyn FnMut(Item<V>)>;

/// Frees the key buffer and the record.
pub fn default_destructor<V>(item: Item<V>) {
    drop(item);
}

/// Deep-copy key bytes into a fresh buffer without aborting on OOM.
pub(crate) fn copy_key(key: &[u8]) -> Result<Box<[u8]>, TableError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(key.len())
        .map_err(|_| TableError::Mem)?;
    buf.extend_from_slice(key);
    Ok(buf.into_boxed_slice())
}
