//! Table: open-addressing slot array with linear probing and tombstones.

use core::fmt;
use core::mem;

use log::{debug, error, trace, warn};

use crate::error::{Status, TableError};
use crate::hash::{KeyHasher, OneAtATime};
use crate::item::{copy_key, default_destructor, Destructor, Item, HEADER_SIZE};

/// Smallest slot array a table is created with.
pub const MIN_CAPACITY: usize = 8;

/// One position of the slot array.
#[derive(Debug)]
pub(crate) enum Slot<V> {
    Empty,
    /// Left behind by `remove`/`pop` so probes passing through keep going.
    Tombstone,
    Occupied(Item<V>),
}

/// Where a probe for a key ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Probe {
    /// An occupied slot holds an equal key.
    Found(usize),
    /// The key is absent; the index is where it would be placed.
    Vacant(usize),
    /// Wrapped around without meeting the key, an empty slot, or a tombstone.
    Full,
}

pub struct Table<V, H = OneAtATime> {
    slots: Vec<Slot<V>>,
    len: usize,
    hasher: H,
    destructor: Destructor<V>,
    status: Status,
}

/// Iterator over occupied slots in ascending index order.
pub struct Iter<'a, V> {
    it: core::slice::Iter<'a, Slot<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a Item<V>;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.by_ref().find_map(|s| match s {
            Slot::Occupied(item) => Some(item),
            _ => None,
        })
    }
}

/// Mutable iterator over occupied slots in ascending index order.
pub struct IterMut<'a, V> {
    it: core::slice::IterMut<'a, Slot<V>>,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = &'a mut Item<V>;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.by_ref().find_map(|s| match s {
            Slot::Occupied(item) => Some(item),
            _ => None,
        })
    }
}

impl<V: 'static> Table<V> {
    pub fn new() -> Result<Self, TableError> {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_capacity_and_hasher(capacity, OneAtATime)
    }
}

/// Next capacity on growth, or `None` when doubling would overflow.
pub(crate) fn doubled_capacity(capacity: usize) -> Option<usize> {
    #[cfg(test)]
    if faults::DOUBLING_OVERFLOWS.with(|f| f.get()) {
        return None;
    }
    capacity.checked_mul(2)
}

fn alloc_slots<V>(capacity: usize) -> Result<Vec<Slot<V>>, TableError> {
    let mut slots = Vec::new();
    #[cfg(test)]
    let injected = faults::SLOT_ALLOC_FAILS.with(|f| f.get());
    #[cfg(not(test))]
    let injected = false;
    if injected || slots.try_reserve_exact(capacity).is_err() {
        error!("failed to allocate a slot array of {} entries", capacity);
        return Err(TableError::Mem);
    }
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots)
}


// Accessors that need neither hashing nor the value's lifetime.
impl<V, H> Table<V, H> {
    /// Number of live items; tombstones are not counted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the slot array. Always a power of two, at least 8.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Outcome of the last mutating operation.
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Items in ascending slot order.
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

    /// Visit occupied slots in ascending index order until `callback`
    /// returns `false`.
    pub fn enumerate<F>(&self, mut callback: F)
    where
        F: FnMut(&Item<V>) -> bool,
    {
        for item in self.iter() {
            if !callback(item) {
                break;
            }
        }
    }

    /// Install a destructor and return the previous one. `None` restores
    /// the default, which just drops the item.
    pub fn set_destructor(&mut self, destructor: Option<Destructor<V>>) -> Destructor<V>
    where
        V: 'static,
    {
        let next = destructor.unwrap_or_else(|| Box::new(default_destructor::<V>));
        mem::replace(&mut self.destructor, next)
    }

    /// Tear the table down, running the destructor for every item.
    pub fn destroy(self) {
        drop(self);
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> &[Slot<V>] {
        &self.slots
    }

    fn latch<T>(&mut self, r: Result<T, TableError>) -> Result<T, TableError> {
        self.status = Status::from(&r);
        r
    }
}

impl<V, H> Table<V, H>
where
    V: 'static,
    H: KeyHasher,
{
    /// Create a table with at least `capacity` slots, hashing keys with
    /// `hasher`. The capacity is raised to 8 and rounded up to a power of
    /// two.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: H) -> Result<Self, TableError> {
        let capacity = capacity
            .max(MIN_CAPACITY)
            .checked_next_power_of_two()
            .ok_or(TableError::Mem)?;
        Ok(Self {
            slots: alloc_slots(capacity)?,
            len: 0,
            hasher,
            destructor: Box::new(default_destructor::<V>),
            status: Status::Ok,
        })
    }
}

impl<V, H> Table<V, H>
where
    H: KeyHasher,
{
    #[inline]
    fn home_index(&self, key: &[u8], capacity: usize) -> usize {
        self.hasher.hash(key) as usize % capacity
    }

    /// Linear probe from the key's home slot.
    ///
    /// Stops at an equal key or an empty slot. The first tombstone seen is
    /// preferred as the placement target over the empty slot that ends the
    /// scan, and also resolves a scan that wraps all the way around.
    pub(crate) fn probe(&self, key: &[u8]) -> Probe {
        let capacity = self.slots.len();
        if capacity == 0 {
            return Probe::Full;
        }
        let home = self.home_index(key, capacity);
        let mut reusable = None;
        for step in 0..capacity {
            let idx = (home + step) % capacity;
            match &self.slots[idx] {
                Slot::Empty => return Probe::Vacant(reusable.unwrap_or(idx)),
                Slot::Tombstone => {
                    reusable.get_or_insert(idx);
                }
                Slot::Occupied(item) if item.matches(key) => return Probe::Found(idx),
                Slot::Occupied(_) => trace!("collision at slot {} (home {})", idx, home),
            }
        }
        match reusable {
            Some(idx) => Probe::Vacant(idx),
            None => Probe::Full,
        }
    }

    /// Double the slot array and rehash every live item into it, dropping
    /// tombstones. A doubling that would overflow is a no-op.
    ///
    /// `set` grows on its own once the table is half full; callers only
    /// need this after a `Full` result.
    pub fn grow(&mut self) -> Result<(), TableError> {
        let r = self.double();
        self.latch(r)
    }

    fn double(&mut self) -> Result<(), TableError> {
        let old = self.capacity();
        let Some(capacity) = doubled_capacity(old) else {
            warn!("capacity {} cannot be doubled; not growing", old);
            return Ok(());
        };
        let mut fresh = alloc_slots(capacity)?;
        for slot in mem::take(&mut self.slots) {
            if let Slot::Occupied(item) = slot {
                let mut idx = self.home_index(item.key(), capacity);
                while !matches!(fresh[idx], Slot::Empty) {
                    idx = (idx + 1) % capacity;
                }
                fresh[idx] = Slot::Occupied(item);
            }
        }
        self.slots = fresh;
        debug!(
            "grew table from {} to {} slots ({} live items)",
            old, capacity, self.len
        );
        Ok(())
    }

    pub fn find(&self, key: &[u8]) -> Option<&Item<V>> {
        match self.probe(key) {
            Probe::Found(idx) => match &self.slots[idx] {
                Slot::Occupied(item) => Some(item),
                _ => None,
            },
            _ => None,
        }
    }

    /// Like [`find`](Self::find), with mutable access to the value. The key
    /// stays immutable.
    pub fn find_mut(&mut self, key: &[u8]) -> Option<&mut Item<V>> {
        match self.probe(key) {
            Probe::Found(idx) => match &mut self.slots[idx] {
                Slot::Occupied(item) => Some(item),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        matches!(self.probe(key), Probe::Found(_))
    }

    /// Insert `value` under a copy of `key`, replacing (and destroying) any
    /// item already stored under an equal key.
    pub fn set(&mut self, key: &[u8], value: V) -> Result<(), TableError> {
        self.set_sized(key, value, Item::<V>::DEFAULT_RECORD_SIZE)
    }

    /// [`set`](Self::set) with an explicit declared record size, which must
    /// cover at least [`HEADER_SIZE`].
    pub fn set_sized(&mut self, key: &[u8], value: V, record_size: usize) -> Result<(), TableError> {
        let r = self.insert(key, value, record_size);
        self.latch(r)
    }

    fn insert(&mut self, key: &[u8], value: V, record_size: usize) -> Result<(), TableError> {
        if record_size < HEADER_SIZE {
            return Err(TableError::item_size(record_size));
        }
        let key = copy_key(key)?;
        let mut probe = self.probe(&key);
        if !matches!(probe, Probe::Found(_)) && self.len + 1 > self.capacity() / 2 {
            self.double()?;
            probe = self.probe(&key);
        }
        let item = Item::new(key, record_size, value);
        match probe {
            Probe::Found(idx) => {
                if let Slot::Occupied(old) = mem::replace(&mut self.slots[idx], Slot::Occupied(item)) {
                    (self.destructor)(old);
                }
            }
            Probe::Vacant(idx) => {
                self.slots[idx] = Slot::Occupied(item);
                self.len += 1;
            }
            Probe::Full => {
                warn!(
                    "no free slot for a {}-byte key in {} slots",
                    item.key_len(),
                    self.capacity()
                );
                return Err(TableError::Full);
            }
        }
        Ok(())
    }

    /// Take the item under `key` out of its slot, leaving a tombstone.
    fn detach(&mut self, key: &[u8]) -> Result<Option<Item<V>>, TableError> {
        match self.probe(key) {
            Probe::Found(idx) => match mem::replace(&mut self.slots[idx], Slot::Tombstone) {
                Slot::Occupied(item) => {
                    self.len -= 1;
                    Ok(Some(item))
                }
                other => {
                    self.slots[idx] = other;
                    Ok(None)
                }
            },
            Probe::Vacant(_) => Ok(None),
            Probe::Full => Err(TableError::Full),
        }
    }

    /// Remove and destroy the item under `key`. Returns whether it was found.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let r = self.detach(key);
        match self.latch(r) {
            Ok(Some(item)) => {
                (self.destructor)(item);
                true
            }
            _ => false,
        }
    }

    /// Remove the item under `key` and hand it to the caller without
    /// running the destructor.
    pub fn pop(&mut self, key: &[u8]) -> Option<Item<V>> {
        let r = self.detach(key);
        self.latch(r).ok().flatten()
    }
}

impl<V, H> Drop for Table<V, H> {
    fn drop(&mut self) {
        for slot in mem::take(&mut self.slots) {
            if let Slot::Occupied(item) = slot {
                (self.destructor)(item);
            }
        }
    }
}

impl<V, H> fmt::Debug for Table<V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl<'a, V, H> IntoIterator for &'a Table<V, H> {
    type Item = &'a Item<V>;
    type IntoIter = Iter<'a, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
