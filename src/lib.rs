//! htable: an open-addressing hash table from byte-string keys to
//! caller-defined records.
//!
//! Internal Design:
//!
//! Summary
//! - One flat slot array; every slot is `Empty`, `Tombstone`, or
//!   `Occupied(Item<V>)`. Collisions resolve by linear probing with
//!   wraparound.
//! - Items own an independent copy of their key plus the caller's value;
//!   nothing the caller passes in is aliased after `set` returns.
//! - Hashing is a strategy type (`KeyHasher`, default Jenkins
//!   one-at-a-time); item teardown is a swappable boxed destructor.
//!
//! Constraints
//! - Single-threaded: no locking, no atomics. The boxed destructor keeps
//!   `Table` `!Send`/`!Sync`.
//! - Capacity is a power of two, at least 8, and only ever doubles.
//! - After any insert completes, live items are at most half the capacity.
//! - Keys are unique under byte equality.
//!
//! Probing and tombstones
//! - A probe starts at `hash(key) % capacity` and stops at an equal key or
//!   an empty slot. Tombstones never stop a probe.
//! - The first tombstone on the path is where a new key lands; a probe that
//!   wraps all the way around also settles on it. Only a wrap with no
//!   tombstone reports `Full`.
//! - Growth rehashes live items with the table's hasher into a fresh
//!   array, so tombstones never survive a doubling.
//!
//! Failure reporting
//! - Operations return `Result<_, TableError>` (or `bool`/`Option` for
//!   lookups and removals) and latch a matching `Status` on the table.
//! - Allocation is fallible throughout (`try_reserve_exact`); a failed
//!   operation leaves the table exactly as it was.
//!
//! Ownership
//! - `remove`, overwriting `set`, and drop hand items to the destructor.
//! - `pop` moves the item out; the table keeps nothing of it but a
//!   tombstone.
//!
//! Notes and non-goals
//! - No concurrency, persistence, or ordering beyond ascending slot order
//!   during enumeration.
//! - Callbacks passed to `enumerate` only see `&Item`; mutating the table
//!   from inside one is ruled out by borrowing.

mod error;
mod hash;
mod item;
mod table;
mod table_proptest;

// Public surface
pub use error::{Status, TableError};
pub use hash::{one_at_a_time, KeyHasher, OneAtATime};
pub use item::{default_destructor, Destructor, Item, HEADER_SIZE};
pub use table::{Iter, IterMut, Table, MIN_CAPACITY};
