#![cfg(test)]

// Property tests for Table kept inside the crate so they can inspect the
// slot array directly.

use crate::item::{default_destructor, Item};
use crate::table::{Slot, Table};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    Remove(usize),
    Pop(usize),
    Find(usize),
    Contains(Vec<u8>),
    Mutate(usize, i32),
    Enumerate(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<OpI>)> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..6), 1..=12).prop_flat_map(
        |pool| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let contains_pool = proptest::sample::select(pool.clone());
            let op = prop_oneof![
                (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
                idx.clone().prop_map(OpI::Remove),
                idx.clone().prop_map(OpI::Pop),
                idx.clone().prop_map(OpI::Find),
                prop_oneof![
                    contains_pool,
                    proptest::collection::vec(any::<u8>(), 0..6)
                ]
                .prop_map(OpI::Contains),
                (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
                (0usize..16).prop_map(OpI::Enumerate),
            ];
            proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
        },
    )
}

fn run_scenario<H>(mut sut: Table<i32, H>, pool: Vec<Vec<u8>>, ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    H: crate::KeyHasher,
{
    let mut model: HashMap<Vec<u8>, i32> = HashMap::new();
    let destroyed = Rc::new(Cell::new(0usize));
    let d = Rc::clone(&destroyed);
    let _previous = sut.set_destructor(Some(Box::new(move |item: Item<i32>| {
        d.set(d.get() + 1);
        default_destructor(item);
    })));

    for op in ops {
        let before = destroyed.get();
        match op {
            OpI::Set(i, v) => {
                let k = &pool[i];
                let replaced = model.insert(k.clone(), v).is_some();
                prop_assert_eq!(sut.set(k, v), Ok(()));
                prop_assert!(sut.status().is_ok());
                // Overwrite destroys exactly the previous record.
                prop_assert_eq!(destroyed.get(), before + replaced as usize);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let present = model.remove(k).is_some();
                prop_assert_eq!(sut.remove(k), present);
                prop_assert_eq!(destroyed.get(), before + present as usize);
            }
            OpI::Pop(i) => {
                let k = &pool[i];
                match (sut.pop(k), model.remove(k)) {
                    (Some(item), Some(mv)) => {
                        prop_assert_eq!(item.key(), &k[..]);
                        prop_assert_eq!(*item.value(), mv);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "pop mismatch: {:?} vs {:?}", s, m),
                }
                prop_assert_eq!(destroyed.get(), before);
            }
            OpI::Find(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.find(k).map(|it| *it.value()), model.get(k).copied());
            }
            OpI::Contains(k) => {
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(item) = sut.find_mut(k) {
                    let v = item.value_mut();
                    *v = v.saturating_add(d);
                }
                if let Some(mv) = model.get_mut(k) {
                    *mv = mv.saturating_add(d);
                }
            }
            OpI::Enumerate(limit) => {
                let mut seen = Vec::new();
                sut.enumerate(|item| {
                    seen.push(item.key().to_vec());
                    seen.len() < limit
                });
                let all: Vec<Vec<u8>> = sut.iter().map(|it| it.key().to_vec()).collect();
                let expect = limit.max(1).min(all.len());
                prop_assert_eq!(&seen[..], &all[..expect]);
            }
        }

        // Post-conditions after each op
        // 1) Contents equal the model
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let mut contents: Vec<(Vec<u8>, i32)> =
            sut.iter().map(|it| (it.key().to_vec(), *it.value())).collect();
        let mut expected: Vec<(Vec<u8>, i32)> =
            model.iter().map(|(k, v)| (k.clone(), *v)).collect();
        contents.sort();
        expected.sort();
        prop_assert_eq!(contents, expected);
        // 2) Shape invariants
        prop_assert!(sut.capacity().is_power_of_two());
        prop_assert!(sut.capacity() >= 8);
        prop_assert!(sut.len() <= sut.capacity() / 2);
        let occupied = sut
            .slots()
            .iter()
            .filter(|s| matches!(s, Slot::Occupied(_)))
            .count();
        prop_assert_eq!(occupied, sut.len());
    }

    let live = sut.len();
    let before = destroyed.get();
    drop(sut);
    prop_assert_eq!(destroyed.get(), before + live);
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Map semantics: contents equal the keys last set and not since removed/popped.
// - Overwrite and remove fire the destructor once; pop and lookups never do.
// - Enumeration is ascending slot order and stops at the first `false`.
// - Capacity stays a power of two >= 8 with load <= 1/2; tombstones are not counted.
// - Drop destroys every remaining item.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: Table<i32> = Table::new().unwrap();
        run_scenario(sut, pool, ops)?;
    }
}

fn const_hash(_k: &[u8]) -> u32 {
    0
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hash). Every key shares one probe chain, so
// tombstone reuse and probing past tombstones are exercised constantly.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: Table<i32, fn(&[u8]) -> u32> =
            Table::with_capacity_and_hasher(8, const_hash as fn(&[u8]) -> u32).unwrap();
        run_scenario(sut, pool, ops)?;
    }
}
