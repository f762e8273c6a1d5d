// Table integration suite.
//
// Each test documents the behavior being verified. The core invariants
// exercised through the public API:
// - Map semantics: a key is present iff it was last set and not since
//   removed or popped.
// - Ownership: the table stores its own copy of key and value; popped items
//   belong to the caller; the destructor runs on overwrite, remove, and
//   teardown only.
// - Growth: doubling keeps every key findable and capacity a power of two.
// - Status: every mutating call latches its outcome.
mod common;

use common::init_test_logger;
use htable::{
    default_destructor, Destructor, Item, KeyHasher, OneAtATime, Status, Table, TableError,
    HEADER_SIZE,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn counting_destructor<V: 'static>(log: &Rc<RefCell<Vec<Vec<u8>>>>) -> Destructor<V> {
    let log = Rc::clone(log);
    Box::new(move |item: Item<V>| {
        log.borrow_mut().push(item.key().to_vec());
        default_destructor(item);
    })
}

// Test: round trip through set/find.
// Verifies: key and value read back unchanged from a table-owned copy.
#[test]
fn set_then_find_returns_owned_copy() {
    init_test_logger();
    let mut t: Table<[u8; 4]> = Table::new().unwrap();
    let mut key = b"hello".to_vec();
    t.set(&key, *b"wxyz").unwrap();
    assert_eq!(t.status(), Status::Ok);

    let found = t.find(b"hello").expect("present");
    assert_eq!(found.key(), b"hello");
    assert_eq!(found.key_len(), 5);
    assert_eq!(found.value(), b"wxyz");
    assert_ne!(found.key().as_ptr(), key.as_ptr());

    // Scribbling over the caller's buffer does not reach the table.
    key.fill(0);
    assert!(t.find(b"hello").is_some());
}

// Test: overwrite semantics.
// Verifies: one item remains holding the new value; the destructor fired
// once, for the old record.
#[test]
fn overwrite_destroys_previous_record_once() {
    let destroyed = Rc::new(RefCell::new(Vec::new()));
    let mut t: Table<&'static str> = Table::new().unwrap();
    let _previous = t.set_destructor(Some(counting_destructor(&destroyed)));

    t.set(b"k", "v1").unwrap();
    t.set(b"k", "v2").unwrap();
    assert_eq!(t.len(), 1);
    assert_eq!(t.find(b"k").map(|i| *i.value()), Some("v2"));
    assert_eq!(*destroyed.borrow(), vec![b"k".to_vec()]);
}

// Test: remove semantics.
// Verifies: absent key is a no-op returning false; present key returns
// true, fires the destructor once, and is gone afterwards.
#[test]
fn remove_present_and_absent() {
    let destroyed = Rc::new(RefCell::new(Vec::new()));
    let mut t: Table<u32> = Table::new().unwrap();
    let _previous = t.set_destructor(Some(counting_destructor(&destroyed)));
    t.set(b"a", 1).unwrap();
    t.set(b"b", 2).unwrap();

    assert!(!t.remove(b"zzz"));
    assert_eq!(t.len(), 2);
    assert!(destroyed.borrow().is_empty());
    assert_eq!(t.status(), Status::Ok);

    assert!(t.remove(b"a"));
    assert_eq!(*destroyed.borrow(), vec![b"a".to_vec()]);
    assert!(t.find(b"a").is_none());
    assert!(!t.contains_key(b"a"));
    assert_eq!(t.len(), 1);
    assert!(!t.remove(b"a"));
}

// Test: pop transfers ownership.
// Verifies: caller gets the item intact, no destructor runs, the key is
// gone, and the item outlives the table.
#[test]
fn pop_hands_item_to_caller() {
    let destroyed = Rc::new(RefCell::new(Vec::new()));
    let mut t: Table<String> = Table::new().unwrap();
    let _previous = t.set_destructor(Some(counting_destructor(&destroyed)));
    t.set(b"word", "payload".to_string()).unwrap();

    let item = t.pop(b"word").expect("present");
    assert!(destroyed.borrow().is_empty());
    assert!(t.find(b"word").is_none());
    assert!(t.is_empty());
    assert!(t.pop(b"word").is_none());

    drop(t);
    assert!(destroyed.borrow().is_empty());
    let (key, value) = item.into_parts();
    assert_eq!(&*key, b"word");
    assert_eq!(value, "payload");
}

// Test: growth keeps contents.
// Verifies: crossing half capacity doubles once per threshold, every key
// stays findable, capacity stays a power of two.
#[test]
fn growth_preserves_every_key() {
    init_test_logger();
    let mut t: Table<usize> = Table::with_capacity(8).unwrap();
    let mut capacities = vec![t.capacity()];
    for i in 0..1000usize {
        t.set(format!("key-{i}").as_bytes(), i).unwrap();
        if *capacities.last().unwrap() != t.capacity() {
            capacities.push(t.capacity());
        }
        assert!(t.len() <= t.capacity() / 2);
    }
    assert_eq!(capacities, vec![8, 16, 32, 64, 128, 256, 512, 1024, 2048]);
    for i in 0..1000usize {
        assert_eq!(t.find(format!("key-{i}").as_bytes()).map(|it| *it.value()), Some(i));
    }
}

// Test: custom hash strategy.
// Verifies: the supplied function is the one consulted, is reachable via
// `hasher()`, and a degenerate hash still yields correct map behavior.
#[test]
fn custom_hasher_is_used() {
    let calls = Rc::new(Cell::new(0usize));
    let c = Rc::clone(&calls);
    let hasher = move |k: &[u8]| {
        c.set(c.get() + 1);
        k.len() as u32
    };
    let mut t = Table::with_capacity_and_hasher(8, hasher).unwrap();
    t.set(b"ab", 1).unwrap();
    t.set(b"cd", 2).unwrap();
    t.set(b"xyz", 3).unwrap();
    assert!(calls.get() >= 3);
    assert_eq!(t.find(b"cd").map(|i| *i.value()), Some(2));
    assert_eq!(t.find(b"ab").map(|i| *i.value()), Some(1));
    assert!(t.find(b"ef").is_none());

    let before = calls.get();
    assert_eq!(KeyHasher::hash(t.hasher(), b"xyz"), 3);
    assert_eq!(calls.get(), before + 1);
}

// Test: enumeration order and early stop.
// Verifies: items come back in ascending slot order, skipping holes left
// by removals, and a `false` from the callback stops the walk.
#[test]
fn enumerate_visits_in_slot_order_and_stops() {
    // Home slot is the key's single byte, so slot order is key order.
    let by_byte = |k: &[u8]| k[0] as u32;
    let mut t = Table::with_capacity_and_hasher(16, by_byte).unwrap();
    for b in [1u8, 2, 3, 4, 5, 6] {
        t.set(&[b], b).unwrap();
    }
    assert!(t.remove(&[2]));
    let _ = t.pop(&[5]);

    let mut all = Vec::new();
    t.enumerate(|item| {
        all.push(*item.value());
        true
    });
    assert_eq!(all, vec![1, 3, 4, 6]);

    let mut visited = Vec::new();
    t.enumerate(|item| {
        visited.push(*item.value());
        *item.value() != 3
    });
    assert_eq!(visited, vec![1, 3]);

    let via_iter: Vec<u8> = t.iter().map(|i| *i.value()).collect();
    assert_eq!(via_iter, all);
}

// Test: iter_mut edits values in place.
#[test]
fn iter_mut_updates_values() {
    let mut t: Table<u32> = Table::new().unwrap();
    for (i, k) in ["x", "y", "z"].iter().enumerate() {
        t.set(k.as_bytes(), i as u32).unwrap();
    }
    for item in t.iter_mut() {
        *item.value_mut() += 10;
    }
    let mut values: Vec<u32> = (&t).into_iter().map(|i| *i.value()).collect();
    values.sort();
    assert_eq!(values, vec![10, 11, 12]);
}

// Test: destructor swap.
// Verifies: set_destructor returns the previous destructor; `None`
// restores the default; the returned destructor is still callable.
#[test]
fn set_destructor_returns_previous() {
    let first = Rc::new(RefCell::new(Vec::new()));
    let mut t: Table<u8> = Table::new().unwrap();
    let _default = t.set_destructor(Some(counting_destructor(&first)));

    t.set(b"a", 1).unwrap();
    assert!(t.remove(b"a"));
    assert_eq!(first.borrow().len(), 1);

    let mut previous = t.set_destructor(None);
    t.set(b"b", 2).unwrap();
    assert!(t.remove(b"b"));
    assert_eq!(first.borrow().len(), 1, "default destructor is back");

    // The handed-back destructor still works on a popped item.
    t.set(b"c", 3).unwrap();
    previous(t.pop(b"c").unwrap());
    assert_eq!(*first.borrow(), vec![b"a".to_vec(), b"c".to_vec()]);
}

// Test: payload-owned resources.
// Verifies: a custom destructor can release extra resources held by the
// value before the item drops; teardown covers every live item.
#[test]
fn custom_destructor_releases_payload_resources() {
    let released = Rc::new(Cell::new(0usize));
    let r = Rc::clone(&released);
    let mut t: Table<Vec<String>> = Table::new().unwrap();
    let _previous = t.set_destructor(Some(Box::new(move |item: Item<Vec<String>>| {
        let (_key, names) = item.into_parts();
        r.set(r.get() + names.len());
    })));
    t.set(b"one", vec!["a".into()]).unwrap();
    t.set(b"two", vec!["b".into(), "c".into()]).unwrap();
    t.set(b"one", vec![]).unwrap();
    assert_eq!(released.get(), 1);
    t.destroy();
    assert_eq!(released.get(), 3);
}

// Test: declared record sizes.
// Verifies: an undersized declaration is rejected with ItemSize and
// latches ItemSizeError; valid sizes are kept on the item.
#[test]
fn record_size_validation_and_status() {
    let mut t: Table<u64> = Table::new().unwrap();
    assert_eq!(
        t.set_sized(b"k", 1, 0),
        Err(TableError::ItemSize {
            size: 0,
            header: HEADER_SIZE
        })
    );
    assert_eq!(t.status(), Status::ItemSizeError);
    assert!(t.is_empty());

    t.set(b"k", 1).unwrap();
    assert_eq!(t.status(), Status::Ok);
    assert_eq!(
        t.find(b"k").map(Item::record_size),
        Some(Item::<u64>::DEFAULT_RECORD_SIZE)
    );

    t.set_sized(b"k", 2, HEADER_SIZE + 64).unwrap();
    assert_eq!(t.find(b"k").map(Item::record_size), Some(HEADER_SIZE + 64));
}

// Test: status channel for absent handles.
#[test]
fn status_of_absent_table_is_unknown() {
    assert_eq!(Status::of::<u8, OneAtATime>(None), Status::Unknown);
    let t: Table<u8> = Table::new().unwrap();
    assert_eq!(Status::of(Some(&t)), Status::Ok);
}

// Test: impossible capacities fail instead of aborting.
#[test]
fn huge_capacity_reports_mem_error() {
    assert_eq!(
        Table::<u8>::with_capacity(usize::MAX).unwrap_err(),
        TableError::Mem
    );
}

// Test: word frequency counting, the table's canonical client.
// Verifies: find_mut increments in place; set inserts first sightings.
#[test]
fn word_frequency_count() {
    init_test_logger();
    let text = "the cat and the dog and the bird\nthe end\t";
    let mut t: Table<usize> = Table::with_capacity(128).unwrap();
    for word in text.split([' ', '\n', '\t']).filter(|w| !w.is_empty()) {
        match t.find_mut(word.as_bytes()) {
            Some(item) => *item.value_mut() += 1,
            None => t.set(word.as_bytes(), 1).unwrap(),
        }
        assert_eq!(t.status(), Status::Ok);
    }
    let count = |w: &str| t.find(w.as_bytes()).map(|i| *i.value());
    assert_eq!(count("the"), Some(4));
    assert_eq!(count("and"), Some(2));
    assert_eq!(count("end"), Some(1));
    assert_eq!(count("fish"), None);
    assert_eq!(t.len(), 6);
}
