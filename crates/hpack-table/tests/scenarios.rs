mod helpers;

use hpack_table::{entry_size, HeaderTable, TableError, DEFAULT_HEADER_TABLE_SIZE};
use pretty_assertions::assert_eq;

const STATIC_LEN: usize = 61;

fn add(table: &mut HeaderTable<'_>, name: &str, value: &str) -> bool {
    table
        .try_add_entry(name.as_bytes().to_vec(), value.as_bytes().to_vec())
        .is_some()
}

/// Sum of entry sizes, recomputed from what the table exposes.
fn recomputed_size(table: &HeaderTable<'_>) -> usize {
    table.dynamic_entries().iter().map(|e| e.size()).sum()
}

#[test]
fn test_first_insert_gets_first_dynamic_index() {
    helpers::setup_tracing();

    let mut table = HeaderTable::new();
    // `:method: GET` would be found in the static table at 2
    assert!(add(&mut table, "x-method", "GET"));

    assert_eq!(table.size(), entry_size(b"x-method", b"GET"));
    assert_eq!(
        table.get_by_name_and_value(b"x-method", b"GET"),
        Some(STATIC_LEN + 1)
    );
}

#[test]
fn test_same_name_new_value_shadows_by_name() {
    helpers::setup_tracing();

    let mut table = HeaderTable::new();
    add(&mut table, "x-session", "first");
    add(&mut table, "x-session", "second");

    // the newest entry wins name lookups
    assert_eq!(table.get_by_name(b"x-session"), Some(STATIC_LEN + 1));
    assert_eq!(
        table.get_by_name_and_value(b"x-session", b"second"),
        Some(STATIC_LEN + 1)
    );
    // the first one is still there, one slot further
    assert_eq!(
        table.get_by_name_and_value(b"x-session", b"first"),
        Some(STATIC_LEN + 2)
    );
    assert_eq!(table.len(), 2);
}

#[test]
fn test_oldest_entries_are_evicted_first() {
    helpers::setup_tracing();

    let mut table = HeaderTable::with_settings_bound(256);
    let mut inserted = Vec::new();
    for i in 0..20 {
        let value = format!("value-{i:04}");
        assert!(add(&mut table, "x-counter", &value));
        inserted.push(value);
        assert!(table.size() <= table.max_size());
        assert_eq!(table.size(), recomputed_size(&table));
    }

    // each entry is 9 + 10 + 32 = 51 octets, so 5 fit in 256
    assert_eq!(table.len(), 5);
    for (i, value) in inserted.iter().enumerate() {
        let found = table.get_by_name_and_value(b"x-counter", value.as_bytes());
        if i < 15 {
            assert_eq!(found, None, "{value} should have been evicted");
        } else {
            assert_eq!(found, Some(STATIC_LEN + 20 - i));
        }
    }
}

#[test]
fn test_older_entry_index_keeps_growing() {
    helpers::setup_tracing();

    let mut table = HeaderTable::new();
    add(&mut table, "x-a", "1");
    add(&mut table, "x-b", "2");

    let a = table.get_by_name(b"x-a").unwrap();
    let b = table.get_by_name(b"x-b").unwrap();
    assert!(a > b);

    for i in 0..10 {
        add(&mut table, "x-filler", &i.to_string());
        let a_now = table.get_by_name(b"x-a").unwrap();
        let b_now = table.get_by_name(b"x-b").unwrap();
        assert!(a_now > b_now);
        assert_eq!(a_now, a + i + 1);
    }
}

#[test]
fn test_zero_settings_bound_empties_and_stays_empty() {
    helpers::setup_tracing();

    let mut table = HeaderTable::new();
    add(&mut table, "x-a", "1");
    add(&mut table, "x-b", "2");

    table.set_settings_bound(0);
    assert!(table.is_empty());
    assert_eq!(table.size(), 0);

    assert_eq!(
        table.try_set_max_size(DEFAULT_HEADER_TABLE_SIZE),
        Err(TableError::MaxSizeExceedsBound {
            requested: DEFAULT_HEADER_TABLE_SIZE,
            bound: 0
        })
    );
    assert_eq!(table.max_size(), 0);

    assert!(!add(&mut table, "x-c", "3"));
    assert!(table.is_empty());
    assert_eq!(table.get_by_name(b"x-a"), None);
}

#[test]
fn test_set_max_size_zero_is_idempotent() {
    helpers::setup_tracing();

    let mut table = HeaderTable::new();
    for i in 0..10 {
        add(&mut table, "x-n", &i.to_string());
    }

    table.set_max_size(0);
    assert_eq!(table.len(), 0);
    assert_eq!(table.size(), 0);

    table.set_max_size(0);
    assert_eq!(table.len(), 0);
    assert_eq!(table.size(), 0);
    assert_eq!(table.insertions_count(), 10);
}

#[test]
fn test_entry_of_exactly_max_size() {
    helpers::setup_tracing();

    let mut table = HeaderTable::with_settings_bound(100);
    add(&mut table, "x-a", "1");
    add(&mut table, "x-b", "2");

    // 4 + 64 + 32 = 100
    let value = "v".repeat(64);
    assert!(add(&mut table, "x-cc", &value));
    assert_eq!(table.len(), 1);
    assert_eq!(table.size(), 100);
    assert_eq!(table.get_by_name(b"x-a"), None);
    assert_eq!(table.get_by_name(b"x-b"), None);

    // one octet too many: nothing is added and the table ends up empty
    let value = "v".repeat(65);
    assert!(!add(&mut table, "x-cc", &value));
    assert!(table.is_empty());
    assert_eq!(table.size(), 0);
    assert_eq!(table.insertions_count(), 3);

    // with the table already empty, that's a no-op
    assert!(!add(&mut table, "x-cc", &value));
    assert!(table.is_empty());
    assert_eq!(table.insertions_count(), 3);
    assert_eq!(table.get_by_name(b"x-cc"), None);
}

#[test]
fn test_separate_bound_and_capacity() {
    helpers::setup_tracing();

    let mut table = HeaderTable::new();
    table.set_settings_bound(65536);
    assert_eq!(table.max_size(), 65536);

    // advertise a large bound, work with a small table
    table.set_max_size(128);
    assert_eq!(table.settings_bound(), 65536);
    for i in 0..10 {
        add(&mut table, "x-n", &i.to_string());
    }
    assert!(table.size() <= 128);

    table.set_max_size(65536);
    assert_eq!(table.max_size(), 65536);
}

#[test]
#[should_panic(expected = "evict count (3) > live entries (2)")]
fn test_evicting_past_live_entries_panics() {
    let mut table = HeaderTable::new();
    add(&mut table, "x-a", "1");
    add(&mut table, "x-b", "2");
    table.evict(3);
}
