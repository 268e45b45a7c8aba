use super::*;
use crate::testutil::mask;

#[test]
fn upsert_front_puts_new_rows_at_the_head() {
    let store = MaskStore::new();
    store.upsert_front(mask("1", "a"));
    store.upsert_front(mask("2", "b"));

    let names: Vec<String> = store.list().into_iter().map(|r| r.mask_name).collect();
    assert_eq!(names, ["b", "a"]);
}

#[test]
fn upsert_front_replaces_an_existing_id() {
    let store = MaskStore::new();
    store.upsert_front(mask("1", "a"));
    store.upsert_front(mask("2", "b"));
    store.upsert_front(mask("1", "a2"));

    let rows = store.list();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].mask_name, "a2");
    assert_eq!(rows[1].mask_name, "b");
}

#[test]
fn remove_is_a_no_op_for_unknown_ids() {
    let store = MaskStore::new();
    store.upsert_front(mask("1", "a"));
    store.remove(&MaskId("nope".to_string()));
    assert_eq!(store.len(), 1);
}

#[test]
fn replace_all_swaps_the_collection_wholesale() {
    let store = MaskStore::new();
    store.upsert_front(mask("1", "a"));
    store.replace_all(vec![mask("9", "x"), mask("8", "y")]);

    let ids: Vec<String> = store.list().into_iter().map(|r| r.id.0).collect();
    assert_eq!(ids, ["9", "8"]);
}

#[test]
fn snapshot_and_restore_round_trip_position() {
    let store = MaskStore::new();
    store.replace_all(vec![mask("1", "a"), mask("2", "b"), mask("3", "c")]);

    let (index, row) = store.snapshot(&MaskId("2".to_string())).expect("snapshot");
    assert_eq!(index, 1);

    store.remove(&MaskId("2".to_string()));
    store.restore_at(index, row);

    let ids: Vec<String> = store.list().into_iter().map(|r| r.id.0).collect();
    assert_eq!(ids, ["1", "2", "3"]);
}

#[test]
fn restore_at_clamps_to_the_current_length() {
    let store = MaskStore::new();
    store.replace_all(vec![mask("1", "a")]);
    store.restore_at(5, mask("2", "b"));

    let ids: Vec<String> = store.list().into_iter().map(|r| r.id.0).collect();
    assert_eq!(ids, ["1", "2"]);
}
