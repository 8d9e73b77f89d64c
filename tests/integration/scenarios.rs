//! End-to-end scenarios through the account directory

use crate::common::*;

#[test]
fn prefix_filter_and_comparator() {
    let store = TestStore::new();
    let ctx = ctx();
    store.put("/a/b", json!({"kind": "x", "rank": 2}));
    store.put("/a/c", json!({"kind": "y", "rank": 1}));
    store.put("/a/d", json!({"kind": "x", "rank": 1}));
    store.put("/a/e/f", json!({"kind": "x", "rank": 3}));
    store.put("/z", json!({"kind": "x", "rank": 0}));

    // /a is a container now, so it cannot also hold a record
    let err = store
        .model
        .store(&ctx, &p("/a"), &Record::new(json!({"kind": "x"})))
        .unwrap_err();
    assert_eq!(err.error_code(), "RequestInvalid");

    let paths: Vec<Path> = store
        .model
        .start_query()
        .prefix(p("/a"))
        .filter_eq("kind", json!("x"))
        .order_by(|l, r| {
            let rank = |o: &arbordb::Object| o.record.field("rank").and_then(|v| v.as_i64());
            rank(l).cmp(&rank(r)).then_with(|| l.path.cmp(&r.path))
        })
        .execute_paths(&ctx)
        .unwrap()
        .collect();
    assert_eq!(paths, vec![p("/a/d"), p("/a/b"), p("/a/e/f")]);
    ctx.close();
}

#[test]
fn relate_then_read_both_directions() {
    let store = TestStore::new();
    let ctx = ctx();
    let likes = rel("/a", "likes", "/b");

    store.model.relate(&ctx, &likes).unwrap();
    assert_eq!(store.model.outbound_relations(&ctx, &p("/a")).unwrap(), vec![likes.clone()]);
    assert_eq!(store.model.inbound_relations(&ctx, &p("/b")).unwrap(), vec![likes.clone()]);
    assert!(store.model.inbound_relations(&ctx, &p("/a")).unwrap().is_empty());
    assert!(store.model.outbound_relations(&ctx, &p("/b")).unwrap().is_empty());
}

#[test]
fn relations_survive_reopen() {
    let store = TestStore::new();
    store.put("/a", json!({}));
    store
        .model
        .relate(&ctx(), &rel("/a", "likes", "/b"))
        .unwrap();

    let store = store.reopen();
    assert_eq!(
        store.model.outbound_relations(&ctx(), &p("/a")).unwrap(),
        vec![rel("/a", "likes", "/b")]
    );
    assert_eq!(store.get("/a").data, json!({}));
}

#[test]
fn remove_empties_index_directories() {
    let store = TestStore::new();
    let ctx = ctx();
    store.put("/users/ann", json!({"name": "Ann"}));
    store.put("/users/bob", json!({"name": "Bob"}));
    store.model.relate(&ctx, &rel("/users/ann", "follows", "/users/bob")).unwrap();
    store.model.relate(&ctx, &rel("/users/bob", "follows", "/users/ann")).unwrap();

    assert!(store.model.remove(&ctx, &p("/users/ann")).unwrap());

    let ann_index = store.relations_dir().join("users").join("ann");
    assert!(dir_is_empty_or_missing(&ann_index.join(".out")));
    assert!(dir_is_empty_or_missing(&ann_index.join(".in")));
    assert!(store.model.relations(&ctx, &p("/users/ann")).unwrap().is_empty());
    assert!(!store.record_file("/users/ann").exists());
}

// Removal only clears the removed path's own index entries. Edges recorded
// on the far side keep pointing at the removed path until someone unrelates
// them. If removal ever starts cascading to the far side, this test is the
// one to update.
#[test]
fn remove_leaves_far_side_edges_orphaned() {
    let store = TestStore::new();
    let ctx = ctx();
    store.put("/a", json!({}));
    store.put("/b", json!({}));
    store.model.relate(&ctx, &rel("/a", "likes", "/b")).unwrap();

    assert!(store.model.remove(&ctx, &p("/b")).unwrap());

    // /a still lists the edge even though /b is gone
    let dangling = store.model.outbound_relations(&ctx, &p("/a")).unwrap();
    assert_eq!(dangling, vec![rel("/a", "likes", "/b")]);
    assert!(!store.model.exists(&ctx, &p("/b")).unwrap());
    assert!(store.model.inbound_relations(&ctx, &p("/b")).unwrap().is_empty());

    // Callers can filter orphans at read time
    let live: Vec<_> = dangling
        .into_iter()
        .filter(|r| store.model.exists(&ctx, &r.to).unwrap_or(false))
        .collect();
    assert!(live.is_empty());
}

#[test]
fn same_scenario_on_memory_backend() {
    let store = TestStore::memory();
    let ctx = ctx();
    store.put("/a/b", json!({"kind": "x"}));
    store.put("/a/c", json!({"kind": "y"}));
    store.model.relate(&ctx, &rel("/a/b", "likes", "/a/c")).unwrap();

    let matched: Vec<Path> = store
        .model
        .start_query()
        .prefix(p("/a"))
        .filter_eq("kind", json!("x"))
        .execute_paths(&ctx)
        .unwrap()
        .collect();
    assert_eq!(matched, vec![p("/a/b")]);
    assert_eq!(
        store.model.inbound_relations(&ctx, &p("/a/c")).unwrap(),
        vec![rel("/a/b", "likes", "/a/c")]
    );
    assert!(!store.objects_dir().exists());
}

#[test]
fn paging_through_a_large_prefix() {
    let store = TestStore::new();
    let ctx = ctx();
    for i in 0..25 {
        store.put(&format!("/items/i{:02}", i), json!({"n": i}));
    }

    let mut seen = Vec::new();
    for page in 0.. {
        let batch: Vec<Path> = store
            .model
            .start_query()
            .prefix(p("/items"))
            .order_by_field("n", Direction::Descending)
            .page_size(10)
            .page(page)
            .execute_paths(&ctx)
            .unwrap()
            .collect();
        if batch.is_empty() {
            break;
        }
        assert!(batch.len() <= 10);
        seen.extend(batch);
    }
    assert_eq!(seen.len(), 25);
    assert_eq!(seen[0], p("/items/i24"));
    assert_eq!(seen[24], p("/items/i00"));
}
