//! Property tests through the full directory stack

use crate::common::*;
use proptest::prelude::*;

fn arb_segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,6}"
}

fn arb_path() -> impl Strategy<Value = Path> {
    proptest::collection::vec(arb_segment(), 1..4)
        .prop_map(|segments| Path::parse(&format!("/{}", segments.join("/"))).unwrap())
}

fn arb_data() -> impl Strategy<Value = serde_json::Value> {
    (any::<i64>(), "[ -~]{0,24}", any::<bool>())
        .prop_map(|(n, s, b)| json!({"n": n, "s": s, "b": b, "nested": {"list": [n, s]}}))
}

fn arb_relation() -> impl Strategy<Value = Relation> {
    (
        arb_path(),
        proptest::sample::select(vec!["likes", "owns", "follows"]),
        arb_path(),
    )
        .prop_map(|(from, name, to)| Relation::new(from, Name::new(name).unwrap(), to))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn store_then_load_returns_the_record(path in arb_path(), data in arb_data(), tag in arb_segment()) {
        let store = TestStore::new();
        let ctx = ctx();
        let record = Record::new(data).with_type(tag);
        store.model.store(&ctx, &path, &record).unwrap();
        let loaded = store.model.load(&ctx, &path).unwrap().into_record().unwrap();
        prop_assert_eq!(loaded, record);
        prop_assert!(store.model.exists(&ctx, &path).unwrap());
    }

    #[test]
    fn relate_is_idempotent(r in arb_relation()) {
        let store = TestStore::new();
        let ctx = ctx();
        store.model.relate(&ctx, &r).unwrap();
        store.model.relate(&ctx, &r).unwrap();
        let out = store.model.outbound_relations(&ctx, &r.from).unwrap();
        let inb = store.model.inbound_relations(&ctx, &r.to).unwrap();
        prop_assert_eq!(out.iter().filter(|x| **x == r).count(), 1);
        prop_assert_eq!(inb.iter().filter(|x| **x == r).count(), 1);
    }

    #[test]
    fn unrelate_removes_both_sides(r in arb_relation()) {
        let store = TestStore::new();
        let ctx = ctx();
        store.model.relate(&ctx, &r).unwrap();
        prop_assert!(store.model.unrelate(&ctx, &r).unwrap());
        prop_assert!(!store.model.unrelate(&ctx, &r).unwrap());
        prop_assert!(!store.model.outbound_relations(&ctx, &r.from).unwrap().contains(&r));
        prop_assert!(!store.model.inbound_relations(&ctx, &r.to).unwrap().contains(&r));
    }

    #[test]
    fn remove_clears_own_index_on_disk(path in arb_path(), others in proptest::collection::vec(arb_path(), 1..4)) {
        let store = TestStore::new();
        let ctx = ctx();
        store.model.store(&ctx, &path, &Record::default()).unwrap();
        for other in &others {
            if other.starts_with(&path) || path.starts_with(other) {
                continue;
            }
            store.model.relate(&ctx, &Relation::new(path.clone(), Name::new("out").unwrap(), other.clone())).unwrap();
            store.model.relate(&ctx, &Relation::new(other.clone(), Name::new("in").unwrap(), path.clone())).unwrap();
        }

        prop_assert!(store.model.remove(&ctx, &path).unwrap());

        let mut index = store.relations_dir();
        for segment in path.segments() {
            index.push(segment.as_str());
        }
        prop_assert!(dir_is_empty_or_missing(&index.join(".out")));
        prop_assert!(dir_is_empty_or_missing(&index.join(".in")));
        prop_assert!(store.model.relations(&ctx, &path).unwrap().is_empty());
    }

    #[test]
    fn a_path_is_never_both_record_and_container(parent in arb_path(), child in arb_segment()) {
        let store = TestStore::new();
        let ctx = ctx();
        let nested = parent.child(Name::new(child).unwrap());

        store.model.store(&ctx, &nested, &Record::default()).unwrap();
        let err = store.model.store(&ctx, &parent, &Record::default()).unwrap_err();
        prop_assert_eq!(err.error_code(), "RequestInvalid");
        prop_assert!(store.model.load(&ctx, &parent).unwrap().is_container());

        // Once the child is gone the parent can hold a record
        store.model.remove(&ctx, &nested).unwrap();
        store.model.store(&ctx, &parent, &Record::default()).unwrap();
        let err = store.model.store(&ctx, &nested, &Record::default()).unwrap_err();
        prop_assert_eq!(err.error_code(), "RequestInvalid");
    }

    #[test]
    fn pages_are_disjoint_windows(count in 0usize..30, size in 1usize..8, page in 0usize..6) {
        let store = TestStore::memory();
        let ctx = ctx();
        for i in 0..count {
            store.put(&format!("/items/n{:03}", i), json!({"i": i}));
        }

        let window: Vec<Path> = store
            .model
            .start_query()
            .prefix(p("/items"))
            .order_by_field("i", Direction::Ascending)
            .page_size(size)
            .page(page)
            .execute_paths(&ctx)
            .unwrap()
            .collect();

        let start = (page * size).min(count);
        let end = ((page + 1) * size).min(count);
        let expected: Vec<Path> = (start..end).map(|i| p(&format!("/items/n{:03}", i))).collect();
        prop_assert_eq!(window, expected);
    }
}
