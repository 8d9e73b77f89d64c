//! Two-file relation updates, crash leftovers and concurrent writers

use crate::common::*;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

fn inbound_file(store: &TestStore, path: &str, name: &str) -> std::path::PathBuf {
    let mut file = store.relations_dir();
    for segment in p(path).segments() {
        file.push(segment.as_str());
    }
    file.join(".in").join(name)
}

#[test]
fn crash_between_writes_leaves_one_sided_edge() {
    let store = TestStore::new();
    let ctx = ctx();
    let edge = rel("/a", "likes", "/b");
    store.model.relate(&ctx, &edge).unwrap();

    // Simulate a crash after the outbound write: the inbound file never landed
    fs::remove_file(inbound_file(&store, "/b", "likes")).unwrap();

    assert_eq!(store.model.outbound_relations(&ctx, &p("/a")).unwrap(), vec![edge.clone()]);
    assert!(store.model.inbound_relations(&ctx, &p("/b")).unwrap().is_empty());

    // Relating again completes the missing side without duplicating the other
    store.model.relate(&ctx, &edge).unwrap();
    assert_eq!(store.model.outbound_relations(&ctx, &p("/a")).unwrap(), vec![edge.clone()]);
    assert_eq!(store.model.inbound_relations(&ctx, &p("/b")).unwrap(), vec![edge]);
}

#[test]
fn unrelate_cleans_a_one_sided_edge() {
    let store = TestStore::new();
    let ctx = ctx();
    let edge = rel("/a", "likes", "/b");
    store.model.relate(&ctx, &edge).unwrap();
    fs::remove_file(inbound_file(&store, "/b", "likes")).unwrap();

    assert!(store.model.unrelate(&ctx, &edge).unwrap());
    assert!(store.model.relations(&ctx, &p("/a")).unwrap().is_empty());
    assert!(store.model.relations(&ctx, &p("/b")).unwrap().is_empty());
    assert!(!store.relations_dir().join("a").exists());
}

#[test]
fn temp_file_from_interrupted_write_is_ignored() {
    let store = TestStore::new();
    let ctx = ctx();
    store.put("/docs/one", json!({"v": 1}));
    let leftover = store.objects_dir().join("docs").join(".tmp-interrupted");
    fs::write(&leftover, b"{\"data\":").unwrap();

    let children = store
        .model
        .load(&ctx, &p("/docs"))
        .unwrap()
        .into_children()
        .unwrap();
    assert_eq!(children, vec![Name::new("one").unwrap()]);
    assert_eq!(store.get("/docs/one").data, json!({"v": 1}));
}

#[test]
fn locked_mode_keeps_both_sides_complete_under_contention() {
    let store = TestStore::locked();
    let threads = 8;
    let per_thread = 10;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let model = Arc::clone(&store.model);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let ctx = ctx();
                barrier.wait();
                for i in 0..per_thread {
                    let leaf = format!("/leaf/t{}n{}", t, i);
                    model.relate(&ctx, &rel("/hub", "links", &leaf)).unwrap();
                    model.relate(&ctx, &rel(&leaf, "links", "/hub")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ctx = ctx();
    let out = store.model.outbound_relations(&ctx, &p("/hub")).unwrap();
    let inb = store.model.inbound_relations(&ctx, &p("/hub")).unwrap();
    assert_eq!(out.len(), threads * per_thread);
    assert_eq!(inb.len(), threads * per_thread);
    for relation in &out {
        let back = store.model.inbound_relations(&ctx, &relation.to).unwrap();
        assert_eq!(back, vec![relation.clone()]);
    }
}

#[test]
fn concurrent_updates_are_last_writer_wins() {
    let store = TestStore::new();
    store.put("/counter", json!({"writer": null}));
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let model = Arc::clone(&store.model);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let ctx = ctx();
                barrier.wait();
                for _ in 0..5 {
                    model
                        .update(&ctx, &p("/counter"), &mut |mut record: Record| -> arbordb::Result<Record> {
                            record.data["writer"] = json!(t);
                            Ok(record)
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // No torn writes: the record parses and holds one writer's value
    let writer = store.get("/counter").data["writer"].as_u64().unwrap();
    assert!((writer as usize) < threads);
}

#[test]
fn concurrent_stores_to_distinct_paths_all_land() {
    let store = TestStore::new();
    let threads = 6;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let model = Arc::clone(&store.model);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let ctx = ctx();
                barrier.wait();
                for i in 0..10 {
                    let path = p(&format!("/shared/t{}/r{}", t, i));
                    model.store(&ctx, &path, &Record::new(json!({"t": t, "i": i}))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let all = store.model.start_query().prefix(p("/shared")).execute(&ctx()).unwrap();
    assert_eq!(all.len(), threads * 10);
}

#[test]
fn sibling_store_and_remove_do_not_interfere() {
    let store = TestStore::new();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["/a/b/x", "/a/b/y"]
        .into_iter()
        .map(|leaf| {
            let model = Arc::clone(&store.model);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let ctx = ctx();
                let path = p(leaf);
                barrier.wait();
                for i in 0..1000 {
                    model.store(&ctx, &path, &Record::new(json!({"i": i}))).unwrap();
                    assert!(model.remove(&ctx, &path).unwrap());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(!store.record_file("/a").exists());
    assert!(!store.model.exists(&ctx(), &p("/a")).unwrap());
}

#[test]
fn queries_survive_concurrent_removals() {
    let store = TestStore::new();
    store.put("/stable/one", json!({"kind": "x"}));
    store.put("/stable/two", json!({"kind": "x"}));

    let writer = {
        let model = Arc::clone(&store.model);
        thread::spawn(move || {
            let ctx = ctx();
            for i in 0..400 {
                let path = p(&format!("/churn/g{}/leaf", i % 5));
                model.store(&ctx, &path, &Record::new(json!({"kind": "x"}))).unwrap();
                model.remove(&ctx, &path).unwrap();
            }
        })
    };

    for _ in 0..200 {
        let paths: Vec<Path> = store
            .model
            .start_query()
            .filter_eq("kind", json!("x"))
            .execute_paths(&ctx())
            .unwrap()
            .collect();
        assert!(paths.contains(&p("/stable/one")));
        assert!(paths.contains(&p("/stable/two")));
    }
    writer.join().unwrap();
}
