//! Request contexts carried through model operations

use crate::common::*;
use arbordb::{CacheControl, Identity};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn builder_sets_identity_and_cache() {
    let ctx = RequestContext::builder()
        .for_user(Identity::new("ann"))
        .using_cache(CacheControl::Bypass)
        .build();
    assert_eq!(ctx.identity().as_str(), "ann");
    assert!(!ctx.identity().is_anonymous());
    assert_eq!(ctx.cache_control(), CacheControl::Bypass);

    let store = TestStore::new();
    store
        .model
        .store(&ctx, &p("/owned"), &Record::new(json!({"by": "ann"})))
        .unwrap();
    assert_eq!(store.get("/owned").data, json!({"by": "ann"}));
}

#[test]
fn release_hooks_run_after_successful_operations() {
    let store = TestStore::new();
    let released = Arc::new(AtomicUsize::new(0));

    let ctx = ctx();
    let counter = Arc::clone(&released);
    ctx.on_release(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.model.store(&ctx, &p("/a"), &Record::default()).unwrap();
    store.model.relate(&ctx, &rel("/a", "likes", "/b")).unwrap();
    assert!(store.model.exists(&ctx, &p("/a")).unwrap());
    assert_eq!(released.load(Ordering::SeqCst), 0);

    ctx.close();
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn release_hooks_run_when_an_operation_fails() {
    let store = TestStore::new();
    let released = Arc::new(AtomicUsize::new(0));

    let outcome = {
        let ctx = ctx();
        let counter = Arc::clone(&released);
        ctx.on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        store.model.load(&ctx, &p("/missing"))
    };

    let err = outcome.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn hooks_run_in_reverse_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let ctx = ctx();
    for step in ["open", "lock", "read"] {
        let order = Arc::clone(&order);
        ctx.on_release(move || order.lock().unwrap().push(step));
    }
    drop(ctx);
    assert_eq!(*order.lock().unwrap(), vec!["read", "lock", "open"]);
}

#[test]
fn each_context_has_its_own_id() {
    let first = ctx();
    let second = ctx();
    assert_ne!(first.id(), second.id());
    assert!(first.identity().is_anonymous());
    assert_eq!(first.cache_control(), CacheControl::Normal);
}

#[test]
fn one_context_spans_a_query() {
    let store = TestStore::new();
    store.put("/q/one", json!({"n": 1}));
    store.put("/q/two", json!({"n": 2}));
    let released = Arc::new(AtomicUsize::new(0));

    let ctx = RequestContext::builder()
        .using_cache(CacheControl::ForceRefresh)
        .build();
    let counter = Arc::clone(&released);
    ctx.on_release(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let result = store
        .model
        .start_query()
        .prefix(p("/q"))
        .filter_fn(|o| o.record.field("n").and_then(|v| v.as_i64()) == Some(2))
        .execute(&ctx)
        .unwrap();
    assert_eq!(result.matched(), 1);
    ctx.close();
    assert_eq!(released.load(Ordering::SeqCst), 1);
}
