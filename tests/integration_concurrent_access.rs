/// Concurrent access integration tests
///
/// These tests verify that first requests racing from many threads still
/// invoke each factory once and hand every thread the same instance.

use crossbeam_utils::thread;
use ferrous_wire::{impl_wire, BuildStatus, ContainerBuilder, Inject, Key};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

// ===== Test Services =====

struct SlowDatabase {
    id: usize,
}
impl_wire!(SlowDatabase {});

struct Repository {
    db: Inject<SlowDatabase>,
}
impl_wire!(Repository { db });

struct Api {
    repo: Inject<Repository>,
    db: Inject<SlowDatabase>,
}
impl_wire!(Api { repo, db });

fn slow_container(calls: Arc<AtomicUsize>) -> ferrous_wire::Container {
    let mut builder = ContainerBuilder::new();
    builder
        .register::<SlowDatabase, _>(move || {
            let id = calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(25));
            SlowDatabase { id }
        })
        .unwrap();
    builder.register::<Repository, _>(|| Repository { db: Inject::new() }).unwrap();
    builder
        .register::<Api, _>(|| Api { repo: Inject::new(), db: Inject::new() })
        .unwrap();
    builder.build()
}

#[test]
fn test_concurrent_first_requests_build_once() {
    const THREADS: usize = 16;
    let calls = Arc::new(AtomicUsize::new(0));
    let container = slow_container(calls.clone());
    let barrier = Barrier::new(THREADS);

    let instances = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    container.get::<SlowDatabase>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|db| Arc::ptr_eq(db, &instances[0])));
    assert_eq!(instances[0].id, 0);
}

#[test]
fn test_concurrent_requests_for_different_roots_share_dependencies() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = slow_container(calls.clone());
    let barrier = Barrier::new(3);

    let (api, repo, db) = thread::scope(|s| {
        let api = s.spawn(|_| {
            barrier.wait();
            container.get::<Api>().unwrap()
        });
        let repo = s.spawn(|_| {
            barrier.wait();
            container.get::<Repository>().unwrap()
        });
        let db = s.spawn(|_| {
            barrier.wait();
            container.get::<SlowDatabase>().unwrap()
        });
        (api.join().unwrap(), repo.join().unwrap(), db.join().unwrap())
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(Inject::get(&api.repo).unwrap(), &repo));
    assert!(Arc::ptr_eq(Inject::get(&api.db).unwrap(), &db));
    assert!(Arc::ptr_eq(Inject::get(&repo.db).unwrap(), &db));
    assert_eq!(container.status(&Key::of::<Api>()), Some(BuildStatus::Done));
}

#[test]
fn test_cloned_containers_share_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = slow_container(calls.clone());

    let first = thread::scope(|s| {
        let handle = container.clone();
        s.spawn(move |_| handle.get::<Repository>().unwrap()).join().unwrap()
    })
    .unwrap();

    let second = container.get::<Repository>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_waiters_observe_failed_build() {
    struct Orphan {
        missing: Inject<String>,
    }
    impl_wire!(Orphan { missing });

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut builder = ContainerBuilder::new();
    builder
        .register::<Orphan, _>(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            Orphan { missing: Inject::new() }
        })
        .unwrap();
    let container = builder.build();
    let barrier = Barrier::new(8);

    let failures = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    container.get::<Orphan>().is_err()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|failed| *failed)
            .count()
    })
    .unwrap();

    assert_eq!(failures, 8);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_wiring_of_external_value() {
    const THREADS: usize = 8;
    let calls = Arc::new(AtomicUsize::new(0));
    let container = slow_container(calls.clone());
    let handler = Api { repo: Inject::new(), db: Inject::new() };
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|_| {
                barrier.wait();
                container.wire(&handler).unwrap();
            });
        }
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let db = container.get::<SlowDatabase>().unwrap();
    assert!(Arc::ptr_eq(Inject::get(&handler.db).unwrap(), &db));
    assert!(Arc::ptr_eq(Inject::get(&handler.repo).unwrap(), &container.get::<Repository>().unwrap()));
    assert_eq!(handler.db.id, db.id);
    assert_eq!(container.pending_cleanups(), 0);
}
