//! # Multi-Threaded Facade Test
//!
//! Many threads hammer shared services while a monitor publishes; the
//! accounting must still add up afterwards.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use docpool::core::config::{AllocatorConfig, ArenaConfig, PoolConfig};
use docpool::core::priority::{Category, Urgency};
use docpool::core::AllocError;
use docpool::{DocumentService, Monitor, PlanningService, ServiceError};

const THREADS: usize = 8;
const DOCS_PER_THREAD: usize = 500;

fn pools() -> AllocatorConfig {
    AllocatorConfig::new(
        vec![
            PoolConfig::new("vault", 20_000, false).prefer_urgencies(&[Urgency::Critical]),
            PoolConfig::new("review", 50_000, true)
                .prefer_categories(&[Category::Evidence, Category::Precedent]),
            PoolConfig::new("working", 50_000, true),
            PoolConfig::new("overflow", 100_000, false),
        ],
        "overflow",
    )
}

#[test]
fn test_concurrent_submit_lookup_remove() {
    let documents = Arc::new(DocumentService::new(pools()).unwrap());
    let planning = Arc::new(PlanningService::new(ArenaConfig::new(64)).unwrap());
    let monitor = Arc::new(Monitor::new(Arc::clone(&documents), Arc::clone(&planning)));
    let feed = monitor.subscribe(1024);

    let running = Arc::new(AtomicBool::new(true));
    let publisher = {
        let monitor = Arc::clone(&monitor);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut published = 0usize;
            while running.load(Ordering::Relaxed) {
                published += monitor.publish();
                thread::yield_now();
            }
            published
        })
    };

    let removed = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let documents = Arc::clone(&documents);
            let removed = Arc::clone(&removed);
            thread::spawn(move || {
                for i in 0..DOCS_PER_THREAD {
                    let id = format!("t{t}-d{i}");
                    let category = Category::ALL[(t + i) % Category::ALL.len()];
                    let urgency = Urgency::ALL[i % Urgency::ALL.len()];
                    let size = 100 + ((t * 31 + i * 17) % 400) as u64;

                    match documents.submit(&id, category, urgency, 0.5, size) {
                        Ok(_) | Err(ServiceError::Alloc(AllocError::InsufficientCapacity { .. })) => {}
                        Err(e) => panic!("unexpected submit failure: {e}"),
                    }
                    if i % 5 == 0 {
                        let _ = documents.lookup(&id);
                    }
                    if i % 11 == 0 && documents.remove(&id) {
                        removed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    running.store(false, Ordering::Relaxed);
    let published = publisher.join().unwrap() + monitor.publish();
    assert!(published > 0);
    assert!(feed.try_recv().is_ok());

    let stats = documents.stats();
    for pool in &stats.pools {
        assert!(
            pool.used_bytes <= pool.capacity_bytes,
            "pool {} over budget: {} > {}",
            pool.name,
            pool.used_bytes,
            pool.capacity_bytes
        );
    }

    let counters = stats.counters;
    assert_eq!(counters.removed, removed.load(Ordering::Relaxed) as u64);
    assert_eq!(
        counters.admitted + counters.rejected,
        (THREADS * DOCS_PER_THREAD) as u64
    );
    let resident: usize = stats.pools.iter().map(|p| p.resident_count).sum();
    assert_eq!(
        resident as u64,
        counters.admitted - counters.removed - counters.gc_evictions - counters.dropped
    );
}

#[test]
fn test_concurrent_planning() {
    let planning = Arc::new(PlanningService::new(ArenaConfig::new(128)).unwrap());
    let root = planning.allocate_node("root", None, 1.0, 0).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let planning = Arc::clone(&planning);
            thread::spawn(move || {
                for i in 0..1_000 {
                    let id = format!("t{t}-n{i}");
                    let node = planning.allocate_node(&id, Some(root), 0.5, 1).unwrap();
                    // Another thread may have evicted the node already.
                    match planning.backpropagate(&[root, node], 0.25) {
                        Ok(()) | Err(ServiceError::Alloc(AllocError::InvalidHandle(_))) => {}
                        Err(e) => panic!("unexpected update failure: {e}"),
                    }
                    let _ = planning.choose_child(root, None).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let summary = planning.summarize();
    assert_eq!(summary.allocated, summary.capacity);
    assert_eq!(summary.free, 0);
    assert!(summary.evictions >= (THREADS * 1_000 + 1 - 128) as u64);
    assert_eq!(planning.handle_of("root"), Some(root));
    assert!(planning.node(root).unwrap().visits >= 1);
}
