use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use geo_rtree::{BalanceHeuristic, BoundingBox, SharedRTree, SpatialIndex};
use geo_rtree_int_test::test_util::random_boxes;

#[test]
fn test_readers_run_alongside_writer() {
    let index: SharedRTree<u64> =
        SharedRTree::with_balance(BalanceHeuristic::new(3, 9, None).unwrap()).unwrap();
    let items = random_boxes(21, 2000);
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let index = index.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let world = BoundingBox::new(-2000.0, -2000.0, 2000.0, 2000.0);
                let mut last_seen = 0;
                while !done.load(Ordering::Acquire) {
                    // A query holds the read lock, so it sees one consistent tree.
                    let (found, size) = index.read(|tree| (tree.query(&world).count() as u64, tree.total_item_count()));
                    assert_eq!(found, size);
                    assert!(size >= last_seen);
                    last_seen = size;
                }
            })
        })
        .collect();

    let writer = {
        let index = index.clone();
        let items = items.clone();
        thread::spawn(move || {
            for (bounds, id) in items {
                index.add(&bounds, id).unwrap();
            }
        })
    };

    writer.join().unwrap();
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(index.size(), 2000);
    index.read(|tree| tree.validate()).unwrap();
}

#[test]
fn test_concurrent_add_and_remove() {
    let index: SharedRTree<u64> = SharedRTree::new();
    let items = random_boxes(33, 1200);
    for (bounds, id) in &items {
        index.add(bounds, *id).unwrap();
    }

    // Each thread removes its own quarter of the items.
    let handles: Vec<_> = items
        .chunks(300)
        .map(|chunk| {
            let index = index.clone();
            let chunk = chunk.to_vec();
            thread::spawn(move || {
                for (bounds, id) in chunk.iter().step_by(2) {
                    assert!(index.remove(bounds, id));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(index.size(), 600);
    index.read(|tree| tree.validate()).unwrap();

    let remaining: Vec<u64> = index.find_intersecting(&BoundingBox::new(-2000.0, -2000.0, 2000.0, 2000.0));
    assert_eq!(remaining.len(), 600);
    assert!(remaining.iter().all(|id| id % 2 == 1));
}

#[test]
fn test_nearest_from_many_threads() {
    let index: SharedRTree<u64> = SharedRTree::new();
    for i in 0..100u64 {
        let x = i as f64 * 10.0;
        index.add(&BoundingBox::new(x, 0.0, x + 1.0, 1.0), i).unwrap();
    }

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let index = index.clone();
            thread::spawn(move || {
                let x = t as f64 * 250.0 + 0.5;
                let nearest = index.find_nearest(x, 0.5, 1, None);
                assert_eq!(nearest.len(), 1);
                assert_eq!(nearest[0].0, t * 25);
                assert_eq!(nearest[0].1, 0.0);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
