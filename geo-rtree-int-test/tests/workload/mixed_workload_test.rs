use std::collections::{HashMap, HashSet};

use geo_rtree::{
    BalanceHeuristic, BoundingBox, DynamicRTree, FragmentationRestructure, PeriodicRestructure,
    SelfOptimizingRTree,
};
use geo_rtree_int_test::test_util::{cleanup, create_test_context, random_boxes, run_test};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn expected(model: &HashMap<u64, BoundingBox>, window: &BoundingBox) -> HashSet<u64> {
    model
        .iter()
        .filter(|(_, bounds)| bounds.intersects(window))
        .map(|(id, _)| *id)
        .collect()
}

fn random_window(rng: &mut StdRng) -> BoundingBox {
    let x = rng.random_range(-1100.0..1100.0);
    let y = rng.random_range(-1100.0..1100.0);
    let w = rng.random_range(0.0..400.0);
    let h = rng.random_range(0.0..400.0);
    BoundingBox::new(x, y, x + w, y + h)
}

#[test]
fn test_random_workload_matches_model() {
    let mut rng = StdRng::seed_from_u64(2024);
    let pool = random_boxes(7, 3000);
    let mut tree = DynamicRTree::with_balance(BalanceHeuristic::new(2, 6, None).unwrap()).unwrap();
    let mut model: HashMap<u64, BoundingBox> = HashMap::new();

    for step in 0..6000 {
        let (bounds, id) = pool[rng.random_range(0..pool.len())];
        if model.contains_key(&id) {
            assert!(tree.remove(&bounds, &id));
            model.remove(&id);
        } else {
            tree.insert(bounds, id).unwrap();
            model.insert(id, bounds);
        }

        if step % 500 == 0 {
            tree.validate().unwrap();
            let window = random_window(&mut rng);
            let found: HashSet<u64> = tree.query(&window).copied().collect();
            assert_eq!(found, expected(&model, &window));
        }
    }

    tree.validate().unwrap();
    assert_eq!(tree.total_item_count(), model.len() as u64);
}

#[test]
fn test_workload_across_save_and_load() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mut rng = StdRng::seed_from_u64(99);
            let items = random_boxes(13, 1500);
            let file = ctx.create_index("workload")?;

            let mut tree = DynamicRTree::new();
            tree.insert_range(items.iter().take(1000).copied())?;
            file.save(&tree)?;

            // Continue on the loaded copy and compare with the original.
            let mut loaded: DynamicRTree<u64> = file.load()?;
            for (bounds, id) in items.iter().skip(1000) {
                tree.insert(*bounds, *id)?;
                loaded.insert(*bounds, *id)?;
            }
            for (bounds, id) in items.iter().step_by(3) {
                assert_eq!(tree.remove(bounds, id), loaded.remove(bounds, id));
            }

            loaded.validate()?;
            assert_eq!(loaded.total_item_count(), tree.total_item_count());
            for _ in 0..50 {
                let window = random_window(&mut rng);
                let a: HashSet<u64> = tree.query(&window).copied().collect();
                let b: HashSet<u64> = loaded.query(&window).copied().collect();
                assert_eq!(a, b);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_self_optimizing_tree_under_churn() {
    let items = random_boxes(55, 2000);
    let strategy = PeriodicRestructure::new(250).unwrap();
    let mut tree = SelfOptimizingRTree::new(DynamicRTree::new(), strategy);

    for (bounds, id) in &items {
        tree.insert(*bounds, *id).unwrap();
    }
    for (bounds, id) in items.iter().filter(|(_, id)| id % 4 != 0) {
        assert!(tree.remove(bounds, id));
    }

    // 2000 inserts and 1500 removals
    assert_eq!(tree.restructure_count(), 14);
    let tree = tree.into_inner();
    tree.validate().unwrap();
    assert_eq!(tree.total_item_count(), 500);

    let world = BoundingBox::new(-2000.0, -2000.0, 2000.0, 2000.0);
    assert!(tree.query(&world).all(|id| id % 4 == 0));
}

#[test]
fn test_fragmentation_strategy_keeps_tree_valid() {
    let items = random_boxes(77, 1500);
    let balance = BalanceHeuristic::new(2, 8, None).unwrap();
    let mut tree = SelfOptimizingRTree::new(
        DynamicRTree::with_balance(balance).unwrap(),
        FragmentationRestructure::default(),
    );

    for (bounds, id) in &items {
        tree.insert(*bounds, *id).unwrap();
    }
    for (bounds, id) in items.iter().take(1300) {
        assert!(tree.remove(bounds, id));
    }

    tree.tree().validate().unwrap();
    assert_eq!(tree.tree().total_item_count(), 200);
    if let Some(stats) = tree.last_rebuild() {
        assert!(stats.entries_reindexed >= 100);
    }
}
