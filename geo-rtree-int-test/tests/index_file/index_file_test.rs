use std::collections::HashSet;
use std::fs;
use std::io::Write;

use geo_rtree::{BalanceHeuristic, BoundingBox, DynamicRTree, IndexError, SharedRTree, SpatialIndex};
use geo_rtree_int_test::test_util::{cleanup, create_test_context, fixture_boxes, run_test};

fn fixture_tree() -> DynamicRTree<u64> {
    let mut tree = DynamicRTree::with_balance(BalanceHeuristic::new(2, 4, None).unwrap()).unwrap();
    for (bounds, id) in fixture_boxes() {
        tree.insert(bounds, id).unwrap();
    }
    tree
}

fn ids(tree: &DynamicRTree<u64>, window: &BoundingBox) -> HashSet<u64> {
    tree.query(window).copied().collect()
}

#[test]
fn test_saved_index_survives_reopen() {
    run_test(
        || create_test_context(),
        |ctx| {
            let file = ctx.create_index("places")?;
            file.save(&fixture_tree())?;
            file.close()?;

            let reopened = ctx.open_index("places")?;
            let tree: DynamicRTree<u64> = reopened.load()?;

            assert_eq!(tree.total_item_count(), 8);
            assert_eq!(
                ids(&tree, &BoundingBox::new(-100.0, -100.0, 5928.58, 3252.51)),
                (1..=8).collect()
            );
            assert_eq!(
                ids(&tree, &BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
                HashSet::from([1, 2, 3, 6, 7, 8])
            );
            assert_eq!(
                ids(&tree, &BoundingBox::new(1500.0, 1500.0, 1500.0, 1500.0)),
                HashSet::from([4, 5])
            );
            assert_eq!(
                ids(&tree, &BoundingBox::new(100.0, 100.0, 100.0, 100.0)),
                HashSet::from([1, 2, 7, 8])
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_modified_index_saves_again() {
    run_test(
        || create_test_context(),
        |ctx| {
            let file = ctx.create_index("places")?;
            file.save(&fixture_tree())?;

            let mut tree: DynamicRTree<u64> = file.load()?;
            assert!(tree.remove(&BoundingBox::new(0.0, 0.0, 100.0, 100.0), &1));
            tree.insert(BoundingBox::new(10.0, 10.0, 20.0, 20.0), 9)?;
            file.save(&tree)?;

            let reloaded: DynamicRTree<u64> = file.load()?;
            assert_eq!(reloaded.total_item_count(), 8);
            assert_eq!(
                ids(&reloaded, &BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
                HashSet::from([2, 3, 6, 7, 8, 9])
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_index_from_newer_version_is_rebuilt() {
    run_test(
        || create_test_context(),
        |ctx| {
            let path = ctx.index_path("versioned");
            {
                let mut raw = fs::File::create(&path)?;
                raw.write_all(b"GRTX")?;
                raw.write_all(&7u16.to_le_bytes())?;
                raw.write_all(&[0u8; 64])?;
            }

            let file = ctx.open_index("versioned")?;
            let err = file.load::<u64>().unwrap_err();
            assert!(matches!(err, IndexError::UnsupportedFormat { found: 7 }));

            let tree = file.load_or_rebuild(|| Ok(fixture_tree()))?;
            assert_eq!(tree.total_item_count(), 8);
            assert_eq!(file.load::<u64>()?.total_item_count(), 8);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_truncated_index_is_rebuilt() {
    run_test(
        || create_test_context(),
        |ctx| {
            let file = ctx.create_index("truncated")?;
            file.save(&fixture_tree())?;
            file.close()?;

            let path = ctx.index_path("truncated");
            let bytes = fs::read(&path)?;
            fs::write(&path, &bytes[..bytes.len() - 10])?;

            let file = ctx.open_index("truncated")?;
            assert!(matches!(file.load::<u64>(), Err(IndexError::Corrupt(_))));

            let mut rebuilt = false;
            let tree = file.load_or_rebuild(|| {
                rebuilt = true;
                Ok(fixture_tree())
            })?;
            assert!(rebuilt);
            tree.validate()?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_foreign_file_is_corrupt() {
    run_test(
        || create_test_context(),
        |ctx| {
            fs::write(ctx.index_path("foreign"), b"{\"not\": \"an index\"}")?;
            let file = ctx.open_index("foreign")?;
            let err = file.load::<u64>().unwrap_err();
            assert!(err.is_obsolete());
            assert!(matches!(err, IndexError::Corrupt(_)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_shared_index_saves_to_file() {
    run_test(
        || create_test_context(),
        |ctx| {
            let index = SharedRTree::new();
            for (bounds, id) in fixture_boxes() {
                index.add(&bounds, id)?;
            }

            let file = ctx.create_index("shared")?;
            index.save(&file)?;

            let loaded = SharedRTree::from_tree(file.load::<u64>()?);
            assert_eq!(loaded.size(), 8);
            let mut near = loaded.find_intersecting(&BoundingBox::from_point(100.0, 100.0));
            near.sort_unstable();
            assert_eq!(near, vec![1, 2, 7, 8]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
