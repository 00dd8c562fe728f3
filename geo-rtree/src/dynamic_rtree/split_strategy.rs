//! Node splitting.

use std::cmp::Ordering;

use crate::bounding_box::BoundingBox;

use super::balance::BalanceHeuristic;
use super::rtree_types::{union_of, IndexEntry};

/// Partitions the entries of an overflowing node into two groups.
///
/// Implementations receive `max_fill + 1` entries and must return every one
/// of them in exactly one of the two groups, each group holding between
/// `min_fill` and `max_fill` entries. The same strategy splits leaves
/// (`V` = payload) and internal nodes (`V` = child id).
pub trait SplitStrategy {
    fn split<V>(
        &self,
        entries: Vec<IndexEntry<V>>,
        balance: &BalanceHeuristic,
    ) -> (Vec<IndexEntry<V>>, Vec<IndexEntry<V>>);
}

/// Guttman's quadratic split.
///
/// Seeds are the pair of entries wasting the most area when combined. The
/// remaining entries are then assigned one at a time, always taking the entry
/// with the strongest preference for one group.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadraticSplit;

impl QuadraticSplit {
    /// Indices `(i, j)`, `i < j`, of the pair with the largest dead space.
    fn pick_seeds<V>(entries: &[IndexEntry<V>]) -> (usize, usize) {
        let mut seeds = (0, 1);
        let mut worst = f64::NEG_INFINITY;

        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let a = entries[i].bounds();
                let b = entries[j].bounds();
                let dead_space = a.union(b).area() - a.area() - b.area();
                if dead_space > worst {
                    worst = dead_space;
                    seeds = (i, j);
                }
            }
        }

        seeds
    }

    /// The unassigned entry with the greatest enlargement difference between
    /// the two groups, with both enlargements.
    ///
    /// Falls back to the first unassigned entry when no difference is
    /// comparable, as happens once areas overflow to infinity.
    fn pick_next<V>(
        remaining: &[Option<IndexEntry<V>>],
        bounds_a: &BoundingBox,
        bounds_b: &BoundingBox,
    ) -> Option<(usize, f64, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        let mut best_diff = f64::NEG_INFINITY;

        for (i, entry) in remaining.iter().enumerate() {
            let Some(entry) = entry else { continue };
            let d_a = bounds_a.enlargement(entry.bounds());
            let d_b = bounds_b.enlargement(entry.bounds());
            let diff = (d_a - d_b).abs();
            if diff > best_diff {
                best_diff = diff;
                best = Some((i, d_a, d_b));
            } else if best.is_none() {
                best = Some((i, d_a, d_b));
            }
        }

        best
    }
}

/// One side of a split in progress
struct Group<V> {
    entries: Vec<IndexEntry<V>>,
    bounds: BoundingBox,
}

impl<V> Group<V> {
    fn seeded(seed: IndexEntry<V>, capacity: usize) -> Self {
        let bounds = *seed.bounds();
        let mut entries = Vec::with_capacity(capacity);
        entries.push(seed);
        Self { entries, bounds }
    }

    fn push(&mut self, entry: IndexEntry<V>) {
        self.bounds = self.bounds.union(entry.bounds());
        self.entries.push(entry);
    }
}

impl SplitStrategy for QuadraticSplit {
    fn split<V>(
        &self,
        entries: Vec<IndexEntry<V>>,
        balance: &BalanceHeuristic,
    ) -> (Vec<IndexEntry<V>>, Vec<IndexEntry<V>>) {
        let total = entries.len();
        if total < 2 {
            return (entries, Vec::new());
        }

        let min_fill = balance.min_fill();
        let (seed_a, seed_b) = Self::pick_seeds(&entries);

        let mut remaining: Vec<Option<IndexEntry<V>>> = entries.into_iter().map(Some).collect();
        let (Some(first), Some(second)) = (remaining[seed_a].take(), remaining[seed_b].take())
        else {
            unreachable!("seed indices are distinct and in range");
        };

        let mut a = Group::seeded(first, balance.max_fill());
        let mut b = Group::seeded(second, balance.max_fill());
        let mut unassigned = total - 2;

        while unassigned > 0 {
            // Fill guard: a group that needs everything left takes everything left.
            if a.entries.len() + unassigned <= min_fill {
                remaining.iter_mut().filter_map(Option::take).for_each(|e| a.push(e));
                break;
            }
            if b.entries.len() + unassigned <= min_fill {
                remaining.iter_mut().filter_map(Option::take).for_each(|e| b.push(e));
                break;
            }

            let Some((idx, d_a, d_b)) = Self::pick_next(&remaining, &a.bounds, &b.bounds) else {
                break;
            };
            let Some(entry) = remaining[idx].take() else {
                break;
            };

            // NaN costs compare as ties and fall through to the next rule.
            let to_a = match d_a.partial_cmp(&d_b) {
                Some(Ordering::Less) => true,
                Some(Ordering::Greater) => false,
                _ => match a.bounds.area().partial_cmp(&b.bounds.area()) {
                    Some(Ordering::Less) => true,
                    Some(Ordering::Greater) => false,
                    _ => a.entries.len() <= b.entries.len(),
                },
            };

            if to_a {
                a.push(entry);
            } else {
                b.push(entry);
            }
            unassigned -= 1;
        }

        // Nothing is ever dropped: leftovers go to the smaller group.
        for entry in remaining.into_iter().flatten() {
            if a.entries.len() <= b.entries.len() {
                a.push(entry);
            } else {
                b.push(entry);
            }
        }

        debug_assert_eq!(a.entries.len() + b.entries.len(), total);
        debug_assert!(union_of(&a.entries) == a.bounds && union_of(&b.entries) == b.bounds);
        (a.entries, b.entries)
    }
}
