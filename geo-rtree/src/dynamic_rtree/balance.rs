//! Fill-factor configuration for the dynamic R-Tree.

use serde::{Deserialize, Serialize};

use super::rtree_constants::{DEFAULT_MAX_FILL, DEFAULT_MIN_FILL};
use super::rtree_types::{IndexError, IndexResult};

/// Minimum and maximum entries per node, plus an optional ceiling on the
/// total number of nodes a tree may allocate.
///
/// The bounds must satisfy `1 <= min_fill <= max_fill / 2`, which guarantees
/// that an overflowing node can always be split into two valid nodes.
///
/// A heuristic read through serde bypasses [`BalanceHeuristic::new`]; trees
/// call [`BalanceHeuristic::validate`] before accepting one.
///
/// ```rust
/// use geo_rtree::BalanceHeuristic;
///
/// let balance = BalanceHeuristic::new(2, 6, Some(1_000)).unwrap();
/// assert_eq!(balance.max_fill(), 6);
/// assert!(BalanceHeuristic::new(4, 6, None).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHeuristic {
    min_fill: usize,
    max_fill: usize,
    #[serde(default)]
    node_ceiling: Option<u64>,
}

impl BalanceHeuristic {
    pub fn new(min_fill: usize, max_fill: usize, node_ceiling: Option<u64>) -> IndexResult<Self> {
        let heuristic = Self {
            min_fill,
            max_fill,
            node_ceiling,
        };
        heuristic.validate()?;
        Ok(heuristic)
    }

    /// Checks the fill invariants.
    pub fn validate(&self) -> IndexResult<()> {
        if self.min_fill < 1 {
            return Err(IndexError::InvalidArgument(
                "min_fill must be at least 1".into(),
            ));
        }
        if self.min_fill > self.max_fill / 2 {
            return Err(IndexError::InvalidArgument(format!(
                "min_fill ({}) must not exceed half of max_fill ({})",
                self.min_fill, self.max_fill
            )));
        }
        if self.node_ceiling == Some(0) {
            return Err(IndexError::InvalidArgument(
                "node ceiling must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn min_fill(&self) -> usize {
        self.min_fill
    }

    pub fn max_fill(&self) -> usize {
        self.max_fill
    }

    pub fn node_ceiling(&self) -> Option<u64> {
        self.node_ceiling
    }

    /// A node holding `len` entries must be split.
    pub fn is_overfull(&self, len: usize) -> bool {
        len > self.max_fill
    }

    /// A non-root node holding `len` entries must be condensed away.
    pub fn is_underfull(&self, len: usize) -> bool {
        len < self.min_fill
    }
}

impl Default for BalanceHeuristic {
    fn default() -> Self {
        Self {
            min_fill: DEFAULT_MIN_FILL,
            max_fill: DEFAULT_MAX_FILL,
            node_ceiling: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let balance = BalanceHeuristic::default();
        assert!(balance.validate().is_ok());
        assert_eq!(balance.min_fill(), DEFAULT_MIN_FILL);
        assert_eq!(balance.max_fill(), DEFAULT_MAX_FILL);
        assert_eq!(balance.node_ceiling(), None);
    }

    #[test]
    fn test_rejects_zero_min_fill() {
        let err = BalanceHeuristic::new(0, 10, None).unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_min_fill_above_half() {
        assert!(BalanceHeuristic::new(3, 5, None).is_err());
        assert!(BalanceHeuristic::new(1, 1, None).is_err());
        assert!(BalanceHeuristic::new(2, 5, None).is_ok());
        assert!(BalanceHeuristic::new(1, 2, None).is_ok());
    }

    #[test]
    fn test_rejects_zero_ceiling() {
        assert!(BalanceHeuristic::new(2, 4, Some(0)).is_err());
        assert!(BalanceHeuristic::new(2, 4, Some(1)).is_ok());
    }

    #[test]
    fn test_fill_predicates() {
        let balance = BalanceHeuristic::new(2, 4, None).unwrap();
        assert!(balance.is_underfull(1));
        assert!(!balance.is_underfull(2));
        assert!(!balance.is_overfull(4));
        assert!(balance.is_overfull(5));
    }

    #[test]
    fn test_deserialized_heuristic_is_validated() {
        let balance: BalanceHeuristic =
            serde_json::from_str(r#"{"min_fill": 6, "max_fill": 8}"#).unwrap();
        assert_eq!(balance.node_ceiling(), None);
        assert!(balance.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let balance = BalanceHeuristic::new(3, 9, Some(500)).unwrap();
        let json = serde_json::to_string(&balance).unwrap();
        let back: BalanceHeuristic = serde_json::from_str(&json).unwrap();
        assert_eq!(balance, back);
    }
}
