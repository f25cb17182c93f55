//! Deterministic batch partitioning of the registry key space.
//!
//! Splits `N` stable iteration positions into contiguous, non-overlapping
//! `[start, end)` ranges of `batch_size` positions each. Only the last
//! range may be shorter. The result depends on nothing but `N` and the
//! batch size, so two processes over the same snapshot agree on it.

use std::ops::Range;

/// One batch of registry positions, scored as a whole by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl WorkUnit {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

pub struct BatchPlanner {
    batch_size: usize,
}

impl BatchPlanner {
    /// Create a planner for the given batch size.
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` is 0.
    pub fn new(batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be > 0");
        Self { batch_size }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Partition `len` positions. Empty input yields no work units.
    pub fn plan(&self, len: usize) -> Vec<WorkUnit> {
        (0..len)
            .step_by(self.batch_size)
            .enumerate()
            .map(|(index, start)| WorkUnit {
                index,
                start,
                end: (start + self.batch_size).min(len),
            })
            .collect()
    }
}

/// Partition a key sequence into work units of `batch_size` positions.
pub fn partition<T>(keys: &[T], batch_size: usize) -> Vec<WorkUnit> {
    BatchPlanner::new(batch_size).plan(keys.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_multiple_has_no_tail() {
        let units = BatchPlanner::new(5).plan(15);
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|u| u.len() == 5));
        assert_eq!(units[2], WorkUnit { index: 2, start: 10, end: 15 });
    }

    #[test]
    fn test_remainder_forms_last_unit() {
        let units = BatchPlanner::new(4).plan(10);
        let ranges: Vec<_> = units.iter().map(|u| u.range()).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn test_batch_larger_than_input() {
        let units = BatchPlanner::new(10_000).plan(3);
        assert_eq!(units, vec![WorkUnit { index: 0, start: 0, end: 3 }]);
    }

    #[test]
    fn test_empty_input_has_no_units() {
        assert!(BatchPlanner::new(8).plan(0).is_empty());
    }

    #[test]
    fn test_partition_over_keys() {
        let keys = ["a", "b", "c"];
        let units = partition(&keys, 2);
        assert_eq!(units.len(), 2);
        assert_eq!(&keys[units[1].range()], &["c"]);
    }

    #[test]
    #[should_panic(expected = "batch_size must be > 0")]
    fn test_zero_batch_size_panics() {
        BatchPlanner::new(0);
    }

    proptest! {
        #[test]
        fn prop_units_cover_exactly_once(len in 0usize..5_000, batch in 1usize..700) {
            let units = BatchPlanner::new(batch).plan(len);

            // Contiguous from 0 to len, no gaps or overlaps
            let mut expected_start = 0;
            for (i, unit) in units.iter().enumerate() {
                prop_assert_eq!(unit.index, i);
                prop_assert_eq!(unit.start, expected_start);
                prop_assert!(!unit.is_empty());
                prop_assert!(unit.len() <= batch);
                expected_start = unit.end;
            }
            prop_assert_eq!(expected_start, len);

            // Only the last unit may be short
            if let Some((_, full)) = units.split_last() {
                prop_assert!(full.iter().all(|u| u.len() == batch));
            }
            prop_assert_eq!(units.len(), len.div_ceil(batch));
        }

        #[test]
        fn prop_plan_is_deterministic(len in 0usize..5_000, batch in 1usize..700) {
            let planner = BatchPlanner::new(batch);
            prop_assert_eq!(planner.plan(len), planner.plan(len));
        }
    }
}
