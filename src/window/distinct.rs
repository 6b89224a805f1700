// Copyright 2025 Oriel Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Windowed DISTINCT aggregation
//!
//! COUNT(DISTINCT) and general invertible aggregates over the distinct
//! values of each frame. Three strategies with identical results:
//!
//! - `naive_*` rebuilds a hash set per row; it doubles as the
//!   correctness oracle.
//! - `incremental_*` maintains a value→multiplicity map across row
//!   transitions, touching the aggregate state only on 0↔1 multiplicity
//!   transitions so duplicates count once. The map accumulates dead
//!   zero-count entries as values leave frames; it is dropped and rebuilt
//!   whenever its size exceeds a configurable multiple of the live entries.
//! - `merge_sort_*` reduces DISTINCT to ordinary range counting through the
//!   prev-offset encoding: with `prev_offsets(i)` = 1 + the nearest earlier
//!   position holding the same value (0 if none), the distinct values of
//!   `[lower, upper)` are exactly the positions `j` in the frame with
//!   `prev_offsets(j) <= lower`: one counting query with
//!   `needle = lower + 1` over a tree built on the offsets. General
//!   aggregates additionally store a running per-run aggregate next to
//!   every level, accumulated over each run's first occurrences and folded
//!   across the canonical runs of a frame.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use crate::core::Result;
use crate::tree::{Level, MergeSortTree, TreeConfig};
use crate::window::aggregate::{CountDistinct, DistinctAggregate};

/// Default multiplier for the multiplicity-map reset heuristic
pub const DEFAULT_RESET_MULTIPLIER: usize = 4;

/// Tuning knobs for the incremental strategies
///
/// The reset multiplier bounds wasted memory from stale zero-count map
/// entries: the map is rebuilt once its size exceeds `reset_multiplier`
/// times its live entry count (the default of 4 corresponds to a density
/// threshold of 0.25). This is a performance tunable, not a correctness
/// requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncrementalConfig {
    /// Map-size multiple of live entries that triggers a rebuild
    pub reset_multiplier: usize,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            reset_multiplier: DEFAULT_RESET_MULTIPLIER,
        }
    }
}

impl IncrementalConfig {
    /// Create a config with a custom reset multiplier
    pub fn new(reset_multiplier: usize) -> Self {
        Self { reset_multiplier }
    }

    /// Check whether the multiplicity map is due for a rebuild
    #[inline]
    pub fn should_reset(&self, map_len: usize, non_zero: usize) -> bool {
        map_len > non_zero * self.reset_multiplier
    }
}

/// For every position, 1 + the nearest earlier position of the same value
///
/// Positions whose value has no earlier occurrence get 0, so
/// `prev_offsets(j) <= lower` identifies first occurrences within any
/// frame starting at `lower`.
pub fn prev_offsets<T>(data: &[T]) -> Vec<usize>
where
    T: Hash + Eq + Clone,
{
    let mut previous: FxHashMap<T, usize> = FxHashMap::default();
    let mut result = Vec::with_capacity(data.len());
    for (i, value) in data.iter().enumerate() {
        let slot = previous.entry(value.clone()).or_insert(0);
        result.push(*slot);
        *slot = i + 1;
    }
    result
}

/// Per-row distinct aggregate by rebuilding a hash set per frame
pub fn naive_aggregate_distinct<A, T, L, U>(data: &[T], lower_bound: L, upper_bound: U) -> Vec<A::State>
where
    A: DistinctAggregate<T>,
    T: Hash + Eq,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    let len = data.len();
    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);
        let mut state = A::init();
        let mut seen: FxHashSet<&T> = FxHashSet::default();
        for j in lower..upper {
            if seen.insert(&data[j]) {
                state = A::merge_value(state, &data[j]);
            }
        }
        result.push(state);
    }
    result
}

/// Per-row distinct value count by rebuilding a hash set per frame
pub fn naive_count_distinct<T, L, U>(data: &[T], lower_bound: L, upper_bound: U) -> Vec<usize>
where
    T: Hash + Eq,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    naive_aggregate_distinct::<CountDistinct, _, _, _>(data, lower_bound, upper_bound)
}

/// Per-row distinct aggregate by delta-maintaining a multiplicity map
///
/// Each row transition removes the values that left the frame and adds the
/// values that entered, on both ends, touching the aggregate state only
/// when a multiplicity crosses 0↔1. Sequential by construction: every
/// row's state depends on the previous row's.
pub fn incremental_aggregate_distinct<A, T, L, U>(
    data: &[T],
    lower_bound: L,
    upper_bound: U,
    config: IncrementalConfig,
) -> Vec<A::State>
where
    A: DistinctAggregate<T>,
    T: Hash + Eq + Clone,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    let len = data.len();
    let mut result = Vec::with_capacity(len);
    let mut multiplicity: FxHashMap<T, u64> = FxHashMap::default();
    let mut prev_lower = 0usize;
    let mut prev_upper = 0usize;
    let mut state = A::init();
    let mut non_zero = 0usize;
    for i in 0..len {
        if config.should_reset(multiplicity.len(), non_zero) {
            prev_lower = 0;
            prev_upper = 0;
            non_zero = 0;
            state = A::init();
            multiplicity = FxHashMap::default();
        }

        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);

        // Remove values that dropped below the new frame
        if prev_lower < lower {
            for j in prev_lower..prev_upper.min(lower) {
                let count = multiplicity.entry(data[j].clone()).or_insert(0);
                *count -= 1;
                if *count == 0 {
                    state = A::remove_value(state, &data[j]);
                    non_zero -= 1;
                }
            }
        }
        // Remove values that dropped above the new frame
        if prev_upper > upper {
            for j in upper.max(prev_lower)..prev_upper {
                let count = multiplicity.entry(data[j].clone()).or_insert(0);
                *count -= 1;
                if *count == 0 {
                    state = A::remove_value(state, &data[j]);
                    non_zero -= 1;
                }
            }
        }
        // Add values that entered below the old frame
        if prev_lower > lower {
            for j in lower..prev_lower.min(upper) {
                let count = multiplicity.entry(data[j].clone()).or_insert(0);
                if *count == 0 {
                    state = A::merge_value(state, &data[j]);
                    non_zero += 1;
                }
                *count += 1;
            }
        }
        // Add values that entered above the old frame
        if prev_upper < upper {
            for j in lower.max(prev_upper)..upper {
                let count = multiplicity.entry(data[j].clone()).or_insert(0);
                if *count == 0 {
                    state = A::merge_value(state, &data[j]);
                    non_zero += 1;
                }
                *count += 1;
            }
        }

        result.push(state.clone());
        prev_lower = lower;
        prev_upper = upper;
    }
    result
}

/// Per-row distinct value count by delta-maintaining a multiplicity map
pub fn incremental_count_distinct<T, L, U>(
    data: &[T],
    lower_bound: L,
    upper_bound: U,
    config: IncrementalConfig,
) -> Vec<usize>
where
    T: Hash + Eq + Clone,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    incremental_aggregate_distinct::<CountDistinct, _, _, _>(data, lower_bound, upper_bound, config)
}

/// Per-row distinct value count through counting queries on an offset tree
///
/// Builds the tree over the prev-offset encoding; each frame is one
/// counting query for offsets below `lower + 1`. Empty frames
/// short-circuit to 0.
pub fn merge_sort_count_distinct<T, L, U>(
    config: TreeConfig,
    data: &[T],
    lower_bound: L,
    upper_bound: U,
) -> Result<Vec<usize>>
where
    T: Hash + Eq + Clone,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    let tree = MergeSortTree::new(config, prev_offsets(data))?;
    let len = data.len();
    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);
        let count = if lower < upper {
            tree.aggregate_lower_bound_sum(lower, upper, &(lower + 1))?
        } else {
            0
        };
        result.push(count);
    }
    Ok(result)
}

/// Per-row distinct aggregate through per-run running aggregates
///
/// Builds a tree over zipped `(prev_offset, value)` pairs, then splits it:
/// the offsets become an ordinary counting tree reusing the zipped tree's
/// bridge tables, and every level gains a running aggregate per element,
/// accumulated only over positions whose value first occurs within the
/// run's leaf range. A frame query decomposes into canonical runs; within
/// each, the elements below `needle = lower + 1` are exactly the frame's
/// first occurrences falling in that run, so the running aggregate just
/// before the split position is their combined state. Folding those
/// per-run states with [`DistinctAggregate::merge`] yields the frame's
/// distinct aggregate.
pub fn merge_sort_aggregate_distinct<A, T, L, U>(
    config: TreeConfig,
    data: &[T],
    lower_bound: L,
    upper_bound: U,
) -> Result<Vec<A::State>>
where
    A: DistinctAggregate<T>,
    T: Ord + Hash + Eq + Clone,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    let len = data.len();
    let fanout = config.fanout;

    let zipped: Vec<(usize, T)> = prev_offsets(data)
        .into_iter()
        .zip(data.iter().cloned())
        .collect();
    let zipped_tree = MergeSortTree::new(config, zipped)?;

    // Split each zipped level into its offsets and a running per-run
    // aggregate over first occurrences, keeping the bridge tables
    let mut offset_levels: Vec<Level<usize>> = Vec::with_capacity(zipped_tree.height());
    let mut running_aggs: Vec<Vec<A::State>> = Vec::with_capacity(zipped_tree.height());
    let mut run_length = 1usize;
    for zipped_level in zipped_tree.into_levels() {
        let Level { values, bridges } = zipped_level;
        let mut offsets = Vec::with_capacity(values.len());
        let mut aggs = Vec::with_capacity(values.len());
        let mut run_start = 0;
        while run_start < values.len() {
            let run_end = (run_start + run_length).min(values.len());
            let mut state = A::init();
            for (offset, value) in &values[run_start..run_end] {
                offsets.push(*offset);
                if *offset < run_start + 1 {
                    state = A::merge_value(state, value);
                }
                aggs.push(state.clone());
            }
            run_start = run_end;
        }
        offset_levels.push(Level {
            values: offsets,
            bridges,
        });
        running_aggs.push(aggs);
        run_length *= fanout;
    }
    let tree = MergeSortTree::from_levels(config, offset_levels);

    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);
        if lower >= upper {
            result.push(A::init());
            continue;
        }
        let needle = lower + 1;
        let mut state = A::init();
        tree.aggregate_lower_bound(lower, upper, &needle, |level, run_begin, pos| {
            if pos != run_begin {
                state = A::merge(state.clone(), running_aggs[level][pos - 1].clone());
            }
        })?;
        result.push(state);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::FrameBound;

    #[test]
    fn test_prev_offsets() {
        let data = vec![1i64, 2, 1, 3, 1, 1, 1, 2, 3, 1];
        assert_eq!(prev_offsets(&data), vec![0, 0, 1, 0, 3, 5, 6, 2, 4, 7]);
    }

    #[test]
    fn test_naive_count_distinct_trailing_window() {
        let data = vec![1i64, 2, 1, 3, 1, 1, 1, 2, 3, 1];
        let result = naive_count_distinct(
            &data,
            FrameBound::Preceding(3).as_fn(),
            FrameBound::UntilCurrentRow.as_fn(),
        );
        assert_eq!(result, vec![1, 2, 2, 3, 3, 2, 2, 2, 3, 3]);
    }

    #[test]
    fn test_reset_heuristic_thresholds() {
        let config = IncrementalConfig::default();
        assert!(!config.should_reset(0, 0));
        assert!(!config.should_reset(4, 1));
        assert!(config.should_reset(5, 1));
        let eager = IncrementalConfig::new(1);
        assert!(eager.should_reset(2, 1));
    }
}
