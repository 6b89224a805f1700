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

//! Parallel window evaluation
//!
//! Two sharding patterns over output rows, both built on Rayon's
//! work-stealing scheduler:
//!
//! - **Structure-backed sharding**: build a [`MergeSortTree`] once, then
//!   partition the output rows into grains and let each worker answer its
//!   grain's queries against the shared tree. The tree is immutable after
//!   construction, so workers share it by reference with no locking and no
//!   cross-grain communication.
//! - **Order-statistics sharding** ([`sharded_window_percentile`]): no
//!   merge structure at all. Parallel-sort the rows by the window key,
//!   then give each grain a worker-local [`OrderedMultiset`] seeded with
//!   the look-back window preceding the grain start, and slide a
//!   `ROWS BETWEEN size-1 PRECEDING AND CURRENT ROW` frame across the
//!   grain. Grain size trades load balance against the per-worker seeding
//!   cost.
//!
//! Parallelization has overhead, so small inputs fall back to a sequential
//! pass under the same code path.

use rayon::prelude::*;

use crate::common::OrderedMultiset;
use crate::core::{Error, Result};
use crate::tree::{MergeSortTree, TreeConfig};
use crate::window::percentile::merge_sort_percentile;
use crate::window::rank::merge_sort_rank;

// Default thresholds for parallel evaluation
pub const DEFAULT_PARALLEL_MIN_ROWS: usize = 4_096;
pub const DEFAULT_MIN_GRAIN_SIZE: usize = 512;

/// Configuration for parallel evaluation
#[derive(Clone, Debug)]
pub struct ParallelConfig {
    /// Whether parallel evaluation is enabled
    pub enabled: bool,
    /// Minimum rows to shard at all; smaller inputs run sequentially
    pub min_rows: usize,
    /// Rows per grain; 0 derives a grain from the worker count
    pub grain_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_rows: DEFAULT_PARALLEL_MIN_ROWS,
            grain_size: 0,
        }
    }
}

impl ParallelConfig {
    /// Create a new parallel config with custom settings
    pub fn new(enabled: bool, min_rows: usize, grain_size: usize) -> Self {
        Self {
            enabled,
            min_rows,
            grain_size,
        }
    }

    /// Create a config with parallel evaluation disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Check if sharding should be used for the given row count
    #[inline]
    pub fn should_parallelize(&self, rows: usize) -> bool {
        self.enabled && rows >= self.min_rows
    }

    /// Rows per grain for the given row count
    ///
    /// When unset, targets ~4 grains per worker so the scheduler can
    /// rebalance without drowning in tiny tasks.
    pub fn effective_grain(&self, rows: usize) -> usize {
        if self.grain_size > 0 {
            return self.grain_size;
        }
        let target_grains = rayon::current_num_threads() * 4;
        (rows / target_grains.max(1)).max(DEFAULT_MIN_GRAIN_SIZE)
    }
}

/// Grain-sharded RANK over a shared merge sort tree
pub fn parallel_merge_sort_rank<E, L, U>(
    config: TreeConfig,
    parallel: &ParallelConfig,
    data: &[E],
    lower_bound: L,
    upper_bound: U,
) -> Result<Vec<usize>>
where
    E: Ord + Clone + Send + Sync,
    L: Fn(usize, usize) -> usize + Sync,
    U: Fn(usize, usize) -> usize + Sync,
{
    let len = data.len();
    if !parallel.should_parallelize(len) {
        return merge_sort_rank(config, data, lower_bound, upper_bound);
    }
    let tree = MergeSortTree::new(config, data.to_vec())?;
    let grain = parallel.effective_grain(len);
    let mut result = vec![0usize; len];
    result
        .par_chunks_mut(grain)
        .enumerate()
        .try_for_each(|(grain_idx, chunk)| -> Result<()> {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let i = grain_idx * grain + offset;
                let lower = lower_bound(i, len);
                let upper = upper_bound(i, len);
                *slot = if lower < upper {
                    tree.aggregate_lower_bound_sum(lower, upper, &data[i])?
                } else {
                    0
                };
            }
            Ok(())
        })?;
    Ok(result)
}

/// Grain-sharded COUNT(DISTINCT) over a shared prev-offset tree
pub fn parallel_merge_sort_count_distinct<T, L, U>(
    config: TreeConfig,
    parallel: &ParallelConfig,
    data: &[T],
    lower_bound: L,
    upper_bound: U,
) -> Result<Vec<usize>>
where
    T: std::hash::Hash + Eq + Clone + Send + Sync,
    L: Fn(usize, usize) -> usize + Sync,
    U: Fn(usize, usize) -> usize + Sync,
{
    let len = data.len();
    if !parallel.should_parallelize(len) {
        return crate::window::distinct::merge_sort_count_distinct(
            config,
            data,
            lower_bound,
            upper_bound,
        );
    }
    let tree = MergeSortTree::new(config, crate::window::distinct::prev_offsets(data))?;
    let grain = parallel.effective_grain(len);
    let mut result = vec![0usize; len];
    result
        .par_chunks_mut(grain)
        .enumerate()
        .try_for_each(|(grain_idx, chunk)| -> Result<()> {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let i = grain_idx * grain + offset;
                let lower = lower_bound(i, len);
                let upper = upper_bound(i, len);
                *slot = if lower < upper {
                    tree.aggregate_lower_bound_sum(lower, upper, &(lower + 1))?
                } else {
                    0
                };
            }
            Ok(())
        })?;
    Ok(result)
}

/// Grain-sharded PERCENTILE_DISC over a shared permutation tree
pub fn parallel_merge_sort_percentile<E, L, U>(
    config: TreeConfig,
    parallel: &ParallelConfig,
    data: &[E],
    lower_bound: L,
    upper_bound: U,
    p: f64,
) -> Result<Vec<Option<E>>>
where
    E: Ord + Clone + Send + Sync,
    L: Fn(usize, usize) -> usize + Sync,
    U: Fn(usize, usize) -> usize + Sync,
{
    let len = data.len();
    if !parallel.should_parallelize(len) {
        return merge_sort_percentile(config, data, lower_bound, upper_bound, p);
    }
    if !(0.0..1.0).contains(&p) {
        return Err(Error::InvalidPercentile(p));
    }

    let mut order: Vec<(E, usize)> = data.iter().cloned().zip(0..len).collect();
    order.par_sort_unstable();
    let mut sorted = Vec::with_capacity(len);
    let mut positions = Vec::with_capacity(len);
    for (value, pos) in order {
        sorted.push(value);
        positions.push(pos);
    }
    let tree = MergeSortTree::new(config, positions)?;

    let grain = parallel.effective_grain(len);
    let mut result: Vec<Option<E>> = vec![None; len];
    result
        .par_chunks_mut(grain)
        .enumerate()
        .try_for_each(|(grain_idx, chunk)| -> Result<()> {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                let i = grain_idx * grain + offset;
                let lower = lower_bound(i, len);
                let upper = upper_bound(i, len);
                if lower < upper {
                    let n = ((upper - lower) as f64 * p) as usize;
                    let selected = tree.select_nth(&lower, &upper, n)?;
                    *slot = Some(sorted[selected].clone());
                }
            }
            Ok(())
        })?;
    Ok(result)
}

/// Sharded sliding-window percentile over worker-local ordered multisets
///
/// Evaluates `PERCENTILE_DISC(p ORDER BY value) OVER (ORDER BY key ROWS
/// BETWEEN window_size - 1 PRECEDING AND CURRENT ROW)` without a merge
/// structure: the rows are parallel-sorted by key, the output is split
/// into grains, and each worker seeds a fresh multiset with the rows
/// looking back at most `window_size` before its grain, then slides the
/// frame forward one row at a time. Strictly parallel, no shared mutable
/// state; the per-grain seeding cost is what the grain size trades
/// against load balance.
pub fn sharded_window_percentile<K, V, M, F>(
    rows: &[(K, V)],
    window_size: usize,
    p: f64,
    parallel: &ParallelConfig,
    make_multiset: F,
) -> Result<Vec<V>>
where
    K: Ord + Clone + Send + Sync,
    V: Ord + Clone + Send + Sync,
    M: OrderedMultiset<V>,
    F: Fn() -> M + Sync,
{
    if !(0.0..1.0).contains(&p) {
        return Err(Error::InvalidPercentile(p));
    }
    if window_size == 0 {
        return Err(Error::InvalidWindowSize);
    }
    let len = rows.len();

    // Order rows by the window key; the caller's slice stays untouched
    let mut ordered: Vec<(K, V)> = rows.to_vec();
    if parallel.should_parallelize(len) {
        ordered.par_sort_unstable_by(|a, b| a.0.cmp(&b.0));
    } else {
        ordered.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    }
    let values: Vec<V> = ordered.into_iter().map(|(_, value)| value).collect();

    if !parallel.should_parallelize(len) {
        return evaluate_percentile_grain(&values, 0, len, window_size, p, &make_multiset);
    }

    let grain = parallel.effective_grain(len);
    let grain_starts: Vec<usize> = (0..len).step_by(grain).collect();
    let per_grain: Vec<Vec<V>> = grain_starts
        .par_iter()
        .map(|&begin| {
            let end = (begin + grain).min(len);
            evaluate_percentile_grain(&values, begin, end, window_size, p, &make_multiset)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut result = Vec::with_capacity(len);
    for mut grain_result in per_grain {
        result.append(&mut grain_result);
    }
    Ok(result)
}

/// Slide the frame across one grain with a freshly seeded multiset
fn evaluate_percentile_grain<V, M, F>(
    values: &[V],
    begin: usize,
    end: usize,
    window_size: usize,
    p: f64,
    make_multiset: &F,
) -> Result<Vec<V>>
where
    V: Ord + Clone,
    M: OrderedMultiset<V>,
    F: Fn() -> M,
{
    let mut window = make_multiset();
    // Re-create the frame state as of the row before the grain
    for value in &values[begin.saturating_sub(window_size)..begin] {
        window.insert(value.clone());
    }
    let mut result = Vec::with_capacity(end - begin);
    for i in begin..end {
        window.insert(values[i].clone());
        if i >= window_size {
            window.remove(&values[i - window_size]);
        }
        let frame_size = (i + 1).min(window_size);
        let rank = (frame_size as f64 * p) as usize;
        let selected = window
            .select(rank)
            .ok_or_else(|| Error::internal("selection rank exceeded window contents"))?;
        result.push(selected.clone());
    }
    Ok(result)
}
