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

//! Windowed PERCENTILE_DISC evaluation
//!
//! A row's percentile is the value at ascending order position
//! `⌊p · framesize⌋` within the frame; an empty frame yields `None`.
//! Three strategies with identical results:
//!
//! - [`naive_percentile`] copies each frame and quickselects, O(frame) per
//!   row; it doubles as the correctness oracle.
//! - [`incremental_percentile`] keeps a partially order-selected buffer of
//!   frame positions. A single-position frame shift patches one slot in
//!   place and keeps the cached selection unless the replacement could
//!   cross the selected pivot; any larger shift re-collects the buffer and
//!   re-selects at the new rank.
//! - [`merge_sort_percentile`] builds a [`MergeSortTree`] over the
//!   value-sorted permutation of row positions and answers each row with
//!   one order-statistic descent.

use crate::core::{Error, Result};
use crate::tree::{MergeSortTree, TreeConfig};

/// Median of three by the given ordering
fn median_of_3<'a, T, F>(a: &'a T, b: &'a T, c: &'a T, less: &F) -> &'a T
where
    F: Fn(&T, &T) -> bool,
{
    let (lo, hi) = if less(b, a) { (b, a) } else { (a, b) };
    let mid = if less(c, hi) { c } else { hi };
    if less(mid, lo) {
        lo
    } else {
        mid
    }
}

/// Move elements satisfying `pred` to the front, returning their count
fn partition_in_place<T, P>(data: &mut [T], mut pred: P) -> usize
where
    P: FnMut(&T) -> bool,
{
    let mut first = 0;
    for i in 0..data.len() {
        if pred(&data[i]) {
            data.swap(first, i);
            first += 1;
        }
    }
    first
}

/// Partially sort `data` so position `n` holds its ascending order statistic
///
/// Quickselect with median-of-3 pivots and a three-way partition, so runs
/// of duplicates finish in one round. Elements before `n` end up no larger
/// and elements after no smaller; both sides stay otherwise unordered.
pub fn partition_nth<T, F>(data: &mut [T], mut n: usize, less: &F)
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    debug_assert!(n < data.len());
    let mut lo = 0;
    let mut hi = data.len();
    while lo != hi {
        let pivot = median_of_3(
            &data[lo],
            &data[hi - 1],
            &data[lo + (hi - lo) / 2],
            less,
        )
        .clone();
        let middle1 = lo + partition_in_place(&mut data[lo..hi], |x| less(x, &pivot));
        let middle2 = middle1 + partition_in_place(&mut data[middle1..hi], |x| !less(&pivot, x));
        let dist1 = middle1 - lo;
        let dist2 = middle2 - lo;
        if dist2 <= n {
            lo = middle2;
            n -= dist2;
        } else if n < dist1 {
            hi = middle1;
        } else {
            // n landed inside the pivot-equal group
            return;
        }
    }
}

/// The frame's order position for a percentile fraction
#[inline]
fn percentile_rank(lower: usize, upper: usize, p: f64) -> usize {
    ((upper - lower) as f64 * p) as usize
}

fn validate_percentile(p: f64) -> Result<()> {
    if !(0.0..1.0).contains(&p) {
        return Err(Error::InvalidPercentile(p));
    }
    Ok(())
}

/// Per-row percentile by copying and quickselecting each frame
pub fn naive_percentile<E, L, U>(
    data: &[E],
    lower_bound: L,
    upper_bound: U,
    p: f64,
) -> Result<Vec<Option<E>>>
where
    E: Ord + Clone,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    validate_percentile(p)?;
    let len = data.len();
    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);
        if lower >= upper {
            result.push(None);
        } else {
            let n = percentile_rank(lower, upper, p);
            let mut frame: Vec<E> = data[lower..upper].to_vec();
            partition_nth(&mut frame, n, &|a, b| a < b);
            result.push(Some(frame[n].clone()));
        }
    }
    Ok(result)
}

/// Per-row percentile by patching a partially ordered position buffer
///
/// The buffer holds the current frame as positions into `data`, partially
/// ordered around the last selected rank. Frame transitions of exactly one
/// row on both ends replace the single stale position in place; the cached
/// rank survives unless the replacement value could cross the previous
/// pivot. Any other transition compacts the still-valid positions, appends
/// the newly entered ones, and forces a fresh selection.
pub fn incremental_percentile<E, L, U>(
    data: &[E],
    lower_bound: L,
    upper_bound: U,
    p: f64,
) -> Result<Vec<Option<E>>>
where
    E: Ord + Clone,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    validate_percentile(p)?;
    let len = data.len();
    let mut result = Vec::with_capacity(len);
    let mut partial: Vec<usize> = Vec::new();
    let mut prev_lower = 0usize;
    let mut prev_upper = 0usize;
    let mut prev_n: Option<usize> = None;
    for i in 0..len {
        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);
        if lower >= upper {
            result.push(None);
            continue;
        }
        let in_range = |pos: usize| pos >= lower && pos < upper;
        if upper == prev_upper + 1 && lower == prev_lower + 1 {
            // Exactly one position left the frame and one entered
            let mut replace_at = 0;
            while in_range(partial[replace_at]) {
                replace_at += 1;
            }
            let entered = upper - 1;
            if let Some(pn) = prev_n {
                let prev_pivot = &data[partial[pn]];
                let new_value = &data[entered];
                if *new_value < *prev_pivot && replace_at >= pn {
                    prev_n = None;
                }
                if *new_value > *prev_pivot && replace_at <= pn {
                    prev_n = None;
                }
            }
            partial[replace_at] = entered;
        } else {
            // Keep still-valid positions, append the newly entered ranges
            partial.retain(|&pos| in_range(pos));
            partial.reserve(upper - lower);
            for pos in lower..prev_lower.min(upper) {
                partial.push(pos);
            }
            for pos in lower.max(prev_upper)..upper {
                partial.push(pos);
            }
            prev_n = None;
        }
        prev_lower = lower;
        prev_upper = upper;
        let n = percentile_rank(lower, upper, p);
        if prev_n != Some(n) {
            prev_n = Some(n);
            partition_nth(&mut partial, n, &|&a, &b| data[a] < data[b]);
        }
        result.push(Some(data[partial[n]].clone()));
    }
    Ok(result)
}

/// Per-row percentile through order-statistic descents of a built tree
///
/// The tree is built over the row positions reordered by ascending value,
/// so value order is level-0 order and each frame query selects among
/// positions falling inside the frame. The selected level-0 index maps
/// back through the sorted values to the result.
pub fn merge_sort_percentile<E, L, U>(
    config: TreeConfig,
    data: &[E],
    lower_bound: L,
    upper_bound: U,
    p: f64,
) -> Result<Vec<Option<E>>>
where
    E: Ord + Clone,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    validate_percentile(p)?;
    let len = data.len();

    // Sort the values while keeping track of their row positions
    let mut order: Vec<(E, usize)> = data.iter().cloned().zip(0..len).collect();
    order.sort_unstable();
    let mut sorted = Vec::with_capacity(len);
    let mut positions = Vec::with_capacity(len);
    for (value, pos) in order {
        sorted.push(value);
        positions.push(pos);
    }
    let index_tree = MergeSortTree::new(config, positions)?;

    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);
        if lower >= upper {
            result.push(None);
        } else {
            let n = percentile_rank(lower, upper, p);
            let selected = index_tree.select_nth(&lower, &upper, n)?;
            result.push(Some(sorted[selected].clone()));
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_nth_places_order_statistic() {
        let datasets = [
            vec![1i64, 8, 2, 5, 9, 3, 0, 7, 4, 6],
            vec![2, 2, 1, 4, 5, 1, 6, 1, 8, 3],
            vec![2, 2, 1, 4, 5, 1, 6, 1, 8, 3, 1],
        ];
        for data in datasets {
            let mut sorted = data.clone();
            sorted.sort();
            for n in [0usize, 1, 4, 5, 7, 9] {
                let mut work = data.clone();
                partition_nth(&mut work, n, &|a, b| a < b);
                let expected = sorted[n];
                assert_eq!(work[n], expected, "data {:?} n {}", data, n);
                assert!(work[..n].iter().all(|&x| x <= expected));
                assert!(work[n + 1..].iter().all(|&x| x >= expected));
            }
        }
    }

    #[test]
    fn test_partition_nth_keeps_state_between_selections() {
        // Selecting every rank in turn over the same buffer gradually
        // sorts it completely
        let mut data = vec![2i64, 2, 1, 4, 5, 1, 6, 1, 8, 3];
        let mut sorted = data.clone();
        sorted.sort();
        for n in 0..data.len() {
            partition_nth(&mut data, n, &|a, b| a < b);
            assert_eq!(data[n], sorted[n]);
        }
        assert_eq!(data, sorted);
    }

    #[test]
    fn test_percentile_rank_truncates() {
        assert_eq!(percentile_rank(0, 5, 0.5), 2);
        assert_eq!(percentile_rank(0, 4, 0.5), 2);
        assert_eq!(percentile_rank(0, 4, 0.25), 1);
        assert_eq!(percentile_rank(3, 4, 0.75), 0);
    }

    #[test]
    fn test_invalid_percentile_rejected() {
        let data = vec![1i64, 2, 3];
        let lower = |_: usize, _: usize| 0;
        let upper = |i: usize, _: usize| i + 1;
        assert_eq!(
            naive_percentile(&data, lower, upper, 1.0),
            Err(Error::InvalidPercentile(1.0))
        );
        assert_eq!(
            incremental_percentile(&data, lower, upper, -0.1),
            Err(Error::InvalidPercentile(-0.1))
        );
    }
}
