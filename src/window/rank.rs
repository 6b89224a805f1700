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

//! Windowed RANK evaluation
//!
//! A row's rank is the number of frame elements comparing strictly below
//! the row's own value; an empty frame ranks 0. Two strategies with
//! identical results:
//!
//! - [`naive_rank`] rescans the frame per row, O(frame) each; it doubles
//!   as the correctness oracle.
//! - [`merge_sort_rank`] builds a [`MergeSortTree`] once and answers each
//!   row with one counting query, O(log N) each.

use crate::core::Result;
use crate::tree::{MergeSortTree, TreeConfig};

/// Per-row rank by rescanning each frame
pub fn naive_rank<E, L, U>(data: &[E], lower_bound: L, upper_bound: U) -> Vec<usize>
where
    E: Ord,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    let len = data.len();
    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);
        let value = &data[i];
        let rank = if lower < upper {
            data[lower..upper].iter().filter(|v| *v < value).count()
        } else {
            0
        };
        result.push(rank);
    }
    result
}

/// Per-row rank through one counting query against a built tree
///
/// Empty frames short-circuit to rank 0 before reaching the query engine.
pub fn merge_sort_rank<E, L, U>(
    config: TreeConfig,
    data: &[E],
    lower_bound: L,
    upper_bound: U,
) -> Result<Vec<usize>>
where
    E: Ord + Clone,
    L: Fn(usize, usize) -> usize,
    U: Fn(usize, usize) -> usize,
{
    let tree = MergeSortTree::new(config, data.to_vec())?;
    let len = data.len();
    let mut result = Vec::with_capacity(len);
    for i in 0..len {
        let lower = lower_bound(i, len);
        let upper = upper_bound(i, len);
        let rank = if lower < upper {
            tree.aggregate_lower_bound_sum(lower, upper, &data[i])?
        } else {
            0
        };
        result.push(rank);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::FrameBound;

    #[test]
    fn test_naive_rank_running() {
        let data = vec![1i64, 2, 3, 5, 9, 3, 0, 7, 4, 6];
        let result = naive_rank(
            &data,
            FrameBound::UnboundedPreceding.as_fn(),
            FrameBound::UntilCurrentRow.as_fn(),
        );
        assert_eq!(result, vec![0, 1, 2, 3, 4, 2, 0, 6, 5, 7]);
    }

    #[test]
    fn test_empty_frames_rank_zero() {
        let data = vec![4i64, 3, 2, 1];
        let result = naive_rank(
            &data,
            FrameBound::FromCurrentRow.as_fn(),
            FrameBound::FromCurrentRow.as_fn(),
        );
        assert_eq!(result, vec![0, 0, 0, 0]);
        let result = merge_sort_rank(
            TreeConfig::new(2, 0),
            &data,
            FrameBound::FromCurrentRow.as_fn(),
            FrameBound::FromCurrentRow.as_fn(),
        )
        .unwrap();
        assert_eq!(result, vec![0, 0, 0, 0]);
    }
}
