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

//! Range queries over a built merge sort tree
//!
//! Two read-only operations, both running in O(log_fanout N) per call:
//!
//! - [`MergeSortTree::aggregate_lower_bound`] decomposes an index range
//!   into its canonical level-aligned runs and reports, per run, how many
//!   elements compare below a needle. [`MergeSortTree::aggregate_lower_bound_sum`]
//!   folds the per-run counts into a total, which is the rank/counting
//!   primitive.
//! - [`MergeSortTree::select_nth`] descends the tree top-down to find the
//!   level-0 position of the element ranked `n` among those whose value
//!   falls in a half-open value range, which is the order-statistic
//!   primitive behind PERCENTILE_DISC.
//!
//! Above the lowest cascaded level, each per-run search resolves through
//! the bridge window inherited from the level before, costing O(1)
//! amortized; below it, runs are binary-searched directly. Bridge cursor
//! arithmetic is signed because the entry-level correction can push a
//! cursor transiently below zero before its first use restores it.

use super::MergeSortTree;
use crate::core::{Error, Result};

/// Index of the first element in `slice` not below `needle`
#[inline]
fn lower_bound<E: Ord>(slice: &[E], needle: &E) -> usize {
    slice.partition_point(|value| value < needle)
}

impl<E: Ord> MergeSortTree<E> {
    /// Visit every canonical run of `[lower, upper)` with its needle split
    ///
    /// `visit(level, run_begin, pos)` receives absolute offsets into
    /// [`MergeSortTree::level_values`]`(level)`: the canonical run starts at
    /// `run_begin` and `pos - run_begin` of its elements compare below
    /// `needle`. Runs arrive left side bottom-up, then right side, per
    /// level; exactly the canonical decomposition, each run reported once.
    ///
    /// Rejects an empty index range and a range end past the sequence.
    pub fn aggregate_lower_bound<F>(
        &self,
        lower: usize,
        upper: usize,
        needle: &E,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(usize, usize, usize),
    {
        let len = self.levels[0].values.len();
        if lower >= upper {
            return Err(Error::EmptyRange { lower, upper });
        }
        if upper > len {
            return Err(Error::RangeOutOfBounds { upper, len });
        }
        let fanout = self.config.fanout;
        let cascading = self.config.cascading;

        // Ascend to the lowest level where both ends share a run; that run
        // is the entry point of the decomposition
        let mut lower_run_idx = lower;
        let mut upper_run_idx = upper - 1;
        let mut prev_upper_run_idx = upper_run_idx;
        let mut level_width = 1usize;
        let mut level = 0usize;
        let mut curr_lower;
        let mut curr_upper;
        if lower_run_idx == upper_run_idx {
            curr_lower = lower_run_idx;
            curr_upper = lower_run_idx;
        } else {
            loop {
                prev_upper_run_idx = upper_run_idx;
                lower_run_idx /= fanout;
                upper_run_idx /= fanout;
                level_width *= fanout;
                level += 1;
                if lower_run_idx == upper_run_idx {
                    break;
                }
            }
            curr_upper = prev_upper_run_idx * level_width / fanout;
            curr_lower = curr_upper;
        }

        // Peel off canonical runs through the cascaded levels
        if cascading > 0 && level > self.config.lowest_cascading_level() {
            let lowest_cascading = self.config.lowest_cascading_level();
            let mut lower_casc: i64;
            let mut upper_casc: i64;
            {
                // Search the entry run once to seed both bridge cursors; the
                // entry is generally not on a child-run boundary, so shift
                // the cursors by the boundary's child index
                let entry_begin = lower_run_idx * level_width;
                let entry_end = (entry_begin + level_width).min(len);
                let level_values = &self.levels[level].values;
                let entry_idx =
                    entry_begin + lower_bound(&level_values[entry_begin..entry_end], needle);
                let base =
                    ((entry_idx / cascading + 2 * (entry_begin / level_width)) * fanout) as i64;
                let correction = (prev_upper_run_idx - upper_run_idx * fanout) as i64;
                lower_casc = base - (fanout as i64 - correction);
                upper_casc = base + correction;
            }
            loop {
                level -= 1;
                level_width /= fanout;
                let level_values = &self.levels[level].values;
                let bridge = match &self.levels[level + 1].bridges {
                    Some(bridge) => bridge.as_slice(),
                    None => return Err(Error::internal("cascading bridge table missing")),
                };

                // Left side: complete sibling runs, right to left
                lower_casc += fanout as i64 - 1;
                while curr_lower - lower >= level_width {
                    let idx = lower_casc as usize;
                    let search_begin = bridge[idx];
                    let search_end = bridge[idx + fanout];
                    let pos =
                        search_begin + lower_bound(&level_values[search_begin..search_end], needle);
                    let run_begin = curr_lower - level_width;
                    visit(level, run_begin, pos);
                    curr_lower -= level_width;
                    lower_casc -= 1;
                }
                // Partial run: search it only to seed the next level's cursor
                if curr_lower != lower {
                    let idx = lower_casc as usize;
                    let search_begin = bridge[idx];
                    let search_end = bridge[idx + fanout];
                    let pos =
                        search_begin + lower_bound(&level_values[search_begin..search_end], needle);
                    lower_casc = ((pos / cascading + 2 * (lower / level_width)) * fanout) as i64;
                }

                // Right side: complete sibling runs, left to right
                while upper - curr_upper >= level_width {
                    let idx = upper_casc as usize;
                    let search_begin = bridge[idx];
                    let search_end = bridge[idx + fanout];
                    let pos =
                        search_begin + lower_bound(&level_values[search_begin..search_end], needle);
                    visit(level, curr_upper, pos);
                    curr_upper += level_width;
                    upper_casc += 1;
                }
                if curr_upper != upper {
                    let idx = upper_casc as usize;
                    let search_begin = bridge[idx];
                    let search_end = bridge[idx + fanout];
                    let pos =
                        search_begin + lower_bound(&level_values[search_begin..search_end], needle);
                    upper_casc = ((pos / cascading + 2 * (upper / level_width)) * fanout) as i64;
                }

                if level < lowest_cascading {
                    break;
                }
            }
        }

        // Levels below the cascading cutoff: plain binary search per run
        while level > 1 {
            level -= 1;
            level_width /= fanout;
            let level_values = &self.levels[level].values;
            while curr_lower - lower >= level_width {
                let run_end = curr_lower;
                let run_begin = run_end - level_width;
                let pos = run_begin + lower_bound(&level_values[run_begin..run_end], needle);
                visit(level, run_begin, pos);
                curr_lower -= level_width;
            }
            while upper - curr_upper >= level_width {
                let run_begin = curr_upper;
                let run_end = run_begin + level_width;
                let pos = run_begin + lower_bound(&level_values[run_begin..run_end], needle);
                visit(level, run_begin, pos);
                curr_upper += level_width;
            }
        }

        // Leftover single positions on level 0
        let level_values = &self.levels[0].values;
        let mut lower_it = lower;
        while lower_it != curr_lower {
            let pos = lower_it + usize::from(level_values[lower_it] < *needle);
            visit(0, lower_it, pos);
            lower_it += 1;
        }
        while curr_upper != upper {
            let pos = curr_upper + usize::from(level_values[curr_upper] < *needle);
            visit(0, curr_upper, pos);
            curr_upper += 1;
        }

        Ok(())
    }

    /// Count the elements of `[lower, upper)` comparing below `needle`
    ///
    /// Folds the canonical decomposition into a single total: the rank of
    /// `needle` within the index range.
    pub fn aggregate_lower_bound_sum(&self, lower: usize, upper: usize, needle: &E) -> Result<usize> {
        let mut sum = 0;
        self.aggregate_lower_bound(lower, upper, needle, |_, run_begin, pos| {
            sum += pos - run_begin;
        })?;
        Ok(sum)
    }

    /// Level-0 position of the rank-`n` element with value in `[lower, upper)`
    ///
    /// Ranks are 0-based and counted in level-0 order among the positions
    /// whose value falls in the half-open value range. When the tree is
    /// built over a value-order-preserving permutation, the result maps
    /// back through that permutation to an order statistic of the original
    /// sequence.
    ///
    /// Rejects an empty value range, and a rank not covered by the range's
    /// matches (detected at the latest during the bottom-level scan).
    pub fn select_nth(&self, lower: &E, upper: &E, n: usize) -> Result<usize> {
        if lower >= upper {
            return Err(Error::EmptySelection);
        }
        let requested = n;
        let mut n = n;

        // A single-level structure holds at most one element
        if self.levels.len() == 1 {
            let values = &self.levels[0].values;
            if n == 0 && values.len() == 1 && values[0] >= *lower && values[0] < *upper {
                return Ok(0);
            }
            return Err(Error::RankOutOfBounds { n: requested });
        }

        let fanout = self.config.fanout;
        let cascading = self.config.cascading;

        // The top level is a single run; start the descent one below it
        let mut level_nr = self.levels.len() - 2;
        let mut level_width = 1usize;
        for _ in 0..level_nr {
            level_width *= fanout;
        }
        let mut traversal_idx = 0usize;

        // Levels with cascading info attached
        if cascading > 0 && level_nr > self.config.lowest_cascading_level() {
            let lowest_cascading = self.config.lowest_cascading_level();
            let mut lower_casc;
            let mut upper_casc;
            {
                let top_values = &self.levels[level_nr + 1].values;
                let lower_entry = lower_bound(top_values, lower);
                lower_casc = lower_entry / cascading * fanout;
                let upper_entry = lower_bound(top_values, upper);
                upper_casc = upper_entry / cascading * fanout;
            }
            loop {
                let level_values = &self.levels[level_nr].values;
                let bridge = match &self.levels[level_nr + 1].bridges {
                    Some(bridge) => bridge.as_slice(),
                    None => return Err(Error::internal("cascading bridge table missing")),
                };
                // Walk children until the one containing rank n, then descend
                loop {
                    let lower_begin = bridge[lower_casc];
                    let lower_end = bridge[lower_casc + fanout];
                    let lower_match =
                        lower_begin + lower_bound(&level_values[lower_begin..lower_end], lower);
                    let upper_begin = bridge[upper_casc];
                    let upper_end = bridge[upper_casc + fanout];
                    let upper_match =
                        upper_begin + lower_bound(&level_values[upper_begin..upper_end], upper);
                    let matches = upper_match - lower_match;
                    if matches <= n {
                        traversal_idx += 1;
                        lower_casc += 1;
                        upper_casc += 1;
                        n -= matches;
                    } else {
                        upper_casc = (upper_match / cascading + 2 * traversal_idx) * fanout;
                        lower_casc = (lower_match / cascading + 2 * traversal_idx) * fanout;
                        traversal_idx *= fanout;
                        level_width /= fanout;
                        level_nr -= 1;
                        break;
                    }
                }
                if level_nr < lowest_cascading {
                    break;
                }
            }
        }

        // Levels below the cascading cutoff
        while level_nr > 0 {
            let level_values = &self.levels[level_nr].values;
            let mut range_begin = traversal_idx * level_width;
            let mut range_end = range_begin + level_width;
            while range_end < level_values.len() {
                let run = &level_values[range_begin..range_end];
                let first = lower_bound(run, lower);
                let last = first + lower_bound(&run[first..], upper);
                let matches = last - first;
                if matches <= n {
                    traversal_idx += 1;
                    n -= matches;
                } else {
                    break;
                }
                range_begin = range_end;
                range_end += level_width;
            }
            traversal_idx *= fanout;
            level_width /= fanout;
            level_nr -= 1;
        }

        // Scan the bottom level for the final position
        let level_values = &self.levels[0].values;
        let mut remaining = n + 1;
        loop {
            if traversal_idx >= level_values.len() {
                return Err(Error::RankOutOfBounds { n: requested });
            }
            let value = &level_values[traversal_idx];
            if *value >= *lower && *value < *upper {
                remaining -= 1;
            }
            if remaining == 0 {
                break;
            }
            traversal_idx += 1;
        }
        Ok(traversal_idx)
    }
}
