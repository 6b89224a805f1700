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

//! Merge sort tree with fractional cascading
//!
//! A [`MergeSortTree`] is a static, multi-level range structure built once
//! over a sequence. Level 0 is the input itself; each higher level re-merges
//! the previous one in groups of `fanout`, so every level holds the same
//! multiset partitioned into progressively longer sorted runs. Levels whose
//! run length exceeds the `cascading` interval additionally carry bridge
//! tables: per `cascading` emitted elements, one read-offset per child run,
//! recorded during the merge. Queries descending the tree inherit a bounded
//! search window from the level above through these bridges instead of
//! binary-searching every run from scratch.
//!
//! Construction merges with a [`LoserTree`] tournament per run group and
//! costs O(N log_fanout N). The structure is immutable afterwards, so any
//! number of threads may query it concurrently without synchronization.
//!
//! Query operations are implemented in `query.rs`: canonical-range
//! counting via `aggregate_lower_bound_sum`, per-run visitation via
//! `aggregate_lower_bound`, and order-statistic selection via
//! `select_nth`.

mod loser_tree;
mod query;

pub use loser_tree::{tournament_tree_size, LoserTree};

use smallvec::SmallVec;

use crate::core::{Error, Result};

/// Default merge fanout
pub const DEFAULT_FANOUT: usize = 32;
/// Default cascading interval
pub const DEFAULT_CASCADING: usize = 16;

/// Build-time parameters of a [`MergeSortTree`]
///
/// `fanout` is the number of runs merged into each run of the next level;
/// `cascading` is the emission interval between bridge rows (0 disables
/// fractional cascading entirely). Both are validated once at construction:
/// the fanout must be at least 2, and the cascading interval must align
/// with the fanout, meaning repeated squaring of the smaller of the two
/// eventually divides the larger. Misaligned parameters would place bridge
/// rows off the run boundaries the queries assume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    /// Runs merged per group when building the next level
    pub fanout: usize,
    /// Elements emitted between bridge rows; 0 disables cascading
    pub cascading: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            fanout: DEFAULT_FANOUT,
            cascading: DEFAULT_CASCADING,
        }
    }
}

impl TreeConfig {
    /// Create a new tree config with the given fanout and cascading interval
    pub fn new(fanout: usize, cascading: usize) -> Self {
        Self { fanout, cascading }
    }

    /// Check if fractional cascading is enabled
    #[inline]
    pub fn has_cascading(&self) -> bool {
        self.cascading > 0
    }

    /// Validate the parameter combination
    pub fn validate(&self) -> Result<()> {
        if self.fanout < 2 {
            return Err(Error::InvalidFanout(self.fanout));
        }
        if self.cascading > 0 && !fanouts_align(self.fanout, self.cascading) {
            return Err(Error::MisalignedCascading {
                fanout: self.fanout,
                cascading: self.cascading,
            });
        }
        Ok(())
    }

    /// Lowest level whose nominal run length exceeds the cascading interval
    ///
    /// Levels at or above this carry bridge tables; queries switch to plain
    /// binary search below it. Only meaningful when cascading is enabled.
    pub(crate) fn lowest_cascading_level(&self) -> usize {
        let mut level = 0;
        let mut level_width = 1;
        while level_width <= self.cascading {
            level += 1;
            level_width *= self.fanout;
        }
        level
    }
}

/// Check whether two merge intervals align
///
/// Holds when repeated squaring of the smaller value eventually divides the
/// larger, which is exactly the condition for bridge rows to land on run
/// boundaries at every level.
pub(crate) fn fanouts_align(a: usize, b: usize) -> bool {
    if a == 1 || b == 1 {
        return true;
    }
    let (a, mut b) = if a < b {
        (b as u128, a as u128)
    } else {
        (a as u128, b as u128)
    };
    while a > b {
        b *= b;
    }
    b % a == 0
}

/// One level of the tree: sorted runs plus optional cascading bridges
pub(crate) struct Level<E> {
    /// The level's elements; every `run_length`-aligned slice is sorted
    pub(crate) values: Vec<E>,
    /// Flat bridge table, `fanout` read-offsets per row, when this level's
    /// nominal run length exceeds the cascading interval
    pub(crate) bridges: Option<Vec<usize>>,
}

/// Merge key ordering real elements below the run-exhausted sentinel
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum MergeKey<E> {
    Value(E),
    Exhausted,
}

/// Static multi-level range structure over a totally ordered sequence
///
/// See the [module documentation](self) for the level/bridge layout.
pub struct MergeSortTree<E> {
    config: TreeConfig,
    levels: Vec<Level<E>>,
}

impl<E: Ord + Clone> MergeSortTree<E> {
    /// Build the tree over an owned sequence
    ///
    /// The sequence is moved in and becomes level 0 unchanged; higher levels
    /// are produced by tournament merges over groups of `fanout` runs.
    /// Returns a configuration error for invalid parameters and a resource
    /// error if a cascading bridge table cannot be reserved.
    pub fn new(config: TreeConfig, values: Vec<E>) -> Result<Self> {
        config.validate()?;
        let fanout = config.fanout;
        let cascading = config.cascading;
        let len = values.len();

        let mut levels = vec![Level {
            values,
            bridges: None,
        }];
        let sentinel: (MergeKey<E>, usize) = (MergeKey::Exhausted, usize::MAX);
        let mut merger: LoserTree<(MergeKey<E>, usize)> = LoserTree::new();
        let mut heads: SmallVec<[(MergeKey<E>, usize); 8]> = SmallVec::new();
        let mut read_offsets: SmallVec<[usize; 8]> = SmallVec::new();
        let mut read_limits: SmallVec<[usize; 8]> = SmallVec::new();

        let mut run_length = 1usize;
        while run_length < len {
            let new_run_length = run_length * fanout;
            let new_run_count = len.div_ceil(new_run_length);
            let mut new_values: Vec<E> = Vec::with_capacity(len);
            let mut bridges = if cascading > 0 && new_run_length > cascading {
                Some(reserve_bridge_table(
                    new_run_count * (2 + new_run_length / cascading) * fanout,
                )?)
            } else {
                None
            };

            let prev_values = &levels[levels.len() - 1].values;
            for new_run_idx in 0..new_run_count {
                // Seed the read cursors and the tournament over the run heads
                heads.clear();
                read_offsets.clear();
                read_limits.clear();
                for i in 0..fanout {
                    let run_start = new_run_idx * new_run_length + i * run_length;
                    let offset = run_start.min(len);
                    let limit = (run_start + run_length).min(len);
                    read_offsets.push(offset);
                    read_limits.push(limit);
                    heads.push(if offset != limit {
                        (MergeKey::Value(prev_values[offset].clone()), i)
                    } else {
                        sentinel.clone()
                    });
                }

                // Merge until every input run is exhausted
                let mut winner = merger.build(&heads, &sentinel);
                while winner != sentinel {
                    if let Some(table) = bridges.as_mut() {
                        if new_values.len() % cascading == 0 {
                            table.extend_from_slice(&read_offsets);
                        }
                    }
                    let (key, input_run) = winner;
                    let value = match key {
                        MergeKey::Value(value) => value,
                        MergeKey::Exhausted => break,
                    };
                    new_values.push(value);
                    // Refill from the run that just won
                    read_offsets[input_run] += 1;
                    let offset = read_offsets[input_run];
                    winner = if offset < read_limits[input_run] {
                        merger.update(
                            input_run,
                            (MergeKey::Value(prev_values[offset].clone()), input_run),
                        )
                    } else {
                        merger.update(input_run, sentinel.clone())
                    };
                }
                // Two terminator rows so descents reading past the last
                // emission row stay within the table
                if let Some(table) = bridges.as_mut() {
                    for _ in 0..2 {
                        table.extend_from_slice(&read_offsets);
                    }
                }
            }

            levels.push(Level {
                values: new_values,
                bridges,
            });
            run_length = new_run_length;
        }

        Ok(Self { config, levels })
    }

    /// The build configuration
    #[inline]
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Length of the underlying sequence
    #[inline]
    pub fn len(&self) -> usize {
        self.levels[0].values.len()
    }

    /// Check if the underlying sequence is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels[0].values.is_empty()
    }

    /// Number of levels, counting the input sequence as level 0
    #[inline]
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// The elements of one level
    ///
    /// Every `fanout.pow(level)`-aligned slice of the returned data is a
    /// sorted run (the last run of a level may be shorter).
    pub fn level_values(&self, level: usize) -> &[E] {
        &self.levels[level].values
    }

    /// Assemble a tree from pre-built levels
    ///
    /// Used by distinct aggregation to re-key a zipped tree while keeping
    /// its bridge tables. The levels must follow the layout produced by
    /// [`MergeSortTree::new`] for the same config.
    pub(crate) fn from_levels(config: TreeConfig, levels: Vec<Level<E>>) -> Self {
        Self { config, levels }
    }

    /// Consume the tree, yielding its levels
    pub(crate) fn into_levels(self) -> Vec<Level<E>> {
        self.levels
    }
}

/// Reserve a bridge table up front, surfacing allocation failure
///
/// The capacity formula over-allocates for the (shorter) last run of a
/// level; with a large fanout and a small cascading interval the reserved
/// size can exceed available memory, which must reach the caller as an
/// error rather than an abort.
fn reserve_bridge_table(capacity: usize) -> Result<Vec<usize>> {
    let mut table = Vec::new();
    table
        .try_reserve_exact(capacity)
        .map_err(|_| Error::BridgeAllocation {
            bytes: capacity * std::mem::size_of::<usize>(),
        })?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fanouts_align() {
        assert!(fanouts_align(1, 7));
        assert!(fanouts_align(7, 1));
        assert!(fanouts_align(2, 2));
        assert!(fanouts_align(2, 8));
        assert!(fanouts_align(8, 2));
        assert!(fanouts_align(4, 2));
        assert!(fanouts_align(32, 16));
        assert!(!fanouts_align(6, 4));
        assert!(!fanouts_align(3, 2));
    }

    #[test]
    fn test_config_validation() {
        assert!(TreeConfig::default().validate().is_ok());
        assert!(TreeConfig::new(2, 0).validate().is_ok());
        assert_eq!(
            TreeConfig::new(1, 0).validate(),
            Err(Error::InvalidFanout(1))
        );
        assert_eq!(
            TreeConfig::new(6, 4).validate(),
            Err(Error::MisalignedCascading {
                fanout: 6,
                cascading: 4
            })
        );
    }

    #[test]
    fn test_lowest_cascading_level() {
        assert_eq!(TreeConfig::new(2, 1).lowest_cascading_level(), 1);
        assert_eq!(TreeConfig::new(2, 2).lowest_cascading_level(), 2);
        assert_eq!(TreeConfig::new(2, 8).lowest_cascading_level(), 4);
        assert_eq!(TreeConfig::new(4, 4).lowest_cascading_level(), 2);
        assert_eq!(TreeConfig::new(32, 16).lowest_cascading_level(), 1);
    }

    #[test]
    fn test_degenerate_inputs() {
        let tree = MergeSortTree::new(TreeConfig::new(2, 0), Vec::<i64>::new()).unwrap();
        assert_eq!(tree.height(), 1);
        assert!(tree.is_empty());

        let tree = MergeSortTree::new(TreeConfig::new(2, 0), vec![42i64]).unwrap();
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.level_values(0), &[42]);
    }

    #[test]
    fn test_levels_are_merged_runs() {
        let data = vec![5i64, 1, 4, 2, 3, 0, 7, 6];
        let tree = MergeSortTree::new(TreeConfig::new(2, 0), data).unwrap();
        assert_eq!(tree.height(), 4);
        assert_eq!(tree.level_values(1), &[1, 5, 2, 4, 0, 3, 6, 7]);
        assert_eq!(tree.level_values(2), &[1, 2, 4, 5, 0, 3, 6, 7]);
        assert_eq!(tree.level_values(3), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }
}
