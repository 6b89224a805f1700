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

//! # Oriel - Window aggregate evaluation over merge sort trees
//!
//! Oriel evaluates SQL-style window aggregate functions (RANK,
//! PERCENTILE_DISC, COUNT(DISTINCT), and general invertible aggregates
//! over distinct values) for every row of a column, each row carrying its
//! own frame. The workhorse is a static, cache-conscious merge sort tree
//! augmented with fractional cascading: built once in O(N log N) by
//! loser-tree k-way merges, it answers per-row rank, order-statistic, and
//! distinct-counting queries in O(log N), and being immutable it serves
//! any number of concurrent readers without locks.
//!
//! ## Key Features
//!
//! - **Merge sort tree** - Multi-level sorted runs with optional
//!   fractional-cascading bridge tables, tunable fanout and cascading
//!   interval validated at construction
//! - **Loser-tree merging** - Tournament k-way merge with reusable
//!   scratch buffers in the construction hot path
//! - **Three strategies per aggregate family** - Naive recompute,
//!   incremental delta maintenance, and structure-backed queries, always
//!   producing identical results
//! - **Distinct aggregation** - The prev-offset encoding turns DISTINCT
//!   over a frame into a plain counting query
//! - **Grain-sharded parallelism** - Rayon workers share one immutable
//!   tree, or slide worker-local ordered multisets over a sorted column
//!
//! ## Quick Start
//!
//! ```rust
//! use oriel::{merge_sort_rank, naive_rank, FrameBound, TreeConfig};
//!
//! let data = vec![1i64, 2, 3, 5, 9, 3, 0, 7, 4, 6];
//! let lower = FrameBound::UnboundedPreceding.as_fn();
//! let upper = FrameBound::UntilCurrentRow.as_fn();
//!
//! let ranks = merge_sort_rank(TreeConfig::default(), &data, lower, upper).unwrap();
//! assert_eq!(ranks, naive_rank(&data, lower, upper));
//! assert_eq!(ranks, vec![0, 1, 2, 3, 4, 2, 0, 6, 5, 7]);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - Core types ([`Error`], [`Result`])
//! - [`tree`] - The merge sort tree and its query engine
//! - [`window`] - Per-row window aggregate strategies
//! - [`executor`] - Grain-sharded parallel evaluation
//! - [`common`] - Utilities ([`OrderedMultiset`], [`SortedVecMultiset`])

pub mod common;
pub mod core;
pub mod executor;
pub mod tree;
pub mod window;

// Re-export main types for convenience
pub use core::{Error, Result};

// Re-export tree types
pub use tree::{
    tournament_tree_size, LoserTree, MergeSortTree, TreeConfig, DEFAULT_CASCADING, DEFAULT_FANOUT,
};

// Re-export window evaluation entry points
pub use window::{
    incremental_aggregate_distinct, incremental_count_distinct, incremental_percentile,
    merge_sort_aggregate_distinct, merge_sort_count_distinct, merge_sort_percentile,
    merge_sort_rank, naive_aggregate_distinct, naive_count_distinct, naive_percentile, naive_rank,
    partition_nth, prev_offsets, CountDistinct, DistinctAggregate, FrameBound, IncrementalConfig,
    SumDistinct, DEFAULT_RESET_MULTIPLIER,
};

// Re-export executor types
pub use executor::{
    parallel_merge_sort_count_distinct, parallel_merge_sort_percentile, parallel_merge_sort_rank,
    sharded_window_percentile, ParallelConfig, DEFAULT_MIN_GRAIN_SIZE, DEFAULT_PARALLEL_MIN_ROWS,
};

// Re-export common utilities
pub use common::{OrderedMultiset, SortedVecMultiset};
