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

//! Window aggregate evaluation
//!
//! Per-row evaluation of windowed aggregates, one scalar per row, each row
//! carrying its own frame:
//!
//! - [`rank`] - RANK: strictly-smaller counts per frame
//! - [`percentile`] - PERCENTILE_DISC: order statistics per frame
//! - [`distinct`] - COUNT(DISTINCT) and invertible aggregates over
//!   distinct frame values
//! - [`frame`] - canonical frame bound functions
//! - [`aggregate`] - the distinct-aggregate plug-in contract
//!
//! Every family ships three interchangeable strategies (naive recompute,
//! incremental delta maintenance, and structure-backed queries over a
//! [`crate::tree::MergeSortTree`]) that always produce identical results;
//! the naive one doubles as the correctness oracle in the test suite.

pub mod aggregate;
pub mod distinct;
pub mod frame;
pub mod percentile;
pub mod rank;

pub use aggregate::{CountDistinct, DistinctAggregate, SumDistinct};
pub use distinct::{
    incremental_aggregate_distinct, incremental_count_distinct, merge_sort_aggregate_distinct,
    merge_sort_count_distinct, naive_aggregate_distinct, naive_count_distinct, prev_offsets,
    IncrementalConfig, DEFAULT_RESET_MULTIPLIER,
};
pub use frame::FrameBound;
pub use percentile::{
    incremental_percentile, merge_sort_percentile, naive_percentile, partition_nth,
};
pub use rank::{merge_sort_rank, naive_rank};
