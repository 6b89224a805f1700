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

//! Parallel evaluation strategies
//!
//! - [`parallel`] - Grain-sharded evaluation over shared trees and
//!   worker-local ordered multisets

pub mod parallel;

pub use parallel::{
    parallel_merge_sort_count_distinct, parallel_merge_sort_percentile, parallel_merge_sort_rank,
    sharded_window_percentile, ParallelConfig, DEFAULT_MIN_GRAIN_SIZE, DEFAULT_PARALLEL_MIN_ROWS,
};
