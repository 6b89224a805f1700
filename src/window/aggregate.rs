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

//! Aggregate plug-ins for distinct aggregation
//!
//! An aggregate participates in DISTINCT evaluation through a small
//! capability set over its state type. All four operations must be
//! consistent: `merge` associative, `remove_value` the inverse of
//! `merge_value`. That restricts the contract to distributive, invertible
//! aggregates. COUNT and SUM qualify; MIN/MAX/AVG do not, because removing
//! a value from their state is not well defined.

/// Capability set of a distributive, invertible aggregate
///
/// The incremental strategy leans on `remove_value` when values leave the
/// frame; the structure-backed strategy folds per-run partial states with
/// `merge`.
pub trait DistinctAggregate<T> {
    /// Accumulated state
    type State: Clone;

    /// The empty aggregate
    fn init() -> Self::State;

    /// Fold one value into the state
    fn merge_value(state: Self::State, value: &T) -> Self::State;

    /// Remove one previously folded value from the state
    fn remove_value(state: Self::State, value: &T) -> Self::State;

    /// Combine two partial states
    fn merge(a: Self::State, b: Self::State) -> Self::State;
}

/// COUNT(DISTINCT expr)
pub struct CountDistinct;

impl<T> DistinctAggregate<T> for CountDistinct {
    type State = usize;

    fn init() -> usize {
        0
    }

    fn merge_value(state: usize, _value: &T) -> usize {
        state + 1
    }

    fn remove_value(state: usize, _value: &T) -> usize {
        state - 1
    }

    fn merge(a: usize, b: usize) -> usize {
        a + b
    }
}

/// SUM(DISTINCT expr) over 64-bit integers
pub struct SumDistinct;

impl DistinctAggregate<i64> for SumDistinct {
    type State = i64;

    fn init() -> i64 {
        0
    }

    fn merge_value(state: i64, value: &i64) -> i64 {
        state + value
    }

    fn remove_value(state: i64, value: &i64) -> i64 {
        state - value
    }

    fn merge(a: i64, b: i64) -> i64 {
        a + b
    }
}
