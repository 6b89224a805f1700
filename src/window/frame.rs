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

//! Window frame bounds
//!
//! A frame bound is a pure function `(row, len) -> index` resolving one end
//! of a row's half-open frame `[lower, upper)`. The evaluation entry points
//! are generic over plain closures; [`FrameBound`] provides the canonical
//! bounds plus a deliberately non-monotone stress pattern. Frames need not
//! be monotone across rows for correctness, only for the O(1)-amortized
//! guarantee of the incremental strategies.

/// Canonical frame bound shapes
///
/// Each resolves to an index in `[0, len]`. A lower/upper pair where the
/// lower resolves at or above the upper denotes an empty frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameBound {
    /// Start of the partition
    UnboundedPreceding,
    /// End of the partition
    UnboundedFollowing,
    /// The current row, inclusive as a lower bound
    FromCurrentRow,
    /// The current row, inclusive as an upper bound
    UntilCurrentRow,
    /// `n` rows before the current row, clamped at the start
    Preceding(usize),
    /// `n` rows after the current row, clamped at the end
    Following(usize),
    /// Non-monotone stress pattern jumping through the partition
    Oscillating,
}

impl FrameBound {
    /// Resolve the bound for one row
    #[inline]
    pub fn resolve(&self, row: usize, len: usize) -> usize {
        match self {
            FrameBound::UnboundedPreceding => 0,
            FrameBound::UnboundedFollowing => len,
            FrameBound::FromCurrentRow => row,
            FrameBound::UntilCurrentRow => row + 1,
            FrameBound::Preceding(n) => row.saturating_sub(*n),
            FrameBound::Following(n) => (row + n).min(len),
            FrameBound::Oscillating => (row % 8 * len / 7).min(len),
        }
    }

    /// The bound as a plain closure, for the generic evaluation entry points
    #[inline]
    pub fn as_fn(self) -> impl Fn(usize, usize) -> usize + Copy + Send + Sync {
        move |row, len| self.resolve(row, len)
    }
}
