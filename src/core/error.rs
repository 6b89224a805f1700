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

//! Error types for Oriel
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for Oriel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Oriel operations
///
/// Covers configuration rejection at build time, precondition violations
/// in the range query engine, and resource exhaustion while sizing
/// cascading bridge tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Fanout below the minimum of 2
    #[error("fanout must be at least 2, got {0}")]
    InvalidFanout(usize),

    /// Cascading interval incompatible with the fanout
    ///
    /// A mismatch would produce silently wrong bridge strides, so it is
    /// rejected up front instead.
    #[error("cascading interval {cascading} does not align with fanout {fanout}")]
    MisalignedCascading { fanout: usize, cascading: usize },

    // =========================================================================
    // Query precondition errors
    // =========================================================================
    /// Empty index range passed to a range query
    #[error("empty query range: lower {lower} is not below upper {upper}")]
    EmptyRange { lower: usize, upper: usize },

    /// Index range extends past the end of the sequence
    #[error("range end {upper} exceeds sequence length {len}")]
    RangeOutOfBounds { upper: usize, len: usize },

    /// Empty value range passed to an order-statistic selection
    #[error("selection range is empty")]
    EmptySelection,

    /// Requested rank not covered by the queried range
    #[error("rank {n} is outside the queried range")]
    RankOutOfBounds { n: usize },

    /// Percentile fraction outside the half-open unit interval
    #[error("percentile must lie in [0, 1), got {0}")]
    InvalidPercentile(f64),

    /// Sliding window of zero rows
    #[error("window size must be at least 1")]
    InvalidWindowSize,

    // =========================================================================
    // Resource errors
    // =========================================================================
    /// Cascading bridge table reservation failed
    ///
    /// Bridge tables over-allocate proportionally to `fanout / cascading`,
    /// so extreme parameter combinations can exhaust memory. Callers
    /// sweeping configurations can skip the offending one on this error.
    #[error("failed to reserve {bytes} bytes for a cascading bridge table")]
    BridgeAllocation { bytes: usize },

    // =========================================================================
    // Other errors
    // =========================================================================
    /// Internal error for unexpected conditions
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a configuration rejection
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidFanout(_) | Error::MisalignedCascading { .. }
        )
    }

    /// Check if this is a caller precondition violation
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Error::EmptyRange { .. }
                | Error::RangeOutOfBounds { .. }
                | Error::EmptySelection
                | Error::RankOutOfBounds { .. }
                | Error::InvalidPercentile(_)
                | Error::InvalidWindowSize
        )
    }

    /// Check if this is a resource exhaustion error
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Error::BridgeAllocation { .. })
    }
}
