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

//! Windowed PERCENTILE_DISC Tests
//!
//! Tests the naive oracle against fixed expectations and the incremental
//! and structure-backed strategies against the oracle across frame
//! bounds, percentile fractions, and tree configurations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use oriel::{
    incremental_percentile, merge_sort_percentile, naive_percentile, Error, FrameBound, TreeConfig,
};

fn uniform_random(size: usize, distinct: i64, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size).map(|_| rng.gen_range(1..=distinct)).collect()
}

const CONFIG_GRID: [(usize, usize); 9] = [
    (2, 0),
    (3, 0),
    (4, 0),
    (2, 1),
    (3, 1),
    (4, 1),
    (2, 2),
    (3, 3),
    (4, 4),
];

fn bound_pairs() -> Vec<(&'static str, FrameBound, FrameBound)> {
    vec![
        (
            "u,c",
            FrameBound::UnboundedPreceding,
            FrameBound::UntilCurrentRow,
        ),
        (
            "c,u",
            FrameBound::FromCurrentRow,
            FrameBound::UnboundedFollowing,
        ),
        ("p,c", FrameBound::Preceding(3), FrameBound::UntilCurrentRow),
        ("c,f", FrameBound::FromCurrentRow, FrameBound::Following(3)),
        ("c,o", FrameBound::FromCurrentRow, FrameBound::Oscillating),
    ]
}

fn datasets() -> Vec<Vec<i64>> {
    vec![
        vec![1i64, 2, 1, 3, 1, 1, 1, 2, 3, 1],
        vec![4, 1, 3, 4, 2, 1, 1, 4, 2, 1, 4, 5, 3, 1, 1, 1, 5, 1, 2, 4],
    ]
}

/// Test the median over a trailing window of odd size
#[test]
fn test_naive_median_odd_frame() {
    let input = vec![1i64, 2, 3, 5, 9, 3, 0, 7, 4, 6];
    let expected: Vec<Option<i64>> = vec![1, 2, 2, 3, 5, 5, 3, 3, 4, 6]
        .into_iter()
        .map(Some)
        .collect();
    let result = naive_percentile(
        &input,
        FrameBound::Preceding(2).as_fn(),
        FrameBound::UntilCurrentRow.as_fn(),
        0.5,
    )
    .unwrap();
    assert_eq!(result, expected);
}

/// Test the median over a trailing window of even size
#[test]
fn test_naive_median_even_frame() {
    let input = vec![1i64, 2, 3, 5, 9, 3, 0, 7, 4, 6];
    let expected: Vec<Option<i64>> = vec![1, 2, 2, 3, 5, 5, 5, 7, 4, 6]
        .into_iter()
        .map(Some)
        .collect();
    let result = naive_percentile(
        &input,
        FrameBound::Preceding(3).as_fn(),
        FrameBound::UntilCurrentRow.as_fn(),
        0.5,
    )
    .unwrap();
    assert_eq!(result, expected);
}

/// Test the first quartile over a running frame
#[test]
fn test_naive_first_quartile() {
    let input = vec![1i64, 2, 3, 5, 9, 3, 0, 7, 4, 6];
    let expected: Vec<Option<i64>> = vec![1, 1, 1, 2, 2, 2, 1, 2, 2, 2]
        .into_iter()
        .map(Some)
        .collect();
    let result = naive_percentile(
        &input,
        FrameBound::UnboundedPreceding.as_fn(),
        FrameBound::UntilCurrentRow.as_fn(),
        0.25,
    )
    .unwrap();
    assert_eq!(result, expected);
}

/// Test the incremental strategy against the oracle
#[test]
fn test_incremental_agrees_with_naive() {
    for data in datasets() {
        for p in [0.25, 0.5, 0.75] {
            for (bounds, lower, upper) in bound_pairs() {
                let expected =
                    naive_percentile(&data, lower.as_fn(), upper.as_fn(), p).unwrap();
                let result =
                    incremental_percentile(&data, lower.as_fn(), upper.as_fn(), p).unwrap();
                assert_eq!(result, expected, "p {} bounds {} data {:?}", p, bounds, data);
            }
        }
    }
}

/// Test the incremental strategy on larger random data
#[test]
fn test_incremental_agrees_with_naive_random() {
    for seed in [8u64, 9] {
        let data = uniform_random(300, 40, seed);
        for p in [0.25, 0.5, 0.75] {
            for (bounds, lower, upper) in bound_pairs() {
                let expected =
                    naive_percentile(&data, lower.as_fn(), upper.as_fn(), p).unwrap();
                let result =
                    incremental_percentile(&data, lower.as_fn(), upper.as_fn(), p).unwrap();
                assert_eq!(result, expected, "seed {} p {} bounds {}", seed, p, bounds);
            }
        }
    }
}

/// Test the structure-backed strategy against the oracle
#[test]
fn test_merge_sort_agrees_with_naive() {
    for (fanout, cascading) in CONFIG_GRID {
        let config = TreeConfig::new(fanout, cascading);
        for data in datasets() {
            for p in [0.25, 0.5, 0.75] {
                for (bounds, lower, upper) in bound_pairs() {
                    let expected =
                        naive_percentile(&data, lower.as_fn(), upper.as_fn(), p).unwrap();
                    let result =
                        merge_sort_percentile(config, &data, lower.as_fn(), upper.as_fn(), p)
                            .unwrap();
                    assert_eq!(
                        result, expected,
                        "fanout {} cascading {} p {} bounds {}",
                        fanout, cascading, p, bounds
                    );
                }
            }
        }
    }
}

/// Test the structure-backed strategy on larger random data
#[test]
fn test_merge_sort_agrees_with_naive_random() {
    let data = uniform_random(400, 60, 21);
    for p in [0.25, 0.5, 0.75] {
        for (bounds, lower, upper) in bound_pairs() {
            let expected = naive_percentile(&data, lower.as_fn(), upper.as_fn(), p).unwrap();
            let result = merge_sort_percentile(
                TreeConfig::default(),
                &data,
                lower.as_fn(),
                upper.as_fn(),
                p,
            )
            .unwrap();
            assert_eq!(result, expected, "p {} bounds {}", p, bounds);
        }
    }
}

/// Test that empty frames yield None and never error
#[test]
fn test_empty_frames_yield_none() {
    let data = vec![3i64, 1, 4, 1, 5];
    let lower = FrameBound::FromCurrentRow;
    let upper = FrameBound::FromCurrentRow;
    let expected: Vec<Option<i64>> = vec![None; 5];
    assert_eq!(
        naive_percentile(&data, lower.as_fn(), upper.as_fn(), 0.5).unwrap(),
        expected
    );
    assert_eq!(
        incremental_percentile(&data, lower.as_fn(), upper.as_fn(), 0.5).unwrap(),
        expected
    );
    assert_eq!(
        merge_sort_percentile(TreeConfig::new(2, 1), &data, lower.as_fn(), upper.as_fn(), 0.5)
            .unwrap(),
        expected
    );
}

/// Test percentile fraction validation
#[test]
fn test_percentile_fraction_validated() {
    let data = vec![1i64, 2, 3];
    let lower = FrameBound::UnboundedPreceding;
    let upper = FrameBound::UntilCurrentRow;
    assert_eq!(
        naive_percentile(&data, lower.as_fn(), upper.as_fn(), 1.0),
        Err(Error::InvalidPercentile(1.0))
    );
    assert_eq!(
        incremental_percentile(&data, lower.as_fn(), upper.as_fn(), 2.5),
        Err(Error::InvalidPercentile(2.5))
    );
    assert_eq!(
        merge_sort_percentile(TreeConfig::new(2, 0), &data, lower.as_fn(), upper.as_fn(), -0.5),
        Err(Error::InvalidPercentile(-0.5))
    );
}
