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

//! Loser Tree Tests
//!
//! Tests the tournament merge primitive: exact tree shapes after build,
//! winner tracking across updates, and a full k-way merge driven through
//! the update loop.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use oriel::LoserTree;

const SENTINEL: i64 = 99;

/// Test build when the element count is a power of two
#[test]
fn test_build_power_of_two() {
    let input = [2i64, 1, 3, 5, 4, 3, 7, 6];
    let mut tree = LoserTree::new();
    let winner = tree.build(&input, &SENTINEL);
    assert_eq!(winner, 1);
    assert_eq!(tree.losers(), &[3, 3, 6, 2, 5, 4, 7]);
}

/// Test build with an even, non-power-of-two element count
#[test]
fn test_build_even_count() {
    let input = [3i64, 6, 2, 4, 0, 7, 5, 8, 1, 4];
    let mut tree = LoserTree::new();
    let winner = tree.build(&input, &SENTINEL);
    assert_eq!(winner, 0);
    assert_eq!(
        tree.losers(),
        &[1, 2, 99, 3, 5, 99, 99, 6, 4, 7, 8, 4, 99, 99, 99]
    );
}

/// Test build with an odd element count, padded with the sentinel
#[test]
fn test_build_odd_count() {
    let input = [2i64, 3, 5, 1, 6];
    let mut tree = LoserTree::new();
    let winner = tree.build(&input, &SENTINEL);
    assert_eq!(winner, 1);
    assert_eq!(tree.losers(), &[6, 2, 99, 3, 5, 99, 99]);
}

/// Test that updates surface the minimum of the logically updated leaves
#[test]
fn test_update_tracks_minimum() {
    let input = [3i64, 0, 2, 4, 1];
    let mut tree = LoserTree::new();
    let winner = tree.build(&input, &SENTINEL);
    assert_eq!(winner, 0);
    // Leaves now logically 3,1,2,4,1
    let winner = tree.update(1, 1);
    assert_eq!(winner, 1);
    // Leaves now logically 3,8,2,4,1
    let winner = tree.update(1, 8);
    assert_eq!(winner, 1);
    // Leaves now logically 3,8,2,4,6
    let winner = tree.update(4, 6);
    assert_eq!(winner, 2);
    assert_eq!(tree.losers(), &[6, 3, 99, 8, 4, 99, 99]);
}

/// Test a complete k-way merge driven through build + update
#[test]
fn test_merges_sorted_runs() {
    let mut rng = StdRng::seed_from_u64(7);
    for run_count in [2usize, 3, 5, 8] {
        // Sorted runs of uneven lengths over (value, run) pairs; the run
        // index breaks ties the same way the construction merge does
        let runs: Vec<Vec<i64>> = (0..run_count)
            .map(|_| {
                let len = rng.gen_range(0..12);
                let mut run: Vec<i64> = (0..len).map(|_| rng.gen_range(0..40)).collect();
                run.sort_unstable();
                run
            })
            .collect();
        let sentinel = (i64::MAX, usize::MAX);
        let mut cursors = vec![0usize; run_count];
        let heads: Vec<(i64, usize)> = runs
            .iter()
            .enumerate()
            .map(|(r, run)| run.first().map(|&v| (v, r)).unwrap_or(sentinel))
            .collect();
        let mut tree = LoserTree::new();
        let mut winner = tree.build(&heads, &sentinel);

        let mut merged = Vec::new();
        while winner != sentinel {
            let (value, run) = winner;
            merged.push(value);
            cursors[run] += 1;
            winner = if cursors[run] < runs[run].len() {
                tree.update(run, (runs[run][cursors[run]], run))
            } else {
                tree.update(run, sentinel)
            };
        }

        let mut expected: Vec<i64> = runs.iter().flatten().copied().collect();
        expected.sort_unstable();
        assert_eq!(merged, expected, "runs {:?}", runs);
    }
}

/// Test that replacing the winner's leaf always surfaces the new minimum
///
/// An update must target the leaf the last winner came from, which is how
/// a merge refills the run that just produced an element. Tracking leaves
/// as (value, leaf) pairs makes the winner's origin observable.
#[test]
fn test_winner_is_always_minimum() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut leaves: Vec<(i64, usize)> = (0..6).map(|i| (rng.gen_range(0..50), i)).collect();
    let mut tree = LoserTree::new();
    let sentinel = (i64::MAX, usize::MAX);
    let mut winner = tree.build(&leaves, &sentinel);
    assert_eq!(winner, *leaves.iter().min().unwrap());
    for _ in 0..100 {
        let (_, leaf) = winner;
        let replacement = (rng.gen_range(0..50), leaf);
        leaves[leaf] = replacement;
        winner = tree.update(leaf, replacement);
        assert_eq!(
            winner,
            *leaves.iter().min().unwrap(),
            "after replacing leaf {} with {:?}",
            leaf,
            replacement
        );
    }
}
