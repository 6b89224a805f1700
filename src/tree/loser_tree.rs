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

//! Tournament tree (loser tree) for k-way merging
//!
//! A loser tree stores, per internal node, the losing (larger) element of a
//! pairwise comparison; the overall winner surfaces at the root. Replacing
//! the element that just won requires only one leaf-to-root walk, which is
//! what makes the structure the standard engine for k-way merges: one
//! [`LoserTree::update`] per emitted element, O(log k) comparisons each.
//!
//! The tree is transient construction state. [`LoserTree::build`] reuses the
//! node buffers across calls, so seeding a fresh tournament for every merge
//! group allocates nothing after the first group of a level.

/// Number of internal nodes in a tournament over `cnt` leaves
///
/// The leaf layer is padded to the next power of two with sentinels.
#[inline]
pub fn tournament_tree_size(cnt: usize) -> usize {
    cnt.next_power_of_two() - 1
}

/// K-way merge tournament with reusable node storage
///
/// The caller supplies a sentinel that must compare greater than or equal
/// to every real element; it pads an odd leaf count and represents an
/// exhausted input run.
pub struct LoserTree<T> {
    /// Internal nodes, heap layout; each holds the loser of its round
    losers: Vec<T>,
    /// Scratch winner array, only meaningful during [`LoserTree::build`]
    winners: Vec<T>,
}

impl<T: Ord + Clone> LoserTree<T> {
    pub fn new() -> Self {
        Self {
            losers: Vec::new(),
            winners: Vec::new(),
        }
    }

    /// Rebuild the tournament over `elements` and return the initial winner
    ///
    /// Leaves are compared pairwise bottom-up; an odd count is padded with
    /// the sentinel, and leaf pairs beyond the element count hold sentinels
    /// on both sides.
    pub fn build(&mut self, elements: &[T], sentinel: &T) -> T {
        debug_assert!(!elements.is_empty());
        let cnt = elements.len();
        let node_count = tournament_tree_size(cnt);
        self.losers.clear();
        self.losers.resize(node_count, sentinel.clone());
        self.winners.clear();
        self.winners.resize(node_count, sentinel.clone());
        if node_count == 0 {
            // Single-leaf tournament: the leaf wins unopposed
            return elements[0].clone();
        }

        // Build the lowest layer of the winner/loser trees
        let base = node_count / 2;
        let base_level_size = (node_count + 1) / 2;
        for i in 0..cnt / 2 {
            let el1 = &elements[i * 2];
            let el2 = &elements[i * 2 + 1];
            if el1 < el2 {
                self.losers[base + i] = el2.clone();
                self.winners[base + i] = el1.clone();
            } else {
                self.losers[base + i] = el1.clone();
                self.winners[base + i] = el2.clone();
            }
        }
        if cnt % 2 == 1 {
            self.winners[base + cnt / 2] = elements[cnt - 1].clone();
            self.losers[base + cnt / 2] = sentinel.clone();
        }
        for i in cnt.div_ceil(2)..base_level_size {
            self.winners[base + i] = sentinel.clone();
            self.losers[base + i] = sentinel.clone();
        }

        // Build the upper layers
        for target in (0..node_count / 2).rev() {
            let el1 = self.winners[target * 2 + 1].clone();
            let el2 = self.winners[target * 2 + 2].clone();
            if el1 < el2 {
                self.losers[target] = el2;
                self.winners[target] = el1;
            } else {
                self.losers[target] = el1;
                self.winners[target] = el2;
            }
        }

        self.winners[0].clone()
    }

    /// Replace the element at `leaf` and return the new tournament winner
    ///
    /// Walks from the leaf to the root; wherever the stored loser beats the
    /// current candidate, the two swap. The element surviving at the root
    /// is the minimum of the logically updated leaf set.
    pub fn update(&mut self, leaf: usize, new_element: T) -> T {
        let node_count = self.losers.len();
        let mut winner = new_element;
        let mut idx = leaf + node_count;
        while idx != 0 {
            idx = (idx - 1) / 2;
            if self.losers[idx] < winner {
                std::mem::swap(&mut self.losers[idx], &mut winner);
            }
        }
        winner
    }

    /// Internal loser nodes in heap order
    pub fn losers(&self) -> &[T] {
        &self.losers
    }
}

impl<T: Ord + Clone> Default for LoserTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_tree_size() {
        assert_eq!(tournament_tree_size(2), 1);
        assert_eq!(tournament_tree_size(5), 7);
        assert_eq!(tournament_tree_size(8), 7);
        assert_eq!(tournament_tree_size(10), 15);
    }

    #[test]
    fn test_build_power_of_two() {
        let mut tree = LoserTree::new();
        let winner = tree.build(&[2i64, 1, 3, 5, 4, 3, 7, 6], &99);
        assert_eq!(winner, 1);
        assert_eq!(tree.losers(), &[3, 3, 6, 2, 5, 4, 7]);
    }

    #[test]
    fn test_build_odd_count() {
        let mut tree = LoserTree::new();
        let winner = tree.build(&[2i64, 3, 5, 1, 6], &99);
        assert_eq!(winner, 1);
        assert_eq!(tree.losers(), &[6, 2, 99, 3, 5, 99, 99]);
    }

    #[test]
    fn test_reuse_across_builds() {
        let mut tree = LoserTree::new();
        tree.build(&[9i64, 8, 7, 6], &99);
        let winner = tree.build(&[2i64, 1, 3, 5, 4, 3, 7, 6], &99);
        assert_eq!(winner, 1);
        assert_eq!(tree.losers(), &[3, 3, 6, 2, 5, 4, 7]);
    }
}
