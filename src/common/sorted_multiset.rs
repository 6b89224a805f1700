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

//! Ordered multiset abstraction for the sharded evaluator
//!
//! The sharded window evaluator only needs insert, remove-one, and
//! select-by-rank from its per-worker container. [`OrderedMultiset`]
//! captures that contract so a production deployment can plug in a
//! balanced order-statistics tree; [`SortedVecMultiset`] is the bundled
//! baseline, a sorted vector with O(n) updates and O(1) selection, which
//! is perfectly serviceable for moderate window sizes and doubles as the
//! reference implementation in tests.

/// Ordered container with duplicates and rank selection
pub trait OrderedMultiset<T> {
    /// Insert one occurrence of `value`
    fn insert(&mut self, value: T);

    /// Remove one occurrence of `value`, reporting whether one was present
    fn remove(&mut self, value: &T) -> bool;

    /// The element at ascending rank `rank`, 0-based
    fn select(&self, rank: usize) -> Option<&T>;

    /// Number of contained occurrences
    fn len(&self) -> usize;

    /// Check if the multiset contains nothing
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sorted-vector multiset
pub struct SortedVecMultiset<T> {
    items: Vec<T>,
}

impl<T> SortedVecMultiset<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Pre-size for an expected occupancy
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }
}

impl<T> Default for SortedVecMultiset<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> OrderedMultiset<T> for SortedVecMultiset<T> {
    fn insert(&mut self, value: T) {
        let pos = self.items.partition_point(|v| *v <= value);
        self.items.insert(pos, value);
    }

    fn remove(&mut self, value: &T) -> bool {
        match self.items.binary_search(value) {
            Ok(pos) => {
                self.items.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    #[inline]
    fn select(&self, rank: usize) -> Option<&T> {
        self.items.get(rank)
    }

    #[inline]
    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_select_ordering() {
        let mut set = SortedVecMultiset::new();
        for value in [5i64, 1, 3, 3, 9, 0] {
            set.insert(value);
        }
        assert_eq!(set.len(), 6);
        let selected: Vec<i64> = (0..set.len()).map(|r| *set.select(r).unwrap()).collect();
        assert_eq!(selected, vec![0, 1, 3, 3, 5, 9]);
        assert_eq!(set.select(6), None);
    }

    #[test]
    fn test_remove_one_occurrence() {
        let mut set = SortedVecMultiset::new();
        set.insert(2i64);
        set.insert(2);
        set.insert(7);
        assert!(set.remove(&2));
        assert_eq!(set.len(), 2);
        assert_eq!(set.select(0), Some(&2));
        assert!(set.remove(&2));
        assert!(!set.remove(&2));
        assert_eq!(set.select(0), Some(&7));
    }
}
