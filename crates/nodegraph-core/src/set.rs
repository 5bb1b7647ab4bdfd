//! Insertion-ordered set with constant-time membership and indexed access.
//!
//! Removal moves the last element into the vacated slot, so indices are
//! only stable between mutations. Role members, label indexes and active
//! edge neighbours are all stored this way.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerableSet<T: Eq + Hash + Clone> {
    values: Vec<T>,
    positions: HashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> Default for EnumerableSet<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> EnumerableSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value. Returns `false` if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.positions.contains_key(&value) {
            return false;
        }
        self.positions.insert(value.clone(), self.values.len());
        self.values.push(value);
        true
    }

    /// Remove a value. Returns `false` if it was absent.
    pub fn remove(&mut self, value: &T) -> bool {
        let Some(index) = self.positions.remove(value) else {
            return false;
        };
        self.values.swap_remove(index);
        if let Some(moved) = self.values.get(index) {
            self.positions.insert(moved.clone(), index);
        }
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.positions.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at `index`, in current enumeration order.
    pub fn at(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Remove everything, returning the values in enumeration order.
    pub fn drain(&mut self) -> Vec<T> {
        self.positions.clear();
        std::mem::take(&mut self.values)
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for EnumerableSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = EnumerableSet::new();
        assert!(set.insert(1));
        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);
        assert_eq!(set.at(0), Some(&1));
    }

    #[test]
    fn test_remove_swaps_last_into_hole() {
        let mut set: EnumerableSet<u32> = [10, 20, 30, 40].into_iter().collect();
        assert!(set.remove(&20));
        assert_eq!(set.as_slice(), &[10, 40, 30]);
        assert!(set.contains(&40));
        assert!(!set.contains(&20));

        // The moved element must still be removable by value.
        assert!(set.remove(&40));
        assert_eq!(set.as_slice(), &[10, 30]);
        assert!(!set.remove(&99));
    }

    #[test]
    fn test_drain() {
        let mut set: EnumerableSet<u32> = [3, 1, 2].into_iter().collect();
        assert_eq!(set.drain(), vec![3, 1, 2]);
        assert!(set.is_empty());
        assert!(set.insert(1));
    }

    proptest! {
        #[test]
        fn test_matches_reference_set(ops in prop::collection::vec((any::<bool>(), 0u8..16), 0..64)) {
            let mut set = EnumerableSet::new();
            let mut reference = std::collections::BTreeSet::new();

            for (insert, value) in ops {
                if insert {
                    prop_assert_eq!(set.insert(value), reference.insert(value));
                } else {
                    prop_assert_eq!(set.remove(&value), reference.remove(&value));
                }
            }

            prop_assert_eq!(set.len(), reference.len());
            for (index, value) in set.iter().enumerate() {
                prop_assert!(reference.contains(value));
                prop_assert_eq!(set.at(index), Some(value));
            }
        }
    }
}
