//! Bidirectional mapping between external and internal indices.
//!
//! Callers address matrix entries by stable external (circuit node) numbers
//! while the solver freely permutes its internal storage during reordering.
//! A `Translation` keeps the two index spaces connected.

use crate::error::{Error, Result};

const INITIAL_SIZE: usize = 4;
const EXPANSION_FACTOR: f64 = 1.5;

/// A permutation of `[1..n]` with its inverse, maintained under swaps.
///
/// Index 0 is a sentinel that always maps to 0. Indices beyond the allocated
/// range behave as identity and are materialized on first access.
#[derive(Debug, Clone)]
pub struct Translation {
    ext_to_int: Vec<usize>,
    int_to_ext: Vec<usize>,
}

impl Translation {
    pub fn new() -> Translation {
        Translation::with_size(INITIAL_SIZE)
    }

    pub fn with_size(size: usize) -> Translation {
        Translation {
            ext_to_int: (0..=size).collect(),
            int_to_ext: (0..=size).collect(),
        }
    }

    /// The highest index currently allocated.
    pub fn len(&self) -> usize {
        self.ext_to_int.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps an external index to its internal position, expanding as needed.
    pub fn to_internal(&mut self, external: usize) -> usize {
        if external == 0 {
            return 0;
        }
        if external > self.len() {
            self.expand(external);
        }
        self.ext_to_int[external]
    }

    /// Maps an internal position back to its external index.
    pub fn to_external(&mut self, internal: usize) -> usize {
        if internal == 0 {
            return 0;
        }
        if internal > self.len() {
            self.expand(internal);
        }
        self.int_to_ext[internal]
    }

    /// Non-expanding form of `to_internal`; unallocated indices are identity.
    pub fn peek_internal(&self, external: usize) -> usize {
        if external > self.len() {
            external
        } else {
            self.ext_to_int[external]
        }
    }

    /// Non-expanding form of `to_external`; unallocated indices are identity.
    pub fn peek_external(&self, internal: usize) -> usize {
        if internal > self.len() {
            internal
        } else {
            self.int_to_ext[internal]
        }
    }

    /// Swaps two internal positions, keeping both arrays exact inverses.
    pub fn swap(&mut self, index1: usize, index2: usize) {
        if index1 == 0 || index2 == 0 {
            return;
        }
        let max = index1.max(index2);
        if max > self.len() {
            self.expand(max);
        }
        self.int_to_ext.swap(index1, index2);
        self.ext_to_int[self.int_to_ext[index1]] = index1;
        self.ext_to_int[self.int_to_ext[index2]] = index2;
    }

    /// Copies an externally indexed vector into an internally indexed one.
    /// Slot 0 of both vectors is ignored.
    pub fn scramble<T: Copy>(&mut self, source: &[T], target: &mut [T]) -> Result<()> {
        if source.len() != target.len() {
            return Err(Error::DimensionMismatch {
                expected: source.len(),
                actual: target.len(),
            });
        }
        if source.len() > 1 && source.len() - 1 > self.len() {
            self.expand(source.len() - 1);
        }
        for i in 1..source.len() {
            target[self.peek_internal(i)] = source[i];
        }
        Ok(())
    }

    /// Copies an internally indexed vector back into an externally indexed
    /// one, inverting `scramble`.
    pub fn unscramble<T: Copy>(&self, source: &[T], target: &mut [T]) -> Result<()> {
        if source.len() != target.len() {
            return Err(Error::DimensionMismatch {
                expected: source.len(),
                actual: target.len(),
            });
        }
        for i in 1..source.len() {
            target[self.peek_external(i)] = source[i];
        }
        Ok(())
    }

    fn expand(&mut self, new_len: usize) {
        let old = self.len();
        let target = new_len.max((old as f64 * EXPANSION_FACTOR) as usize);
        for i in old + 1..=target {
            self.ext_to_int.push(i);
            self.int_to_ext.push(i);
        }
    }

    /// Resets the map to a small identity permutation.
    pub fn clear(&mut self) {
        self.ext_to_int = (0..=INITIAL_SIZE).collect();
        self.int_to_ext = (0..=INITIAL_SIZE).collect();
    }
}

impl Default for Translation {
    fn default() -> Self {
        Translation::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_by_default() {
        let mut t = Translation::new();
        for i in 0..10 {
            assert_eq!(t.to_internal(i), i);
            assert_eq!(t.to_external(i), i);
        }
    }

    #[test]
    fn zero_is_sentinel() {
        let mut t = Translation::new();
        t.swap(1, 3);
        assert_eq!(t.to_internal(0), 0);
        assert_eq!(t.to_external(0), 0);
    }

    #[test]
    fn swap_keeps_inverse() {
        let mut t = Translation::new();
        t.swap(1, 4);
        t.swap(2, 4);
        t.swap(3, 1);
        for i in 1..=8 {
            let ext = t.to_external(i);
            assert_eq!(t.to_internal(ext), i);
            let int = t.to_internal(i);
            assert_eq!(t.to_external(int), i);
        }
    }

    #[test]
    fn swap_expands_to_cover() {
        let mut t = Translation::new();
        t.swap(2, 20);
        assert_eq!(t.to_internal(20), 2);
        assert_eq!(t.to_external(2), 20);
        assert_eq!(t.to_internal(7), 7);
    }

    #[test]
    fn scramble_unscramble_inverse() {
        let mut t = Translation::new();
        t.swap(1, 3);
        t.swap(2, 5);
        t.swap(4, 1);
        let source = vec![0.0, 1.5, -2.0, 3.25, 4.0, -5.5];
        let mut work = vec![0.0; source.len()];
        let mut back = vec![0.0; source.len()];
        t.scramble(&source, &mut work).unwrap();
        t.unscramble(&work, &mut back).unwrap();
        assert_eq!(source[1..], back[1..]);
    }

    #[test]
    fn scramble_length_mismatch() {
        let mut t = Translation::new();
        let source = vec![0.0; 4];
        let mut target = vec![0.0; 5];
        assert!(matches!(
            t.scramble(&source, &mut target),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
