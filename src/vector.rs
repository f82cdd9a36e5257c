//! Sparse right-hand-side vector.

use crate::scalar::Scalar;
use std::ops::{Index, IndexMut};

/// Stable handle to a vector element.
///
/// Handles stay valid across swaps and reordering; the element they refer to
/// moves with its (external) position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Vindex(pub(crate) usize);

#[derive(Debug)]
pub struct VectorElement<T> {
    pub(crate) index: usize,
    pub(crate) value: T,
    pub(crate) next: Option<Vindex>,
}

impl<T: Scalar> VectorElement<T> {
    /// The (internal) index of this element.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// The next (higher-index) element in the vector.
    pub fn next(&self) -> Option<Vindex> {
        self.next
    }
}

/// A sparse vector with singly linked elements in increasing index order.
///
/// Index 0 is a trashcan element absorbing writes addressed to the sentinel
/// index; it never appears in the chain.
pub struct SparseVector<T> {
    // elements[0] is the trashcan.
    elements: Vec<VectorElement<T>>,
    free: Vec<Vindex>,
    first: Option<Vindex>,
    length: usize,
}

impl<T: Scalar> SparseVector<T> {
    pub fn new() -> SparseVector<T> {
        SparseVector {
            elements: vec![VectorElement {
                index: 0,
                value: T::zero(),
                next: None,
            }],
            free: vec![],
            first: None,
            length: 0,
        }
    }

    /// The length of the vector (the highest index referenced so far).
    pub fn length(&self) -> usize {
        self.length
    }

    /// The first (lowest-index) element in the vector.
    pub fn first(&self) -> Option<Vindex> {
        self.first
    }

    /// Returns the element at `index`, creating it if absent.
    pub fn get_element(&mut self, index: usize) -> Vindex {
        if index == 0 {
            return Vindex(0);
        }
        self.length = self.length.max(index);

        // Find the insertion point.
        let mut prev: Option<Vindex> = None;
        let mut cursor = self.first;
        while let Some(vi) = cursor {
            if self[vi].index == index {
                return vi;
            }
            if self[vi].index > index {
                break;
            }
            prev = cursor;
            cursor = self[vi].next;
        }
        let vi = self.allocate(index);
        self.link_after(vi, prev);
        vi
    }

    /// Returns the element at `index` without creating it.
    pub fn find_element(&self, index: usize) -> Option<Vindex> {
        if index == 0 {
            return Some(Vindex(0));
        }
        let mut cursor = self.first;
        while let Some(vi) = cursor {
            if self[vi].index == index {
                return Some(vi);
            }
            if self[vi].index > index {
                return None;
            }
            cursor = self[vi].next;
        }
        None
    }

    /// Removes the element at `index`; its arena slot is reused later.
    pub fn remove_element(&mut self, index: usize) -> bool {
        if index == 0 {
            return false;
        }
        match self.find_element(index) {
            Some(vi) => {
                self.unlink(vi);
                self.elements[vi.0].value = T::zero();
                self.free.push(vi);
                true
            }
            None => false,
        }
    }

    pub fn value(&self, vi: Vindex) -> T {
        self[vi].value
    }

    pub fn set_value(&mut self, vi: Vindex, value: T) {
        self[vi].value = value;
    }

    pub fn add_value(&mut self, vi: Vindex, value: T) {
        self[vi].value += value;
    }

    pub fn subtract_value(&mut self, vi: Vindex, value: T) {
        self[vi].value -= value;
    }

    /// Swaps the elements at positions `index1` and `index2`.
    ///
    /// The elements themselves move; handles keep referring to the same
    /// stamped quantity at its new position.
    pub fn swap(&mut self, index1: usize, index2: usize) {
        if index1 == index2 || index1 == 0 || index2 == 0 {
            return;
        }
        let (lo, hi) = if index1 < index2 {
            (index1, index2)
        } else {
            (index2, index1)
        };
        self.length = self.length.max(hi);

        let a = self.find_element(lo);
        let b = self.find_element(hi);
        if let Some(vi) = a {
            self.unlink(vi);
        }
        if let Some(vi) = b {
            self.unlink(vi);
        }
        if let Some(vi) = a {
            self.elements[vi.0].index = hi;
            self.insert_sorted(vi);
        }
        if let Some(vi) = b {
            self.elements[vi.0].index = lo;
            self.insert_sorted(vi);
        }
    }

    /// Sets every stored value (including the trashcan) back to zero.
    pub fn reset(&mut self) {
        for e in self.elements.iter_mut() {
            e.value = T::zero();
        }
    }

    /// Removes all elements; the vector length becomes 0.
    pub fn clear(&mut self) {
        *self = SparseVector::new();
    }

    fn allocate(&mut self, index: usize) -> Vindex {
        match self.free.pop() {
            Some(vi) => {
                let e = &mut self.elements[vi.0];
                e.index = index;
                e.value = T::zero();
                e.next = None;
                vi
            }
            None => {
                let vi = Vindex(self.elements.len());
                self.elements.push(VectorElement {
                    index,
                    value: T::zero(),
                    next: None,
                });
                vi
            }
        }
    }

    fn link_after(&mut self, vi: Vindex, prev: Option<Vindex>) {
        match prev {
            None => {
                self.elements[vi.0].next = self.first;
                self.first = Some(vi);
            }
            Some(p) => {
                self.elements[vi.0].next = self[p].next;
                self.elements[p.0].next = Some(vi);
            }
        }
    }

    fn insert_sorted(&mut self, vi: Vindex) {
        let index = self[vi].index;
        let mut prev: Option<Vindex> = None;
        let mut cursor = self.first;
        while let Some(ci) = cursor {
            if self[ci].index > index {
                break;
            }
            prev = cursor;
            cursor = self[ci].next;
        }
        self.link_after(vi, prev);
    }

    fn unlink(&mut self, vi: Vindex) {
        let next = self[vi].next;
        let mut prev: Option<Vindex> = None;
        let mut cursor = self.first;
        while let Some(ci) = cursor {
            if ci == vi {
                break;
            }
            prev = cursor;
            cursor = self[ci].next;
        }
        match prev {
            None => self.first = next,
            Some(p) => self.elements[p.0].next = next,
        }
        self.elements[vi.0].next = None;
    }
}

impl<T: Scalar> Default for SparseVector<T> {
    fn default() -> Self {
        SparseVector::new()
    }
}

impl<T: Scalar> Index<Vindex> for SparseVector<T> {
    type Output = VectorElement<T>;
    fn index(&self, vi: Vindex) -> &Self::Output {
        &self.elements[vi.0]
    }
}

impl<T: Scalar> IndexMut<Vindex> for SparseVector<T> {
    fn index_mut(&mut self, vi: Vindex) -> &mut Self::Output {
        &mut self.elements[vi.0]
    }
}
