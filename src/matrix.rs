//! Doubly linked sparse matrix.
//!
//! Elements live in an arena and are referenced by stable `Eindex` handles;
//! all row/column chain links are arena indices, never pointers. Each element
//! is linked into its row (left/right) and its column (up/down), with
//! first/last head arrays per row and column plus a diagonal fast-access
//! array. Rows and columns are 1-based; row/column 0 address a trashcan
//! element that absorbs stray reads and writes.

use crate::scalar::Scalar;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Stable handle to a matrix element.
///
/// Handles survive swaps and reordering: the element they refer to moves with
/// its stamped location, so a handle acquired before factorization keeps
/// addressing the same (external) matrix entry afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Eindex(pub(crate) usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Axis {
    Rows,
    Cols,
}

impl Axis {
    pub(crate) fn other(&self) -> Axis {
        match self {
            Axis::Rows => Axis::Cols,
            Axis::Cols => Axis::Rows,
        }
    }
}

#[derive(Debug)]
pub struct Element<T> {
    pub(crate) row: usize,
    pub(crate) column: usize,
    pub(crate) value: T,
    pub(crate) left: Option<Eindex>,
    pub(crate) right: Option<Eindex>,
    pub(crate) up: Option<Eindex>,
    pub(crate) down: Option<Eindex>,
}

impl<T: Scalar> Element<T> {
    fn new(row: usize, column: usize) -> Element<T> {
        Element {
            row,
            column,
            value: T::zero(),
            left: None,
            right: None,
            up: None,
            down: None,
        }
    }

    /// The (internal) row of this element.
    pub fn row(&self) -> usize {
        self.row
    }

    /// The (internal) column of this element.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// The next element to the right in this row.
    pub fn right(&self) -> Option<Eindex> {
        self.right
    }

    /// The next element below in this column.
    pub fn down(&self) -> Option<Eindex> {
        self.down
    }

    pub fn left(&self) -> Option<Eindex> {
        self.left
    }

    pub fn up(&self) -> Option<Eindex> {
        self.up
    }

    // Chains are addressed by axis: the `Rows` chain of an element is its
    // row, linked left/right and sorted by column; the `Cols` chain is its
    // column, linked up/down and sorted by row.

    pub(crate) fn loc(&self, ax: Axis) -> usize {
        match ax {
            Axis::Rows => self.row,
            Axis::Cols => self.column,
        }
    }

    fn set_loc(&mut self, ax: Axis, to: usize) {
        match ax {
            Axis::Rows => self.row = to,
            Axis::Cols => self.column = to,
        }
    }

    pub(crate) fn next(&self, ax: Axis) -> Option<Eindex> {
        match ax {
            Axis::Rows => self.right,
            Axis::Cols => self.down,
        }
    }

    fn set_next(&mut self, ax: Axis, to: Option<Eindex>) {
        match ax {
            Axis::Rows => self.right = to,
            Axis::Cols => self.down = to,
        }
    }

    pub(crate) fn prev(&self, ax: Axis) -> Option<Eindex> {
        match ax {
            Axis::Rows => self.left,
            Axis::Cols => self.up,
        }
    }

    fn set_prev(&mut self, ax: Axis, to: Option<Eindex>) {
        match ax {
            Axis::Rows => self.left = to,
            Axis::Cols => self.up = to,
        }
    }
}

#[derive(Debug)]
struct AxisHeads {
    first: Vec<Option<Eindex>>,
    last: Vec<Option<Eindex>>,
}

impl AxisHeads {
    fn new() -> AxisHeads {
        AxisHeads {
            first: vec![None],
            last: vec![None],
        }
    }

    fn grow(&mut self, to: usize) {
        while self.first.len() <= to {
            self.first.push(None);
            self.last.push(None);
        }
    }

    fn swap(&mut self, x: usize, y: usize) {
        self.first.swap(x, y);
        self.last.swap(x, y);
    }
}

/// Square sparse matrix, automatically expanding as elements are created.
pub struct SparseMatrix<T> {
    // elements[0] is the trashcan.
    elements: Vec<Element<T>>,
    free: Vec<Eindex>,
    rows: AxisHeads,
    cols: AxisHeads,
    diagonal: Vec<Option<Eindex>>,
    size: usize,
    element_count: usize,
}

impl<T: Scalar> SparseMatrix<T> {
    pub fn new() -> SparseMatrix<T> {
        SparseMatrix {
            elements: vec![Element::new(0, 0)],
            free: vec![],
            rows: AxisHeads::new(),
            cols: AxisHeads::new(),
            diagonal: vec![None],
            size: 0,
            element_count: 0,
        }
    }

    /// The matrix size (highest row/column referenced so far).
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of stored elements, excluding the trashcan.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Returns the element at `(row, column)`, creating it if absent.
    /// The matrix expands to cover the location.
    pub fn get_element(&mut self, row: usize, column: usize) -> Eindex {
        if row == 0 || column == 0 {
            return Eindex(0);
        }
        if row > self.size || column > self.size {
            self.expand(row.max(column));
        }
        if row == column {
            if let Some(d) = self.diagonal[row] {
                return d;
            }
        }
        // Search the row chain for an existing element.
        let mut cursor = self.rows.first[row];
        while let Some(ci) = cursor {
            if self.elements[ci.0].column == column {
                return ci;
            }
            if self.elements[ci.0].column > column {
                break;
            }
            cursor = self.elements[ci.0].right;
        }
        let ei = self.allocate(row, column);
        self.insert_chain(Axis::Rows, ei);
        self.insert_chain(Axis::Cols, ei);
        if row == column {
            self.diagonal[row] = Some(ei);
        }
        self.element_count += 1;
        ei
    }

    /// Returns the element at `(row, column)` without creating it.
    pub fn find_element(&self, row: usize, column: usize) -> Option<Eindex> {
        if row == 0 || column == 0 {
            return Some(Eindex(0));
        }
        if row > self.size || column > self.size {
            return None;
        }
        if row == column {
            return self.diagonal[row];
        }
        let mut cursor = self.rows.first[row];
        while let Some(ci) = cursor {
            if self.elements[ci.0].column == column {
                return Some(ci);
            }
            if self.elements[ci.0].column > column {
                return None;
            }
            cursor = self.elements[ci.0].right;
        }
        None
    }

    /// Removes the element at `(row, column)`; its arena slot is reused.
    pub fn remove_element(&mut self, row: usize, column: usize) -> bool {
        if row == 0 || column == 0 || row > self.size || column > self.size {
            return false;
        }
        let ei = match self.find_element(row, column) {
            Some(ei) => ei,
            None => return false,
        };
        self.unlink(Axis::Rows, ei);
        self.unlink(Axis::Cols, ei);
        if row == column {
            self.diagonal[row] = None;
        }
        self.elements[ei.0].value = T::zero();
        self.free.push(ei);
        self.element_count -= 1;
        true
    }

    /// The diagonal element at `(index, index)`, if present.
    pub fn diagonal(&self, index: usize) -> Option<Eindex> {
        if index == 0 || index > self.size {
            return None;
        }
        self.diagonal[index]
    }

    pub fn first_in_row(&self, row: usize) -> Option<Eindex> {
        if row == 0 || row > self.size {
            return None;
        }
        self.rows.first[row]
    }

    pub fn last_in_row(&self, row: usize) -> Option<Eindex> {
        if row == 0 || row > self.size {
            return None;
        }
        self.rows.last[row]
    }

    pub fn first_in_column(&self, column: usize) -> Option<Eindex> {
        if column == 0 || column > self.size {
            return None;
        }
        self.cols.first[column]
    }

    pub fn last_in_column(&self, column: usize) -> Option<Eindex> {
        if column == 0 || column > self.size {
            return None;
        }
        self.cols.last[column]
    }

    pub fn value(&self, ei: Eindex) -> T {
        self.elements[ei.0].value
    }

    pub fn set_value(&mut self, ei: Eindex, value: T) {
        self.elements[ei.0].value = value;
    }

    pub fn add_value(&mut self, ei: Eindex, value: T) {
        self.elements[ei.0].value += value;
    }

    pub fn subtract_value(&mut self, ei: Eindex, value: T) {
        self.elements[ei.0].value -= value;
    }

    /// Swaps two (internal) rows, relinking every affected element.
    /// Translation maps are the caller's responsibility.
    pub fn swap_rows(&mut self, row1: usize, row2: usize) {
        self.swap_axis(Axis::Rows, row1, row2);
    }

    /// Swaps two (internal) columns.
    pub fn swap_columns(&mut self, column1: usize, column2: usize) {
        self.swap_axis(Axis::Cols, column1, column2);
    }

    /// Sets every stored value (including the trashcan) back to zero,
    /// leaving the sparsity pattern intact.
    pub fn reset(&mut self) {
        for e in self.elements.iter_mut() {
            e.value = T::zero();
        }
    }

    /// Removes all elements; the size becomes 0.
    pub fn clear(&mut self) {
        *self = SparseMatrix::new();
    }

    fn expand(&mut self, new_size: usize) {
        if new_size <= self.size {
            return;
        }
        self.rows.grow(new_size);
        self.cols.grow(new_size);
        while self.diagonal.len() <= new_size {
            self.diagonal.push(None);
        }
        self.size = new_size;
    }

    fn allocate(&mut self, row: usize, column: usize) -> Eindex {
        match self.free.pop() {
            Some(ei) => {
                self.elements[ei.0] = Element::new(row, column);
                ei
            }
            None => {
                let ei = Eindex(self.elements.len());
                self.elements.push(Element::new(row, column));
                ei
            }
        }
    }

    fn heads(&self, ax: Axis) -> &AxisHeads {
        match ax {
            Axis::Rows => &self.rows,
            Axis::Cols => &self.cols,
        }
    }

    fn heads_mut(&mut self, ax: Axis) -> &mut AxisHeads {
        match ax {
            Axis::Rows => &mut self.rows,
            Axis::Cols => &mut self.cols,
        }
    }

    /// Removes `ei` from its chain along `ax`, fixing neighbor links and the
    /// chain's first/last heads.
    fn unlink(&mut self, ax: Axis, ei: Eindex) {
        let prev = self.elements[ei.0].prev(ax);
        let next = self.elements[ei.0].next(ax);
        let loc = self.elements[ei.0].loc(ax);
        match prev {
            Some(p) => self.elements[p.0].set_next(ax, next),
            None => self.heads_mut(ax).first[loc] = next,
        }
        match next {
            Some(n) => self.elements[n.0].set_prev(ax, prev),
            None => self.heads_mut(ax).last[loc] = prev,
        }
        self.elements[ei.0].set_prev(ax, None);
        self.elements[ei.0].set_next(ax, None);
    }

    /// Splices `ei` into its chain along `ax` directly after `prev`
    /// (`None` inserts at the front).
    fn link_after(&mut self, ax: Axis, ei: Eindex, prev: Option<Eindex>) {
        let loc = self.elements[ei.0].loc(ax);
        let next = match prev {
            Some(p) => self.elements[p.0].next(ax),
            None => self.heads(ax).first[loc],
        };
        self.elements[ei.0].set_prev(ax, prev);
        self.elements[ei.0].set_next(ax, next);
        match prev {
            Some(p) => self.elements[p.0].set_next(ax, Some(ei)),
            None => self.heads_mut(ax).first[loc] = Some(ei),
        }
        match next {
            Some(n) => self.elements[n.0].set_prev(ax, Some(ei)),
            None => self.heads_mut(ax).last[loc] = Some(ei),
        }
    }

    /// Inserts `ei` into its chain along `ax` at the sorted position.
    /// The chain must not already contain the element's off-axis location.
    fn insert_chain(&mut self, ax: Axis, ei: Eindex) {
        let loc = self.elements[ei.0].loc(ax);
        let key = self.elements[ei.0].loc(ax.other());

        // Appending in order is the common stamping pattern.
        if let Some(l) = self.heads(ax).last[loc] {
            if self.elements[l.0].loc(ax.other()) < key {
                return self.link_after(ax, ei, Some(l));
            }
        }
        let mut prev: Option<Eindex> = None;
        let mut cursor = self.heads(ax).first[loc];
        while let Some(ci) = cursor {
            if self.elements[ci.0].loc(ax.other()) > key {
                break;
            }
            prev = cursor;
            cursor = self.elements[ci.0].next(ax);
        }
        self.link_after(ax, ei, prev);
    }

    /// Changes the `ax` location of `ei` to `to`, relocating it within its
    /// off-axis chain. The walk starts from the element's old neighbors, so
    /// short moves are cheap.
    fn move_element(&mut self, ax: Axis, ei: Eindex, to: usize) {
        let from = self.elements[ei.0].loc(ax);
        if from == to {
            return;
        }
        let off = ax.other();
        let old_prev = self.elements[ei.0].prev(off);
        let old_next = self.elements[ei.0].next(off);
        self.unlink(off, ei);
        self.elements[ei.0].set_loc(ax, to);

        if to > from {
            let mut after = old_prev;
            let mut cursor = old_next;
            while let Some(ci) = cursor {
                if self.elements[ci.0].loc(ax) > to {
                    break;
                }
                after = cursor;
                cursor = self.elements[ci.0].next(off);
            }
            self.link_after(off, ei, after);
        } else {
            let mut after = old_prev;
            while let Some(ci) = after {
                if self.elements[ci.0].loc(ax) < to {
                    break;
                }
                after = self.elements[ci.0].prev(off);
            }
            self.link_after(off, ei, after);
        }

        let chain_loc = self.elements[ei.0].loc(off);
        if from == chain_loc {
            self.diagonal[from] = None;
        }
        if to == chain_loc {
            self.diagonal[to] = Some(ei);
        }
    }

    /// Exchanges the `ax` locations of two elements sharing an off-axis
    /// chain. `a` must come before `b` in that chain.
    fn exchange(&mut self, ax: Axis, a: Eindex, b: Eindex) {
        let off = ax.other();
        let la = self.elements[a.0].loc(ax);
        let lb = self.elements[b.0].loc(ax);
        let pa = self.elements[a.0].prev(off);
        let pb = self.elements[b.0].prev(off);
        let adjacent = pb == Some(a);

        self.unlink(off, a);
        self.unlink(off, b);
        self.elements[a.0].set_loc(ax, lb);
        self.elements[b.0].set_loc(ax, la);
        self.link_after(off, b, pa);
        self.link_after(off, a, if adjacent { Some(b) } else { pb });

        let chain_loc = self.elements[a.0].loc(off);
        if lb == chain_loc {
            self.diagonal[chain_loc] = Some(a);
        } else if la == chain_loc {
            self.diagonal[chain_loc] = Some(b);
        }
    }

    fn swap_axis(&mut self, ax: Axis, a: usize, b: usize) {
        if a == b || a == 0 || b == 0 {
            return;
        }
        let x = a.min(b);
        let y = a.max(b);
        if y > self.size {
            self.expand(y);
        }

        let mut ex = self.heads(ax).first[x];
        let mut ey = self.heads(ax).first[y];

        // The two chains trade places wholesale; their elements keep their
        // in-chain links and only change off-axis position below.
        self.heads_mut(ax).swap(x, y);
        self.diagonal[x] = None;
        self.diagonal[y] = None;

        loop {
            match (ex, ey) {
                (Some(ix), Some(iy)) => {
                    let ox = self.elements[ix.0].loc(ax.other());
                    let oy = self.elements[iy.0].loc(ax.other());
                    if ox < oy {
                        self.move_element(ax, ix, y);
                        ex = self.elements[ix.0].next(ax);
                    } else if oy < ox {
                        self.move_element(ax, iy, x);
                        ey = self.elements[iy.0].next(ax);
                    } else {
                        self.exchange(ax, ix, iy);
                        ex = self.elements[ix.0].next(ax);
                        ey = self.elements[iy.0].next(ax);
                    }
                }
                (Some(ix), None) => {
                    self.move_element(ax, ix, y);
                    ex = self.elements[ix.0].next(ax);
                }
                (None, Some(iy)) => {
                    self.move_element(ax, iy, x);
                    ey = self.elements[iy.0].next(ax);
                }
                (None, None) => break,
            }
        }
    }
}

impl<T: Scalar> Default for SparseMatrix<T> {
    fn default() -> Self {
        SparseMatrix::new()
    }
}

impl<T: Scalar> Index<Eindex> for SparseMatrix<T> {
    type Output = Element<T>;
    fn index(&self, ei: Eindex) -> &Self::Output {
        &self.elements[ei.0]
    }
}

impl<T: Scalar> IndexMut<Eindex> for SparseMatrix<T> {
    fn index_mut(&mut self, ei: Eindex) -> &mut Self::Output {
        &mut self.elements[ei.0]
    }
}

impl<T: Scalar> fmt::Debug for SparseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "SparseMatrix (size={}, elements={})",
            self.size, self.element_count
        )?;
        for r in 1..=self.size {
            let mut cursor = self.first_in_row(r);
            while let Some(ei) = cursor {
                let e = &self.elements[ei.0];
                writeln!(f, "({}, {}) = {:?}", e.row, e.column, e.value)?;
                cursor = e.right;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(m: &mut SparseMatrix<f64>, entries: &[(usize, usize, f64)]) {
        for &(r, c, v) in entries {
            let ei = m.get_element(r, c);
            m.add_value(ei, v);
        }
    }

    fn row_pattern(m: &SparseMatrix<f64>, r: usize) -> Vec<(usize, f64)> {
        let mut out = vec![];
        let mut cursor = m.first_in_row(r);
        while let Some(ei) = cursor {
            out.push((m[ei].column, m[ei].value));
            cursor = m[ei].right;
        }
        out
    }

    fn col_pattern(m: &SparseMatrix<f64>, c: usize) -> Vec<(usize, f64)> {
        let mut out = vec![];
        let mut cursor = m.first_in_column(c);
        while let Some(ei) = cursor {
            out.push((m[ei].row, m[ei].value));
            cursor = m[ei].down;
        }
        out
    }

    /// Every element must be reachable forward and backward in both chains,
    /// with strictly increasing locations.
    fn check_links(m: &SparseMatrix<f64>) {
        for r in 1..=m.size() {
            let mut prev: Option<Eindex> = None;
            let mut cursor = m.first_in_row(r);
            let mut last_col = 0;
            while let Some(ei) = cursor {
                assert_eq!(m[ei].row, r);
                assert!(m[ei].column > last_col);
                assert_eq!(m[ei].left, prev);
                last_col = m[ei].column;
                prev = cursor;
                cursor = m[ei].right;
            }
            assert_eq!(m.last_in_row(r), prev);
        }
        for c in 1..=m.size() {
            let mut prev: Option<Eindex> = None;
            let mut cursor = m.first_in_column(c);
            let mut last_row = 0;
            while let Some(ei) = cursor {
                assert_eq!(m[ei].column, c);
                assert!(m[ei].row > last_row);
                assert_eq!(m[ei].up, prev);
                last_row = m[ei].row;
                prev = cursor;
                cursor = m[ei].down;
            }
            assert_eq!(m.last_in_column(c), prev);
        }
        for i in 1..=m.size() {
            if let Some(d) = m.diagonal(i) {
                assert_eq!((m[d].row, m[d].column), (i, i));
            } else {
                assert!(m.find_element(i, i).is_none());
            }
        }
    }

    #[test]
    fn insertion_keeps_sorted_chains() {
        let mut m = SparseMatrix::new();
        stamp(
            &mut m,
            &[
                (2, 3, 23.0),
                (2, 1, 21.0),
                (1, 1, 11.0),
                (3, 2, 32.0),
                (2, 2, 22.0),
                (1, 3, 13.0),
            ],
        );
        assert_eq!(m.size(), 3);
        assert_eq!(m.element_count(), 6);
        assert_eq!(row_pattern(&m, 2), vec![(1, 21.0), (2, 22.0), (3, 23.0)]);
        assert_eq!(col_pattern(&m, 3), vec![(1, 13.0), (2, 23.0)]);
        check_links(&m);
    }

    #[test]
    fn get_element_is_idempotent() {
        let mut m = SparseMatrix::<f64>::new();
        let a = m.get_element(2, 4);
        let b = m.get_element(2, 4);
        assert_eq!(a, b);
        assert_eq!(m.element_count(), 1);
    }

    #[test]
    fn trashcan_absorbs_zero_indices() {
        let mut m = SparseMatrix::<f64>::new();
        let t = m.get_element(0, 5);
        assert_eq!(t, Eindex(0));
        m.add_value(t, 1.0);
        assert_eq!(m.size(), 0);
        assert_eq!(m.element_count(), 0);
        assert_eq!(m.find_element(0, 0), Some(Eindex(0)));
    }

    #[test]
    fn find_does_not_create() {
        let mut m = SparseMatrix::<f64>::new();
        m.get_element(3, 3);
        assert!(m.find_element(1, 2).is_none());
        assert!(m.find_element(9, 9).is_none());
        assert_eq!(m.element_count(), 1);
    }

    #[test]
    fn remove_unlinks_both_chains() {
        let mut m = SparseMatrix::new();
        stamp(&mut m, &[(1, 1, 1.0), (1, 2, 2.0), (2, 1, 3.0), (2, 2, 4.0)]);
        assert!(m.remove_element(1, 2));
        assert!(!m.remove_element(1, 2));
        assert_eq!(row_pattern(&m, 1), vec![(1, 1.0)]);
        assert_eq!(col_pattern(&m, 2), vec![(2, 4.0)]);
        assert_eq!(m.element_count(), 3);
        check_links(&m);

        // Removing a diagonal clears the fast-access slot.
        assert!(m.remove_element(2, 2));
        assert!(m.diagonal(2).is_none());
        check_links(&m);

        // Freed slots are reused.
        let before = m.element_count();
        m.get_element(3, 1);
        assert_eq!(m.element_count(), before + 1);
    }

    #[test]
    fn swap_rows_relinks() {
        let mut m = SparseMatrix::new();
        stamp(
            &mut m,
            &[
                (1, 1, 11.0),
                (1, 3, 13.0),
                (2, 2, 22.0),
                (3, 1, 31.0),
                (3, 3, 33.0),
            ],
        );
        m.swap_rows(1, 3);
        assert_eq!(row_pattern(&m, 1), vec![(1, 31.0), (3, 33.0)]);
        assert_eq!(row_pattern(&m, 3), vec![(1, 11.0), (3, 13.0)]);
        assert_eq!(col_pattern(&m, 1), vec![(1, 31.0), (3, 11.0)]);
        check_links(&m);
        // (1,1) now holds the old (3,1); (3,3) the old (1,3).
        let d1 = m.diagonal(1).unwrap();
        assert_eq!(m.value(d1), 31.0);
        let d3 = m.diagonal(3).unwrap();
        assert_eq!(m.value(d3), 13.0);
    }

    #[test]
    fn swap_columns_relinks() {
        let mut m = SparseMatrix::new();
        stamp(
            &mut m,
            &[
                (1, 1, 11.0),
                (1, 2, 12.0),
                (2, 2, 22.0),
                (2, 3, 23.0),
                (3, 1, 31.0),
            ],
        );
        m.swap_columns(1, 2);
        assert_eq!(row_pattern(&m, 1), vec![(1, 12.0), (2, 11.0)]);
        assert_eq!(row_pattern(&m, 2), vec![(1, 22.0), (3, 23.0)]);
        assert_eq!(row_pattern(&m, 3), vec![(2, 31.0)]);
        check_links(&m);
        assert_eq!(m.value(m.diagonal(1).unwrap()), 12.0);
        // The old (2,1) position was empty, so there is no (2,2) now.
        assert!(m.diagonal(2).is_none());
    }

    #[test]
    fn swap_with_disjoint_patterns() {
        let mut m = SparseMatrix::new();
        stamp(&mut m, &[(1, 2, 12.0), (4, 1, 41.0), (4, 3, 43.0), (2, 2, 22.0)]);
        m.swap_rows(1, 4);
        assert_eq!(row_pattern(&m, 1), vec![(1, 41.0), (3, 43.0)]);
        assert_eq!(row_pattern(&m, 4), vec![(2, 12.0)]);
        check_links(&m);
    }

    #[test]
    fn handles_stay_valid_across_swaps() {
        let mut m = SparseMatrix::new();
        let a = m.get_element(1, 2);
        m.set_value(a, 12.0);
        let b = m.get_element(3, 2);
        m.set_value(b, 32.0);
        m.swap_rows(1, 3);
        m.swap_columns(2, 1);
        // The handles still refer to the same stamped quantities.
        assert_eq!(m.value(a), 12.0);
        assert_eq!((m[a].row, m[a].column), (3, 1));
        assert_eq!(m.value(b), 32.0);
        assert_eq!((m[b].row, m[b].column), (1, 1));
        check_links(&m);
    }

    #[test]
    fn swap_expands_matrix() {
        let mut m = SparseMatrix::new();
        stamp(&mut m, &[(1, 1, 1.0)]);
        m.swap_rows(1, 5);
        assert_eq!(m.size(), 5);
        assert_eq!(row_pattern(&m, 5), vec![(1, 1.0)]);
        assert!(m.first_in_row(1).is_none());
        check_links(&m);
    }

    #[test]
    fn reset_zeroes_values_only() {
        let mut m = SparseMatrix::new();
        stamp(&mut m, &[(1, 1, 1.0), (2, 1, 2.0)]);
        m.reset();
        assert_eq!(m.element_count(), 2);
        assert_eq!(row_pattern(&m, 1), vec![(1, 0.0)]);
        assert_eq!(row_pattern(&m, 2), vec![(1, 0.0)]);
    }

    #[test]
    fn clear_empties_matrix() {
        let mut m = SparseMatrix::new();
        stamp(&mut m, &[(1, 1, 1.0), (2, 2, 2.0)]);
        m.clear();
        assert_eq!(m.size(), 0);
        assert_eq!(m.element_count(), 0);
        assert!(m.find_element(1, 1).is_none());
    }
}
