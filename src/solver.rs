//! Sparse LU solver with Markowitz reordering.

use crate::error::{Error, Result};
use crate::markowitz::Markowitz;
use crate::matrix::{Eindex, SparseMatrix};
use crate::scalar::Scalar;
use crate::translation::Translation;
use crate::vector::{SparseVector, Vindex};
use num_complex::Complex64;

/// Outcome of the fast-path revalidation walk in
/// [`order_and_factor`](LuSolver::order_and_factor).
enum Validation {
    Complete,
    FailedAt(usize),
}

/// Sparse LU solver for real matrices.
pub type RealSolver = LuSolver<f64>;

/// Sparse LU solver for complex matrices.
pub type ComplexSolver = LuSolver<Complex64>;

/// An LU solver over a doubly linked sparse matrix.
///
/// Callers stamp matrix and right-hand-side entries by external (circuit
/// node) indices; the solver permutes rows and columns internally while
/// factoring and maps back when solving. Index 0 is a sentinel: writes to it
/// land in a trashcan and reads from it yield zero, so ground nodes need no
/// special casing in stamping code.
///
/// ```
/// use spsolve::RealSolver;
///
/// let mut solver = RealSolver::new();
/// solver.stamp(1, 1, 2.0);
/// solver.stamp(2, 2, 4.0);
/// solver.stamp_rhs(1, 1.0);
/// solver.stamp_rhs(2, 2.0);
/// solver.order_and_factor().unwrap();
///
/// let mut x = vec![0.0; solver.size() + 1];
/// solver.solve(&mut x).unwrap();
/// assert!((x[1] - 0.5).abs() < 1e-12);
/// assert!((x[2] - 0.5).abs() < 1e-12);
/// ```
pub struct LuSolver<T> {
    pub(crate) matrix: SparseMatrix<T>,
    pub(crate) rhs: SparseVector<T>,
    pub(crate) row: Translation,
    pub(crate) column: Translation,
    pub(crate) strategy: Markowitz,
    pub(crate) intermediate: Vec<T>,
    pub(crate) is_factored: bool,
    pub(crate) needs_reordering: bool,
    pub(crate) degeneracy: usize,
    pub(crate) pivot_search_reduction: usize,
}

impl<T: Scalar> LuSolver<T> {
    pub fn new() -> LuSolver<T> {
        LuSolver {
            matrix: SparseMatrix::new(),
            rhs: SparseVector::new(),
            row: Translation::new(),
            column: Translation::new(),
            strategy: Markowitz::new(),
            intermediate: vec![],
            is_factored: false,
            needs_reordering: true,
            degeneracy: 0,
            pivot_search_reduction: 0,
        }
    }

    /// The size of the system: the highest row, column or rhs index stamped
    /// so far.
    pub fn size(&self) -> usize {
        self.matrix.size().max(self.rhs.length())
    }

    /// The number of equations actually eliminated, `size - degeneracy`.
    pub fn order(&self) -> usize {
        self.size().saturating_sub(self.degeneracy)
    }

    /// Sets the elimination order. Positive values fix the order directly;
    /// zero or negative values are relative to the current size, so `0`
    /// means "eliminate everything".
    pub fn set_order(&mut self, order: isize) {
        if order <= 0 {
            self.degeneracy = (-order) as usize;
        } else {
            self.degeneracy = self.size().saturating_sub(order as usize);
        }
    }

    /// The number of trailing equations excluded from elimination.
    pub fn degeneracy(&self) -> usize {
        self.degeneracy
    }

    pub fn set_degeneracy(&mut self, degeneracy: usize) {
        self.degeneracy = degeneracy;
    }

    /// The number of trailing rows/columns excluded from pivot selection.
    /// They are still eliminated, but never chosen as pivots.
    pub fn pivot_search_reduction(&self) -> usize {
        self.pivot_search_reduction
    }

    pub fn set_pivot_search_reduction(&mut self, reduction: usize) {
        self.pivot_search_reduction = reduction;
    }

    pub fn is_factored(&self) -> bool {
        self.is_factored
    }

    pub fn needs_reordering(&self) -> bool {
        self.needs_reordering
    }

    /// Forces (or suppresses) a full pivot search on the next
    /// [`order_and_factor`](Self::order_and_factor).
    pub fn set_needs_reordering(&mut self, needs_reordering: bool) {
        self.needs_reordering = needs_reordering;
    }

    /// The internal matrix.
    pub fn matrix(&self) -> &SparseMatrix<T> {
        &self.matrix
    }

    /// The internal right-hand-side vector.
    pub fn rhs(&self) -> &SparseVector<T> {
        &self.rhs
    }

    /// The pivot selection strategy.
    pub fn markowitz(&self) -> &Markowitz {
        &self.strategy
    }

    pub fn markowitz_mut(&mut self) -> &mut Markowitz {
        &mut self.strategy
    }

    /// Returns a handle for the matrix entry at external `(row, column)`,
    /// creating the element if it does not exist yet.
    pub fn get_element(&mut self, row: usize, column: usize) -> Eindex {
        let r = self.row.to_internal(row);
        let c = self.column.to_internal(column);
        self.matrix.get_element(r, c)
    }

    /// Returns a handle for the entry at external `(row, column)` without
    /// creating it.
    pub fn find_element(&self, row: usize, column: usize) -> Option<Eindex> {
        let r = self.row.peek_internal(row);
        let c = self.column.peek_internal(column);
        self.matrix.find_element(r, c)
    }

    /// Returns a handle for the right-hand-side entry at external `row`,
    /// creating the element if it does not exist yet.
    pub fn get_rhs_element(&mut self, row: usize) -> Vindex {
        let r = self.row.to_internal(row);
        self.rhs.get_element(r)
    }

    pub fn find_rhs_element(&self, row: usize) -> Option<Vindex> {
        let r = self.row.peek_internal(row);
        self.rhs.find_element(r)
    }

    /// Adds `value` to the matrix entry at external `(row, column)`.
    pub fn stamp(&mut self, row: usize, column: usize, value: T) {
        let ei = self.get_element(row, column);
        self.matrix.add_value(ei, value);
    }

    /// Adds `value` to the right-hand-side entry at external `row`.
    pub fn stamp_rhs(&mut self, row: usize, value: T) {
        let vi = self.get_rhs_element(row);
        self.rhs.add_value(vi, value);
    }

    pub fn matrix_value(&self, ei: Eindex) -> T {
        self.matrix.value(ei)
    }

    pub fn set_matrix_value(&mut self, ei: Eindex, value: T) {
        self.matrix.set_value(ei, value);
    }

    pub fn add_matrix_value(&mut self, ei: Eindex, value: T) {
        self.matrix.add_value(ei, value);
    }

    pub fn subtract_matrix_value(&mut self, ei: Eindex, value: T) {
        self.matrix.subtract_value(ei, value);
    }

    pub fn rhs_value(&self, vi: Vindex) -> T {
        self.rhs.value(vi)
    }

    pub fn set_rhs_value(&mut self, vi: Vindex, value: T) {
        self.rhs.set_value(vi, value);
    }

    pub fn add_rhs_value(&mut self, vi: Vindex, value: T) {
        self.rhs.add_value(vi, value);
    }

    /// Maps external `(row, column)` indices to their internal positions.
    pub fn external_to_internal(&mut self, indices: (usize, usize)) -> (usize, usize) {
        (
            self.row.to_internal(indices.0),
            self.column.to_internal(indices.1),
        )
    }

    /// Maps internal `(row, column)` positions back to external indices.
    pub fn internal_to_external(&self, indices: (usize, usize)) -> (usize, usize) {
        (
            self.row.peek_external(indices.0),
            self.column.peek_external(indices.1),
        )
    }

    /// Gives direct access to the internal matrix and right-hand side, for
    /// preprocessing steps that work on internal indices. Any previous
    /// factorization is discarded.
    pub fn precondition<F>(&mut self, f: F)
    where
        F: FnOnce(&mut SparseMatrix<T>, &mut SparseVector<T>),
    {
        f(&mut self.matrix, &mut self.rhs);
        self.is_factored = false;
    }

    /// Zeroes all matrix and right-hand-side values, keeping the sparsity
    /// pattern and ordering for cheap refactorization.
    pub fn reset(&mut self) {
        self.reset_matrix();
        self.reset_rhs();
    }

    pub fn reset_matrix(&mut self) {
        self.matrix.reset();
        self.is_factored = false;
    }

    pub fn reset_rhs(&mut self) {
        self.rhs.reset();
    }

    /// Returns the solver to its initial empty state.
    pub fn clear(&mut self) {
        self.matrix.clear();
        self.rhs.clear();
        self.row.clear();
        self.column.clear();
        self.strategy.clear();
        self.intermediate.clear();
        self.is_factored = false;
        self.needs_reordering = true;
        self.degeneracy = 0;
        self.pivot_search_reduction = 0;
    }

    /// Factors the matrix, searching for pivots as needed.
    ///
    /// When no reordering is pending, the existing diagonal ordering is kept
    /// for as long as its pivots stay numerically acceptable; the full
    /// Markowitz search resumes from the first step where one does not.
    /// Returns the number of eliminated equations.
    pub fn order_and_factor(&mut self) -> Result<usize> {
        self.is_factored = false;
        let size = self.size();
        let order = size.saturating_sub(self.degeneracy);
        let max = size.saturating_sub(self.pivot_search_reduction);
        let mut step = 1;

        if !self.needs_reordering {
            match self.validate_and_eliminate(order, max)? {
                Validation::Complete => {
                    self.is_factored = true;
                    return Ok(order);
                }
                Validation::FailedAt(failed) => {
                    // A previously chosen pivot went stale; reorder from
                    // here on, keeping the eliminated prefix.
                    self.needs_reordering = true;
                    step = failed;
                }
            }
        }

        self.strategy.setup(&self.matrix, &self.rhs, step, max);
        while step <= order {
            let pivot = self.strategy.find_pivot(&self.matrix, step, max);
            let ei = match pivot.element() {
                Some(ei) => ei,
                None => return Err(Error::SingularMatrix { step }),
            };

            // Move the chosen pivot onto the diagonal. The rhs and the
            // translation maps follow the row swap; the column map follows
            // the column swap.
            let pivot_row = self.matrix[ei].row();
            let pivot_column = self.matrix[ei].column();
            self.strategy.move_pivot(pivot_row, pivot_column, step);
            self.matrix.swap_rows(pivot_row, step);
            self.rhs.swap(pivot_row, step);
            self.row.swap(pivot_row, step);
            self.matrix.swap_columns(pivot_column, step);
            self.column.swap(pivot_column, step);

            self.strategy.update(&self.matrix, ei, max);
            self.eliminate(ei, step)?;
            step += 1;
        }

        self.is_factored = true;
        self.needs_reordering = false;
        Ok(order)
    }

    /// Refactors the matrix numerically with the existing ordering, without
    /// any pivot validity checks.
    ///
    /// Returns `false` when a diagonal is missing or exactly zero, leaving
    /// the solver unfactored; this is cheaper than a full
    /// [`order_and_factor`](Self::order_and_factor) and lets callers retry
    /// with reordering instead of treating the matrix as singular.
    pub fn factor(&mut self) -> bool {
        self.is_factored = false;
        let order = self.order();
        for step in 1..=order {
            let pivot = match self.matrix.diagonal(step) {
                Some(d) => d,
                None => return false,
            };
            if self.matrix.value(pivot).is_zero() {
                return false;
            }
            if self.eliminate(pivot, step).is_err() {
                return false;
            }
        }
        self.is_factored = true;
        true
    }

    /// Walks the existing diagonal ordering, eliminating for as long as each
    /// pivot stays numerically acceptable.
    fn validate_and_eliminate(&mut self, order: usize, max: usize) -> Result<Validation> {
        for step in 1..=order {
            match self.matrix.diagonal(step) {
                Some(pivot) if self.strategy.is_valid_pivot(&self.matrix, pivot, max) => {
                    self.eliminate(pivot, step)?;
                }
                _ => return Ok(Validation::FailedAt(step)),
            }
        }
        Ok(Validation::Complete)
    }

    /// One step of LU elimination at `pivot`, already on the diagonal.
    ///
    /// The pivot value is replaced by its inverse, its row is scaled, and
    /// the remaining submatrix is rank-one updated, creating fill-ins as
    /// needed.
    fn eliminate(&mut self, pivot: Eindex, step: usize) -> Result<()> {
        let pivot_value = self.matrix.value(pivot);
        if pivot_value.is_zero() {
            return Err(Error::SingularMatrix { step });
        }
        let inverted = pivot_value.inverse();
        self.matrix.set_value(pivot, inverted);

        let mut upper = self.matrix[pivot].right();
        while let Some(ui) = upper {
            let upper_value = self.matrix.value(ui) * inverted;
            self.matrix.set_value(ui, upper_value);
            let upper_column = self.matrix[ui].column();

            // Walk the pivot column and the upper's column in lockstep,
            // subtracting the rank-one contribution at each crossing.
            let mut sub = self.matrix[ui].down();
            let mut lower = self.matrix[pivot].down();
            while let Some(li) = lower {
                let lower_row = self.matrix[li].row();
                while let Some(si) = sub {
                    if self.matrix[si].row() >= lower_row {
                        break;
                    }
                    sub = self.matrix[si].down();
                }
                let target = match sub {
                    Some(si) if self.matrix[si].row() == lower_row => si,
                    _ => {
                        let fillin = self.matrix.get_element(lower_row, upper_column);
                        self.strategy.create_fillin(lower_row, upper_column);
                        fillin
                    }
                };
                let lower_value = self.matrix.value(li);
                self.matrix.subtract_value(target, upper_value * lower_value);
                sub = Some(target);
                lower = self.matrix[li].down();
            }
            upper = self.matrix[ui].right();
        }
        Ok(())
    }
}

impl<T: Scalar> Default for LuSolver<T> {
    fn default() -> Self {
        LuSolver::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_covers_matrix_and_rhs() {
        let mut solver = RealSolver::new();
        solver.stamp(2, 2, 1.0);
        assert_eq!(solver.size(), 2);
        solver.stamp_rhs(5, 1.0);
        assert_eq!(solver.size(), 5);
    }

    #[test]
    fn set_order_relative_and_absolute() {
        let mut solver = RealSolver::new();
        solver.stamp(4, 4, 1.0);
        solver.set_order(-1);
        assert_eq!(solver.degeneracy(), 1);
        assert_eq!(solver.order(), 3);
        solver.set_order(2);
        assert_eq!(solver.degeneracy(), 2);
        assert_eq!(solver.order(), 2);
        solver.set_order(0);
        assert_eq!(solver.order(), 4);
    }

    #[test]
    fn factor_reports_zero_diagonal() {
        let mut solver = RealSolver::new();
        solver.stamp(1, 1, 1.0);
        solver.stamp(2, 2, 0.0);
        assert!(!solver.factor());
        assert!(!solver.is_factored());
        solver.set_matrix_value(solver.find_element(2, 2).unwrap(), 3.0);
        assert!(solver.factor());
        assert!(solver.is_factored());
    }

    #[test]
    fn stamping_accumulates() {
        let mut solver = RealSolver::new();
        solver.stamp(1, 1, 1.0);
        solver.stamp(1, 1, 2.5);
        let ei = solver.find_element(1, 1).unwrap();
        assert_eq!(solver.matrix_value(ei), 3.5);
        solver.stamp_rhs(1, 1.0);
        solver.stamp_rhs(1, -0.25);
        let vi = solver.find_rhs_element(1).unwrap();
        assert_eq!(solver.rhs_value(vi), 0.75);
    }

    #[test]
    fn ground_stamps_are_absorbed() {
        let mut solver = RealSolver::new();
        // A conductance between node 1 and ground stamps all four positions;
        // the ones touching ground go to the trashcan.
        for (r, c, v) in [(1, 1, 1.0), (1, 0, -1.0), (0, 1, -1.0), (0, 0, 1.0)] {
            solver.stamp(r, c, v);
        }
        assert_eq!(solver.size(), 1);
        solver.stamp_rhs(1, 2.0);
        solver.order_and_factor().unwrap();
        let mut x = vec![0.0; 2];
        solver.solve(&mut x).unwrap();
        assert_eq!(x[1], 2.0);
    }

    #[test]
    fn precondition_gets_internal_views() {
        let mut solver = RealSolver::new();
        solver.stamp(1, 1, 4.0);
        solver.precondition(|matrix, rhs| {
            let ei = matrix.get_element(1, 1);
            matrix.set_value(ei, 2.0);
            let vi = rhs.get_element(1);
            rhs.set_value(vi, 6.0);
        });
        assert!(!solver.is_factored());
        solver.order_and_factor().unwrap();
        let mut x = vec![0.0; 2];
        solver.solve(&mut x).unwrap();
        assert_eq!(x[1], 3.0);
    }

    #[test]
    fn clear_restores_initial_state() {
        let mut solver = RealSolver::new();
        solver.stamp(2, 1, 1.0);
        solver.stamp(1, 2, 1.0);
        solver.order_and_factor().unwrap();
        solver.clear();
        assert_eq!(solver.size(), 0);
        assert!(!solver.is_factored());
        assert!(solver.needs_reordering());
        assert!(solver.find_element(2, 1).is_none());
    }
}
