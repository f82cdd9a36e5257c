//! Markowitz pivot selection.
//!
//! Tracks, per row and column, how many elements remain in the lower-right
//! submatrix still to be eliminated. The product of the two counts for a
//! candidate bounds the fill-in its elimination can create, so the search
//! prefers pivots with small products, subject to numerical thresholds.
//!
//! Four searches run in order of decreasing speed: singleton rows/columns,
//! a quick scan of the diagonal, a thorough scan of the diagonal, and the
//! entire remaining submatrix as a last resort.

use crate::matrix::{Eindex, SparseMatrix};
use crate::scalar::Scalar;
use crate::vector::SparseVector;

const DEFAULT_RELATIVE_THRESHOLD: f64 = 1e-3;
const DEFAULT_ABSOLUTE_THRESHOLD: f64 = 1e-13;

// Tie-breaking heuristics. Searches stop collecting candidates tied on the
// Markowitz product once enough have been seen relative to that product.
const MAX_TIES: usize = 100;
const TIES_MULTIPLIER: i64 = 5;

/// The outcome of a pivot search.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pivot {
    /// A pivot that can be used unconditionally.
    Good(Eindex),
    /// A pivot that passed the thresholds but may cause more fill-in than
    /// the optimum.
    Suboptimal(Eindex),
    /// A numerically unacceptable element, returned when nothing passes the
    /// thresholds. Using it keeps elimination going at reduced accuracy.
    Bad(Eindex),
    /// No usable element exists; the (sub)matrix is singular.
    None,
}

impl Pivot {
    pub fn element(&self) -> Option<Eindex> {
        match *self {
            Pivot::Good(e) | Pivot::Suboptimal(e) | Pivot::Bad(e) => Some(e),
            Pivot::None => None,
        }
    }
}

/// Markowitz counts and thresholds for one solver.
///
/// Counts are `i32` with -1 meaning an empty row or column: each count
/// excludes the pivot element itself. Products are kept in `i64` so they
/// never overflow for any realistic matrix.
#[derive(Debug, Clone)]
pub struct Markowitz {
    row: Vec<i32>,
    column: Vec<i32>,
    product: Vec<i64>,
    singletons: i32,
    relative_threshold: f64,
    absolute_threshold: f64,
}

impl Markowitz {
    pub fn new() -> Markowitz {
        Markowitz {
            row: vec![],
            column: vec![],
            product: vec![],
            singletons: 0,
            relative_threshold: DEFAULT_RELATIVE_THRESHOLD,
            absolute_threshold: DEFAULT_ABSOLUTE_THRESHOLD,
        }
    }

    /// Relative pivot threshold (`pivrel`): a pivot must be larger than this
    /// fraction of the largest element below it in its column.
    pub fn relative_threshold(&self) -> f64 {
        self.relative_threshold
    }

    pub fn set_relative_threshold(&mut self, threshold: f64) {
        self.relative_threshold = threshold;
    }

    /// Absolute pivot threshold (`pivtol`): the smallest usable pivot
    /// magnitude.
    pub fn absolute_threshold(&self) -> f64 {
        self.absolute_threshold
    }

    pub fn set_absolute_threshold(&mut self, threshold: f64) {
        self.absolute_threshold = threshold;
    }

    /// The number of rows/columns currently holding a single element.
    pub fn singletons(&self) -> i32 {
        self.singletons
    }

    pub fn row_count(&self, row: usize) -> i32 {
        self.row[row]
    }

    pub fn column_count(&self, column: usize) -> i32 {
        self.column[column]
    }

    pub fn product(&self, index: usize) -> i64 {
        self.product[index]
    }

    pub fn clear(&mut self) {
        self.row.clear();
        self.column.clear();
        self.product.clear();
        self.singletons = 0;
    }

    /// Recomputes all counts and products for the submatrix from `step` to
    /// `max`, counting right-hand-side elements into the row counts.
    pub fn setup<T: Scalar>(
        &mut self,
        matrix: &SparseMatrix<T>,
        rhs: &SparseVector<T>,
        step: usize,
        max: usize,
    ) {
        let size = matrix.size().max(rhs.length());
        if self.row.len() != size + 1 {
            self.row = vec![0; size + 1];
            self.column = vec![0; size + 1];
            self.product = vec![0; size + 1];
        }
        self.count(matrix, rhs, step, max);
        self.products(step, max);
    }

    fn count<T: Scalar>(
        &mut self,
        matrix: &SparseMatrix<T>,
        rhs: &SparseVector<T>,
        step: usize,
        max: usize,
    ) {
        // Row counts; a right-hand-side entry counts as one more element in
        // its row. The rhs chain is sorted, so one cursor follows the rows.
        let mut rhs_cursor = rhs.first();
        for i in step..=max {
            let mut count: i32 = -1;
            let mut e = matrix.first_in_row(i);
            while let Some(ei) = e {
                if matrix[ei].column() >= step {
                    break;
                }
                e = matrix[ei].right();
            }
            // Elements beyond max still count: they must be eliminated too.
            while let Some(ei) = e {
                count += 1;
                e = matrix[ei].right();
            }
            while let Some(vi) = rhs_cursor {
                if rhs[vi].index() >= i {
                    break;
                }
                rhs_cursor = rhs[vi].next();
            }
            if let Some(vi) = rhs_cursor {
                if rhs[vi].index() == i {
                    count += 1;
                }
            }
            self.row[i] = count;
        }

        for i in step..=max {
            let mut count: i32 = -1;
            let mut e = matrix.first_in_column(i);
            while let Some(ei) = e {
                if matrix[ei].row() >= step {
                    break;
                }
                e = matrix[ei].down();
            }
            while let Some(ei) = e {
                count += 1;
                e = matrix[ei].down();
            }
            self.column[i] = count;
        }
    }

    fn products(&mut self, step: usize, max: usize) {
        self.singletons = 0;
        for i in step..=max {
            self.product[i] = self.row[i] as i64 * self.column[i] as i64;
            if self.product[i] == 0 {
                self.singletons += 1;
            }
        }
    }

    /// Checks whether an existing diagonal can be kept as the pivot: it must
    /// lie inside the allowed region and dominate the elements below it by
    /// the relative threshold.
    pub fn is_valid_pivot<T: Scalar>(
        &self,
        matrix: &SparseMatrix<T>,
        pivot: Eindex,
        max: usize,
    ) -> bool {
        if matrix[pivot].row() > max || matrix[pivot].column() > max {
            return false;
        }
        let magnitude = matrix[pivot].value().magnitude();
        let mut largest = 0.0f64;
        let mut cursor = matrix[pivot].down();
        while let Some(ci) = cursor {
            if matrix[ci].row() > max {
                break;
            }
            largest = largest.max(matrix[ci].value().magnitude());
            cursor = matrix[ci].down();
        }
        largest * self.relative_threshold < magnitude
    }

    /// Searches the submatrix for the pivot of elimination step `step`.
    pub fn find_pivot<T: Scalar>(
        &self,
        matrix: &SparseMatrix<T>,
        step: usize,
        max: usize,
    ) -> Pivot {
        if step < 1 || step > max {
            return Pivot::None;
        }
        let pivot = self.search_singletons(matrix, step, max);
        if pivot != Pivot::None {
            return pivot;
        }
        let pivot = self.search_quick_diagonal(matrix, step, max);
        if pivot != Pivot::None {
            return pivot;
        }
        let pivot = self.search_diagonal(matrix, step, max);
        if pivot != Pivot::None {
            return pivot;
        }
        self.search_entire_matrix(matrix, step, max)
    }

    /// Singleton rows and columns can be eliminated without any fill-in, so
    /// they are consumed first. The current step is tried before scanning
    /// from the high end down.
    fn search_singletons<T: Scalar>(
        &self,
        matrix: &SparseMatrix<T>,
        step: usize,
        max: usize,
    ) -> Pivot {
        if self.singletons == 0 {
            return Pivot::None;
        }
        let mut remaining = self.singletons;
        let mut i = max + 1;
        while remaining > 0 && i > step {
            let index = if i > max { step } else { i };
            i -= 1;
            if self.product[index] != 0 {
                continue;
            }
            remaining -= 1;

            let diagonal = match matrix.diagonal(index) {
                Some(d) => d,
                None => continue,
            };
            let magnitude = matrix[diagonal].value().magnitude();
            if magnitude <= self.absolute_threshold {
                continue;
            }
            if self.column[index] == 0 {
                // Singleton column: nothing below the pivot to grow.
                return Pivot::Good(diagonal);
            }
            // Singleton row: the column still has elements below, so the
            // relative threshold applies.
            let mut largest = 0.0f64;
            let mut cursor = matrix[diagonal].down();
            while let Some(ci) = cursor {
                if matrix[ci].row() > max {
                    break;
                }
                largest = largest.max(matrix[ci].value().magnitude());
                cursor = matrix[ci].down();
            }
            if magnitude > self.relative_threshold * largest {
                return Pivot::Good(diagonal);
            }
        }
        Pivot::None
    }

    /// Fast diagonal scan keeping a short list of product-tied candidates,
    /// resolved by the ratio of the largest off-diagonal to the pivot.
    fn search_quick_diagonal<T: Scalar>(
        &self,
        matrix: &SparseMatrix<T>,
        step: usize,
        max: usize,
    ) -> Pivot {
        let mut tied: Vec<Eindex> = vec![];
        let mut min_product = i64::MAX;

        for i in step..=max {
            let product = self.product[i];
            if product > min_product {
                continue;
            }
            let diagonal = match matrix.diagonal(i) {
                Some(d) => d,
                None => continue,
            };
            let magnitude = matrix[diagonal].value().magnitude();
            if magnitude <= self.absolute_threshold {
                continue;
            }

            if product == 1 {
                // One off-diagonal in the row and one in the column. If they
                // sit symmetrically and the diagonal dominates them, this is
                // as good as a pivot gets.
                let other_in_row = matrix[diagonal].right().or(matrix[diagonal].left());
                let other_in_column = matrix[diagonal].down().or(matrix[diagonal].up());
                if let (Some(r), Some(c)) = (other_in_row, other_in_column) {
                    if matrix[r].column() == matrix[c].row() {
                        let largest = matrix[r]
                            .value()
                            .magnitude()
                            .max(matrix[c].value().magnitude());
                        if magnitude >= largest {
                            return Pivot::Good(diagonal);
                        }
                    }
                }
            }

            if product < min_product {
                tied.clear();
                tied.push(diagonal);
                min_product = product;
            } else if tied.len() < MAX_TIES {
                tied.push(diagonal);
                if tied.len() as i64 >= min_product * TIES_MULTIPLIER {
                    break;
                }
            }
        }
        if tied.is_empty() {
            return Pivot::None;
        }

        let mut chosen = None;
        let mut max_ratio = 1.0 / self.relative_threshold;
        for &diagonal in &tied {
            let magnitude = matrix[diagonal].value().magnitude();
            let largest = self.largest_other_in_column(matrix, diagonal, step, max);
            let ratio = largest / magnitude;
            if ratio < max_ratio {
                max_ratio = ratio;
                chosen = Some(diagonal);
            }
        }
        match chosen {
            Some(d) => Pivot::Suboptimal(d),
            None => Pivot::None,
        }
    }

    /// Thorough diagonal scan: every candidate is checked against the
    /// relative threshold before being considered at all.
    fn search_diagonal<T: Scalar>(
        &self,
        matrix: &SparseMatrix<T>,
        step: usize,
        max: usize,
    ) -> Pivot {
        let mut min_product = i64::MAX;
        let mut chosen = None;
        let mut accepted_ratio = 0.0f64;
        let mut ties: i64 = 0;

        for i in step..=max {
            let product = self.product[i];
            if product > min_product {
                continue;
            }
            let diagonal = match matrix.diagonal(i) {
                Some(d) => d,
                None => continue,
            };
            let magnitude = matrix[diagonal].value().magnitude();
            if magnitude <= self.absolute_threshold {
                continue;
            }
            let largest = self.largest_other_in_column(matrix, diagonal, step, max);
            if magnitude <= self.relative_threshold * largest {
                continue;
            }

            if product < min_product {
                chosen = Some(diagonal);
                min_product = product;
                accepted_ratio = largest / magnitude;
                ties = 0;
            } else {
                ties += 1;
                let ratio = largest / magnitude;
                if ratio < accepted_ratio {
                    chosen = Some(diagonal);
                    accepted_ratio = ratio;
                }
                if ties >= min_product * TIES_MULTIPLIER {
                    break;
                }
            }
        }
        match chosen {
            Some(d) => Pivot::Suboptimal(d),
            None => Pivot::None,
        }
    }

    /// Last resort: search the whole remaining submatrix column by column.
    /// If nothing passes the thresholds, the largest element found is
    /// returned as a `Bad` pivot.
    fn search_entire_matrix<T: Scalar>(
        &self,
        matrix: &SparseMatrix<T>,
        step: usize,
        max: usize,
    ) -> Pivot {
        let mut chosen = None;
        let mut min_product = i64::MAX;
        let mut accepted_ratio = 0.0f64;
        let mut largest_element = None;
        let mut largest_magnitude = 0.0f64;
        let mut ties: i64 = 0;

        for i in step..=max {
            // Largest magnitude in the submatrix part of this column, for
            // the relative threshold.
            let mut largest = 0.0f64;
            let mut cursor = matrix.first_in_column(i);
            while let Some(ci) = cursor {
                let row = matrix[ci].row();
                if row > max {
                    break;
                }
                if row >= step {
                    largest = largest.max(matrix[ci].value().magnitude());
                }
                cursor = matrix[ci].down();
            }
            if largest == 0.0 {
                continue;
            }

            // Candidates bottom-up, skipping rows outside the region.
            let mut cursor = matrix.last_in_column(i);
            while let Some(ci) = cursor {
                if matrix[ci].row() <= max {
                    break;
                }
                cursor = matrix[ci].up();
            }
            while let Some(ci) = cursor {
                let row = matrix[ci].row();
                if row < step {
                    break;
                }
                let magnitude = matrix[ci].value().magnitude();
                let product = self.row[row] as i64 * self.column[i] as i64;

                if magnitude > largest_magnitude {
                    largest_element = Some(ci);
                    largest_magnitude = magnitude;
                }

                if product <= min_product
                    && magnitude > self.relative_threshold * largest
                    && magnitude > self.absolute_threshold
                {
                    if product < min_product {
                        chosen = Some(ci);
                        min_product = product;
                        accepted_ratio = largest / magnitude;
                        ties = 0;
                    } else {
                        ties += 1;
                        let ratio = largest / magnitude;
                        if ratio < accepted_ratio {
                            chosen = Some(ci);
                            accepted_ratio = ratio;
                        }
                        if ties >= min_product * TIES_MULTIPLIER {
                            return Pivot::Suboptimal(chosen.unwrap_or(ci));
                        }
                    }
                }
                cursor = matrix[ci].up();
            }
        }

        if let Some(c) = chosen {
            return Pivot::Suboptimal(c);
        }
        match largest_element {
            Some(ei) if largest_magnitude > 0.0 => Pivot::Bad(ei),
            _ => Pivot::None,
        }
    }

    fn largest_other_in_column<T: Scalar>(
        &self,
        matrix: &SparseMatrix<T>,
        diagonal: Eindex,
        step: usize,
        max: usize,
    ) -> f64 {
        let mut largest = 0.0f64;
        let mut cursor = matrix[diagonal].down();
        while let Some(ci) = cursor {
            if matrix[ci].row() > max {
                break;
            }
            largest = largest.max(matrix[ci].value().magnitude());
            cursor = matrix[ci].down();
        }
        let mut cursor = matrix[diagonal].up();
        while let Some(ci) = cursor {
            if matrix[ci].row() < step {
                break;
            }
            largest = largest.max(matrix[ci].value().magnitude());
            cursor = matrix[ci].up();
        }
        largest
    }

    /// Adjusts counts and products after the chosen pivot at `(row, column)`
    /// has been swapped onto the diagonal of `step`. Only bookkeeping moves;
    /// the matrix itself has already been permuted.
    pub fn move_pivot(&mut self, row: usize, column: usize, step: usize) {
        if self.product.is_empty() {
            return;
        }

        // The chosen pivot's row or column singleton is consumed now.
        if self.product[row] == 0 || self.product[column] == 0 {
            self.singletons -= 1;
        }

        if row != step {
            self.row.swap(row, step);
            let old = self.product[row];
            self.product[row] = self.row[row] as i64 * self.column[row] as i64;
            if old == 0 {
                if self.product[row] != 0 {
                    self.singletons -= 1;
                }
            } else if self.product[row] == 0 {
                self.singletons += 1;
            }
        }

        if column != step {
            self.column.swap(column, step);
            let old = self.product[column];
            self.product[column] = self.row[column] as i64 * self.column[column] as i64;
            if old == 0 {
                if self.product[column] != 0 {
                    self.singletons -= 1;
                }
            } else if self.product[column] == 0 {
                self.singletons += 1;
            }
        }

        let old = self.product[step];
        self.product[step] = self.row[step] as i64 * self.column[step] as i64;
        if old == 0 {
            if self.product[step] != 0 {
                self.singletons -= 1;
            }
        } else if self.product[step] == 0 {
            self.singletons += 1;
        }
    }

    /// Adjusts counts after one elimination step: every row with an element
    /// below the pivot and every column with an element right of it loses
    /// one element.
    pub fn update<T: Scalar>(&mut self, matrix: &SparseMatrix<T>, pivot: Eindex, limit: usize) {
        if self.product.is_empty() {
            return;
        }

        let mut cursor = matrix[pivot].down();
        while let Some(ci) = cursor {
            let row = matrix[ci].row();
            if row > limit {
                break;
            }
            self.product[row] -= self.column[row] as i64;
            self.row[row] -= 1;
            if self.row[row] == 0 {
                self.singletons += 1;
            }
            cursor = matrix[ci].down();
        }

        let mut cursor = matrix[pivot].right();
        while let Some(ci) = cursor {
            let column = matrix[ci].column();
            if column > limit {
                break;
            }
            self.product[column] -= self.row[column] as i64;
            self.column[column] -= 1;
            // A row singleton at this position was already counted above.
            if self.column[column] == 0 && self.row[column] != 0 {
                self.singletons += 1;
            }
            cursor = matrix[ci].right();
        }
    }

    /// Accounts for a fill-in created at `(row, column)` during elimination.
    pub fn create_fillin(&mut self, row: usize, column: usize) {
        if self.product.is_empty() {
            return;
        }
        self.row[row] += 1;
        self.product[row] = self.row[row] as i64 * self.column[row] as i64;
        if self.row[row] == 1 && self.column[row] != 0 {
            self.singletons -= 1;
        }
        self.column[column] += 1;
        self.product[column] = self.row[column] as i64 * self.column[column] as i64;
        if self.row[column] != 0 && self.column[column] == 1 {
            self.singletons -= 1;
        }
    }
}

impl Default for Markowitz {
    fn default() -> Self {
        Markowitz::new()
    }
}
