//! Forward and backward substitution on a factored solver.

use crate::error::{Error, Result};
use crate::scalar::Scalar;
use crate::solver::LuSolver;

impl<T: Scalar> LuSolver<T> {
    /// Solves `A * x = b` using the current factorization.
    ///
    /// `solution` is indexed externally and must have length `size() + 1`;
    /// slot 0 is the ground reference and always reads zero. For a
    /// degenerate solver the trailing `degeneracy` entries of `solution`
    /// are treated as knowns and substituted into the eliminated equations.
    pub fn solve(&mut self, solution: &mut [T]) -> Result<()> {
        if !self.is_factored {
            return Err(Error::NotFactored);
        }
        let size = self.size();
        if solution.len() != size + 1 {
            return Err(Error::DimensionMismatch {
                expected: size + 1,
                actual: solution.len(),
            });
        }
        let order = size.saturating_sub(self.degeneracy);
        self.intermediate.resize(size + 1, T::zero());

        let Self {
            matrix,
            rhs,
            column,
            intermediate,
            ..
        } = self;
        intermediate[0] = T::zero();

        // Scramble. The rhs is stored in internal row order already; the
        // known part of the solution enters through the column map.
        let mut index = 1;
        let mut cursor = rhs.first();
        while let Some(vi) = cursor {
            let rhs_index = rhs[vi].index();
            if rhs_index > order {
                break;
            }
            while index < rhs_index {
                intermediate[index] = T::zero();
                index += 1;
            }
            intermediate[index] = rhs[vi].value();
            index += 1;
            cursor = rhs[vi].next();
        }
        while index <= order {
            intermediate[index] = T::zero();
            index += 1;
        }
        for i in order + 1..=size {
            intermediate[i] = solution[column.peek_external(i)];
        }

        // Forward substitution. Zero entries propagate nothing, which is
        // common for sparse excitations.
        for i in 1..=order {
            let mut temp = intermediate[i];
            if temp.is_zero() {
                continue;
            }
            let pivot = match matrix.diagonal(i) {
                Some(d) => d,
                None => return Err(Error::NotFactored),
            };
            // The diagonal stores the inverted pivot.
            temp *= matrix.value(pivot);
            intermediate[i] = temp;
            let mut cursor = matrix[pivot].down();
            while let Some(ei) = cursor {
                let row = matrix[ei].row();
                if row > order {
                    break;
                }
                intermediate[row] -= temp * matrix.value(ei);
                cursor = matrix[ei].down();
            }
        }

        // Backward substitution, including the known entries beyond `order`.
        for i in (1..=order).rev() {
            let mut temp = intermediate[i];
            let pivot = match matrix.diagonal(i) {
                Some(d) => d,
                None => return Err(Error::NotFactored),
            };
            let mut cursor = matrix[pivot].right();
            while let Some(ei) = cursor {
                temp -= matrix.value(ei) * intermediate[matrix[ei].column()];
                cursor = matrix[ei].right();
            }
            intermediate[i] = temp;
        }

        column.unscramble(intermediate, solution)
    }

    /// Solves `A^T * x = b` using the current factorization.
    pub fn solve_transposed(&mut self, solution: &mut [T]) -> Result<()> {
        if !self.is_factored {
            return Err(Error::NotFactored);
        }
        let size = self.size();
        if solution.len() != size + 1 {
            return Err(Error::DimensionMismatch {
                expected: size + 1,
                actual: solution.len(),
            });
        }
        let order = size.saturating_sub(self.degeneracy);
        self.intermediate.resize(size + 1, T::zero());

        let Self {
            matrix,
            rhs,
            row,
            column,
            intermediate,
            ..
        } = self;

        // Scramble. Transposing swaps the roles of the permutations: a rhs
        // entry for internal row i belongs at the internal column position
        // of the same external index. The known trailing entries are staged
        // through the row map so the final unscramble returns them to their
        // slots unchanged; the bounded passes below never read them.
        for i in 0..=order {
            intermediate[i] = T::zero();
        }
        for i in order + 1..=size {
            intermediate[i] = solution[row.peek_external(i)];
        }
        let mut cursor = rhs.first();
        while let Some(vi) = cursor {
            let rhs_index = rhs[vi].index();
            if rhs_index > order {
                break;
            }
            let new_index = column.peek_internal(row.peek_external(rhs_index));
            intermediate[new_index] = rhs[vi].value();
            cursor = rhs[vi].next();
        }

        // Forward substitution on the transpose walks rows instead of
        // columns; the pivot inverse is applied in the backward pass.
        for i in 1..=order {
            let temp = intermediate[i];
            if temp.is_zero() {
                continue;
            }
            let pivot = match matrix.diagonal(i) {
                Some(d) => d,
                None => return Err(Error::NotFactored),
            };
            let mut cursor = matrix[pivot].right();
            while let Some(ei) = cursor {
                let col = matrix[ei].column();
                if col > order {
                    break;
                }
                intermediate[col] -= temp * matrix.value(ei);
                cursor = matrix[ei].right();
            }
        }

        // Backward substitution.
        for i in (1..=order).rev() {
            let mut temp = intermediate[i];
            let pivot = match matrix.diagonal(i) {
                Some(d) => d,
                None => return Err(Error::NotFactored),
            };
            let mut cursor = matrix[pivot].down();
            while let Some(ei) = cursor {
                let r = matrix[ei].row();
                if r > order {
                    break;
                }
                temp -= intermediate[r] * matrix.value(ei);
                cursor = matrix[ei].down();
            }
            intermediate[i] = temp * matrix.value(pivot);
        }

        row.unscramble(intermediate, solution)
    }
}
