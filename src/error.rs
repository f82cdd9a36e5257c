//! Error types for the solver.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No acceptable pivot exists for the given elimination step.
    #[error("singular matrix at elimination step {step}")]
    SingularMatrix { step: usize },

    /// `solve`/`solve_transposed` was called before a successful factorization.
    #[error("solver is not factored")]
    NotFactored,

    #[error("dimension mismatch: expected length {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
