//! # spsolve
//!
//! Sparse LU factorization and solving for circuit-simulation matrices.
//!
//! Modified-nodal-analysis systems are extremely sparse, structurally fixed
//! across simulation iterations, and frequently near-singular. This crate
//! factors them the way Berkeley Spice does: a doubly linked sparse matrix,
//! Markowitz pivot selection with relative/absolute thresholds, and
//! row/column translation so that callers keep stamping by fixed node
//! numbers while the solver reorders freely underneath.
//!
//! Row and column 0 are the ground reference: writes to them are absorbed
//! and reads yield zero, so device stamping code never special-cases the
//! ground node.
//!
//! ```
//! use spsolve::RealSolver;
//!
//! // | 2 1 |   | x1 |   | 1 |
//! // | 1 2 | * | x2 | = | 2 |
//! let mut solver = RealSolver::new();
//! solver.stamp(1, 1, 2.0);
//! solver.stamp(1, 2, 1.0);
//! solver.stamp(2, 1, 1.0);
//! solver.stamp(2, 2, 2.0);
//! solver.stamp_rhs(1, 1.0);
//! solver.stamp_rhs(2, 2.0);
//!
//! solver.order_and_factor()?;
//! let mut x = vec![0.0; solver.size() + 1];
//! solver.solve(&mut x)?;
//!
//! assert!((x[1] - 0.0).abs() < 1e-12);
//! assert!((x[2] - 1.0).abs() < 1e-12);
//! # Ok::<(), spsolve::Error>(())
//! ```
//!
//! Between iterations of a nonlinear solve the sparsity pattern does not
//! change; [`LuSolver::reset`], restamping, and [`LuSolver::factor`] (or a
//! second [`LuSolver::order_and_factor`], which revalidates the existing
//! pivots before falling back to a full search) avoid repeating the
//! ordering work.

mod error;
mod markowitz;
mod matrix;
mod scalar;
mod solver;
mod substitution;
mod translation;
mod vector;

pub use error::{Error, Result};
pub use markowitz::{Markowitz, Pivot};
pub use matrix::{Eindex, Element, SparseMatrix};
pub use scalar::Scalar;
pub use solver::{ComplexSolver, LuSolver, RealSolver};
pub use translation::Translation;
pub use vector::{SparseVector, VectorElement, Vindex};
