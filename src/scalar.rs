//! The element-type abstraction shared by the real and complex solvers.

use num_complex::Complex64;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Arithmetic required of a matrix element type.
///
/// The elimination and substitution algorithms are written once against this
/// trait; `f64` and `Complex64` provide the type-appropriate magnitude and
/// pivot-inversion functions.
pub trait Scalar:
    Copy
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// The additive identity. New and reset elements hold this value.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Exact-zero test, used for the sparsity-preserving short circuit in
    /// forward substitution and for zero-pivot detection.
    fn is_zero(&self) -> bool;

    /// Scalar magnitude used for pivot comparisons.
    fn magnitude(&self) -> f64;

    /// Multiplicative inverse. Callers must ensure the value is nonzero.
    fn inverse(&self) -> Self;
}

impl Scalar for f64 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn is_zero(&self) -> bool {
        *self == 0.0
    }
    fn magnitude(&self) -> f64 {
        self.abs()
    }
    fn inverse(&self) -> Self {
        1.0 / self
    }
}

impl Scalar for Complex64 {
    fn zero() -> Self {
        Complex64::new(0.0, 0.0)
    }
    fn one() -> Self {
        Complex64::new(1.0, 0.0)
    }
    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
    /// Uses |re| + |im| rather than the euclidean norm; it is cheaper and
    /// ranks pivot candidates just as well.
    fn magnitude(&self) -> f64 {
        self.re.abs() + self.im.abs()
    }
    /// Numerically stable complex reciprocal.
    ///
    /// Divides through by the larger-magnitude component first so that the
    /// intermediate products stay bounded. The naive `conj(z) / |z|^2` form
    /// overflows or cancels when the components differ by more than about
    /// 150 orders of magnitude.
    fn inverse(&self) -> Self {
        let (re, im);
        if (self.re >= self.im && self.re > -self.im) || (self.re < self.im && self.re <= -self.im)
        {
            let r = self.im / self.re;
            re = 1.0 / (self.re + r * self.im);
            im = -r * re;
        } else {
            let r = self.re / self.im;
            im = -1.0 / (self.im + r * self.re);
            re = -r * im;
        }
        Complex64::new(re, im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_inverse() {
        assert_eq!(4.0.inverse(), 0.25);
        assert_eq!(f64::zero().magnitude(), 0.0);
    }

    #[test]
    fn complex_magnitude_is_component_sum() {
        let z = Complex64::new(-3.0, 4.0);
        assert_eq!(z.magnitude(), 7.0);
    }

    #[test]
    fn complex_inverse_round_trip() {
        let z = Complex64::new(2.0, -5.0);
        let w = z * z.inverse();
        assert!((w.re - 1.0).abs() < 1e-15);
        assert!(w.im.abs() < 1e-15);
    }

    #[test]
    fn complex_inverse_extreme_ratio() {
        // The naive reciprocal computes re^2 + im^2 = inf here and returns zero.
        let z = Complex64::new(1e200, 1e-200);
        let inv = z.inverse();
        assert!(inv.re.is_finite() && inv.im.is_finite());
        assert!((inv.re - 1e-200).abs() / 1e-200 < 1e-12);

        let z = Complex64::new(-1e-200, 1e200);
        let inv = z.inverse();
        assert!(inv.re.is_finite() && inv.im.is_finite());
        assert!((inv.im + 1e-200).abs() / 1e-200 < 1e-12);
    }

    #[test]
    fn complex_inverse_axis_values() {
        let inv = Complex64::new(2.0, 0.0).inverse();
        assert_eq!(inv, Complex64::new(0.5, 0.0));
        let inv = Complex64::new(0.0, 2.0).inverse();
        assert!((inv.re).abs() < 1e-15);
        assert!((inv.im + 0.5).abs() < 1e-15);
    }
}
