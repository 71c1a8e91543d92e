//! Complex delta types for perturbation arithmetic.
//!
//! Provides a trait abstraction over f64, HDRFloat, and BigFloat complex numbers,
//! enabling a single generic perturbation function with zero runtime overhead.

/// Complex number type for perturbation delta arithmetic.
///
/// Abstracts operations needed for perturbation iteration, enabling
/// a single generic implementation for f64, HDRFloat, and BigFloat.
pub trait ComplexDelta: Clone + Sized {
    /// Returns the additive identity (zero) with the same precision as self.
    fn zero(&self) -> Self;

    /// Construct from f64 real/imaginary components.
    fn from_f64_pair(re: f64, im: f64) -> Self;

    /// Extract as f64 pair for output and comparisons.
    fn to_f64_pair(&self) -> (f64, f64);

    /// Complex addition.
    fn add(&self, other: &Self) -> Self;

    /// Complex subtraction.
    fn sub(&self, other: &Self) -> Self;

    /// Complex multiplication.
    fn mul(&self, other: &Self) -> Self;

    /// Multiply by f64 scalar.
    fn scale(&self, factor: f64) -> Self;

    /// Complex square (optimized).
    fn square(&self) -> Self;

    /// Magnitude squared as f64 (for escape/rebase checks).
    fn norm_sq(&self) -> f64;
}

/// Simple f64 complex number for perturbation arithmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct F64Complex {
    pub re: f64,
    pub im: f64,
}

impl ComplexDelta for F64Complex {
    #[inline]
    fn zero(&self) -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    #[inline]
    fn from_f64_pair(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[inline]
    fn to_f64_pair(&self) -> (f64, f64) {
        (self.re, self.im)
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    #[inline]
    fn sub(&self, other: &Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }

    #[inline]
    fn mul(&self, other: &Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }

    #[inline]
    fn scale(&self, factor: f64) -> Self {
        Self {
            re: self.re * factor,
            im: self.im * factor,
        }
    }

    #[inline]
    fn square(&self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im,
            im: 2.0 * self.re * self.im,
        }
    }

    #[inline]
    fn norm_sq(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}
