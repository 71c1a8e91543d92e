//! Reference orbit computation for perturbation rendering.
//!
//! Computes the reference orbit at full HPFloat precision, then stores the
//! result in HDR form so the perturbation kernel can iterate it at every
//! pixel without paying for arbitrary-precision arithmetic per step.

use fractalwonder_core::{BigFloat, HDRFloat};

/// A pre-computed reference orbit for perturbation rendering.
///
/// `orbit` and `derivative` are stored as HDR pairs rather than `f64` pairs:
/// the derivative grows roughly as `2^n` after `n` iterations and routinely
/// exceeds `f64`'s range long before the orbit itself escapes, so an `f64`
/// storage would force the orbit to be truncated early (a defect rejected
/// in favor of this HDR-based representation).
#[derive(Clone)]
pub struct ReferenceOrbit {
    /// Reference point C, downcast to HDR (bounded, used for rebasing math).
    pub c_ref: (HDRFloat, HDRFloat),
    /// Pre-computed orbit values Z_n.
    pub orbit: Vec<(HDRFloat, HDRFloat)>,
    /// Pre-computed derivative values dZ_n/dC.
    pub derivative: Vec<(HDRFloat, HDRFloat)>,
    /// Iteration at which the reference escaped (`None` if it never did
    /// within the requested budget).
    pub escaped_at: Option<u32>,
}

impl ReferenceOrbit {
    /// Compute a reference orbit using full `BigFloat` precision at each
    /// step, storing every point and derivative as HDR.
    pub fn compute(c_ref: &(BigFloat, BigFloat), max_iterations: u32) -> Self {
        let start = std::time::Instant::now();
        let precision = c_ref.0.precision_bits();
        let mut orbit = Vec::with_capacity(max_iterations as usize);
        let mut derivative = Vec::with_capacity(max_iterations as usize);

        let mut x = BigFloat::zero(precision);
        let mut y = BigFloat::zero(precision);
        // Derivative: Der_0 = 0
        let mut der_x = BigFloat::zero(precision);
        let mut der_y = BigFloat::zero(precision);

        let escape_radius_sq = BigFloat::with_precision(65536.0, precision);
        let one = BigFloat::with_precision(1.0, precision);
        let two = BigFloat::with_precision(2.0, precision);

        let mut escaped_at = None;

        for n in 0..max_iterations {
            orbit.push((HDRFloat::from_bigfloat(&x), HDRFloat::from_bigfloat(&y)));
            derivative.push((
                HDRFloat::from_bigfloat(&der_x),
                HDRFloat::from_bigfloat(&der_y),
            ));

            // Check escape: |z|^2 > 65536
            let x_sq = x.mul(&x);
            let y_sq = y.mul(&y);
            if x_sq.add(&y_sq).gt(&escape_radius_sq) {
                escaped_at = Some(n);
                break;
            }

            // Derivative update: Der' = 2*Z*Der + 1
            // (der_x + i*der_y)' = 2*(x + i*y)*(der_x + i*der_y) + 1
            // Real: 2*(x*der_x - y*der_y) + 1
            // Imag: 2*(x*der_y + y*der_x)
            let new_der_x = two.mul(&x.mul(&der_x).sub(&y.mul(&der_y))).add(&one);
            let new_der_y = two.mul(&x.mul(&der_y).add(&y.mul(&der_x)));

            // z = z^2 + c
            let new_x = x_sq.sub(&y_sq).add(&c_ref.0);
            let new_y = two.mul(&x).mul(&y).add(&c_ref.1);

            x = new_x;
            y = new_y;
            der_x = new_der_x;
            der_y = new_der_y;
        }

        log::debug!(
            target: "fractalwonder_compute::reference_orbit",
            "orbit of {} points (escaped_at={escaped_at:?}) built in {:?}",
            orbit.len(),
            start.elapsed(),
        );

        Self {
            c_ref: (
                HDRFloat::from_bigfloat(&c_ref.0),
                HDRFloat::from_bigfloat(&c_ref.1),
            ),
            orbit,
            derivative,
            escaped_at,
        }
    }

    /// Number of computed orbit points.
    pub fn len(&self) -> usize {
        self.orbit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbit.is_empty()
    }
}
