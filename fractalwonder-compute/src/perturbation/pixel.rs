//! Per-pixel perturbation iteration.
//!
//! Iterates `δz = z - Z_m` against a pre-computed reference orbit, entirely
//! in HDR arithmetic so a single code path covers both moderate and extreme
//! zoom without a separate `f64` fast path. `δc` is always the tile's
//! direct pixel-offset value (never derived by subtracting two absolute
//! world coordinates), since that subtraction is the catastrophic
//! cancellation perturbation theory exists to avoid.

use fractalwonder_core::{ComplexDelta, HDRComplex, HDRFloat, MandelbrotData};

use super::{compute_surface_normal_direction, ReferenceOrbit};
use crate::bla::BlaTable;

/// Counters describing how much of a pixel's iteration was skipped via BLA.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlaStats {
    pub bla_iterations: u32,
    pub total_iterations: u32,
    pub rebase_count: u32,
}

const ESCAPE_RADIUS_SQ: f64 = 65536.0;

/// Iterate one pixel's perturbation orbit to escape or `max_iterations`.
///
/// `bla_table` is optional: passing `None` runs the plain scalar
/// perturbation loop; passing `Some` additionally attempts a BLA
/// fast-forward before each scalar step.
pub fn compute_pixel_perturbation(
    orbit: &ReferenceOrbit,
    bla_table: Option<&BlaTable>,
    delta_c: HDRComplex,
    max_iterations: u32,
    tau_sq: f64,
) -> (MandelbrotData, BlaStats) {
    let orbit_len = orbit.orbit.len();
    if orbit_len == 0 {
        return (
            MandelbrotData {
                iterations: 0,
                max_iterations,
                escaped: false,
                glitched: true,
                final_z_norm_sq: 0.0,
                surface_normal_re: 0.0,
                surface_normal_im: 0.0,
            },
            BlaStats::default(),
        );
    }

    let reference_escaped = orbit.escaped_at.is_some();
    let escape_radius_sq = HDRFloat::from_f64(ESCAPE_RADIUS_SQ);
    let tau_sq_hdr = HDRFloat::from_f64(tau_sq);
    let glitch_floor = HDRFloat::from_f64(1e-20);

    let mut delta_z = HDRComplex::ZERO;
    let mut delta_rho = HDRComplex::ZERO;
    let mut m: usize = 0;
    let mut n: u32 = 0;
    let mut glitched = false;
    let mut bla_iterations = 0u32;
    let mut standard_iterations = 0u32;
    let mut rebase_count = 0u32;

    while n < max_iterations {
        let (zm_re, zm_im) = orbit.orbit[m];
        let (derm_re, derm_im) = orbit.derivative[m];
        let z_m = HDRComplex { re: zm_re, im: zm_im };
        let der_m = HDRComplex { re: derm_re, im: derm_im };

        let z = z_m.add(&delta_z);
        let z_mag_sq = z.norm_sq_hdr();
        let delta_z_mag_sq = delta_z.norm_sq_hdr();
        let z_m_mag_sq = z_m.norm_sq_hdr();
        let rho = der_m.add(&delta_rho);

        // 1. Escape test.
        if z_mag_sq.gt(&escape_radius_sq) {
            let (sn_re, sn_im) = compute_surface_normal_direction(&z.re, &z.im, &rho.re, &rho.im);
            return (
                MandelbrotData {
                    iterations: n,
                    max_iterations,
                    escaped: true,
                    glitched,
                    final_z_norm_sq: z_mag_sq.to_f64() as f32,
                    surface_normal_re: sn_re,
                    surface_normal_im: sn_im,
                },
                BlaStats {
                    bla_iterations,
                    total_iterations: bla_iterations + standard_iterations,
                    rebase_count,
                },
            );
        }

        // 2. Rebase test: the perturbation has grown to dominate the full
        // value, so restart tracking it against the unperturbed orbit.
        if z_mag_sq.lt(&delta_z_mag_sq) {
            delta_z = z;
            delta_rho = rho;
            m = 0;
            rebase_count += 1;
            continue;
        }

        // 3. Glitch flag (informational only; does not alter control flow).
        if z_m_mag_sq.gt(&glitch_floor) && z_mag_sq.lt(&tau_sq_hdr.mul(&z_m_mag_sq)) {
            glitched = true;
        }

        // 4. Reference exhaustion: the reference escaped before this pixel
        // needed it to. Behave exactly as a rebase — reset `m` to 0 without
        // wrapping it back into range via modulo, which would silently
        // replay the tail of an orbit that already escaped.
        if reference_escaped && m + 1 >= orbit_len {
            delta_z = z;
            delta_rho = rho;
            m = 0;
            rebase_count += 1;
            continue;
        }

        // 5. Optional BLA fast-forward.
        if let Some(table) = bla_table {
            if let Some(entry) = table.find_valid(m, &delta_z_mag_sq) {
                delta_z = entry.a.mul(&delta_z).add(&entry.b.mul(&delta_c));
                m += entry.l as usize;
                n += entry.l;
                bla_iterations += entry.l;
                continue;
            }
        }

        // 6. Scalar advance. `δz' = 2·Z_m·δz + δz² + δc` is the perturbation
        // form of `z' = z² + c`. `δρ'` is the same perturbation applied to
        // the derivative recurrence `ρ' = 2·z·ρ + 1`: expanding `z = Z_m+δz`
        // and `ρ = dZ_m+δρ` and subtracting the reference's own
        // `dZ_m' = 2·Z_m·dZ_m + 1` cancels the `+1` and the pure-reference
        // cross term, leaving only the terms below.
        let old_delta_z = delta_z;
        let old_delta_rho = delta_rho;

        delta_z = z_m
            .mul(&old_delta_z)
            .scale(2.0)
            .add(&old_delta_z.square())
            .add(&delta_c);

        delta_rho = z_m
            .mul(&old_delta_rho)
            .scale(2.0)
            .add(&old_delta_z.mul(&der_m).scale(2.0))
            .add(&old_delta_z.mul(&old_delta_rho).scale(2.0));

        m += 1;
        n += 1;
        standard_iterations += 1;
    }

    (
        MandelbrotData {
            iterations: max_iterations,
            max_iterations,
            escaped: false,
            glitched,
            final_z_norm_sq: 0.0,
            surface_normal_re: 0.0,
            surface_normal_im: 0.0,
        },
        BlaStats {
            bla_iterations,
            total_iterations: bla_iterations + standard_iterations,
            rebase_count,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalwonder_core::BigFloat;

    fn orbit_for(re: f64, im: f64, precision_bits: usize, max_iterations: u32) -> ReferenceOrbit {
        let c_ref = (
            BigFloat::with_precision(re, precision_bits),
            BigFloat::with_precision(im, precision_bits),
        );
        ReferenceOrbit::compute(&c_ref, max_iterations)
    }

    #[test]
    fn pixel_at_reference_point_matches_reference_escape() {
        // delta_c = 0 means this pixel IS the reference point.
        let orbit = orbit_for(2.0, 0.0, 128, 100);
        let (result, _) = compute_pixel_perturbation(&orbit, None, HDRComplex::ZERO, 100, 1e-6);
        assert!(result.escaped);
        assert_eq!(result.iterations, orbit.escaped_at.unwrap());
    }

    #[test]
    fn pixel_inside_set_never_escapes() {
        let orbit = orbit_for(-0.5, 0.0, 128, 200);
        let (result, _) = compute_pixel_perturbation(&orbit, None, HDRComplex::ZERO, 200, 1e-6);
        assert!(!result.escaped);
        assert_eq!(result.iterations, 200);
    }

    #[test]
    fn nearby_pixel_escapes() {
        // Reference at c=-0.5 (inside, never escapes within budget); pixel
        // offset by a small delta_c that pushes it just outside the set.
        let orbit = orbit_for(-0.5, 0.0, 128, 500);
        let delta_c = HDRComplex {
            re: HDRFloat::from_f64(1.3),
            im: HDRFloat::ZERO,
        };
        let (result, _) = compute_pixel_perturbation(&orbit, None, delta_c, 500, 1e-6);
        assert!(result.escaped);
    }

    #[test]
    fn empty_orbit_returns_glitched_non_escaping_pixel() {
        let orbit = ReferenceOrbit {
            c_ref: (HDRFloat::ZERO, HDRFloat::ZERO),
            orbit: Vec::new(),
            derivative: Vec::new(),
            escaped_at: None,
        };
        let (result, _) = compute_pixel_perturbation(&orbit, None, HDRComplex::ZERO, 100, 1e-6);
        assert!(result.glitched);
        assert!(!result.escaped);
    }

    #[test]
    fn bla_fast_forward_matches_scalar_iteration_count() {
        let orbit = orbit_for(-0.5, 0.0, 128, 300);
        let dc_max = HDRFloat::from_f64(0.5);
        let table = BlaTable::build(&orbit, dc_max);
        let delta_c = HDRComplex {
            re: HDRFloat::from_f64(1.3),
            im: HDRFloat::ZERO,
        };

        let (without_bla, _) = compute_pixel_perturbation(&orbit, None, delta_c, 300, 1e-6);
        let (with_bla, _stats) = compute_pixel_perturbation(&orbit, Some(&table), delta_c, 300, 1e-6);

        assert_eq!(without_bla.iterations, with_bla.iterations);
        assert_eq!(without_bla.escaped, with_bla.escaped);
    }
}
