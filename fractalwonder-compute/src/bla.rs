//! Bivariate Linear Approximation for iteration skipping.
//!
//! A BLA entry lets the perturbation kernel fast-forward several reference
//! orbit steps in one shot: `δz_b = A·δz_a + B·δc` holds for all
//! `δz_a, δc` with combined magnitude below the entry's radius `r`.
//! Coefficients are stored as `HDRComplex`/`HDRFloat` rather than raw `f64`
//! pairs because both the orbit values they're built from, and the radii
//! they compare against, can be far outside `f64`'s representable range at
//! deep zoom.

use fractalwonder_core::{HDRComplex, HDRFloat};

use crate::perturbation::ReferenceOrbit;

/// Single BLA entry: skips `l` iterations.
/// Applies: δz_new = A·δz + B·δc, valid while `|δz| + |δc| < r`.
#[derive(Clone, Debug)]
pub struct BlaEntry {
    pub a: HDRComplex,
    pub b: HDRComplex,
    pub l: u32,
    pub r_sq: HDRFloat,
}

impl BlaEntry {
    /// Create a single-iteration BLA from a reference orbit point Z.
    pub fn from_orbit_point(z_re: HDRFloat, z_im: HDRFloat) -> Self {
        // r = machine epsilon (relative to HDR's ~48-bit mantissa) * |Z|
        let epsilon = HDRFloat::from_f64(2.0_f64.powi(-48));
        let z_mag = z_re.square().add(&z_im.square()).sqrt();
        let r = epsilon.mul(&z_mag);

        Self {
            a: HDRComplex {
                re: z_re.mul_f64(2.0),
                im: z_im.mul_f64(2.0),
            },
            b: HDRComplex {
                re: HDRFloat::from_f64(1.0),
                im: HDRFloat::ZERO,
            },
            l: 1,
            r_sq: r.square(),
        }
    }

    /// Merge two BLAs: x (first) then y (second).
    /// Result skips `l_x + l_y` iterations.
    pub fn merge(x: &BlaEntry, y: &BlaEntry, dc_max: &HDRFloat) -> BlaEntry {
        // A_merged = A_y * A_x
        let a = y.a.mul(&x.a);
        // B_merged = A_y * B_x + B_y
        let b = y.a.mul(&x.b).add(&y.b);

        // r_merged = min(r_x, max(0, (r_y - |B_x|·dc_max) / |A_x|))
        let r_x = x.r_sq.sqrt();
        let r_y = y.r_sq.sqrt();
        let b_x_mag = x.b.re.square().add(&x.b.im.square()).sqrt();
        let a_x_mag = x.a.re.square().add(&x.a.im.square()).sqrt();

        let numerator = r_y.sub(&b_x_mag.mul(dc_max));
        let numerator = if numerator.is_negative() {
            HDRFloat::ZERO
        } else {
            numerator
        };
        let r_adjusted = if a_x_mag.is_zero() {
            HDRFloat::ZERO
        } else {
            numerator.div_f64(a_x_mag.to_f64().max(f64::MIN_POSITIVE))
        };
        let r = if r_x.lt(&r_adjusted) { r_x } else { r_adjusted };

        BlaEntry {
            a,
            b,
            l: x.l + y.l,
            r_sq: r.square(),
        }
    }
}

/// Precomputed BLA coefficients over a reference orbit, indexed so that
/// `levels[k][i]` (when present) covers the span `[i, i + 2^k)`.
///
/// Built bottom-up: level 0 holds one-iteration entries directly from the
/// orbit; level `k+1`'s entry at `i` merges level `k`'s entries at `i` and
/// `i + 2^k`. A lookup for the longest valid jump starting at an arbitrary
/// index `m` walks levels from the deepest down, since every level stores
/// an entry rooted at every valid start index (not just power-of-two
/// aligned ones).
pub struct BlaTable {
    levels: Vec<Vec<Option<BlaEntry>>>,
    dc_max: HDRFloat,
}

impl BlaTable {
    /// Build the full table. `dc_max` is the maximum `|δc|` over the tile's
    /// pixels, used to tighten merged radii conservatively.
    pub fn build(orbit: &ReferenceOrbit, dc_max: HDRFloat) -> Self {
        let len = orbit.orbit.len();
        let level0: Vec<Option<BlaEntry>> = orbit
            .orbit
            .iter()
            .map(|&(re, im)| Some(BlaEntry::from_orbit_point(re, im)))
            .collect();

        let mut levels = vec![level0];
        let mut k = 0usize;
        loop {
            let half = 1usize << k;
            let span = half << 1;
            if len == 0 || span > len {
                break;
            }
            let prev = &levels[k];
            let mut next = Vec::with_capacity(len);
            for i in 0..len {
                if i + span <= len {
                    match (&prev[i], &prev[i + half]) {
                        (Some(a), Some(b)) => next.push(Some(BlaEntry::merge(a, b, &dc_max))),
                        _ => next.push(None),
                    }
                } else {
                    next.push(None);
                }
            }
            levels.push(next);
            k += 1;
        }

        Self { levels, dc_max }
    }

    pub fn dc_max(&self) -> &HDRFloat {
        &self.dc_max
    }

    /// Find the largest valid jump starting at orbit index `m`, given the
    /// current `|δz|²`. Returns `None` if no level has a radius large
    /// enough (including when `m` is out of range for every level).
    pub fn find_valid(&self, m: usize, dz_mag_sq: &HDRFloat) -> Option<&BlaEntry> {
        let combined = dz_mag_sq.sqrt().add(&self.dc_max);
        let combined_sq = combined.square();
        for level in self.levels.iter().rev() {
            if let Some(Some(entry)) = level.get(m) {
                if !combined_sq.gt(&entry.r_sq) {
                    return Some(entry);
                }
            }
        }
        None
    }
}
