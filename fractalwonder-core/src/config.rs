//! Fractal configuration and rendering helpers.
//!
//! This module contains configuration for fractal types and pure helper
//! functions used by both the UI coordinator and compute workers.

use crate::{HDRFloat, Viewport};

/// Configuration for a fractal type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalConfig {
    /// Unique identifier (matches renderer ID in compute layer)
    pub id: &'static str,
    /// Human-readable name for UI display
    pub display_name: &'static str,
    /// Default center coordinates as strings (preserves precision)
    pub default_center: (&'static str, &'static str),
    /// Default width in fractal space as string
    pub default_width: &'static str,
    /// Default height in fractal space as string
    pub default_height: &'static str,
    /// Glitch detection threshold squared (τ²).
    /// Default 1e-6 corresponds to τ = 10⁻³ (standard).
    pub tau_sq: f64,
    /// Multiplier for max iterations formula: multiplier * zoom_exp^power.
    pub iteration_multiplier: f64,
    /// Power for max iterations formula: multiplier * zoom_exp^power.
    pub iteration_power: f64,
    /// Scaling factor used by [`effective_max_iterations`] to grow the
    /// per-frame iteration budget with zoom.
    pub iteration_scaling_factor: f64,
    /// Enable BLA (Bivariate Linear Approximation) for iteration skipping.
    pub bla_enabled: bool,
}

impl FractalConfig {
    /// Create the default viewport for this fractal at the given precision.
    pub fn default_viewport(&self, precision_bits: usize) -> Viewport {
        Viewport::from_strings(
            self.default_center.0,
            self.default_center.1,
            self.default_width,
            self.default_height,
            precision_bits,
        )
        .expect("Invalid default viewport coordinates in FractalConfig")
    }
}

/// Direct (non-perturbation) Mandelbrot configuration.
/// Correct at zoom <= 10^13; beyond that, f64/HDR precision in the direct
/// iteration loop is insufficient and `"perturbation_mandelbrot"` must be used.
pub static MANDELBROT_CONFIG: FractalConfig = FractalConfig {
    id: "mandelbrot",
    display_name: "Mandelbrot Set",
    default_center: ("-0.5", "0.0"),
    default_width: "4.0",
    default_height: "4.0",
    tau_sq: 1e-6,
    iteration_multiplier: 200.0,
    iteration_power: 2.8,
    iteration_scaling_factor: 80.0,
    bla_enabled: false,
};

/// Perturbation-based deep-zoom Mandelbrot configuration.
/// This is the canonical source of truth for deep-zoom rendering parameters;
/// correct at any zoom within the configured HPFloat precision budget.
pub static PERTURBATION_MANDELBROT_CONFIG: FractalConfig = FractalConfig {
    id: "perturbation_mandelbrot",
    display_name: "Mandelbrot Set (deep zoom)",
    default_center: ("-0.5", "0.0"),
    default_width: "4.0",
    default_height: "4.0",
    tau_sq: 1e-6,
    iteration_multiplier: 200.0,
    iteration_power: 2.8,
    iteration_scaling_factor: 80.0,
    bla_enabled: true,
};

/// Look up a fractal configuration by ID.
pub fn get_fractal_config(id: &str) -> Option<&'static FractalConfig> {
    match id {
        "mandelbrot" => Some(&MANDELBROT_CONFIG),
        "perturbation_mandelbrot" => Some(&PERTURBATION_MANDELBROT_CONFIG),
        _ => None,
    }
}

/// Calculate maximum |delta_c| for any pixel in the viewport.
///
/// This is the distance from viewport center to the farthest corner,
/// used for BLA table construction.
///
/// Uses HDRFloat to avoid underflow when squaring very small viewport dimensions
/// at extreme zoom levels (e.g., 10^270 where f64 squaring underflows to 0).
pub fn calculate_dc_max(viewport: &Viewport) -> HDRFloat {
    let half_width = HDRFloat::from_bigfloat(&viewport.width).div_f64(2.0);
    let half_height = HDRFloat::from_bigfloat(&viewport.height).div_f64(2.0);
    half_width.square().add(&half_height.square()).sqrt()
}

/// Calculate the iteration multiplier/power contribution for a given zoom
/// exponent (log10 of zoom): `multiplier * zoom_exponent^power`, clamped to
/// `[1000, 10_000_000]`.
fn calculate_max_iterations(zoom_exponent: f64, multiplier: f64, power: f64) -> u32 {
    if zoom_exponent <= 0.0 {
        return 1000;
    }
    let iterations = multiplier * zoom_exponent.powf(power);
    iterations.clamp(1000.0, 10_000_000.0) as u32
}

/// Calculate a suggested maximum iterations for a render based on zoom level
/// and config.
///
/// Uses `log2_approx()` rather than `viewport.width.to_f64()` so that
/// extreme zoom depths (viewport widths far below f64's representable
/// range) still yield a sensible zoom exponent instead of collapsing to 0
/// via an `f64` division overflow.
pub fn calculate_render_max_iterations(viewport: &Viewport, config: &FractalConfig) -> u32 {
    // zoom = 4 / width, so log10(zoom) = log10(4) - log10(width) = (2 - log2(width)) * log10(2)
    let log2_width = viewport.width.log2_approx();
    let log2_zoom = 2.0 - log2_width;
    let zoom_exponent = if log2_zoom.is_finite() {
        log2_zoom * std::f64::consts::LOG10_2
    } else {
        0.0
    };

    calculate_max_iterations(zoom_exponent, config.iteration_multiplier, config.iteration_power)
}

/// Zoom threshold above which [`effective_max_iterations`] switches from its
/// power-law growth to cubic growth in `log10(zoom+1)`.
const EFFECTIVE_ITERATIONS_ZOOM_THRESHOLD: f64 = 2.5e5;

/// Derive the actual iteration budget fed to the perturbation/direct kernel
/// for one frame, from the user-requested `max_iterations`, the frame's
/// zoom level expressed as `zoom_log2` (`Viewport::zoom_log2()`), and the
/// algorithm's `iteration_scaling_factor`.
///
/// Takes `zoom_log2` rather than a raw `zoom: f64` so deep zoom never has
/// to round-trip through `Viewport::zoom_f64()`: that accessor saturates
/// to `f64::INFINITY` once width underflows roughly `1e-308` (a depth the
/// architecture explicitly supports), and an infinite `zoom` here would
/// make `effective` evaluate to infinity too, which a subsequent `as u32`
/// cast silently saturates to `u32::MAX` — driving the reference-orbit
/// builder to attempt a multi-billion-entry allocation instead of erroring
/// or rendering. `zoom_log2` stays finite across the full representable
/// width range.
///
/// Piecewise-continuous and strictly increasing in `zoom`:
/// - below the threshold: `max_iterations + scaling * log10(zoom+1)^1.5`
/// - above the threshold: `base_at_threshold + scaling * (log10(zoom+1) - log10(threshold))^3`
///
/// where `base_at_threshold` is the first branch evaluated exactly at the
/// threshold, so the two pieces agree at the boundary. `log10(zoom+1)` is
/// computed exactly (via an actual `zoom` value) whenever that `zoom` is
/// safely representable in `f64`, and approximated as `log10(zoom)` —
/// indistinguishable from `log10(zoom+1)` to many significant digits —
/// once `zoom` itself would overflow.
pub fn effective_max_iterations(max_iterations: u32, zoom_log2: f64, scaling_factor: f64) -> u32 {
    let zoom_log10 = if zoom_log2.is_finite() {
        (zoom_log2 * std::f64::consts::LOG10_2).max(0.0)
    } else {
        0.0
    };

    // Safe to materialize an actual zoom value and compute log10(zoom+1)
    // exactly below this bound (1e30 is nowhere near f64::MAX); beyond it
    // the "+1" is many orders of magnitude below the precision of an f64,
    // so zoom_log10 itself is an exact stand-in.
    const SAFE_EXPONENTIATION_BOUND: f64 = 30.0;
    let log_zoom_plus_one = if zoom_log10 <= SAFE_EXPONENTIATION_BOUND {
        (10f64.powf(zoom_log10) + 1.0).log10()
    } else {
        zoom_log10
    };
    let log_threshold = EFFECTIVE_ITERATIONS_ZOOM_THRESHOLD.log10();

    let effective = if zoom_log10 <= log_threshold {
        max_iterations as f64 + scaling_factor * log_zoom_plus_one.powf(1.5)
    } else {
        let base_at_threshold = max_iterations as f64 + scaling_factor * log_threshold.powf(1.5);
        base_at_threshold + scaling_factor * (log_zoom_plus_one - log_threshold).powi(3)
    };

    effective.round().max(max_iterations as f64) as u32
}

/// Check if BLA is useful at the current zoom level.
///
/// BLA helps at deep zoom where iteration counts are high.
/// Phil Thompson enables BLA at scale > 1e25 (dc_max < ~1e-25).
/// Reference: https://philthompson.me/2023/Faster-Mandelbrot-Set-Rendering-with-BLA-Bivariate-Linear-Approximation.html
pub fn is_bla_useful(dc_max: &HDRFloat) -> bool {
    dc_max.log2() < -80.0 // Roughly 10^-25 (scale > 1e25)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BigFloat;

    fn create_test_viewport(width: f64, height: f64) -> Viewport {
        Viewport {
            center: (
                BigFloat::with_precision(-0.5, 64),
                BigFloat::with_precision(0.0, 64),
            ),
            width: BigFloat::with_precision(width, 64),
            height: BigFloat::with_precision(height, 64),
        }
    }

    #[test]
    fn get_fractal_config_finds_mandelbrot() {
        let config = get_fractal_config("mandelbrot");
        assert!(config.is_some());
        assert_eq!(config.unwrap().display_name, "Mandelbrot Set");
    }

    #[test]
    fn get_fractal_config_returns_none_for_unknown() {
        let config = get_fractal_config("unknown_fractal");
        assert!(config.is_none());
    }

    #[test]
    fn calculate_dc_max_at_default_zoom() {
        let viewport = create_test_viewport(4.0, 4.0);
        let dc_max = calculate_dc_max(&viewport).to_f64();
        // sqrt(2^2 + 2^2) = sqrt(8) ≈ 2.828
        assert!((dc_max - 2.828).abs() < 0.01);
    }

    #[test]
    fn calculate_max_iterations_increases_with_zoom() {
        let shallow = create_test_viewport(4.0, 4.0);
        let deep = create_test_viewport(0.0001, 0.0001);

        let shallow_iter = calculate_render_max_iterations(&shallow, &MANDELBROT_CONFIG);
        let deep_iter = calculate_render_max_iterations(&deep, &MANDELBROT_CONFIG);

        assert!(deep_iter > shallow_iter);
    }

    #[test]
    fn bla_useful_at_deep_zoom() {
        // At deep zoom, dc_max is tiny
        let tiny_dc_max = HDRFloat::from_f64(1e-100);
        assert!(is_bla_useful(&tiny_dc_max));
    }

    #[test]
    fn bla_not_useful_at_shallow_zoom() {
        // At shallow zoom, dc_max is large
        let large_dc_max = HDRFloat::from_f64(2.0);
        assert!(!is_bla_useful(&large_dc_max));
    }

    #[test]
    fn mandelbrot_config_values() {
        assert_eq!(MANDELBROT_CONFIG.tau_sq, 1e-6);
        assert_eq!(MANDELBROT_CONFIG.iteration_multiplier, 200.0);
        assert_eq!(MANDELBROT_CONFIG.iteration_power, 2.8);
        assert!(!MANDELBROT_CONFIG.bla_enabled);
    }

    #[test]
    fn get_fractal_config_finds_perturbation_mandelbrot() {
        let config = get_fractal_config("perturbation_mandelbrot");
        assert!(config.is_some());
        assert!(config.unwrap().bla_enabled);
    }

    #[test]
    fn calculate_render_max_iterations_handles_extreme_zoom_beyond_f64() {
        let extreme_viewport = Viewport {
            center: (
                BigFloat::with_precision(0.273, 2000),
                BigFloat::with_precision(0.006, 2000),
            ),
            width: BigFloat::from_string("1.5e-309", 2000).unwrap(),
            height: BigFloat::from_string("1.0e-309", 2000).unwrap(),
        };

        let iter = calculate_render_max_iterations(&extreme_viewport, &MANDELBROT_CONFIG);
        assert!(
            iter > 10000,
            "At 10^308 zoom, expected >10000 iterations, got {}",
            iter
        );
    }

    #[test]
    fn effective_max_iterations_is_at_least_the_base_budget() {
        let effective = effective_max_iterations(1000, 1.0f64.log2(), 80.0);
        assert!(effective >= 1000);
    }

    #[test]
    fn effective_max_iterations_increases_with_zoom_below_threshold() {
        let low = effective_max_iterations(1000, 10.0f64.log2(), 80.0);
        let high = effective_max_iterations(1000, 10_000.0f64.log2(), 80.0);
        assert!(high > low);
    }

    #[test]
    fn effective_max_iterations_increases_with_zoom_above_threshold() {
        let at_threshold = effective_max_iterations(1000, 2.5e5f64.log2(), 80.0);
        let beyond_threshold = effective_max_iterations(1000, 2.5e8f64.log2(), 80.0);
        assert!(beyond_threshold > at_threshold);
    }

    #[test]
    fn effective_max_iterations_is_continuous_at_threshold() {
        let just_below = effective_max_iterations(1000, (2.5e5 - 1.0f64).log2(), 80.0);
        let at_threshold = effective_max_iterations(1000, 2.5e5f64.log2(), 80.0);
        // Piecewise-continuous: the two branches should agree to within rounding at the seam.
        assert!((just_below as i64 - at_threshold as i64).abs() <= 1);
    }

    #[test]
    fn effective_max_iterations_stays_sane_beyond_f64_zoom_range() {
        // zoom_log2 values this large correspond to a zoom so deep that
        // Viewport::zoom_f64() would have already saturated to infinity;
        // effective_max_iterations must still return a small, usable u32
        // rather than saturating to u32::MAX.
        let deep = effective_max_iterations(1000, 2000.0 * std::f64::consts::LOG2_10, 80.0);
        let deeper = effective_max_iterations(1000, 4000.0 * std::f64::consts::LOG2_10, 80.0);

        assert!(deep >= 1000);
        assert!(deep < 1_000_000);
        assert!(deeper >= deep);
        assert!(deeper < 1_000_000);
    }
}
