use crate::BigFloat;
use serde::{Deserialize, Serialize};

/// Viewport in fractal space with BigFloat precision
///
/// Defines a rectangular region in fractal coordinates:
/// - `center`: Center point (x, y) in fractal space
/// - `width`: Visible width in fractal space
/// - `height`: Visible height in fractal space
///
/// At extreme zoom depths (10^2000), width/height are ~10^-2000.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Viewport {
    pub center: (BigFloat, BigFloat),
    pub width: BigFloat,
    pub height: BigFloat,
}

impl Viewport {
    /// Create new viewport with BigFloat coordinates
    ///
    /// This is the primary constructor that preserves full precision.
    pub fn with_bigfloat(
        center_x: BigFloat,
        center_y: BigFloat,
        width: BigFloat,
        height: BigFloat,
    ) -> Self {
        Self {
            center: (center_x, center_y),
            width,
            height,
        }
    }

    /// Create new viewport from f64 values with explicit precision
    ///
    /// Use this for initial viewport creation or when f64 precision is sufficient.
    /// For extreme depths, use `with_bigfloat` instead.
    pub fn from_f64(
        center_x: f64,
        center_y: f64,
        width: f64,
        height: f64,
        precision_bits: usize,
    ) -> Self {
        Self {
            center: (
                BigFloat::with_precision(center_x, precision_bits),
                BigFloat::with_precision(center_y, precision_bits),
            ),
            width: BigFloat::with_precision(width, precision_bits),
            height: BigFloat::with_precision(height, precision_bits),
        }
    }

    /// Create viewport from string representations (for extreme precision coordinates)
    ///
    /// Use this when loading saved positions with coordinates that exceed f64 precision.
    /// Returns an error if any string cannot be parsed.
    pub fn from_strings(
        center_x: &str,
        center_y: &str,
        width: &str,
        height: &str,
        precision_bits: usize,
    ) -> Result<Self, String> {
        Ok(Self {
            center: (
                BigFloat::from_string(center_x, precision_bits)?,
                BigFloat::from_string(center_y, precision_bits)?,
            ),
            width: BigFloat::from_string(width, precision_bits)?,
            height: BigFloat::from_string(height, precision_bits)?,
        })
    }

    /// Get the precision bits of this viewport
    pub fn precision_bits(&self) -> usize {
        self.width.precision_bits()
    }

    /// Derived zoom level: how many times the canonical 4-wide view has been
    /// halved to reach this viewport's width. Larger is deeper.
    ///
    /// There is no stored `zoom` field — it is always `4.0 / width`. Computed
    /// via `log2_approx` rather than a direct `BigFloat` division followed by
    /// `to_f64()`, since at deep zoom the ratio itself overflows f64 long
    /// before the division would.
    pub fn zoom_f64(&self) -> f64 {
        libm::exp2(2.0 - self.width.log2_approx())
    }

    /// `log2(zoom)`, i.e. the exponent `zoom_f64()` exponentiates and then
    /// saturates to `f64::INFINITY` once it overflows (beyond roughly
    /// `1e308`). This stays finite and monotonic across the entire
    /// representable width range (including the `1e-2000`-scale widths
    /// deep zoom requires), so any caller that only needs to compare,
    /// rank, or grow a quantity with zoom — cache fingerprints, tile
    /// sizing, iteration budgets — should use this instead of `zoom_f64()`
    /// once depth may exceed what `f64` can represent.
    pub fn zoom_log2(&self) -> f64 {
        2.0 - self.width.log2_approx()
    }

    /// Construct a viewport at a target `zoom` level, centered at
    /// `(center_x, center_y)`, sized to fit `canvas_aspect_ratio`
    /// (`width / height` of the destination canvas).
    ///
    /// Inverse of [`Self::zoom_f64`]: `width = 4.0 / zoom`, and `height` is
    /// derived from `width` and the aspect ratio so the viewport matches the
    /// canvas shape rather than always being square.
    pub fn with_zoom(
        center_x: BigFloat,
        center_y: BigFloat,
        zoom: f64,
        canvas_aspect_ratio: f64,
        precision_bits: usize,
    ) -> Self {
        let width = BigFloat::with_precision(4.0, precision_bits)
            .div(&BigFloat::with_precision(zoom, precision_bits));
        let height =
            width.div(&BigFloat::with_precision(canvas_aspect_ratio, precision_bits));

        Self {
            center: (center_x, center_y),
            width,
            height,
        }
    }

    /// Fractal-space step between adjacent pixels on a canvas of the given size.
    pub fn pixel_step(&self, canvas_width: u32, canvas_height: u32) -> (BigFloat, BigFloat) {
        let precision = self.precision_bits();
        (
            self.width
                .div(&BigFloat::with_precision(canvas_width as f64, precision)),
            self.height
                .div(&BigFloat::with_precision(canvas_height as f64, precision)),
        )
    }

    /// `δc` of pixel `(px, py)` relative to `c_ref`, at this viewport's full
    /// HPFloat precision.
    ///
    /// Computed as one BigFloat subtraction against `c_ref`, not by first
    /// rounding the pixel's absolute world coordinate down to `f64`/HDR and
    /// subtracting there — at deep zoom, two nearby world coordinates agree
    /// in their first few hundred bits, and an `f64`-precision subtraction
    /// would throw away exactly the bits perturbation theory needs.
    pub fn pixel_delta_c(
        &self,
        px: u32,
        py: u32,
        canvas_width: u32,
        canvas_height: u32,
        c_ref: &(BigFloat, BigFloat),
    ) -> (BigFloat, BigFloat) {
        let precision = self.precision_bits();
        let (step_x, step_y) = self.pixel_step(canvas_width, canvas_height);
        let half_width = self.width.div(&BigFloat::with_precision(2.0, precision));
        let half_height = self.height.div(&BigFloat::with_precision(2.0, precision));

        let world_x = self.center.0.sub(&half_width).add(
            &step_x.mul(&BigFloat::with_precision(px as f64 + 0.5, precision)),
        );
        let world_y = self.center.1.sub(&half_height).add(
            &step_y.mul(&BigFloat::with_precision(py as f64 + 0.5, precision)),
        );

        (world_x.sub(&c_ref.0), world_y.sub(&c_ref.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // with_bigfloat() constructor tests
    // ============================================================================

    #[test]
    fn with_bigfloat_stores_center_coordinates() {
        let center_x = BigFloat::with_precision(-0.5, 256);
        let center_y = BigFloat::with_precision(0.3, 256);
        let width = BigFloat::with_precision(4.0, 256);
        let height = BigFloat::with_precision(3.0, 256);

        let viewport = Viewport::with_bigfloat(center_x.clone(), center_y.clone(), width, height);

        assert_eq!(viewport.center.0, center_x);
        assert_eq!(viewport.center.1, center_y);
    }

    #[test]
    fn with_bigfloat_stores_width_and_height() {
        let center_x = BigFloat::zero(256);
        let center_y = BigFloat::zero(256);
        let width = BigFloat::with_precision(4.0, 256);
        let height = BigFloat::with_precision(3.0, 256);

        let viewport = Viewport::with_bigfloat(center_x, center_y, width.clone(), height.clone());

        assert_eq!(viewport.width, width);
        assert_eq!(viewport.height, height);
    }

    #[test]
    fn with_bigfloat_preserves_precision_metadata() {
        let center_x = BigFloat::with_precision(0.0, 512);
        let center_y = BigFloat::with_precision(0.0, 512);
        let width = BigFloat::with_precision(4.0, 512);
        let height = BigFloat::with_precision(3.0, 512);

        let viewport = Viewport::with_bigfloat(center_x, center_y, width, height);

        assert_eq!(viewport.center.0.precision_bits(), 512);
        assert_eq!(viewport.center.1.precision_bits(), 512);
        assert_eq!(viewport.width.precision_bits(), 512);
        assert_eq!(viewport.height.precision_bits(), 512);
    }

    // ============================================================================
    // from_f64() constructor tests
    // ============================================================================

    #[test]
    fn from_f64_creates_equivalent_bigfloat_values() {
        let viewport = Viewport::from_f64(-0.5, 0.3, 4.0, 3.0, 128);

        let expected_x = BigFloat::with_precision(-0.5, 128);
        let expected_y = BigFloat::with_precision(0.3, 128);
        let expected_width = BigFloat::with_precision(4.0, 128);
        let expected_height = BigFloat::with_precision(3.0, 128);

        assert_eq!(viewport.center.0, expected_x);
        assert_eq!(viewport.center.1, expected_y);
        assert_eq!(viewport.width, expected_width);
        assert_eq!(viewport.height, expected_height);
    }

    #[test]
    fn from_f64_sets_requested_precision() {
        let viewport = Viewport::from_f64(0.0, 0.0, 4.0, 3.0, 7000);

        assert_eq!(viewport.center.0.precision_bits(), 7000);
        assert_eq!(viewport.center.1.precision_bits(), 7000);
        assert_eq!(viewport.width.precision_bits(), 7000);
        assert_eq!(viewport.height.precision_bits(), 7000);
    }

    // ============================================================================
    // from_strings() constructor tests
    // ============================================================================

    #[test]
    fn from_strings_parses_coordinates_correctly() {
        let viewport = Viewport::from_strings("-0.5", "0.25", "4.0", "3.0", 256).unwrap();

        let expected_x = BigFloat::from_string("-0.5", 256).unwrap();
        let expected_y = BigFloat::from_string("0.25", 256).unwrap();
        let expected_width = BigFloat::from_string("4.0", 256).unwrap();
        let expected_height = BigFloat::from_string("3.0", 256).unwrap();

        assert_eq!(viewport.center.0, expected_x);
        assert_eq!(viewport.center.1, expected_y);
        assert_eq!(viewport.width, expected_width);
        assert_eq!(viewport.height, expected_height);
    }

    #[test]
    fn from_strings_handles_extreme_coordinates() {
        // Coordinates at extreme precision that cannot be represented in f64
        let viewport = Viewport::from_strings(
            "-0.743643887037158704752191506114774",
            "0.131825904205311970493132056385139",
            "1e-2000",
            "7.5e-2001",
            7000,
        )
        .unwrap();

        // Verify precision is preserved
        assert_eq!(viewport.precision_bits(), 7000);

        // Verify the coordinates are in expected ranges using BigFloat comparison
        let neg_one = BigFloat::with_precision(-1.0, 7000);
        let zero = BigFloat::zero(7000);
        let one = BigFloat::with_precision(1.0, 7000);

        assert!(viewport.center.0 > neg_one); // > -1
        assert!(viewport.center.0 < zero); // < 0 (it's negative)
        assert!(viewport.center.1 > zero); // > 0
        assert!(viewport.center.1 < one); // < 1

        // Verify width is extremely small (deep zoom)
        let small_threshold = BigFloat::from_string("1e-100", 7000).unwrap();
        assert!(viewport.width < small_threshold);
    }

    #[test]
    fn from_strings_returns_error_on_invalid_input() {
        let result = Viewport::from_strings("not_a_number", "0.0", "4.0", "3.0", 128);
        assert!(result.is_err());
    }

    // ============================================================================
    // Extreme depth tests
    // ============================================================================

    #[test]
    fn viewport_supports_width_beyond_f64_range() {
        // Width at 10^-500 (well beyond f64 min of ~10^-308)
        let width = BigFloat::from_string("1e-500", 7000).unwrap();
        let height = BigFloat::from_string("7.5e-501", 7000).unwrap();
        let viewport = Viewport::with_bigfloat(
            BigFloat::zero(7000),
            BigFloat::zero(7000),
            width.clone(),
            height.clone(),
        );

        assert_eq!(viewport.width, width);
        assert_eq!(viewport.height, height);

        // Verify we can do arithmetic with it (zoom in 2x = halve width)
        let two = BigFloat::with_precision(2.0, 7000);
        let zoomed_width = viewport.width.div(&two);
        let expected = BigFloat::from_string("5e-501", 7000).unwrap();
        assert_eq!(zoomed_width, expected);
    }

    #[test]
    fn viewport_supports_tiny_visible_region() {
        // At extreme depth, width/height are ~10^-2000
        let tiny_width = BigFloat::from_string("1e-2000", 7000).unwrap();
        let tiny_height = BigFloat::from_string("7.5e-2001", 7000).unwrap();
        let tiny_offset = BigFloat::from_string("1e-2000", 7000).unwrap();

        let viewport = Viewport::with_bigfloat(
            tiny_offset.clone(),
            BigFloat::zero(7000),
            tiny_width.clone(),
            tiny_height,
        );

        assert_eq!(viewport.center.0, tiny_offset);
        assert_eq!(viewport.width, tiny_width);
        assert!(viewport.center.0 > BigFloat::zero(7000));
    }

    // ============================================================================
    // Serialization round-trip tests
    // ============================================================================

    #[test]
    fn serialization_roundtrip_preserves_normal_values() {
        let original = Viewport::from_f64(-0.5, 0.3, 4.0, 3.0, 256);

        let json = serde_json::to_string(&original).unwrap();
        let restored: Viewport = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.center.0, original.center.0);
        assert_eq!(restored.center.1, original.center.1);
        assert_eq!(restored.width, original.width);
        assert_eq!(restored.height, original.height);
        assert_eq!(restored.precision_bits(), 256);
    }

    #[test]
    fn serialization_roundtrip_preserves_extreme_values() {
        let original = Viewport::from_strings(
            "-0.743643887037158704752191506114774",
            "0.131825904205311970493132056385139",
            "1e-2000",
            "7.5e-2001",
            7000,
        )
        .unwrap();

        let json = serde_json::to_string(&original).unwrap();
        let restored: Viewport = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.center.0, original.center.0);
        assert_eq!(restored.center.1, original.center.1);
        assert_eq!(restored.width, original.width);
        assert_eq!(restored.height, original.height);
        assert_eq!(restored.precision_bits(), 7000);
    }

    // ============================================================================
    // precision_bits() accessor tests
    // ============================================================================

    #[test]
    fn precision_bits_returns_width_precision() {
        // precision_bits() delegates to width.precision_bits()
        let viewport = Viewport::with_bigfloat(
            BigFloat::with_precision(0.0, 128),
            BigFloat::with_precision(0.0, 256),
            BigFloat::with_precision(4.0, 512), // this is what precision_bits() returns
            BigFloat::with_precision(3.0, 1024),
        );

        assert_eq!(viewport.precision_bits(), 512);
    }

    // ============================================================================
    // Mixed precision tests
    // ============================================================================

    #[test]
    fn viewport_allows_mixed_precision_components() {
        let viewport = Viewport::with_bigfloat(
            BigFloat::with_precision(0.0, 64),
            BigFloat::with_precision(0.0, 128),
            BigFloat::with_precision(4.0, 256),
            BigFloat::with_precision(3.0, 512),
        );

        assert_eq!(viewport.center.0.precision_bits(), 64);
        assert_eq!(viewport.center.1.precision_bits(), 128);
        assert_eq!(viewport.width.precision_bits(), 256);
        assert_eq!(viewport.height.precision_bits(), 512);
    }

    // ============================================================================
    // zoom_f64() accessor tests
    // ============================================================================

    #[test]
    fn zoom_f64_is_one_at_default_width() {
        let viewport = Viewport::from_f64(0.0, 0.0, 4.0, 3.0, 64);
        assert!((viewport.zoom_f64() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_f64_doubles_when_width_halves() {
        let viewport = Viewport::from_f64(0.0, 0.0, 2.0, 1.5, 64);
        assert!((viewport.zoom_f64() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_f64_reflects_moderate_zoom() {
        let viewport = Viewport::from_strings("0.0", "0.0", "4e-20", "3e-20", 256).unwrap();
        let zoom = viewport.zoom_f64();
        assert!(zoom > 1e19 && zoom < 1e21);
    }

    #[test]
    fn zoom_f64_saturates_to_infinity_beyond_f64_exponent_range() {
        // Beyond f64's own exponent range, zoom is astronomically large;
        // exp2 saturates to infinity rather than panicking or wrapping.
        let viewport = Viewport::from_strings("0.0", "0.0", "1e-500", "7.5e-501", 4096).unwrap();
        assert_eq!(viewport.zoom_f64(), f64::INFINITY);
    }

    // ============================================================================
    // zoom_log2() accessor tests
    // ============================================================================

    #[test]
    fn zoom_log2_is_zero_at_default_width() {
        let viewport = Viewport::from_f64(0.0, 0.0, 4.0, 3.0, 64);
        assert!(viewport.zoom_log2().abs() < 1e-9);
    }

    #[test]
    fn zoom_log2_matches_log2_of_zoom_f64_within_f64_range() {
        let viewport = Viewport::from_strings("0.0", "0.0", "4e-20", "3e-20", 256).unwrap();
        assert!((viewport.zoom_log2() - viewport.zoom_f64().log2()).abs() < 1e-6);
    }

    #[test]
    fn zoom_log2_stays_finite_and_distinct_beyond_f64_exponent_range() {
        // Two distinct extreme depths where zoom_f64() both saturate to
        // infinity must still produce distinct, finite zoom_log2() values.
        let shallower = Viewport::from_strings("0.0", "0.0", "1e-500", "7.5e-501", 4096).unwrap();
        let deeper = Viewport::from_strings("0.0", "0.0", "1e-2000", "7.5e-2001", 4096).unwrap();

        assert_eq!(shallower.zoom_f64(), f64::INFINITY);
        assert_eq!(deeper.zoom_f64(), f64::INFINITY);

        assert!(shallower.zoom_log2().is_finite());
        assert!(deeper.zoom_log2().is_finite());
        assert!(deeper.zoom_log2() > shallower.zoom_log2());
    }

    // ============================================================================
    // with_zoom() constructor tests
    // ============================================================================

    #[test]
    fn with_zoom_one_matches_canonical_four_wide_view() {
        let viewport = Viewport::with_zoom(
            BigFloat::zero(64),
            BigFloat::zero(64),
            1.0,
            4.0 / 3.0,
            64,
        );
        assert!((viewport.width.to_f64() - 4.0).abs() < 1e-9);
        assert!((viewport.height.to_f64() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn with_zoom_round_trips_through_zoom_f64() {
        let viewport =
            Viewport::with_zoom(BigFloat::zero(64), BigFloat::zero(64), 100.0, 1.0, 64);
        assert!((viewport.zoom_f64() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn with_zoom_matches_canvas_aspect_ratio() {
        let viewport =
            Viewport::with_zoom(BigFloat::zero(64), BigFloat::zero(64), 2.0, 2.0, 64);
        assert!((viewport.width.to_f64() / viewport.height.to_f64() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn with_zoom_preserves_center() {
        let center_x = BigFloat::with_precision(-0.5, 128);
        let center_y = BigFloat::with_precision(0.25, 128);
        let viewport = Viewport::with_zoom(center_x.clone(), center_y.clone(), 10.0, 1.0, 128);
        assert_eq!(viewport.center.0, center_x);
        assert_eq!(viewport.center.1, center_y);
    }

    #[test]
    fn pixel_step_divides_viewport_by_canvas_size() {
        let viewport = Viewport::from_f64(0.0, 0.0, 4.0, 2.0, 64);
        let (step_x, step_y) = viewport.pixel_step(400, 200);
        assert!((step_x.to_f64() - 0.01).abs() < 1e-9);
        assert!((step_y.to_f64() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn pixel_delta_c_at_reference_point_is_zero() {
        let viewport = Viewport::from_f64(-0.5, 0.0, 4.0, 4.0, 128);
        let c_ref = viewport.center.clone();
        // Canvas center pixel (50, 50) of a 100x100 canvas sits at the
        // viewport's center, which is exactly c_ref here.
        let (dx, dy) = viewport.pixel_delta_c(50, 50, 100, 100, &c_ref);
        assert!(dx.to_f64().abs() < 0.02);
        assert!(dy.to_f64().abs() < 0.02);
    }

    #[test]
    fn pixel_delta_c_increases_with_pixel_distance_from_reference() {
        let viewport = Viewport::from_f64(0.0, 0.0, 4.0, 4.0, 128);
        let c_ref = viewport.center.clone();
        let (near_dx, _) = viewport.pixel_delta_c(51, 50, 100, 100, &c_ref);
        let (far_dx, _) = viewport.pixel_delta_c(90, 50, 100, 100, &c_ref);
        assert!(far_dx.to_f64().abs() > near_dx.to_f64().abs());
    }
}
