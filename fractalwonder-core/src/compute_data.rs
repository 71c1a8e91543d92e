// fractalwonder-core/src/compute_data.rs

/// Data computed for a test image pixel.
/// All fields are bools derived from normalized coordinate comparisons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TestImageData {
    pub is_on_origin: bool,
    pub is_on_x_axis: bool,
    pub is_on_y_axis: bool,
    pub is_on_major_tick_x: bool,
    pub is_on_medium_tick_x: bool,
    pub is_on_minor_tick_x: bool,
    pub is_on_major_tick_y: bool,
    pub is_on_medium_tick_y: bool,
    pub is_on_minor_tick_y: bool,
    pub is_light_cell: bool,
}

impl Default for TestImageData {
    fn default() -> Self {
        Self {
            is_on_origin: false,
            is_on_x_axis: false,
            is_on_y_axis: false,
            is_on_major_tick_x: false,
            is_on_medium_tick_x: false,
            is_on_minor_tick_x: false,
            is_on_major_tick_y: false,
            is_on_medium_tick_y: false,
            is_on_minor_tick_y: false,
            is_light_cell: true,
        }
    }
}

/// Result of evaluating a single pixel under a Mandelbrot algorithm
/// (direct or perturbation).
///
/// `surface_normal_re`/`surface_normal_im` are precomputed by the kernel
/// that produces this value (from `u = z · conj(ρ)`, scaled to a common
/// exponent before the drop to `f32`) rather than left as raw orbit state
/// for a colorizer to reconstruct later — reconstructing the normal from
/// raw `z`/derivative components after an independent per-component cast
/// to `f32` silently corrupts the ratio between the two at deep zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MandelbrotData {
    /// Iteration count at escape, or `max_iterations` if the point did not escape.
    pub iterations: u32,
    /// The iteration budget this pixel was evaluated against.
    pub max_iterations: u32,
    /// Whether the orbit escaped the bailout radius.
    pub escaped: bool,
    /// Pauldelbrot glitch flag: informational, does not block rendering.
    pub glitched: bool,
    /// `|z|²` at escape (or at the iteration budget), used for smooth coloring.
    pub final_z_norm_sq: f32,
    /// Real component of the unit surface-normal direction, for Blinn-Phong shading.
    pub surface_normal_re: f32,
    /// Imaginary component of the unit surface-normal direction.
    pub surface_normal_im: f32,
}

impl MandelbrotData {
    /// A pixel that never escaped (presumed in the set).
    pub fn interior(max_iterations: u32) -> Self {
        Self {
            iterations: max_iterations,
            max_iterations,
            escaped: false,
            glitched: false,
            final_z_norm_sq: 0.0,
            surface_normal_re: 0.0,
            surface_normal_im: 1.0,
        }
    }
}

/// Unified enum for all compute results. Open to extension by future
/// point-computers; only the two variants required here are populated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ComputeData {
    TestImage(TestImageData),
    Mandelbrot(MandelbrotData),
}
