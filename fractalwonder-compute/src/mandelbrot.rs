//! Direct (non-perturbation) Mandelbrot escape-time iteration.
//!
//! Iterates `z = z² + c` directly in HDR arithmetic for every pixel. Correct
//! up to `MANDELBROT_CONFIG`'s documented zoom ceiling (~10^13): beyond that
//! depth HDR's ~48-bit mantissa can no longer distinguish `c` from its
//! neighbors and `perturbation_mandelbrot` must be used instead.

use fractalwonder_core::{HDRFloat, MandelbrotData, Viewport};

const ESCAPE_RADIUS_SQ: f64 = 65536.0;

/// Iterate a single point `(cx, cy)` to escape or `max_iterations`.
pub fn compute_point(cx: HDRFloat, cy: HDRFloat, max_iterations: u32) -> MandelbrotData {
    let mut zx = HDRFloat::ZERO;
    let mut zy = HDRFloat::ZERO;
    let escape_radius_sq = HDRFloat::from_f64(ESCAPE_RADIUS_SQ);
    let two = HDRFloat::from_f64(2.0);

    for i in 0..max_iterations {
        let zx_sq = zx.square();
        let zy_sq = zy.square();
        let z_norm_sq = zx_sq.add(&zy_sq);

        if z_norm_sq.gt(&escape_radius_sq) {
            return MandelbrotData {
                iterations: i,
                max_iterations,
                escaped: true,
                glitched: false,
                final_z_norm_sq: z_norm_sq.to_f64() as f32,
                surface_normal_re: 0.0,
                surface_normal_im: 0.0,
            };
        }

        // z = z^2 + c
        let new_zx = zx_sq.sub(&zy_sq).add(&cx);
        let new_zy = two.mul(&zx).mul(&zy).add(&cy);
        zx = new_zx;
        zy = new_zy;
    }

    MandelbrotData::interior(max_iterations)
}

/// Render a whole tile using the direct algorithm.
///
/// `tile_x`/`tile_y` are the tile's top-left pixel coordinates on the full
/// canvas; `viewport`/`canvas_width`/`canvas_height` describe the frame the
/// tile belongs to.
pub fn render_tile(
    viewport: &Viewport,
    canvas_width: u32,
    canvas_height: u32,
    tile_x: u32,
    tile_y: u32,
    tile_width: u32,
    tile_height: u32,
    max_iterations: u32,
) -> Vec<MandelbrotData> {
    let mut data = Vec::with_capacity((tile_width * tile_height) as usize);
    for row in 0..tile_height {
        for col in 0..tile_width {
            let px = tile_x + col;
            let py = tile_y + row;
            let (cx, cy) = viewport.pixel_delta_c(px, py, canvas_width, canvas_height, &(
                fractalwonder_core::BigFloat::zero(viewport.precision_bits()),
                fractalwonder_core::BigFloat::zero(viewport.precision_bits()),
            ));
            data.push(compute_point(
                HDRFloat::from_bigfloat(&cx),
                HDRFloat::from_bigfloat(&cy),
                max_iterations,
            ));
        }
    }
    data
}
