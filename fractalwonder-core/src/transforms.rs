//! Interaction preview math.
//!
//! While the user drags or zooms, the UI needs an instantaneous preview of
//! the next frame before the compute layer has produced real pixels for it.
//! The preview is built by blitting the *previous* frame's bitmap, scaled
//! and repositioned to approximate where its content will land under the
//! *new* viewport. This module computes that scale and offset; the actual
//! blit (nearest-neighbor, smoothing disabled) happens in the output layer.

use crate::Viewport;

/// Scale and destination top-left pixel for blitting a previous frame's
/// bitmap as a preview of the next one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewTransform {
    /// `current.zoom / last.zoom`, i.e. how much larger the previous
    /// frame's content must be drawn to match the new viewport's scale.
    pub scale_ratio: f64,
    /// Width in destination pixels of the blitted previous frame.
    pub destination_width: f64,
    /// Height in destination pixels of the blitted previous frame.
    pub destination_height: f64,
    /// Pixel x-coordinate (in the new canvas) of the blit's top-left corner.
    pub destination_x: f64,
    /// Pixel y-coordinate (in the new canvas) of the blit's top-left corner.
    pub destination_y: f64,
}

/// Map a canvas pixel coordinate to a fractal-space coordinate under `viewport`.
///
/// `(0, 0)` is the canvas top-left; fractal y increases upward, so pixel row
/// 0 maps to the viewport's top edge (`center.y + height/2`).
fn pixel_to_fractal(
    pixel_x: f64,
    pixel_y: f64,
    viewport: &Viewport,
    canvas_width: u32,
    canvas_height: u32,
) -> (f64, f64) {
    let width = viewport.width.to_f64();
    let height = viewport.height.to_f64();
    let center_x = viewport.center.0.to_f64();
    let center_y = viewport.center.1.to_f64();

    let frac_x = center_x - width / 2.0 + (pixel_x / canvas_width as f64) * width;
    let frac_y = center_y + height / 2.0 - (pixel_y / canvas_height as f64) * height;
    (frac_x, frac_y)
}

/// Map a fractal-space coordinate to a canvas pixel coordinate under `viewport`.
///
/// Inverse of [`pixel_to_fractal`].
fn fractal_to_pixel(
    frac_x: f64,
    frac_y: f64,
    viewport: &Viewport,
    canvas_width: u32,
    canvas_height: u32,
) -> (f64, f64) {
    let width = viewport.width.to_f64();
    let height = viewport.height.to_f64();
    let center_x = viewport.center.0.to_f64();
    let center_y = viewport.center.1.to_f64();

    let pixel_x = ((frac_x - (center_x - width / 2.0)) / width) * canvas_width as f64;
    let pixel_y = ((center_y + height / 2.0 - frac_y) / height) * canvas_height as f64;
    (pixel_x, pixel_y)
}

/// Compute the [`PreviewTransform`] for blitting the bitmap rendered under
/// `last` as a stand-in preview of `current`, on a canvas of the given size.
///
/// `scale_ratio` is computed from the viewports' own `BigFloat` widths
/// (truncated to `f64` only for the final ratio) so it stays accurate even
/// when either viewport's width itself underflows `f64`.
pub fn compute_preview_transform(
    last: &Viewport,
    current: &Viewport,
    canvas_width: u32,
    canvas_height: u32,
) -> PreviewTransform {
    let scale_ratio = libm::exp2(last.width.log2_approx() - current.width.log2_approx());

    let destination_width = canvas_width as f64 * scale_ratio;
    let destination_height = canvas_height as f64 * scale_ratio;

    // Where does the fractal point shown at last's pixel (0,0) land now?
    let (frac_x, frac_y) = pixel_to_fractal(0.0, 0.0, last, canvas_width, canvas_height);
    let (destination_x, destination_y) =
        fractal_to_pixel(frac_x, frac_y, current, canvas_width, canvas_height);

    PreviewTransform {
        scale_ratio,
        destination_width,
        destination_height,
        destination_x,
        destination_y,
    }
}
