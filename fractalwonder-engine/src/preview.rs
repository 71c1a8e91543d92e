//! Interaction preview: draws the last completed frame's bitmap onto the
//! output surface at the affine placement `fractalwonder_core::transforms`
//! computes for it, nearest-neighbor resampled.
//!
//! No direct teacher precedent for the blit itself — the browser UI let
//! its own compositor resample a transformed `<canvas>` during a drag or
//! zoom gesture. This module is the native stand-in for that compositor
//! step; the placement math it consumes lives in `fractalwonder-core`
//! (`transforms::compute_preview_transform`), not here, since it is part
//! of the shared data model rather than anything scheduler-specific.

pub use fractalwonder_core::{compute_preview_transform, PreviewTransform};

use crate::output_surface::OutputSurface;

/// Draw `last_bitmap` (row-major RGBA8, `last_bitmap_size.0 *
/// last_bitmap_size.1 * 4` bytes) onto `surface` per `transform`,
/// resampled nearest-neighbor (no smoothing, per §4.E). Clips to the
/// surface bounds; a transform placing the bitmap entirely off-surface is
/// a no-op.
pub fn preview_blit<S: OutputSurface>(
    surface: &mut S,
    last_bitmap: &[u8],
    last_bitmap_size: (u32, u32),
    transform: &PreviewTransform,
) {
    let (src_w, src_h) = last_bitmap_size;
    if src_w == 0 || src_h == 0 {
        return;
    }

    let dst_w = transform.destination_width.round();
    let dst_h = transform.destination_height.round();
    if dst_w <= 0.0 || dst_h <= 0.0 {
        return;
    }
    let dst_w = dst_w as i64;
    let dst_h = dst_h as i64;

    let (surface_w, surface_h) = surface.size();
    let dest_x = transform.destination_x.round() as i64;
    let dest_y = transform.destination_y.round() as i64;

    let visible_x0 = dest_x.max(0);
    let visible_y0 = dest_y.max(0);
    let visible_x1 = (dest_x + dst_w).min(surface_w as i64);
    let visible_y1 = (dest_y + dst_h).min(surface_h as i64);
    if visible_x1 <= visible_x0 || visible_y1 <= visible_y0 {
        return;
    }
    let visible_w = (visible_x1 - visible_x0) as u32;
    let visible_h = (visible_y1 - visible_y0) as u32;

    let mut buf = vec![0u8; visible_w as usize * visible_h as usize * 4];
    for row in 0..visible_h {
        let dst_row = visible_y0 - dest_y + row as i64;
        let src_y = ((dst_row as f64 / dst_h as f64) * src_h as f64) as i64;
        let src_y = src_y.clamp(0, src_h as i64 - 1) as u32;
        for col in 0..visible_w {
            let dst_col = visible_x0 - dest_x + col as i64;
            let src_x = ((dst_col as f64 / dst_w as f64) * src_w as f64) as i64;
            let src_x = src_x.clamp(0, src_w as i64 - 1) as u32;

            let src_idx = (src_y as usize * src_w as usize + src_x as usize) * 4;
            let dst_idx = (row as usize * visible_w as usize + col as usize) * 4;
            buf[dst_idx..dst_idx + 4].copy_from_slice(&last_bitmap[src_idx..src_idx + 4]);
        }
    }

    surface.blit(visible_x0 as u32, visible_y0 as u32, visible_w, visible_h, &buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output_surface::MemorySurface;

    #[test]
    fn preview_blit_fills_destination_rect_with_source_color() {
        let mut surface = MemorySurface::new(20, 20);
        let bitmap = vec![10u8, 20, 30, 255].repeat(4 * 4);
        let transform = PreviewTransform {
            scale_ratio: 2.0,
            destination_width: 8.0,
            destination_height: 8.0,
            destination_x: 2.0,
            destination_y: 2.0,
        };
        preview_blit(&mut surface, &bitmap, (4, 4), &transform);
        let sample = surface.snapshot(5, 5, 1, 1);
        assert_eq!(sample, vec![10, 20, 30, 255]);
    }

    #[test]
    fn preview_blit_off_surface_placement_is_a_no_op() {
        let mut surface = MemorySurface::new(10, 10);
        let bitmap = vec![255u8; 4 * 4 * 4];
        let transform = PreviewTransform {
            scale_ratio: 1.0,
            destination_width: 4.0,
            destination_height: 4.0,
            destination_x: 100.0,
            destination_y: 100.0,
        };
        preview_blit(&mut surface, &bitmap, (4, 4), &transform);
        assert!(surface.snapshot(0, 0, 10, 10).iter().all(|&b| b == 0));
    }

    #[test]
    fn preview_blit_clips_negative_origin_to_surface_bounds() {
        let mut surface = MemorySurface::new(10, 10);
        let bitmap = vec![7u8, 8, 9, 255].repeat(4 * 4);
        let transform = PreviewTransform {
            scale_ratio: 1.0,
            destination_width: 4.0,
            destination_height: 4.0,
            destination_x: -2.0,
            destination_y: -2.0,
        };
        preview_blit(&mut surface, &bitmap, (4, 4), &transform);
        let sample = surface.snapshot(0, 0, 1, 1);
        assert_eq!(sample, vec![7, 8, 9, 255]);
    }
}
