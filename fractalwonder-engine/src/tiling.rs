//! Tile generation: how a canvas is divided into chunks and in what order
//! those chunks are dispatched.
//!
//! Grounded in the teacher's `rendering::tiles` module (grid generation +
//! distance-from-center sort), extended with the preferred-tile-count
//! formula this spec requires instead of the teacher's fixed zoom
//! threshold.

use fractalwonder_core::PixelRect;

/// Preferred tile count for a given zoom level, growing logarithmically so
/// deep zoom renders (which take longer per tile) still paint frequent
/// progress updates.
///
/// Takes `zoom_log2` (`Viewport::zoom_log2()`) rather than a raw `zoom: f64`:
/// `Viewport::zoom_f64()` saturates to infinity once width underflows
/// roughly `1e-308`, a depth this architecture explicitly supports, and a
/// `log10` of infinity would collapse every sufficiently deep zoom onto the
/// same clamped tile count region rather than continuing to track it.
pub fn preferred_tile_count(zoom_log2: f64) -> u32 {
    let zoom_log10 = (zoom_log2 * std::f64::consts::LOG10_2).max(-1.0);
    let raw = (250.0 * (zoom_log10 + 1.0)).floor();
    raw.clamp(100.0, 500.0) as u32
}

/// Tile side length for a canvas of `width * height` pixels split into
/// roughly `preferred_tile_count(zoom_log2)` tiles.
pub fn tile_side(canvas_width: u32, canvas_height: u32, zoom_log2: f64) -> u32 {
    let tile_count = preferred_tile_count(zoom_log2) as f64;
    let area = (canvas_width as f64) * (canvas_height as f64);
    let side = (area / tile_count).sqrt().floor();
    (side as u32).clamp(20, 1000)
}

/// Generate tiles covering `canvas_width x canvas_height`, in center-out
/// order (sorted by squared distance of the tile's own center from the
/// canvas center — equivalent in visual effect to an explicit spiral walk).
pub fn generate_tiles(canvas_width: u32, canvas_height: u32, tile_side: u32) -> Vec<PixelRect> {
    let mut tiles = Vec::new();

    let mut y = 0;
    while y < canvas_height {
        let h = tile_side.min(canvas_height - y);
        let mut x = 0;
        while x < canvas_width {
            let w = tile_side.min(canvas_width - x);
            tiles.push(PixelRect::new(x, y, w, h));
            x += tile_side;
        }
        y += tile_side;
    }

    let center_x = canvas_width as f64 / 2.0;
    let center_y = canvas_height as f64 / 2.0;

    tiles.sort_by(|a, b| {
        let dist_sq = |t: &PixelRect| {
            let cx = t.x as f64 + t.width as f64 / 2.0;
            let cy = t.y as f64 + t.height as f64 / 2.0;
            (cx - center_x).powi(2) + (cy - center_y).powi(2)
        };
        dist_sq(a)
            .partial_cmp(&dist_sq(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_tile_count_at_zoom_one_is_clamped_minimum() {
        // zoom=1 => zoom_log2=0 => log10(zoom)+1 = 1, 250*1 = 250, within range.
        assert_eq!(preferred_tile_count(1.0f64.log2()), 250);
    }

    #[test]
    fn preferred_tile_count_never_below_100() {
        assert_eq!(preferred_tile_count(0.001f64.log2()), 100);
    }

    #[test]
    fn preferred_tile_count_never_above_500() {
        assert_eq!(preferred_tile_count(1e20f64.log2()), 500);
    }

    #[test]
    fn preferred_tile_count_stays_clamped_beyond_f64_zoom_range() {
        // zoom_log2 this large corresponds to a zoom so deep that
        // Viewport::zoom_f64() would have already saturated to infinity;
        // preferred_tile_count must still clamp to a sane value.
        assert_eq!(preferred_tile_count(2000.0 * std::f64::consts::LOG2_10), 500);
    }

    #[test]
    fn tile_side_is_clamped_to_valid_range() {
        let side = tile_side(16, 16, 1.0f64.log2());
        assert!(side >= 20 && side <= 1000);
    }

    #[test]
    fn tile_side_shrinks_as_preferred_count_grows() {
        let shallow = tile_side(4000, 4000, 1.0f64.log2());
        let deep = tile_side(4000, 4000, 1e10f64.log2());
        assert!(deep <= shallow);
    }

    #[test]
    fn generate_tiles_covers_canvas_with_no_overlap() {
        let tiles = generate_tiles(256, 256, 64);
        let total_area: u64 = tiles.iter().map(|t| t.area() as u64).sum();
        assert_eq!(total_area, 256 * 256);

        for (i, a) in tiles.iter().enumerate() {
            for b in tiles.iter().skip(i + 1) {
                let x_overlap = a.x < b.x + b.width && a.x + a.width > b.x;
                let y_overlap = a.y < b.y + b.height && a.y + a.height > b.y;
                assert!(!(x_overlap && y_overlap), "tiles overlap: {:?} {:?}", a, b);
            }
        }
    }

    #[test]
    fn generate_tiles_handles_non_divisible_canvas_sizes() {
        let tiles = generate_tiles(100, 100, 64);
        assert_eq!(tiles.len(), 4);
        assert!(tiles.iter().any(|t| t.width == 36));
        assert!(tiles.iter().any(|t| t.height == 36));
    }

    #[test]
    fn generate_tiles_is_center_out_ordered() {
        let tiles = generate_tiles(256, 256, 64);
        let first = &tiles[0];
        let last = &tiles[tiles.len() - 1];

        let dist = |t: &PixelRect| {
            let cx = t.x as f64 + t.width as f64 / 2.0 - 128.0;
            let cy = t.y as f64 + t.height as f64 / 2.0 - 128.0;
            (cx * cx + cy * cy).sqrt()
        };

        assert!(dist(first) < dist(last));
    }
}
