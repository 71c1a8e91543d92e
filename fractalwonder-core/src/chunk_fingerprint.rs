//! Cache key identifying one chunk's computed result.
//!
//! Two renders of the same tile rectangle under the same viewport,
//! iteration budget, canvas size and algorithm always produce the same
//! bitmap, so the cache keys on exactly those fields rather than on a
//! hash of the rendered bytes.

use crate::{PixelRect, Viewport};

/// Tuple of parameters that uniquely identifies a chunk's computed result.
///
/// `center_str` carries the viewport's center as decimal strings (via
/// `BigFloat`'s `Display`, which round-trips exactly) rather than as
/// `f64` — two viewports that differ only in bits below `f64` precision
/// must still produce distinct cache keys at deep zoom. `zoom_str` is
/// built from `zoom_log2()` rather than `zoom_f64()`, for the same
/// reason: `zoom_f64()` saturates to infinity once width underflows
/// roughly `1e-308`, which would collapse every sufficiently deep zoom
/// onto the same key; `zoom_log2()` stays finite and distinct across the
/// full representable width range.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkFingerprint {
    pub start_x: u32,
    pub start_y: u32,
    pub width: u32,
    pub height: u32,
    pub center_str: (String, String),
    pub zoom_str: String,
    pub max_iterations: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub algorithm_id: String,
}

impl ChunkFingerprint {
    pub fn new(
        tile: PixelRect,
        viewport: &Viewport,
        canvas_size: (u32, u32),
        max_iterations: u32,
        algorithm_id: &str,
    ) -> Self {
        Self {
            start_x: tile.x,
            start_y: tile.y,
            width: tile.width,
            height: tile.height,
            center_str: (viewport.center.0.to_string(), viewport.center.1.to_string()),
            zoom_str: format!("{:.12e}", viewport.zoom_log2()),
            max_iterations,
            canvas_width: canvas_size.0,
            canvas_height: canvas_size.1,
            algorithm_id: algorithm_id.to_string(),
        }
    }
}
