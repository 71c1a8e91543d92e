//! Tile rendering: iterates a whole tile of pixels against one pre-computed
//! reference orbit.
//!
//! `delta_c_origin`/`delta_c_step` are accumulated directly in HDR space —
//! `delta_c_origin + n·delta_c_step` — rather than computed per-pixel by
//! subtracting two absolute world coordinates. At deep zoom those world
//! coordinates agree in their first few hundred bits, so subtracting them
//! per pixel would throw away almost all of the precision the reference
//! orbit was built to preserve.

use fractalwonder_core::{BigFloat, ComputeData, HDRComplex, HDRFloat};

use crate::bla::BlaTable;
use crate::perturbation::{compute_pixel_perturbation, BlaStats, ReferenceOrbit};

/// Input parameters for rendering one tile.
pub struct TileRenderInput {
    /// `δc` of the tile's first pixel (top-left), relative to the reference point.
    pub delta_c_origin: (BigFloat, BigFloat),
    /// Per-pixel `δc` step in each axis.
    pub delta_c_step: (BigFloat, BigFloat),
    pub tile_width: u32,
    pub tile_height: u32,
    pub max_iterations: u32,
    pub tau_sq: f64,
}

/// Aggregate BLA statistics across every pixel in a tile.
#[derive(Clone, Copy, Debug, Default)]
pub struct TileStats {
    pub bla_iterations: u64,
    pub total_iterations: u64,
    pub rebase_count: u64,
}

impl TileStats {
    fn accumulate(&mut self, pixel: &BlaStats) {
        self.bla_iterations += pixel.bla_iterations as u64;
        self.total_iterations += pixel.total_iterations as u64;
        self.rebase_count += pixel.rebase_count as u64;
    }
}

/// Result of rendering a tile.
pub struct TileRenderResult {
    /// Computed data for each pixel, row-major, top-left first.
    pub data: Vec<ComputeData>,
    pub stats: TileStats,
}

/// Render a tile against a pre-computed reference orbit.
///
/// `bla_table` is `None` when the algorithm config disables BLA (see
/// `FractalConfig::bla_enabled`) or when the tile's `dc_max` falls below
/// the usefulness threshold.
pub fn render_tile(
    orbit: &ReferenceOrbit,
    bla_table: Option<&BlaTable>,
    input: &TileRenderInput,
) -> TileRenderResult {
    let delta_origin = HDRComplex {
        re: HDRFloat::from_bigfloat(&input.delta_c_origin.0),
        im: HDRFloat::from_bigfloat(&input.delta_c_origin.1),
    };
    let delta_step = HDRComplex {
        re: HDRFloat::from_bigfloat(&input.delta_c_step.0),
        im: HDRFloat::from_bigfloat(&input.delta_c_step.1),
    };

    let mut data = Vec::with_capacity((input.tile_width * input.tile_height) as usize);
    let mut stats = TileStats::default();

    let mut delta_c_row = delta_origin;
    for _row in 0..input.tile_height {
        let mut delta_c = delta_c_row;
        for _col in 0..input.tile_width {
            let (pixel, pixel_stats) = compute_pixel_perturbation(
                orbit,
                bla_table,
                delta_c,
                input.max_iterations,
                input.tau_sq,
            );
            stats.accumulate(&pixel_stats);
            data.push(ComputeData::Mandelbrot(pixel));

            delta_c.re = delta_c.re.add(&delta_step.re);
        }
        delta_c_row.im = delta_c_row.im.add(&delta_step.im);
    }

    TileRenderResult { data, stats }
}
