//! Fractal-specific compute kernels: direct and perturbation-based
//! Mandelbrot iteration, reference orbit precomputation, and BLA
//! acceleration.

pub mod bla;
pub mod error;
pub mod mandelbrot;
pub mod perturbation;
pub mod tile_render;

pub use bla::{BlaEntry, BlaTable};
pub use error::Error;
pub use perturbation::{compute_pixel_perturbation, BlaStats, ReferenceOrbit};
pub use tile_render::{render_tile, TileRenderInput, TileRenderResult, TileStats};
