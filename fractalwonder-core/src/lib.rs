pub mod bigfloat;
pub mod chunk_fingerprint;
pub mod compute_data;
pub mod complex_delta;
pub mod config;
pub mod error;
pub mod hdrcomplex;
pub mod hdrfloat;
pub mod pixel_rect;
pub mod precision;
pub mod transforms;
pub mod viewport;

pub use bigfloat::BigFloat;
pub use chunk_fingerprint::ChunkFingerprint;
pub use complex_delta::{ComplexDelta, F64Complex};
pub use compute_data::{ComputeData, MandelbrotData, TestImageData};
pub use config::{
    calculate_dc_max, calculate_render_max_iterations, effective_max_iterations,
    get_fractal_config, is_bla_useful, FractalConfig, MANDELBROT_CONFIG,
    PERTURBATION_MANDELBROT_CONFIG,
};
pub use error::Error;
pub use hdrcomplex::HDRComplex;
pub use hdrfloat::HDRFloat;
pub use pixel_rect::PixelRect;
pub use precision::{calculate_precision_bits, calculate_precision_bits_with_iterations};
pub use transforms::{compute_preview_transform, PreviewTransform};
pub use viewport::Viewport;
