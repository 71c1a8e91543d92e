//! Scheduling and presentation layer: turns a `Viewport` + algorithm choice
//! into painted pixels on an [`output_surface::OutputSurface`], dispatching
//! tile work across a pool of workers, caching finished chunks, and
//! colorizing raw compute results into RGBA8.

pub mod cache;
pub mod colorize;
pub mod error;
pub mod output_surface;
pub mod preview;
pub mod scheduler;
pub mod tiling;
pub mod worker;

pub use cache::{ChunkCache, ChunkResult};
pub use error::EngineError;
pub use output_surface::OutputSurface;
pub use preview::{compute_preview_transform, preview_blit, PreviewTransform};
pub use scheduler::{Engine, FrameHandle, FrameRequest};
pub use worker::{ComputeWorker, FrameTicker};
