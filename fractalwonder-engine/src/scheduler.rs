//! The coordinator: turns one `FrameRequest` into dispatched tile jobs,
//! painted results, and a cache of finished chunks.
//!
//! Grounded in the teacher's `workers::worker_pool::WorkerPool` — in
//! particular `start_render`/`start_perturbation_render` (tile dispatch)
//! and `cancel`/`recreate_workers` (terminate-and-recreate cancellation) —
//! with `Rc<RefCell<>>` + `web_sys::Worker` replaced by `Arc<Mutex<>>` +
//! `ComputeWorker` (native OS threads).

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fractalwonder_compute::bla::BlaTable;
use fractalwonder_compute::mandelbrot;
use fractalwonder_compute::perturbation::ReferenceOrbit;
use fractalwonder_compute::tile_render::{self, TileRenderInput};
use fractalwonder_core::{
    calculate_dc_max, calculate_precision_bits_with_iterations, effective_max_iterations,
    get_fractal_config, is_bla_useful, BigFloat, ChunkFingerprint, ComputeData, PixelRect, Viewport,
};

use crate::cache::{ChunkCache, ChunkResult};
use crate::colorize::{colorize_tile, LightingParams};
use crate::error::EngineError;
use crate::output_surface::OutputSurface;
use crate::tiling::{generate_tiles, tile_side};
use crate::worker::ComputeWorker;

const DEFAULT_CACHE_CAPACITY: usize = 150;

/// Worker count `N = clamp(ceil(0.75 * hardware_concurrency), 2, 16)`.
pub fn worker_count(hardware_concurrency: usize) -> usize {
    let preferred = (hardware_concurrency as f64 * 0.75).ceil() as usize;
    preferred.clamp(2, 16)
}

/// Everything a host needs to supply to render one frame.
#[derive(Clone, Debug)]
pub struct FrameRequest {
    pub center_x: String,
    pub center_y: String,
    pub zoom: String,
    pub max_iterations: u32,
    pub iteration_scaling_factor: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub algorithm_id: String,
}

struct TileOutcome {
    frame_id: u64,
    tile: PixelRect,
    rgba8: Vec<u8>,
    failure_reason: Option<String>,
}

/// Detects whether a new frame differs enough from the last one dispatched
/// to require clearing the chunk cache. `zoom_str` is built from
/// `Viewport::zoom_log2()` rather than `zoom_f64()`: the latter saturates to
/// infinity once width underflows roughly `1e-308`, which would make two
/// distinct deep zooms compare equal here and spuriously skip the cache
/// clear this signature exists to trigger.
#[derive(Clone, PartialEq)]
struct FrameSignature {
    zoom_str: String,
    algorithm_id: String,
    max_iterations: u32,
}

struct Inner<S: OutputSurface> {
    surface: S,
    cache: ChunkCache,
    workers: Vec<ComputeWorker<TileOutcome>>,
    current_frame_id: u64,
    last_signature: Option<FrameSignature>,
    lighting: LightingParams,
    max_precision_bits: usize,
}

/// Handle to an in-flight (or finished) frame, returned by
/// [`Engine::submit_frame`].
///
/// Reference-orbit and precision-budget failures are fatal but are caught
/// synchronously inside `submit_frame` itself (the orbit must exist before
/// any tile can be dispatched), so they surface as `submit_frame`'s own
/// `Result` rather than through `await_done`; per-tile failures never
/// reach this handle at all, only the log.
pub struct FrameHandle {
    completed: Arc<AtomicU32>,
    total: u32,
    done: Arc<AtomicBool>,
    cancel_action: Arc<dyn Fn() + Send + Sync>,
}

impl FrameHandle {
    /// Fraction of tiles completed, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed.load(Ordering::Acquire) as f32 / self.total as f32
    }

    /// Supersede this frame immediately: terminates the in-flight worker
    /// pool and marks this handle done. A no-op if the frame already
    /// finished or was already superseded by a later one.
    pub fn cancel(&self) {
        (self.cancel_action)();
    }

    /// Block until the frame completes or is cancelled.
    pub fn await_done(&self) {
        while !self.done.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

/// Owns the worker pool, chunk cache, and output surface for one render
/// target, and is the single entry point a host drives frames through.
pub struct Engine<S: OutputSurface + Send + 'static> {
    inner: Arc<Mutex<Inner<S>>>,
}

impl<S: OutputSurface + Send + 'static> Engine<S> {
    pub fn new(surface: S, hardware_concurrency: usize, max_precision_bits: usize) -> Self {
        let count = worker_count(hardware_concurrency);
        let workers = (0..count).map(|_| ComputeWorker::spawn()).collect();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                surface,
                cache: ChunkCache::new(DEFAULT_CACHE_CAPACITY),
                workers,
                current_frame_id: 0,
                last_signature: None,
                lighting: LightingParams::default(),
                max_precision_bits,
            })),
        }
    }

    pub fn set_lighting(&self, lighting: LightingParams) {
        self.inner.lock().unwrap().lighting = lighting;
    }

    /// Validate, build the viewport, and dispatch tiles for one frame.
    /// Always terminates and respawns the worker pool first: a newly
    /// accepted `FrameRequest` supersedes whatever the previous one was
    /// doing, per the terminate-and-recreate cancellation policy.
    pub fn submit_frame(&self, request: FrameRequest) -> Result<FrameHandle, EngineError> {
        if request.canvas_width == 0 || request.canvas_height == 0 {
            return Err(EngineError::InvalidRequest {
                reason: "canvas must have nonzero width and height".to_string(),
            });
        }
        if request.max_iterations == 0 {
            return Err(EngineError::InvalidRequest {
                reason: "max_iterations must be positive".to_string(),
            });
        }
        let config = get_fractal_config(&request.algorithm_id).ok_or_else(|| {
            EngineError::InvalidRequest {
                reason: format!("unknown algorithm id {:?}", request.algorithm_id),
            }
        })?;

        let max_precision_bits = self.inner.lock().unwrap().max_precision_bits;
        let canvas_size = (request.canvas_width, request.canvas_height);

        let estimate = estimate_initial_precision(&request.zoom, max_precision_bits);
        let viewport = build_viewport(&request, estimate)?;
        if !viewport.width.gt(&BigFloat::zero(estimate)) {
            return Err(EngineError::InvalidRequest {
                reason: "zoom must be a positive, finite value".to_string(),
            });
        }

        let effective_iterations = effective_max_iterations(
            request.max_iterations,
            viewport.zoom_log2(),
            request.iteration_scaling_factor,
        );
        let required_precision = calculate_precision_bits_with_iterations(
            &viewport,
            canvas_size,
            effective_iterations as u64,
        );
        if required_precision > max_precision_bits {
            return Err(EngineError::PrecisionBudgetExhausted(
                fractalwonder_core::Error::PrecisionBudgetExceeded {
                    requested: required_precision,
                    maximum: max_precision_bits,
                },
            ));
        }
        let viewport = if required_precision > estimate {
            build_viewport(&request, required_precision)?
        } else {
            viewport
        };

        let uses_perturbation = request.algorithm_id != "mandelbrot";

        // First tile of a perturbation frame blocks on the reference
        // orbit; this happens before any worker sees a tile at all, and
        // before `FrameHandle` even exists.
        let orbit = if uses_perturbation {
            let orbit = ReferenceOrbit::compute(&viewport.center, effective_iterations);
            if orbit.orbit.is_empty() {
                return Err(EngineError::ReferenceOrbitFailed(
                    fractalwonder_compute::Error::ReferenceOrbitFailed {
                        reason: "reference orbit produced no points".to_string(),
                    },
                ));
            }
            Some(Arc::new(orbit))
        } else {
            None
        };

        let bla_table = match &orbit {
            Some(orbit) if config.bla_enabled => {
                let dc_max = calculate_dc_max(&viewport);
                is_bla_useful(&dc_max).then(|| Arc::new(BlaTable::build(orbit, dc_max)))
            }
            _ => None,
        };

        let side = tile_side(canvas_size.0, canvas_size.1, viewport.zoom_log2());
        let tiles = generate_tiles(canvas_size.0, canvas_size.1, side);
        let total = tiles.len() as u32;

        let mut inner = self.inner.lock().unwrap();

        let signature = FrameSignature {
            zoom_str: format!("{:.12e}", viewport.zoom_log2()),
            algorithm_id: request.algorithm_id.clone(),
            max_iterations: request.max_iterations,
        };
        if inner.last_signature.as_ref() != Some(&signature) {
            inner.cache.clear();
        }
        inner.last_signature = Some(signature);

        let pool_size = inner.workers.len();
        let old_workers = std::mem::take(&mut inner.workers);
        let recreate_start = std::time::Instant::now();
        for worker in old_workers {
            worker.terminate();
        }
        inner.workers = (0..pool_size).map(|_| ComputeWorker::spawn()).collect();
        log::info!(
            target: "fractalwonder_engine::pool",
            "worker pool recreated ({pool_size} workers) in {:?}",
            recreate_start.elapsed(),
        );

        inner.current_frame_id = inner.current_frame_id.wrapping_add(1);
        let frame_id = inner.current_frame_id;

        let completed = Arc::new(AtomicU32::new(0));
        let done = Arc::new(AtomicBool::new(total == 0));

        for worker in &inner.workers {
            let inner_ref = Arc::clone(&self.inner);
            let completed_cb = Arc::clone(&completed);
            let done_cb = Arc::clone(&done);
            worker.on_result(move |outcome: TileOutcome| {
                let mut inner = inner_ref.lock().unwrap();
                if outcome.frame_id != inner.current_frame_id {
                    return;
                }
                if let Some(reason) = &outcome.failure_reason {
                    log::warn!(
                        target: "fractalwonder_engine::scheduler",
                        "tile ({}, {}) failed: {reason}",
                        outcome.tile.x, outcome.tile.y,
                    );
                } else {
                    log::debug!(
                        target: "fractalwonder_engine::scheduler",
                        "tile ({}, {}) completed",
                        outcome.tile.x, outcome.tile.y,
                    );
                }
                inner.surface.blit(
                    outcome.tile.x,
                    outcome.tile.y,
                    outcome.tile.width,
                    outcome.tile.height,
                    &outcome.rgba8,
                );
                let done_count = completed_cb.fetch_add(1, Ordering::AcqRel) + 1;
                if done_count >= total {
                    done_cb.store(true, Ordering::Release);
                }
            });
        }

        log::info!(
            target: "fractalwonder_engine::scheduler",
            "frame {frame_id} accepted: {total} tiles, algorithm={}",
            request.algorithm_id,
        );

        for (index, tile) in tiles.into_iter().enumerate() {
            let fingerprint = ChunkFingerprint::new(
                tile,
                &viewport,
                canvas_size,
                request.max_iterations,
                &request.algorithm_id,
            );

            if let Some(cached) = inner.cache.get(&fingerprint) {
                inner.surface.blit(
                    cached.bounds.x,
                    cached.bounds.y,
                    cached.bounds.width,
                    cached.bounds.height,
                    &cached.rgba8,
                );
                let done_count = completed.fetch_add(1, Ordering::AcqRel) + 1;
                if done_count >= total {
                    done.store(true, Ordering::Release);
                }
                continue;
            }

            let worker_index = index % inner.workers.len().max(1);
            let viewport = viewport.clone();
            let orbit = orbit.clone();
            let bla_table = bla_table.clone();
            let lighting = inner.lighting.clone();
            let algorithm_id = request.algorithm_id.clone();
            let tau_sq = config.tau_sq;
            let canvas_w = canvas_size.0;
            let canvas_h = canvas_size.1;
            let iterations = effective_iterations;
            let inner_for_cache = Arc::clone(&self.inner);

            inner.workers[worker_index].submit(Box::new(move || {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    let data: Vec<ComputeData> = if let Some(orbit) = &orbit {
                        let delta_origin = viewport.pixel_delta_c(
                            tile.x, tile.y, canvas_w, canvas_h, &viewport.center,
                        );
                        let delta_step = viewport.pixel_step(canvas_w, canvas_h);
                        let input = TileRenderInput {
                            delta_c_origin: delta_origin,
                            delta_c_step: delta_step,
                            tile_width: tile.width,
                            tile_height: tile.height,
                            max_iterations: iterations,
                            tau_sq,
                        };
                        tile_render::render_tile(orbit, bla_table.as_deref(), &input).data
                    } else {
                        mandelbrot::render_tile(
                            &viewport, canvas_w, canvas_h, tile.x, tile.y, tile.width, tile.height,
                            iterations,
                        )
                        .into_iter()
                        .map(ComputeData::Mandelbrot)
                        .collect()
                    };

                    let rgba8 = colorize_tile(&data, &lighting);

                    let fingerprint = ChunkFingerprint::new(
                        tile,
                        &viewport,
                        (canvas_w, canvas_h),
                        iterations,
                        &algorithm_id,
                    );
                    if let Ok(mut cache_inner) = inner_for_cache.lock() {
                        cache_inner.cache.set(fingerprint, ChunkResult::new(tile, rgba8.clone()));
                    }

                    rgba8
                }));

                match outcome {
                    Ok(rgba8) => TileOutcome {
                        frame_id,
                        tile,
                        rgba8,
                        failure_reason: None,
                    },
                    Err(_) => TileOutcome {
                        frame_id,
                        tile,
                        rgba8: diagnostic_tile_buffer(tile),
                        failure_reason: Some("tile compute kernel panicked".to_string()),
                    },
                }
            }));
        }

        drop(inner);

        Ok(FrameHandle {
            completed,
            total,
            done: Arc::clone(&done),
            cancel_action: {
                let inner_ref = Arc::clone(&self.inner);
                let done_ref = Arc::clone(&done);
                Arc::new(move || {
                    let mut inner = inner_ref.lock().unwrap();
                    if inner.current_frame_id != frame_id {
                        return;
                    }
                    log::info!(
                        target: "fractalwonder_engine::scheduler",
                        "frame {frame_id} cancelled"
                    );
                    let size = inner.workers.len();
                    let old = std::mem::take(&mut inner.workers);
                    let recreate_start = std::time::Instant::now();
                    for worker in old {
                        worker.terminate();
                    }
                    inner.workers = (0..size).map(|_| ComputeWorker::spawn()).collect();
                    log::info!(
                        target: "fractalwonder_engine::pool",
                        "worker pool recreated ({size} workers) in {:?} after cancel",
                        recreate_start.elapsed(),
                    );
                    inner.current_frame_id = inner.current_frame_id.wrapping_add(1);
                    done_ref.store(true, Ordering::Release);
                })
            },
        })
    }
}

/// A flat mid-gray tile, painted in place of a tile whose compute kernel
/// panicked, so a failure is visually distinguishable without aborting
/// the rest of the frame.
fn diagnostic_tile_buffer(tile: PixelRect) -> Vec<u8> {
    let mut buf = Vec::with_capacity(tile.area() as usize * 4);
    for _ in 0..tile.area() {
        buf.extend_from_slice(&[96, 96, 96, 255]);
    }
    buf
}

fn build_viewport(request: &FrameRequest, precision_bits: usize) -> Result<Viewport, EngineError> {
    let parse = |s: &str| {
        BigFloat::from_string(s, precision_bits).map_err(|reason| EngineError::InvalidRequest { reason })
    };
    let center_x = parse(&request.center_x)?;
    let center_y = parse(&request.center_y)?;
    let zoom = parse(&request.zoom)?;

    let four = BigFloat::with_precision(4.0, precision_bits);
    let width = four.div(&zoom);
    let aspect = request.canvas_width as f64 / request.canvas_height.max(1) as f64;
    let height = width.div(&BigFloat::with_precision(aspect, precision_bits));

    Ok(Viewport::with_bigfloat(center_x, center_y, width, height))
}

/// Rough precision estimate from the zoom string's order of magnitude, used
/// only to parse the request's decimal strings with enough bits to derive
/// an accurate required-precision estimate; the viewport may be rebuilt at
/// a higher precision afterward if that estimate says so.
fn estimate_initial_precision(zoom_str: &str, max_precision_bits: usize) -> usize {
    let zoom_log10 = zoom_str
        .parse::<f64>()
        .ok()
        .filter(|z| z.is_finite() && *z > 0.0)
        .map(|z| z.log10())
        .or_else(|| extract_exponent(zoom_str))
        .unwrap_or(0.0)
        .max(0.0);

    let bits = (zoom_log10 * std::f64::consts::LOG2_10 + 128.0).ceil().max(128.0) as usize;
    bits.min(max_precision_bits.max(128))
}

fn extract_exponent(s: &str) -> Option<f64> {
    let lower = s.to_ascii_lowercase();
    let idx = lower.find('e')?;
    lower[idx + 1..].parse::<f64>().ok()
}
