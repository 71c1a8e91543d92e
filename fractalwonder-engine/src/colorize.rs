//! Default colorizer: smooth iteration count mapped through a palette,
//! combined with Blinn-Phong slope shading.
//!
//! Grounded in the teacher's `rendering::colorizers` module family
//! (`smooth_iteration.rs`, `shading.rs`, `lighting_params.rs`,
//! `mandelbrot.rs`'s glitch-cyan convention), adapted two ways: true smooth
//! iteration is now possible because `MandelbrotData::final_z_norm_sq` is
//! always populated (the teacher's own comment notes this was deferred),
//! and the surface normal is read directly from the kernel-computed
//! `surface_normal_re`/`surface_normal_im` fields rather than reconstructed
//! from raw z/derivative components — per-component reconstruction is the
//! normal-clamping defect the compute kernel already avoids.

use fractalwonder_core::{ComputeData, MandelbrotData};
use serde::{Deserialize, Serialize};

/// Blinn-Phong lighting parameters, identical in shape and defaults to the
/// teacher's `LightingParams`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightingParams {
    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,
    pub strength: f64,
    pub azimuth: f64,
    pub elevation: f64,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            ambient: 0.75,
            diffuse: 0.5,
            specular: 0.9,
            shininess: 64.0,
            strength: 1.5,
            azimuth: -std::f64::consts::FRAC_PI_2,
            elevation: std::f64::consts::FRAC_PI_4,
        }
    }
}

fn light_direction(azimuth: f64, elevation: f64) -> (f64, f64, f64) {
    let cos_elev = elevation.cos();
    (
        azimuth.cos() * cos_elev,
        azimuth.sin() * cos_elev,
        elevation.sin(),
    )
}

fn blinn_phong(normal: (f64, f64, f64), light: (f64, f64, f64), params: &LightingParams) -> f64 {
    let (nx, ny, nz) = normal;
    let (lx, ly, lz) = light;

    let n_dot_l = (nx * lx + ny * ly + nz * lz).max(0.0);

    let vz = 1.0;
    let (hx, hy, hz) = (lx, ly, lz + vz);
    let h_len = (hx * hx + hy * hy + hz * hz).sqrt();
    let (hx, hy, hz) = (hx / h_len, hy / h_len, hz / h_len);

    let n_dot_h = (nx * hx + ny * hy + nz * hz).max(0.0);
    let specular = n_dot_h.powf(params.shininess);

    params.ambient + params.diffuse * n_dot_l + params.specular * specular
}

fn apply_shade(base: [u8; 4], shade: f64) -> [u8; 4] {
    let shade = shade.clamp(0.0, 2.0);
    let apply = |c: u8| -> u8 { (c as f64 * shade).clamp(0.0, 255.0) as u8 };
    [apply(base[0]), apply(base[1]), apply(base[2]), base[3]]
}

/// Smooth (fractional) iteration count, normalized to `[0, 1]`.
///
/// `ESCAPE_RADIUS_SQ` must match the kernel's own escape test so the
/// fractional part is continuous across the escape boundary.
fn smooth_t(data: &MandelbrotData) -> f64 {
    if !data.escaped || data.max_iterations == 0 {
        return 0.0;
    }
    const ESCAPE_RADIUS_SQ: f32 = 1e8;
    let log_zn = (data.final_z_norm_sq.max(1.0) as f64).ln() / 2.0;
    let nu = (log_zn / (ESCAPE_RADIUS_SQ as f64).ln()).ln() / std::f64::consts::LN_2;
    let smooth_iter = data.iterations as f64 + 1.0 - nu;
    (smooth_iter / data.max_iterations as f64).clamp(0.0, 1.0)
}

/// A minimal default blue/white smooth gradient. Artistic palette editing
/// is out of scope; this single fixed gradient is the baseline look.
fn sample_default_palette(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let stops: [(f64, [u8; 3]); 4] = [
        (0.0, [0, 7, 40]),
        (0.35, [10, 60, 140]),
        (0.7, [160, 210, 250]),
        (1.0, [255, 255, 255]),
    ];
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let local = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * local) as u8;
            return [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])];
        }
    }
    stops[3].1
}

/// Colorize one pixel's compute result into an RGBA8 color.
pub fn colorize_pixel(data: &ComputeData, lighting: &LightingParams) -> [u8; 4] {
    let m = match data {
        ComputeData::Mandelbrot(m) => m,
        ComputeData::TestImage(_) => return [128, 128, 128, 255],
    };

    if m.glitched {
        if m.max_iterations == 0 {
            return [0, 255, 255, 255];
        }
        let normalized = m.iterations as f64 / m.max_iterations as f64;
        let brightness = (64.0 + normalized * 191.0) as u8;
        return [0, brightness, brightness, 255];
    }

    if !m.escaped {
        return [0, 0, 0, 255];
    }

    let t = smooth_t(m);
    let [r, g, b] = sample_default_palette(t);
    let base = [r, g, b, 255];

    let normal_len_sq = (m.surface_normal_re * m.surface_normal_re
        + m.surface_normal_im * m.surface_normal_im) as f64;
    if normal_len_sq < 1e-12 {
        return base;
    }

    let nx = m.surface_normal_re as f64;
    let ny = m.surface_normal_im as f64;
    let n_len = (nx * nx + ny * ny + 1.0).sqrt();
    let normal = (nx / n_len, ny / n_len, 1.0 / n_len);

    let light = light_direction(lighting.azimuth, lighting.elevation);
    let raw_shade = blinn_phong(normal, light, lighting);

    let log_normalized_iter = if m.max_iterations > 1 && m.iterations > 0 {
        (m.iterations as f64 + 1.0).ln() / (m.max_iterations as f64 + 1.0).ln()
    } else {
        0.0
    };
    let distance_factor = 1.0 - log_normalized_iter;
    let shade = 1.0 + (raw_shade - 1.0) * lighting.strength * distance_factor;

    apply_shade(base, shade)
}

/// Colorize a whole tile's compute results into a row-major RGBA8 buffer.
pub fn colorize_tile(data: &[ComputeData], lighting: &LightingParams) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() * 4);
    for pixel in data {
        buf.extend_from_slice(&colorize_pixel(pixel, lighting));
    }
    buf
}
