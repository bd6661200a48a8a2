#![deny(unsafe_code)]
//! Droplet-stream watercolor engine.
//!
//! Where the wash engine fills solid organic contours, this engine builds
//! a dab from thousands of tiny, very-low-alpha droplets: most travel
//! outward along radial streams, the rest scatter as a Gaussian cloud
//! around the center, and a final grain pass settles pigment inside the
//! spread. Slow nozzle motion widens the spread and lengthens the streams,
//! so lingering reads as soaking into the paper.

use ink_engine_core::engine::{is_boundary, Engine, InitOptions};
use ink_engine_core::params::{param_f64, param_usize};
use ink_engine_core::{
    color, BlendMode, Clock, EngineError, InkParams, InkState, LayerBuffer, Rgb8, Surface,
    Xorshift64,
};
use serde_json::Value;

/// Style identifier this engine registers under.
pub const STYLE: &str = "droplet";

/// Speed (surface units per ms) at which spread stops widening.
const SPREAD_SPEED_REF: f64 = 0.6;
/// Fraction of droplets allocated to radial streams.
const STREAM_FRACTION: f64 = 0.78;
/// Probability of hue-jittering an individual stream droplet.
const STREAM_JITTER_CHANCE: f64 = 0.12;
/// Probability of hue-jittering a background droplet.
const SCATTER_JITTER_CHANCE: f64 = 0.06;

/// Tuning constants for the droplet engine, immutable per instance.
#[derive(Debug, Clone, Copy)]
pub struct DropletParams {
    /// Base Gaussian spread of the droplet cloud.
    pub spread_sigma: f64,
    /// Droplet budget for the smallest dabs.
    pub min_droplets: usize,
    /// Droplet budget for the largest dabs.
    pub max_droplets: usize,
    /// Grain dot density per unit of dab area.
    pub grain_density: f64,
    /// Accumulation machine tuning.
    pub ink: InkParams,
}

impl Default for DropletParams {
    fn default() -> Self {
        Self {
            spread_sigma: 28.0,
            min_droplets: 300,
            max_droplets: 1600,
            grain_density: 0.6,
            ink: InkParams::default(),
        }
    }
}

impl DropletParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            spread_sigma: param_f64(params, "spread_sigma", d.spread_sigma),
            min_droplets: param_usize(params, "min_droplets", d.min_droplets),
            max_droplets: param_usize(params, "max_droplets", d.max_droplets),
            grain_density: param_f64(params, "grain_density", d.grain_density),
            ink: InkParams::default(),
        }
    }
}

/// Droplet-stream watercolor engine.
pub struct DropletEngine {
    params: DropletParams,
    buffer: Option<LayerBuffer>,
    state: InkState,
    rng: Xorshift64,
    clock: Clock,
}

impl DropletEngine {
    pub fn new(seed: u64, params: DropletParams) -> Self {
        Self {
            params,
            buffer: None,
            state: InkState::new(),
            rng: Xorshift64::new(seed),
            clock: Clock::start(),
        }
    }

    /// Creates an engine from a JSON params object.
    pub fn from_json(seed: u64, params: &Value) -> Self {
        Self::new(seed, DropletParams::from_json(params))
    }

    /// Read-only view of the accumulation state, for drivers and tests.
    pub fn ink_state(&self) -> &InkState {
        &self.state
    }

    /// Maps a brush size in [8, 400] linearly into [lo, hi].
    fn scale_by_brush(brush: f64, lo: f64, hi: f64) -> f64 {
        let t = ((brush - 8.0) / (400.0 - 8.0)).clamp(0.0, 1.0);
        lo + t * (hi - lo)
    }

    fn render_dab(&mut self, x: f64, y: f64, color: Rgb8) {
        let brush = self.state.brush_size(&mut self.rng).max(4.0);
        let speed_norm = (self.state.last_speed() / SPREAD_SPEED_REF).clamp(0.0, 1.0);
        let spread = self.params.spread_sigma * (1.0 + (1.0 - speed_norm) * 1.2);

        let total = Self::scale_by_brush(
            brush,
            self.params.min_droplets as f64,
            self.params.max_droplets as f64,
        ) as usize;
        let stream_budget = (total as f64 * STREAM_FRACTION) as usize;
        let scatter_budget = (total - stream_budget).max(40);
        let stream_count = Self::scale_by_brush(brush, 12.0, 80.0) as usize;
        let per_stream = (stream_budget / stream_count.max(1)).max(6);

        if let Some(buffer) = self.buffer.as_mut() {
            buffer.set_blend_mode(BlendMode::Multiply);
        }

        for _ in 0..stream_count {
            let ang = self.rng.next_range(0.0, std::f64::consts::TAU);
            let origin_offset = self.rng.next_gaussian() * brush * 0.12;
            let ox = x + (ang + std::f64::consts::FRAC_PI_2).cos() * origin_offset;
            let oy = y + (ang + std::f64::consts::FRAC_PI_2).sin() * origin_offset;
            let len = self.rng.next_range(brush * 0.6, brush * 2.0)
                * (1.0 + (1.0 - speed_norm) * 0.9);

            for k in 0..per_stream {
                let t = (k as f64 / per_stream as f64 + self.rng.next_range(-0.06, 0.06))
                    .clamp(0.0, 1.0);
                let along = t * len + self.rng.next_range(-len * 0.06, len * 0.06);
                let mut px = ox + ang.cos() * along;
                let mut py = oy + ang.sin() * along;
                px += self.rng.next_gaussian() * spread * 0.16;
                py += self.rng.next_gaussian() * spread * 0.12;

                let size = self.rng.next_range(0.3, 1.4);
                let alpha = self.rng.next_range(1.0, 5.0) as u8;
                let col = if self.rng.chance(STREAM_JITTER_CHANCE) {
                    color::jitter(color, &mut self.rng, 3.0, 0.03)
                } else {
                    color
                };
                if let Some(buffer) = self.buffer.as_mut() {
                    buffer.fill_ellipse(px, py, size, size, col, alpha);
                }
            }
        }

        for _ in 0..scatter_budget {
            let px = x + self.rng.next_gaussian() * spread;
            let py = y + self.rng.next_gaussian() * spread * 0.7;
            let size = self.rng.next_range(0.25, 1.1);
            let alpha = self.rng.next_range(1.0, 5.0) as u8;
            let col = if self.rng.chance(SCATTER_JITTER_CHANCE) {
                color::jitter(color, &mut self.rng, 2.0, 0.02)
            } else {
                color
            };
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.fill_ellipse(px, py, size, size, col, alpha);
            }
        }

        self.render_grain(x, y, spread * 0.9, color);
    }

    /// Pigment settling then paper tooth, as Gaussian-clustered dots.
    fn render_grain(&mut self, cx: f64, cy: f64, outer_radius: f64, color: Rgb8) {
        let area = std::f64::consts::PI * outer_radius * outer_radius;
        let density = if self.params.grain_density > 1.0 {
            self.params.grain_density * 0.01
        } else {
            self.params.grain_density
        };

        let pigment_count = ((area * density * 0.1).max(50.0)) as usize;
        for _ in 0..pigment_count {
            let r = self.rng.next_gaussian().abs() * outer_radius * 0.5;
            let theta = self.rng.next_range(0.0, std::f64::consts::TAU);
            let size = self.rng.next_range(0.4, 1.6);
            let alpha = self.rng.next_range(4.0, 14.0) as u8;
            let dot = color::jitter(color, &mut self.rng, 0.0, 0.04);
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.fill_ellipse(
                    cx + theta.cos() * r,
                    cy + theta.sin() * r * 0.85,
                    size * 0.5,
                    size * 0.5,
                    dot,
                    alpha,
                );
            }
        }

        let paper_count = ((area * density * 0.05).max(40.0)) as usize;
        for _ in 0..paper_count {
            let r = self.rng.next_gaussian().abs() * outer_radius * 0.6;
            let theta = self.rng.next_range(0.0, std::f64::consts::TAU);
            let size = self.rng.next_range(1.0, 2.0);
            let alpha = self.rng.next_range(2.0, 10.0) as u8;
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.fill_ellipse(
                    cx + theta.cos() * r,
                    cy + theta.sin() * r * 0.9,
                    size * 0.5,
                    size * 0.5,
                    color,
                    alpha,
                );
            }
        }
    }
}

impl Engine for DropletEngine {
    fn init(&mut self, opts: &InitOptions) -> Result<(), EngineError> {
        let needs_new = match &self.buffer {
            Some(buf) => buf.width() != opts.width || buf.height() != opts.height,
            None => true,
        };
        if needs_new {
            self.buffer = Some(LayerBuffer::new(opts.width, opts.height)?);
        } else if opts.force_clear {
            if let Some(buf) = self.buffer.as_mut() {
                buf.clear();
            }
        }
        self.state.reset();
        Ok(())
    }

    fn execute(
        &mut self,
        symbol: Option<&str>,
        x: f64,
        y: f64,
        color: Rgb8,
    ) -> Result<(), EngineError> {
        if self.buffer.is_none() {
            return Err(EngineError::Uninitialized(STYLE.to_string()));
        }
        if is_boundary(symbol) {
            self.state.reset();
            return Ok(());
        }
        if !x.is_finite() || !y.is_finite() {
            return Err(EngineError::InvalidGeometry(format!(
                "ink event at non-finite position ({x}, {y})"
            )));
        }
        let now = self.clock.now_ms();
        self.state.observe(x, y, now, &mut self.rng, &self.params.ink);
        self.render_dab(x, y, color);
        Ok(())
    }

    fn compose(&self, target: &mut Surface) -> Result<(), EngineError> {
        match &self.buffer {
            Some(buf) => target.blit(buf),
            None => Err(EngineError::Uninitialized(STYLE.to_string())),
        }
    }

    fn dispose(&mut self) {
        self.buffer = None;
        self.state.reset();
    }

    fn buffer(&self) -> Option<&LayerBuffer> {
        self.buffer.as_ref()
    }

    fn buffer_mut(&mut self) -> Option<&mut LayerBuffer> {
        self.buffer.as_mut()
    }
}
