#![deny(unsafe_code)]
//! Layered watercolor wash engine.
//!
//! Each ink event deposits a dab built from concentric organic rings
//! (outermost widest and faintest, innermost drawn last so it sits on
//! top), followed by pigment and paper grain, a darker drying fringe near
//! the outer radius, occasional wet highlights, and chance-gated drips.
//! All passes except highlights draw in multiply blend so overlapping dabs
//! deepen rather than overwrite each other.
//!
//! The dab size comes from the shared ink accumulation machine: dwelling
//! or revisiting grows a puddle, jumping or pausing starts a fresh one.

#[cfg(feature = "stamp")]
pub mod stamp;

use ink_engine_core::engine::{is_boundary, Engine, InitOptions};
use ink_engine_core::params::{param_bool, param_f64, param_usize};
use ink_engine_core::{
    color, organic_polygon, BlendMode, Clock, EngineError, InkParams, InkState, LayerBuffer,
    NoiseField, Rgb8, ShapeSpec, Surface, Xorshift64,
};
use serde_json::Value;

/// Style identifier this engine registers under.
pub const STYLE: &str = "wash";

/// Ring radius growth per wash layer.
const RING_GROWTH: f64 = 0.18;
/// Radius multiplier for the fringe ring.
const FRINGE_RADIUS: f64 = 1.12;
/// Channel scale for the fringe color.
const FRINGE_DARKEN: f64 = 0.85;
/// Grain never lands farther than this multiple of the outer radius.
const GRAIN_EXTENT: f64 = 1.5;
/// Smallest dab radius worth rasterizing.
const MIN_BRUSH: f64 = 2.0;

/// Tuning constants for the wash engine, immutable per instance.
#[derive(Debug, Clone, Copy)]
pub struct WashParams {
    /// Concentric wash rings per dab.
    pub layers: usize,
    /// Initial vertices of each ring polygon.
    pub shape_vertices: usize,
    /// Midpoint subdivision iterations per ring.
    pub subdivide_iterations: usize,
    /// Displacement scale as a fraction of the ring radius.
    pub displacement_factor: f64,
    /// Vertical squash applied to rings.
    pub squash: f64,
    /// Coordinate scale of the deformation noise.
    pub noise_scale: f64,
    /// Grain dot density per unit of dab area.
    pub grain_density: f64,
    /// Probability of the highlight pass per dab.
    pub highlight_chance: f64,
    /// Probability of a drip per dab.
    pub drip_chance: f64,
    /// Hue jitter per pass, degrees.
    pub hue_jitter: f64,
    /// Lightness jitter per pass (OKLCh L units).
    pub lightness_jitter: f64,
    /// Request the pre-rendered stamp fast path at init.
    pub textured_brush: bool,
    /// Accumulation machine tuning.
    pub ink: InkParams,
}

impl Default for WashParams {
    fn default() -> Self {
        Self {
            layers: 4,
            shape_vertices: 18,
            subdivide_iterations: 3,
            displacement_factor: 0.28,
            squash: 0.75,
            noise_scale: 0.02,
            grain_density: 0.6,
            highlight_chance: 0.45,
            drip_chance: 0.25,
            hue_jitter: 5.0,
            lightness_jitter: 0.04,
            textured_brush: false,
            ink: InkParams::default(),
        }
    }
}

impl WashParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            layers: param_usize(params, "layers", d.layers),
            shape_vertices: param_usize(params, "shape_vertices", d.shape_vertices),
            subdivide_iterations: param_usize(
                params,
                "subdivide_iterations",
                d.subdivide_iterations,
            ),
            displacement_factor: param_f64(params, "displacement_factor", d.displacement_factor),
            squash: param_f64(params, "squash", d.squash),
            noise_scale: param_f64(params, "noise_scale", d.noise_scale),
            grain_density: param_f64(params, "grain_density", d.grain_density),
            highlight_chance: param_f64(params, "highlight_chance", d.highlight_chance),
            drip_chance: param_f64(params, "drip_chance", d.drip_chance),
            hue_jitter: param_f64(params, "hue_jitter", d.hue_jitter),
            lightness_jitter: param_f64(params, "lightness_jitter", d.lightness_jitter),
            textured_brush: param_bool(params, "textured_brush", d.textured_brush),
            ink: InkParams::default(),
        }
    }

    fn shape_spec(&self) -> ShapeSpec {
        ShapeSpec {
            vertex_count: self.shape_vertices,
            iterations: self.subdivide_iterations,
            displacement_factor: self.displacement_factor,
            squash: self.squash,
        }
    }
}

/// Rendering strategy resolved once at `init`.
#[derive(Debug)]
enum BrushPath {
    /// The built-in organic polygon pipeline.
    Organic,
    /// Pre-rendered stamp fast path.
    #[cfg(feature = "stamp")]
    Stamp(stamp::StampBrush),
}

/// Layered watercolor wash engine. One instance per registered style slot.
pub struct WashEngine {
    params: WashParams,
    buffer: Option<LayerBuffer>,
    state: InkState,
    rng: Xorshift64,
    noise: NoiseField,
    clock: Clock,
    brush: BrushPath,
}

impl WashEngine {
    /// Creates an engine with the given seed and tuning. The buffer is
    /// allocated later by `init`.
    pub fn new(seed: u64, params: WashParams) -> Self {
        let noise = NoiseField::new(seed as u32, params.noise_scale);
        Self {
            params,
            buffer: None,
            state: InkState::new(),
            rng: Xorshift64::new(seed),
            noise,
            clock: Clock::start(),
            brush: BrushPath::Organic,
        }
    }

    /// Creates an engine from a JSON params object.
    pub fn from_json(seed: u64, params: &Value) -> Self {
        Self::new(seed, WashParams::from_json(params))
    }

    /// Read-only view of the accumulation state, for drivers and tests.
    pub fn ink_state(&self) -> &InkState {
        &self.state
    }

    /// Resolves the brush strategy requested by the params.
    ///
    /// The stamp path is only available when compiled in; otherwise the
    /// request falls back to the organic pipeline transparently.
    fn resolve_brush(&mut self) {
        self.brush = if self.params.textured_brush {
            #[cfg(feature = "stamp")]
            {
                BrushPath::Stamp(stamp::StampBrush::new(&mut self.rng))
            }
            #[cfg(not(feature = "stamp"))]
            {
                tracing::debug!(style = STYLE, "stamp brush unavailable, using organic pipeline");
                BrushPath::Organic
            }
        } else {
            BrushPath::Organic
        };
    }

    fn render_dab(&mut self, x: f64, y: f64, color: Rgb8) -> Result<(), EngineError> {
        let brush = self.state.brush_size(&mut self.rng).max(MIN_BRUSH);
        let accum = self.state.accum_alpha();
        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| EngineError::Uninitialized(STYLE.to_string()))?;

        #[cfg(feature = "stamp")]
        if let BrushPath::Stamp(stamp_brush) = &self.brush {
            buffer.set_blend_mode(BlendMode::Multiply);
            let alpha = (self.params.ink.alpha_min + accum).min(255.0) as u8;
            stamp_brush.paint(buffer, x, y, brush, color, alpha);
            return Ok(());
        }

        buffer.set_blend_mode(BlendMode::Multiply);

        let spec = self.params.shape_spec();
        let center = glam::DVec2::new(x, y);
        let mut outer_radius: f64 = 0.0;

        // Wash rings, outermost first so the innermost sits on top.
        for layer in (1..=self.params.layers).rev() {
            let radius = brush * (1.0 + layer as f64 * RING_GROWTH);
            outer_radius = outer_radius.max(radius);
            let t = layer as f64 / self.params.layers as f64;
            let base = self.params.ink.alpha_min
                + (self.params.ink.alpha_max - self.params.ink.alpha_min) * (1.0 - t);
            let alpha = ((base * (0.8 + (1.0 - t) * 0.6)) + accum * (1.0 - t)).min(255.0) as u8;
            let jittered = color::jitter(
                color,
                &mut self.rng,
                self.params.hue_jitter,
                self.params.lightness_jitter,
            );
            match organic_polygon(center, radius, &spec, layer, &self.noise, &mut self.rng) {
                Ok(poly) => buffer.fill_polygon(&poly, jittered, alpha),
                // A degenerate ring skips its pass; the rest of the dab
                // still renders.
                Err(EngineError::InvalidGeometry(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        self.render_grain(x, y, outer_radius, color);
        self.render_fringe(x, y, outer_radius, color);
        self.render_highlights(x, y, brush);
        if self.rng.chance(self.params.drip_chance) {
            self.render_drip(x, y, brush, color);
        }
        Ok(())
    }

    /// Pigment grain (denser, inside the dab) then paper grain (sparser,
    /// slightly wider), both as tiny Gaussian-clustered dots.
    fn render_grain(&mut self, cx: f64, cy: f64, outer_radius: f64, color: Rgb8) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let area = std::f64::consts::PI * outer_radius * outer_radius;
        let density = if self.params.grain_density > 1.0 {
            self.params.grain_density * 0.01
        } else {
            self.params.grain_density
        };

        let pigment_count = ((area * density * 0.1).max(50.0)) as usize;
        for _ in 0..pigment_count {
            let r = (self.rng.next_gaussian().abs() * outer_radius * 0.5)
                .min(outer_radius * GRAIN_EXTENT);
            let theta = self.rng.next_range(0.0, std::f64::consts::TAU);
            let gx = cx + theta.cos() * r;
            let gy = cy + theta.sin() * r * 0.85;
            let size = self.rng.next_range(0.4, 1.6);
            let alpha = self.rng.next_range(4.0, 14.0) as u8;
            let dot = color::jitter(color.darken(0.92), &mut self.rng, 2.0, 0.03);
            buffer.fill_ellipse(gx, gy, size * 0.5, size * 0.5, dot, alpha);
        }

        let paper_count = ((area * density * 0.05).max(40.0)) as usize;
        for _ in 0..paper_count {
            let r = (self.rng.next_gaussian().abs() * outer_radius * 0.6)
                .min(outer_radius * GRAIN_EXTENT);
            let theta = self.rng.next_range(0.0, std::f64::consts::TAU);
            let gx = cx + theta.cos() * r;
            let gy = cy + theta.sin() * r * 0.9;
            let size = self.rng.next_range(1.0, 2.0);
            let alpha = self.rng.next_range(2.0, 10.0) as u8;
            buffer.fill_ellipse(gx, gy, size * 0.5, size * 0.5, color, alpha);
        }
    }

    /// A thin, noise-perturbed darker ring near the outer radius,
    /// emulating pigment accumulating at a drying edge.
    fn render_fringe(&mut self, cx: f64, cy: f64, outer_radius: f64, color: Rgb8) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        if outer_radius <= 0.0 {
            return;
        }
        let ring_radius = outer_radius * FRINGE_RADIUS;
        let fringe_color = color.darken(FRINGE_DARKEN);
        let alpha = (self.params.ink.alpha_max * 0.9).min(255.0) as u8;

        let mut ring = Vec::with_capacity(self.params.shape_vertices);
        for i in 0..self.params.shape_vertices {
            let ang = std::f64::consts::TAU * i as f64 / self.params.shape_vertices as f64;
            let n = self.noise.sample(cx + ang.cos() * 8.5, cy + ang.sin() * 8.5, 0.0);
            let radial = (n * 2.0 - 1.0) * outer_radius * 0.05;
            let r = ring_radius + radial;
            ring.push(glam::DVec2::new(
                cx + ang.cos() * r,
                cy + ang.sin() * r * 0.9,
            ));
        }
        let thickness = self.rng.next_range(0.5, 2.0);
        buffer.stroke_polyline(&ring, thickness, fringe_color, alpha, true);
    }

    /// A handful of small near-white ellipses near the center, suggesting
    /// wet specular response. Drawn in source-over: white is the multiply
    /// identity and would vanish otherwise.
    fn render_highlights(&mut self, cx: f64, cy: f64, brush: f64) {
        if !self.rng.chance(self.params.highlight_chance) {
            return;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        buffer.set_blend_mode(BlendMode::SourceOver);
        let count = 2 + self.rng.next_usize(5);
        for _ in 0..count {
            let hx = cx + self.rng.next_gaussian() * brush * 0.15;
            let hy = cy + self.rng.next_gaussian() * brush * 0.12;
            let w = self.rng.next_range(brush * 0.06, brush * 0.18).max(0.5);
            let h = (w * self.rng.next_range(0.3, 0.7)).max(0.4);
            let angle = self.rng.next_range(-0.52, 0.52);
            let alpha = self.rng.next_range(6.0, 18.0) as u8;
            buffer.fill_ellipse_rot(hx, hy, w, h, angle, Rgb8::new(252, 252, 250), alpha);
        }
        buffer.set_blend_mode(BlendMode::Multiply);
    }

    /// A falling chain of shrinking, fading ellipses with noise-wobbled x.
    fn render_drip(&mut self, x: f64, y: f64, brush: f64, color: Rgb8) {
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let drip_len = self.rng.next_range(20.0, 100.0);
        let steps = 20;
        let radius = brush * self.rng.next_range(0.1, 0.3);
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            let wobble = self.noise.sample(x, y + i as f64 * 5.0, 0.3) * 10.0 - 5.0;
            let px = x + wobble;
            let py = y + t * drip_len;
            let r = (radius * (1.0 - t * 0.5)).max(0.3);
            let alpha = (30.0 * (1.0 - t)) as u8;
            buffer.fill_ellipse(px, py, r, r, color, alpha);
        }
    }
}

impl Engine for WashEngine {
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
        self.resolve_brush();
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
        self.render_dab(x, y, color)
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
