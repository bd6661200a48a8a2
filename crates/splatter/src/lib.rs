#![deny(unsafe_code)]
//! Speed-driven splatter engine.
//!
//! Each ink event throws a burst of opaque-ish splats around the nozzle;
//! the faster the nozzle travels, the more splats and the wider they fly.
//! Fast segments additionally leave a trail of smaller connecting bursts
//! interpolated along the travel path, so quick jumps read as flung paint
//! rather than disconnected blobs.

use ink_engine_core::engine::{is_boundary, Engine, InitOptions};
use ink_engine_core::params::{param_f64, param_usize};
use ink_engine_core::{
    BlendMode, Clock, EngineError, InkParams, InkState, LayerBuffer, Rgb8, Surface, Xorshift64,
};
use serde_json::Value;

/// Style identifier this engine registers under.
pub const STYLE: &str = "splatter";

/// Speed above which connecting bursts appear along the travel path.
const TRAIL_SPEED: f64 = 0.5;
/// Distance between connecting bursts along a fast segment.
const TRAIL_SPACING: f64 = 10.0;
/// Upper bound on connecting bursts per segment.
const TRAIL_CAP: usize = 48;

/// Tuning constants for the splatter engine, immutable per instance.
#[derive(Debug, Clone, Copy)]
pub struct SplatterParams {
    /// Splats per event at rest.
    pub count_base: usize,
    /// Extra splats per unit of normalized speed.
    pub count_speed_factor: f64,
    /// Scatter radius at rest.
    pub spread_base: f64,
    /// Extra scatter radius per unit of normalized speed.
    pub spread_speed_factor: f64,
    /// Smallest splat diameter.
    pub size_min: f64,
    /// Largest splat diameter.
    pub size_max: f64,
    /// Per-channel color variation, plus or minus.
    pub color_variation: f64,
    /// Accumulation machine tuning (drives boundary reset and speed).
    pub ink: InkParams,
}

impl Default for SplatterParams {
    fn default() -> Self {
        Self {
            count_base: 100,
            count_speed_factor: 200.0,
            spread_base: 60.0,
            spread_speed_factor: 100.0,
            size_min: 5.0,
            size_max: 50.0,
            color_variation: 15.0,
            ink: InkParams::default(),
        }
    }
}

impl SplatterParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            count_base: param_usize(params, "count_base", d.count_base),
            count_speed_factor: param_f64(params, "count_speed_factor", d.count_speed_factor),
            spread_base: param_f64(params, "spread_base", d.spread_base),
            spread_speed_factor: param_f64(params, "spread_speed_factor", d.spread_speed_factor),
            size_min: param_f64(params, "size_min", d.size_min),
            size_max: param_f64(params, "size_max", d.size_max),
            color_variation: param_f64(params, "color_variation", d.color_variation),
            ink: InkParams::default(),
        }
    }
}

/// Speed-driven splatter engine.
pub struct SplatterEngine {
    params: SplatterParams,
    buffer: Option<LayerBuffer>,
    state: InkState,
    rng: Xorshift64,
    clock: Clock,
}

impl SplatterEngine {
    pub fn new(seed: u64, params: SplatterParams) -> Self {
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
        Self::new(seed, SplatterParams::from_json(params))
    }

    /// Read-only view of the accumulation state, for drivers and tests.
    pub fn ink_state(&self) -> &InkState {
        &self.state
    }

    /// Shifts each channel by up to `color_variation` either way.
    fn vary_color(&mut self, color: Rgb8) -> Rgb8 {
        let v = self.params.color_variation;
        let shift = |c: u8, rng: &mut Xorshift64| -> u8 {
            (c as f64 + rng.next_range(-v, v)).clamp(0.0, 255.0) as u8
        };
        Rgb8::new(
            shift(color.r, &mut self.rng),
            shift(color.g, &mut self.rng),
            shift(color.b, &mut self.rng),
        )
    }

    fn burst(&mut self, cx: f64, cy: f64, color: Rgb8, count: usize, spread: f64) {
        for _ in 0..count {
            let ang = self.rng.next_range(0.0, std::f64::consts::TAU);
            let radius = self.rng.next_range(0.0, spread);
            let sx = cx + ang.cos() * radius;
            let sy = cy + ang.sin() * radius;
            let size = self.rng.next_range(self.params.size_min, self.params.size_max);
            let col = self.vary_color(color);
            let alpha = self.rng.next_range(100.0, 255.0) as u8;
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.fill_ellipse(sx, sy, size * 0.5, size * 0.5, col, alpha);
            }
        }
    }
}

impl Engine for SplatterEngine {
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

        let previous = self.state.last();
        let now = self.clock.now_ms();
        self.state.observe(x, y, now, &mut self.rng, &self.params.ink);

        let speed_norm = self.state.last_speed().clamp(0.0, 2.0);
        let count =
            self.params.count_base + (speed_norm * self.params.count_speed_factor) as usize;
        let spread = self.params.spread_base + speed_norm * self.params.spread_speed_factor;

        if let Some(buffer) = self.buffer.as_mut() {
            buffer.set_blend_mode(BlendMode::SourceOver);
        }
        self.burst(x, y, color, count, spread);

        // Flung-paint trail between distant, fast events.
        if let Some(prev) = previous {
            let dist = ((x - prev.x).powi(2) + (y - prev.y).powi(2)).sqrt();
            if dist > TRAIL_SPACING && speed_norm > TRAIL_SPEED {
                let steps = ((dist / TRAIL_SPACING) as usize).min(TRAIL_CAP);
                for i in 1..steps {
                    let t = i as f64 / steps as f64;
                    let ix = prev.x + t * (x - prev.x);
                    let iy = prev.y + t * (y - prev.y);
                    let mini_count = (count as f64 * 0.3) as usize;
                    self.burst(ix, iy, color, mini_count, spread * 0.5);
                }
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn init_engine() -> SplatterEngine {
        let mut engine = SplatterEngine::new(42, SplatterParams::default());
        engine.init(&InitOptions::new(256, 256)).unwrap();
        engine
    }

    fn yellow() -> Rgb8 {
        Rgb8::new(230, 190, 40)
    }

    #[test]
    fn execute_before_init_is_an_error() {
        let mut engine = SplatterEngine::new(1, SplatterParams::default());
        assert!(matches!(
            engine.execute(Some("A"), 10.0, 10.0, yellow()),
            Err(EngineError::Uninitialized(_))
        ));
    }

    #[test]
    fn a_burst_paints_many_pixels() {
        let mut engine = init_engine();
        engine.execute(Some("A"), 128.0, 128.0, yellow()).unwrap();
        let painted = engine
            .buffer()
            .unwrap()
            .data()
            .chunks_exact(4)
            .filter(|px| px[3] != 0)
            .count();
        assert!(painted > 500, "burst painted only {painted} pixels");
    }

    #[test]
    fn boundary_symbol_resets_state_without_drawing() {
        let mut engine = init_engine();
        engine.execute(Some("A"), 100.0, 100.0, yellow()).unwrap();
        let checksum = engine.buffer().unwrap().checksum();
        engine.execute(None, 0.0, 0.0, yellow()).unwrap();
        assert!(engine.ink_state().last().is_none());
        assert_eq!(engine.buffer().unwrap().checksum(), checksum);
    }

    #[test]
    fn vary_color_stays_within_channel_range() {
        let mut engine = init_engine();
        for _ in 0..200 {
            let c = engine.vary_color(Rgb8::new(250, 5, 128));
            // clamp keeps all channels valid u8 by construction; check the
            // variation stays near the base where no clamping applies.
            assert!((c.b as i32 - 128).abs() <= 15, "blue drifted to {}", c.b);
        }
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let mut engine = init_engine();
        assert!(matches!(
            engine.execute(Some("A"), f64::NAN, 0.0, yellow()),
            Err(EngineError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn from_json_overrides_selected_fields() {
        let json = serde_json::json!({"count_base": 10, "size_max": 12.0});
        let params = SplatterParams::from_json(&json);
        assert_eq!(params.count_base, 10);
        assert_eq!(params.size_max, 12.0);
        assert_eq!(params.spread_base, SplatterParams::default().spread_base);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(12))]

            #[test]
            fn execute_never_panics(
                seed: u64,
                x in 0.0_f64..256.0,
                y in 0.0_f64..256.0,
            ) {
                let mut engine = SplatterEngine::new(seed, SplatterParams::default());
                engine.init(&InitOptions::new(256, 256)).unwrap();
                engine.execute(Some("S"), x, y, Rgb8::new(30, 30, 30)).unwrap();
            }
        }
    }
}
