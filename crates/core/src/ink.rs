//! Ink accumulation: the state machine that turns a stream of nearby,
//! rapid ink events into a growing puddle instead of independent dots.
//!
//! Every event lands in one of two phases. `Growing`: the event is within
//! the proximity threshold of the previous one *and* arrived within the
//! recency window, so the puddle widens at a fixed rate and its pigment
//! load deepens proportionally to the elapsed time. `Fresh`: the nozzle
//! jumped or paused, so a new puddle starts at a random size. Travel speed
//! feeds a bounded multiplier — fast motion thins the mark, slow motion
//! fattens it.

use crate::prng::Xorshift64;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Tuning constants for the accumulation machine, read once at engine
/// construction and immutable for that instance's lifetime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InkParams {
    /// Smallest size a fresh puddle can start at.
    pub puddle_min: f64,
    /// Largest size a fresh puddle can start at.
    pub puddle_max: f64,
    /// Hard cap on puddle growth.
    pub puddle_max_cap: f64,
    /// Size added per growing event.
    pub growth_rate: f64,
    /// Alpha added per 100 ms of dwell while growing.
    pub accumulation_rate: f64,
    /// Hard cap on accumulated alpha.
    pub max_accum_alpha: f64,
    /// Base alpha floor; a fresh puddle starts in [alpha_min, 2 * alpha_min].
    pub alpha_min: f64,
    /// Base alpha ceiling used by render passes for their opacity ramps.
    pub alpha_max: f64,
    /// Events closer than this (surface units) can continue a puddle.
    pub proximity: f64,
    /// Events within this window (milliseconds) can continue a puddle.
    pub recency_ms: f64,
}

impl Default for InkParams {
    fn default() -> Self {
        Self {
            puddle_min: 8.0,
            puddle_max: 28.0,
            puddle_max_cap: 120.0,
            growth_rate: 2.0,
            accumulation_rate: 4.0,
            max_accum_alpha: 220.0,
            alpha_min: 12.0,
            alpha_max: 120.0,
            proximity: 20.0,
            recency_ms: 900.0,
        }
    }
}

/// Outcome of observing one ink event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InkPhase {
    /// A new puddle started (nozzle jumped far or paused long).
    Fresh,
    /// The previous puddle continued growing.
    Growing,
}

/// Mutable per-engine accumulation state.
///
/// Created at engine initialization, mutated on every ink event, and reset
/// (never destroyed) when the input stream signals a boundary such as a
/// word break.
#[derive(Debug, Clone, Default)]
pub struct InkState {
    last: Option<DVec2>,
    last_at_ms: Option<f64>,
    puddle_size: f64,
    accum_alpha: f64,
    last_speed: f64,
}

impl InkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the previous ink event, if any.
    pub fn last(&self) -> Option<DVec2> {
        self.last
    }

    /// Current puddle size, clamped to `[0, puddle_max_cap]`.
    pub fn puddle_size(&self) -> f64 {
        self.puddle_size
    }

    /// Accumulated alpha, clamped to `[0, max_accum_alpha]`.
    pub fn accum_alpha(&self) -> f64 {
        self.accum_alpha
    }

    /// Travel speed (surface units per ms) measured at the last event.
    pub fn last_speed(&self) -> f64 {
        self.last_speed
    }

    /// Returns the state to its initial defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feeds one ink event at `(x, y)` observed at `now_ms` through the
    /// state machine and reports which phase it landed in.
    pub fn observe(
        &mut self,
        x: f64,
        y: f64,
        now_ms: f64,
        rng: &mut Xorshift64,
        params: &InkParams,
    ) -> InkPhase {
        let pos = DVec2::new(x, y);
        let dist = self.last.map_or(f64::INFINITY, |p| p.distance(pos));
        let dt = self.last_at_ms.map_or(0.0, |t| (now_ms - t).max(0.0));

        self.last_speed = if dist.is_finite() && dt > 0.0 {
            dist / dt
        } else {
            0.0
        };

        let phase = if dist < params.proximity && dt < params.recency_ms {
            self.puddle_size = (self.puddle_size + params.growth_rate).min(params.puddle_max_cap);
            let alpha_inc = params.accumulation_rate * (dt / 100.0);
            self.accum_alpha = (self.accum_alpha + alpha_inc).min(params.max_accum_alpha);
            InkPhase::Growing
        } else {
            self.puddle_size = rng.next_range(params.puddle_min, params.puddle_max);
            self.accum_alpha = rng.next_range(params.alpha_min, params.alpha_min * 2.0);
            InkPhase::Fresh
        };

        self.last = Some(pos);
        self.last_at_ms = Some(now_ms);
        phase
    }

    /// Maps travel speed into a bounded brush multiplier: speed 0 -> 0.7
    /// (full, slow marks), speed >= 2 units/ms -> 1.6 (thin, fast marks).
    pub fn speed_factor(&self) -> f64 {
        let s = self.last_speed.clamp(0.0, 2.0);
        0.7 + (s / 2.0) * (1.6 - 0.7)
    }

    /// Derived brush size for the current event: puddle size scaled by the
    /// speed factor and a random jitter in [0.85, 1.25).
    pub fn brush_size(&self, rng: &mut Xorshift64) -> f64 {
        self.puddle_size * self.speed_factor() * rng.next_range(0.85, 1.25)
    }
}
