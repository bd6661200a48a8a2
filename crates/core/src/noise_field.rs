//! Smooth scalar noise sampled at (x, y, z), the deformation driver for
//! organic shapes.
//!
//! Wraps Perlin noise behind a small sampler that scales coordinates and
//! maps the raw [-1, 1] output into [0, 1], which is the range the shape
//! generator's displacement mapping expects. Sampling is deterministic:
//! same seed and coordinates always produce the same value.

use noise::{NoiseFn, Perlin};

/// A seeded, scaled Perlin sampler producing values in [0, 1].
#[derive(Debug, Clone)]
pub struct NoiseField {
    noise: Perlin,
    scale: f64,
}

impl NoiseField {
    /// Creates a noise field with the given seed and coordinate scale.
    ///
    /// `scale` multiplies x and y before sampling; small values (~0.02)
    /// give broad, slowly varying deformation.
    pub fn new(seed: u32, scale: f64) -> Self {
        Self {
            noise: Perlin::new(seed),
            scale,
        }
    }

    /// Samples the field at `(x, y)` with a third `z` coordinate used to
    /// decorrelate passes (e.g. subdivision iteration index).
    ///
    /// Returns a value in [0, 1].
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let raw = self.noise.get([x * self.scale, y * self.scale, z]);
        (raw * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// The coordinate scale this field samples at.
    pub fn scale(&self) -> f64 {
        self.scale
    }
}
