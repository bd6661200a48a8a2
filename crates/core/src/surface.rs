//! The shared drawing surface that engine buffers are composited onto.
//!
//! A [`Surface`] holds an immutable paper base (background color, faint
//! grain speckles, a whisper of vignette) plus the working pixels. The
//! compositing cycle is reset-then-blit: [`Surface::reset`] restores the
//! paper, then each visible engine's buffer is blitted over it in order.
//! Because the base never changes, a full composition pass is idempotent —
//! running it twice with nothing new painted yields identical pixels.
//!
//! Engines never touch a `Surface` directly; only `compose` calls routed
//! through the dispatcher do.

use crate::buffer::LayerBuffer;
use crate::color::{Rgb8, Srgb};
use crate::error::EngineError;
use crate::prng::Xorshift64;

/// Speckles laid down per pixel of paper area.
const SPECKLE_DENSITY: f64 = 0.0125;

/// An RGB surface (fully opaque) with a pre-rendered paper base.
#[derive(Debug, Clone)]
pub struct Surface {
    width: usize,
    height: usize,
    base: Vec<u8>,
    data: Vec<u8>,
}

impl Surface {
    /// Creates a surface filled with a flat background color.
    ///
    /// Returns `EngineError::InvalidDimensions` if either dimension is zero
    /// or the pixel count would overflow.
    pub fn new(width: usize, height: usize, background: Srgb) -> Result<Self, EngineError> {
        let len = Self::checked_len(width, height)?;
        let bg = Rgb8::from_srgb(background);
        let mut base = Vec::with_capacity(len);
        for _ in 0..width * height {
            base.extend_from_slice(&[bg.r, bg.g, bg.b, 255]);
        }
        let data = base.clone();
        Ok(Self {
            width,
            height,
            base,
            data,
        })
    }

    /// Creates a surface whose base is a paper texture: the background
    /// color scattered with faint darker speckles.
    ///
    /// The texture is rendered once here; every [`reset`](Self::reset)
    /// restores it exactly, keeping composition idempotent.
    pub fn with_paper(
        width: usize,
        height: usize,
        background: Srgb,
        rng: &mut Xorshift64,
    ) -> Result<Self, EngineError> {
        let mut surface = Self::new(width, height, background)?;
        let bg = Rgb8::from_srgb(background);
        let speckle = bg.darken(0.9);
        let count = ((width * height) as f64 * SPECKLE_DENSITY) as usize;
        for _ in 0..count {
            let x = rng.next_usize(width);
            let y = rng.next_usize(height);
            let alpha = rng.next_range(0.05, 0.2);
            let i = (y * width + x) * 4;
            for ch in 0..3 {
                let b = surface.base[i + ch] as f64;
                let s = [speckle.r, speckle.g, speckle.b][ch] as f64;
                surface.base[i + ch] = (b + (s - b) * alpha).round() as u8;
            }
        }
        surface.data.copy_from_slice(&surface.base);
        Ok(surface)
    }

    fn checked_len(width: usize, height: usize) -> Result<usize, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(EngineError::InvalidDimensions)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The working pixels (RGBA, row-major, alpha always 255).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Restores the working pixels to the paper base.
    pub fn reset(&mut self) {
        self.data.copy_from_slice(&self.base);
    }

    /// FNV-1a hash of the working pixels.
    pub fn checksum(&self) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for &byte in &self.data {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    /// Source-over blits an engine buffer onto the working pixels.
    ///
    /// Returns `EngineError::InvalidDimensions` when the buffer was created
    /// for a different surface size; paint must never land on a stale
    /// geometry.
    pub fn blit(&mut self, buffer: &LayerBuffer) -> Result<(), EngineError> {
        if buffer.width() != self.width || buffer.height() != self.height {
            return Err(EngineError::InvalidDimensions);
        }
        let src = buffer.data();
        for (dst_px, src_px) in self.data.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
            let sa = src_px[3] as f64 / 255.0;
            if sa == 0.0 {
                continue;
            }
            for ch in 0..3 {
                let s = src_px[ch] as f64;
                let d = dst_px[ch] as f64;
                dst_px[ch] = (s * sa + d * (1.0 - sa)).round().clamp(0.0, 255.0) as u8;
            }
            // The surface stays opaque.
        }
        Ok(())
    }
}
