//! Private RGBA pixel buffers that engines draw into.
//!
//! A [`LayerBuffer`] is exclusively owned by one engine instance and sized
//! to match the shared surface. It carries a current [`BlendMode`] that
//! applies to every drawing call: `SourceOver` stacks translucent paint
//! normally, while `Multiply` darkens what is already there so repeated
//! overlapping passes visibly deepen prior marks. Under `Multiply`, an
//! uncovered (fully transparent) destination pixel is treated as white, so
//! the first deposit shows the source color instead of vanishing against
//! emptiness.
//!
//! Colors are stored straight (non-premultiplied), matching the wire format
//! where a pass's alpha travels separately from its RGB.

use serde::{Deserialize, Serialize};

use crate::color::Rgb8;
use crate::error::EngineError;
use crate::shape::Polygon;
use glam::DVec2;

/// Blend mode applied by a buffer's drawing primitives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Standard translucent stacking (the normalized state the dispatcher
    /// restores between ink events).
    #[default]
    SourceOver,
    /// Darkness-accumulating blend: source multiplies the destination
    /// color, weighted by the source alpha.
    Multiply,
}

/// An addressable RGBA8 pixel surface owned by a single engine.
#[derive(Debug, Clone)]
pub struct LayerBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
    blend: BlendMode,
}

impl LayerBuffer {
    /// Creates a fully transparent buffer.
    ///
    /// Returns `EngineError::InvalidDimensions` if either dimension is zero
    /// or the pixel count would overflow.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(EngineError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
            blend: BlendMode::default(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Read-only access to the raw RGBA data (row-major, 4 bytes per pixel).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    /// Resets every pixel to fully transparent. The blend mode is kept.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Returns the RGBA bytes of the pixel at `(x, y)`, or `None` outside
    /// the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// True if any pixel has non-zero alpha.
    pub fn has_paint(&self) -> bool {
        self.data.chunks_exact(4).any(|px| px[3] != 0)
    }

    /// FNV-1a hash of the pixel data, used to verify buffer isolation.
    pub fn checksum(&self) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for &byte in &self.data {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    /// Blends `color` at `alpha` into the pixel at `(x, y)` using the
    /// current blend mode. Out-of-bounds coordinates are clipped.
    pub fn blend_pixel(&mut self, x: isize, y: isize, color: Rgb8, alpha: u8) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height || alpha == 0 {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let sa = alpha as f64 / 255.0;
        let da = self.data[i + 3] as f64 / 255.0;

        let src = [
            color.r as f64 / 255.0,
            color.g as f64 / 255.0,
            color.b as f64 / 255.0,
        ];
        let dst = [
            self.data[i] as f64 / 255.0,
            self.data[i + 1] as f64 / 255.0,
            self.data[i + 2] as f64 / 255.0,
        ];

        // Multiply darkens the existing color; an uncovered pixel acts as
        // white so first contact deposits the source color itself.
        let effective = match self.blend {
            BlendMode::SourceOver => src,
            BlendMode::Multiply => {
                let base = if da == 0.0 { [1.0, 1.0, 1.0] } else { dst };
                [src[0] * base[0], src[1] * base[1], src[2] * base[2]]
            }
        };

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        for ch in 0..3 {
            let c = (effective[ch] * sa + dst[ch] * da * (1.0 - sa)) / out_a;
            self.data[i + ch] = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        self.data[i + 3] = (out_a.clamp(0.0, 1.0) * 255.0).round() as u8;
    }

    /// Fills a closed polygon by even-odd scanline rasterization.
    ///
    /// Pixels whose centers fall inside the contour are blended with the
    /// current blend mode. Degenerate polygons (< 3 vertices) draw nothing.
    pub fn fill_polygon(&mut self, poly: &Polygon, color: Rgb8, alpha: u8) {
        let verts = poly.verts();
        if verts.len() < 3 || alpha == 0 {
            return;
        }
        let Some((min, max)) = poly.bounds() else {
            return;
        };
        let y_start = (min.y.floor().max(0.0)) as usize;
        let y_end = (max.y.ceil().min(self.height as f64)) as usize;

        let mut xs: Vec<f64> = Vec::with_capacity(16);
        for y in y_start..y_end {
            let yc = y as f64 + 0.5;
            xs.clear();
            for (i, a) in verts.iter().enumerate() {
                let b = verts[(i + 1) % verts.len()];
                if (a.y <= yc && b.y > yc) || (b.y <= yc && a.y > yc) {
                    xs.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            xs.sort_by(|p, q| p.partial_cmp(q).unwrap_or(std::cmp::Ordering::Equal));
            for pair in xs.chunks_exact(2) {
                let x0 = ((pair[0] - 0.5).ceil().max(0.0)) as usize;
                let x1 = ((pair[1] - 0.5).ceil().min(self.width as f64).max(0.0)) as usize;
                for x in x0..x1 {
                    self.blend_pixel(x as isize, y as isize, color, alpha);
                }
            }
        }
    }

    /// Fills an axis-aligned ellipse centered at `(cx, cy)` with radii
    /// `(rx, ry)`. Radii at or below half a pixel collapse to a single dot.
    pub fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, color: Rgb8, alpha: u8) {
        if alpha == 0 || rx <= 0.0 || ry <= 0.0 || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        if rx <= 0.5 && ry <= 0.5 {
            self.blend_pixel(cx.round() as isize, cy.round() as isize, color, alpha);
            return;
        }
        let x_start = (cx - rx).floor() as isize;
        let x_end = (cx + rx).ceil() as isize;
        let y_start = (cy - ry).floor() as isize;
        let y_end = (cy + ry).ceil() as isize;
        for y in y_start..=y_end {
            for x in x_start..=x_end {
                let dx = (x as f64 + 0.5 - cx) / rx;
                let dy = (y as f64 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.blend_pixel(x, y, color, alpha);
                }
            }
        }
    }

    /// Fills an ellipse rotated by `angle` radians around its center.
    pub fn fill_ellipse_rot(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        angle: f64,
        color: Rgb8,
        alpha: u8,
    ) {
        if alpha == 0 || rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let r = rx.max(ry);
        let (sin, cos) = angle.sin_cos();
        let x_start = (cx - r).floor() as isize;
        let x_end = (cx + r).ceil() as isize;
        let y_start = (cy - r).floor() as isize;
        let y_end = (cy + r).ceil() as isize;
        for y in y_start..=y_end {
            for x in x_start..=x_end {
                let px = x as f64 + 0.5 - cx;
                let py = y as f64 + 0.5 - cy;
                // Rotate the sample point back into ellipse space.
                let ex = (px * cos + py * sin) / rx;
                let ey = (-px * sin + py * cos) / ry;
                if ex * ex + ey * ey <= 1.0 {
                    self.blend_pixel(x, y, color, alpha);
                }
            }
        }
    }

    /// Strokes an open or closed polyline by stamping round dots of
    /// `thickness` diameter along each segment.
    pub fn stroke_polyline(
        &mut self,
        points: &[DVec2],
        thickness: f64,
        color: Rgb8,
        alpha: u8,
        closed: bool,
    ) {
        if points.len() < 2 || alpha == 0 || thickness <= 0.0 {
            return;
        }
        let radius = (thickness * 0.5).max(0.35);
        let spacing = radius.max(0.75);
        let segment_count = if closed {
            points.len()
        } else {
            points.len() - 1
        };
        for i in 0..segment_count {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            let len = a.distance(b);
            let steps = (len / spacing).ceil().max(1.0) as usize;
            for s in 0..=steps {
                let p = a.lerp(b, s as f64 / steps as f64);
                self.fill_ellipse(p.x, p.y, radius, radius, color, alpha);
            }
        }
    }
}
