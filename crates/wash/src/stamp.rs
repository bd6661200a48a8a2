//! Pre-rendered stamp brush: the optional fast path for the wash engine.
//!
//! Instead of generating and rasterizing organic polygons per dab, a
//! fixed-resolution alpha mask (radial falloff broken up by noise) is
//! rendered once at construction and scaled onto the buffer per ink event.
//! Selected at `init` via `WashParams::textured_brush`; when this module
//! is compiled out, the engine falls back to the organic pipeline with no
//! change in the external contract.

use ink_engine_core::{LayerBuffer, NoiseField, Rgb8, Xorshift64};

/// Mask resolution; one stamp texture is shared by all dab sizes.
const STAMP_SIZE: usize = 64;

/// A pre-rendered alpha mask stamped per ink event.
#[derive(Debug, Clone)]
pub struct StampBrush {
    mask: Vec<f64>,
}

impl StampBrush {
    /// Renders the mask: smooth radial falloff multiplied by mid-frequency
    /// noise so the stamp edge reads as pigment, not as a vignette.
    pub fn new(rng: &mut Xorshift64) -> Self {
        let noise = NoiseField::new(rng.next_u64() as u32, 0.09);
        let mut mask = Vec::with_capacity(STAMP_SIZE * STAMP_SIZE);
        let center = (STAMP_SIZE as f64 - 1.0) * 0.5;
        for y in 0..STAMP_SIZE {
            for x in 0..STAMP_SIZE {
                let dx = (x as f64 - center) / center;
                let dy = (y as f64 - center) / center;
                let d = (dx * dx + dy * dy).sqrt();
                let falloff = (1.0 - d).clamp(0.0, 1.0).powf(1.4);
                let grain = 0.55 + 0.45 * noise.sample(x as f64, y as f64, 0.0);
                mask.push(falloff * grain);
            }
        }
        Self { mask }
    }

    /// Multiplies the stamp onto `buffer`, scaled so the mask spans
    /// `2 * radius` pixels around `(cx, cy)`. `alpha` scales the whole dab.
    pub fn paint(
        &self,
        buffer: &mut LayerBuffer,
        cx: f64,
        cy: f64,
        radius: f64,
        color: Rgb8,
        alpha: u8,
    ) {
        if radius <= 0.0 || alpha == 0 {
            return;
        }
        let x_start = (cx - radius).floor() as isize;
        let x_end = (cx + radius).ceil() as isize;
        let y_start = (cy - radius).floor() as isize;
        let y_end = (cy + radius).ceil() as isize;
        let scale = STAMP_SIZE as f64 / (radius * 2.0);
        for y in y_start..=y_end {
            for x in x_start..=x_end {
                let mx = ((x as f64 + 0.5 - (cx - radius)) * scale) as usize;
                let my = ((y as f64 + 0.5 - (cy - radius)) * scale) as usize;
                if mx >= STAMP_SIZE || my >= STAMP_SIZE {
                    continue;
                }
                let weight = self.mask[my * STAMP_SIZE + mx];
                let a = (alpha as f64 * weight).round() as u8;
                buffer.blend_pixel(x, y, color, a);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink_engine_core::BlendMode;

    #[test]
    fn mask_values_stay_in_unit_interval() {
        let mut rng = Xorshift64::new(42);
        let stamp = StampBrush::new(&mut rng);
        for &v in &stamp.mask {
            assert!((0.0..=1.0).contains(&v), "mask weight {v} out of range");
        }
    }

    #[test]
    fn mask_is_strongest_near_the_center() {
        let mut rng = Xorshift64::new(7);
        let stamp = StampBrush::new(&mut rng);
        let center = stamp.mask[(STAMP_SIZE / 2) * STAMP_SIZE + STAMP_SIZE / 2];
        let corner = stamp.mask[0];
        assert!(
            center > corner,
            "center weight {center} not above corner {corner}"
        );
    }

    #[test]
    fn paint_lands_within_the_radius() {
        let mut rng = Xorshift64::new(3);
        let stamp = StampBrush::new(&mut rng);
        let mut buf = LayerBuffer::new(64, 64).unwrap();
        buf.set_blend_mode(BlendMode::Multiply);
        stamp.paint(&mut buf, 32.0, 32.0, 10.0, Rgb8::new(40, 80, 160), 200);
        assert!(buf.has_paint());
        for y in 0..64 {
            for x in 0..64 {
                if buf.pixel(x, y).unwrap()[3] != 0 {
                    let d = ((x as f64 - 32.0).powi(2) + (y as f64 - 32.0).powi(2)).sqrt();
                    assert!(d <= 11.0, "paint at ({x}, {y}) escaped radius");
                }
            }
        }
    }

    #[test]
    fn zero_radius_paints_nothing() {
        let mut rng = Xorshift64::new(3);
        let stamp = StampBrush::new(&mut rng);
        let mut buf = LayerBuffer::new(16, 16).unwrap();
        stamp.paint(&mut buf, 8.0, 8.0, 0.0, Rgb8::new(0, 0, 0), 255);
        assert!(!buf.has_paint());
    }
}
