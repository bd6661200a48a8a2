//! Color types and conversion functions for the ink-engine.
//!
//! Two families of types live here: the 8-bit [`Rgb8`] triple that ink
//! events carry on the wire, and the f64 color spaces (`Srgb`, `LinearRgb`,
//! `OkLab`, `OkLch`) used for all color math. All conversions are pure
//! functions.
//!
//! Per-dab color jitter happens in OKLCh: hue moves by a few degrees and
//! lightness by a bounded delta, which keeps thousands of overlapping dabs
//! from reading as one flat tone.

use crate::error::EngineError;
use crate::prng::Xorshift64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 8-bit RGB triple, the color format of an ink event.
///
/// Serializes as a `[r, g, b]` array. Alpha is never part of the color;
/// each render pass supplies its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Rgb8 = Rgb8 {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts to the f64 sRGB representation (components in [0, 1]).
    pub fn to_srgb(self) -> Srgb {
        Srgb {
            r: self.r as f64 / 255.0,
            g: self.g as f64 / 255.0,
            b: self.b as f64 / 255.0,
        }
    }

    /// Quantizes an f64 sRGB color to 8-bit with rounding and clamping.
    pub fn from_srgb(c: Srgb) -> Self {
        Self {
            r: (c.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            g: (c.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            b: (c.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        }
    }

    /// Scales each channel by `factor` (clamped), used for darkened
    /// fringe/grain variants of a base color.
    pub fn darken(self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: (self.r as f64 * f).round() as u8,
            g: (self.g as f64 * f).round() as u8,
            b: (self.b as f64 * f).round() as u8,
        }
    }
}

impl Serialize for Rgb8 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.r, self.g, self.b].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [r, g, b] = <[u8; 3]>::deserialize(deserializer)?;
        Ok(Rgb8 { r, g, b })
    }
}

/// sRGB color with components in [0, 1].
///
/// Serializes as a hex string `"#rrggbb"` for human-readable formats.
/// The hex round-trip has 8-bit quantization (1/255 precision loss),
/// which is acceptable since hex colors are inherently 8-bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Linear RGB color (gamma-decoded).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// OKLab perceptual color space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OkLab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// OKLCh (cylindrical form of OKLab).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OkLch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

impl Srgb {
    /// Parses a hex color string like "#ff00aa" or "ff00aa" (case insensitive).
    ///
    /// Returns `EngineError::InvalidColor` if the input is not a valid 6-digit hex color.
    pub fn from_hex(hex: &str) -> Result<Srgb, EngineError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return Err(EngineError::InvalidColor(format!(
                "expected 6 hex digits, got {}",
                hex.len()
            )));
        }
        let r = u8::from_str_radix(&hex[0..2], 16)
            .map_err(|e| EngineError::InvalidColor(format!("invalid red component: {e}")))?;
        let g = u8::from_str_radix(&hex[2..4], 16)
            .map_err(|e| EngineError::InvalidColor(format!("invalid green component: {e}")))?;
        let b = u8::from_str_radix(&hex[4..6], 16)
            .map_err(|e| EngineError::InvalidColor(format!("invalid blue component: {e}")))?;
        Ok(Srgb {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        })
    }

    /// Converts the color to a hex string like `"#rrggbb"`.
    ///
    /// Components are quantized to 8-bit (0-255) with rounding.
    pub fn to_hex(self) -> String {
        let r = (self.r.clamp(0.0, 1.0) * 255.0).round() as u8;
        let g = (self.g.clamp(0.0, 1.0) * 255.0).round() as u8;
        let b = (self.b.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl Serialize for Srgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Srgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Srgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Applies inverse sRGB gamma to convert a single sRGB component to linear.
fn srgb_component_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Applies sRGB gamma to convert a single linear component to sRGB.
fn linear_component_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Converts sRGB to linear RGB by applying inverse sRGB gamma.
pub fn srgb_to_linear(c: Srgb) -> LinearRgb {
    LinearRgb {
        r: srgb_component_to_linear(c.r),
        g: srgb_component_to_linear(c.g),
        b: srgb_component_to_linear(c.b),
    }
}

/// Converts linear RGB to sRGB by applying sRGB gamma.
pub fn linear_to_srgb(c: LinearRgb) -> Srgb {
    Srgb {
        r: linear_component_to_srgb(c.r),
        g: linear_component_to_srgb(c.g),
        b: linear_component_to_srgb(c.b),
    }
}

/// Converts linear RGB to OKLab via the OKLab matrix transform.
pub fn linear_to_oklab(c: LinearRgb) -> OkLab {
    let l_ = 0.4122214708 * c.r + 0.5363325363 * c.g + 0.0514459929 * c.b;
    let m_ = 0.2119034982 * c.r + 0.6806995451 * c.g + 0.1073969566 * c.b;
    let s_ = 0.0883024619 * c.r + 0.2817188376 * c.g + 0.6299787005 * c.b;

    let l_c = l_.cbrt();
    let m_c = m_.cbrt();
    let s_c = s_.cbrt();

    OkLab {
        l: 0.2104542553 * l_c + 0.7936177850 * m_c - 0.0040720468 * s_c,
        a: 1.9779984951 * l_c - 2.4285922050 * m_c + 0.4505937099 * s_c,
        b: 0.0259040371 * l_c + 0.7827717662 * m_c - 0.8086757660 * s_c,
    }
}

/// Converts OKLab to linear RGB via the inverse OKLab matrix transform.
pub fn oklab_to_linear(c: OkLab) -> LinearRgb {
    let l_ = c.l + 0.3963377774 * c.a + 0.2158037573 * c.b;
    let m_ = c.l - 0.1055613458 * c.a - 0.0638541728 * c.b;
    let s_ = c.l - 0.0894841775 * c.a - 1.2914855480 * c.b;

    let l = l_ * l_ * l_;
    let m = m_ * m_ * m_;
    let s = s_ * s_ * s_;

    LinearRgb {
        r: 4.0767416621 * l - 3.3077115913 * m + 0.2309699292 * s,
        g: -1.2684380046 * l + 2.6097574011 * m - 0.3413193965 * s,
        b: -0.0041960863 * l - 0.7034186147 * m + 1.7076147010 * s,
    }
}

/// Converts OKLab to OKLCh (cylindrical form).
///
/// NaN guard: if chroma is less than 1e-10, hue is set to 0.0 to avoid
/// indeterminate `atan2(0, 0)` results.
pub fn oklab_to_oklch(c: OkLab) -> OkLch {
    let ch = (c.a * c.a + c.b * c.b).sqrt();
    let h = if ch < 1e-10 {
        0.0
    } else {
        c.b.atan2(c.a).to_degrees().rem_euclid(360.0)
    };
    OkLch { l: c.l, c: ch, h }
}

/// Converts OKLCh to OKLab.
pub fn oklch_to_oklab(c: OkLch) -> OkLab {
    let h_rad = c.h.to_radians();
    OkLab {
        l: c.l,
        a: c.c * h_rad.cos(),
        b: c.c * h_rad.sin(),
    }
}

/// Convenience: sRGB to OKLCh via the chain sRGB -> linear -> OKLab -> OKLCh.
pub fn srgb_to_oklch(c: Srgb) -> OkLch {
    oklab_to_oklch(linear_to_oklab(srgb_to_linear(c)))
}

/// Convenience: OKLCh to sRGB via the chain OKLCh -> OKLab -> linear -> sRGB,
/// with output clamped to [0, 1].
pub fn oklch_to_srgb(c: OkLch) -> Srgb {
    let srgb = linear_to_srgb(oklab_to_linear(oklch_to_oklab(c)));
    Srgb {
        r: srgb.r.clamp(0.0, 1.0),
        g: srgb.g.clamp(0.0, 1.0),
        b: srgb.b.clamp(0.0, 1.0),
    }
}

/// Jitters a color in OKLCh: hue by up to `hue_deg` degrees either way,
/// lightness by up to `light_delta` either way (result clamped to a
/// printable [0.05, 0.97] band so dabs never collapse to pure black/white).
pub fn jitter(color: Rgb8, rng: &mut Xorshift64, hue_deg: f64, light_delta: f64) -> Rgb8 {
    let mut lch = srgb_to_oklch(color.to_srgb());
    lch.h = (lch.h + rng.next_range(-hue_deg, hue_deg)).rem_euclid(360.0);
    lch.l = (lch.l + rng.next_range(-light_delta, light_delta)).clamp(0.05, 0.97);
    Rgb8::from_srgb(oklch_to_srgb(lch))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    // -- Rgb8 tests --

    #[test]
    fn rgb8_to_srgb_and_back_is_exact() {
        let original = Rgb8::new(128, 64, 32);
        let round_tripped = Rgb8::from_srgb(original.to_srgb());
        assert_eq!(original, round_tripped);
    }

    #[test]
    fn rgb8_serializes_as_array() {
        let color = Rgb8::new(255, 0, 128);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "[255,0,128]");
    }

    #[test]
    fn rgb8_deserializes_from_array() {
        let color: Rgb8 = serde_json::from_str("[10,20,30]").unwrap();
        assert_eq!(color, Rgb8::new(10, 20, 30));
    }

    #[test]
    fn rgb8_from_srgb_clamps_out_of_range() {
        let c = Rgb8::from_srgb(Srgb {
            r: 1.5,
            g: -0.1,
            b: 0.5,
        });
        assert_eq!(c.r, 255);
        assert_eq!(c.g, 0);
    }

    #[test]
    fn darken_scales_each_channel() {
        let c = Rgb8::new(200, 100, 50).darken(0.5);
        assert_eq!(c, Rgb8::new(100, 50, 25));
    }

    #[test]
    fn darken_by_one_is_identity() {
        let c = Rgb8::new(13, 200, 77);
        assert_eq!(c.darken(1.0), c);
    }

    // -- sRGB <-> Linear round-trip tests --

    #[test]
    fn srgb_linear_round_trip_mid_gray() {
        let gray = Srgb {
            r: 0.5,
            g: 0.5,
            b: 0.5,
        };
        let round_tripped = linear_to_srgb(srgb_to_linear(gray));
        assert!(approx_eq(round_tripped.r, 0.5));
        assert!(approx_eq(round_tripped.g, 0.5));
        assert!(approx_eq(round_tripped.b, 0.5));
    }

    #[test]
    fn srgb_gamma_boundary_at_0_04045() {
        // Value exactly at the boundary between linear and gamma segments.
        let boundary = Srgb {
            r: 0.04045,
            g: 0.0,
            b: 0.0,
        };
        let lin = srgb_to_linear(boundary);
        assert!(approx_eq(lin.r, 0.04045 / 12.92));
    }

    // -- OKLab / OKLCh conversion tests --

    #[test]
    fn white_in_oklab_has_l_near_one_and_zero_chroma() {
        let white = LinearRgb {
            r: 1.0,
            g: 1.0,
            b: 1.0,
        };
        let lab = linear_to_oklab(white);
        assert!(approx_eq(lab.l, 1.0), "expected L~1.0, got {}", lab.l);
        assert!(approx_eq(lab.a, 0.0), "expected a~0.0, got {}", lab.a);
        assert!(approx_eq(lab.b, 0.0), "expected b~0.0, got {}", lab.b);
    }

    #[test]
    fn oklch_pure_red_has_hue_near_29_degrees() {
        let red = Srgb {
            r: 1.0,
            g: 0.0,
            b: 0.0,
        };
        let lch = srgb_to_oklch(red);
        assert!(
            (lch.h - 29.2).abs() < 1.0,
            "expected red hue ~29.2, got {}",
            lch.h
        );
        assert!(lch.c > 0.0, "expected positive chroma for red");
    }

    #[test]
    fn oklch_nan_guard_zero_chroma_sets_hue_to_zero() {
        let achromatic = OkLab {
            l: 0.5,
            a: 0.0,
            b: 0.0,
        };
        let lch = oklab_to_oklch(achromatic);
        assert_eq!(lch.h, 0.0, "achromatic color should have hue=0");
        assert!(!lch.h.is_nan(), "hue must not be NaN");
    }

    #[test]
    fn srgb_oklch_round_trip_known_colors() {
        let colors = [
            Srgb {
                r: 1.0,
                g: 0.0,
                b: 0.0,
            },
            Srgb {
                r: 0.0,
                g: 1.0,
                b: 0.0,
            },
            Srgb {
                r: 0.0,
                g: 0.0,
                b: 1.0,
            },
            Srgb {
                r: 0.5,
                g: 0.3,
                b: 0.8,
            },
        ];
        for (i, &color) in colors.iter().enumerate() {
            let round_tripped = oklch_to_srgb(srgb_to_oklch(color));
            assert!(
                approx_eq(round_tripped.r, color.r),
                "color {i}: r={} vs {}",
                round_tripped.r,
                color.r
            );
            assert!(
                approx_eq(round_tripped.g, color.g),
                "color {i}: g={} vs {}",
                round_tripped.g,
                color.g
            );
            assert!(
                approx_eq(round_tripped.b, color.b),
                "color {i}: b={} vs {}",
                round_tripped.b,
                color.b
            );
        }
    }

    // -- Hex parsing tests --

    #[test]
    fn from_hex_parses_red_with_hash() {
        let red = Srgb::from_hex("#ff0000").unwrap();
        assert!(approx_eq(red.r, 1.0));
        assert!(approx_eq(red.g, 0.0));
        assert!(approx_eq(red.b, 0.0));
    }

    #[test]
    fn from_hex_returns_error_for_invalid_hex() {
        assert!(Srgb::from_hex("#gggggg").is_err());
        assert!(Srgb::from_hex("#fff").is_err());
        assert!(Srgb::from_hex("").is_err());
        assert!(Srgb::from_hex("#ff00ff00").is_err());
    }

    #[test]
    fn from_hex_to_hex_round_trip() {
        let original = "#c0ffee";
        let color = Srgb::from_hex(original).unwrap();
        assert_eq!(color.to_hex(), original);
    }

    // -- Jitter tests --

    #[test]
    fn jitter_with_zero_amounts_is_near_identity() {
        let mut rng = Xorshift64::new(7);
        let original = Rgb8::new(180, 90, 60);
        let jittered = jitter(original, &mut rng, 0.0, 0.0);
        // Only quantization through the OKLCh round trip remains.
        assert!((jittered.r as i32 - original.r as i32).abs() <= 1);
        assert!((jittered.g as i32 - original.g as i32).abs() <= 1);
        assert!((jittered.b as i32 - original.b as i32).abs() <= 1);
    }

    #[test]
    fn jitter_stays_printable_for_extreme_lightness() {
        let mut rng = Xorshift64::new(99);
        for _ in 0..100 {
            let c = jitter(Rgb8::WHITE, &mut rng, 5.0, 0.1);
            assert!(
                c.r < 255 || c.g < 255 || c.b < 255 || c == Rgb8::WHITE,
                "jitter produced an invalid color"
            );
        }
    }

    // -- Property-based tests --

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn srgb_to_oklch_round_trip_within_epsilon(
                r in 0.0_f64..=1.0,
                g in 0.0_f64..=1.0,
                b in 0.0_f64..=1.0,
            ) {
                let original = Srgb { r, g, b };
                let round_tripped = oklch_to_srgb(srgb_to_oklch(original));
                prop_assert!(
                    (round_tripped.r - original.r).abs() < 1e-5,
                    "r: {} vs {}", round_tripped.r, original.r
                );
                prop_assert!(
                    (round_tripped.g - original.g).abs() < 1e-5,
                    "g: {} vs {}", round_tripped.g, original.g
                );
                prop_assert!(
                    (round_tripped.b - original.b).abs() < 1e-5,
                    "b: {} vs {}", round_tripped.b, original.b
                );
            }

            #[test]
            fn jitter_never_panics_and_stays_in_range(
                seed: u64,
                r: u8, g: u8, b: u8,
                hue in 0.0_f64..=30.0,
                light in 0.0_f64..=0.3,
            ) {
                let mut rng = Xorshift64::new(seed);
                // Output is a valid Rgb8 by construction; just exercise it.
                let _ = jitter(Rgb8::new(r, g, b), &mut rng, hue, light);
            }

            #[test]
            fn oklch_hue_is_never_nan(
                l in 0.0_f64..=1.0,
                a in -0.5_f64..=0.5,
                b_val in -0.5_f64..=0.5,
            ) {
                let lab = OkLab { l, a, b: b_val };
                let lch = oklab_to_oklch(lab);
                prop_assert!(!lch.h.is_nan(), "hue is NaN for a={a}, b={b_val}");
                prop_assert!(lch.h >= 0.0 && lch.h < 360.0,
                    "hue {} out of [0, 360) for a={a}, b={b_val}", lch.h);
            }
        }
    }
}
