//! Named palettes of discrete color stops, picked per ink event.
//!
//! Colors are stored in OKLCh (parsed from hex) and handed out as
//! [`Rgb8`] triples. Unlike a gradient, a watercolor palette is sampled
//! discretely — one stop per dab — optionally avoiding the most recently
//! used stops so adjacent words don't blur into one tone.

use crate::color::{oklch_to_srgb, srgb_to_oklch, OkLch, Rgb8, Srgb};
use crate::error::EngineError;
use crate::prng::Xorshift64;

/// All built-in palette names, in the order `list_names` reports them.
const PALETTE_NAMES: &[&str] = &[
    "nordic",
    "ocean-blue",
    "teal-coral",
    "evening-sky",
    "berry-punch",
    "olive-grove",
];

/// A named list of color stops stored in OKLCh.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<OkLch>,
}

impl Palette {
    /// Creates a new palette from a vector of OKLCh colors.
    ///
    /// Requires at least one color.
    pub fn new(colors: Vec<OkLch>) -> Result<Self, EngineError> {
        if colors.is_empty() {
            return Err(EngineError::InvalidPalette(
                "palette requires at least 1 color".to_string(),
            ));
        }
        Ok(Self { colors })
    }

    /// Creates a palette by parsing hex color strings and converting to OKLCh.
    ///
    /// Each string can be "#rrggbb" or "rrggbb" (case insensitive).
    /// Requires at least one color.
    pub fn from_hex(hexes: &[&str]) -> Result<Self, EngineError> {
        if hexes.is_empty() {
            return Err(EngineError::InvalidPalette(
                "palette requires at least 1 color".to_string(),
            ));
        }
        let colors: Result<Vec<OkLch>, EngineError> = hexes
            .iter()
            .map(|h| Srgb::from_hex(h).map(srgb_to_oklch))
            .collect();
        Self::new(colors?)
    }

    /// Returns the number of color stops in this palette.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Returns true if this palette has no colors. (Always false for valid palettes.)
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The stop at `index` as an 8-bit triple.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn stop(&self, index: usize) -> Rgb8 {
        Rgb8::from_srgb(oklch_to_srgb(self.colors[index]))
    }

    /// Picks a uniformly random stop.
    pub fn pick(&self, rng: &mut Xorshift64) -> Rgb8 {
        self.stop(rng.next_usize(self.colors.len()))
    }

    /// Picks a random stop that is not in `recent`, falling back to the
    /// full palette when every stop has been used recently.
    pub fn pick_avoiding(&self, rng: &mut Xorshift64, recent: &[Rgb8]) -> Rgb8 {
        let candidates: Vec<usize> = (0..self.colors.len())
            .filter(|&i| !recent.contains(&self.stop(i)))
            .collect();
        match candidates.len() {
            0 => self.pick(rng),
            n => self.stop(candidates[rng.next_usize(n)]),
        }
    }

    // -- Built-in palettes --

    /// Cool mints and pale blues.
    pub fn nordic() -> Self {
        Self::from_hex(&["#3eb489", "#ace5ee", "#a8e4a0", "#ccccff", "#afeeee"])
            .expect("nordic palette hex values are valid")
    }

    /// Saturated blues fading to foam.
    pub fn ocean_blue() -> Self {
        Self::from_hex(&["#0077b6", "#00b4d8", "#90e0ef", "#caf0f8"])
            .expect("ocean-blue palette hex values are valid")
    }

    /// Deep teal against warm coral.
    pub fn teal_coral() -> Self {
        Self::from_hex(&["#264653", "#2a9d8f", "#e9c46a", "#f4a261", "#e76f51"])
            .expect("teal-coral palette hex values are valid")
    }

    /// Periwinkle dusk.
    pub fn evening_sky() -> Self {
        Self::from_hex(&["#edf2fb", "#d7e3fc", "#c1d3fe", "#abc4ff", "#2f3e46"])
            .expect("evening-sky palette hex values are valid")
    }

    /// Pinks into wine.
    pub fn berry_punch() -> Self {
        Self::from_hex(&["#fadde1", "#ff99ac", "#ff4d6d", "#c9184a", "#800080"])
            .expect("berry-punch palette hex values are valid")
    }

    /// Greens and ochres.
    pub fn olive_grove() -> Self {
        Self::from_hex(&["#283618", "#606c38", "#dda15e", "#bc6c25", "#fefae0"])
            .expect("olive-grove palette hex values are valid")
    }

    /// Looks up a built-in palette by name.
    ///
    /// Returns `EngineError::InvalidPalette` for unknown names.
    pub fn from_name(name: &str) -> Result<Self, EngineError> {
        match name {
            "nordic" => Ok(Self::nordic()),
            "ocean-blue" => Ok(Self::ocean_blue()),
            "teal-coral" => Ok(Self::teal_coral()),
            "evening-sky" => Ok(Self::evening_sky()),
            "berry-punch" => Ok(Self::berry_punch()),
            "olive-grove" => Ok(Self::olive_grove()),
            _ => Err(EngineError::InvalidPalette(format!(
                "unknown palette '{name}'"
            ))),
        }
    }

    /// Names of all built-in palettes.
    pub fn list_names() -> &'static [&'static str] {
        PALETTE_NAMES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Construction tests --

    #[test]
    fn new_with_empty_vec_returns_error() {
        let result = Palette::new(vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn from_hex_with_valid_colors_succeeds() {
        let result = Palette::from_hex(&["#ff0000", "#00ff00", "#0000ff"]);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 3);
    }

    #[test]
    fn from_hex_with_empty_slice_returns_error() {
        assert!(Palette::from_hex(&[]).is_err());
    }

    #[test]
    fn from_hex_with_invalid_hex_returns_error() {
        assert!(Palette::from_hex(&["#ff0000", "#zzzzzz"]).is_err());
    }

    // -- Picking tests --

    #[test]
    fn pick_returns_a_palette_stop() {
        let palette = Palette::from_hex(&["#ff0000", "#00ff00", "#0000ff"]).unwrap();
        let stops: Vec<Rgb8> = (0..3).map(|i| palette.stop(i)).collect();
        let mut rng = Xorshift64::new(42);
        for _ in 0..50 {
            let picked = palette.pick(&mut rng);
            assert!(stops.contains(&picked), "pick returned non-stop {picked:?}");
        }
    }

    #[test]
    fn pick_eventually_visits_every_stop() {
        let palette = Palette::from_hex(&["#ff0000", "#00ff00", "#0000ff"]).unwrap();
        let mut rng = Xorshift64::new(7);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let picked = palette.pick(&mut rng);
            for i in 0..3 {
                if picked == palette.stop(i) {
                    seen[i] = true;
                }
            }
        }
        assert!(seen.iter().all(|&s| s), "some stop was never picked: {seen:?}");
    }

    #[test]
    fn pick_avoiding_excludes_recent_colors() {
        let palette = Palette::from_hex(&["#ff0000", "#00ff00", "#0000ff"]).unwrap();
        let mut rng = Xorshift64::new(3);
        let recent = vec![palette.stop(0), palette.stop(1)];
        for _ in 0..50 {
            let picked = palette.pick_avoiding(&mut rng, &recent);
            assert_eq!(picked, palette.stop(2), "picked a recently used color");
        }
    }

    #[test]
    fn pick_avoiding_falls_back_when_all_stops_are_recent() {
        let palette = Palette::from_hex(&["#ff0000", "#00ff00"]).unwrap();
        let mut rng = Xorshift64::new(4);
        let recent = vec![palette.stop(0), palette.stop(1)];
        let picked = palette.pick_avoiding(&mut rng, &recent);
        assert!(
            picked == palette.stop(0) || picked == palette.stop(1),
            "fallback pick was not a palette stop"
        );
    }

    #[test]
    fn pick_avoiding_with_empty_recent_behaves_like_pick() {
        let palette = Palette::nordic();
        let mut rng = Xorshift64::new(5);
        let picked = palette.pick_avoiding(&mut rng, &[]);
        let stops: Vec<Rgb8> = (0..palette.len()).map(|i| palette.stop(i)).collect();
        assert!(stops.contains(&picked));
    }

    // -- Built-in palette tests --

    #[test]
    fn every_named_palette_constructs() {
        for name in Palette::list_names() {
            let palette = Palette::from_name(name).unwrap();
            assert!(palette.len() >= 2, "palette '{name}' has too few stops");
        }
    }

    #[test]
    fn from_name_unknown_returns_error() {
        assert!(matches!(
            Palette::from_name("no-such-palette"),
            Err(EngineError::InvalidPalette(_))
        ));
    }

    #[test]
    fn list_names_matches_from_name() {
        assert_eq!(Palette::list_names().len(), 6);
    }

    #[test]
    fn stops_survive_the_hex_round_trip_approximately() {
        // OKLCh conversion plus 8-bit quantization may wobble a channel by
        // a step, but a stop must stay recognizably the same color.
        let palette = Palette::from_hex(&["#0077b6"]).unwrap();
        let stop = palette.stop(0);
        assert!((stop.r as i32 - 0x00).abs() <= 2);
        assert!((stop.g as i32 - 0x77).abs() <= 2);
        assert!((stop.b as i32 - 0xb6).abs() <= 2);
    }

    // -- Property-based tests --

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pick_never_panics_for_any_seed(seed: u64) {
                let palette = Palette::teal_coral();
                let mut rng = Xorshift64::new(seed);
                let _ = palette.pick(&mut rng);
            }

            #[test]
            fn pick_avoiding_never_returns_avoided_color_when_alternatives_exist(
                seed: u64,
                avoid_index in 0_usize..4,
            ) {
                let palette = Palette::ocean_blue();
                let mut rng = Xorshift64::new(seed);
                let recent = vec![palette.stop(avoid_index)];
                let picked = palette.pick_avoiding(&mut rng, &recent);
                prop_assert_ne!(picked, palette.stop(avoid_index));
            }
        }
    }
}
