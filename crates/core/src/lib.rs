#![deny(unsafe_code)]
//! Core types and algorithms for the ink-engine watercolor system.
//!
//! Provides the `Engine` trait, `LayerBuffer`/`BlendMode`/`Surface` raster
//! model, the organic shape generator, the `InkState` accumulation machine,
//! color types (`Rgb8`, `Srgb`, `OkLab`, `OkLch`), discrete `Palette`s,
//! `Xorshift64` PRNG, Perlin `NoiseField`, a monotonic `Clock`, and JSON
//! parameter helpers.

pub mod buffer;
pub mod clock;
pub mod color;
pub mod engine;
pub mod error;
pub mod ink;
pub mod noise_field;
pub mod palette;
pub mod params;
pub mod prng;
pub mod shape;
pub mod surface;

pub use buffer::{BlendMode, LayerBuffer};
pub use clock::Clock;
pub use color::{LinearRgb, OkLab, OkLch, Rgb8, Srgb};
pub use engine::{is_boundary, Engine, InitOptions};
pub use error::EngineError;
pub use ink::{InkParams, InkPhase, InkState};
pub use noise_field::NoiseField;
pub use palette::Palette;
pub use prng::Xorshift64;
pub use shape::{organic_polygon, Polygon, ShapeSpec};
pub use surface::Surface;
