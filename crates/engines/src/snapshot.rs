//! CPU-side PNG rendering of a composed [`Surface`].
//!
//! This module is feature-gated behind `png` (default on) so embedders can
//! depend on the registry without pulling in the `image` crate.

use ink_engine_core::error::EngineError;
use ink_engine_core::surface::Surface;
use std::path::Path;

/// Writes the surface's working pixels as a PNG image.
///
/// Returns `EngineError::InvalidDimensions` if the surface dimensions
/// overflow `u32`, or `EngineError::Io` on write failure.
pub fn write_png(surface: &Surface, path: &Path) -> Result<(), EngineError> {
    let w = u32::try_from(surface.width()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(surface.height()).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, surface.data().to_vec())
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))
}
