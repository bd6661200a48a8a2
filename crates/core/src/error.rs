//! Error types for the ink-engine core.

use thiserror::Error;

/// Errors produced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero when creating a buffer or surface.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// Degenerate geometry input (zero/negative radius, too few vertices).
    ///
    /// The affected render pass must be skipped, never substituted with a
    /// fallback shape.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A requested style identifier has no registered engine.
    ///
    /// Surfaced to the caller rather than silently falling back to a
    /// default engine.
    #[error("no engine registered for style '{0}'")]
    MissingEngine(String),

    /// An engine was asked to draw before `init` gave it a buffer.
    #[error("engine for style '{0}' has not been initialized")]
    Uninitialized(String),

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A palette could not be constructed from the given colors.
    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    /// An I/O failure while writing a snapshot.
    #[error("io error: {0}")]
    Io(String),
}
