//! The core `Engine` trait that every ink rendering engine must implement.
//!
//! The trait is object-safe so engines can be used as `dyn Engine` for
//! runtime switching between rendering styles.

use crate::buffer::LayerBuffer;
use crate::color::Rgb8;
use crate::error::EngineError;
use crate::surface::Surface;

/// Initialization/re-initialization options for an engine.
///
/// `force_clear` distinguishes "new viewport size, preserve paint if the
/// size is unchanged" from "hard reset, wipe regardless".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOptions {
    pub width: usize,
    pub height: usize,
    pub force_clear: bool,
}

impl InitOptions {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            force_clear: false,
        }
    }

    pub fn with_force_clear(mut self) -> Self {
        self.force_clear = true;
        self
    }
}

/// Core trait for ink rendering engines.
///
/// Each engine owns exactly one private [`LayerBuffer`] and its own
/// accumulation state; engines never read or write another engine's
/// buffer. The lifecycle is `init` -> many `execute` calls -> periodic
/// `compose` onto the shared surface -> `dispose`.
///
/// This trait is **object-safe**: you can use `Box<dyn Engine>` or
/// `&mut dyn Engine` for runtime polymorphism.
pub trait Engine {
    /// Allocates (or reallocates) the private buffer at the given
    /// dimensions and resets accumulation state.
    ///
    /// A same-size re-init without `force_clear` preserves accumulated
    /// paint; a size change always recreates the buffer.
    fn init(&mut self, opts: &InitOptions) -> Result<(), EngineError>;

    /// Processes one ink event at `(x, y)` in shared-surface pixel space.
    ///
    /// A `None`, empty, or whitespace-only `symbol` signals a boundary
    /// (e.g. end of word): the engine resets its ink state and draws
    /// nothing.
    fn execute(
        &mut self,
        symbol: Option<&str>,
        x: f64,
        y: f64,
        color: Rgb8,
    ) -> Result<(), EngineError>;

    /// Merges this engine's private buffer onto the shared surface with a
    /// plain source-over blit.
    fn compose(&self, target: &mut Surface) -> Result<(), EngineError>;

    /// Releases the private buffer and resets all state.
    fn dispose(&mut self);

    /// The engine's private buffer, if initialized.
    fn buffer(&self) -> Option<&LayerBuffer>;

    /// Mutable access to the private buffer, used by the dispatcher to
    /// normalize the blend mode between ink events.
    fn buffer_mut(&mut self) -> Option<&mut LayerBuffer>;
}

/// True when a symbol signals a boundary rather than a drawable mark.
pub fn is_boundary(symbol: Option<&str>) -> bool {
    match symbol {
        None => true,
        Some(s) => s.trim().is_empty(),
    }
}
