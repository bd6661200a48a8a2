#![deny(unsafe_code)]
//! Engine registry and dispatcher: maps style identifiers to engine
//! implementations and routes ink events to them.
//!
//! This crate sits between `ink-engine-core` (which defines the `Engine`
//! trait) and the individual engine crates. The [`Dispatcher`] owns one
//! engine per registered style, each with its own private buffer, and
//! guarantees the isolation and containment rules: a failing ink event is
//! logged and skipped, a missing style fails loud, stale events from
//! before a reset are discarded, and composition onto the shared surface
//! is idempotent.

#[cfg(feature = "png")]
pub mod snapshot;

use ink_engine_core::engine::{Engine, InitOptions};
use ink_engine_core::error::EngineError;
use ink_engine_core::{BlendMode, LayerBuffer, Rgb8, Surface};
use serde_json::Value;
use tracing::{debug, error, warn};

/// All available style identifiers.
const STYLE_NAMES: &[&str] = &[
    ink_engine_wash::STYLE,
    ink_engine_droplet::STYLE,
    ink_engine_splatter::STYLE,
];

/// Enumeration of all available ink rendering engines.
///
/// Wraps each engine implementation and delegates `Engine` trait methods.
/// Use [`EngineKind::from_name`] for string-based construction.
pub enum EngineKind {
    /// Layered watercolor washes.
    Wash(ink_engine_wash::WashEngine),
    /// Droplet streams and Gaussian scatter.
    Droplet(ink_engine_droplet::DropletEngine),
    /// Speed-driven splatter bursts.
    Splatter(ink_engine_splatter::SplatterEngine),
}

impl EngineKind {
    /// Constructs an engine by style name.
    ///
    /// Returns `EngineError::MissingEngine` if the name is not recognized.
    pub fn from_name(name: &str, seed: u64, params: &Value) -> Result<Self, EngineError> {
        match name {
            n if n == ink_engine_wash::STYLE => Ok(EngineKind::Wash(
                ink_engine_wash::WashEngine::from_json(seed, params),
            )),
            n if n == ink_engine_droplet::STYLE => Ok(EngineKind::Droplet(
                ink_engine_droplet::DropletEngine::from_json(seed, params),
            )),
            n if n == ink_engine_splatter::STYLE => Ok(EngineKind::Splatter(
                ink_engine_splatter::SplatterEngine::from_json(seed, params),
            )),
            _ => Err(EngineError::MissingEngine(name.to_string())),
        }
    }

    /// Returns a slice of all recognized style names.
    pub fn list_engines() -> &'static [&'static str] {
        STYLE_NAMES
    }
}

impl Engine for EngineKind {
    fn init(&mut self, opts: &InitOptions) -> Result<(), EngineError> {
        match self {
            EngineKind::Wash(e) => e.init(opts),
            EngineKind::Droplet(e) => e.init(opts),
            EngineKind::Splatter(e) => e.init(opts),
        }
    }

    fn execute(
        &mut self,
        symbol: Option<&str>,
        x: f64,
        y: f64,
        color: Rgb8,
    ) -> Result<(), EngineError> {
        match self {
            EngineKind::Wash(e) => e.execute(symbol, x, y, color),
            EngineKind::Droplet(e) => e.execute(symbol, x, y, color),
            EngineKind::Splatter(e) => e.execute(symbol, x, y, color),
        }
    }

    fn compose(&self, target: &mut Surface) -> Result<(), EngineError> {
        match self {
            EngineKind::Wash(e) => e.compose(target),
            EngineKind::Droplet(e) => e.compose(target),
            EngineKind::Splatter(e) => e.compose(target),
        }
    }

    fn dispose(&mut self) {
        match self {
            EngineKind::Wash(e) => e.dispose(),
            EngineKind::Droplet(e) => e.dispose(),
            EngineKind::Splatter(e) => e.dispose(),
        }
    }

    fn buffer(&self) -> Option<&LayerBuffer> {
        match self {
            EngineKind::Wash(e) => e.buffer(),
            EngineKind::Droplet(e) => e.buffer(),
            EngineKind::Splatter(e) => e.buffer(),
        }
    }

    fn buffer_mut(&mut self) -> Option<&mut LayerBuffer> {
        match self {
            EngineKind::Wash(e) => e.buffer_mut(),
            EngineKind::Droplet(e) => e.buffer_mut(),
            EngineKind::Splatter(e) => e.buffer_mut(),
        }
    }
}

/// One ink event as delivered by the driver, stamped with the dispatcher
/// epoch it was created under.
#[derive(Debug, Clone)]
pub struct InkEvent {
    pub epoch: u64,
    pub style: String,
    pub symbol: Option<String>,
    pub x: f64,
    pub y: f64,
    pub color: Rgb8,
}

struct Slot {
    style: String,
    engine: EngineKind,
    visible: bool,
}

/// Routes ink events to registered engines and composes their buffers onto
/// the shared surface.
///
/// Engines are registered once and re-initialized through the dispatcher on
/// reset/resize; a style whose `init` fails is dropped from the registry
/// rather than left half-initialized.
pub struct Dispatcher {
    slots: Vec<Slot>,
    epoch: u64,
    width: usize,
    height: usize,
}

impl Dispatcher {
    /// Creates an empty dispatcher for a surface of the given size.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        Ok(Self {
            slots: Vec::new(),
            epoch: 0,
            width,
            height,
        })
    }

    /// Creates a dispatcher with every built-in style registered.
    ///
    /// A style that fails to initialize is logged and skipped; the
    /// remaining styles stay usable.
    pub fn with_default_styles(width: usize, height: usize, seed: u64) -> Result<Self, EngineError> {
        let mut dispatcher = Self::new(width, height)?;
        for (i, name) in EngineKind::list_engines().iter().enumerate() {
            // Offset seeds so sibling engines do not mirror each other.
            if let Err(e) = dispatcher.register(name, seed.wrapping_add(i as u64), &Value::Null) {
                error!(style = %name, error = %e, "engine unavailable, style skipped");
            }
        }
        Ok(dispatcher)
    }

    /// Registers and initializes an engine for `style`.
    ///
    /// On init failure the engine is not registered and the error is
    /// returned, so the registry never holds a half-initialized engine.
    pub fn register(&mut self, style: &str, seed: u64, params: &Value) -> Result<(), EngineError> {
        let mut engine = EngineKind::from_name(style, seed, params)?;
        engine.init(&InitOptions::new(self.width, self.height))?;
        self.slots.push(Slot {
            style: style.to_string(),
            engine,
            visible: true,
        });
        Ok(())
    }

    /// The current epoch; events stamped with an older epoch are discarded.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Registered style names, in registration (composition) order.
    pub fn styles(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.style.as_str()).collect()
    }

    /// Borrow a registered engine, mainly for tests and drivers.
    pub fn engine(&self, style: &str) -> Option<&EngineKind> {
        self.slots
            .iter()
            .find(|s| s.style == style)
            .map(|s| &s.engine)
    }

    fn slot_mut(&mut self, style: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.style == style)
    }

    /// Builds an event for the active epoch.
    pub fn event(
        &self,
        style: &str,
        symbol: Option<&str>,
        x: f64,
        y: f64,
        color: Rgb8,
    ) -> InkEvent {
        InkEvent {
            epoch: self.epoch,
            style: style.to_string(),
            symbol: symbol.map(str::to_owned),
            x,
            y,
            color,
        }
    }

    /// Routes one ink event to the engine registered for `style`.
    ///
    /// An unknown style is reported as `EngineError::MissingEngine` — no
    /// default engine is silently substituted. A failure *inside* the
    /// resolved engine is contained: logged, the single event skipped, and
    /// `Ok(())` returned so subsequent events continue normally.
    pub fn dispatch(
        &mut self,
        style: &str,
        symbol: Option<&str>,
        x: f64,
        y: f64,
        color: Rgb8,
    ) -> Result<(), EngineError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.style == style)
            .ok_or_else(|| EngineError::MissingEngine(style.to_string()))?;

        // One engine's internal blend-mode changes must never leak into
        // the next call.
        if let Some(buf) = slot.engine.buffer_mut() {
            buf.set_blend_mode(BlendMode::SourceOver);
        }
        let result = slot.engine.execute(symbol, x, y, color);
        if let Some(buf) = slot.engine.buffer_mut() {
            buf.set_blend_mode(BlendMode::SourceOver);
        }

        if let Err(e) = result {
            warn!(style, error = %e, "ink event skipped");
        }
        Ok(())
    }

    /// Routes an epoch-stamped event, discarding events created before the
    /// last reset so they can never land on cleared buffers.
    pub fn submit(&mut self, event: &InkEvent) -> Result<(), EngineError> {
        if event.epoch != self.epoch {
            debug!(
                event_epoch = event.epoch,
                current_epoch = self.epoch,
                "stale ink event discarded"
            );
            return Ok(());
        }
        self.dispatch(
            &event.style,
            event.symbol.as_deref(),
            event.x,
            event.y,
            event.color,
        )
    }

    /// Hides or shows a style in composition without touching its paint.
    pub fn set_visible(&mut self, style: &str, visible: bool) -> Result<(), EngineError> {
        let slot = self
            .slot_mut(style)
            .ok_or_else(|| EngineError::MissingEngine(style.to_string()))?;
        slot.visible = visible;
        Ok(())
    }

    /// Whether a style takes part in composition.
    pub fn visible(&self, style: &str) -> Option<bool> {
        self.slots
            .iter()
            .find(|s| s.style == style)
            .map(|s| s.visible)
    }

    /// Bumps the epoch and re-initializes every engine at the new size
    /// with a forced clear. Engines whose re-init fails are dropped from
    /// the registry.
    pub fn reset(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        self.width = width;
        self.height = height;
        self.epoch += 1;
        let opts = InitOptions::new(width, height).with_force_clear();
        self.slots.retain_mut(|slot| {
            match slot.engine.init(&opts) {
                Ok(()) => true,
                Err(e) => {
                    error!(style = %slot.style, error = %e, "engine re-init failed, style dropped");
                    false
                }
            }
        });
        Ok(())
    }

    /// Composes every visible engine onto the surface in registration
    /// order, after restoring the surface to its paper base.
    ///
    /// Because the surface is reset first, repeated calls with no
    /// intervening ink events are pixel-identical.
    pub fn compose(&self, surface: &mut Surface) -> Result<(), EngineError> {
        surface.reset();
        for slot in self.slots.iter().filter(|s| s.visible) {
            slot.engine.compose(surface)?;
        }
        Ok(())
    }

    /// Disposes every engine and empties the registry.
    pub fn dispose(&mut self) {
        for slot in &mut self.slots {
            slot.engine.dispose();
        }
        self.slots.clear();
    }
}
