//! # Tonechain - Chained Photo Adjustments
//!
//! Tonechain is a photo-adjustment pipeline library. It composes a fixed
//! catalog of named, parameterized adjustments (temperature, vibrance,
//! hue, sharpness) into an ordered chain, feeds a source image through
//! them in sequence, and recomputes the full pipeline on every parameter
//! change so an observer can preview the result live.
//!
//! ## Features
//!
//! - **Ordered Pipeline**: stage order is construction order, period
//! - **Closed, Typed Catalog**: identifiers and parameter values are
//!   enums, not string keys; the registry table is checked by tests
//! - **Best-effort Construction**: an adjustment the filter library
//!   cannot provide is skipped, not fatal
//! - **Live Recomputation**: every slider tick re-evaluates the whole
//!   chain and notifies the observer
//! - **Extensible**: new adjustments are new registry entries, never
//!   new chain logic
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tonechain::prelude::*;
//!
//! // The builtin catalog
//! let registry = FilterRegistry::with_builtins();
//!
//! // One chain per editing session
//! let mut chain = FilterChain::builder(&registry)
//!     .add(AdjustmentId::Temperature)
//!     .add(AdjustmentId::Vibrance)
//!     .add(AdjustmentId::Hue)
//!     .with_observer(|image| {
//!         if let Some(image) = image {
//!             println!("preview {}", image.extent());
//!         }
//!     })
//!     .build()?;
//!
//! // Pick a photo, drag some sliders
//! chain.set_image(Some(Bitmap::open("photo.jpg")?));
//! chain.update_parameter(AdjustmentId::Temperature, 5200.0);
//! chain.update_parameter(AdjustmentId::Vibrance, 0.4);
//!
//! // Back to the original
//! chain.reset_all();
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: value types, the stage trait, errors, the render context
//! - [`filters`]: the registry and the builtin adjustment catalog
//! - [`chain`]: the chain itself, its builder, and state snapshots
//!
//! ## Adding an Adjustment
//!
//! Implement [`core::stage::AdjustmentStage`], add an [`core::types::AdjustmentId`]
//! variant, and register a [`filters::registry::FilterSpec`] naming the
//! stage's factory, parameter key, scalar conversion and default. The
//! chain picks it up without modification.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod core;
pub mod filters;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use tonechain::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{AdjustmentId, Bitmap, Extent, ParamKind, ParamValue};

    // Stage trait
    pub use crate::core::stage::AdjustmentStage;

    // Rendering
    pub use crate::core::render::{RenderContext, RenderHandle};

    // Errors
    pub use crate::core::error::{
        ConfigurationError, ParamError, TonechainError, TonechainResult,
    };

    // Chain
    pub use crate::chain::{
        ChainBuilder, ChainId, ChainState, FilterChain, ObserverCallback, StageState,
    };

    // Registry
    pub use crate::filters::registry::{FilterRegistry, FilterSpec, ScalarConvert, StageFactory};

    // Builtin adjustments
    pub use crate::filters::builtin::{Hue, Sharpness, Temperature, Vibrance};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
