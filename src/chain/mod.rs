//! Chain module: construction and live recomputation.
//!
//! One [`FilterChain`] per editing session. The chain owns the source
//! image, pushes it through its stages in order, and hands every newly
//! processed image to the registered observer.

mod builder;
#[allow(clippy::module_inception)]
mod chain;
mod serialization;

pub use builder::ChainBuilder;
pub use chain::{ChainId, FilterChain, ObserverCallback};
pub use serialization::{ChainState, StageState};
