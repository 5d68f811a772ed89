//! Builtin adjustment implementations.
//!
//! The closed catalog the chain draws from: temperature, vibrance, hue
//! and sharpness.

mod color;
mod sharpen;

use crate::filters::registry::FilterRegistry;

/// Register every builtin adjustment.
pub fn register_all(registry: &mut FilterRegistry) {
    color::register(registry);
    sharpen::register(registry);
}

// Re-export for direct access
pub use color::{Hue, Temperature, Vibrance};
pub use sharpen::Sharpness;
