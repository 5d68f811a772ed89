//! Fluent chain construction.
//!
//! A plain builder stands in for the operator-chaining construction
//! style some pipeline libraries grow: `add` appends a stage,
//! `configure` records an initial slider value, and `build` produces
//! the finished chain. No operator overloading required.

use crate::chain::chain::{FilterChain, ObserverCallback};
use crate::core::error::ConfigurationError;
use crate::core::render::{RenderContext, RenderHandle};
use crate::core::types::{AdjustmentId, Bitmap};
use crate::filters::registry::FilterRegistry;

/// Builder for a [`FilterChain`].
///
/// Obtained from [`FilterChain::builder`]. Initial values recorded with
/// [`ChainBuilder::configure`] are applied silently at build time: no
/// recompute runs and no observer fires before the first real mutation.
pub struct ChainBuilder<'r> {
    registry: &'r FilterRegistry,
    layout: Vec<AdjustmentId>,
    presets: Vec<(AdjustmentId, f64)>,
    render: Option<RenderHandle>,
    observer: Option<ObserverCallback>,
}

impl<'r> ChainBuilder<'r> {
    pub(crate) fn new(registry: &'r FilterRegistry) -> Self {
        Self {
            registry,
            layout: Vec::new(),
            presets: Vec::new(),
            render: None,
            observer: None,
        }
    }

    /// Append a stage to the pipeline.
    pub fn add(mut self, id: AdjustmentId) -> Self {
        self.layout.push(id);
        self
    }

    /// Record an initial user-facing value for a stage.
    ///
    /// Values for stages that end up skipped are ignored, like any other
    /// update against an absent stage.
    pub fn configure(mut self, id: AdjustmentId, value: f64) -> Self {
        self.presets.push((id, value));
        self
    }

    /// Render through a shared context instead of a chain-private one.
    pub fn with_context(mut self, render: RenderHandle) -> Self {
        self.render = Some(render);
        self
    }

    /// Install the observer callback.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(Option<&Bitmap>) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Construct the chain.
    pub fn build(self) -> Result<FilterChain, ConfigurationError> {
        let render = self.render.unwrap_or_else(RenderContext::shared);
        let mut chain = FilterChain::with_context(self.registry, &self.layout, render)?;
        for (id, value) in self.presets {
            chain.preset_parameter(id, value);
        }
        if let Some(observer) = self.observer {
            chain.set_observer(observer);
        }
        Ok(chain)
    }
}
