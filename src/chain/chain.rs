//! FilterChain: the ordered adjustment pipeline of one editing session.
//!
//! A chain is constructed once with a fixed layout, owns the session's
//! source image, and recomputes the full pipeline eagerly on every
//! mutation. One observer callback receives each newly processed image.
//! Every operation runs synchronously on the caller's thread; the chain
//! is not designed for concurrent invocation.

use crate::chain::builder::ChainBuilder;
use crate::chain::serialization::{ChainState, StageState};
use crate::core::error::ConfigurationError;
use crate::core::render::{RenderContext, RenderHandle};
use crate::core::stage::AdjustmentStage;
use crate::core::types::{AdjustmentId, Bitmap, ParamValue};
use crate::filters::registry::{FilterRegistry, FilterSpec};
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one editing session's chain, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub Uuid);

impl ChainId {
    /// Create a new random chain ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Callback invoked with every newly processed image.
///
/// `None` means the chain has nothing to show (e.g. a reset before any
/// image was set). Registration is explicit and lifetime-scoped: the
/// owner installs a callback with [`FilterChain::set_observer`] and
/// removes it with [`FilterChain::clear_observer`]; an absent observer
/// is always tolerated.
pub type ObserverCallback = Box<dyn FnMut(Option<&Bitmap>) + Send>;

/// One surviving pipeline stage plus the catalog data the chain still
/// needs after construction (conversion, reset default, parameter name).
pub(crate) struct StageSlot {
    pub(crate) spec: FilterSpec,
    pub(crate) stage: Box<dyn AdjustmentStage>,
}

/// Ordered adjustment pipeline with live recomputation.
///
/// Construction is best-effort: identifiers whose factory refuses are
/// skipped entirely, so the chain may hold fewer stages than the layout
/// requested. All later failure modes are absorbed: updating a filter
/// the chain never built is a silent no-op, and recomputing without a
/// source image yields a blank result. Nothing here panics or returns
/// an error once the chain exists.
pub struct FilterChain {
    id: ChainId,
    slots: Vec<StageSlot>,
    positions: HashMap<AdjustmentId, usize>,
    source: Option<Bitmap>,
    processed: Option<Bitmap>,
    observer: Option<ObserverCallback>,
    render: RenderHandle,
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("id", &self.id)
            .field("stages", &self.stage_ids())
            .field("source", &self.source.as_ref().map(Bitmap::extent))
            .field("processed", &self.processed.as_ref().map(Bitmap::extent))
            .field("observer", &self.observer.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl FilterChain {
    /// Construct a chain from an ordered layout of identifiers.
    ///
    /// Each identifier is looked up in the registry (an unregistered one
    /// is a [`ConfigurationError`], fatal to this attempt) and then
    /// instantiated. A factory that refuses contributes no stage and no
    /// position entry; construction continues with the rest. Stage order
    /// is exactly the layout order with refused identifiers removed.
    ///
    /// Duplicate identifiers each get their own stage; the position map
    /// keeps the last occurrence, so parameter updates drive the last
    /// duplicate.
    pub fn new(
        registry: &FilterRegistry,
        layout: &[AdjustmentId],
    ) -> Result<Self, ConfigurationError> {
        Self::with_context(registry, layout, RenderContext::shared())
    }

    /// Construct a chain that renders through an injected context.
    ///
    /// Use this to share one expensive [`RenderContext`] across every
    /// chain in the process instead of creating one per session.
    pub fn with_context(
        registry: &FilterRegistry,
        layout: &[AdjustmentId],
        render: RenderHandle,
    ) -> Result<Self, ConfigurationError> {
        let id = ChainId::new();
        let mut slots: Vec<StageSlot> = Vec::with_capacity(layout.len());
        let mut positions = HashMap::new();

        for &stage_id in layout {
            let spec = registry.lookup(stage_id)?;
            match spec.instantiate() {
                Some(stage) => {
                    positions.insert(stage_id, slots.len());
                    slots.push(StageSlot {
                        spec: spec.clone(),
                        stage,
                    });
                }
                None => {
                    // The filter library refused this stage; the chain
                    // degrades to fewer stages rather than failing.
                    warn!("chain {id}: filter '{stage_id}' unavailable, stage skipped");
                }
            }
        }

        debug!(
            "chain {id}: built {} of {} requested stages",
            slots.len(),
            layout.len()
        );
        Ok(Self {
            id,
            slots,
            positions,
            source: None,
            processed: None,
            observer: None,
            render,
        })
    }

    /// Start a fluent builder over a registry.
    pub fn builder(registry: &FilterRegistry) -> ChainBuilder<'_> {
        ChainBuilder::new(registry)
    }

    /// Install the observer callback.
    pub fn set_observer(&mut self, observer: ObserverCallback) {
        self.observer = Some(observer);
    }

    /// Remove the observer callback.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Replace the session's source image and recompute.
    ///
    /// `None` models a cancelled picker: the chain state is left
    /// entirely untouched, no recompute, no notification.
    pub fn set_image(&mut self, image: Option<Bitmap>) {
        let Some(image) = image else {
            trace!("chain {}: no image supplied, state unchanged", self.id);
            return;
        };
        if let Some(first) = self.slots.first_mut() {
            first.stage.set_input(image.clone());
        }
        self.source = Some(image);
        self.recompute();
    }

    /// Update one filter's user-facing scalar and recompute.
    ///
    /// An identifier without a stage in this chain (skipped at
    /// construction, or simply not in the layout) is a silent no-op:
    /// the chain was built best-effort, so there is nothing to report
    /// and the observer is not notified either.
    pub fn update_parameter(&mut self, id: AdjustmentId, value: f64) {
        let Some(&index) = self.positions.get(&id) else {
            debug!(
                "chain {}: parameter update for absent stage '{id}' ignored",
                self.id
            );
            return;
        };
        let slot = &mut self.slots[index];
        let converted = slot.spec.convert(value);
        if let Err(err) = slot.stage.set_parameter(converted) {
            warn!("chain {}: stage '{id}' rejected {converted}: {err}", self.id);
            return;
        }
        trace!(
            "chain {}: {id}.{} = {converted}",
            self.id,
            slot.spec.parameter()
        );
        self.recompute();
    }

    /// Restore every stage's default and show the pristine source.
    ///
    /// Reset deliberately bypasses recomputation and notifies with the
    /// unfiltered source image directly, leaving the recompute cache
    /// untouched; recomputing a default-parameter pipeline would be the
    /// other defensible reading, pending product confirmation. With no
    /// source set, the observer is notified with `None`.
    pub fn reset_all(&mut self) {
        for slot in &mut self.slots {
            let default = slot.spec.default_value();
            if let Err(err) = slot.stage.set_parameter(default) {
                warn!(
                    "chain {}: stage '{}' rejected its default {default}: {err}",
                    self.id,
                    slot.spec.id()
                );
            }
        }
        let source = self.source.clone();
        self.notify(source.as_ref());
    }

    /// The most recently set unfiltered image.
    pub fn source_image(&self) -> Option<&Bitmap> {
        self.source.as_ref()
    }

    /// The result of the most recent full pipeline evaluation.
    pub fn processed_image(&self) -> Option<&Bitmap> {
        self.processed.as_ref()
    }

    /// Surviving stage identifiers in pipeline order.
    pub fn stage_ids(&self) -> Vec<AdjustmentId> {
        self.slots.iter().map(|slot| slot.spec.id()).collect()
    }

    /// Whether this chain built a stage for an identifier.
    pub fn contains(&self, id: AdjustmentId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Current parameter value of the stage registered under `id`.
    pub fn parameter(&self, id: AdjustmentId) -> Option<ParamValue> {
        self.positions
            .get(&id)
            .map(|&index| self.slots[index].stage.parameter())
    }

    /// Number of surviving stages.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// This chain's log-correlation identifier.
    pub fn id(&self) -> ChainId {
        self.id
    }

    /// Snapshot of stage order and current parameter values.
    pub fn snapshot(&self) -> ChainState {
        ChainState {
            stages: self
                .slots
                .iter()
                .map(|slot| StageState {
                    id: slot.spec.id(),
                    parameter: slot.spec.parameter().to_string(),
                    value: slot.stage.parameter(),
                })
                .collect(),
        }
    }

    /// Apply a snapshot's parameter values, then recompute once.
    ///
    /// Stages the snapshot mentions but this chain never built are
    /// skipped, mirroring [`FilterChain::update_parameter`].
    pub fn restore(&mut self, state: &ChainState) {
        for stage_state in &state.stages {
            let Some(&index) = self.positions.get(&stage_state.id) else {
                debug!(
                    "chain {}: snapshot stage '{}' absent, skipped",
                    self.id, stage_state.id
                );
                continue;
            };
            if let Err(err) = self.slots[index].stage.set_parameter(stage_state.value) {
                warn!(
                    "chain {}: snapshot value {} rejected by '{}': {err}",
                    self.id, stage_state.value, stage_state.id
                );
            }
        }
        self.recompute();
    }

    /// Set a parameter without recomputing or notifying; builder presets.
    pub(crate) fn preset_parameter(&mut self, id: AdjustmentId, value: f64) {
        let Some(&index) = self.positions.get(&id) else {
            debug!("chain {}: preset for absent stage '{id}' ignored", self.id);
            return;
        };
        let slot = &mut self.slots[index];
        let converted = slot.spec.convert(value);
        if let Err(err) = slot.stage.set_parameter(converted) {
            warn!("chain {}: preset {converted} rejected by '{id}': {err}", self.id);
        }
    }

    /// Full pipeline evaluation: relink every stage's output to the next
    /// stage's input in order, pull the final output, and rasterize it
    /// back into the source extent. Eager and synchronous; nothing is
    /// cached between calls except the final result.
    fn recompute(&mut self) {
        let result = if self.slots.is_empty() {
            // Identity pipeline: the source passes through untouched.
            self.source.clone().unwrap_or_else(Bitmap::empty)
        } else {
            for i in 0..self.slots.len() - 1 {
                if let Some(image) = self.slots[i].stage.output() {
                    self.slots[i + 1].stage.set_input(image);
                }
            }
            let last = self.slots.len() - 1;
            match self.slots[last].stage.output() {
                Some(image) => {
                    let extent = self.source.as_ref().map(Bitmap::extent).unwrap_or_default();
                    self.render.lock().render(&image, extent)
                }
                // Recompute before any source image: blank, not an error.
                None => Bitmap::empty(),
            }
        };
        trace!("chain {}: recomputed {}", self.id, result.extent());
        self.processed = Some(result);
        let processed = self.processed.clone();
        self.notify(processed.as_ref());
    }

    fn notify(&mut self, image: Option<&Bitmap>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Extent;
    use crate::filters::builtin::Temperature;
    use crate::filters::registry::FilterSpec;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::sync::Arc;

    type Observed = Arc<Mutex<Vec<Option<Bitmap>>>>;

    fn recording_observer() -> (Observed, ObserverCallback) {
        let observed: Observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        let callback: ObserverCallback =
            Box::new(move |image| sink.lock().push(image.cloned()));
        (observed, callback)
    }

    /// Registry whose sharpness factory refuses, for skip-path tests.
    fn registry_without_sharpness() -> FilterRegistry {
        let mut registry = FilterRegistry::with_builtins();
        registry.register(FilterSpec::new(
            AdjustmentId::Sharpness,
            "sharpness",
            || None,
            ParamValue::Scalar,
            ParamValue::Scalar(0.4),
        ));
        registry
    }

    fn max_saturation(bitmap: &Bitmap) -> u8 {
        bitmap
            .pixels()
            .pixels()
            .map(|p| p[0].max(p[1]).max(p[2]) - p[0].min(p[1]).min(p[2]))
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_failed_instantiation_skips_the_stage() {
        let registry = registry_without_sharpness();
        let chain = FilterChain::new(
            &registry,
            &[
                AdjustmentId::Temperature,
                AdjustmentId::Sharpness,
                AdjustmentId::Vibrance,
            ],
        )
        .unwrap();

        assert_eq!(
            chain.stage_ids(),
            vec![AdjustmentId::Temperature, AdjustmentId::Vibrance]
        );
        assert!(!chain.contains(AdjustmentId::Sharpness));
        // Surviving positions stay valid after the gap.
        assert_eq!(
            chain.parameter(AdjustmentId::Vibrance),
            Some(ParamValue::Scalar(0.0))
        );
    }

    #[test]
    fn test_unregistered_identifier_is_fatal_to_construction() {
        let registry = FilterRegistry::new();
        let err = FilterChain::new(&registry, &[AdjustmentId::Hue]).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownFilter("hue".to_string()));
    }

    #[test]
    fn test_identity_pipeline_reports_the_source_unchanged() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(&registry, &[]).unwrap();
        let (observed, callback) = recording_observer();
        chain.set_observer(callback);

        let source = Bitmap::solid(4, 4, [7, 77, 177, 255]);
        chain.set_image(Some(source.clone()));

        let processed = chain.processed_image().unwrap();
        assert!(processed.ptr_eq(&source));
        assert_eq!(observed.lock().as_slice(), &[Some(source)]);
    }

    #[test]
    fn test_set_image_none_is_a_strict_noop() {
        let registry = FilterRegistry::with_builtins();
        let mut chain =
            FilterChain::new(&registry, &[AdjustmentId::Temperature]).unwrap();
        let (observed, callback) = recording_observer();
        chain.set_observer(callback);

        chain.set_image(None);

        assert!(chain.source_image().is_none());
        assert!(chain.processed_image().is_none());
        assert!(observed.lock().is_empty());
    }

    #[test]
    fn test_recompute_without_source_yields_blank() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(&registry, &[AdjustmentId::Hue]).unwrap();
        chain.update_parameter(AdjustmentId::Hue, 1.0);
        assert!(chain.processed_image().unwrap().is_empty());
    }

    #[test]
    fn test_update_for_absent_stage_changes_nothing_and_stays_silent() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(
            &registry,
            &[AdjustmentId::Temperature, AdjustmentId::Vibrance],
        )
        .unwrap();
        chain.set_image(Some(Bitmap::solid(4, 4, [120, 100, 90, 255])));
        let before = chain.processed_image().unwrap().clone();

        let (observed, callback) = recording_observer();
        chain.set_observer(callback);
        chain.update_parameter(AdjustmentId::Hue, 1.0);

        assert!(chain.processed_image().unwrap().ptr_eq(&before));
        assert_eq!(chain.parameter(AdjustmentId::Temperature), Some(Temperature::DEFAULT));
        assert_eq!(chain.parameter(AdjustmentId::Vibrance), Some(ParamValue::Scalar(0.0)));
        // No notification for a no-op.
        assert!(observed.lock().is_empty());
    }

    #[test]
    fn test_parameter_isolation() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(
            &registry,
            &[AdjustmentId::Temperature, AdjustmentId::Vibrance],
        )
        .unwrap();

        chain.update_parameter(AdjustmentId::Temperature, 5000.0);

        assert_eq!(
            chain.parameter(AdjustmentId::Temperature),
            Some(ParamValue::Vector2(5000.0, 0.0))
        );
        assert_eq!(
            chain.parameter(AdjustmentId::Vibrance),
            Some(ParamValue::Scalar(0.0))
        );
    }

    #[test]
    fn test_two_stage_chain_composes_sequentially() {
        let registry = FilterRegistry::with_builtins();
        let source = Bitmap::solid(4, 4, [140, 110, 95, 255]);

        // Combined pipeline.
        let mut combined = FilterChain::new(
            &registry,
            &[AdjustmentId::Temperature, AdjustmentId::Vibrance],
        )
        .unwrap();
        combined.set_image(Some(source.clone()));
        combined.update_parameter(AdjustmentId::Temperature, 5000.0);
        combined.update_parameter(AdjustmentId::Vibrance, 0.8);
        let chained = combined.processed_image().unwrap().clone();

        // Same stages applied one chain at a time.
        let mut first = FilterChain::new(&registry, &[AdjustmentId::Temperature]).unwrap();
        first.set_image(Some(source));
        first.update_parameter(AdjustmentId::Temperature, 5000.0);
        let intermediate = first.processed_image().unwrap().clone();

        let mut second = FilterChain::new(&registry, &[AdjustmentId::Vibrance]).unwrap();
        second.set_image(Some(intermediate));
        second.update_parameter(AdjustmentId::Vibrance, 0.8);

        assert_eq!(second.processed_image().unwrap(), &chained);
    }

    #[test]
    fn test_reset_is_idempotent_and_shows_the_source() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(
            &registry,
            &[AdjustmentId::Temperature, AdjustmentId::Vibrance],
        )
        .unwrap();
        let (observed, callback) = recording_observer();
        chain.set_observer(callback);

        let source = Bitmap::solid(4, 4, [120, 100, 90, 255]);
        chain.set_image(Some(source.clone()));
        chain.update_parameter(AdjustmentId::Vibrance, 0.9);

        chain.reset_all();
        chain.reset_all();

        let observed = observed.lock();
        let last_two = &observed[observed.len() - 2..];
        assert_eq!(last_two[0], Some(source.clone()));
        assert_eq!(last_two[1], Some(source));
        // Parameters are back at their defaults.
        assert_eq!(chain.parameter(AdjustmentId::Vibrance), Some(ParamValue::Scalar(0.0)));
    }

    #[test]
    fn test_reset_without_source_notifies_none() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(&registry, &[AdjustmentId::Hue]).unwrap();
        let (observed, callback) = recording_observer();
        chain.set_observer(callback);

        chain.reset_all();

        assert_eq!(observed.lock().as_slice(), &[None]);
    }

    #[test]
    fn test_cleared_observer_is_not_called() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(&registry, &[AdjustmentId::Vibrance]).unwrap();
        let (observed, callback) = recording_observer();
        chain.set_observer(callback);
        chain.clear_observer();

        chain.set_image(Some(Bitmap::solid(2, 2, [9, 9, 9, 255])));
        chain.update_parameter(AdjustmentId::Vibrance, 0.5);

        assert!(observed.lock().is_empty());
    }

    #[test]
    fn test_duplicate_identifiers_update_the_last_occurrence() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(
            &registry,
            &[AdjustmentId::Vibrance, AdjustmentId::Vibrance],
        )
        .unwrap();
        assert_eq!(chain.len(), 2);

        chain.update_parameter(AdjustmentId::Vibrance, 0.7);

        let state = chain.snapshot();
        assert_eq!(state.stages[0].value, ParamValue::Scalar(0.0));
        assert_eq!(state.stages[1].value, ParamValue::Scalar(0.7));
    }

    #[test]
    fn test_gray_scenario() {
        // Chain [temperature, vibrance, hue] over a 4x4 solid gray.
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(
            &registry,
            &[
                AdjustmentId::Temperature,
                AdjustmentId::Vibrance,
                AdjustmentId::Hue,
            ],
        )
        .unwrap();
        let source = Bitmap::solid(4, 4, [128, 128, 128, 255]);
        chain.set_image(Some(source.clone()));

        // Temperature at its 6500 K default is an exact identity.
        chain.update_parameter(AdjustmentId::Temperature, 6500.0);
        assert_eq!(chain.processed_image().unwrap(), &source);

        // Vibrance never reduces saturation; gray stays gray, and the
        // extent stays the source extent.
        let before = max_saturation(chain.processed_image().unwrap());
        chain.update_parameter(AdjustmentId::Vibrance, 1.0);
        let processed = chain.processed_image().unwrap();
        assert_eq!(processed.extent(), Extent::new(4, 4));
        assert!(max_saturation(processed) >= before);
    }

    #[test]
    fn test_vibrance_strictly_raises_saturation_of_colored_sources() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(
            &registry,
            &[AdjustmentId::Temperature, AdjustmentId::Vibrance],
        )
        .unwrap();
        let source = Bitmap::solid(4, 4, [140, 110, 95, 255]);
        chain.set_image(Some(source.clone()));

        let before = max_saturation(chain.processed_image().unwrap());
        chain.update_parameter(AdjustmentId::Vibrance, 1.0);
        let processed = chain.processed_image().unwrap();

        assert_eq!(processed.extent(), source.extent());
        assert!(max_saturation(processed) > before);
    }

    #[test]
    fn test_every_mutation_notifies_exactly_once() {
        let registry = FilterRegistry::with_builtins();
        let mut chain = FilterChain::new(&registry, &[AdjustmentId::Vibrance]).unwrap();
        let (observed, callback) = recording_observer();
        chain.set_observer(callback);

        chain.set_image(Some(Bitmap::solid(2, 2, [50, 60, 70, 255])));
        chain.update_parameter(AdjustmentId::Vibrance, 0.3);
        chain.update_parameter(AdjustmentId::Vibrance, 0.6);
        chain.reset_all();

        assert_eq!(observed.lock().len(), 4);
    }

    proptest! {
        /// Stage order always equals the layout order; with every
        /// builtin factory succeeding, nothing is dropped.
        #[test]
        fn stage_order_follows_layout(indices in prop::collection::vec(0usize..4, 0..8)) {
            let layout: Vec<AdjustmentId> =
                indices.iter().map(|&i| AdjustmentId::ALL[i]).collect();
            let registry = FilterRegistry::with_builtins();
            let chain = FilterChain::new(&registry, &layout).unwrap();
            prop_assert_eq!(chain.stage_ids(), layout);
        }

        /// With a refusing sharpness factory, the surviving order is the
        /// layout order with sharpness removed.
        #[test]
        fn skipped_stages_preserve_relative_order(indices in prop::collection::vec(0usize..4, 0..8)) {
            let layout: Vec<AdjustmentId> =
                indices.iter().map(|&i| AdjustmentId::ALL[i]).collect();
            let registry = registry_without_sharpness();
            let chain = FilterChain::new(&registry, &layout).unwrap();
            let expected: Vec<AdjustmentId> = layout
                .iter()
                .copied()
                .filter(|&id| id != AdjustmentId::Sharpness)
                .collect();
            prop_assert_eq!(chain.stage_ids(), expected);
        }
    }
}
