//! Filter registry: the closed catalog of available adjustments.

use crate::core::error::ConfigurationError;
use crate::core::stage::AdjustmentStage;
use crate::core::types::{AdjustmentId, ParamValue};
use indexmap::IndexMap;

/// Factory function producing a fresh stage instance.
///
/// `None` means the adjustment cannot be instantiated in this build;
/// chain construction skips the stage instead of failing.
pub type StageFactory = fn() -> Option<Box<dyn AdjustmentStage>>;

/// Conversion from a user-facing slider scalar to the value type the
/// stage's parameter expects.
pub type ScalarConvert = fn(f64) -> ParamValue;

/// Catalog entry for one adjustment.
///
/// Bundles everything the chain needs to know about a filter: how to
/// create a stage, which parameter it tunes, how to convert a slider
/// scalar into that parameter's value type, and what to restore on
/// reset. `convert` and `default_value` must produce the kind the
/// factory's stage accepts; the builtin table is tested for this.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    id: AdjustmentId,
    parameter: &'static str,
    factory: StageFactory,
    convert: ScalarConvert,
    default_value: ParamValue,
}

impl FilterSpec {
    /// Create a catalog entry.
    pub fn new(
        id: AdjustmentId,
        parameter: &'static str,
        factory: StageFactory,
        convert: ScalarConvert,
        default_value: ParamValue,
    ) -> Self {
        Self {
            id,
            parameter,
            factory,
            convert,
            default_value,
        }
    }

    /// The identifier this entry is registered under.
    pub fn id(&self) -> AdjustmentId {
        self.id
    }

    /// Name of the tunable parameter on the stage.
    pub fn parameter(&self) -> &'static str {
        self.parameter
    }

    /// Create a fresh stage with its default parameter applied.
    ///
    /// `None` when the factory refuses; no side effects either way.
    pub fn instantiate(&self) -> Option<Box<dyn AdjustmentStage>> {
        (self.factory)()
    }

    /// Convert a user-facing scalar into the stage's parameter value.
    pub fn convert(&self, scalar: f64) -> ParamValue {
        (self.convert)(scalar)
    }

    /// The value restored on reset.
    pub fn default_value(&self) -> ParamValue {
        self.default_value
    }
}

/// Registry of all available adjustments.
///
/// Holds one [`FilterSpec`] per identifier in registration order. The
/// registry is immutable once populated and carries no other state, so
/// it is safe to share across chains and threads.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    specs: IndexMap<AdjustmentId, FilterSpec>,
}

impl FilterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            specs: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with the builtin adjustments.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filters::builtin::register_all(&mut registry);
        registry
    }

    /// Register a catalog entry.
    ///
    /// A later registration for the same identifier replaces the earlier
    /// one, which is how a custom build overrides a builtin.
    pub fn register(&mut self, spec: FilterSpec) {
        self.specs.insert(spec.id(), spec);
    }

    /// Look up the entry for an identifier.
    ///
    /// Fails fast with a [`ConfigurationError`]: asking this registry
    /// for something it does not hold is a programming error at the
    /// call site, never silently ignored here. (Contrast with chain
    /// construction, which skips entries whose *factory* refuses.)
    pub fn lookup(&self, id: AdjustmentId) -> Result<&FilterSpec, ConfigurationError> {
        self.specs
            .get(&id)
            .ok_or_else(|| ConfigurationError::UnknownFilter(id.to_string()))
    }

    /// Look up an entry by its configuration-file name.
    pub fn parse(&self, name: &str) -> Result<&FilterSpec, ConfigurationError> {
        let id = name.parse::<AdjustmentId>()?;
        self.lookup(id)
    }

    /// Create a stage for an identifier.
    ///
    /// `None` when the identifier is unregistered or its factory
    /// refuses; no side effects.
    pub fn instantiate(&self, id: AdjustmentId) -> Option<Box<dyn AdjustmentStage>> {
        self.specs.get(&id)?.instantiate()
    }

    /// Whether an identifier is registered.
    pub fn contains(&self, id: AdjustmentId) -> bool {
        self.specs.contains_key(&id)
    }

    /// Registered identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = AdjustmentId> + '_ {
        self.specs.keys().copied()
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
