//! Chain state snapshots.
//!
//! A snapshot captures stage order and current parameter values, never
//! pixel data. It exists for state transfer within a session (frontend
//! sync, undo stacks); nothing is persisted past the session's end.

use crate::core::types::{AdjustmentId, ParamValue};
use serde::{Deserialize, Serialize};

/// Serializable state of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    /// Which adjustment this stage instantiates.
    pub id: AdjustmentId,
    /// Name of the tunable parameter.
    pub parameter: String,
    /// Current parameter value.
    pub value: ParamValue,
}

/// Serializable state of a whole chain, in pipeline order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainState {
    /// Per-stage states, position 0 first.
    pub stages: Vec<StageState>,
}
