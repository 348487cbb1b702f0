// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Handles to the controller-side collaborators.
//!
//! The harness only stores these and hands them to runners; the wire
//! protocols behind them live with the controller.

use std::sync::Arc;

use crate::core::error::Result;

/// Returns the instruction id of the bundle currently being processed.
pub type InstructionIdSupplier = Arc<dyn Fn() -> String + Send + Sync>;

/// Address of one piece of state held by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// Values of `key` in the multimap materialization of a side input,
    /// restricted to `window` (both encoded with the side input's codecs).
    MultimapSideInput {
        node_id: String,
        side_input_label: String,
        window: Vec<u8>,
        key: Vec<u8>,
    },
    /// Per-key user state.
    BagUserState {
        node_id: String,
        state_id: String,
        window: Vec<u8>,
        key: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRequest {
    pub instruction_id: String,
    pub key: StateKey,
}

/// Fetches state on demand. Calls may block the calling bundle's thread.
pub trait StateClient: Send + Sync {
    fn get(&self, request: &StateRequest) -> Result<Vec<u8>>;
}

/// Sends encoded elements across the process boundary.
pub trait DataClient: Send + Sync {
    fn send(&self, instruction_id: &str, target: &str, data: &[u8]) -> Result<()>;
}

/// Primary and residual roots of a bundle split, as encoded elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleSplit {
    pub node_id: String,
    pub primary_roots: Vec<Vec<u8>>,
    pub residual_roots: Vec<Vec<u8>>,
}

/// Receives splits a runner performs while processing a bundle.
pub trait SplitListener: Send + Sync {
    fn split(&self, split: BundleSplit);
}

/// A state client for nodes without side inputs or user state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStateClient;

impl StateClient for NoStateClient {
    fn get(&self, request: &StateRequest) -> Result<Vec<u8>> {
        Err(crate::core::error::HarnessError::State(format!(
            "no state client configured for {:?}",
            request.key
        )))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSplitListener;

impl SplitListener for NoopSplitListener {
    fn split(&self, split: BundleSplit) {
        tracing::debug!(
            "Ignoring split of node '{}' ({} primary, {} residual roots)",
            split.node_id,
            split.primary_roots.len(),
            split.residual_roots.len()
        );
    }
}
