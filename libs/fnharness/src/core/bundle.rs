// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::fmt;

use parking_lot::Mutex;

use crate::core::error::Result;

pub type BundleFunction = Box<dyn FnMut() -> Result<()> + Send>;

/// Ordered list of per-node bundle callbacks.
///
/// The controller keeps one registry for bundle start and one for bundle
/// finish, and invokes each once per bundle. Consumers are built before
/// their producers, so start functions run with [`run_all`](Self::run_all)
/// and finish functions must run with
/// [`run_all_reversed`](Self::run_all_reversed): a producer's finish may
/// still emit into its consumers.
#[derive(Default)]
pub struct BundleFunctionRegistry {
    functions: Mutex<Vec<(String, BundleFunction)>>,
}

impl BundleFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, node_id: impl Into<String>, function: BundleFunction) {
        let node_id = node_id.into();
        tracing::debug!("Registered bundle function for node '{}'", node_id);
        self.functions.lock().push((node_id, function));
    }

    pub fn len(&self) -> usize {
        self.functions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.lock().is_empty()
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.functions
            .lock()
            .iter()
            .map(|(node_id, _)| node_id.clone())
            .collect()
    }

    /// Invoke every function in registration order, stopping at the first
    /// error.
    pub fn run_all(&self) -> Result<()> {
        self.functions
            .lock()
            .iter_mut()
            .try_for_each(|(node_id, function)| invoke(node_id, function))
    }

    /// Invoke every function in reverse registration order, stopping at the
    /// first error.
    pub fn run_all_reversed(&self) -> Result<()> {
        self.functions
            .lock()
            .iter_mut()
            .rev()
            .try_for_each(|(node_id, function)| invoke(node_id, function))
    }
}

fn invoke(node_id: &str, function: &mut BundleFunction) -> Result<()> {
    let span = tracing::debug_span!("bundle_fn", node = %node_id);
    let _guard = span.enter();
    function().inspect_err(|e| {
        tracing::error!("Bundle function for node '{}' failed: {}", node_id, e);
    })
}

impl fmt::Debug for BundleFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleFunctionRegistry")
            .field("node_ids", &self.node_ids())
            .finish()
    }
}
