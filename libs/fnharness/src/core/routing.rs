// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Output routing.
//!
//! [`ConsumerRegistry`] is the pipeline-wide collection id to receivers
//! multimap that nodes append to while they are constructed.
//! [`OutputRouter`] is one node's frozen view of it: output label to the
//! receivers of the collection that label writes to.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use parking_lot::Mutex;

use crate::core::element::{ReceiverRef, WindowedValue};
use crate::core::error::{HarnessError, Result};

#[derive(Default)]
pub struct ConsumerRegistry {
    consumers: Mutex<HashMap<String, Vec<ReceiverRef>>>,
}

impl ConsumerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a receiver to a collection's consumers.
    pub fn register(&self, collection_id: impl Into<String>, receiver: ReceiverRef) {
        let collection_id = collection_id.into();
        let mut consumers = self.consumers.lock();
        let entry = consumers.entry(collection_id.clone()).or_default();
        entry.push(receiver);
        tracing::debug!(
            "Registered consumer #{} for collection '{}'",
            entry.len(),
            collection_id
        );
    }

    /// Snapshot of a collection's consumers in registration order.
    pub fn consumers_of(&self, collection_id: &str) -> Vec<ReceiverRef> {
        self.consumers
            .lock()
            .get(collection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn consumer_count(&self, collection_id: &str) -> usize {
        self.consumers
            .lock()
            .get(collection_id)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for ConsumerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let consumers = self.consumers.lock();
        let counts: BTreeMap<&str, usize> = consumers
            .iter()
            .map(|(id, receivers)| (id.as_str(), receivers.len()))
            .collect();
        f.debug_struct("ConsumerRegistry")
            .field("consumers", &counts)
            .finish()
    }
}

/// Output label to the ordered receivers of that label's collection.
///
/// A label with no receivers drains its output.
pub struct OutputRouter {
    routes: BTreeMap<String, Vec<ReceiverRef>>,
}

impl OutputRouter {
    pub fn build(outputs: &BTreeMap<String, String>, consumers: &ConsumerRegistry) -> Self {
        let routes = outputs
            .iter()
            .map(|(label, collection_id)| (label.clone(), consumers.consumers_of(collection_id)))
            .collect();
        Self { routes }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn receivers(&self, label: &str) -> Option<&[ReceiverRef]> {
        self.routes.get(label).map(Vec::as_slice)
    }

    /// Forward an element to every receiver of `label`, in order.
    pub fn emit(&self, label: &str, element: WindowedValue) -> Result<()> {
        let receivers = self
            .routes
            .get(label)
            .ok_or_else(|| HarnessError::UnknownOutput(label.to_string()))?;

        if let Some((last, rest)) = receivers.split_last() {
            for receiver in rest {
                receiver.accept(element.clone())?;
            }
            last.accept(element)?;
        }
        Ok(())
    }
}

impl fmt::Debug for OutputRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .routes
            .iter()
            .map(|(label, receivers)| (label.as_str(), receivers.len()))
            .collect();
        f.debug_struct("OutputRouter").field("routes", &counts).finish()
    }
}
