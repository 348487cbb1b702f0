// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use fnharness_model::{urns, ModelError};
use thiserror::Error;

use crate::core::runner::RunnerState;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("malformed payload for node '{node_id}': {source}")]
    MalformedPayload {
        node_id: String,
        #[source]
        source: ModelError,
    },

    #[error("node '{node_id}' must have exactly one main input, found {candidates:?}")]
    AmbiguousMainInput {
        node_id: String,
        candidates: Vec<String>,
    },

    #[error(
        "side input '{label}' requests materialization '{urn}'; only {} is supported",
        urns::MULTIMAP_SIDE_INPUT
    )]
    UnsupportedMaterialization { label: String, urn: String },

    #[error("malformed components at '{id}': {reason}")]
    MalformedComponents { id: String, reason: String },

    #[error("lifecycle violation on node '{node_id}': {operation} called while {state}")]
    LifecycleViolation {
        node_id: String,
        operation: &'static str,
        state: RunnerState,
    },

    #[error("Unknown output: {0}")]
    UnknownOutput(String),

    #[error("Unknown side input: {0}")]
    UnknownSideInput(String),

    #[error("No user function registered for '{0}'")]
    UnknownUserFn(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("State request failed: {0}")]
    State(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HarnessError {
    pub(crate) fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedComponents {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
