// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

// ============================================================================
// Function specs
// ============================================================================

/// A URN plus an opaque payload whose meaning depends on the URN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub urn: String,
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl FunctionSpec {
    pub fn new(urn: impl Into<String>) -> Self {
        Self {
            urn: urn.into(),
            payload: Vec::new(),
        }
    }

    /// Attach a raw payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }
}

// ============================================================================
// Codecs
// ============================================================================

/// Raw codec definition as found in the pipeline's codec table.
///
/// Component codecs are referenced by identifier and resolved by the harness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecDefinition {
    pub spec: FunctionSpec,
    #[serde(default)]
    pub component_codec_ids: Vec<String>,
}

impl CodecDefinition {
    pub fn new(urn: impl Into<String>) -> Self {
        Self {
            spec: FunctionSpec::new(urn),
            component_codec_ids: Vec::new(),
        }
    }

    pub fn with_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component_codec_ids = components.into_iter().map(Into::into).collect();
        self
    }
}

// ============================================================================
// Windowing strategies
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    #[default]
    Unspecified,
    NonMerging,
    NeedsMerge,
    AlreadyMerged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationMode {
    #[default]
    Unspecified,
    Discarding,
    Accumulating,
    Retracting,
}

/// Raw windowing strategy definition as found in the pipeline's table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowingStrategyDefinition {
    pub window_fn: FunctionSpec,
    pub window_codec_id: String,
    #[serde(default)]
    pub merge_status: MergeStatus,
    #[serde(default)]
    pub accumulation_mode: AccumulationMode,
    #[serde(default)]
    pub allowed_lateness_ms: i64,
}

impl WindowingStrategyDefinition {
    pub fn new(window_fn: FunctionSpec, window_codec_id: impl Into<String>) -> Self {
        Self {
            window_fn,
            window_codec_id: window_codec_id.into(),
            merge_status: MergeStatus::NonMerging,
            accumulation_mode: AccumulationMode::Discarding,
            allowed_lateness_ms: 0,
        }
    }
}

// ============================================================================
// Collections
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundedness {
    #[default]
    Unspecified,
    Bounded,
    Unbounded,
}

/// Describes one collection flowing between nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    #[serde(default)]
    pub unique_name: String,
    pub codec_id: String,
    pub windowing_strategy_id: String,
    #[serde(default)]
    pub boundedness: Boundedness,
}

impl CollectionDescriptor {
    pub fn new(codec_id: impl Into<String>, windowing_strategy_id: impl Into<String>) -> Self {
        Self {
            unique_name: String::new(),
            codec_id: codec_id.into(),
            windowing_strategy_id: windowing_strategy_id.into(),
            boundedness: Boundedness::Bounded,
        }
    }
}

// ============================================================================
// Component tables
// ============================================================================

/// The pipeline-wide component tables shared by every node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub collections: HashMap<String, CollectionDescriptor>,
    #[serde(default)]
    pub codecs: HashMap<String, CodecDefinition>,
    #[serde(default)]
    pub windowing_strategies: HashMap<String, WindowingStrategyDefinition>,
}

impl Components {
    /// Parse component tables from their JSON form.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
