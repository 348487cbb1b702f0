// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::components::FunctionSpec;
use crate::error::{ModelError, ModelResult};
use crate::urns;

/// Decode a MessagePack payload.
///
/// Payloads are encoded as maps, so fields unknown to this build are skipped
/// and missing required fields are reported by name.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> ModelResult<T> {
    Ok(rmp_serde::from_slice(payload)?)
}

/// Encode a value as a map-encoded MessagePack payload.
pub fn encode_payload<T: Serialize>(value: &T) -> ModelResult<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// One node of the pipeline graph, as delivered by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    #[serde(default)]
    pub unique_name: String,
    /// Transform URN and its opaque payload.
    pub spec: FunctionSpec,
    /// Local input label to collection id.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    /// Local output label to collection id.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl StageDescriptor {
    pub fn new(urn: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            unique_name: String::new(),
            spec: FunctionSpec::new(urn).with_payload(payload),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, label: impl Into<String>, collection_id: impl Into<String>) -> Self {
        self.inputs.insert(label.into(), collection_id.into());
        self
    }

    pub fn with_output(
        mut self,
        label: impl Into<String>,
        collection_id: impl Into<String>,
    ) -> Self {
        self.outputs.insert(label.into(), collection_id.into());
        self
    }
}

/// How a side input is read and presented to the user function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideInputDeclaration {
    pub access_pattern: FunctionSpec,
    pub view_fn: FunctionSpec,
    pub window_mapping_fn: FunctionSpec,
}

impl SideInputDeclaration {
    /// A multimap side input with the given view and a global window mapping.
    pub fn multimap(view_fn_urn: &str) -> Self {
        Self {
            access_pattern: FunctionSpec::new(urns::MULTIMAP_SIDE_INPUT),
            view_fn: FunctionSpec::new(view_fn_urn),
            window_mapping_fn: FunctionSpec::new(urns::GLOBAL_WINDOW_MAPPING_FN),
        }
    }

    pub fn with_access_pattern(mut self, urn: impl Into<String>) -> Self {
        self.access_pattern = FunctionSpec::new(urn);
        self
    }

    pub fn with_window_mapping(mut self, urn: impl Into<String>) -> Self {
        self.window_mapping_fn = FunctionSpec::new(urn);
        self
    }
}

/// Payload of an element-wise transform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParDoPayload {
    /// Reference to the user function.
    pub do_fn: FunctionSpec,
    /// Output label that receives the function's untagged output.
    pub main_output: String,
    #[serde(default)]
    pub side_inputs: BTreeMap<String, SideInputDeclaration>,
}

impl ParDoPayload {
    pub fn new(do_fn: FunctionSpec, main_output: impl Into<String>) -> Self {
        Self {
            do_fn,
            main_output: main_output.into(),
            side_inputs: BTreeMap::new(),
        }
    }

    pub fn with_side_input(
        mut self,
        label: impl Into<String>,
        declaration: SideInputDeclaration,
    ) -> Self {
        self.side_inputs.insert(label.into(), declaration);
        self
    }

    pub fn from_msgpack(data: &[u8]) -> ModelResult<Self> {
        let payload: ParDoPayload = decode_payload(data)?;
        if payload.do_fn.urn.is_empty() {
            return Err(ModelError::MissingField {
                field: "do_fn.urn".to_string(),
            });
        }
        Ok(payload)
    }

    pub fn to_msgpack(&self) -> ModelResult<Vec<u8>> {
        encode_payload(self)
    }
}
