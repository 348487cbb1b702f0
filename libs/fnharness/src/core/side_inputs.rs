// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Side-input resolution.
//!
//! Every declared side input must use the multimap materialization; any
//! other access pattern is rejected before anything else about it is
//! resolved.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use fnharness_model::{urns, CollectionDescriptor, FunctionSpec};

use crate::core::coders::Codec;
use crate::core::error::{HarnessError, Result};
use crate::core::registry::ComponentRegistry;
use crate::core::stage::ParsedStage;
use crate::core::windowing::BoundedWindow;

/// Shape the user function sees a materialized side input in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAdapter {
    Iterable,
    Multimap,
    Singleton,
    Custom(FunctionSpec),
}

impl ViewAdapter {
    pub fn from_spec(spec: &FunctionSpec) -> Self {
        match spec.urn.as_str() {
            urns::ITERABLE_VIEW_FN => Self::Iterable,
            urns::MULTIMAP_VIEW_FN => Self::Multimap,
            urns::SINGLETON_VIEW_FN => Self::Singleton,
            _ => Self::Custom(spec.clone()),
        }
    }
}

/// Maps a main-input window onto the side input's windowing domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowMappingAdapter {
    Global,
    Identity,
    Custom(FunctionSpec),
}

impl WindowMappingAdapter {
    pub fn from_spec(spec: &FunctionSpec) -> Self {
        match spec.urn.as_str() {
            urns::GLOBAL_WINDOW_MAPPING_FN => Self::Global,
            urns::IDENTITY_WINDOW_MAPPING_FN => Self::Identity,
            _ => Self::Custom(spec.clone()),
        }
    }

    /// `None` when the mapping can only be evaluated by the user's SDK.
    pub fn map_window(&self, main_window: &BoundedWindow) -> Option<BoundedWindow> {
        match self {
            Self::Global => Some(BoundedWindow::Global),
            Self::Identity => Some(*main_window),
            Self::Custom(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideInputSpec {
    pub codec: Arc<Codec>,
    pub window_codec: Arc<Codec>,
    pub view_adapter: ViewAdapter,
    pub window_mapping: WindowMappingAdapter,
}

/// Resolve one `SideInputSpec` per declared side input, keyed by label.
pub fn resolve_side_inputs(
    stage: &ParsedStage,
    collections: &HashMap<String, CollectionDescriptor>,
    registry: &ComponentRegistry,
) -> Result<BTreeMap<String, SideInputSpec>> {
    let mut specs = BTreeMap::new();

    for (label, declaration) in &stage.side_inputs {
        let urn = &declaration.access_pattern.urn;
        if urn != urns::MULTIMAP_SIDE_INPUT {
            tracing::warn!(
                "Node '{}' requests unsupported materialization '{}' for side input '{}'",
                stage.node_id,
                urn,
                label
            );
            return Err(HarnessError::UnsupportedMaterialization {
                label: label.clone(),
                urn: urn.clone(),
            });
        }

        let collection_id = stage.inputs.get(label).ok_or_else(|| {
            HarnessError::malformed(label, "side input is not bound to a stage input")
        })?;
        let collection = collections
            .get(collection_id)
            .ok_or_else(|| HarnessError::malformed(collection_id, "unknown collection"))?;

        let codec = registry.resolve_codec(&collection.codec_id)?;
        let strategy = registry.resolve_windowing_strategy(&collection.windowing_strategy_id)?;

        specs.insert(
            label.clone(),
            SideInputSpec {
                codec,
                window_codec: strategy.window_codec.clone(),
                view_adapter: ViewAdapter::from_spec(&declaration.view_fn),
                window_mapping: WindowMappingAdapter::from_spec(&declaration.window_mapping_fn),
            },
        );
    }

    Ok(specs)
}
