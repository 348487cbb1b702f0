// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Per-node execution context.
//!
//! [`NodeSetup`] is everything the controller hands over for one node;
//! [`ExecutionContext::build`] turns it into the immutable bundle of resolved
//! codecs, side inputs and routes a runner executes against.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use fnharness_model::{CodecDefinition, CollectionDescriptor, StageDescriptor, WindowingStrategyDefinition};

use crate::core::bundle::BundleFunctionRegistry;
use crate::core::clients::{DataClient, InstructionIdSupplier, SplitListener, StateClient};
use crate::core::coders::Codec;
use crate::core::error::{HarnessError, Result};
use crate::core::options::PipelineOptions;
use crate::core::registry::ComponentRegistry;
use crate::core::routing::{ConsumerRegistry, OutputRouter};
use crate::core::side_inputs::{resolve_side_inputs, SideInputSpec};
use crate::core::stage::{parse_stage, ParsedStage};
use crate::core::windowing::WindowingStrategy;

/// Inputs for constructing one node's runner.
///
/// The component tables, consumer registry and bundle function registries
/// are shared by every node of the pipeline.
pub struct NodeSetup<'a> {
    pub pipeline_options: Arc<PipelineOptions>,
    pub data_client: Arc<dyn DataClient>,
    pub state_client: Arc<dyn StateClient>,
    pub node_id: &'a str,
    pub stage: &'a StageDescriptor,
    pub instruction_id: InstructionIdSupplier,
    pub collections: &'a HashMap<String, CollectionDescriptor>,
    pub codecs: &'a HashMap<String, CodecDefinition>,
    pub windowing_strategies: &'a HashMap<String, WindowingStrategyDefinition>,
    pub consumers: &'a ConsumerRegistry,
    pub start_functions: &'a BundleFunctionRegistry,
    /// Run with `run_all_reversed`.
    pub finish_functions: &'a BundleFunctionRegistry,
    pub split_listener: Arc<dyn SplitListener>,
}

/// Resolved view of one node. Immutable once built.
pub struct ExecutionContext {
    options: Arc<PipelineOptions>,
    stage: ParsedStage,
    main_input_collection: String,
    input_codec: Arc<Codec>,
    key_codec: Option<Arc<Codec>>,
    windowing_strategy: Arc<WindowingStrategy>,
    output_codecs: BTreeMap<String, Arc<Codec>>,
    side_inputs: BTreeMap<String, SideInputSpec>,
    router: OutputRouter,
    state_client: Arc<dyn StateClient>,
    data_client: Arc<dyn DataClient>,
    instruction_id: InstructionIdSupplier,
    split_listener: Arc<dyn SplitListener>,
}

impl ExecutionContext {
    /// Resolve everything a runner needs. Any failure aborts the build.
    pub fn build(setup: &NodeSetup<'_>) -> Result<Self> {
        let registry = ComponentRegistry::new(setup.codecs, setup.windowing_strategies);
        let stage = parse_stage(setup.node_id, setup.stage)?;

        let main_input_collection = stage
            .main_input_collection()
            .ok_or_else(|| {
                HarnessError::malformed(
                    &stage.node_id,
                    format!("main input '{}' is not bound to a collection", stage.main_input),
                )
            })?
            .to_string();
        let main_collection = lookup_collection(setup.collections, &main_input_collection)?;
        let input_codec = registry.resolve_codec(&main_collection.codec_id)?;
        let key_codec = key_codec(&main_collection.codec_id, &input_codec)?;
        let windowing_strategy =
            registry.resolve_windowing_strategy(&main_collection.windowing_strategy_id)?;

        let side_inputs = resolve_side_inputs(&stage, setup.collections, &registry)?;

        let mut output_codecs = BTreeMap::new();
        for (label, collection_id) in &stage.outputs {
            let collection = lookup_collection(setup.collections, collection_id)?;
            output_codecs.insert(label.clone(), registry.resolve_codec(&collection.codec_id)?);
        }

        let router = OutputRouter::build(&stage.outputs, setup.consumers);

        tracing::info!(
            "[{}] Built execution context: fn={}, main input '{}' ({}), {} side input(s), {} output(s)",
            stage.node_id,
            stage.user_fn.urn,
            stage.main_input,
            input_codec.urn(),
            side_inputs.len(),
            output_codecs.len()
        );

        Ok(Self {
            options: setup.pipeline_options.clone(),
            stage,
            main_input_collection,
            input_codec,
            key_codec,
            windowing_strategy,
            output_codecs,
            side_inputs,
            router,
            state_client: setup.state_client.clone(),
            data_client: setup.data_client.clone(),
            instruction_id: setup.instruction_id.clone(),
            split_listener: setup.split_listener.clone(),
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn node_id(&self) -> &str {
        &self.stage.node_id
    }

    pub fn stage(&self) -> &ParsedStage {
        &self.stage
    }

    pub fn main_input_collection(&self) -> &str {
        &self.main_input_collection
    }

    pub fn input_codec(&self) -> &Arc<Codec> {
        &self.input_codec
    }

    /// Key codec of a keyed main input, `None` otherwise.
    pub fn key_codec(&self) -> Option<&Arc<Codec>> {
        self.key_codec.as_ref()
    }

    pub fn window_codec(&self) -> &Arc<Codec> {
        &self.windowing_strategy.window_codec
    }

    pub fn windowing_strategy(&self) -> &WindowingStrategy {
        &self.windowing_strategy
    }

    pub fn output_codecs(&self) -> &BTreeMap<String, Arc<Codec>> {
        &self.output_codecs
    }

    pub fn side_inputs(&self) -> &BTreeMap<String, SideInputSpec> {
        &self.side_inputs
    }

    pub fn router(&self) -> &OutputRouter {
        &self.router
    }

    pub fn state_client(&self) -> &Arc<dyn StateClient> {
        &self.state_client
    }

    pub fn data_client(&self) -> &Arc<dyn DataClient> {
        &self.data_client
    }

    /// Instruction id of the bundle in flight.
    pub fn instruction_id(&self) -> String {
        (self.instruction_id)()
    }

    pub fn split_listener(&self) -> &Arc<dyn SplitListener> {
        &self.split_listener
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("stage", &self.stage)
            .field("input_codec", &self.input_codec)
            .field("key_codec", &self.key_codec)
            .field("windowing_strategy", &self.windowing_strategy)
            .field("output_codecs", &self.output_codecs)
            .field("side_inputs", &self.side_inputs)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

fn lookup_collection<'t>(
    collections: &'t HashMap<String, CollectionDescriptor>,
    id: &str,
) -> Result<&'t CollectionDescriptor> {
    collections
        .get(id)
        .ok_or_else(|| HarnessError::malformed(id, "unknown collection"))
}

/// Key codec of a main input codec that is a key-value codec, possibly
/// wrapped in one windowed-value envelope.
fn key_codec(codec_id: &str, codec: &Codec) -> Result<Option<Arc<Codec>>> {
    let unwrapped = match codec {
        Codec::WindowedValue { value, .. } => {
            if value.is_windowed_value() {
                return Err(HarnessError::malformed(
                    codec_id,
                    "main input codec nests windowed-value envelopes",
                ));
            }
            value.as_ref()
        }
        other => other,
    };

    Ok(match unwrapped {
        Codec::Kv { key, .. } => Some(key.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv() -> Arc<Codec> {
        Arc::new(Codec::Kv {
            key: Arc::new(Codec::StringUtf8),
            value: Arc::new(Codec::VarInt),
        })
    }

    fn windowed(value: Arc<Codec>) -> Codec {
        Codec::WindowedValue {
            value,
            window: Arc::new(Codec::GlobalWindow),
        }
    }

    #[test]
    fn test_key_codec_of_plain_kv() {
        let key = key_codec("c", &kv()).unwrap();
        assert_eq!(key.as_deref(), Some(&Codec::StringUtf8));
    }

    #[test]
    fn test_key_codec_inside_envelope() {
        let key = key_codec("c", &windowed(kv())).unwrap();
        assert_eq!(key.as_deref(), Some(&Codec::StringUtf8));
    }

    #[test]
    fn test_unkeyed_input() {
        assert_eq!(key_codec("c", &Codec::Bytes).unwrap(), None);
        assert_eq!(
            key_codec("c", &windowed(Arc::new(Codec::Bytes))).unwrap(),
            None
        );
    }

    #[test]
    fn test_nested_envelopes_rejected() {
        let nested = windowed(Arc::new(windowed(kv())));
        let err = key_codec("wv_wv_kv", &nested).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::MalformedComponents { ref id, .. } if id == "wv_wv_kv"
        ));
    }
}
