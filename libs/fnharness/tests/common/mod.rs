//! Shared fixtures for node construction tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use fnharness::model::{
    encode_payload, urns, CodecDefinition, CollectionDescriptor, FixedWindowsPayload,
    FunctionSpec, WindowingStrategyDefinition,
};
use fnharness::{
    BundleFunctionRegistry, ConsumerRegistry, DataClient, NodeSetup, NoopSplitListener,
    PipelineOptions, ReceiverRef, Result, StateClient, StateRequest, WindowedValue,
};

/// Records every state request and answers with a fixed value.
#[derive(Default)]
pub struct RecordingStateClient {
    pub requests: Mutex<Vec<StateRequest>>,
    pub response: Vec<u8>,
}

impl StateClient for RecordingStateClient {
    fn get(&self, request: &StateRequest) -> Result<Vec<u8>> {
        self.requests.lock().push(request.clone());
        Ok(self.response.clone())
    }
}

#[derive(Default)]
pub struct NullDataClient;

impl DataClient for NullDataClient {
    fn send(&self, _instruction_id: &str, _target: &str, _data: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Component tables plus the shared registries every node is wired into.
pub struct TestPipeline {
    pub collections: HashMap<String, CollectionDescriptor>,
    pub codecs: HashMap<String, CodecDefinition>,
    pub windowing_strategies: HashMap<String, WindowingStrategyDefinition>,
    pub consumers: ConsumerRegistry,
    pub start_functions: BundleFunctionRegistry,
    pub finish_functions: BundleFunctionRegistry,
    pub state_client: Arc<RecordingStateClient>,
    pub options: Arc<PipelineOptions>,
}

impl TestPipeline {
    /// Codecs, strategies and collections used across the tests:
    ///
    /// - `C1`, `C2`, `C_side`: bytes in the global window
    /// - `C_kv`: windowed-value envelope around kv<string, varint>, fixed 60s windows
    /// - `C_nested`: two windowed-value envelopes around the same kv
    pub fn new() -> Self {
        let codecs = HashMap::from([
            ("bytes".to_string(), CodecDefinition::new(urns::BYTES_CODEC)),
            ("string".to_string(), CodecDefinition::new(urns::STRING_UTF8_CODEC)),
            ("varint".to_string(), CodecDefinition::new(urns::VARINT_CODEC)),
            ("gw".to_string(), CodecDefinition::new(urns::GLOBAL_WINDOW_CODEC)),
            ("iw".to_string(), CodecDefinition::new(urns::INTERVAL_WINDOW_CODEC)),
            (
                "kv".to_string(),
                CodecDefinition::new(urns::KV_CODEC).with_components(["string", "varint"]),
            ),
            (
                "wv_kv".to_string(),
                CodecDefinition::new(urns::WINDOWED_VALUE_CODEC).with_components(["kv", "iw"]),
            ),
            (
                "wv_wv_kv".to_string(),
                CodecDefinition::new(urns::WINDOWED_VALUE_CODEC)
                    .with_components(["wv_kv", "iw"]),
            ),
        ]);

        let fixed = FunctionSpec::new(urns::FIXED_WINDOWS_FN).with_payload(
            encode_payload(&FixedWindowsPayload {
                size_ms: 60_000,
                offset_ms: 0,
            })
            .unwrap(),
        );
        let windowing_strategies = HashMap::from([
            (
                "global".to_string(),
                WindowingStrategyDefinition::new(FunctionSpec::new(urns::GLOBAL_WINDOWS_FN), "gw"),
            ),
            ("fixed".to_string(), WindowingStrategyDefinition::new(fixed, "iw")),
        ]);

        let collections = HashMap::from([
            ("C1".to_string(), CollectionDescriptor::new("bytes", "global")),
            ("C2".to_string(), CollectionDescriptor::new("bytes", "global")),
            ("C3".to_string(), CollectionDescriptor::new("string", "global")),
            ("C_side".to_string(), CollectionDescriptor::new("bytes", "global")),
            ("C_kv".to_string(), CollectionDescriptor::new("wv_kv", "fixed")),
            ("C_nested".to_string(), CollectionDescriptor::new("wv_wv_kv", "fixed")),
        ]);

        Self {
            collections,
            codecs,
            windowing_strategies,
            consumers: ConsumerRegistry::new(),
            start_functions: BundleFunctionRegistry::new(),
            finish_functions: BundleFunctionRegistry::new(),
            state_client: Arc::new(RecordingStateClient {
                requests: Mutex::new(Vec::new()),
                response: b"side-value".to_vec(),
            }),
            options: Arc::new(PipelineOptions::default()),
        }
    }

    pub fn setup<'a>(
        &'a self,
        node_id: &'a str,
        stage: &'a fnharness::model::StageDescriptor,
    ) -> NodeSetup<'a> {
        NodeSetup {
            pipeline_options: self.options.clone(),
            data_client: Arc::new(NullDataClient),
            state_client: self.state_client.clone(),
            node_id,
            stage,
            instruction_id: Arc::new(|| "instruction-1".to_string()),
            collections: &self.collections,
            codecs: &self.codecs,
            windowing_strategies: &self.windowing_strategies,
            consumers: &self.consumers,
            start_functions: &self.start_functions,
            finish_functions: &self.finish_functions,
            split_listener: Arc::new(NoopSplitListener),
        }
    }

    /// Push an element into every consumer of a collection, the way an
    /// upstream node or the data plane would.
    pub fn feed(&self, collection_id: &str, element: WindowedValue) -> Result<()> {
        for receiver in self.consumers.consumers_of(collection_id) {
            receiver.accept(element.clone())?;
        }
        Ok(())
    }
}

/// A receiver that collects everything it is handed.
pub fn collector() -> (ReceiverRef, Arc<Mutex<Vec<WindowedValue>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let receiver: ReceiverRef = Arc::new(move |element: WindowedValue| -> Result<()> {
        sink.lock().push(element);
        Ok(())
    });
    (receiver, received)
}
