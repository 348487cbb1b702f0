//! ParDo runner integration tests
//!
//! Runs user functions end to end: bundle callbacks through the bundle
//! function registries, elements through the consumer registry, output
//! through the router to downstream receivers.

mod common;

use std::sync::Arc;

use serial_test::serial;

use fnharness::model::{urns, FunctionSpec, ParDoPayload, SideInputDeclaration, StageDescriptor};
use fnharness::{
    BoundedWindow, BundleContext, BundleRunner, DoFn, DoFnRegistry, HarnessError, OutputEmitter,
    ParDoRunnerFactory, Result, RunnerFactory, RunnerState, StateKey, WindowedValue,
    DOFN_REGISTRY,
};

use common::{collector, TestPipeline};

// =============================================================================
// Test User Functions
// =============================================================================

/// Upper-cases strings on the main output; anything else goes to "rejects".
struct Upper;

impl DoFn for Upper {
    fn process_element(
        &mut self,
        element: &WindowedValue,
        _context: &BundleContext<'_>,
        output: &mut OutputEmitter<'_>,
    ) -> Result<()> {
        match element.value.as_str() {
            Some(s) => output.output(element.with_value(serde_json::json!(s.to_uppercase()))),
            None => output.output_to("rejects", element.clone()),
        }
    }
}

fn build_upper(_config: &[u8]) -> Result<Box<dyn DoFn>> {
    Ok(Box::new(Upper))
}

/// Counts elements and emits the count when the bundle finishes.
#[derive(Default)]
struct CountPerBundle {
    count: u64,
}

impl DoFn for CountPerBundle {
    fn start_bundle(&mut self, _context: &BundleContext<'_>) -> Result<()> {
        self.count = 0;
        Ok(())
    }

    fn process_element(
        &mut self,
        _element: &WindowedValue,
        _context: &BundleContext<'_>,
        _output: &mut OutputEmitter<'_>,
    ) -> Result<()> {
        self.count += 1;
        Ok(())
    }

    fn finish_bundle(
        &mut self,
        _context: &BundleContext<'_>,
        output: &mut OutputEmitter<'_>,
    ) -> Result<()> {
        output.output(WindowedValue::in_global_window(serde_json::json!(self.count)))
    }
}

fn build_count(_config: &[u8]) -> Result<Box<dyn DoFn>> {
    Ok(Box::new(CountPerBundle::default()))
}

/// Looks up each element's key in the "side" input.
struct SideLookup;

impl DoFn for SideLookup {
    fn process_element(
        &mut self,
        element: &WindowedValue,
        context: &BundleContext<'_>,
        output: &mut OutputEmitter<'_>,
    ) -> Result<()> {
        let key = element.value.as_str().unwrap_or_default().as_bytes();
        let value = context.fetch_side_input("side", &element.windows[0], key)?;
        output.output(element.with_value(serde_json::json!(String::from_utf8_lossy(&value))))
    }
}

fn build_side_lookup(_config: &[u8]) -> Result<Box<dyn DoFn>> {
    Ok(Box::new(SideLookup))
}

fnharness::register_dofn!("urn:test:linked_upper", build_upper);

fn registry() -> Arc<DoFnRegistry> {
    let registry = DoFnRegistry::new();
    registry.register("urn:test:upper", build_upper);
    registry.register("urn:test:count", build_count);
    registry.register("urn:test:side_lookup", build_side_lookup);
    Arc::new(registry)
}

fn linear_stage(fn_urn: &str, input: &str, output: &str) -> StageDescriptor {
    let payload = ParDoPayload::new(FunctionSpec::new(fn_urn), "out");
    StageDescriptor::new(urns::PAR_DO_TRANSFORM, payload.to_msgpack().unwrap())
        .with_input("in", input)
        .with_output("out", output)
}

fn stage(fn_urn: &str) -> StageDescriptor {
    let payload = ParDoPayload::new(FunctionSpec::new(fn_urn), "out");
    StageDescriptor::new(urns::PAR_DO_TRANSFORM, payload.to_msgpack().unwrap())
        .with_input("in", "C1")
        .with_output("out", "C2")
        .with_output("rejects", "C3")
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_main_and_tagged_outputs_reach_receivers() {
    let pipeline = TestPipeline::new();
    let (main_receiver, main) = collector();
    let (reject_receiver, rejects) = collector();
    pipeline.consumers.register("C2", main_receiver);
    pipeline.consumers.register("C3", reject_receiver);

    let stage = stage("urn:test:upper");
    let runner = ParDoRunnerFactory::new(registry())
        .create_runner_for_node(&pipeline.setup("upper", &stage))
        .unwrap();

    pipeline.start_functions.run_all().unwrap();
    for value in [serde_json::json!("a"), serde_json::json!(7), serde_json::json!("b")] {
        pipeline
            .feed("C1", WindowedValue::timestamped_in_global_window(value, 42))
            .unwrap();
    }
    pipeline.finish_functions.run_all_reversed().unwrap();

    let main = main.lock();
    let values: Vec<_> = main.iter().map(|e| e.value.clone()).collect();
    assert_eq!(values, vec![serde_json::json!("A"), serde_json::json!("B")]);
    assert!(main.iter().all(|e| e.timestamp_ms == 42));
    assert_eq!(rejects.lock().len(), 1);
    assert_eq!(runner.lock().processed(), 3);
    assert_eq!(runner.lock().state(), RunnerState::Finished);
}

#[test]
fn test_finish_bundle_output() {
    let pipeline = TestPipeline::new();
    let (receiver, received) = collector();
    pipeline.consumers.register("C2", receiver);

    let stage = stage("urn:test:count");
    ParDoRunnerFactory::new(registry())
        .create_runner_for_node(&pipeline.setup("count", &stage))
        .unwrap();

    pipeline.start_functions.run_all().unwrap();
    for i in 0..5 {
        pipeline
            .feed("C1", WindowedValue::in_global_window(serde_json::json!(i)))
            .unwrap();
    }
    assert!(received.lock().is_empty());
    pipeline.finish_functions.run_all_reversed().unwrap();

    assert_eq!(received.lock()[0].value, serde_json::json!(5));
}

#[test]
fn test_chained_nodes_finish_upstream_first() {
    let pipeline = TestPipeline::new();
    let (receiver, received) = collector();
    pipeline.consumers.register("C3", receiver);

    // Consumers are wired before their producers.
    let down_stage = linear_stage("urn:test:count", "C2", "C3");
    let down = ParDoRunnerFactory::new(registry())
        .create_runner_for_node(&pipeline.setup("down", &down_stage))
        .unwrap();
    let up_stage = linear_stage("urn:test:count", "C1", "C2");
    let up = ParDoRunnerFactory::new(registry())
        .create_runner_for_node(&pipeline.setup("up", &up_stage))
        .unwrap();
    assert_eq!(pipeline.start_functions.node_ids(), vec!["down", "up"]);

    pipeline.start_functions.run_all().unwrap();
    pipeline
        .feed("C1", WindowedValue::in_global_window(serde_json::json!("x")))
        .unwrap();
    pipeline.finish_functions.run_all_reversed().unwrap();

    // "up" emits its count of 1 into "down", which then emits its own count.
    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].value, serde_json::json!(1));
    assert_eq!(up.lock().state(), RunnerState::Finished);
    assert_eq!(down.lock().state(), RunnerState::Finished);
}

#[test]
fn test_side_input_fetch_uses_state_client() {
    let pipeline = TestPipeline::new();
    let (receiver, received) = collector();
    pipeline.consumers.register("C2", receiver);

    let payload = ParDoPayload::new(FunctionSpec::new("urn:test:side_lookup"), "out")
        .with_side_input("side", SideInputDeclaration::multimap(urns::MULTIMAP_VIEW_FN));
    let stage = StageDescriptor::new(urns::PAR_DO_TRANSFORM, payload.to_msgpack().unwrap())
        .with_input("in", "C1")
        .with_input("side", "C_side")
        .with_output("out", "C2");

    ParDoRunnerFactory::new(registry())
        .create_runner_for_node(&pipeline.setup("lookup", &stage))
        .unwrap();

    pipeline.start_functions.run_all().unwrap();
    pipeline
        .feed("C1", WindowedValue::in_global_window(serde_json::json!("k1")))
        .unwrap();

    assert_eq!(received.lock()[0].value, serde_json::json!("side-value"));
    let requests = pipeline.state_client.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].instruction_id, "instruction-1");
    match &requests[0].key {
        StateKey::MultimapSideInput {
            node_id,
            side_input_label,
            window,
            key,
        } => {
            assert_eq!(node_id, "lookup");
            assert_eq!(side_input_label, "side");
            assert_eq!(key, b"k1");
            let window: BoundedWindow = rmp_serde::from_slice(window).unwrap();
            assert_eq!(window, BoundedWindow::Global);
        }
        other => panic!("unexpected state key: {other:?}"),
    }
}

#[test]
fn test_unknown_user_fn_registers_nothing() {
    let pipeline = TestPipeline::new();
    let stage = stage("urn:test:missing");

    let err = ParDoRunnerFactory::new(registry())
        .create_runner_for_node(&pipeline.setup("missing", &stage))
        .err()
        .unwrap();

    assert!(matches!(err, HarnessError::UnknownUserFn(ref urn) if urn == "urn:test:missing"));
    assert_eq!(pipeline.consumers.consumer_count("C1"), 0);
    assert!(pipeline.start_functions.is_empty());
}

#[test]
fn test_finish_twice_is_rejected() {
    let pipeline = TestPipeline::new();
    let stage = stage("urn:test:upper");
    let runner = ParDoRunnerFactory::new(registry())
        .create_runner_for_node(&pipeline.setup("upper", &stage))
        .unwrap();

    let mut runner = runner.lock();
    runner.start_bundle().unwrap();
    runner.finish_bundle().unwrap();
    let err = runner.finish_bundle().unwrap_err();
    assert!(matches!(
        err,
        HarnessError::LifecycleViolation {
            state: RunnerState::Finished,
            ..
        }
    ));
}

#[test]
#[serial]
fn test_linked_user_fn_is_in_global_registry() {
    assert!(DOFN_REGISTRY.contains("urn:test:linked_upper"));

    let pipeline = TestPipeline::new();
    let (receiver, received) = collector();
    pipeline.consumers.register("C2", receiver);

    let stage = stage("urn:test:linked_upper");
    ParDoRunnerFactory::default()
        .create_runner_for_node(&pipeline.setup("linked", &stage))
        .unwrap();

    pipeline.start_functions.run_all().unwrap();
    pipeline
        .feed("C1", WindowedValue::in_global_window(serde_json::json!("x")))
        .unwrap();
    assert_eq!(received.lock()[0].value, serde_json::json!("X"));
}
