// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod bundle;
pub mod clients;
pub mod coders;
pub mod context;
pub mod dofn;
pub mod element;
pub mod error;
pub mod logging;
pub mod options;
pub mod registry;
pub mod routing;
pub mod runner;
pub mod runners;
pub mod side_inputs;
pub mod stage;
pub mod windowing;

pub use bundle::{BundleFunction, BundleFunctionRegistry};
pub use clients::{
    BundleSplit, DataClient, InstructionIdSupplier, NoStateClient, NoopSplitListener,
    SplitListener, StateClient, StateKey, StateRequest,
};
pub use coders::Codec;
pub use context::{ExecutionContext, NodeSetup};
pub use dofn::{BundleContext, DoFn, DoFnConstructor, DoFnRegistry, OutputEmitter, DOFN_REGISTRY};
pub use element::{ElementReceiver, PaneInfo, PaneTiming, ReceiverRef, WindowedValue};
pub use error::*;
pub use logging::init_logging;
pub use options::PipelineOptions;
pub use registry::ComponentRegistry;
pub use routing::{ConsumerRegistry, OutputRouter};
pub use runner::{BundleRunner, LifecycleTracker, RunnerFactory, RunnerState, SharedRunner};
pub use runners::{AssignWindowsRunner, AssignWindowsRunnerFactory, ParDoRunner, ParDoRunnerFactory};
pub use side_inputs::{resolve_side_inputs, SideInputSpec, ViewAdapter, WindowMappingAdapter};
pub use stage::{parse_stage, ParsedStage};
pub use windowing::{BoundedWindow, WindowFn, WindowingStrategy};
