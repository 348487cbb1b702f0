// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Runner lifecycle and the factory template that wires runners into the
//! pipeline.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::context::{ExecutionContext, NodeSetup};
use crate::core::element::WindowedValue;
use crate::core::error::{HarnessError, Result};

/// Lifecycle state of a bundle runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunnerState {
    /// Constructed, waiting for the bundle to start.
    #[default]
    Idle,
    /// Between start and finish; elements may be processed.
    Active,
    /// Bundle finished. Terminal.
    Finished,
}

impl std::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

/// Enforces `Idle -> Active -> Finished` for one runner.
#[derive(Debug, Clone)]
pub struct LifecycleTracker {
    node_id: String,
    state: RunnerState,
}

impl LifecycleTracker {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            state: RunnerState::Idle,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition("start_bundle", RunnerState::Idle, RunnerState::Active)
    }

    pub fn check_active(&self, operation: &'static str) -> Result<()> {
        if self.state != RunnerState::Active {
            return Err(self.violation(operation));
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.transition("finish_bundle", RunnerState::Active, RunnerState::Finished)
    }

    fn transition(
        &mut self,
        operation: &'static str,
        from: RunnerState,
        to: RunnerState,
    ) -> Result<()> {
        if self.state != from {
            return Err(self.violation(operation));
        }
        tracing::trace!("[{}] {} -> {}", self.node_id, self.state, to);
        self.state = to;
        Ok(())
    }

    fn violation(&self, operation: &'static str) -> HarnessError {
        tracing::warn!(
            "[{}] {} rejected in state {}",
            self.node_id,
            operation,
            self.state
        );
        HarnessError::LifecycleViolation {
            node_id: self.node_id.clone(),
            operation,
            state: self.state,
        }
    }
}

/// Executes one node over one bundle.
///
/// Calls arrive in the order start, process (any number of times), finish.
pub trait BundleRunner: Send + 'static {
    fn start_bundle(&mut self) -> Result<()>;

    fn process_element(&mut self, element: WindowedValue) -> Result<()>;

    fn finish_bundle(&mut self) -> Result<()>;

    fn state(&self) -> RunnerState;
}

pub type SharedRunner<R> = Arc<Mutex<R>>;

/// Builds a runner for a node and wires it into the pipeline.
///
/// Implementors supply [`build_runner`](Self::build_runner); the provided
/// [`create_runner_for_node`](Self::create_runner_for_node) does the rest.
pub trait RunnerFactory: Send + Sync {
    type Runner: BundleRunner;

    fn build_runner(&self, context: Arc<ExecutionContext>) -> Result<Self::Runner>;

    /// Build the node's context and runner, then register the runner's start
    /// and finish functions and subscribe it to its main input collection.
    ///
    /// Nodes must be created consumers first, since the output router
    /// snapshots receivers when the context is built. The finish registry
    /// must therefore be run with
    /// [`BundleFunctionRegistry::run_all_reversed`](crate::core::bundle::BundleFunctionRegistry::run_all_reversed)
    /// so producers flush before their consumers finish.
    ///
    /// Nothing is registered if either build step fails.
    fn create_runner_for_node(&self, setup: &NodeSetup<'_>) -> Result<SharedRunner<Self::Runner>> {
        let context = Arc::new(ExecutionContext::build(setup)?);
        let runner = Arc::new(Mutex::new(self.build_runner(context.clone())?));
        let node_id = context.node_id().to_string();

        let starter = runner.clone();
        setup.start_functions.register(
            node_id.clone(),
            Box::new(move || starter.lock().start_bundle()),
        );

        let processor = runner.clone();
        setup.consumers.register(
            context.main_input_collection(),
            Arc::new(move |element: WindowedValue| -> Result<()> {
                processor.lock().process_element(element)
            }),
        );

        let finisher = runner.clone();
        setup.finish_functions.register(
            node_id.clone(),
            Box::new(move || finisher.lock().finish_bundle()),
        );

        tracing::info!(
            "[{}] Runner wired to collection '{}'",
            node_id,
            context.main_input_collection()
        );
        Ok(runner)
    }
}
