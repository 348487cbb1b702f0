// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use crate::core::context::ExecutionContext;
use crate::core::dofn::{BundleContext, DoFn, DoFnRegistry, OutputEmitter, DOFN_REGISTRY};
use crate::core::element::WindowedValue;
use crate::core::error::Result;
use crate::core::runner::{BundleRunner, LifecycleTracker, RunnerFactory, RunnerState};

/// Runs a registered user function element by element.
pub struct ParDoRunnerFactory {
    registry: Arc<DoFnRegistry>,
}

impl ParDoRunnerFactory {
    pub fn new(registry: Arc<DoFnRegistry>) -> Self {
        Self { registry }
    }
}

impl Default for ParDoRunnerFactory {
    fn default() -> Self {
        Self::new(DOFN_REGISTRY.clone())
    }
}

impl RunnerFactory for ParDoRunnerFactory {
    type Runner = ParDoRunner;

    fn build_runner(&self, context: Arc<ExecutionContext>) -> Result<ParDoRunner> {
        let do_fn = self.registry.instantiate(&context.stage().user_fn)?;
        tracing::debug!(
            "[{}] Instantiated user function '{}'",
            context.node_id(),
            context.stage().user_fn.urn
        );
        Ok(ParDoRunner {
            lifecycle: LifecycleTracker::new(context.node_id()),
            context,
            do_fn,
            processed: 0,
        })
    }
}

pub struct ParDoRunner {
    context: Arc<ExecutionContext>,
    do_fn: Box<dyn DoFn>,
    lifecycle: LifecycleTracker,
    processed: u64,
}

impl ParDoRunner {
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Elements processed in the current bundle.
    pub fn processed(&self) -> u64 {
        self.processed
    }
}

impl BundleRunner for ParDoRunner {
    fn start_bundle(&mut self) -> Result<()> {
        self.lifecycle.start()?;
        self.processed = 0;
        self.do_fn.start_bundle(&BundleContext::new(&self.context))
    }

    fn process_element(&mut self, element: WindowedValue) -> Result<()> {
        self.lifecycle.check_active("process_element")?;
        let mut output = OutputEmitter::new(&self.context);
        self.do_fn
            .process_element(&element, &BundleContext::new(&self.context), &mut output)?;
        self.processed += 1;
        Ok(())
    }

    fn finish_bundle(&mut self) -> Result<()> {
        self.lifecycle.finish()?;
        let mut output = OutputEmitter::new(&self.context);
        self.do_fn
            .finish_bundle(&BundleContext::new(&self.context), &mut output)?;
        tracing::debug!(
            "[{}] Finished bundle after {} element(s)",
            self.context.node_id(),
            self.processed
        );
        Ok(())
    }

    fn state(&self) -> RunnerState {
        self.lifecycle.state()
    }
}
