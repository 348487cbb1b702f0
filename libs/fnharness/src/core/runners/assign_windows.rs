// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use crate::core::context::ExecutionContext;
use crate::core::element::WindowedValue;
use crate::core::error::{HarnessError, Result};
use crate::core::runner::{BundleRunner, LifecycleTracker, RunnerFactory, RunnerState};
use crate::core::windowing::WindowFn;

/// Re-windows elements with the window function named by the stage's user
/// function spec.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssignWindowsRunnerFactory;

impl RunnerFactory for AssignWindowsRunnerFactory {
    type Runner = AssignWindowsRunner;

    fn build_runner(&self, context: Arc<ExecutionContext>) -> Result<AssignWindowsRunner> {
        let window_fn = WindowFn::from_spec(&context.stage().user_fn)?;
        if let WindowFn::Custom(spec) = &window_fn {
            return Err(HarnessError::Configuration(format!(
                "node '{}': window function '{}' cannot be evaluated by this harness",
                context.node_id(),
                spec.urn
            )));
        }
        Ok(AssignWindowsRunner {
            lifecycle: LifecycleTracker::new(context.node_id()),
            context,
            window_fn,
        })
    }
}

pub struct AssignWindowsRunner {
    context: Arc<ExecutionContext>,
    window_fn: WindowFn,
    lifecycle: LifecycleTracker,
}

impl AssignWindowsRunner {
    pub fn window_fn(&self) -> &WindowFn {
        &self.window_fn
    }
}

impl BundleRunner for AssignWindowsRunner {
    fn start_bundle(&mut self) -> Result<()> {
        self.lifecycle.start()
    }

    fn process_element(&mut self, element: WindowedValue) -> Result<()> {
        self.lifecycle.check_active("process_element")?;
        let windows = self.window_fn.assign(element.timestamp_ms).inspect_err(|e| {
            tracing::warn!("[{}] Cannot assign windows: {}", self.context.node_id(), e);
        })?;
        let rewindowed = WindowedValue { windows, ..element };
        let stage = self.context.stage();
        self.context.router().emit(&stage.main_output, rewindowed)
    }

    fn finish_bundle(&mut self) -> Result<()> {
        self.lifecycle.finish()
    }

    fn state(&self) -> RunnerState {
        self.lifecycle.state()
    }
}
