// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! User functions and their registry.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use fnharness_model::FunctionSpec;
use parking_lot::RwLock;

use crate::core::clients::{StateKey, StateRequest};
use crate::core::context::ExecutionContext;
use crate::core::element::WindowedValue;
use crate::core::error::{HarnessError, Result};
use crate::core::options::PipelineOptions;
use crate::core::side_inputs::SideInputSpec;
use crate::core::windowing::BoundedWindow;

/// A user-supplied per-element function.
pub trait DoFn: Send + 'static {
    fn start_bundle(&mut self, _context: &BundleContext<'_>) -> Result<()> {
        Ok(())
    }

    fn process_element(
        &mut self,
        element: &WindowedValue,
        context: &BundleContext<'_>,
        output: &mut OutputEmitter<'_>,
    ) -> Result<()>;

    fn finish_bundle(
        &mut self,
        _context: &BundleContext<'_>,
        _output: &mut OutputEmitter<'_>,
    ) -> Result<()> {
        Ok(())
    }
}

/// What a user function may see of its node while a bundle is in flight.
pub struct BundleContext<'a> {
    context: &'a ExecutionContext,
}

impl<'a> BundleContext<'a> {
    pub fn new(context: &'a ExecutionContext) -> Self {
        Self { context }
    }

    pub fn node_id(&self) -> &str {
        self.context.node_id()
    }

    pub fn options(&self) -> &PipelineOptions {
        self.context.options()
    }

    pub fn instruction_id(&self) -> String {
        self.context.instruction_id()
    }

    pub fn side_input(&self, label: &str) -> Result<&SideInputSpec> {
        self.context
            .side_inputs()
            .get(label)
            .ok_or_else(|| HarnessError::UnknownSideInput(label.to_string()))
    }

    /// Fetch the encoded values of `key` in a multimap side input, for the
    /// side-input window that `main_window` maps to.
    pub fn fetch_side_input(
        &self,
        label: &str,
        main_window: &BoundedWindow,
        key: &[u8],
    ) -> Result<Vec<u8>> {
        let spec = self.side_input(label)?;
        let window = spec.window_mapping.map_window(main_window).ok_or_else(|| {
            HarnessError::State(format!(
                "side input '{label}' uses a window mapping that cannot be evaluated here"
            ))
        })?;
        let window = rmp_serde::to_vec_named(&window)
            .map_err(|e| HarnessError::State(format!("cannot encode side input window: {e}")))?;

        let request = StateRequest {
            instruction_id: self.instruction_id(),
            key: StateKey::MultimapSideInput {
                node_id: self.node_id().to_string(),
                side_input_label: label.to_string(),
                window,
                key: key.to_vec(),
            },
        };
        tracing::trace!("[{}] Fetching side input '{}'", self.node_id(), label);
        self.context.state_client().get(&request)
    }
}

/// Sends a user function's output to the receivers of its output labels.
pub struct OutputEmitter<'a> {
    context: &'a ExecutionContext,
    emitted: usize,
}

impl<'a> OutputEmitter<'a> {
    pub fn new(context: &'a ExecutionContext) -> Self {
        Self {
            context,
            emitted: 0,
        }
    }

    /// Emit on the main output.
    pub fn output(&mut self, element: WindowedValue) -> Result<()> {
        let context = self.context;
        self.output_to(&context.stage().main_output, element)
    }

    /// Emit on a tagged output.
    pub fn output_to(&mut self, label: &str, element: WindowedValue) -> Result<()> {
        self.context.router().emit(label, element)?;
        self.emitted += 1;
        Ok(())
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

/// Builds a user function from its serialized configuration.
pub type DoFnConstructor = fn(&[u8]) -> Result<Box<dyn DoFn>>;

/// Types used by macro-generated code. Not for direct use.
pub mod macro_codegen {
    use super::DoFnConstructor;

    pub struct DoFnRegistration {
        pub urn: &'static str,
        pub constructor: DoFnConstructor,
    }

    inventory::collect!(DoFnRegistration);
}

/// User function URN to constructor.
#[derive(Default)]
pub struct DoFnRegistry {
    constructors: RwLock<HashMap<String, DoFnConstructor>>,
}

/// Process-wide user function registry.
/// Populated from `register_dofn!` submissions on first access.
pub static DOFN_REGISTRY: LazyLock<Arc<DoFnRegistry>> = LazyLock::new(|| {
    let registry = DoFnRegistry::new();
    registry.register_linked();
    Arc::new(registry)
});

impl DoFnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every user function submitted with `register_dofn!`.
    /// Already registered URNs are skipped.
    pub fn register_linked(&self) -> usize {
        inventory::iter::<macro_codegen::DoFnRegistration>
            .into_iter()
            .filter(|registration| self.register(registration.urn, registration.constructor))
            .count()
    }

    /// Returns `false` if the URN was already registered; the first
    /// constructor wins.
    pub fn register(&self, urn: impl Into<String>, constructor: DoFnConstructor) -> bool {
        let urn = urn.into();
        let mut constructors = self.constructors.write();
        if constructors.contains_key(&urn) {
            tracing::debug!("User function '{}' already registered, skipping duplicate", urn);
            return false;
        }
        tracing::info!("[register] user function registered '{}'", urn);
        constructors.insert(urn, constructor);
        true
    }

    pub fn contains(&self, urn: &str) -> bool {
        self.constructors.read().contains_key(urn)
    }

    pub fn len(&self) -> usize {
        self.constructors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.read().is_empty()
    }

    pub fn instantiate(&self, spec: &FunctionSpec) -> Result<Box<dyn DoFn>> {
        let constructor = self
            .constructors
            .read()
            .get(&spec.urn)
            .copied()
            .ok_or_else(|| HarnessError::UnknownUserFn(spec.urn.clone()))?;
        constructor(&spec.payload)
    }
}

/// Register a user function constructor under a URN at link time.
///
/// ```ignore
/// fn build_upper(_config: &[u8]) -> fnharness::Result<Box<dyn fnharness::DoFn>> {
///     Ok(Box::new(Upper))
/// }
/// fnharness::register_dofn!("urn:acme:upper", build_upper);
/// ```
#[macro_export]
macro_rules! register_dofn {
    ($urn:expr, $constructor:expr) => {
        $crate::inventory::submit! {
            $crate::core::dofn::macro_codegen::DoFnRegistration {
                urn: $urn,
                constructor: $constructor,
            }
        }
    };
}
