// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Rehydration of codecs and windowing strategies from identifier tables.
//!
//! Construction copies the raw tables; resolution then happens on demand,
//! memoized per identifier. A visiting stack guards the recursion so cyclic
//! codec references fail instead of looping.

use std::collections::HashMap;
use std::sync::Arc;

use fnharness_model::{CodecDefinition, WindowingStrategyDefinition};
use parking_lot::RwLock;

use crate::core::coders::Codec;
use crate::core::error::{HarnessError, Result};
use crate::core::windowing::{WindowFn, WindowingStrategy};

pub struct ComponentRegistry {
    codecs: HashMap<String, CodecDefinition>,
    windowing_strategies: HashMap<String, WindowingStrategyDefinition>,
    codec_cache: RwLock<HashMap<String, Arc<Codec>>>,
    strategy_cache: RwLock<HashMap<String, Arc<WindowingStrategy>>>,
}

impl ComponentRegistry {
    pub fn new(
        codecs: &HashMap<String, CodecDefinition>,
        windowing_strategies: &HashMap<String, WindowingStrategyDefinition>,
    ) -> Self {
        Self {
            codecs: codecs.clone(),
            windowing_strategies: windowing_strategies.clone(),
            codec_cache: RwLock::new(HashMap::new()),
            strategy_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolve_codec(&self, id: &str) -> Result<Arc<Codec>> {
        let mut visiting = Vec::new();
        self.resolve_codec_guarded(id, &mut visiting)
    }

    pub fn resolve_windowing_strategy(&self, id: &str) -> Result<Arc<WindowingStrategy>> {
        if let Some(strategy) = self.strategy_cache.read().get(id) {
            return Ok(strategy.clone());
        }

        let definition = self
            .windowing_strategies
            .get(id)
            .ok_or_else(|| HarnessError::malformed(id, "unknown windowing strategy"))?;

        let window_fn = WindowFn::from_spec(&definition.window_fn).map_err(|e| match e {
            HarnessError::MalformedComponents { reason, .. } => {
                HarnessError::malformed(id, format!("window fn: {reason}"))
            }
            other => other,
        })?;
        let window_codec = self.resolve_codec(&definition.window_codec_id)?;

        let strategy = Arc::new(WindowingStrategy {
            window_fn,
            window_codec,
            merge_status: definition.merge_status,
            accumulation_mode: definition.accumulation_mode,
            allowed_lateness_ms: definition.allowed_lateness_ms,
        });

        tracing::trace!("Resolved windowing strategy '{}'", id);
        Ok(self
            .strategy_cache
            .write()
            .entry(id.to_string())
            .or_insert(strategy)
            .clone())
    }

    fn resolve_codec_guarded(&self, id: &str, visiting: &mut Vec<String>) -> Result<Arc<Codec>> {
        if let Some(codec) = self.codec_cache.read().get(id) {
            return Ok(codec.clone());
        }

        if visiting.iter().any(|v| v == id) {
            let mut path = visiting.clone();
            path.push(id.to_string());
            return Err(HarnessError::malformed(
                id,
                format!("cyclic codec reference: {}", path.join(" -> ")),
            ));
        }

        let definition = self
            .codecs
            .get(id)
            .ok_or_else(|| HarnessError::malformed(id, "unknown codec"))?;

        visiting.push(id.to_string());
        let components = definition
            .component_codec_ids
            .iter()
            .map(|component| self.resolve_codec_guarded(component, visiting))
            .collect::<Result<Vec<_>>>();
        visiting.pop();

        let codec = Arc::new(Codec::from_definition(id, definition, components?)?);

        tracing::trace!("Resolved codec '{}' ({})", id, codec.urn());
        Ok(self
            .codec_cache
            .write()
            .entry(id.to_string())
            .or_insert(codec)
            .clone())
    }
}
