// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Pipeline options handed to every node.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::error::{HarnessError, Result};

/// Options the pipeline was submitted with.
///
/// Only a few keys are interpreted by the harness itself; everything else
/// is kept in `extra` for user functions to read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub experiments: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PipelineOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| HarnessError::Configuration(format!("invalid options JSON: {e}")))
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source)
            .map_err(|e| HarnessError::Configuration(format!("invalid options TOML: {e}")))
    }

    /// Load options from a `.json` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;

        let options = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&source)?,
            Some("toml") => Self::from_toml_str(&source)?,
            other => {
                return Err(HarnessError::Configuration(format!(
                    "unsupported options file extension {:?} for {}",
                    other,
                    path.display()
                )));
            }
        };
        tracing::info!(
            "Loaded pipeline options from {} ({} extra keys)",
            path.display(),
            options.extra.len()
        );
        Ok(options)
    }

    pub fn has_experiment(&self, name: &str) -> bool {
        self.experiments.iter().any(|e| e == name)
    }

    /// Deserialize an extra option. `Ok(None)` if the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.extra
            .get(key)
            .map(|value| {
                T::deserialize(value).map_err(|e| {
                    HarnessError::Configuration(format!("option '{key}' has the wrong type: {e}"))
                })
            })
            .transpose()
    }
}
