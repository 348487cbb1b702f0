// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use tracing_subscriber::EnvFilter;

use crate::core::error::{HarnessError, Result};

/// Install the process-wide fmt subscriber.
///
/// `RUST_LOG` takes precedence; `default_directive` applies when it is unset
/// or unparsable. Fails if a global subscriber is already installed.
pub fn init_logging(default_directive: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive).map_err(|e| {
            HarnessError::Configuration(format!(
                "invalid log directive '{default_directive}': {e}"
            ))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| HarnessError::Configuration(format!("logging already initialized: {e}")))
}
