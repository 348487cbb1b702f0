// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::windowing::{BoundedWindow, MIN_TIMESTAMP_MS};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaneTiming {
    Early,
    OnTime,
    Late,
    #[default]
    Unknown,
}

/// Which firing of a window produced an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneInfo {
    pub timing: PaneTiming,
    pub index: u64,
    pub is_first: bool,
    pub is_last: bool,
}

impl Default for PaneInfo {
    fn default() -> Self {
        Self {
            timing: PaneTiming::Unknown,
            index: 0,
            is_first: true,
            is_last: true,
        }
    }
}

/// An element together with its event time, windows and pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedValue {
    pub value: serde_json::Value,
    pub timestamp_ms: i64,
    pub windows: Vec<BoundedWindow>,
    #[serde(default)]
    pub pane: PaneInfo,
}

impl WindowedValue {
    pub fn in_global_window(value: serde_json::Value) -> Self {
        Self::timestamped_in_global_window(value, MIN_TIMESTAMP_MS)
    }

    pub fn timestamped_in_global_window(value: serde_json::Value, timestamp_ms: i64) -> Self {
        Self {
            value,
            timestamp_ms,
            windows: vec![BoundedWindow::Global],
            pane: PaneInfo::default(),
        }
    }

    /// Replace the value, keeping timestamp, windows and pane.
    pub fn with_value(&self, value: serde_json::Value) -> Self {
        Self {
            value,
            timestamp_ms: self.timestamp_ms,
            windows: self.windows.clone(),
            pane: self.pane,
        }
    }
}

/// A sink for windowed elements. Registered by the controller or by a
/// runner subscribing to its main input.
pub trait ElementReceiver: Send + Sync {
    fn accept(&self, element: WindowedValue) -> Result<()>;
}

impl<F> ElementReceiver for F
where
    F: Fn(WindowedValue) -> Result<()> + Send + Sync,
{
    fn accept(&self, element: WindowedValue) -> Result<()> {
        (self)(element)
    }
}

pub type ReceiverRef = Arc<dyn ElementReceiver>;
