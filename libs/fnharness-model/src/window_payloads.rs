// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};

/// Payload of `beam:window_fn:fixed_windows:v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedWindowsPayload {
    pub size_ms: i64,
    #[serde(default)]
    pub offset_ms: i64,
}

/// Payload of `beam:window_fn:sliding_windows:v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidingWindowsPayload {
    pub size_ms: i64,
    pub period_ms: i64,
    #[serde(default)]
    pub offset_ms: i64,
}

/// Payload of `beam:window_fn:session_windows:v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindowsPayload {
    pub gap_ms: i64,
}
