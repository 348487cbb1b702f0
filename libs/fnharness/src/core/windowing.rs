// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Windows, window functions and resolved windowing strategies.

use std::sync::Arc;

use fnharness_model::{
    decode_payload, urns, AccumulationMode, FixedWindowsPayload, FunctionSpec, MergeStatus,
    SessionWindowsPayload, SlidingWindowsPayload,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::coders::Codec;
use crate::core::error::{HarnessError, Result};

/// Largest representable event time, in milliseconds.
pub const MAX_TIMESTAMP_MS: i64 = i64::MAX / 1000;

/// Smallest representable event time, in milliseconds.
pub const MIN_TIMESTAMP_MS: i64 = -MAX_TIMESTAMP_MS;

/// Upper bound on the sliding windows a single element may be assigned to.
pub const MAX_WINDOWS_PER_ELEMENT: i64 = 10_000;

/// The global window ends one day before the end of time.
pub const GLOBAL_WINDOW_MAX_TIMESTAMP_MS: i64 = MAX_TIMESTAMP_MS - 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundedWindow {
    Global,
    /// Half-open interval `[start_ms, end_ms)`.
    Interval { start_ms: i64, end_ms: i64 },
}

impl BoundedWindow {
    pub fn interval(start_ms: i64, end_ms: i64) -> Self {
        Self::Interval { start_ms, end_ms }
    }

    /// The latest timestamp an element of this window may carry.
    pub fn max_timestamp(&self) -> i64 {
        match self {
            Self::Global => GLOBAL_WINDOW_MAX_TIMESTAMP_MS,
            Self::Interval { end_ms, .. } => end_ms - 1,
        }
    }
}

/// A rehydrated window function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowFn {
    Global,
    Fixed {
        size_ms: i64,
        offset_ms: i64,
    },
    Sliding {
        size_ms: i64,
        period_ms: i64,
        offset_ms: i64,
    },
    Sessions {
        gap_ms: i64,
    },
    Custom(FunctionSpec),
}

impl WindowFn {
    pub fn from_spec(spec: &FunctionSpec) -> Result<Self> {
        let window_fn = match spec.urn.as_str() {
            urns::GLOBAL_WINDOWS_FN => WindowFn::Global,
            urns::FIXED_WINDOWS_FN => {
                let p: FixedWindowsPayload = window_payload(spec)?;
                positive(spec, "size_ms", p.size_ms)?;
                WindowFn::Fixed {
                    size_ms: p.size_ms,
                    offset_ms: p.offset_ms,
                }
            }
            urns::SLIDING_WINDOWS_FN => {
                let p: SlidingWindowsPayload = window_payload(spec)?;
                positive(spec, "size_ms", p.size_ms)?;
                positive(spec, "period_ms", p.period_ms)?;
                if p.size_ms / p.period_ms > MAX_WINDOWS_PER_ELEMENT {
                    return Err(HarnessError::malformed(
                        &spec.urn,
                        format!(
                            "size_ms / period_ms must not exceed {MAX_WINDOWS_PER_ELEMENT}, got {} / {}",
                            p.size_ms, p.period_ms
                        ),
                    ));
                }
                WindowFn::Sliding {
                    size_ms: p.size_ms,
                    period_ms: p.period_ms,
                    offset_ms: p.offset_ms,
                }
            }
            urns::SESSION_WINDOWS_FN => {
                let p: SessionWindowsPayload = window_payload(spec)?;
                positive(spec, "gap_ms", p.gap_ms)?;
                WindowFn::Sessions { gap_ms: p.gap_ms }
            }
            "" => return Err(HarnessError::malformed("window_fn", "window fn has no urn")),
            _ => WindowFn::Custom(spec.clone()),
        };
        Ok(window_fn)
    }

    pub fn is_merging(&self) -> bool {
        matches!(self, WindowFn::Sessions { .. })
    }

    /// Windows an element with the given timestamp belongs to.
    ///
    /// Session windows yield the element's proto-window; merging is left to
    /// the grouping step downstream. Fails for timestamps outside
    /// `MIN_TIMESTAMP_MS..=MAX_TIMESTAMP_MS`, for windows whose bounds do
    /// not fit in an `i64`, and for custom window functions, which this
    /// harness cannot evaluate.
    pub fn assign(&self, timestamp_ms: i64) -> Result<Vec<BoundedWindow>> {
        if !(MIN_TIMESTAMP_MS..=MAX_TIMESTAMP_MS).contains(&timestamp_ms) {
            return Err(HarnessError::State(format!(
                "timestamp {timestamp_ms} is outside the representable event time range"
            )));
        }

        let windows = match *self {
            WindowFn::Global => vec![BoundedWindow::Global],
            WindowFn::Fixed { size_ms, offset_ms } => {
                let start = window_start(timestamp_ms, offset_ms, size_ms)?;
                vec![interval_from(start, size_ms)?]
            }
            WindowFn::Sliding {
                size_ms,
                period_ms,
                offset_ms,
            } => {
                let earliest_excluded = timestamp_ms.saturating_sub(size_ms);
                let mut windows = Vec::new();
                let mut start = Some(window_start(timestamp_ms, offset_ms, period_ms)?);
                while let Some(s) = start.filter(|s| *s > earliest_excluded) {
                    windows.push(interval_from(s, size_ms)?);
                    start = s.checked_sub(period_ms);
                }
                windows
            }
            WindowFn::Sessions { gap_ms } => vec![interval_from(timestamp_ms, gap_ms)?],
            WindowFn::Custom(ref spec) => {
                return Err(HarnessError::Configuration(format!(
                    "window function '{}' cannot be evaluated by this harness",
                    spec.urn
                )));
            }
        };
        Ok(windows)
    }
}

/// Start of the window of length `size_ms` (aligned to `offset_ms`)
/// containing `timestamp_ms`.
fn window_start(timestamp_ms: i64, offset_ms: i64, size_ms: i64) -> Result<i64> {
    let shifted = timestamp_ms
        .checked_sub(offset_ms)
        .ok_or_else(|| out_of_range(timestamp_ms))?;
    timestamp_ms
        .checked_sub(shifted.rem_euclid(size_ms))
        .ok_or_else(|| out_of_range(timestamp_ms))
}

fn interval_from(start_ms: i64, size_ms: i64) -> Result<BoundedWindow> {
    let end_ms = start_ms
        .checked_add(size_ms)
        .ok_or_else(|| out_of_range(start_ms))?;
    Ok(BoundedWindow::interval(start_ms, end_ms))
}

fn out_of_range(timestamp_ms: i64) -> HarnessError {
    HarnessError::State(format!(
        "window bounds for timestamp {timestamp_ms} overflow the event time range"
    ))
}

fn window_payload<T: DeserializeOwned>(spec: &FunctionSpec) -> Result<T> {
    decode_payload(&spec.payload)
        .map_err(|e| HarnessError::malformed(&spec.urn, format!("undecodable payload: {e}")))
}

fn positive(spec: &FunctionSpec, field: &str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(HarnessError::malformed(
            &spec.urn,
            format!("{field} must be positive, got {value}"),
        ));
    }
    Ok(())
}

/// A windowing strategy with its window function and window codec resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowingStrategy {
    pub window_fn: WindowFn,
    pub window_codec: Arc<Codec>,
    pub merge_status: MergeStatus,
    pub accumulation_mode: AccumulationMode,
    pub allowed_lateness_ms: i64,
}
