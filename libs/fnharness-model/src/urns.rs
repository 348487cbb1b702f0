// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Well-known URNs understood by the harness.

// ============================================================================
// Codecs
// ============================================================================

pub const BYTES_CODEC: &str = "beam:coder:bytes:v1";
pub const STRING_UTF8_CODEC: &str = "beam:coder:string_utf8:v1";
pub const VARINT_CODEC: &str = "beam:coder:varint:v1";
pub const BOOL_CODEC: &str = "beam:coder:bool:v1";
pub const DOUBLE_CODEC: &str = "beam:coder:double:v1";
pub const KV_CODEC: &str = "beam:coder:kv:v1";
pub const ITERABLE_CODEC: &str = "beam:coder:iterable:v1";
pub const LENGTH_PREFIX_CODEC: &str = "beam:coder:length_prefix:v1";
pub const GLOBAL_WINDOW_CODEC: &str = "beam:coder:global_window:v1";
pub const INTERVAL_WINDOW_CODEC: &str = "beam:coder:interval_window:v1";
pub const WINDOWED_VALUE_CODEC: &str = "beam:coder:windowed_value:v1";

// ============================================================================
// Window functions
// ============================================================================

pub const GLOBAL_WINDOWS_FN: &str = "beam:window_fn:global_windows:v1";
pub const FIXED_WINDOWS_FN: &str = "beam:window_fn:fixed_windows:v1";
pub const SLIDING_WINDOWS_FN: &str = "beam:window_fn:sliding_windows:v1";
pub const SESSION_WINDOWS_FN: &str = "beam:window_fn:session_windows:v1";

// ============================================================================
// Transforms
// ============================================================================

pub const PAR_DO_TRANSFORM: &str = "beam:transform:pardo:v1";
pub const ASSIGN_WINDOWS_TRANSFORM: &str = "beam:transform:window_into:v1";

// ============================================================================
// Side inputs
// ============================================================================

/// The only side-input materialization this harness can serve.
pub const MULTIMAP_SIDE_INPUT: &str = "beam:side_input:multimap:v1";
pub const ITERABLE_SIDE_INPUT: &str = "beam:side_input:iterable:v1";

pub const ITERABLE_VIEW_FN: &str = "beam:view_fn:iterable:v1";
pub const MULTIMAP_VIEW_FN: &str = "beam:view_fn:multimap:v1";
pub const SINGLETON_VIEW_FN: &str = "beam:view_fn:singleton:v1";

pub const GLOBAL_WINDOW_MAPPING_FN: &str = "beam:window_mapping_fn:global:v1";
pub const IDENTITY_WINDOW_MAPPING_FN: &str = "beam:window_mapping_fn:identity:v1";
