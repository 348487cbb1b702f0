// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

/// Errors that can occur while decoding or encoding wire model values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Failed to decode a MessagePack payload.
    #[error("failed to decode payload: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Failed to encode a MessagePack payload.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to parse a JSON component table.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field decoded as empty.
    #[error("missing required field '{field}'")]
    MissingField { field: String },
}

/// Result type alias for wire model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
