// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Live codec objects rehydrated from codec definitions.

use std::sync::Arc;

use fnharness_model::{urns, CodecDefinition};

use crate::core::error::{HarnessError, Result};

/// A resolved codec. Nested codecs are shared, so identical sub-trees
/// resolved through the same registry are the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Codec {
    Bytes,
    StringUtf8,
    VarInt,
    Bool,
    Double,
    Kv {
        key: Arc<Codec>,
        value: Arc<Codec>,
    },
    Iterable(Arc<Codec>),
    LengthPrefix(Arc<Codec>),
    GlobalWindow,
    IntervalWindow,
    /// Envelope carrying a value together with its timestamp, windows and pane.
    WindowedValue {
        value: Arc<Codec>,
        window: Arc<Codec>,
    },
    /// A codec this harness does not interpret, kept opaque.
    Custom {
        urn: String,
        payload: Vec<u8>,
        components: Vec<Arc<Codec>>,
    },
}

impl Codec {
    /// Build a codec from its definition and already-resolved components.
    pub(crate) fn from_definition(
        id: &str,
        definition: &CodecDefinition,
        components: Vec<Arc<Codec>>,
    ) -> Result<Self> {
        let urn = definition.spec.urn.as_str();
        let codec = match urn {
            urns::BYTES_CODEC => leaf(id, urn, components, Codec::Bytes)?,
            urns::STRING_UTF8_CODEC => leaf(id, urn, components, Codec::StringUtf8)?,
            urns::VARINT_CODEC => leaf(id, urn, components, Codec::VarInt)?,
            urns::BOOL_CODEC => leaf(id, urn, components, Codec::Bool)?,
            urns::DOUBLE_CODEC => leaf(id, urn, components, Codec::Double)?,
            urns::GLOBAL_WINDOW_CODEC => leaf(id, urn, components, Codec::GlobalWindow)?,
            urns::INTERVAL_WINDOW_CODEC => leaf(id, urn, components, Codec::IntervalWindow)?,
            urns::KV_CODEC => {
                let [key, value] = exactly::<2>(id, urn, components)?;
                Codec::Kv { key, value }
            }
            urns::ITERABLE_CODEC => {
                let [element] = exactly::<1>(id, urn, components)?;
                Codec::Iterable(element)
            }
            urns::LENGTH_PREFIX_CODEC => {
                let [inner] = exactly::<1>(id, urn, components)?;
                Codec::LengthPrefix(inner)
            }
            urns::WINDOWED_VALUE_CODEC => {
                let [value, window] = exactly::<2>(id, urn, components)?;
                Codec::WindowedValue { value, window }
            }
            "" => return Err(HarnessError::malformed(id, "codec has no urn")),
            other => Codec::Custom {
                urn: other.to_string(),
                payload: definition.spec.payload.clone(),
                components,
            },
        };
        Ok(codec)
    }

    pub fn urn(&self) -> &str {
        match self {
            Codec::Bytes => urns::BYTES_CODEC,
            Codec::StringUtf8 => urns::STRING_UTF8_CODEC,
            Codec::VarInt => urns::VARINT_CODEC,
            Codec::Bool => urns::BOOL_CODEC,
            Codec::Double => urns::DOUBLE_CODEC,
            Codec::Kv { .. } => urns::KV_CODEC,
            Codec::Iterable(_) => urns::ITERABLE_CODEC,
            Codec::LengthPrefix(_) => urns::LENGTH_PREFIX_CODEC,
            Codec::GlobalWindow => urns::GLOBAL_WINDOW_CODEC,
            Codec::IntervalWindow => urns::INTERVAL_WINDOW_CODEC,
            Codec::WindowedValue { .. } => urns::WINDOWED_VALUE_CODEC,
            Codec::Custom { urn, .. } => urn,
        }
    }

    pub fn is_kv(&self) -> bool {
        matches!(self, Codec::Kv { .. })
    }

    pub fn is_windowed_value(&self) -> bool {
        matches!(self, Codec::WindowedValue { .. })
    }
}

fn leaf(id: &str, urn: &str, components: Vec<Arc<Codec>>, codec: Codec) -> Result<Codec> {
    exactly::<0>(id, urn, components)?;
    Ok(codec)
}

fn exactly<const N: usize>(
    id: &str,
    urn: &str,
    components: Vec<Arc<Codec>>,
) -> Result<[Arc<Codec>; N]> {
    let found = components.len();
    components.try_into().map_err(|_| {
        HarnessError::malformed(
            id,
            format!("{urn} expects {N} component codecs, found {found}"),
        )
    })
}
