// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Wire model shared between `fnharness` and the bundle-processing controller.

mod window_payloads;

pub mod components;
pub mod error;
pub mod stage;
pub mod urns;

pub use window_payloads::{FixedWindowsPayload, SessionWindowsPayload, SlidingWindowsPayload};

pub use components::{
    AccumulationMode, Boundedness, CodecDefinition, CollectionDescriptor, Components,
    FunctionSpec, MergeStatus, WindowingStrategyDefinition,
};
pub use error::{ModelError, ModelResult};
pub use stage::{
    decode_payload, encode_payload, ParDoPayload, SideInputDeclaration, StageDescriptor,
};
