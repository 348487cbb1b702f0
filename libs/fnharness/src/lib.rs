// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Per-operator execution harness.
//!
//! Compiles one pipeline node (a stage descriptor plus the pipeline's shared
//! component tables) into a bundle runner wired into the pipeline's consumer
//! and bundle function registries.

#![allow(clippy::type_complexity)] // Receiver and constructor aliases read fine in context

// Re-exported for `register_dofn!`
pub use inventory;

pub use fnharness_model as model;

pub mod core;

pub use crate::core::*;
