// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

mod assign_windows;
mod pardo;

pub use assign_windows::{AssignWindowsRunner, AssignWindowsRunnerFactory};
pub use pardo::{ParDoRunner, ParDoRunnerFactory};
