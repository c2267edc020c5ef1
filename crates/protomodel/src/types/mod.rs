// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type identity, built-in scalars and encoding hints.

mod format;
mod key;
mod scalar;

pub use format::{CompatibilityLevel, DataFormat, ProtoSyntax};
pub use key::TypeKey;
pub use scalar::ScalarKind;
