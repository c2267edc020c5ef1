// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoding hints and versioned behaviour switches.

#[cfg(feature = "config-loaders")]
use serde::Deserialize;

/// Wire representation hint for a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    /// Protobuf default for the type (varint for integers).
    #[default]
    Default,
    /// Zig-zag varint (`sint32` / `sint64`).
    ZigZag,
    /// Plain two's-complement varint.
    TwosComplement,
    /// Fixed-width little-endian (`fixed32`, `sfixed64`, ...).
    FixedSize,
    /// Nested messages written as start/end group.
    Group,
    /// Well-known types (`google.protobuf.Timestamp`, ...) regardless of level.
    WellKnown,
}

/// Versioned behaviour switch for a model, descriptor or member.
///
/// Ordered: later levels compare greater. `NotSpecified` behaves as `Level200`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "config-loaders", derive(Deserialize))]
pub enum CompatibilityLevel {
    #[default]
    NotSpecified,
    Level200,
    Level240,
    Level300,
}

impl CompatibilityLevel {
    /// Level with `NotSpecified` folded into `Level200`.
    pub fn effective(self) -> Self {
        match self {
            Self::NotSpecified => Self::Level200,
            other => other,
        }
    }

    /// Use `self` unless unspecified, then `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        match self {
            Self::NotSpecified => fallback,
            other => other,
        }
    }

    /// Date/time and durations map to well-known types.
    pub fn uses_well_known_time(self) -> bool {
        self.effective() >= Self::Level240
    }

    /// Decimal and guid map to plain strings.
    pub fn uses_plain_strings(self) -> bool {
        self.effective() >= Self::Level300
    }
}

/// `.proto` syntax flavour for schema export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtoSyntax {
    Proto2,
    #[default]
    Proto3,
}

impl ProtoSyntax {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proto2 => "proto2",
            Self::Proto3 => "proto3",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_level() {
        assert_eq!(
            CompatibilityLevel::NotSpecified.effective(),
            CompatibilityLevel::Level200
        );
        assert!(!CompatibilityLevel::NotSpecified.uses_well_known_time());
        assert!(CompatibilityLevel::Level240.uses_well_known_time());
        assert!(!CompatibilityLevel::Level240.uses_plain_strings());
        assert!(CompatibilityLevel::Level300.uses_plain_strings());
    }

    #[test]
    fn test_or_fallback() {
        assert_eq!(
            CompatibilityLevel::NotSpecified.or(CompatibilityLevel::Level300),
            CompatibilityLevel::Level300
        );
        assert_eq!(
            CompatibilityLevel::Level240.or(CompatibilityLevel::Level300),
            CompatibilityLevel::Level240
        );
    }
}
