// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Model constants and option sources.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: constants (field number limits, lock timeout, import paths)
//! - **Level 2 (Dynamic)**: [`ModelOptions`], built from defaults, the environment
//!   or a YAML document, then handed to [`TypeModel::builder`](crate::TypeModel::builder)
//!
//! # Example
//!
//! ```rust
//! use protomodel::config::{ModelOptions, DEFAULT_METADATA_TIMEOUT_MS};
//!
//! let options = ModelOptions::default();
//! assert!(options.auto_add_missing_types);
//! assert_eq!(options.metadata_timeout.as_millis() as u64, DEFAULT_METADATA_TIMEOUT_MS);
//! ```

use crate::types::CompatibilityLevel;
use std::time::Duration;

// =======================================================================
// Field numbers (protobuf encoding guide)
// =======================================================================

/// Lowest legal field number.
pub const MIN_FIELD_NUMBER: u32 = 1;

/// Highest legal field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = crate::wire::MAX_FIELD_NUMBER;

/// Messages and groups a reader enters before it gives up.
pub const MAX_NESTING_DEPTH: u32 = crate::wire::MAX_NESTING_DEPTH;

/// First field number reserved for the protobuf implementation.
pub const RESERVED_FIELD_START: u32 = 19_000;

/// Last field number reserved for the protobuf implementation.
pub const RESERVED_FIELD_END: u32 = 19_999;

// =======================================================================
// Metadata lock
// =======================================================================

/// Default window for acquiring the metadata lock.
pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 5000;

/// Environment override for the metadata lock window, in milliseconds.
pub const METADATA_TIMEOUT_ENV: &str = "PROTOMODEL_METADATA_TIMEOUT_MS";

// =======================================================================
// Schema imports
// =======================================================================

pub const IMPORT_BCL: &str = "protobuf-net/bcl.proto";
pub const IMPORT_TIMESTAMP: &str = "google/protobuf/timestamp.proto";
pub const IMPORT_DURATION: &str = "google/protobuf/duration.proto";
pub const IMPORT_PROTOGEN: &str = "protobuf-net/protogen.proto";

/// Global switches of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    /// Create descriptors for unknown types on first use.
    pub auto_add_missing_types: bool,
    /// Only auto-add types that declare a contract.
    pub auto_add_contract_types_only: bool,
    /// Skip writing scalars equal to their zero value.
    pub implicit_zero_default: bool,
    /// Share identical strings when deserializing.
    ///
    /// Kept for option-file compatibility. [`Value::String`](crate::Value)
    /// owns its text, so reads never share storage and this switch has no
    /// effect on decoded values.
    pub intern_strings: bool,
    /// Level applied to descriptors that do not specify one.
    pub default_compatibility_level: CompatibilityLevel,
    /// Window for acquiring the metadata lock.
    pub metadata_timeout: Duration,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            auto_add_missing_types: true,
            auto_add_contract_types_only: false,
            implicit_zero_default: true,
            intern_strings: false,
            default_compatibility_level: CompatibilityLevel::NotSpecified,
            metadata_timeout: Duration::from_millis(DEFAULT_METADATA_TIMEOUT_MS),
        }
    }
}

impl ModelOptions {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        options.apply_env();
        options
    }

    /// Apply environment overrides in place. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var(METADATA_TIMEOUT_ENV) {
            match parse_timeout_ms(&raw) {
                Some(timeout) => self.metadata_timeout = timeout,
                None => log::warn!(
                    "[ModelOptions] ignoring {}={:?}: expected milliseconds",
                    METADATA_TIMEOUT_ENV,
                    raw
                ),
            }
        }
    }
}

/// Parse a millisecond count. Zero is rejected: the lock must be able to wait.
pub(crate) fn parse_timeout_ms(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(ms) => Some(Duration::from_millis(ms)),
    }
}

#[cfg(feature = "config-loaders")]
pub use yaml::{YamlLoader, YamlModelOptions};

#[cfg(feature = "config-loaders")]
mod yaml {
    //! YAML option documents.
    //!
    //! ```yaml
    //! auto_add_missing_types: true
    //! implicit_zero_default: true
    //! default_compatibility_level: Level300
    //! metadata_timeout_ms: 2500
    //! ```

    use super::{parse_timeout_ms, ModelOptions};
    use crate::types::CompatibilityLevel;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;

    /// YAML option loader.
    pub struct YamlLoader;

    /// Root YAML document. Absent keys keep their defaults.
    #[derive(Debug, Deserialize, Default)]
    #[serde(default, deny_unknown_fields)]
    pub struct YamlModelOptions {
        pub auto_add_missing_types: Option<bool>,
        pub auto_add_contract_types_only: Option<bool>,
        pub implicit_zero_default: Option<bool>,
        pub intern_strings: Option<bool>,
        pub default_compatibility_level: Option<CompatibilityLevel>,
        pub metadata_timeout_ms: Option<u64>,
    }

    impl YamlLoader {
        /// Load options from a YAML file.
        pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ModelOptions, String> {
            let yaml_content =
                fs::read_to_string(path).map_err(|e| format!("Failed to read YAML file: {}", e))?;
            Self::load_from_str(&yaml_content)
        }

        /// Load options from a YAML string.
        pub fn load_from_str(yaml_content: &str) -> Result<ModelOptions, String> {
            let doc: YamlModelOptions = serde_yaml::from_str(yaml_content)
                .map_err(|e| format!("Failed to parse YAML: {}", e))?;
            Self::apply(doc, ModelOptions::default())
        }

        /// Overlay a parsed document on `base`.
        pub fn apply(doc: YamlModelOptions, mut base: ModelOptions) -> Result<ModelOptions, String> {
            if let Some(v) = doc.auto_add_missing_types {
                base.auto_add_missing_types = v;
            }
            if let Some(v) = doc.auto_add_contract_types_only {
                base.auto_add_contract_types_only = v;
            }
            if let Some(v) = doc.implicit_zero_default {
                base.implicit_zero_default = v;
            }
            if let Some(v) = doc.intern_strings {
                base.intern_strings = v;
            }
            if let Some(level) = doc.default_compatibility_level {
                base.default_compatibility_level = level;
            }
            if let Some(ms) = doc.metadata_timeout_ms {
                base.metadata_timeout = parse_timeout_ms(&ms.to_string())
                    .ok_or_else(|| format!("Invalid metadata_timeout_ms: {}", ms))?;
            }
            Ok(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ModelOptions::default();
        assert!(options.auto_add_missing_types);
        assert!(!options.auto_add_contract_types_only);
        assert!(options.implicit_zero_default);
        assert_eq!(options.metadata_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout_ms(" 250 "), Some(Duration::from_millis(250)));
        assert_eq!(parse_timeout_ms("0"), None);
        assert_eq!(parse_timeout_ms("soon"), None);
    }

    #[test]
    fn test_reserved_range_inside_limits() {
        assert!(RESERVED_FIELD_START > MIN_FIELD_NUMBER);
        assert!(RESERVED_FIELD_END < MAX_FIELD_NUMBER);
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_overlay() {
        let options = YamlLoader::load_from_str(
            "auto_add_contract_types_only: true\n\
             default_compatibility_level: Level300\n\
             metadata_timeout_ms: 1200\n",
        )
        .expect("yaml");
        assert!(options.auto_add_contract_types_only);
        assert!(options.auto_add_missing_types);
        assert_eq!(
            options.default_compatibility_level,
            CompatibilityLevel::Level300
        );
        assert_eq!(options.metadata_timeout, Duration::from_millis(1200));
    }

    #[cfg(feature = "config-loaders")]
    #[test]
    fn test_yaml_file_and_errors() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "implicit_zero_default: false").expect("write");
        let options = YamlLoader::load_from_file(file.path()).expect("load");
        assert!(!options.implicit_zero_default);

        assert!(YamlLoader::load_from_str("metadata_timeout_ms: 0").is_err());
        assert!(YamlLoader::load_from_str("no_such_option: 1").is_err());
    }
}
