// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Builder for [`TypeModel`].
//!
//! Options start from [`ModelOptions::from_env`]; anything set on the builder
//! wins over the environment.

use super::{DefaultFactory, ModelCore, TypeModel};
use crate::config::ModelOptions;
use crate::introspect::{ShapeCatalog, TypeIntrospector};
use crate::types::{CompatibilityLevel, TypeKey};
use crate::value::MessageValue;
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating a [`TypeModel`].
pub struct TypeModelBuilder {
    introspector: Option<Arc<dyn TypeIntrospector>>,
    catalog: Option<Arc<ShapeCatalog>>,
    options: ModelOptions,
    default_factory: Option<DefaultFactory>,
}

impl Default for TypeModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeModelBuilder {
    pub fn new() -> Self {
        Self {
            introspector: None,
            catalog: None,
            options: ModelOptions::from_env(),
            default_factory: None,
        }
    }

    /// Introspect types through `catalog`.
    pub fn catalog(mut self, catalog: Arc<ShapeCatalog>) -> Self {
        let introspector: Arc<dyn TypeIntrospector> = catalog.clone();
        self.introspector = Some(introspector);
        self.catalog = Some(catalog);
        self
    }

    /// Introspect types through a custom introspector.
    pub fn introspector(mut self, introspector: Arc<dyn TypeIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self.catalog = None;
        self
    }

    /// Replace all options at once (e.g. loaded from YAML).
    pub fn options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Load options from a YAML file on top of the current ones.
    #[cfg(feature = "config-loaders")]
    pub fn options_file<P: AsRef<std::path::Path>>(
        mut self,
        path: P,
    ) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;
        let doc: crate::config::YamlModelOptions =
            serde_yaml::from_str(&content).map_err(|e| format!("Failed to parse YAML: {}", e))?;
        self.options = crate::config::YamlLoader::apply(doc, self.options)?;
        Ok(self)
    }

    pub fn auto_add_missing_types(mut self, enabled: bool) -> Self {
        self.options.auto_add_missing_types = enabled;
        self
    }

    pub fn auto_add_contract_types_only(mut self, enabled: bool) -> Self {
        self.options.auto_add_contract_types_only = enabled;
        self
    }

    pub fn implicit_zero_default(mut self, enabled: bool) -> Self {
        self.options.implicit_zero_default = enabled;
        self
    }

    /// See [`ModelOptions::intern_strings`](crate::config::ModelOptions::intern_strings); decoded values are unaffected.
    pub fn intern_strings(mut self, enabled: bool) -> Self {
        self.options.intern_strings = enabled;
        self
    }

    pub fn compatibility_level(mut self, level: CompatibilityLevel) -> Self {
        self.options.default_compatibility_level = level;
        self
    }

    pub fn metadata_timeout(mut self, timeout: Duration) -> Self {
        self.options.metadata_timeout = timeout;
        self
    }

    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&TypeKey) -> Option<MessageValue> + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(factory));
        self
    }

    /// Build the model. Without a catalog or introspector the model gets an
    /// empty catalog of its own.
    pub fn build(self) -> TypeModel {
        let (introspector, catalog) = match (self.introspector, self.catalog) {
            (Some(introspector), catalog) => (introspector, catalog),
            (None, _) => {
                let catalog = Arc::new(ShapeCatalog::new());
                let introspector: Arc<dyn TypeIntrospector> = catalog.clone();
                (introspector, Some(catalog))
            }
        };
        let core = ModelCore::new(introspector, catalog, self.options);
        if let Some(factory) = self.default_factory {
            *core.default_factory.write() = Some(factory);
        }
        log::debug!(
            "[TypeModel] created (auto_add={}, level={:?})",
            core.options().auto_add_missing_types,
            core.options().default_compatibility_level
        );
        TypeModel { core }
    }
}
