//! Framework registry lookup and YAML loading.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::config::create_default_registry;
use super::spec::FrameworkSpec;
use crate::crosswalk::framework_header;
use crate::error::Result;
use crate::types::FrameworkId;

/// Registry of framework specifications, ordered by framework id.
#[derive(Debug, Clone, Default)]
pub struct FrameworkRegistry {
    specs: BTreeMap<FrameworkId, FrameworkSpec>,
}

impl FrameworkRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a framework, replacing any previous spec with the same id.
    pub fn register(&mut self, spec: FrameworkSpec) {
        self.specs.insert(spec.id(), spec);
    }

    /// Get the specification for a framework.
    #[must_use]
    pub fn get(&self, id: &FrameworkId) -> Option<&FrameworkSpec> {
        self.specs.get(id)
    }

    /// Look up a framework by code and version.
    #[must_use]
    pub fn find(&self, code: &str, version: &str) -> Option<&FrameworkSpec> {
        self.get(&FrameworkId::new(code, version))
    }

    /// Find the framework whose mapping header matches a sheet header,
    /// ignoring whitespace differences and a trailing `(Partial ...)`
    /// qualifier.
    #[must_use]
    pub fn find_by_header(&self, header: &str) -> Option<&FrameworkSpec> {
        let wanted = framework_header(header);
        self.specs.values().find(|spec| {
            spec.mapping_header
                .as_deref()
                .is_some_and(|h| framework_header(h) == wanted)
        })
    }

    /// Iterate over specs in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameworkSpec> {
        self.specs.values()
    }

    /// Number of registered frameworks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Parse a registry from YAML.
    ///
    /// ```yaml
    /// include_defaults: true
    /// frameworks:
    ///   - code: ISO-27001
    ///     version: "2022"
    ///     family: { type: dotted_decimal, min_segments: 2 }
    /// ```
    ///
    /// With `include_defaults`, listed frameworks override or extend the
    /// built-in table.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml_ng::from_str(yaml)?;

        let mut registry = if file.include_defaults {
            create_default_registry()
        } else {
            Self::new()
        };

        for spec in file.frameworks {
            spec.validate()?;
            tracing::debug!(framework = %spec.id(), family = spec.family.name(), "Registering framework");
            registry.register(spec);
        }

        Ok(registry)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    include_defaults: bool,
    #[serde(default)]
    frameworks: Vec<FrameworkSpec>,
}

/// Load the registry from a YAML file, or the built-in table when no path is given.
pub fn load_registry(path: Option<&Path>) -> Result<FrameworkRegistry> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading framework registry");
            let yaml = std::fs::read_to_string(path)?;
            FrameworkRegistry::from_yaml_str(&yaml)
        }
        None => Ok(create_default_registry()),
    }
}
