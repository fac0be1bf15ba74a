//! Declarative specification of one framework.

use serde::{Deserialize, Serialize};

use crate::config::{validate_framework_code, validate_version};
use crate::error::Result;
use crate::rules::RuleFamily;
use crate::types::FrameworkId;

fn default_true() -> bool {
    true
}

/// How the hierarchy of one framework is inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkSpec {
    /// Framework code (e.g., "NIST-800-53").
    pub code: String,

    /// Framework version (e.g., "rev5").
    pub version: String,

    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Reference-code syntax family.
    pub family: RuleFamily,

    /// Whether implied-but-absent ancestors are created as group nodes.
    ///
    /// When `false`, nodes whose parent is missing stay roots and are
    /// reported as unresolved.
    #[serde(default = "default_true")]
    pub synthesize_groups: bool,

    /// Column header of this framework in the SCF mapping sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_header: Option<String>,
}

impl FrameworkSpec {
    /// Create a new framework specification.
    #[must_use]
    pub fn new(code: impl Into<String>, version: impl Into<String>, family: RuleFamily) -> Self {
        Self {
            code: code.into(),
            version: version.into(),
            name: None,
            family,
            synthesize_groups: true,
            mapping_header: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set whether missing ancestors are synthesized.
    #[must_use]
    pub fn with_synthesize_groups(mut self, synthesize: bool) -> Self {
        self.synthesize_groups = synthesize;
        self
    }

    /// Set the mapping sheet column header.
    #[must_use]
    pub fn with_mapping_header(mut self, header: impl Into<String>) -> Self {
        self.mapping_header = Some(header.into());
        self
    }

    /// Identifier of the framework.
    #[must_use]
    pub fn id(&self) -> FrameworkId {
        FrameworkId::new(&self.code, &self.version)
    }

    /// Name for display, falling back to the code.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }

    /// Validate code and version.
    pub fn validate(&self) -> Result<()> {
        validate_framework_code(&self.code)?;
        validate_version(&self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_spec_builder() {
        let spec = FrameworkSpec::new("HIPAA", "2013", RuleFamily::parenthetical_chain())
            .with_name("HIPAA Security Rule")
            .with_synthesize_groups(false)
            .with_mapping_header("HIPAA\nSecurity Rule");

        assert_eq!(spec.id().as_str(), "HIPAA:2013");
        assert_eq!(spec.display_name(), "HIPAA Security Rule");
        assert!(!spec.synthesize_groups);
        assert_eq!(spec.mapping_header.as_deref(), Some("HIPAA\nSecurity Rule"));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_framework_spec_yaml_defaults() {
        let yaml = "code: COBIT\nversion: '2019'\nfamily:\n  type: domain_prefix\n";
        let spec: FrameworkSpec = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(spec.family, RuleFamily::DomainPrefix);
        assert!(spec.synthesize_groups);
        assert_eq!(spec.display_name(), "COBIT");
    }
}
