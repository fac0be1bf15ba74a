//! Configuration constants and validation functions.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{HierarchyError, Result};

/// Maximum number of parent steps when resolving an ancestor chain.
///
/// The deepest syntax seen in practice (HIPAA) nests six levels.
pub const MAX_ANCESTOR_DEPTH: usize = 10;

/// Maximum number of warnings kept verbatim in a framework report.
pub const MAX_WARNING_SAMPLES: usize = 20;

/// Description prefix for synthesized group nodes.
pub const GROUP_DESCRIPTION_PREFIX: &str = "Group: ";

/// Framework code pattern: starts alphanumeric, then letters, digits, `&`, `.`, `_`, `-`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FRAMEWORK_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9&._-]*$").expect("valid regex"));

/// Version pattern: non-empty, no whitespace, no colon (colon joins code and version).
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s:]+$").expect("valid regex"));

/// Validate a framework code.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::config::validate_framework_code;
///
/// assert!(validate_framework_code("NIST-800-53").is_ok());
/// assert!(validate_framework_code("CSA-CCM").is_ok());
/// assert!(validate_framework_code("").is_err());
/// assert!(validate_framework_code("ISO 27001").is_err());
/// ```
pub fn validate_framework_code(code: &str) -> Result<()> {
    if FRAMEWORK_CODE_PATTERN.is_match(code) {
        Ok(())
    } else {
        Err(HierarchyError::InvalidRegistry(format!(
            "invalid framework code '{code}'"
        )))
    }
}

/// Validate a framework version.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::config::validate_version;
///
/// assert!(validate_version("rev5").is_ok());
/// assert!(validate_version("2017-2022").is_ok());
/// assert!(validate_version("v 1").is_err());
/// assert!(validate_version("a:b").is_err());
/// ```
pub fn validate_version(version: &str) -> Result<()> {
    if VERSION_PATTERN.is_match(version) {
        Ok(())
    } else {
        Err(HierarchyError::InvalidRegistry(format!(
            "invalid framework version '{version}'"
        )))
    }
}

/// Placeholder description for a synthesized group node.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::config::group_description;
///
/// assert_eq!(group_description("164.306"), "Group: 164.306");
/// ```
#[must_use]
pub fn group_description(ref_code: &str) -> String {
    format!("{GROUP_DESCRIPTION_PREFIX}{ref_code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_framework_code() {
        assert!(validate_framework_code("HIPAA").is_ok());
        assert!(validate_framework_code("CIS-CSC-IG1").is_ok());
        assert!(validate_framework_code("SOC2-TSC").is_ok());
        assert!(validate_framework_code("-LEADING").is_err());
        assert!(validate_framework_code("A:B").is_err());
    }

    #[test]
    fn test_validate_version() {
        assert!(validate_version("R5-Moderate").is_ok());
        assert!(validate_version("v4.0.1").is_ok());
        assert!(validate_version("").is_err());
    }

    #[test]
    fn test_group_description_prefix() {
        assert!(group_description("GV").starts_with(GROUP_DESCRIPTION_PREFIX));
    }
}
