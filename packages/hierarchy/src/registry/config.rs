//! Built-in framework table.

use super::core::FrameworkRegistry;
use super::spec::FrameworkSpec;
use crate::rules::RuleFamily;

/// Create a registry with every framework the SCF mapping import knows.
///
/// Frameworks sharing a code syntax share a rule family:
///
/// ```text
/// NIST 800-53, FedRAMP, CMMC       enhancement_suffix
/// HIPAA, GDPR, NYDFS, CCPA         parenthetical_chain
/// NIST 800-171, CIS, PCI, ISO      dotted_decimal (min_segments varies)
/// COBIT                            domain_prefix
/// NIST CSF, NIST Privacy Framework function_category
/// SOC 2                            point_of_focus
/// CSA CCM, SCF                     domain_hyphen
/// ```
#[must_use]
pub fn create_default_registry() -> FrameworkRegistry {
    let mut registry = FrameworkRegistry::new();

    // Enhancement suffix: AC-16(1)
    for (version, name, header) in [
        ("rev5", "NIST SP 800-53 Revision 5", "NIST 800-53 rev5"),
        ("rev4", "NIST SP 800-53 Revision 4", "NIST 800-53 rev4"),
    ] {
        registry.register(
            FrameworkSpec::new("NIST-800-53", version, RuleFamily::EnhancementSuffix)
                .with_name(name)
                .with_mapping_header(header),
        );
    }
    for (version, name, header) in [
        ("R5-High", "FedRAMP Rev 5 High Baseline", "FedRAMP Rev 5 High"),
        ("R5-Moderate", "FedRAMP Rev 5 Moderate Baseline", "FedRAMP Rev 5 Moderate"),
        ("R5-Low", "FedRAMP Rev 5 Low Baseline", "FedRAMP Rev 5 Low"),
    ] {
        registry.register(
            FrameworkSpec::new("FedRAMP", version, RuleFamily::EnhancementSuffix)
                .with_name(name)
                .with_mapping_header(header),
        );
    }
    registry.register(
        FrameworkSpec::new("CMMC", "2.0", RuleFamily::EnhancementSuffix)
            .with_name("Cybersecurity Maturity Model Certification")
            .with_mapping_header("CMMC 2.0"),
    );

    // Dotted decimal
    registry.register(
        FrameworkSpec::new("NIST-800-171", "rev3", RuleFamily::dotted_decimal(3))
            .with_name("NIST SP 800-171 Revision 3")
            .with_mapping_header("NIST 800-171 rev3"),
    );
    registry.register(
        FrameworkSpec::new("NIST-800-171", "rev2", RuleFamily::dotted_decimal(2))
            .with_name("NIST SP 800-171 Revision 2")
            .with_mapping_header("NIST 800-171 rev2"),
    );
    registry.register(
        FrameworkSpec::new("CIS-CSC", "v8.1", RuleFamily::dotted_decimal(1))
            .with_name("CIS Critical Security Controls")
            .with_mapping_header("CIS v8.1"),
    );
    for group in ["IG1", "IG2", "IG3"] {
        registry.register(
            FrameworkSpec::new(format!("CIS-CSC-{group}"), "v8.1", RuleFamily::dotted_decimal(1))
                .with_name(format!("CIS Controls Implementation Group {}", &group[2..]))
                .with_mapping_header(format!("CIS v8.1 {group}")),
        );
    }
    for (version, header) in [("v4.0.1", "PCI DSS v4.0.1"), ("v3.2", "PCI DSS v3.2")] {
        registry.register(
            FrameworkSpec::new("PCI-DSS", version, RuleFamily::dotted_decimal(2))
                .with_name(format!("PCI Data Security Standard {version}"))
                .with_mapping_header(header),
        );
    }
    for (code, version, name, header) in [
        ("ISO-27001", "2022", "ISO/IEC 27001:2022", "ISO 27001:2022"),
        ("ISO-27002", "2022", "ISO/IEC 27002:2022", "ISO 27002:2022"),
        ("ISO-27001", "2013", "ISO/IEC 27001:2013", "ISO 27001:2013"),
        ("ISO-27002", "2013", "ISO/IEC 27002:2013", "ISO 27002:2013"),
        ("ISO-27017", "2015", "ISO/IEC 27017:2015 Cloud Security", "ISO 27017:2015"),
        ("ISO-27018", "2014", "ISO/IEC 27018:2014 Cloud Privacy", "ISO 27018:2014"),
        ("ISO-27701", "2019", "ISO/IEC 27701:2019 Privacy", "ISO 27701:2019"),
        ("ISO-42001", "2023", "ISO/IEC 42001:2023 AI Management", "ISO 42001:2023"),
    ] {
        registry.register(
            FrameworkSpec::new(code, version, RuleFamily::dotted_decimal(1))
                .with_name(name)
                .with_mapping_header(header),
        );
    }

    // Parenthetical chain: 164.306(d)(3)(ii)(B)
    for (code, version, name, header) in [
        ("HIPAA", "2013", "HIPAA Security Rule", "HIPAA Security"),
        ("GDPR", "2016", "EU General Data Protection Regulation", "GDPR"),
        ("NYDFS", "2023", "NY DFS 23 NYCRR 500", "NY DFS"),
        ("CCPA", "2022", "California Consumer Privacy Act", "CCPA"),
    ] {
        registry.register(
            FrameworkSpec::new(code, version, RuleFamily::parenthetical_chain())
                .with_name(name)
                .with_mapping_header(header),
        );
    }

    registry.register(
        FrameworkSpec::new("SOC2-TSC", "2017-2022", RuleFamily::PointOfFocus)
            .with_name("SOC 2 Trust Service Criteria")
            .with_mapping_header("SOC 2"),
    );

    // Function / category / subcategory
    registry.register(
        FrameworkSpec::new("NIST-CSF", "v1.1", RuleFamily::FunctionCategory)
            .with_name("NIST Cybersecurity Framework v1.1")
            .with_mapping_header("NIST CSF v1.1"),
    );
    registry.register(
        FrameworkSpec::new("NIST-CSF", "2.0", RuleFamily::FunctionCategory)
            .with_name("NIST Cybersecurity Framework 2.0")
            .with_mapping_header("NIST CSF v2.0"),
    );
    registry.register(
        FrameworkSpec::new("NIST-PF", "v1.0", RuleFamily::FunctionCategory)
            .with_name("NIST Privacy Framework")
            .with_mapping_header("NIST Privacy Framework"),
    );

    registry.register(
        FrameworkSpec::new("COBIT", "2019", RuleFamily::DomainPrefix)
            .with_name("COBIT 2019 Framework")
            .with_mapping_header("COBIT 2019"),
    );

    // Domain hyphen: AAT-01.1
    registry.register(
        FrameworkSpec::new("CSA-CCM", "v4", RuleFamily::DomainHyphen { domain_groups: true })
            .with_name("Cloud Security Alliance Cloud Controls Matrix")
            .with_mapping_header("CSA CCM v4"),
    );
    // SCF domains live in their own catalog, so SCF controls stop at AAT-01.
    registry.register(
        FrameworkSpec::new("SCF", "2025.3.1", RuleFamily::DomainHyphen { domain_groups: false })
            .with_name("Secure Controls Framework"),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_families() {
        let registry = create_default_registry();

        let family = |code: &str, version: &str| {
            registry
                .find(code, version)
                .map(|spec| spec.family.name())
                .unwrap_or("missing")
        };

        assert_eq!(family("NIST-800-53", "rev5"), "enhancement_suffix");
        assert_eq!(family("FedRAMP", "R5-Low"), "enhancement_suffix");
        assert_eq!(family("HIPAA", "2013"), "parenthetical_chain");
        assert_eq!(family("ISO-27001", "2022"), "dotted_decimal");
        assert_eq!(family("COBIT", "2019"), "domain_prefix");
        assert_eq!(family("NIST-CSF", "2.0"), "function_category");
        assert_eq!(family("SOC2-TSC", "2017-2022"), "point_of_focus");
        assert_eq!(family("CSA-CCM", "v4"), "domain_hyphen");
        assert_eq!(family("SCF", "2025.3.1"), "domain_hyphen");
    }

    #[test]
    fn test_default_registry_min_segments() {
        let registry = create_default_registry();
        assert_eq!(
            registry.find("NIST-800-171", "rev3").map(|s| &s.family),
            Some(&RuleFamily::dotted_decimal(3))
        );
        assert_eq!(
            registry.find("NIST-800-171", "rev2").map(|s| &s.family),
            Some(&RuleFamily::dotted_decimal(2))
        );
        assert_eq!(
            registry.find("CIS-CSC-IG2", "v8.1").map(|s| &s.family),
            Some(&RuleFamily::dotted_decimal(1))
        );
    }

    #[test]
    fn test_default_registry_is_valid() {
        let registry = create_default_registry();
        assert_eq!(registry.len(), 33);
        for spec in registry.iter() {
            assert!(spec.validate().is_ok(), "invalid spec {}", spec.id());
        }
    }

    #[test]
    fn test_default_registry_headers() {
        let registry = create_default_registry();
        let code = |header: &str| registry.find_by_header(header).map(|s| s.id().to_string());

        assert_eq!(code("ISO 27017:2015").as_deref(), Some("ISO-27017:2015"));
        assert_eq!(code("HIPAA Security").as_deref(), Some("HIPAA:2013"));
        assert_eq!(code("CIS v8.1 IG3").as_deref(), Some("CIS-CSC-IG3:v8.1"));
        assert_eq!(code("Unknown Framework"), None);
    }
}
