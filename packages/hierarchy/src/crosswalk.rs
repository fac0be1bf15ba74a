//! SCF crosswalk cells: which framework controls an SCF control maps to.
//!
//! The SCF sheet has one column per framework. A cell lists the mapped
//! reference codes separated by newlines, semicolons or commas. The
//! distinct codes of a column are the flat input the hierarchy engine
//! starts from; the mappings themselves are kept in the store next to the
//! controls they point at.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::registry::FrameworkSpec;
use crate::store::MemoryStore;
use crate::types::FrameworkId;

/// Split a mapping cell into reference codes.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::crosswalk::split_mapping_cell;
///
/// assert_eq!(
///     split_mapping_cell("AC-1\r\nAC-2; AC-2(1),AC-1"),
///     vec!["AC-1", "AC-2", "AC-2(1)"]
/// );
/// assert!(split_mapping_cell("  \n ").is_empty());
/// ```
#[must_use]
pub fn split_mapping_cell(cell: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    cell.split(['\n', ';', ','])
        .map(|part| collapse_whitespace(&part.nfkc().collect::<String>()))
        .filter(|code| !code.is_empty())
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

/// Collapse all whitespace runs (including line breaks) to single spaces.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::crosswalk::normalize_header;
///
/// assert_eq!(normalize_header("NIST 800-53\nrev5 "), "NIST 800-53 rev5");
/// ```
#[must_use]
pub fn normalize_header(header: &str) -> String {
    collapse_whitespace(header)
}

/// Header with any trailing strength qualifier removed, for framework lookup.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::crosswalk::framework_header;
///
/// assert_eq!(framework_header("ISO 27002:2022\n(Partial Mapping)"), "ISO 27002:2022");
/// assert_eq!(framework_header("NIST CSF v2.0"), "NIST CSF v2.0");
/// ```
#[must_use]
pub fn framework_header(header: &str) -> String {
    let normalized = normalize_header(header);
    // ASCII lowercasing keeps byte offsets aligned with `normalized`
    match normalized.to_ascii_lowercase().find(PARTIAL_MARKER) {
        Some(pos) => normalized[..pos].trim_end().to_string(),
        None => normalized,
    }
}

const PARTIAL_MARKER: &str = "(partial";

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How completely an SCF control covers the mapped framework control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStrength {
    #[default]
    Exact,
    Partial,
}

impl MappingStrength {
    /// Strength declared by a column header: `(partial` marks partial mappings.
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        if header.to_lowercase().contains(PARTIAL_MARKER) {
            Self::Partial
        } else {
            Self::Exact
        }
    }
}

/// One SCF control to framework control mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrosswalkEntry {
    pub scf_control: String,
    #[serde(rename = "framework")]
    pub framework_id: FrameworkId,
    pub ref_code: String,
    #[serde(default)]
    pub strength: MappingStrength,
}

/// What seeding a store from a crosswalk wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Frameworks that received controls.
    pub frameworks: Vec<FrameworkId>,
    /// Mappings added to the store.
    pub mappings: usize,
    /// Of those, mappings marked partial.
    pub partial: usize,
}

/// Accumulated crosswalk of one sheet.
#[derive(Debug, Clone, Default)]
pub struct Crosswalk {
    entries: Vec<CrosswalkEntry>,
    seen: HashSet<(String, FrameworkId, String)>,
}

impl Crosswalk {
    /// Create an empty crosswalk.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every reference code of one cell. Returns how many entries were new.
    pub fn add_cell(
        &mut self,
        scf_control: &str,
        spec: &FrameworkSpec,
        header: &str,
        cell: &str,
    ) -> usize {
        let framework_id = spec.id();
        let strength = MappingStrength::from_header(header);
        let scf_control = scf_control.trim();

        let mut added = 0;
        for ref_code in split_mapping_cell(cell) {
            let key = (scf_control.to_string(), framework_id.clone(), ref_code.clone());
            if !self.seen.insert(key) {
                continue;
            }
            self.entries.push(CrosswalkEntry {
                scf_control: scf_control.to_string(),
                framework_id: framework_id.clone(),
                ref_code,
                strength,
            });
            added += 1;
        }
        added
    }

    /// All entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CrosswalkEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct reference codes per framework, in first-seen order.
    #[must_use]
    pub fn framework_refs(&self) -> BTreeMap<FrameworkId, Vec<&str>> {
        let mut refs: BTreeMap<FrameworkId, Vec<&str>> = BTreeMap::new();
        let mut seen: HashSet<(&FrameworkId, &str)> = HashSet::new();
        for entry in &self.entries {
            if seen.insert((&entry.framework_id, entry.ref_code.as_str())) {
                refs.entry(entry.framework_id.clone())
                    .or_default()
                    .push(&entry.ref_code);
            }
        }
        refs
    }

    /// Seed a store with the referenced controls of every framework in
    /// `specs`, then record the mappings that point at them. Mappings the
    /// store already holds are skipped.
    pub fn seed_store<'a, I>(&self, store: &mut MemoryStore, specs: I) -> Result<SeedOutcome>
    where
        I: IntoIterator<Item = &'a FrameworkSpec>,
    {
        let refs = self.framework_refs();
        let mut outcome = SeedOutcome::default();
        for spec in specs {
            let Some(codes) = refs.get(&spec.id()) else {
                continue;
            };
            outcome
                .frameworks
                .push(store.seed_framework(&spec.code, &spec.version, codes)?);
        }

        let seeded: HashSet<&FrameworkId> = outcome.frameworks.iter().collect();
        for entry in self.entries.iter().filter(|e| seeded.contains(&e.framework_id)) {
            if store.add_mapping(entry.clone())? {
                outcome.mappings += 1;
                if entry.strength == MappingStrength::Partial {
                    outcome.partial += 1;
                }
            }
        }

        tracing::debug!(
            frameworks = outcome.frameworks.len(),
            mappings = outcome.mappings,
            "Seeded store from crosswalk"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleFamily;
    use crate::store::NodeStore;
    use pretty_assertions::assert_eq;

    fn hipaa() -> FrameworkSpec {
        FrameworkSpec::new("HIPAA", "2013", RuleFamily::parenthetical_chain())
    }

    #[test]
    fn test_split_mapping_cell_nfkc_and_whitespace() {
        // Full-width parentheses and a non-breaking space
        let cell = "164.306\u{FF08}a\u{FF09}\n164.308(a)(1)\u{00A0}(ii)(A)";
        assert_eq!(
            split_mapping_cell(cell),
            vec!["164.306(a)", "164.308(a)(1) (ii)(A)"]
        );
    }

    #[test]
    fn test_split_mapping_cell_empty() {
        assert!(split_mapping_cell("").is_empty());
        assert!(split_mapping_cell(";;,\n").is_empty());
    }

    #[test]
    fn test_mapping_strength_from_header() {
        assert_eq!(MappingStrength::from_header("NIST CSF v2.0"), MappingStrength::Exact);
        assert_eq!(
            MappingStrength::from_header("ISO 27002:2022 (Partial Mapping)"),
            MappingStrength::Partial
        );
    }

    #[test]
    fn test_crosswalk_dedupes_entries() {
        let mut crosswalk = Crosswalk::new();
        let spec = hipaa();

        assert_eq!(crosswalk.add_cell("GOV-01", &spec, "HIPAA Security", "164.306(a)\n164.316(a)"), 2);
        assert_eq!(crosswalk.add_cell("GOV-01 ", &spec, "HIPAA Security", "164.306(a)"), 0);
        assert_eq!(crosswalk.add_cell("GOV-02", &spec, "HIPAA Security", "164.306(a)"), 1);

        assert_eq!(crosswalk.len(), 3);
        let refs = crosswalk.framework_refs();
        assert_eq!(refs.get(&spec.id()), Some(&vec!["164.306(a)", "164.316(a)"]));
    }

    #[test]
    fn test_seed_store() {
        let mut crosswalk = Crosswalk::new();
        let spec = hipaa();
        crosswalk.add_cell("GOV-01", &spec, "HIPAA Security", "164.306(a), 164.308(a)(1)");

        let other = FrameworkSpec::new("GDPR", "2016", RuleFamily::parenthetical_chain());
        let mut store = MemoryStore::new();
        let seeded = crosswalk.seed_store(&mut store, [&spec, &other]).unwrap();

        assert_eq!(seeded.frameworks, vec![spec.id()]);
        assert_eq!(seeded.mappings, 2);
        let snapshot = store.load_framework(&spec.id()).unwrap();
        let refs: Vec<&str> = snapshot.nodes().iter().map(|n| n.ref_code.as_str()).collect();
        assert_eq!(refs, vec!["164.306(a)", "164.308(a)(1)"]);
        assert_eq!(store.mappings(), crosswalk.entries());

        // Seeding again adds nothing
        let again = crosswalk.seed_store(&mut store, [&spec]).unwrap();
        assert_eq!(again.mappings, 0);
        assert_eq!(store.mappings().len(), 2);
    }

    #[test]
    fn test_seed_store_counts_partial_mappings() {
        let mut crosswalk = Crosswalk::new();
        let spec = FrameworkSpec::new("ISO-27002", "2022", RuleFamily::dotted_decimal(1));
        crosswalk.add_cell("GOV-01", &spec, "ISO 27002:2022", "5.1");
        crosswalk.add_cell("GOV-02", &spec, "ISO 27002:2022 (Partial Mapping)", "5.1, 5.2");

        let mut store = MemoryStore::new();
        let seeded = crosswalk.seed_store(&mut store, [&spec]).unwrap();

        assert_eq!(seeded.mappings, 3);
        assert_eq!(seeded.partial, 2);
        let partial: Vec<(&str, &str)> = store
            .mappings()
            .iter()
            .filter(|m| m.strength == MappingStrength::Partial)
            .map(|m| (m.scf_control.as_str(), m.ref_code.as_str()))
            .collect();
        assert_eq!(partial, vec![("GOV-02", "5.1"), ("GOV-02", "5.2")]);
    }

    #[test]
    fn test_framework_header_strips_partial_qualifier() {
        assert_eq!(framework_header("ISO 27002:2022 (partial)"), "ISO 27002:2022");
        assert_eq!(framework_header("  GDPR\n(PARTIAL MAPPING) "), "GDPR");
        assert_eq!(framework_header("SOC 2"), "SOC 2");
    }
}
