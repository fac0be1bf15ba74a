//! YAML store file: load a [`MemoryStore`] from disk and write it back.
//!
//! ```yaml
//! ---
//! frameworks:
//!   - code: NIST-CSF
//!     version: "2.0"
//!     controls:
//!       - ref_code: GV
//!         id: 1
//!         hierarchy_level: function
//!         is_group: true
//!         display_order: 0
//!       - ref_code: GV.OC
//!         parent: GV
//! ```
//!
//! Parents are written as reference codes of the same framework. Ids are
//! optional on input; missing ones are allocated after the highest given id.
//!
//! SCF crosswalk mappings follow the frameworks, each naming its target
//! control by framework id and reference code:
//!
//! ```yaml
//! mappings:
//!   - scf_control: GOV-01
//!     framework: NIST-CSF:2.0
//!     ref_code: GV.OC
//!     strength: partial
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{validate_framework_code, validate_version};
use crate::crosswalk::CrosswalkEntry;
use crate::error::{HierarchyError, Result};
use crate::natural;
use crate::store::MemoryStore;
use crate::types::{FrameworkId, Node, NodeId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    frameworks: Vec<FrameworkRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    mappings: Vec<CrosswalkEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FrameworkRecord {
    code: String,
    version: String,
    #[serde(default)]
    controls: Vec<ControlRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ControlRecord {
    ref_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hierarchy_level: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    is_group: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_order: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    synthesized: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Parse a store from YAML text.
pub fn parse_store(yaml: &str) -> Result<MemoryStore> {
    let file: StoreFile = serde_yaml_ng::from_str(yaml)?;

    let highest = file
        .frameworks
        .iter()
        .flat_map(|f| f.controls.iter())
        .filter_map(|c| c.id)
        .max();
    let mut next_id = highest.map_or(0, |id| id + 1);

    let mut store = MemoryStore::new();
    for framework in &file.frameworks {
        validate_framework_code(&framework.code)
            .and_then(|()| validate_version(&framework.version))
            .map_err(|_| {
                HierarchyError::InvalidStore(format!(
                    "invalid framework code '{}' or version '{}'",
                    framework.code, framework.version
                ))
            })?;
        if store.framework_code(&FrameworkId::new(&framework.code, &framework.version)).is_some() {
            return Err(HierarchyError::InvalidStore(format!(
                "framework {}:{} listed twice",
                framework.code, framework.version
            )));
        }
        let framework_id = store.add_framework(&framework.code, &framework.version);

        let assigned: Vec<NodeId> = framework
            .controls
            .iter()
            .map(|control| {
                NodeId(control.id.unwrap_or_else(|| {
                    let id = next_id;
                    next_id += 1;
                    id
                }))
            })
            .collect();
        let ids: HashMap<&str, NodeId> = framework
            .controls
            .iter()
            .map(|c| c.ref_code.as_str())
            .zip(assigned.iter().copied())
            .collect();

        for (control, id) in framework.controls.iter().zip(assigned) {
            let parent_id = match &control.parent {
                Some(parent) => Some(*ids.get(parent.as_str()).ok_or_else(|| {
                    HierarchyError::InvalidStore(format!(
                        "{framework_id}: parent '{parent}' of '{}' is not a control of the framework",
                        control.ref_code
                    ))
                })?),
                None => None,
            };

            let mut node = Node::new(id, framework_id.clone(), control.ref_code.clone());
            node.parent_id = parent_id;
            node.description = control.description.clone();
            node.hierarchy_level = control.hierarchy_level.clone();
            node.is_group = control.is_group;
            node.display_order = control.display_order;
            node.synthesized = control.synthesized;
            store.restore_node(node)?;
        }
    }

    for mapping in file.mappings {
        let scf_control = mapping.scf_control.clone();
        if !store.add_mapping(mapping)? {
            tracing::warn!(scf_control = %scf_control, "Duplicate mapping in store file, skipping");
        }
    }

    Ok(store)
}

/// Load a store file.
pub fn load_store(path: &Path) -> Result<MemoryStore> {
    tracing::debug!(path = %path.display(), "Loading store");
    let yaml = fs::read_to_string(path)?;
    parse_store(&yaml)
}

/// Render a store as YAML.
///
/// Controls are written in display order; nodes without one follow in
/// natural order of their reference codes.
pub fn generate_store_yaml(store: &MemoryStore) -> Result<String> {
    let mut file = StoreFile::default();

    for entry in store.entries() {
        let refs: HashMap<NodeId, &str> = entry
            .nodes
            .iter()
            .map(|n| (n.id, n.ref_code.as_str()))
            .collect();

        let mut nodes: Vec<&Node> = entry.nodes.iter().collect();
        nodes.sort_by(|a, b| match (a.display_order, b.display_order) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => natural::compare(&a.ref_code, &b.ref_code),
        });

        let controls = nodes
            .into_iter()
            .map(|node| ControlRecord {
                ref_code: node.ref_code.clone(),
                id: Some(node.id.0),
                description: node.description.clone(),
                parent: node
                    .parent_id
                    .and_then(|p| refs.get(&p))
                    .map(|r| (*r).to_string()),
                hierarchy_level: node.hierarchy_level.clone(),
                is_group: node.is_group,
                display_order: node.display_order,
                synthesized: node.synthesized,
            })
            .collect();

        file.frameworks.push(FrameworkRecord {
            code: entry.code.clone(),
            version: entry.version.clone(),
            controls,
        });
    }

    file.mappings = store.mappings().to_vec();

    let yaml = serde_yaml_ng::to_string(&file)?;
    Ok(format!("---\n{yaml}"))
}

/// Save a store file.
///
/// Uses atomic write pattern: writes to temp file, syncs to disk, then renames.
pub fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    let content = generate_store_yaml(store)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| HierarchyError::InvalidStore(format!("not a file path: {}", path.display())))?;
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    tracing::debug!(path = %path.display(), "Saved store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crosswalk::MappingStrength;
    use crate::store::NodeStore;
    use tempfile::tempdir;

    const STORE: &str = r#"
frameworks:
  - code: NIST-CSF
    version: "2.0"
    controls:
      - ref_code: GV.RM-01
        id: 7
        description: Risk management objectives are established
        parent: GV.RM
      - ref_code: GV.RM
      - ref_code: GV
"#;

    #[test]
    fn test_parse_store() {
        let store = parse_store(STORE).unwrap();
        let fw = FrameworkId::new("NIST-CSF", "2.0");

        let leaf = store.find(&fw, "GV.RM-01").unwrap();
        let rm = store.find(&fw, "GV.RM").unwrap();
        assert_eq!(leaf.id, NodeId(7));
        assert_eq!(rm.id, NodeId(8));
        assert_eq!(store.find(&fw, "GV").unwrap().id, NodeId(9));
        assert_eq!(leaf.parent_id, Some(rm.id));
        assert_eq!(store.framework_ids(), vec![fw]);
    }

    #[test]
    fn test_parse_store_rejects_unknown_parent() {
        let yaml = "frameworks:\n  - code: COBIT\n    version: '2019'\n    controls:\n      - ref_code: APO01.01\n        parent: APO01\n";
        assert!(matches!(parse_store(yaml), Err(HierarchyError::InvalidStore(_))));
    }

    #[test]
    fn test_parse_store_rejects_duplicates() {
        let yaml = "frameworks:\n  - code: COBIT\n    version: '2019'\n    controls:\n      - ref_code: APO01\n      - ref_code: APO01\n";
        assert!(matches!(
            parse_store(yaml),
            Err(HierarchyError::DuplicateRefCode { .. })
        ));
    }

    #[test]
    fn test_parse_store_rejects_ambiguous_framework_ids() {
        // Both records would share the id A:B:C
        let yaml = "frameworks:\n  - code: 'A:B'\n    version: C\n  - code: A\n    version: 'B:C'\n";
        let err = parse_store(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid framework code 'A:B'"));

        let yaml = "frameworks:\n  - code: A\n    version: 'B:C'\n";
        assert!(matches!(parse_store(yaml), Err(HierarchyError::InvalidStore(_))));
    }

    #[test]
    fn test_parse_store_rejects_repeated_framework() {
        let yaml = "frameworks:\n  - code: COBIT\n    version: '2019'\n  - code: COBIT\n    version: '2019'\n";
        let err = parse_store(yaml).unwrap_err();
        assert!(err.to_string().contains("COBIT:2019 listed twice"));
    }

    #[test]
    fn test_mappings_survive_save_and_load() {
        let yaml = format!(
            "{STORE}mappings:\n  - scf_control: GOV-01\n    framework: NIST-CSF:2.0\n    ref_code: GV.RM\n    strength: partial\n  - scf_control: GOV-02\n    framework: NIST-CSF:2.0\n    ref_code: GV\n"
        );
        let store = parse_store(&yaml).unwrap();
        assert_eq!(store.mappings().len(), 2);
        assert_eq!(store.mappings()[1].strength, MappingStrength::Exact);

        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("store.yaml");
        save_store(&store, &path).unwrap();
        let loaded = load_store(&path).unwrap();

        assert_eq!(loaded.mappings(), store.mappings());
        assert_eq!(loaded.mappings()[0].strength, MappingStrength::Partial);
        assert!(fs::read_to_string(&path).unwrap().contains("strength: partial"));
    }

    #[test]
    fn test_parse_store_rejects_dangling_mapping() {
        let yaml = format!(
            "{STORE}mappings:\n  - scf_control: GOV-01\n    framework: NIST-CSF:2.0\n    ref_code: ID.AM\n"
        );
        assert!(matches!(parse_store(&yaml), Err(HierarchyError::InvalidStore(_))));
    }

    #[test]
    fn test_generate_store_yaml() {
        let store = parse_store(STORE).unwrap();
        let yaml = generate_store_yaml(&store).unwrap();

        assert!(yaml.starts_with("---\n"));
        assert!(yaml.contains("code: NIST-CSF"));
        assert!(yaml.contains("parent: GV.RM"));
        assert!(!yaml.contains("is_group"));
        // Unordered nodes follow natural order
        let gv = yaml.find("ref_code: GV\n").unwrap();
        let rm = yaml.find("ref_code: GV.RM\n").unwrap();
        assert!(gv < rm);
    }

    #[test]
    fn test_save_and_load_store() {
        let store = parse_store(STORE).unwrap();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("store.yaml");

        save_store(&store, &path).unwrap();
        let loaded = load_store(&path).unwrap();

        let fw = FrameworkId::new("NIST-CSF", "2.0");
        let mut expected = store.nodes(&fw).unwrap().to_vec();
        expected.sort_by(|a, b| natural::compare(&a.ref_code, &b.ref_code));
        assert_eq!(loaded.nodes(&fw).unwrap(), expected.as_slice());
    }
}
