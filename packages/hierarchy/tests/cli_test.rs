//! Tests for the `controlmap-hierarchy` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

use controlmap_hierarchy::crosswalk::MappingStrength;
use controlmap_hierarchy::types::FrameworkId;
use controlmap_hierarchy::yaml::load_store;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn cmd() -> Command {
    Command::cargo_bin("controlmap-hierarchy").unwrap()
}

#[test]
fn test_infer_writes_output() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("out.yaml");

    cmd()
        .arg("infer")
        .arg(fixture("store.yaml"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("HIPAA:2013"))
        .stdout(predicate::str::contains("Saved to:"));

    let store = load_store(&output).unwrap();
    let hipaa = FrameworkId::new("HIPAA", "2013");
    let group = store.find(&hipaa, "164.306(b)").unwrap();
    assert!(group.synthesized);
    assert!(group.is_group);

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("---\n"));
    assert!(content.contains("Group: 164.306(b)"));
}

#[test]
fn test_infer_in_place_is_stable() {
    let temp_dir = tempdir().unwrap();
    let store = temp_dir.path().join("store.yaml");
    fs::copy(fixture("store.yaml"), &store).unwrap();

    cmd().arg("infer").arg(&store).assert().success();
    let first = fs::read_to_string(&store).unwrap();

    cmd()
        .arg("infer")
        .arg(&store)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"changed\": 0"))
        .stdout(predicate::str::contains("\"failures\": []"));
    assert_eq!(fs::read_to_string(&store).unwrap(), first);
}

#[test]
fn test_infer_reports_unknown_framework() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("out.yaml");

    cmd()
        .arg("infer")
        .arg(fixture("unknown_framework.yaml"))
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("ACME-POLICY:1"))
        .stderr(predicate::str::contains("Error: 1 framework(s) failed"));

    // The registered framework is still processed and saved
    let store = load_store(&output).unwrap();
    assert!(store
        .find(&FrameworkId::new("NIST-CSF", "2.0"), "GV.OC")
        .is_some());
}

#[test]
fn test_infer_with_custom_registry() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("out.yaml");

    // Only ACME-POLICY is registered, so NIST-CSF fails instead
    cmd()
        .arg("infer")
        .arg(fixture("unknown_framework.yaml"))
        .arg("--registry")
        .arg(fixture("registry.yaml"))
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stdout(predicate::str::contains("NIST-CSF:2.0"));

    let store = load_store(&output).unwrap();
    let acme = FrameworkId::new("ACME-POLICY", "1");
    let p1 = store.find(&acme, "P-1").unwrap();
    let domain = store.find(&acme, "P").unwrap();
    assert_eq!(p1.parent_id, Some(domain.id));
}

#[test]
fn test_infer_missing_store() {
    cmd()
        .arg("infer")
        .arg("does-not-exist.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: IO error"));
}

#[test]
fn test_parent_chain() {
    cmd()
        .args(["parent", "HIPAA", "2013", "164.306(b)(2)(i)"])
        .assert()
        .success()
        .stdout(predicate::str::contains("164.306(b)(2)  subparagraph"))
        .stdout(predicate::str::contains("164.306(b)  paragraph"))
        .stdout(predicate::str::contains("164.306  section"));
}

#[test]
fn test_parent_pattern_mismatch() {
    cmd()
        .args(["parent", "COBIT", "2019", "Appendix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matches no domain_prefix pattern"));
}

#[test]
fn test_parent_unknown_framework() {
    cmd()
        .args(["parent", "NOPE", "1", "A-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown framework: NOPE:1"));
}

#[test]
fn test_frameworks_lists_defaults() {
    cmd()
        .arg("frameworks")
        .assert()
        .success()
        .stdout(predicate::str::contains("NIST-800-53:rev5"))
        .stdout(predicate::str::contains("parenthetical_chain"))
        .stdout(predicate::str::contains("33 frameworks"));
}

#[test]
fn test_seed_then_infer() {
    let temp_dir = tempdir().unwrap();
    let store = temp_dir.path().join("seeded.yaml");

    cmd()
        .arg("seed")
        .arg(fixture("mappings.yaml"))
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 7 mappings (1 partial) across 3 frameworks"));

    cmd().arg("infer").arg(&store).assert().success();

    let loaded = load_store(&store).unwrap();
    let nist = FrameworkId::new("NIST-800-53", "rev5");
    let pm1 = loaded.find(&nist, "PM-1").unwrap();
    assert_eq!(loaded.find(&nist, "PM-1(1)").unwrap().parent_id, Some(pm1.id));

    let hipaa = FrameworkId::new("HIPAA", "2013");
    assert!(loaded.find(&hipaa, "164.316(b)(1)").is_some());

    // The partial column resolves to its framework and keeps its strength
    let iso = FrameworkId::new("ISO-27002", "2022");
    assert!(loaded.find(&iso, "5.1").is_some());
    let partial: Vec<_> = loaded
        .mappings()
        .iter()
        .filter(|m| m.strength == MappingStrength::Partial)
        .collect();
    assert_eq!(partial.len(), 1);
    assert_eq!(partial[0].scf_control, "GOV-02");
    assert_eq!(partial[0].framework_id, iso);
    assert_eq!(partial[0].ref_code, "5.1");
    assert_eq!(loaded.mappings().len(), 7);
}
