//! Drive the engine over a store: load, plan, commit.

use rayon::prelude::*;
use serde::Serialize;

use crate::engine::{HierarchyEngine, HierarchyPlan};
use crate::error::{HierarchyError, Result};
use crate::registry::{FrameworkRegistry, FrameworkSpec};
use crate::report::FrameworkReport;
use crate::store::NodeStore;
use crate::types::{FrameworkId, FrameworkSnapshot};

/// A framework whose run was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkFailure {
    pub framework_id: FrameworkId,
    pub error: String,
}

/// Outcome of a multi-framework run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub reports: Vec<FrameworkReport>,
    pub failures: Vec<FrameworkFailure>,
}

impl ImportSummary {
    /// Whether every framework succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, framework_id: FrameworkId, error: &HierarchyError) {
        tracing::warn!(framework = %framework_id, error = %error, "Framework failed");
        self.failures.push(FrameworkFailure {
            framework_id,
            error: error.to_string(),
        });
    }
}

/// Run the full lifecycle for one framework and return its report.
pub fn process_framework<S: NodeStore + ?Sized>(
    store: &mut S,
    spec: &FrameworkSpec,
) -> Result<FrameworkReport> {
    let snapshot = store.load_framework(&spec.id())?;
    let plan = HierarchyEngine::new(spec).plan(&snapshot)?;
    commit_plan(store, plan)
}

fn commit_plan<S: NodeStore + ?Sized>(store: &mut S, plan: HierarchyPlan) -> Result<FrameworkReport> {
    if !plan.is_empty() {
        store.commit(&plan)?;
    } else {
        tracing::debug!(framework = %plan.framework_id, "Hierarchy already up to date");
    }
    Ok(plan.report)
}

/// Process every framework in the store.
///
/// Plans are computed in parallel, one per framework, and committed one
/// after another. A failing framework is recorded in the summary and never
/// affects the others. Frameworks without a registry entry fail with
/// [`HierarchyError::UnknownFramework`].
pub fn process_all<S: NodeStore + ?Sized>(store: &mut S, registry: &FrameworkRegistry) -> ImportSummary {
    let mut summary = ImportSummary::default();

    let mut work: Vec<(&FrameworkSpec, FrameworkSnapshot)> = Vec::new();
    for framework_id in store.framework_ids() {
        let Some(spec) = registry.get(&framework_id) else {
            summary.fail(
                framework_id.clone(),
                &HierarchyError::UnknownFramework(framework_id),
            );
            continue;
        };
        match store.load_framework(&framework_id) {
            Ok(snapshot) => work.push((spec, snapshot)),
            Err(e) => summary.fail(framework_id, &e),
        }
    }

    let plans: Vec<(FrameworkId, Result<HierarchyPlan>)> = work
        .par_iter()
        .map(|(spec, snapshot)| (spec.id(), HierarchyEngine::new(spec).plan(snapshot)))
        .collect();

    for (framework_id, plan) in plans {
        match plan.and_then(|plan| commit_plan(store, plan)) {
            Ok(report) => summary.reports.push(report),
            Err(e) => summary.fail(framework_id, &e),
        }
    }

    tracing::info!(
        succeeded = summary.reports.len(),
        failed = summary.failures.len(),
        "Processed frameworks"
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleFamily;
    use crate::store::MemoryStore;
    use crate::types::{Node, NodeId};

    fn registry() -> FrameworkRegistry {
        let mut registry = FrameworkRegistry::new();
        registry.register(FrameworkSpec::new("NIST-800-53", "rev5", RuleFamily::EnhancementSuffix));
        registry.register(FrameworkSpec::new("HIPAA", "2013", RuleFamily::parenthetical_chain()));
        registry
    }

    #[test]
    fn test_process_framework() {
        let mut store = MemoryStore::new();
        store
            .seed_framework("HIPAA", "2013", ["164.306(b)(2)(i)"])
            .unwrap();
        let registry = registry();
        let spec = registry.find("HIPAA", "2013").unwrap();

        let report = process_framework(&mut store, spec).unwrap();
        assert_eq!(report.created, 3);
        assert_eq!(report.roots, 1);

        let again = process_framework(&mut store, spec).unwrap();
        assert!(again.is_unchanged());
    }

    #[test]
    fn test_process_all_isolates_failures() {
        let mut store = MemoryStore::new();
        store.seed_framework("NIST-800-53", "rev5", ["AC-1", "AC-2", "AC-2(1)"]).unwrap();
        store.seed_framework("COBIT", "2019", ["APO01.01"]).unwrap();

        let hipaa = store.add_framework("HIPAA", "2013");
        store.restore_node(Node::new(NodeId(100), hipaa, "164.306(a)")).unwrap();

        let summary = process_all(&mut store, &registry());

        assert!(!summary.is_success());
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].framework_id.as_str(), "COBIT:2019");
        assert!(summary.failures[0].error.contains("Unknown framework"));

        let ids: Vec<&str> = summary.reports.iter().map(|r| r.framework_id.as_str()).collect();
        assert_eq!(ids, vec!["HIPAA:2013", "NIST-800-53:rev5"]);

        let nist = FrameworkId::new("NIST-800-53", "rev5");
        let ac2 = store.find(&nist, "AC-2").unwrap().id;
        assert_eq!(store.find(&nist, "AC-2(1)").unwrap().parent_id, Some(ac2));
    }
}
