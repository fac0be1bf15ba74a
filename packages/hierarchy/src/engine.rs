//! Hierarchy assignment engine that plans one framework at a time.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::ancestry::ancestor_chain;
use crate::error::{HierarchyError, Result};
use crate::order::{sequence, OrderEntry};
use crate::registry::FrameworkSpec;
use crate::report::{FrameworkReport, InferenceWarning};
use crate::rules::{RefShape, RuleFamily};
use crate::synth::synthesize_groups;
use crate::types::{Assignment, FrameworkId, FrameworkSnapshot, NewNode, Node, NodeRef};

/// Write set for one framework.
///
/// `creations` and `changes` are applied by a store in a single commit;
/// `targets` is the complete computed state, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyPlan {
    pub framework_id: FrameworkId,
    pub creations: Vec<NewNode>,
    pub targets: Vec<Assignment>,
    pub changes: Vec<Assignment>,
    pub report: FrameworkReport,
}

impl HierarchyPlan {
    /// Whether committing this plan would write nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creations.is_empty() && self.changes.is_empty()
    }
}

/// A node of the extended snapshot: loaded or about to be synthesized.
struct Slot<'a> {
    node: NodeRef,
    ref_code: &'a str,
    loaded: Option<&'a Node>,
    /// Chain resolution failed, so the node is kept as a root.
    pinned_root: bool,
}

/// Engine that infers parents, groups, levels and display order for a
/// framework, using the rule family of its spec.
pub struct HierarchyEngine<'s> {
    spec: &'s FrameworkSpec,
}

impl<'s> HierarchyEngine<'s> {
    /// Create an engine for one framework.
    #[must_use]
    pub fn new(spec: &'s FrameworkSpec) -> Self {
        Self { spec }
    }

    fn family(&self) -> &RuleFamily {
        &self.spec.family
    }

    /// Compute the plan for a snapshot.
    ///
    /// Planning is a pure function of the snapshot and the framework spec: running
    /// it again on the committed result yields an empty plan.
    ///
    /// # Errors
    ///
    /// Fails on a node of another framework, a duplicate reference code,
    /// or a parent cycle. Everything else is recorded in the report.
    pub fn plan(&self, snapshot: &FrameworkSnapshot) -> Result<HierarchyPlan> {
        let framework_id = self.spec.id();
        self.check_snapshot(&framework_id, snapshot)?;

        let mut report = FrameworkReport::new(framework_id.clone(), self.family().name());
        report.loaded = snapshot.len();

        // Ancestor chains of the loaded nodes
        let mut chains: Vec<Vec<String>> = Vec::with_capacity(snapshot.len());
        let mut pinned: HashSet<&str> = HashSet::new();
        for node in snapshot.nodes() {
            chains.push(self.chain_of(node, &mut report, &mut pinned));
        }

        // Missing ancestors
        let creations = if self.spec.synthesize_groups {
            let existing: HashSet<&str> = snapshot.nodes().iter().map(|n| n.ref_code.as_str()).collect();
            synthesize_groups(&framework_id, self.family(), &existing, &chains)
        } else {
            Vec::new()
        };
        report.created = creations.len();
        tracing::debug!(
            framework = %framework_id,
            loaded = snapshot.len(),
            synthesized = creations.len(),
            "Resolved ancestor chains"
        );

        // Extended snapshot
        let slots: Vec<Slot<'_>> = snapshot
            .nodes()
            .iter()
            .map(|node| Slot {
                node: NodeRef::Existing(node.id),
                ref_code: &node.ref_code,
                loaded: Some(node),
                pinned_root: pinned.contains(node.ref_code.as_str()),
            })
            .chain(creations.iter().enumerate().map(|(index, new)| Slot {
                node: NodeRef::New(index),
                ref_code: &new.ref_code,
                loaded: None,
                pinned_root: false,
            }))
            .collect();

        let parents = self.assign_parents(&slots, &mut report);

        let group_refs: HashSet<NodeRef> = parents.iter().flatten().copied().collect();

        let entries: Vec<OrderEntry<'_, NodeRef>> = slots
            .iter()
            .zip(&parents)
            .map(|(slot, parent)| OrderEntry {
                key: slot.node,
                ref_code: slot.ref_code,
                parent: *parent,
            })
            .collect();
        let ordered = sequence(&framework_id, &entries)?;

        let mut position: HashMap<NodeRef, u32> = HashMap::with_capacity(ordered.len());
        for (index, key) in ordered.iter().enumerate() {
            let order = u32::try_from(index).map_err(|_| {
                HierarchyError::InvalidStore(format!("{framework_id} holds too many nodes to order"))
            })?;
            position.insert(*key, order);
        }

        let mut targets: Vec<Assignment> = slots
            .iter()
            .zip(&parents)
            .map(|(slot, parent)| {
                let is_group = group_refs.contains(&slot.node);
                Assignment {
                    node: slot.node,
                    ref_code: slot.ref_code.to_string(),
                    parent: *parent,
                    hierarchy_level: self.family().hierarchy_level(slot.ref_code, is_group).to_string(),
                    is_group,
                    display_order: position.get(&slot.node).copied().unwrap_or_default(),
                }
            })
            .collect();

        // Only the delta is written
        let changes: Vec<Assignment> = slots
            .iter()
            .zip(&targets)
            .filter(|(slot, target)| slot.loaded.is_none_or(|node| differs(node, target)))
            .map(|(_, target)| target.clone())
            .collect();

        report.changed = changes
            .iter()
            .filter(|a| matches!(a.node, NodeRef::Existing(_)))
            .count();
        report.roots = targets.iter().filter(|a| a.parent.is_none()).count();
        report.groups = targets.iter().filter(|a| a.is_group).count();

        targets.sort_by_key(|a| a.display_order);

        tracing::debug!(
            framework = %framework_id,
            created = report.created,
            changed = report.changed,
            "Planned hierarchy"
        );

        Ok(HierarchyPlan {
            framework_id,
            creations,
            targets,
            changes,
            report,
        })
    }

    fn check_snapshot(&self, framework_id: &FrameworkId, snapshot: &FrameworkSnapshot) -> Result<()> {
        if snapshot.framework_id() != framework_id {
            return Err(HierarchyError::CrossFrameworkNode {
                expected: framework_id.clone(),
                found: snapshot.framework_id().clone(),
                ref_code: snapshot
                    .nodes()
                    .first()
                    .map(|n| n.ref_code.clone())
                    .unwrap_or_default(),
            });
        }
        snapshot.validate()
    }

    /// Ancestor chain of a loaded node; warnings leave the chain empty.
    fn chain_of<'n>(
        &self,
        node: &'n Node,
        report: &mut FrameworkReport,
        pinned: &mut HashSet<&'n str>,
    ) -> Vec<String> {
        if self.family().classify(&node.ref_code) == RefShape::Unrecognized {
            report.record(InferenceWarning::PatternMismatch {
                ref_code: node.ref_code.clone(),
                family: self.family().name(),
            });
            return Vec::new();
        }

        match ancestor_chain(&node.ref_code, self.family()) {
            Ok(chain) => chain,
            Err(error) => {
                report.record(InferenceWarning::ChainUnresolved(error));
                pinned.insert(&node.ref_code);
                Vec::new()
            }
        }
    }

    /// Immediate parent of every slot, resolved to a node reference.
    fn assign_parents(&self, slots: &[Slot<'_>], report: &mut FrameworkReport) -> Vec<Option<NodeRef>> {
        let by_ref: HashMap<&str, NodeRef> = slots.iter().map(|s| (s.ref_code, s.node)).collect();

        slots
            .iter()
            .map(|slot| {
                if slot.pinned_root {
                    return None;
                }
                let parent_ref = self.family().parent_of(slot.ref_code)?;
                match by_ref.get(parent_ref.as_str()) {
                    Some(parent) => Some(*parent),
                    None => {
                        report.record(InferenceWarning::UnresolvedParent {
                            ref_code: slot.ref_code.to_string(),
                            parent: parent_ref,
                        });
                        None
                    }
                }
            })
            .collect()
    }
}

/// Whether a loaded node's stored hierarchy fields differ from the target.
fn differs(node: &Node, target: &Assignment) -> bool {
    let parent_matches = match target.parent {
        None => node.parent_id.is_none(),
        Some(NodeRef::Existing(id)) => node.parent_id == Some(id),
        Some(NodeRef::New(_)) => false,
    };

    !parent_matches
        || node.hierarchy_level.as_deref() != Some(target.hierarchy_level.as_str())
        || node.is_group != target.is_group
        || node.display_order != Some(target.display_order)
}
