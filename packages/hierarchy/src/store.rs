//! Persistence seam and the in-memory store.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::crosswalk::CrosswalkEntry;
use crate::engine::HierarchyPlan;
use crate::error::{HierarchyError, Result};
use crate::types::{FrameworkId, FrameworkSnapshot, Node, NodeId, NodeRef};

/// What a commit wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    /// Nodes inserted by creation requests.
    pub created: usize,
    /// Creation requests that hit an existing reference code.
    pub reused: usize,
    /// Nodes whose hierarchy fields were written.
    pub updated: usize,
}

/// Storage the engine reads snapshots from and commits plans to.
pub trait NodeStore {
    /// Frameworks present in the store.
    fn framework_ids(&self) -> Vec<FrameworkId>;

    /// Load all nodes of one framework.
    fn load_framework(&self, framework_id: &FrameworkId) -> Result<FrameworkSnapshot>;

    /// Apply a plan atomically: either every creation and change is
    /// written, or nothing is.
    fn commit(&mut self, plan: &HierarchyPlan) -> Result<CommitOutcome>;
}

/// Nodes of one framework, indexed by reference code and id.
///
/// Nodes are only ever appended, so stored positions stay valid.
#[derive(Debug, Clone)]
pub(crate) struct FrameworkEntry {
    pub(crate) code: String,
    pub(crate) version: String,
    pub(crate) nodes: Vec<Node>,
    by_ref: HashMap<String, usize>,
    by_id: HashMap<NodeId, usize>,
}

impl FrameworkEntry {
    fn new(code: &str, version: &str) -> Self {
        Self {
            code: code.to_string(),
            version: version.to_string(),
            nodes: Vec::new(),
            by_ref: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    fn position_of(&self, ref_code: &str) -> Option<usize> {
        self.by_ref.get(ref_code).copied()
    }

    fn position_of_id(&self, id: NodeId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    fn push(&mut self, node: Node) {
        self.by_ref.insert(node.ref_code.clone(), self.nodes.len());
        self.by_id.insert(node.id, self.nodes.len());
        self.nodes.push(node);
    }
}

/// In-memory store with sequential node ids.
///
/// Creations behave like `INSERT ... ON CONFLICT DO NOTHING` on
/// `(framework_id, ref_code)`: a request for an existing code reuses the
/// stored node. SCF crosswalk mappings are kept alongside, one per
/// `(scf_control, framework_id, ref_code)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    frameworks: BTreeMap<FrameworkId, FrameworkEntry>,
    /// Owning framework of every node id.
    owners: HashMap<NodeId, FrameworkId>,
    next_id: u64,
    mappings: Vec<CrosswalkEntry>,
    mapping_keys: HashSet<(String, FrameworkId, String)>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a framework if absent and return its id.
    pub fn add_framework(&mut self, code: &str, version: &str) -> FrameworkId {
        let id = FrameworkId::new(code, version);
        self.frameworks
            .entry(id.clone())
            .or_insert_with(|| FrameworkEntry::new(code, version));
        id
    }

    /// Insert a sourced node, reusing the existing one on a duplicate code.
    pub fn insert_node(
        &mut self,
        framework_id: &FrameworkId,
        ref_code: &str,
        description: Option<&str>,
    ) -> Result<NodeId> {
        let entry = self
            .frameworks
            .get_mut(framework_id)
            .ok_or_else(|| HierarchyError::UnknownFramework(framework_id.clone()))?;

        if let Some(pos) = entry.position_of(ref_code) {
            return Ok(entry.nodes[pos].id);
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;
        let mut node = Node::new(id, framework_id.clone(), ref_code);
        node.description = description.map(str::to_string);
        entry.push(node);
        self.owners.insert(id, framework_id.clone());
        Ok(id)
    }

    /// Add a fully specified node, as read back from a store file.
    ///
    /// Keeps the node's id and moves the id counter past it.
    pub fn restore_node(&mut self, node: Node) -> Result<()> {
        if self.owners.contains_key(&node.id) {
            return Err(HierarchyError::InvalidStore(format!(
                "node id {} used twice",
                node.id
            )));
        }
        let entry = self
            .frameworks
            .get_mut(&node.framework_id)
            .ok_or_else(|| HierarchyError::UnknownFramework(node.framework_id.clone()))?;

        if entry.position_of(&node.ref_code).is_some() {
            return Err(HierarchyError::DuplicateRefCode {
                framework: node.framework_id.clone(),
                ref_code: node.ref_code,
            });
        }

        self.next_id = self.next_id.max(node.id.0 + 1);
        self.owners.insert(node.id, node.framework_id.clone());
        entry.push(node);
        Ok(())
    }

    /// Seed a framework with reference codes, e.g. the distinct codes of
    /// one crosswalk column. Codes already present are left untouched.
    pub fn seed_framework<I, S>(&mut self, code: &str, version: &str, ref_codes: I) -> Result<FrameworkId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = self.add_framework(code, version);
        for ref_code in ref_codes {
            self.insert_node(&id, ref_code.as_ref(), None)?;
        }
        Ok(id)
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let entry = self.frameworks.get(self.owners.get(&id)?)?;
        entry.position_of_id(id).map(|pos| &entry.nodes[pos])
    }

    /// Look up a node by reference code.
    #[must_use]
    pub fn find(&self, framework_id: &FrameworkId, ref_code: &str) -> Option<&Node> {
        let entry = self.frameworks.get(framework_id)?;
        entry.position_of(ref_code).map(|pos| &entry.nodes[pos])
    }

    /// Nodes of a framework in insertion order.
    #[must_use]
    pub fn nodes(&self, framework_id: &FrameworkId) -> Option<&[Node]> {
        self.frameworks.get(framework_id).map(|e| e.nodes.as_slice())
    }

    /// Code and version of a framework.
    #[must_use]
    pub fn framework_code(&self, framework_id: &FrameworkId) -> Option<(&str, &str)> {
        self.frameworks
            .get(framework_id)
            .map(|e| (e.code.as_str(), e.version.as_str()))
    }

    /// Record a crosswalk mapping. Returns `false` when the same SCF control
    /// already maps to that control; the first mapping, and its strength, wins.
    ///
    /// # Errors
    ///
    /// Fails when the target control is not in the store.
    pub fn add_mapping(&mut self, entry: CrosswalkEntry) -> Result<bool> {
        if !self.frameworks.contains_key(&entry.framework_id) {
            return Err(HierarchyError::UnknownFramework(entry.framework_id));
        }
        if self.find(&entry.framework_id, &entry.ref_code).is_none() {
            return Err(HierarchyError::InvalidStore(format!(
                "mapping from {} targets '{}', which is not a control of {}",
                entry.scf_control, entry.ref_code, entry.framework_id
            )));
        }

        let key = (
            entry.scf_control.clone(),
            entry.framework_id.clone(),
            entry.ref_code.clone(),
        );
        if !self.mapping_keys.insert(key) {
            return Ok(false);
        }
        self.mappings.push(entry);
        Ok(true)
    }

    /// Crosswalk mappings in insertion order.
    #[must_use]
    pub fn mappings(&self) -> &[CrosswalkEntry] {
        &self.mappings
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &FrameworkEntry> {
        self.frameworks.values()
    }
}

impl NodeStore for MemoryStore {
    fn framework_ids(&self) -> Vec<FrameworkId> {
        self.frameworks.keys().cloned().collect()
    }

    fn load_framework(&self, framework_id: &FrameworkId) -> Result<FrameworkSnapshot> {
        let entry = self
            .frameworks
            .get(framework_id)
            .ok_or_else(|| HierarchyError::UnknownFramework(framework_id.clone()))?;
        Ok(FrameworkSnapshot::new(framework_id.clone(), entry.nodes.clone()))
    }

    fn commit(&mut self, plan: &HierarchyPlan) -> Result<CommitOutcome> {
        let framework_id = &plan.framework_id;
        let current = self
            .frameworks
            .get(framework_id)
            .ok_or_else(|| HierarchyError::UnknownFramework(framework_id.clone()))?;

        // Stage on a copy; the store is only touched once everything applied.
        let mut staged = current.clone();
        let mut next_id = self.next_id;
        let mut outcome = CommitOutcome::default();

        let mut created_ids = Vec::with_capacity(plan.creations.len());
        for new in &plan.creations {
            if new.framework_id != *framework_id {
                return Err(HierarchyError::CrossFrameworkNode {
                    expected: framework_id.clone(),
                    found: new.framework_id.clone(),
                    ref_code: new.ref_code.clone(),
                });
            }
            if let Some(pos) = staged.position_of(&new.ref_code) {
                outcome.reused += 1;
                created_ids.push(staged.nodes[pos].id);
                continue;
            }
            let id = NodeId(next_id);
            next_id += 1;
            let mut node = Node::new(id, framework_id.clone(), new.ref_code.clone())
                .with_description(new.description.clone());
            node.hierarchy_level = Some(new.hierarchy_level.clone());
            node.synthesized = true;
            staged.push(node);
            created_ids.push(id);
            outcome.created += 1;
        }

        let resolve = |node_ref: NodeRef| -> Result<NodeId> {
            match node_ref {
                NodeRef::Existing(id) => Ok(id),
                NodeRef::New(index) => {
                    created_ids
                        .get(index)
                        .copied()
                        .ok_or_else(|| HierarchyError::UnknownNewNode {
                            framework: framework_id.clone(),
                            index,
                        })
                }
            }
        };

        for change in &plan.changes {
            let id = resolve(change.node)?;
            let parent = change.parent.map(&resolve).transpose()?;
            if let Some(parent_id) = parent {
                if staged.position_of_id(parent_id).is_none() {
                    return Err(HierarchyError::UnknownNode {
                        framework: framework_id.clone(),
                        node: parent_id,
                    });
                }
            }
            let pos = staged.position_of_id(id).ok_or_else(|| HierarchyError::UnknownNode {
                framework: framework_id.clone(),
                node: id,
            })?;

            let node = &mut staged.nodes[pos];
            node.parent_id = parent;
            node.hierarchy_level = Some(change.hierarchy_level.clone());
            node.is_group = change.is_group;
            node.display_order = Some(change.display_order);
            outcome.updated += 1;
        }

        for id in &created_ids {
            self.owners.entry(*id).or_insert_with(|| framework_id.clone());
        }
        self.frameworks.insert(framework_id.clone(), staged);
        self.next_id = next_id;

        tracing::info!(
            framework = %framework_id,
            created = outcome.created,
            reused = outcome.reused,
            updated = outcome.updated,
            "Committed hierarchy"
        );

        Ok(outcome)
    }
}
