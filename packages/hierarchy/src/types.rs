//! Core data types for hierarchy inference.
//!
//! These types model frameworks, their control nodes, and the write set the
//! engine produces for a persistence layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HierarchyError, Result};

/// Identifier of a framework: its code and version joined by a colon.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::types::FrameworkId;
///
/// let id = FrameworkId::new("NIST-800-53", "rev5");
/// assert_eq!(id.as_str(), "NIST-800-53:rev5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameworkId(String);

impl FrameworkId {
    /// Build the identifier for a framework code and version.
    #[must_use]
    pub fn new(code: &str, version: &str) -> Self {
        Self(format!("{code}:{version}"))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque node identifier, assigned once by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A control or group within one framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Store-assigned identifier.
    pub id: NodeId,

    /// Owning framework.
    pub framework_id: FrameworkId,

    /// Framework-native reference code (e.g., "GV.RM-01").
    pub ref_code: String,

    /// Parent node in the same framework, `None` for roots.
    pub parent_id: Option<NodeId>,

    /// Source description, or the placeholder for synthesized groups.
    pub description: Option<String>,

    /// Family-scoped level label (e.g., "clause", "subcategory").
    pub hierarchy_level: Option<String>,

    /// Whether any node has this node as parent.
    pub is_group: bool,

    /// Pre-order position within the framework.
    pub display_order: Option<u32>,

    /// Created by the group synthesizer rather than sourced.
    pub synthesized: bool,
}

impl Node {
    /// Create a sourced node with no hierarchy information yet.
    #[must_use]
    pub fn new(id: NodeId, framework_id: FrameworkId, ref_code: impl Into<String>) -> Self {
        Self {
            id,
            framework_id,
            ref_code: ref_code.into(),
            parent_id: None,
            description: None,
            hierarchy_level: None,
            is_group: false,
            display_order: None,
            synthesized: false,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the current parent.
    #[must_use]
    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Immutable view of one framework's nodes, as loaded from a store.
#[derive(Debug, Clone)]
pub struct FrameworkSnapshot {
    framework_id: FrameworkId,
    nodes: Vec<Node>,
}

impl FrameworkSnapshot {
    /// Create a snapshot.
    #[must_use]
    pub fn new(framework_id: FrameworkId, nodes: Vec<Node>) -> Self {
        Self {
            framework_id,
            nodes,
        }
    }

    /// Framework this snapshot belongs to.
    #[must_use]
    pub fn framework_id(&self) -> &FrameworkId {
        &self.framework_id
    }

    /// All nodes in load order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check the identity invariants every later step relies on.
    ///
    /// Fails on a node owned by another framework or on a reference code that
    /// appears twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if node.framework_id != self.framework_id {
                return Err(HierarchyError::CrossFrameworkNode {
                    expected: self.framework_id.clone(),
                    found: node.framework_id.clone(),
                    ref_code: node.ref_code.clone(),
                });
            }
            if !seen.insert(node.ref_code.as_str()) {
                return Err(HierarchyError::DuplicateRefCode {
                    framework: self.framework_id.clone(),
                    ref_code: node.ref_code.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Reference to a node inside a plan: either already stored, or the n-th
/// creation request of the same plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRef {
    Existing(NodeId),
    New(usize),
}

/// Request to create a synthesized group node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNode {
    pub framework_id: FrameworkId,
    pub ref_code: String,
    pub description: String,
    pub hierarchy_level: String,
}

/// Hierarchy fields computed for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub node: NodeRef,
    pub ref_code: String,
    pub parent: Option<NodeRef>,
    pub hierarchy_level: String,
    pub is_group: bool,
    pub display_order: u32,
}
