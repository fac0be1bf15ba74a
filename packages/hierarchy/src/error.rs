//! Error types for hierarchy inference.
//!
//! Uses the dual-error pattern: `HierarchyError` for failures that abort a
//! framework (or the whole command), and `ChainError` for per-node ancestor
//! resolution failures that are downgraded to warnings by the engine.

use thiserror::Error;

use crate::types::{FrameworkId, NodeId};

/// Main error type for the hierarchy library.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// Two nodes of one framework share a reference code.
    #[error("Duplicate reference code '{ref_code}' in framework {framework}")]
    DuplicateRefCode {
        framework: FrameworkId,
        ref_code: String,
    },

    /// A snapshot or plan contains a node owned by another framework.
    #[error("Node '{ref_code}' belongs to framework {found}, not {expected}")]
    CrossFrameworkNode {
        expected: FrameworkId,
        found: FrameworkId,
        ref_code: String,
    },

    /// A plan references a node id the store does not hold for the framework.
    #[error("Unknown node {node} in framework {framework}")]
    UnknownNode { framework: FrameworkId, node: NodeId },

    /// A plan references a creation request index that does not exist.
    #[error("Plan for {framework} references missing new node #{index}")]
    UnknownNewNode { framework: FrameworkId, index: usize },

    /// Framework is not present in the store or the registry.
    #[error("Unknown framework: {0}")]
    UnknownFramework(FrameworkId),

    /// Parent edges do not form a forest.
    #[error("{framework}: {count} node(s) unreachable from any root (parent cycle)")]
    UnreachableNodes { framework: FrameworkId, count: usize },

    /// Framework registry file is malformed.
    #[error("Invalid framework registry: {0}")]
    InvalidRegistry(String),

    /// Store file is malformed.
    #[error("Invalid store file: {0}")]
    InvalidStore(String),

    /// A multi-framework run finished with failures.
    #[error("{0} framework(s) failed")]
    FrameworksFailed(usize),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ancestor chain resolution failure for a single reference code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The rule kept producing parents past the depth cap.
    #[error("ancestor chain of '{ref_code}' exceeds {bound} levels")]
    IterationBoundExceeded { ref_code: String, bound: usize },

    /// A rule step did not shrink the reference code.
    #[error("rule maps '{ref_code}' to non-shrinking parent '{parent}'")]
    CycleDetected { ref_code: String, parent: String },
}

/// Result type alias for hierarchy operations.
pub type Result<T> = std::result::Result<T, HierarchyError>;
