//! Per-framework inference report and non-fatal warnings.

use serde::Serialize;
use thiserror::Error;

use crate::config::MAX_WARNING_SAMPLES;
use crate::error::ChainError;
use crate::types::FrameworkId;

/// Non-fatal finding. The affected node is kept as a root and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceWarning {
    /// The reference code matches no shape of the framework's family.
    #[error("'{ref_code}' matches no {family} pattern, kept as root")]
    PatternMismatch {
        ref_code: String,
        family: &'static str,
    },

    /// The inferred parent has no node, even after synthesis.
    #[error("parent '{parent}' of '{ref_code}' not found, kept as root")]
    UnresolvedParent { ref_code: String, parent: String },

    /// The ancestor chain could not be resolved.
    #[error("{0}, kept as root")]
    ChainUnresolved(ChainError),
}

impl InferenceWarning {
    /// Reference code of the affected node.
    #[must_use]
    pub fn ref_code(&self) -> &str {
        match self {
            Self::PatternMismatch { ref_code, .. } | Self::UnresolvedParent { ref_code, .. } => {
                ref_code
            }
            Self::ChainUnresolved(
                ChainError::IterationBoundExceeded { ref_code, .. }
                | ChainError::CycleDetected { ref_code, .. },
            ) => ref_code,
        }
    }
}

/// Counts per warning kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarningCounts {
    pub pattern_mismatch: usize,
    pub unresolved_parent: usize,
    pub chain_unresolved: usize,
}

impl WarningCounts {
    /// Total number of warnings.
    #[must_use]
    pub fn total(&self) -> usize {
        self.pattern_mismatch + self.unresolved_parent + self.chain_unresolved
    }
}

/// Outcome of planning (and later committing) one framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkReport {
    pub framework_id: FrameworkId,
    pub family: &'static str,
    /// Nodes loaded from the store.
    pub loaded: usize,
    /// Group nodes created by synthesis.
    pub created: usize,
    /// Existing nodes whose hierarchy fields change.
    pub changed: usize,
    pub roots: usize,
    pub groups: usize,
    pub warnings: WarningCounts,
    /// First warnings in the order they were found.
    pub samples: Vec<String>,
}

impl FrameworkReport {
    /// Create an empty report.
    #[must_use]
    pub fn new(framework_id: FrameworkId, family: &'static str) -> Self {
        Self {
            framework_id,
            family,
            loaded: 0,
            created: 0,
            changed: 0,
            roots: 0,
            groups: 0,
            warnings: WarningCounts::default(),
            samples: Vec::new(),
        }
    }

    /// Record a warning: count it, keep a sample, and log it.
    pub fn record(&mut self, warning: InferenceWarning) {
        tracing::warn!(
            framework = %self.framework_id,
            ref_code = %warning.ref_code(),
            "{warning}"
        );

        match warning {
            InferenceWarning::PatternMismatch { .. } => self.warnings.pattern_mismatch += 1,
            InferenceWarning::UnresolvedParent { .. } => self.warnings.unresolved_parent += 1,
            InferenceWarning::ChainUnresolved(_) => self.warnings.chain_unresolved += 1,
        }

        if self.samples.len() < MAX_WARNING_SAMPLES {
            self.samples.push(warning.to_string());
        }
    }

    /// Whether the plan writes nothing.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.created == 0 && self.changed == 0
    }
}
