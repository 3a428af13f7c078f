//! The consolidated analysis report.
//!
//! Everything here derives serde so the report can be handed to whatever
//! ships it downstream. [`AnalysisReport::to_json`] is the stock rendering.

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::config::SmellThresholds;
use crate::detect::{SmellKind, SmellResult};
use crate::error::FileFailure;
use crate::metrics::{AmbiguityNote, ClassMetrics, DependencyEdge};

/// Opaque identity of the analyzed source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId {
    pub repository_id: String,
    pub revision_id: String,
}

impl RevisionId {
    pub fn new(repository_id: impl Into<String>, revision_id: impl Into<String>) -> Self {
        Self {
            repository_id: repository_id.into(),
            revision_id: revision_id.into(),
        }
    }
}

impl std::fmt::Display for RevisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.repository_id, self.revision_id)
    }
}

/// Everything known about one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub metrics: ClassMetrics,
    pub dependencies: Vec<DependencyEdge>,
    pub smells: Vec<SmellResult>,
}

/// Batch totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    /// Units handed to the orchestrator, failed ones included.
    pub files_scanned: usize,
    pub classes_found: usize,
    /// Dependency edges listed across all classes, external targets included.
    pub edges_found: usize,
    pub smells_found: usize,
}

/// Result of analyzing one revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub revision: RevisionId,
    /// Keyed by qualified class name.
    pub classes: BTreeMap<String, ClassReport>,
    pub counts: BatchCounts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
    /// Files not started before the deadline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguities: Vec<AmbiguityNote>,
    pub thresholds: SmellThresholds,
    /// Set when the deadline cut the batch short.
    #[serde(default)]
    pub incomplete: bool,
}

impl AnalysisReport {
    pub fn class(&self, qualified_name: &str) -> Option<&ClassReport> {
        self.classes.get(qualified_name)
    }

    /// All smells across the batch, in class order.
    pub fn smells(&self) -> impl Iterator<Item = &SmellResult> {
        self.classes.values().flat_map(|c| c.smells.iter())
    }

    /// Smell counts per kind.
    pub fn smell_breakdown(&self) -> BTreeMap<SmellKind, usize> {
        let mut breakdown = BTreeMap::new();
        for smell in self.smells() {
            *breakdown.entry(smell.kind).or_insert(0) += 1;
        }
        breakdown
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as pretty JSON followed by a newline.
    pub fn write_json<W: Write>(&self, w: &mut W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *w, self)?;
        writeln!(w)?;
        Ok(())
    }
}
