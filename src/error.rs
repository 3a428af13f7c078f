//! Error types for the analysis pipeline.
//!
//! Per-file problems (`ParseFailure`, `ExtractionFailure`, `Io`) are recorded
//! in the report and never abort a batch. `EmptyBatch` is the only error the
//! orchestrator returns to its caller once a batch has been handed over.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or analyzing source units.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The file could not be turned into a syntax tree.
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: String, reason: String },
    /// The file parsed, but holds nothing the engine can analyze.
    #[error("no analyzable class in {path}: {reason}")]
    ExtractionFailure { path: String, reason: String },
    /// Reading a file or directory failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Not a single class survived the per-file pass.
    #[error("no analyzable classes in batch ({failures} file(s) failed)")]
    EmptyBatch { failures: usize },
}

impl AnalysisError {
    pub fn parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn extraction(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Category used when the error is recorded against a single file.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AnalysisError::ParseFailure { .. } => FailureKind::Parse,
            AnalysisError::ExtractionFailure { .. } => FailureKind::Extraction,
            AnalysisError::Io { .. } => FailureKind::Io,
            AnalysisError::Config(_) | AnalysisError::EmptyBatch { .. } => FailureKind::Other,
        }
    }

    /// Path of the offending file, when the error is tied to one.
    pub fn path(&self) -> Option<String> {
        match self {
            AnalysisError::ParseFailure { path, .. }
            | AnalysisError::ExtractionFailure { path, .. } => Some(path.clone()),
            AnalysisError::Io { path, .. } => Some(path.to_string_lossy().to_string()),
            AnalysisError::Config(_) | AnalysisError::EmptyBatch { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Category of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Parse,
    Extraction,
    Io,
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Parse => write!(f, "parse"),
            FailureKind::Extraction => write!(f, "extraction"),
            FailureKind::Io => write!(f, "io"),
            FailureKind::Other => write!(f, "other"),
        }
    }
}

/// A file whose contribution was dropped from the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub kind: FailureKind,
    pub message: String,
}

impl From<&AnalysisError> for FileFailure {
    fn from(err: &AnalysisError) -> Self {
        Self {
            path: err.path().unwrap_or_else(|| "(unknown)".to_string()),
            kind: err.failure_kind(),
            message: err.to_string(),
        }
    }
}
