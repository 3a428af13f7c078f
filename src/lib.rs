//! ckscan - static quality metrics for object-oriented source code.
//!
//! ckscan parses Java sources with tree-sitter and produces, per class,
//! the Chidamber-Kemerer metrics (WMC, DIT, NOC, CBO, RFC, LCOM), the
//! outgoing dependency edges and a set of threshold-based code smells.
//!
//! # Architecture
//!
//! - `analysis`: tree-sitter adapters turning a file into a [`SourceUnit`],
//!   syntactic type resolution and the directory loader
//! - `metrics`: per-class CK metrics, dependency edges, and the
//!   project-wide pass (NOC, in/out degree)
//! - `detect`: smell heuristics
//! - `orchestrator`: runs everything over a batch
//! - `report`: the serializable result
//!
//! ```no_run
//! use ckscan::{AnalysisConfig, AnalysisOrchestrator, RevisionId};
//!
//! let orchestrator = AnalysisOrchestrator::new(AnalysisConfig::default());
//! let report = orchestrator.run_path("src/main/java", RevisionId::new("shop", "a1b2c3"))?;
//! println!("{}", report.to_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod report;

pub use analysis::{LanguageAnalyzer, ProjectLoader, ResolvedType, SourceUnit};
pub use config::{AnalysisConfig, SmellThresholds};
pub use detect::{SmellDetector, SmellKind, SmellResult};
pub use error::{AnalysisError, FileFailure};
pub use logging::init_tracing;
pub use metrics::{
    CkMetricsExtractor, ClassMetrics, DependencyEdge, DependencyGraphExtractor,
    GlobalMetricsService,
};
pub use orchestrator::AnalysisOrchestrator;
pub use report::{AnalysisReport, ClassReport, RevisionId};
