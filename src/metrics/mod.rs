//! Class metrics and the dependency graph.
//!
//! Per-class extractors ([`CkMetricsExtractor`], [`DependencyGraphExtractor`])
//! only look at one [`SourceUnit`](crate::analysis::SourceUnit).
//! [`GlobalMetricsService`] runs afterwards over the whole batch.

mod ck;
mod dependencies;
mod global;
mod types;

pub use ck::{
    coupled_types, depth_of_inheritance, lack_of_cohesion, response_for_class, weighted_methods,
    CkMetricsExtractor,
};
pub use dependencies::DependencyGraphExtractor;
pub use global::{
    AmbiguityContext, AmbiguityNote, ClassLinks, GlobalMetrics, GlobalMetricsService, ProjectGraph,
};
pub use types::{ClassMetrics, DependencyEdge};
