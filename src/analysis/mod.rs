//! AST-backed source analysis.
//!
//! This module turns source files into [`SourceUnit`]s using tree-sitter.
//! A unit holds the analyzed class and the facts the metrics need:
//! - Imports, superclass and interfaces
//! - Fields, methods and constructors with their signatures
//! - Per-body control flow, call sites, field uses, `new` and cast targets
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Source Files    │────▶│ Analyzers    │────▶│ SourceUnit    │
//! │ (ProjectLoader) │     │ (Java)       │     │ (class facts) │
//! └─────────────────┘     └──────────────┘     └───────────────┘
//!                                                      │
//!                                                      ▼
//!                                              ┌───────────────┐
//!                                              │ TypeResolver  │
//!                                              │ (names → FQN) │
//!                                              └───────────────┘
//! ```

mod facts;
mod languages;
mod loader;
mod resolve;
mod traits;

pub use facts::{
    BodyFacts, CallScope, CallSite, ClassKind, ControlFlowInfo, Field, Import, Method, Parameter,
    SourceUnit, Span,
};
pub use languages::{get_analyzer, registered_extensions, JavaAnalyzer};
pub use loader::{is_test_source, ProjectLoader};
pub use resolve::{is_implicit, is_primitive, normalize, ResolvedType, TypeResolver};
pub use traits::{analyze_source, LanguageAnalyzer, ParsedFile};
