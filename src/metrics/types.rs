//! Per-class metric records.

use serde::{Deserialize, Serialize};

use crate::analysis::ResolvedType;

/// CK metrics and coupling data for one class.
///
/// `noc`, the dependency lists and the degrees stay at their defaults until
/// the project-wide pass has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class_name: String,
    pub qualified_name: String,
    pub package: Option<String>,
    pub file_path: String,
    /// Lines spanned by the class declaration.
    pub loc: usize,
    /// Sum of the cyclomatic complexity of every method and constructor.
    pub wmc: usize,
    /// 1 when a superclass is declared, else 0.
    pub dit: usize,
    pub noc: usize,
    pub cbo: usize,
    pub rfc: usize,
    pub lcom: f64,
    /// Declared methods, constructors excluded.
    pub method_count: usize,
    /// Declared fields.
    pub attribute_count: usize,
    #[serde(default)]
    pub dependencies_in: Vec<String>,
    #[serde(default)]
    pub dependencies_out: Vec<String>,
    #[serde(default)]
    pub in_degree: usize,
    #[serde(default)]
    pub out_degree: usize,
}

impl ClassMetrics {
    /// Record in/out dependencies; degrees follow from the list lengths.
    pub fn set_dependencies(&mut self, incoming: Vec<String>, outgoing: Vec<String>) {
        self.in_degree = incoming.len();
        self.out_degree = outgoing.len();
        self.dependencies_in = incoming;
        self.dependencies_out = outgoing;
    }
}

/// A directed reference from an analyzed class to another type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Qualified name of the referencing class.
    pub from: String,
    pub to: ResolvedType,
}

impl DependencyEdge {
    pub fn new(from: &str, to: ResolvedType) -> Self {
        Self {
            from: from.to_string(),
            to,
        }
    }

    /// Target name used for ordering and graph lookups.
    pub fn target(&self) -> &str {
        self.to.primary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_dependencies_updates_degrees() {
        let mut metrics = ClassMetrics {
            class_name: "A".to_string(),
            qualified_name: "p.A".to_string(),
            package: Some("p".to_string()),
            file_path: "p/A.java".to_string(),
            loc: 1,
            wmc: 0,
            dit: 0,
            noc: 0,
            cbo: 0,
            rfc: 0,
            lcom: 0.0,
            method_count: 0,
            attribute_count: 0,
            dependencies_in: Vec::new(),
            dependencies_out: Vec::new(),
            in_degree: 0,
            out_degree: 0,
        };
        metrics.set_dependencies(vec!["p.B".to_string()], vec!["p.B".to_string(), "p.C".to_string()]);
        assert_eq!(metrics.in_degree, 1);
        assert_eq!(metrics.out_degree, 2);
    }

    #[test]
    fn test_edge_serializes_with_kind() {
        let edge = DependencyEdge::new("p.A", ResolvedType::Resolved("p.B".to_string()));
        let json = serde_json::to_string(&edge).unwrap();
        assert_eq!(json, r#"{"from":"p.A","to":{"kind":"resolved","value":"p.B"}}"#);
    }
}
