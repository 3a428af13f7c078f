//! Project-wide metrics: NOC and in/out coupling degree.
//!
//! Runs once over the whole batch after every class has been measured.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{ResolvedType, SourceUnit, TypeResolver};

use super::{ClassMetrics, DependencyEdge};

/// What a class contributes to the global pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLinks {
    pub qualified_name: String,
    pub superclass: Option<ResolvedType>,
    pub edges: Vec<DependencyEdge>,
}

impl ClassLinks {
    pub fn from_unit(unit: &SourceUnit, edges: Vec<DependencyEdge>) -> Self {
        let resolver = TypeResolver::new(unit);
        Self {
            qualified_name: unit.qualified_name(),
            superclass: unit.superclass.as_deref().and_then(|s| resolver.resolve(s)),
            edges,
        }
    }
}

/// Where an unresolvable name was met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityContext {
    Superclass,
    Dependency,
}

/// A reference that matched more than one class of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityNote {
    pub class_name: String,
    pub simple_name: String,
    /// Candidates present in the batch, all of which were credited.
    pub candidates: Vec<String>,
    pub context: AmbiguityContext,
}

/// Directed graph over the analyzed classes. No parallel edges, no self loops.
#[derive(Debug, Default)]
pub struct ProjectGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl ProjectGraph {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::default();
        for name in names {
            let name = name.into();
            if !graph.index.contains_key(&name) {
                let idx = graph.graph.add_node(name.clone());
                graph.index.insert(name, idx);
            }
        }
        graph
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Add `from -> to`. Returns false for unknown vertices, self loops and
    /// edges already present.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> bool {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        if a == b || self.graph.contains_edge(a, b) {
            return false;
        }
        self.graph.add_edge(a, b, ());
        true
    }

    /// Sorted names of the neighbors of `name` in the given direction.
    pub fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        names.sort();
        names
    }

    pub fn in_degree(&self, name: &str) -> usize {
        self.neighbors(name, Direction::Incoming).len()
    }

    pub fn out_degree(&self, name: &str) -> usize {
        self.neighbors(name, Direction::Outgoing).len()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Results of the global pass, keyed by qualified class name.
#[derive(Debug, Default)]
pub struct GlobalMetrics {
    pub noc: BTreeMap<String, usize>,
    pub graph: ProjectGraph,
    pub ambiguities: Vec<AmbiguityNote>,
}

impl GlobalMetrics {
    pub fn noc_of(&self, name: &str) -> usize {
        self.noc.get(name).copied().unwrap_or(0)
    }

    /// Merge NOC and dependency lists into a class's metrics.
    pub fn apply(&self, metrics: &mut ClassMetrics) {
        let name = metrics.qualified_name.clone();
        metrics.noc = self.noc_of(&name);
        metrics.set_dependencies(
            self.graph.neighbors(&name, Direction::Incoming),
            self.graph.neighbors(&name, Direction::Outgoing),
        );
    }
}

/// Computes the metrics that need the whole batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalMetricsService;

impl GlobalMetricsService {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, classes: &[ClassLinks]) -> GlobalMetrics {
        let mut graph = ProjectGraph::new(classes.iter().map(|c| c.qualified_name.as_str()));
        let mut noc: BTreeMap<String, usize> = classes
            .iter()
            .map(|c| (c.qualified_name.clone(), 0))
            .collect();
        let mut ambiguities = Vec::new();

        for class in classes {
            if let Some(parent) = &class.superclass {
                let parents = batch_targets(&graph, parent, false);
                if parents.len() > 1 {
                    ambiguities.push(note(class, parent, &parents, AmbiguityContext::Superclass));
                }
                for p in parents {
                    if let Some(count) = noc.get_mut(&p) {
                        *count += 1;
                    }
                }
            }

            for edge in &class.edges {
                let targets = batch_targets(&graph, &edge.to, true);
                if targets.len() > 1 {
                    ambiguities.push(note(class, &edge.to, &targets, AmbiguityContext::Dependency));
                }
                for target in targets {
                    graph.add_dependency(&class.qualified_name, &target);
                }
            }
        }

        debug!(
            classes = graph.node_count(),
            edges = graph.edge_count(),
            ambiguities = ambiguities.len(),
            "computed project graph"
        );

        GlobalMetrics {
            noc,
            graph,
            ambiguities,
        }
    }
}

/// Batch classes a reference may denote.
///
/// With `prefer_primary`, a primary name that is in the batch settles the
/// reference on its own.
fn batch_targets(graph: &ProjectGraph, target: &ResolvedType, prefer_primary: bool) -> Vec<String> {
    if prefer_primary && graph.contains(target.primary()) {
        return vec![target.primary().to_string()];
    }
    target
        .candidates()
        .into_iter()
        .filter(|c| graph.contains(c))
        .map(str::to_string)
        .collect()
}

fn note(
    class: &ClassLinks,
    target: &ResolvedType,
    matched: &[String],
    context: AmbiguityContext,
) -> AmbiguityNote {
    let simple_name = match target {
        ResolvedType::Ambiguous { simple_name, .. } => simple_name.clone(),
        ResolvedType::Resolved(fqn) => fqn.rsplit('.').next().unwrap_or(fqn).to_string(),
    };
    AmbiguityNote {
        class_name: class.qualified_name.clone(),
        simple_name,
        candidates: matched.to_vec(),
        context,
    }
}
