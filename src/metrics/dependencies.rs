//! Dependency-edge extraction for a single class.

use std::collections::BTreeMap;

use tracing::debug;

use crate::analysis::{CallScope, Method, ResolvedType, SourceUnit, TypeResolver};

use super::DependencyEdge;

/// Collects the external types a class refers to.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyGraphExtractor;

impl DependencyGraphExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Edges from the unit's class, de-duplicated and sorted by target.
    ///
    /// Sources, in order: single-type imports, supertypes, field types,
    /// method and constructor signatures, `new` and cast targets, and the
    /// declaring types of qualified calls.
    pub fn extract(&self, unit: &SourceUnit) -> Vec<DependencyEdge> {
        let resolver = TypeResolver::new(unit);
        let mut targets = TargetSet::default();

        for import in unit.imports.iter().filter(|i| !i.is_static && !i.is_wildcard) {
            targets.add(resolver.resolve(&import.path));
        }

        for supertype in unit.superclass.iter().chain(unit.interfaces.iter()) {
            targets.add(resolver.resolve(supertype));
        }

        for field in &unit.fields {
            targets.add(resolver.resolve(&field.type_name));
        }

        for method in &unit.methods {
            if let Some(ret) = &method.return_type {
                targets.add(resolver.resolve(ret));
            }
            for p in &method.parameters {
                targets.add(resolver.resolve(&p.type_name));
            }
        }

        for ctor in &unit.constructors {
            for p in &ctor.parameters {
                targets.add(resolver.resolve(&p.type_name));
            }
        }

        for body in unit.bodies() {
            for t in &body.instantiations {
                targets.add(resolver.resolve(t));
            }
        }

        for body in unit.bodies() {
            for t in &body.casts {
                targets.add(resolver.resolve(t));
            }
        }

        for method in unit.callables() {
            for call in &method.body.calls {
                if let Some(declaring) = scope_type(unit, Some(method), &call.scope) {
                    targets.add(resolver.resolve(declaring));
                }
            }
        }
        for call in &unit.initializers.calls {
            if let Some(declaring) = scope_type(unit, None, &call.scope) {
                targets.add(resolver.resolve(declaring));
            }
        }

        let from = resolver.self_name();
        let edges: Vec<DependencyEdge> = targets
            .into_values()
            .map(|to| DependencyEdge::new(from, to))
            .collect();

        debug!(class = %from, edges = edges.len(), "extracted dependencies");
        edges
    }
}

/// Targets keyed by primary name. A resolved entry replaces an ambiguous
/// one with the same primary name.
#[derive(Default)]
struct TargetSet(BTreeMap<String, ResolvedType>);

impl TargetSet {
    fn add(&mut self, target: Option<ResolvedType>) {
        let Some(target) = target else {
            return;
        };
        match self.0.get(target.primary()) {
            Some(existing) if !existing.is_ambiguous() || target.is_ambiguous() => {}
            _ => {
                self.0.insert(target.primary().to_string(), target);
            }
        }
    }

    fn into_values(self) -> impl Iterator<Item = ResolvedType> {
        self.0.into_values()
    }
}

/// The written type that declares the method a call is made on, when the
/// receiver says so syntactically.
fn scope_type<'u>(
    unit: &'u SourceUnit,
    method: Option<&'u Method>,
    scope: &'u CallScope,
) -> Option<&'u str> {
    match scope {
        CallScope::Name(name) => method
            .and_then(|m| m.variable_type(name))
            .or_else(|| unit.field(name).map(|f| f.type_name.as_str()))
            .or_else(|| starts_upper(name).then_some(name.as_str())),
        CallScope::Path(path) => {
            if let Some(field) = path.strip_prefix("this.") {
                if !field.contains('.') {
                    return unit.field(field).map(|f| f.type_name.as_str());
                }
            }
            let last = path.rsplit('.').next().unwrap_or(path);
            starts_upper(last).then_some(path.as_str())
        }
        CallScope::Implicit | CallScope::This | CallScope::Super | CallScope::Expression => None,
    }
}

fn starts_upper(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{BodyFacts, CallSite, Field, Import, Parameter, Span};
    use pretty_assertions::assert_eq;

    fn resolved(name: &str) -> ResolvedType {
        ResolvedType::Resolved(name.to_string())
    }

    fn targets(edges: &[DependencyEdge]) -> Vec<String> {
        edges.iter().map(|e| e.target().to_string()).collect()
    }

    fn sample_unit() -> SourceUnit {
        let mut unit = SourceUnit::new("Checkout.java", Some("shop"), "Checkout");
        unit.imports = vec![
            Import::single("java.util.List"),
            Import {
                is_static: true,
                ..Import::single("java.util.Collections.emptyList")
            },
        ];
        unit.superclass = Some("BaseService".to_string());
        unit.interfaces = vec!["Runnable".to_string()];
        unit.fields = vec![Field {
            name: "gateway".to_string(),
            type_name: "PaymentGateway".to_string(),
            line: 3,
        }];

        let mut body = BodyFacts::default();
        body.local_types.insert("cart".to_string(), "Cart".to_string());
        body.calls = vec![
            CallSite::new("total", CallScope::Name("cart".to_string())),
            CallSite::new("charge", CallScope::Path("this.gateway".to_string())),
            CallSite::new("now", CallScope::Name("Clock".to_string())),
            CallSite::new("info", CallScope::Name("log".to_string())),
            CallSite::new("format", CallScope::Path("shop.util.Formats".to_string())),
        ];
        body.instantiations = vec!["Receipt".to_string()];
        body.casts = vec!["Discount".to_string()];

        unit.methods.push(Method {
            name: "run".to_string(),
            parameters: vec![Parameter::new("items", "List<Item>")],
            return_type: Some("void".to_string()),
            span: Span::lines(5, 12),
            body,
        });
        unit
    }

    #[test]
    fn test_extract_all_sources() {
        let edges = DependencyGraphExtractor::new().extract(&sample_unit());

        assert!(edges.iter().all(|e| e.from == "shop.Checkout"));
        assert_eq!(
            targets(&edges),
            vec![
                "java.util.List",
                "shop.BaseService",
                "shop.Cart",
                "shop.Clock",
                "shop.Discount",
                "shop.PaymentGateway",
                "shop.Receipt",
                "shop.Runnable",
                "shop.util.Formats",
            ]
        );
    }

    #[test]
    fn test_extract_is_idempotent() {
        let unit = sample_unit();
        let extractor = DependencyGraphExtractor::new();
        assert_eq!(extractor.extract(&unit), extractor.extract(&unit));
    }

    #[test]
    fn test_self_references_dropped() {
        let mut unit = SourceUnit::new("Node.java", Some("tree"), "Node");
        unit.nested_types = vec!["Visitor".to_string()];
        unit.fields = vec![
            Field {
                name: "next".to_string(),
                type_name: "Node".to_string(),
                line: 2,
            },
            Field {
                name: "visitor".to_string(),
                type_name: "Visitor".to_string(),
                line: 3,
            },
        ];
        assert!(DependencyGraphExtractor::new().extract(&unit).is_empty());
    }

    #[test]
    fn test_resolved_wins_over_ambiguous() {
        let mut targets = TargetSet::default();
        let ambiguous = ResolvedType::Ambiguous {
            simple_name: "Item".to_string(),
            candidates: vec!["shop.Item".to_string(), "other.Item".to_string()],
        };
        targets.add(Some(ambiguous.clone()));
        targets.add(Some(resolved("shop.Item")));
        targets.add(Some(ambiguous));

        let values: Vec<_> = targets.into_values().collect();
        assert_eq!(values, vec![resolved("shop.Item")]);
    }
}
