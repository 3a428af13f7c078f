//! Chidamber-Kemerer metrics for a single class.

use std::collections::BTreeSet;

use tracing::debug;

use crate::analysis::{SourceUnit, TypeResolver};

use super::ClassMetrics;

/// Computes the local CK metrics of a source unit.
///
/// NOC and the dependency degrees need the whole batch and are left at
/// their defaults here.
#[derive(Debug, Clone, Copy, Default)]
pub struct CkMetricsExtractor;

impl CkMetricsExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, unit: &SourceUnit) -> ClassMetrics {
        let metrics = ClassMetrics {
            class_name: unit.class_name.clone(),
            qualified_name: unit.qualified_name(),
            package: unit.package.clone(),
            file_path: unit.path.clone(),
            loc: unit.loc(),
            wmc: weighted_methods(unit),
            dit: depth_of_inheritance(unit),
            noc: 0,
            cbo: coupled_types(unit).len(),
            rfc: response_for_class(unit),
            lcom: lack_of_cohesion(unit),
            method_count: unit.methods.len(),
            attribute_count: unit.fields.len(),
            dependencies_in: Vec::new(),
            dependencies_out: Vec::new(),
            in_degree: 0,
            out_degree: 0,
        };

        debug!(
            class = %metrics.qualified_name,
            loc = metrics.loc,
            wmc = metrics.wmc,
            cbo = metrics.cbo,
            rfc = metrics.rfc,
            lcom = metrics.lcom,
            "computed CK metrics"
        );
        metrics
    }
}

/// Sum of cyclomatic complexity over methods and constructors.
pub fn weighted_methods(unit: &SourceUnit) -> usize {
    unit.callables()
        .map(|m| m.body.control_flow.cyclomatic_complexity())
        .sum()
}

/// Local view: only the `extends` clause of the class itself is visible.
pub fn depth_of_inheritance(unit: &SourceUnit) -> usize {
    usize::from(unit.superclass.is_some())
}

/// Distinct external types the class is coupled to, by primary name.
///
/// Counted from field types, method and constructor signatures, and `new`
/// targets anywhere in the class.
pub fn coupled_types(unit: &SourceUnit) -> BTreeSet<String> {
    let resolver = TypeResolver::new(unit);

    let signatures = unit.fields.iter().map(|f| f.type_name.as_str()).chain(
        unit.callables().flat_map(|m| {
            m.parameters
                .iter()
                .map(|p| p.type_name.as_str())
                .chain(m.return_type.as_deref())
        }),
    );
    let instantiations = unit
        .bodies()
        .flat_map(|b| b.instantiations.iter().map(String::as_str));

    signatures
        .chain(instantiations)
        .filter_map(|raw| resolver.resolve(raw))
        .map(|t| t.primary().to_string())
        .collect()
}

/// Own methods and constructors plus the distinct names of methods
/// invoked on another receiver.
pub fn response_for_class(unit: &SourceUnit) -> usize {
    let invoked: BTreeSet<&str> = unit
        .callables()
        .flat_map(|m| m.body.external_calls())
        .map(|c| c.name.as_str())
        .collect();

    unit.methods.len() + unit.constructors.len() + invoked.len()
}

/// LCOM over method pairs: pairs sharing no field minus pairs sharing one,
/// floored at zero. Constructors take no part.
pub fn lack_of_cohesion(unit: &SourceUnit) -> f64 {
    let uses: Vec<BTreeSet<&str>> = unit
        .methods
        .iter()
        .map(|m| m.body.field_refs.iter().map(String::as_str).collect())
        .collect();

    if uses.len() <= 1 {
        return 0.0;
    }

    let mut disjoint = 0i64;
    let mut sharing = 0i64;
    for (i, a) in uses.iter().enumerate() {
        for b in &uses[i + 1..] {
            if a.is_disjoint(b) {
                disjoint += 1;
            } else {
                sharing += 1;
            }
        }
    }

    (disjoint - sharing).max(0) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        BodyFacts, CallScope, CallSite, ControlFlowInfo, Field, Import, Method, Parameter, Span,
    };

    fn method(name: &str, params: &[(&str, &str)], ret: &str, body: BodyFacts) -> Method {
        Method {
            name: name.to_string(),
            parameters: params.iter().map(|(n, t)| Parameter::new(n, t)).collect(),
            return_type: Some(ret.to_string()),
            span: Span::lines(1, 3),
            body,
        }
    }

    fn uses(fields: &[&str]) -> BodyFacts {
        BodyFacts {
            field_refs: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    fn field(name: &str, type_name: &str) -> Field {
        Field {
            name: name.to_string(),
            type_name: type_name.to_string(),
            line: 2,
        }
    }

    #[test]
    fn test_empty_class() {
        let mut unit = SourceUnit::new("Empty.java", Some("p"), "Empty");
        unit.span = Span::lines(3, 5);

        let m = CkMetricsExtractor::new().extract(&unit);
        assert_eq!(m.loc, 3);
        assert_eq!(m.wmc, 0);
        assert_eq!(m.lcom, 0.0);
        assert_eq!(m.rfc, 0);
        assert_eq!(m.dit, 0);
        assert_eq!(m.noc, 0);
    }

    #[test]
    fn test_wmc_sums_methods_and_constructors() {
        let mut unit = SourceUnit::new("A.java", Some("p"), "A");
        let branchy = BodyFacts {
            control_flow: ControlFlowInfo {
                if_count: 2,
                case_count: 3,
                ..Default::default()
            },
            ..Default::default()
        };
        unit.methods.push(method("a", &[], "void", branchy));
        unit.methods.push(method("b", &[], "void", BodyFacts::default()));
        unit.constructors.push(Method {
            return_type: None,
            ..method("A", &[], "", BodyFacts::default())
        });

        // (1 + 5) + 1 + 1
        assert_eq!(weighted_methods(&unit), 8);
    }

    #[test]
    fn test_cbo_ignores_primitives_and_lang_types() {
        let mut unit = SourceUnit::new("A.java", Some("p"), "A");
        unit.fields.push(field("count", "int"));
        unit.fields.push(field("active", "boolean"));
        unit.fields.push(field("name", "String"));
        unit.methods.push(method(
            "rename",
            &[("name", "String")],
            "boolean",
            BodyFacts::default(),
        ));
        assert_eq!(coupled_types(&unit).len(), 0);
    }

    #[test]
    fn test_cbo_counts_distinct_types() {
        let mut unit = SourceUnit::new("A.java", Some("p"), "A");
        unit.imports.push(Import::single("java.util.List"));
        unit.fields.push(field("orders", "List<Order>"));
        unit.fields.push(field("repo", "Repo"));
        unit.methods.push(method(
            "find",
            &[("id", "long")],
            "Order",
            BodyFacts {
                instantiations: vec!["Repo".to_string(), "A".to_string()],
                ..Default::default()
            },
        ));
        unit.constructors.push(Method {
            return_type: None,
            ..method("A", &[("clock", "Clock")], "", BodyFacts::default())
        });

        let types: Vec<_> = coupled_types(&unit).into_iter().collect();
        assert_eq!(types, vec!["java.util.List", "p.Clock", "p.Order", "p.Repo"]);
    }

    #[test]
    fn test_rfc() {
        let mut unit = SourceUnit::new("A.java", Some("p"), "A");
        let body = BodyFacts {
            calls: vec![
                CallSite::new("helper", CallScope::Implicit),
                CallSite::new("save", CallScope::Name("repo".to_string())),
                CallSite::new("save", CallScope::Path("this.repo".to_string())),
                CallSite::new("size", CallScope::Expression),
                CallSite::new("helper", CallScope::This),
            ],
            ..Default::default()
        };
        unit.methods.push(method("run", &[], "void", body));
        unit.methods.push(method("helper", &[], "void", BodyFacts::default()));

        // 2 own + {save, size}
        assert_eq!(response_for_class(&unit), 4);
    }

    #[test]
    fn test_lcom() {
        let mut unit = SourceUnit::new("A.java", Some("p"), "A");
        unit.methods.push(method("a", &[], "void", uses(&["x"])));
        unit.methods.push(method("b", &[], "void", uses(&["x", "y"])));
        unit.methods.push(method("c", &[], "void", uses(&["z"])));
        unit.methods.push(method("d", &[], "void", uses(&[])));

        // sharing: (a,b); disjoint: (a,c) (a,d) (b,c) (b,d) (c,d)
        assert_eq!(lack_of_cohesion(&unit), 4.0);
    }

    #[test]
    fn test_lcom_cohesive_class_floors_at_zero() {
        let mut unit = SourceUnit::new("A.java", Some("p"), "A");
        unit.methods.push(method("a", &[], "void", uses(&["x"])));
        unit.methods.push(method("b", &[], "void", uses(&["x"])));
        unit.methods.push(method("c", &[], "void", uses(&["x"])));
        assert_eq!(lack_of_cohesion(&unit), 0.0);
    }

    #[test]
    fn test_dit_is_local() {
        let mut unit = SourceUnit::new("A.java", Some("p"), "A");
        assert_eq!(depth_of_inheritance(&unit), 0);
        unit.superclass = Some("Base".to_string());
        assert_eq!(depth_of_inheritance(&unit), 1);
    }
}
