//! Threshold-based code smell heuristics.
//!
//! - God class: large, complex and highly coupled, all at once
//! - Long method: too many lines
//! - Long parameter list: too many parameters on a method or constructor
//! - Data class: nothing but getters and setters
//! - Feature envy: a method mostly calling into other objects

use tracing::debug;

use crate::analysis::{Method, SourceUnit};
use crate::config::SmellThresholds;
use crate::metrics::ClassMetrics;

use super::{Measurement, SmellKind, SmellResult};

/// Detects smells in one class. Class-level size and coupling come from
/// its already computed [`ClassMetrics`].
#[derive(Debug, Clone)]
pub struct SmellDetector {
    thresholds: SmellThresholds,
}

impl Default for SmellDetector {
    fn default() -> Self {
        Self::new(SmellThresholds::default())
    }
}

impl SmellDetector {
    pub fn new(thresholds: SmellThresholds) -> Self {
        Self { thresholds }
    }

    pub fn detect(&self, unit: &SourceUnit, metrics: &ClassMetrics) -> Vec<SmellResult> {
        let mut smells = Vec::new();

        if let Some(smell) = self.god_class(unit, metrics) {
            smells.push(smell);
        }
        smells.extend(self.long_methods(unit));
        smells.extend(self.long_parameter_lists(unit));
        if let Some(smell) = self.data_class(unit) {
            smells.push(smell);
        }
        smells.extend(self.feature_envy(unit));

        debug!(class = %unit.qualified_name(), smells = smells.len(), "detected smells");
        smells
    }

    fn god_class(&self, unit: &SourceUnit, metrics: &ClassMetrics) -> Option<SmellResult> {
        let t = &self.thresholds;
        let is_god = metrics.loc > t.god_class_loc
            && metrics.wmc > t.god_class_wmc
            && metrics.cbo > t.god_class_cbo;
        if !is_god {
            return None;
        }

        Some(SmellResult {
            kind: SmellKind::GodClass,
            class_name: unit.class_name.clone(),
            member: None,
            line: unit.span.start_line,
            details: format!(
                "class has LOC={}, WMC={}, CBO={}, exceeds maximum of LOC={}, WMC={}, CBO={}",
                metrics.loc, metrics.wmc, metrics.cbo, t.god_class_loc, t.god_class_wmc, t.god_class_cbo
            ),
            evidence: vec![
                Measurement::count("loc", metrics.loc, t.god_class_loc),
                Measurement::count("wmc", metrics.wmc, t.god_class_wmc),
                Measurement::count("cbo", metrics.cbo, t.god_class_cbo),
            ],
        })
    }

    fn long_methods(&self, unit: &SourceUnit) -> Vec<SmellResult> {
        let max = self.thresholds.long_method_loc;
        unit.methods
            .iter()
            .filter(|m| m.loc() > max)
            .map(|m| {
                member_smell(
                    unit,
                    m,
                    SmellKind::LongMethod,
                    format!("method '{}' has {} lines, exceeds maximum of {}", m.name, m.loc(), max),
                    vec![Measurement::count("loc", m.loc(), max)],
                )
            })
            .collect()
    }

    fn long_parameter_lists(&self, unit: &SourceUnit) -> Vec<SmellResult> {
        let max = self.thresholds.long_parameter_list;
        unit.callables()
            .filter(|m| m.parameters.len() > max)
            .map(|m| {
                let count = m.parameters.len();
                member_smell(
                    unit,
                    m,
                    SmellKind::LongParameterList,
                    format!(
                        "'{}' takes {} parameters, exceeds maximum of {}",
                        m.name, count, max
                    ),
                    vec![Measurement::count("parameters", count, max)],
                )
            })
            .collect()
    }

    fn data_class(&self, unit: &SourceUnit) -> Option<SmellResult> {
        let count = unit.methods.len();
        let max = self.thresholds.data_class_max_methods;
        if count == 0 || count > max || !unit.methods.iter().all(is_accessor) {
            return None;
        }

        Some(SmellResult {
            kind: SmellKind::DataClass,
            class_name: unit.class_name.clone(),
            member: None,
            line: unit.span.start_line,
            details: format!(
                "class has only {} getter/setter method(s), at most {} allowed for a data class",
                count, max
            ),
            evidence: vec![Measurement::count("accessor_methods", count, max)],
        })
    }

    fn feature_envy(&self, unit: &SourceUnit) -> Vec<SmellResult> {
        let ratio_max = self.thresholds.feature_envy_ratio;
        let min_external = self.thresholds.feature_envy_min_external_calls;

        let mut smells = Vec::new();
        for method in &unit.methods {
            let external = method.body.external_calls().count();
            let internal = method.body.internal_calls().count();
            let total = external + internal;
            if total == 0 {
                continue;
            }

            let ratio = external as f64 / total as f64;
            if ratio > ratio_max && external > min_external {
                smells.push(member_smell(
                    unit,
                    method,
                    SmellKind::FeatureEnvy,
                    format!(
                        "method '{}' makes {} of {} calls on other objects (ratio {:.2}, maximum {:.2})",
                        method.name, external, total, ratio, ratio_max
                    ),
                    vec![
                        Measurement::new("external_ratio", ratio, ratio_max),
                        Measurement::count("external_calls", external, min_external),
                    ],
                ));
            }
        }
        smells
    }
}

fn member_smell(
    unit: &SourceUnit,
    method: &Method,
    kind: SmellKind,
    details: String,
    evidence: Vec<Measurement>,
) -> SmellResult {
    SmellResult {
        kind,
        class_name: unit.class_name.clone(),
        member: Some(method.name.clone()),
        line: method.span.start_line,
        details,
        evidence,
    }
}

/// `getX()`/`isX()` returning a value, or `setX(v)` returning void.
fn is_accessor(method: &Method) -> bool {
    let name = method.name.as_str();
    let getter = (name.starts_with("get") || name.starts_with("is"))
        && method.parameters.is_empty()
        && !method.returns_void();
    let setter = name.starts_with("set") && method.parameters.len() == 1 && method.returns_void();
    getter || setter
}
