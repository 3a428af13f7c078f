//! Core types for smell findings.

use serde::{Deserialize, Serialize};

/// The smell heuristics the detector knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SmellKind {
    #[serde(rename = "god_class")]
    GodClass,
    #[serde(rename = "long_method")]
    LongMethod,
    #[serde(rename = "long_parameter_list")]
    LongParameterList,
    #[serde(rename = "data_class")]
    DataClass,
    #[serde(rename = "feature_envy")]
    FeatureEnvy,
}

impl SmellKind {
    pub const ALL: [SmellKind; 5] = [
        SmellKind::GodClass,
        SmellKind::LongMethod,
        SmellKind::LongParameterList,
        SmellKind::DataClass,
        SmellKind::FeatureEnvy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SmellKind::GodClass => "god_class",
            SmellKind::LongMethod => "long_method",
            SmellKind::LongParameterList => "long_parameter_list",
            SmellKind::DataClass => "data_class",
            SmellKind::FeatureEnvy => "feature_envy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "god_class" => Some(SmellKind::GodClass),
            "long_method" => Some(SmellKind::LongMethod),
            "long_parameter_list" => Some(SmellKind::LongParameterList),
            "data_class" => Some(SmellKind::DataClass),
            "feature_envy" => Some(SmellKind::FeatureEnvy),
            _ => None,
        }
    }
}

impl std::fmt::Display for SmellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One observed value checked against its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub metric: String,
    pub observed: f64,
    pub threshold: f64,
}

impl Measurement {
    pub fn new(metric: &str, observed: impl Into<f64>, threshold: impl Into<f64>) -> Self {
        Self {
            metric: metric.to_string(),
            observed: observed.into(),
            threshold: threshold.into(),
        }
    }

    /// Shorthand for the common integer case.
    pub fn count(metric: &str, observed: usize, threshold: usize) -> Self {
        Self::new(metric, observed as f64, threshold as f64)
    }
}

/// A single detected smell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmellResult {
    pub kind: SmellKind,
    pub class_name: String,
    /// Method or constructor name for member-level smells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    /// 1-based line the smell is reported at.
    pub line: usize,
    pub details: String,
    #[serde(default)]
    pub evidence: Vec<Measurement>,
}
