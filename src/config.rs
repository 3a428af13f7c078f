//! Analysis configuration.
//!
//! Configuration is read from YAML. Every field is optional; missing fields
//! fall back to the defaults below.
//!
//! ```yaml
//! smells:
//!   god_class_loc: 500
//!   long_parameter_list: 5
//! excluded_paths:
//!   - "**/generated/**"
//! timeout_secs: 120
//! ```

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::AnalysisError;

/// Top-level configuration for one analysis run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Thresholds for smell detection.
    #[serde(default)]
    pub smells: SmellThresholds,
    /// Glob patterns for paths to exclude when loading a project directory.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Whether test sources are loaded (default: false)
    #[serde(default)]
    pub include_test_files: Option<bool>,
    /// Overall time budget for the per-file pass, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Run per-file extraction on the rayon pool (default: true)
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smells: SmellThresholds::default(),
            excluded_paths: Vec::new(),
            include_test_files: None,
            timeout_secs: None,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load and validate a configuration file, mapping failures to a typed error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let config = Self::parse_file(path.as_ref()).map_err(|e| {
            AnalysisError::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        validate(&config)?;
        Ok(config)
    }

    /// Returns whether to include test files (defaults to false).
    pub fn should_include_test_files(&self) -> bool {
        self.include_test_files.unwrap_or(false)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

}

/// Compile exclusion patterns into a single matcher.
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet, AnalysisError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            AnalysisError::Config(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| AnalysisError::Config(format!("invalid excluded_paths: {}", e)))
}

/// Thresholds for the smell heuristics.
///
/// Detection logic never falls back to literals; every comparison reads
/// one of these values.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SmellThresholds {
    /// God Class: class LOC must exceed this
    pub god_class_loc: usize,
    /// God Class: WMC must exceed this
    pub god_class_wmc: usize,
    /// God Class: CBO must exceed this
    pub god_class_cbo: usize,
    /// Long Method: method LOC must exceed this
    pub long_method_loc: usize,
    /// Long Parameter List: parameter count must exceed this
    pub long_parameter_list: usize,
    /// Data Class: maximum number of accessor methods
    pub data_class_max_methods: usize,
    /// Feature Envy: share of external calls must exceed this
    pub feature_envy_ratio: f64,
    /// Feature Envy: external call count must exceed this
    pub feature_envy_min_external_calls: usize,
}

impl Default for SmellThresholds {
    fn default() -> Self {
        Self {
            god_class_loc: 500,
            god_class_wmc: 50,
            god_class_cbo: 10,
            long_method_loc: 50,
            long_parameter_list: 5,
            data_class_max_methods: 10,
            feature_envy_ratio: 0.5,
            feature_envy_min_external_calls: 3,
        }
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &AnalysisConfig) -> Result<(), AnalysisError> {
    let ratio = config.smells.feature_envy_ratio;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(AnalysisError::Config(format!(
            "feature_envy_ratio must be within [0, 1], got {}",
            ratio
        )));
    }

    if config.smells.data_class_max_methods == 0 {
        return Err(AnalysisError::Config(
            "data_class_max_methods must be at least 1".to_string(),
        ));
    }

    if config.timeout_secs == Some(0) {
        return Err(AnalysisError::Config(
            "timeout_secs must be positive when set".to_string(),
        ));
    }

    build_glob_set(&config.excluded_paths)?;

    Ok(())
}
