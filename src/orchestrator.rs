//! Batch orchestration.
//!
//! Per-unit extraction (CK metrics, dependencies, smells) runs on the rayon
//! pool. Results are folded in path order, then the project-wide pass runs
//! once and its NOC and degree values are merged back.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analysis::{ProjectLoader, SourceUnit};
use crate::config::{validate, AnalysisConfig};
use crate::detect::SmellDetector;
use crate::error::{AnalysisError, FileFailure, Result};
use crate::metrics::{
    CkMetricsExtractor, ClassLinks, DependencyGraphExtractor, GlobalMetricsService,
};
use crate::report::{AnalysisReport, BatchCounts, ClassReport, RevisionId};

/// Runs the whole analysis over a batch of source units.
pub struct AnalysisOrchestrator {
    config: AnalysisConfig,
    ck: CkMetricsExtractor,
    dependencies: DependencyGraphExtractor,
    smells: SmellDetector,
    global: GlobalMetricsService,
}

/// What the per-unit pass produced for one unit.
enum UnitOutcome {
    Analyzed {
        path: String,
        report: ClassReport,
        links: ClassLinks,
    },
    Skipped(String),
}

impl AnalysisOrchestrator {
    pub fn new(config: AnalysisConfig) -> Self {
        let smells = SmellDetector::new(config.smells.clone());
        Self {
            config,
            ck: CkMetricsExtractor::new(),
            dependencies: DependencyGraphExtractor::new(),
            smells,
            global: GlobalMetricsService::new(),
        }
    }

    /// Load every source file under `root` and analyze it.
    ///
    /// Files are read lazily, after the configuration has been validated.
    pub fn run_path<P: AsRef<Path>>(&self, root: P, revision: RevisionId) -> Result<AnalysisReport> {
        let loader = ProjectLoader::new(root).with_config(&self.config);
        info!(root = %loader.root().display(), revision = %revision, "loading project");
        self.run(loader, revision)
    }

    /// Analyze a batch of already loaded units.
    ///
    /// Failed units are recorded in the report. Only a batch without a single
    /// analyzable class is an error.
    pub fn run<I>(&self, units: I, revision: RevisionId) -> Result<AnalysisReport>
    where
        I: IntoIterator<Item = Result<SourceUnit>>,
    {
        validate(&self.config)?;
        let deadline = self.config.timeout().map(|t| Instant::now() + t);
        self.run_until(units, revision, deadline)
    }

    fn run_until<I>(
        &self,
        units: I,
        revision: RevisionId,
        deadline: Option<Instant>,
    ) -> Result<AnalysisReport>
    where
        I: IntoIterator<Item = Result<SourceUnit>>,
    {
        let started = Instant::now();
        let mut failures = Vec::new();
        let mut loaded = Vec::new();
        let mut files_scanned = 0;

        for unit in units {
            files_scanned += 1;
            match unit {
                Ok(unit) => loaded.push(unit),
                Err(err) => {
                    warn!("skipping file: {}", err);
                    failures.push(FileFailure::from(&err));
                }
            }
        }
        loaded.sort_by(|a, b| a.path.cmp(&b.path));

        let outcomes: Vec<UnitOutcome> = if self.config.parallel {
            loaded
                .par_iter()
                .map(|unit| self.analyze_unit(unit, deadline))
                .collect()
        } else {
            loaded
                .iter()
                .map(|unit| self.analyze_unit(unit, deadline))
                .collect()
        };

        // Fold in path order so the first declaration of a name wins.
        let mut classes: BTreeMap<String, ClassReport> = BTreeMap::new();
        let mut origins: BTreeMap<String, String> = BTreeMap::new();
        let mut links = Vec::new();
        let mut skipped = Vec::new();

        for outcome in outcomes {
            match outcome {
                UnitOutcome::Skipped(path) => skipped.push(path),
                UnitOutcome::Analyzed {
                    path,
                    report,
                    links: class_links,
                } => {
                    let name = report.metrics.qualified_name.clone();
                    if let Some(first) = origins.get(&name) {
                        let err = AnalysisError::extraction(
                            &path,
                            format!("class {} already declared in {}", name, first),
                        );
                        warn!("skipping file: {}", err);
                        failures.push(FileFailure::from(&err));
                        continue;
                    }
                    origins.insert(name.clone(), path);
                    classes.insert(name, report);
                    links.push(class_links);
                }
            }
        }

        let incomplete = !skipped.is_empty();
        if incomplete {
            warn!(skipped = skipped.len(), "deadline reached, batch is incomplete");
        }

        if classes.is_empty() {
            return Err(AnalysisError::EmptyBatch {
                failures: failures.len(),
            });
        }

        let global = self.global.compute(&links);
        for class in classes.values_mut() {
            global.apply(&mut class.metrics);
        }

        let counts = BatchCounts {
            files_scanned,
            classes_found: classes.len(),
            edges_found: classes.values().map(|c| c.dependencies.len()).sum(),
            smells_found: classes.values().map(|c| c.smells.len()).sum(),
        };

        info!(
            revision = %revision,
            files = counts.files_scanned,
            classes = counts.classes_found,
            edges = counts.edges_found,
            smells = counts.smells_found,
            failures = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis complete"
        );

        Ok(AnalysisReport {
            revision,
            classes,
            counts,
            failures,
            skipped,
            ambiguities: global.ambiguities,
            thresholds: self.config.smells.clone(),
            incomplete,
        })
    }

    fn analyze_unit(&self, unit: &SourceUnit, deadline: Option<Instant>) -> UnitOutcome {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return UnitOutcome::Skipped(unit.path.clone());
        }

        let metrics = self.ck.extract(unit);
        let dependencies = self.dependencies.extract(unit);
        let smells = self.smells.detect(unit, &metrics);
        let links = ClassLinks::from_unit(unit, dependencies.clone());
        debug!(path = %unit.path, class = %metrics.qualified_name, "analyzed unit");

        UnitOutcome::Analyzed {
            path: unit.path.clone(),
            report: ClassReport {
                metrics,
                dependencies,
                smells,
            },
            links,
        }
    }
}

impl Default for AnalysisOrchestrator {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
