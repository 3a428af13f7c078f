//! Filesystem-backed source loading.
//!
//! [`ProjectLoader`] walks a directory, filters it by extension, exclusion
//! globs and the test-file policy, then parses every file on the rayon
//! pool. Each file yields its own `Result`, so one unreadable or broken file
//! never hides the others.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::languages::{get_analyzer, registered_extensions};
use super::traits::analyze_source;
use super::SourceUnit;
use crate::config::{build_glob_set, AnalysisConfig};
use crate::error::AnalysisError;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["target", "build", "out", "node_modules", "vendor"];

/// Loads every analyzable source file under a root directory.
pub struct ProjectLoader {
    root: PathBuf,
    excluded_paths: Vec<String>,
    include_test_files: bool,
    parallel: bool,
}

impl ProjectLoader {
    /// Create a loader with the default policy (test sources skipped).
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            excluded_paths: Vec::new(),
            include_test_files: false,
            parallel: true,
        }
    }

    /// Take exclusions, the test-file policy and parallelism from a config.
    pub fn with_config(mut self, config: &AnalysisConfig) -> Self {
        self.excluded_paths = config.excluded_paths.clone();
        self.include_test_files = config.should_include_test_files();
        self.parallel = config.parallel;
        self
    }

    /// Set whether test sources are loaded.
    pub fn include_test_files(mut self, include: bool) -> Self {
        self.include_test_files = include;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collect candidate files, sorted by path.
    ///
    /// Walk errors are returned alongside the files rather than aborting.
    pub fn collect_files(&self) -> (Vec<PathBuf>, Vec<AnalysisError>) {
        let extensions = registered_extensions();
        let excluded = match build_glob_set(&self.excluded_paths) {
            Ok(set) => set,
            Err(err) => return (Vec::new(), vec![err]),
        };

        let mut files = Vec::new();
        let mut errors = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !SKIPPED_DIRS.contains(&&*name)
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(self.root.as_path()).to_path_buf();
                    errors.push(AnalysisError::io(path, e.into()));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !extensions.iter().any(|known| known == ext) {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if excluded.is_match(relative) {
                debug!(path = %relative.display(), "excluded by pattern");
                continue;
            }
            if !self.include_test_files && is_test_source(relative) {
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        (files, errors)
    }

    /// Read and parse a single file.
    pub fn load_file(&self, path: &Path) -> Result<SourceUnit, AnalysisError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let analyzer = get_analyzer(ext).ok_or_else(|| {
            AnalysisError::extraction(path.to_string_lossy(), "unsupported file type")
        })?;

        let source = fs::read(path).map_err(|e| AnalysisError::io(path, e))?;
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        analyze_source(analyzer, relative, &source)
    }

    /// Load every file under the root, one result per file, in path order.
    pub fn load(&self) -> Vec<Result<SourceUnit, AnalysisError>> {
        let (files, walk_errors) = self.collect_files();
        debug!(root = %self.root.display(), files = files.len(), "collected source files");

        let loaded: Vec<_> = if self.parallel {
            files.par_iter().map(|p| self.load_file(p)).collect()
        } else {
            files.iter().map(|p| self.load_file(p)).collect()
        };

        for err in loaded.iter().filter_map(|r| r.as_ref().err()) {
            warn!("{}", err);
        }

        walk_errors.into_iter().map(Err).chain(loaded).collect()
    }
}

impl IntoIterator for ProjectLoader {
    type Item = Result<SourceUnit, AnalysisError>;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.load().into_iter()
    }
}

/// Test sources: anything under `src/test/`, or `*Test.java` / `*Tests.java`.
pub fn is_test_source(path: &Path) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");
    if normalized.starts_with("src/test/") || normalized.contains("/src/test/") {
        return true;
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    stem.ends_with("Test") || stem.ends_with("Tests")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/main/java/app/Order.java",
            "package app;\npublic class Order {}\n",
        );
        write(
            dir.path(),
            "src/main/java/app/Broken.java",
            "package app;\npublic class Broken { void x( }\n",
        );
        write(
            dir.path(),
            "src/test/java/app/OrderTest.java",
            "package app;\npublic class OrderTest {}\n",
        );
        write(
            dir.path(),
            "src/main/java/app/generated/Stub.java",
            "package app.generated;\npublic class Stub {}\n",
        );
        write(dir.path(), "README.md", "# not java\n");
        dir
    }

    #[test]
    fn test_is_test_source() {
        assert!(is_test_source(Path::new("src/test/java/app/Foo.java")));
        assert!(is_test_source(Path::new("module/src/test/java/Foo.java")));
        assert!(is_test_source(Path::new("src/main/java/FooTest.java")));
        assert!(!is_test_source(Path::new("src/main/java/Testing.java")));
    }

    #[test]
    fn test_collect_files_applies_policy() {
        let dir = fixture();
        let config = AnalysisConfig {
            excluded_paths: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        let loader = ProjectLoader::new(dir.path()).with_config(&config);
        let (files, errors) = loader.collect_files();

        assert!(errors.is_empty());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Broken.java", "Order.java"]);
    }

    #[test]
    fn test_invalid_exclusion_is_config_error() {
        let dir = fixture();
        let config = AnalysisConfig {
            excluded_paths: vec!["**/generated/**".to_string(), "src/[".to_string()],
            ..Default::default()
        };
        let (files, errors) = ProjectLoader::new(dir.path()).with_config(&config).collect_files();

        assert!(files.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], AnalysisError::Config(_)));
    }

    #[test]
    fn test_include_test_files() {
        let dir = fixture();
        let loader = ProjectLoader::new(dir.path()).include_test_files(true);
        let (files, _) = loader.collect_files();
        assert!(files.iter().any(|p| p.ends_with("OrderTest.java")));
    }

    #[test]
    fn test_load_keeps_failures_per_file() {
        let dir = fixture();
        let results: Vec<_> = ProjectLoader::new(dir.path()).into_iter().collect();

        // Broken, Order and generated Stub (no exclusions configured)
        assert_eq!(results.len(), 3);
        let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], AnalysisError::ParseFailure { .. }));

        let order = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .find(|u| u.class_name == "Order")
            .unwrap();
        assert_eq!(order.qualified_name(), "app.Order");
        assert_eq!(order.path, "src/main/java/app/Order.java");
    }
}
