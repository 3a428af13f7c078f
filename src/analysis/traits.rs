//! Core traits for language analysis.

use std::path::Path;

use super::{SourceUnit, Span};
use crate::error::AnalysisError;

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// This is kept separate from SourceUnit so the tree can be inspected
/// (syntax errors, positions) before facts are pulled out of it.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// Source bytes, kept for node text extraction.
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Location of the first ERROR or MISSING node, if the tree has any.
    pub fn first_error(&self) -> Option<Span> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return None;
        }

        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            if node.is_error() || node.is_missing() {
                return Some(Span::from_node(node));
            }
            // Only descend into subtrees that contain the error.
            if node.has_error() && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Some(Span::from_node(root));
                }
            }
        }
    }
}

/// Language-specific analyzer trait.
///
/// # Thread Safety
///
/// Note: tree_sitter::Parser is not Sync, so implementations should
/// create parsers as needed or use thread-local storage.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "java").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a source file into a tree-sitter tree.
    ///
    /// Partial parse errors are still returned as a valid tree with ERROR nodes.
    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile>;

    /// Build the source unit for the file's analyzed class.
    ///
    /// Fails when the file declares nothing the engine can measure.
    fn extract_unit(&self, parsed: &ParsedFile) -> anyhow::Result<SourceUnit>;

    /// Check if this analyzer handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

/// Parse and extract one file, mapping failures onto the per-file error kinds.
///
/// A tree containing syntax errors is rejected as a whole rather than
/// analyzed partially.
pub fn analyze_source(
    analyzer: &dyn LanguageAnalyzer,
    path: &Path,
    source: &[u8],
) -> Result<SourceUnit, AnalysisError> {
    let display = path.to_string_lossy().to_string();

    let parsed = analyzer
        .parse(path, source)
        .map_err(|e| AnalysisError::parse(&display, e.to_string()))?;

    if let Some(span) = parsed.first_error() {
        return Err(AnalysisError::parse(
            &display,
            format!("syntax error at {}", span),
        ));
    }

    analyzer
        .extract_unit(&parsed)
        .map_err(|e| AnalysisError::extraction(&display, e.to_string()))
}
