//! Fuzzy search over the directives of a project.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::directive::DirectiveKind;
use crate::project::Project;

/// A directive whose argument matched a search query.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectiveSearchResult {
    /// Path of the file containing the directive
    pub path: String,
    pub kind: DirectiveKind,
    /// Verbatim argument text
    pub argument: String,
    pub line: u32,
    pub column: u32,
    /// Raw fuzzy match score (higher is better)
    pub score: i64,
    /// Indices of matched characters in the argument
    pub match_indices: Vec<usize>,
}

impl Project {
    /// Search directive arguments across all files.
    ///
    /// Returns every directive if query is empty. Results are sorted by score
    /// (highest first); ties keep file and source order. Search is
    /// case-insensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use incscan_core::{Dialect, ProjectBuilder};
    /// let project = ProjectBuilder::new()
    ///     .add_source("index.php", "require_once 'config.php';", &Dialect::php())
    ///     .build();
    /// let results = project.search_directives("conf");
    /// assert_eq!(results[0].argument, "'config.php'");
    /// ```
    pub fn search_directives(&self, query: &str) -> Vec<DirectiveSearchResult> {
        let matcher = SkimMatcherV2::default().ignore_case();
        let query = query.trim();

        let mut results = Vec::new();

        for fd in self.directives() {
            let argument = &fd.directive.argument;

            let (score, match_indices) = if query.is_empty() {
                (0, vec![])
            } else if let Some(found) = matcher.fuzzy_indices(argument, query) {
                found
            } else {
                continue;
            };

            results.push(DirectiveSearchResult {
                path: fd.path.to_string(),
                kind: fd.directive.kind,
                argument: argument.clone(),
                line: fd.directive.span.line,
                column: fd.directive.span.column,
                score,
                match_indices,
            });
        }

        // Sort by score descending (highest first)
        results.sort_by(|a, b| b.score.cmp(&a.score));

        results
    }
}
