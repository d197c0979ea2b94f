//! Project module for looking at many scanned files together.
//!
//! A Project holds the scan result of every file it was given and answers
//! questions across them:
//! - Every directive, in file then source order
//! - Which files include a given literal target
//! - All diagnostics
//!
//! The Project is immutable - all mutations return new instances.

use std::rc::Rc;

use crate::argument::DirectiveTarget;
use crate::diagnostic::Diagnostic;
use crate::dialect::Dialect;
use crate::directive::Directive;
use crate::scan::{ScanResult, Scanner};

/// One scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub dialect: String,
    pub source: String,
    pub result: ScanResult,
}

impl SourceFile {
    /// Scan `source` and keep it alongside its result.
    pub fn scan(path: impl Into<String>, source: impl Into<String>, scanner: &Scanner) -> Self {
        let source = source.into();
        let result = scanner.scan(&source);
        Self {
            path: path.into(),
            dialect: scanner.dialect().name.clone(),
            source,
            result,
        }
    }
}

/// A directive together with the file it came from.
#[derive(Debug, Clone, Copy)]
pub struct FileDirective<'p> {
    pub path: &'p str,
    pub directive: &'p Directive,
}

/// A collection of scanned files.
///
/// Project is designed to be immutable - use `with_file()` and
/// `without_file()` to create modified copies. Files are stored in `Rc` for
/// efficient cloning.
#[derive(Debug, Clone, Default)]
pub struct Project {
    files: Vec<Rc<SourceFile>>,
}

impl Project {
    /// Create an empty project.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add or replace a file. A file with the same path is replaced in place.
    pub fn with_file(&self, file: SourceFile) -> Self {
        let mut files = self.files.clone();
        let file = Rc::new(file);

        if let Some(pos) = files.iter().position(|f| f.path == file.path) {
            files[pos] = file;
        } else {
            files.push(file);
        }

        Self { files }
    }

    /// Remove a file by path.
    pub fn without_file(&self, path: &str) -> Self {
        let files = self
            .files
            .iter()
            .filter(|f| f.path != path)
            .cloned()
            .collect();

        Self { files }
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    pub fn get_file(&self, path: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path == path).map(|rc| &**rc)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().map(|rc| &**rc)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Every directive, in file order then source order.
    pub fn directives(&self) -> impl Iterator<Item = FileDirective<'_>> {
        self.files().flat_map(|file| {
            file.result.directives.iter().map(move |directive| FileDirective {
                path: &file.path,
                directive,
            })
        })
    }

    /// Every diagnostic with the path it belongs to.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &Diagnostic)> {
        self.files()
            .flat_map(|file| file.result.diagnostics.iter().map(move |d| (file.path.as_str(), d)))
    }

    pub fn has_errors(&self) -> bool {
        self.files().any(|f| f.result.has_errors())
    }

    /// Paths of files with a literal directive pointing at `target`.
    ///
    /// A literal matches when it equals `target` or ends with `/target`.
    /// Dynamic arguments never match.
    pub fn dependents_of(&self, target: &str) -> Vec<&str> {
        let suffix = format!("/{target}");
        let mut paths: Vec<&str> = Vec::new();

        for fd in self.directives() {
            let hit = match fd.directive.target() {
                DirectiveTarget::Static { path } => path == target || path.ends_with(&suffix),
                DirectiveTarget::Remote { url } => url == target,
                _ => false,
            };
            if hit && !paths.contains(&fd.path) {
                paths.push(fd.path);
            }
        }

        paths
    }
}

/// Builder for creating projects.
pub struct ProjectBuilder {
    files: Vec<SourceFile>,
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add an already scanned file.
    pub fn add_file(mut self, file: SourceFile) -> Self {
        self.files.push(file);
        self
    }

    /// Scan `source` with `dialect` and add it.
    pub fn add_source(
        self,
        path: impl Into<String>,
        source: impl Into<String>,
        dialect: &Dialect,
    ) -> Self {
        let scanner = Scanner::new(dialect.clone());
        self.add_file(SourceFile::scan(path, source, &scanner))
    }

    pub fn build(self) -> Project {
        self.files
            .into_iter()
            .fold(Project::new(), |project, file| project.with_file(file))
    }
}
