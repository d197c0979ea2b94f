//! The scan entry point: classify, then extract.

use crate::classifier::{Classifier, LexicalRegion};
use crate::diagnostic::Diagnostic;
use crate::dialect::Dialect;
use crate::directive::{Directive, extract};

/// Everything one scan produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanResult {
    pub regions: Vec<LexicalRegion>,
    pub directives: Vec<Directive>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A physical line of comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommentLine {
    pub line: u32,
    pub text: String,
}

impl ScanResult {
    pub fn code_regions(&self) -> impl Iterator<Item = &LexicalRegion> {
        self.regions.iter().filter(|r| r.kind.is_code())
    }

    pub fn comment_regions(&self) -> impl Iterator<Item = &LexicalRegion> {
        self.regions.iter().filter(|r| r.kind.is_comment())
    }

    /// The region containing byte `offset`, if any.
    pub fn region_at(&self, offset: usize) -> Option<&LexicalRegion> {
        let idx = self.regions.partition_point(|r| r.span.end <= offset);
        self.regions.get(idx).filter(|r| r.span.start <= offset)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// True if the regions tile `[0, len)` exactly, in order.
    pub fn covers(&self, len: usize) -> bool {
        let mut expected = 0;
        for region in &self.regions {
            if region.span.start != expected || region.span.is_empty() {
                return false;
            }
            expected = region.span.end;
        }
        expected == len
    }

    /// Comment text split into physical lines, line terminators removed.
    ///
    /// `src` must be the text this result was scanned from.
    pub fn comment_lines(&self, src: &str) -> Vec<CommentLine> {
        let mut lines = Vec::new();
        for region in self.comment_regions() {
            let mut line = region.span.line;
            for text in split_lines(region.span.text(src)) {
                lines.push(CommentLine {
                    line,
                    text: text.to_string(),
                });
                line += 1;
            }
        }
        lines
    }
}

/// Split on `\r\n`, `\r` and `\n`.
fn split_lines(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' | b'\n' => {
                out.push(&text[start..i]);
                if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    out.push(&text[start..]);
    out
}

/// A configured scanner. Cheap to reuse across many inputs.
#[derive(Debug, Clone)]
pub struct Scanner {
    dialect: Dialect,
    classifier: Classifier,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

impl Scanner {
    pub fn new(dialect: Dialect) -> Self {
        let classifier = Classifier::new(&dialect);
        Self {
            dialect,
            classifier,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(dialect = %self.dialect.name, len = src.len())
    )]
    pub fn scan(&self, src: &str) -> ScanResult {
        let classification = self.classifier.classify(src);
        let extraction = extract(src, &classification.regions, &self.dialect);

        let mut diagnostics = classification.diagnostics;
        diagnostics.extend(extraction.diagnostics);
        diagnostics.sort_by_key(|d| d.span.start);

        tracing::debug!(
            regions = classification.regions.len(),
            directives = extraction.directives.len(),
            diagnostics = diagnostics.len(),
            "scan finished"
        );

        ScanResult {
            regions: classification.regions,
            directives: extraction.directives,
            diagnostics,
        }
    }
}

/// Scan `src` with `dialect`.
pub fn scan(src: &str, dialect: &Dialect) -> ScanResult {
    Scanner::new(dialect.clone()).scan(src)
}
