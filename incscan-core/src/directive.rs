//! Directive extraction.
//!
//! Walks the code regions produced by the classifier and picks out
//! `include`, `include_once`, `require` and `require_once` statements.
//! Keywords inside comments and strings are never seen, because only code
//! regions are searched for them.

use std::fmt;

use crate::argument::{DirectiveTarget, classify_target};
use crate::classifier::LexicalRegion;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::dialect::Dialect;
use crate::span::{PositionTracker, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DirectiveKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 4] = [
        DirectiveKind::Include,
        DirectiveKind::IncludeOnce,
        DirectiveKind::Require,
        DirectiveKind::RequireOnce,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            DirectiveKind::Include => "include",
            DirectiveKind::IncludeOnce => "include_once",
            DirectiveKind::Require => "require",
            DirectiveKind::RequireOnce => "require_once",
        }
    }

    /// Keyword lookup, ASCII case-insensitive.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.keyword().eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One extracted inclusion statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Argument source text, verbatim, without the statement terminator and
    /// without one pair of wrapping parentheses.
    pub argument: String,
    /// The keyword.
    pub span: SourceSpan,
    /// The argument text; may cross string regions.
    pub argument_span: SourceSpan,
    /// Whether the argument was written as `keyword(...)`.
    pub parenthesized: bool,
}

impl Directive {
    /// Classify the argument without resolving it.
    pub fn target(&self) -> DirectiveTarget {
        classify_target(&self.argument)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub directives: Vec<Directive>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract directives from `src`, searching only the code regions.
///
/// `regions` must be the classification of `src`.
#[tracing::instrument(level = "debug", skip_all, fields(regions = regions.len()))]
pub fn extract(src: &str, regions: &[LexicalRegion], dialect: &Dialect) -> Extraction {
    let mut extractor = Extractor {
        src,
        regions,
        closing_tag: dialect.closing_tag.as_deref().filter(|t| !t.is_empty()),
        tracker: PositionTracker::new(src),
        out: Extraction::default(),
    };
    if dialect.extract_directives {
        extractor.run();
    }
    extractor.out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

struct Extractor<'a> {
    src: &'a str,
    regions: &'a [LexicalRegion],
    closing_tag: Option<&'a str>,
    tracker: PositionTracker<'a>,
    out: Extraction,
}

impl Extractor<'_> {
    fn run(&mut self) {
        let mut cursor = 0;
        for idx in 0..self.regions.len() {
            let region = self.regions[idx];
            if !region.kind.is_code() || region.span.end <= cursor {
                continue;
            }
            let mut pos = region.span.start.max(cursor);
            while let Some((start, end)) = self.next_word(pos, region.span.end) {
                pos = end;
                let word = &self.src[start..end];
                let Some(kind) = DirectiveKind::from_keyword(word) else {
                    continue;
                };
                if self.is_member_access(region, start) {
                    continue;
                }
                pos = self.directive_at(idx, kind, start, end);
                cursor = pos;
            }
        }
    }

    /// Next whole identifier-like word in `[from, limit)`.
    fn next_word(&self, from: usize, limit: usize) -> Option<(usize, usize)> {
        if from >= limit {
            return None;
        }
        let text = &self.src[from..limit];
        let mut prev = self.src[..from].chars().next_back();
        let mut start = None;
        for (i, c) in text.char_indices() {
            let ident = is_ident_char(c);
            match start {
                None if ident && !prev.is_some_and(is_ident_char) => start = Some(from + i),
                Some(s) if !ident => return Some((s, from + i)),
                _ => {}
            }
            prev = Some(c);
        }
        start.map(|s| (s, limit))
    }

    /// `$obj->require(...)` and `Foo::include` are member names. Only code in
    /// the keyword's own region counts; a comment ending in `::` does not.
    fn is_member_access(&self, region: LexicalRegion, start: usize) -> bool {
        let before = self.src[region.span.start..start].trim_end();
        before.ends_with("->") || before.ends_with("::")
    }

    /// Record the directive whose keyword spans `[start, end)` and return the
    /// offset to resume searching from.
    fn directive_at(&mut self, idx: usize, kind: DirectiveKind, start: usize, end: usize) -> usize {
        self.tracker.advance_to(start);
        let keyword_span = SourceSpan::new(self.tracker.position(), end);

        let stop = self.argument_end(idx, end);
        let raw = &self.src[end..stop];
        let arg_start = end + (raw.len() - raw.trim_start().len());
        let arg_end = end + raw.trim_end().len();

        if arg_start >= arg_end || !self.plausible_operand(idx, arg_start, arg_end) {
            tracing::debug!(offset = start, keyword = kind.keyword(), "directive without argument");
            self.out.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedDirective,
                format!("`{}` is not followed by an argument", kind.keyword()),
                keyword_span,
            ));
            return end;
        }

        let (arg_start, arg_end, parenthesized) = match self.strip_parens(idx, arg_start, arg_end) {
            Some((s, e)) => (s, e, true),
            None => (arg_start, arg_end, false),
        };
        self.tracker.advance_to(arg_start);
        let argument_span = SourceSpan::new(self.tracker.position(), arg_end);

        self.out.directives.push(Directive {
            kind,
            argument: self.src[arg_start..arg_end].to_string(),
            span: keyword_span,
            argument_span,
            parenthesized,
        });
        stop
    }

    /// The argument holds something besides comments, and its first operand
    /// character cannot close or continue something else (`require;`,
    /// `require)`, `require = 1`).
    fn plausible_operand(&self, idx: usize, from: usize, to: usize) -> bool {
        let overlapping = self.regions[idx..]
            .iter()
            .skip_while(|r| r.span.end <= from)
            .take_while(|r| r.span.start < to);
        for region in overlapping {
            if region.kind.is_string() {
                return true;
            }
            if !region.kind.is_code() {
                continue;
            }
            let start = region.span.start.max(from);
            let end = region.span.end.min(to);
            let text = &self.src[start..end];
            if let Some(first) = text.trim_start().chars().next() {
                return !matches!(first, ';' | ')' | ',' | ']' | '}' | '=' | ':');
            }
        }
        false
    }

    fn region_containing(&self, offset: usize) -> Option<&LexicalRegion> {
        let idx = self
            .regions
            .partition_point(|r| r.span.end <= offset);
        self.regions.get(idx)
    }

    /// Code characters of `[from, to)`, starting the region walk at `idx`.
    fn code_chars(
        &self,
        idx: usize,
        from: usize,
        to: usize,
    ) -> impl Iterator<Item = (usize, char)> {
        let src = self.src;
        self.regions[idx..]
            .iter()
            .take_while(move |r| r.span.start < to)
            .filter(|r| r.kind.is_code())
            .flat_map(move |r| {
                let start = r.span.start.max(from);
                let end = r.span.end.min(to);
                let slice = if start < end { &src[start..end] } else { "" };
                slice.char_indices().map(move |(i, c)| (start + i, c))
            })
    }

    /// Statement end: `;`, the closing tag, an unmatched `)`, or end of input.
    fn argument_end(&self, idx: usize, from: usize) -> usize {
        let mut depth = 0usize;
        for (offset, c) in self.code_chars(idx, from, self.src.len()) {
            match c {
                ';' => return offset,
                '(' => depth += 1,
                ')' if depth == 0 => return offset,
                ')' => depth -= 1,
                _ => {
                    if let Some(tag) = self.closing_tag
                        && self.src[offset..].starts_with(tag)
                    {
                        return offset;
                    }
                }
            }
        }
        self.src.len()
    }

    /// If `[start, end)` is exactly one parenthesized group, the trimmed
    /// inside of it.
    fn strip_parens(&self, idx: usize, start: usize, end: usize) -> Option<(usize, usize)> {
        let text = &self.src[start..end];
        if !text.starts_with('(') || !text.ends_with(')') {
            return None;
        }
        let in_code = |offset| self.region_containing(offset).is_some_and(|r| r.kind.is_code());
        if !in_code(start) || !in_code(end - 1) {
            return None;
        }
        let mut depth = 0usize;
        for (offset, c) in self.code_chars(idx, start, end) {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if offset + 1 != end {
                            return None;
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return None;
        }
        let inner = &self.src[start + 1..end - 1];
        let s = start + 1 + (inner.len() - inner.trim_start().len());
        let e = start + 1 + inner.trim_end().len();
        (s < e).then_some((s, e))
    }
}
