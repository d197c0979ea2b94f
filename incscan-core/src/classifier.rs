//! Lexical classifier.
//!
//! A single forward pass that tags every byte of the input as code, comment
//! or string content. The output regions partition the input: they are
//! non-empty, in increasing offset order, and leave no gaps.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::dialect::Dialect;
use crate::span::{Position, PositionTracker, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RegionKind {
    Code,
    LineComment,
    BlockComment,
    SingleQuotedString,
    DoubleQuotedString,
}

impl RegionKind {
    pub fn is_code(self) -> bool {
        self == RegionKind::Code
    }

    pub fn is_comment(self) -> bool {
        matches!(self, RegionKind::LineComment | RegionKind::BlockComment)
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            RegionKind::SingleQuotedString | RegionKind::DoubleQuotedString
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegionKind::Code => "code",
            RegionKind::LineComment => "line-comment",
            RegionKind::BlockComment => "block-comment",
            RegionKind::SingleQuotedString => "single-quoted",
            RegionKind::DoubleQuotedString => "double-quoted",
        }
    }
}

/// A maximal run of input with one lexical kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LexicalRegion {
    pub span: SourceSpan,
    pub kind: RegionKind,
}

/// Regions plus the structural diagnostics raised while producing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub regions: Vec<LexicalRegion>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Something that can start a non-code region while in code.
#[derive(Debug, Clone)]
struct Opener {
    marker: String,
    kind: RegionKind,
}

/// The classifier state machine, configured for one dialect.
///
/// Building one sorts the dialect's markers once; it can then classify any
/// number of inputs. Empty markers never match: an empty opener is dropped,
/// an empty block close leaves block comments open to end of input, and an
/// empty closing tag disables the closing-tag rule.
#[derive(Debug, Clone)]
pub struct Classifier {
    openers: Vec<Opener>,
    block_close: Option<String>,
    closing_tag: Option<String>,
}

impl Classifier {
    pub fn new(dialect: &Dialect) -> Self {
        let mut openers = vec![Opener {
            marker: dialect.block_comment_open.clone(),
            kind: RegionKind::BlockComment,
        }];
        openers.extend(dialect.line_comment_markers.iter().map(|m| Opener {
            marker: m.clone(),
            kind: RegionKind::LineComment,
        }));
        openers.push(Opener {
            marker: "'".to_string(),
            kind: RegionKind::SingleQuotedString,
        });
        openers.push(Opener {
            marker: "\"".to_string(),
            kind: RegionKind::DoubleQuotedString,
        });
        let before = openers.len();
        openers.retain(|o| !o.marker.is_empty());
        if openers.len() != before {
            tracing::warn!(dialect = %dialect.name, "ignoring empty comment markers");
        }
        // Longest marker wins; the stable sort keeps block > line > ' > " for ties.
        openers.sort_by(|a, b| b.marker.len().cmp(&a.marker.len()));

        let non_empty = |m: &String| !m.is_empty();
        Self {
            openers,
            block_close: Some(dialect.block_comment_close.clone()).filter(non_empty),
            closing_tag: dialect.closing_tag.clone().filter(non_empty),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(len = src.len()))]
    pub fn classify(&self, src: &str) -> Classification {
        let mut run = Run {
            classifier: self,
            tracker: PositionTracker::new(src),
            state: RegionKind::Code,
            region_start: Position::START,
            out: Classification::default(),
        };
        run.sweep();
        run.out
    }

    fn opener_at(&self, rest: &str) -> Option<&Opener> {
        self.openers.iter().find(|o| rest.starts_with(&o.marker))
    }

    /// True if a closing tag at the start of `rest` ends a line comment.
    fn closes_line_comment(&self, rest: &str) -> bool {
        let Some(tag) = &self.closing_tag else {
            return false;
        };
        match rest.strip_prefix(tag.as_str()) {
            Some(after) => after.chars().next().is_none_or(char::is_whitespace),
            None => false,
        }
    }
}

/// State of one classification pass.
struct Run<'c, 'a> {
    classifier: &'c Classifier,
    tracker: PositionTracker<'a>,
    state: RegionKind,
    region_start: Position,
    out: Classification,
}

impl Run<'_, '_> {
    fn sweep(&mut self) {
        while !self.tracker.is_at_end() {
            match self.state {
                RegionKind::Code => self.step_code(),
                RegionKind::LineComment => self.step_line_comment(),
                RegionKind::BlockComment => self.step_block_comment(),
                RegionKind::SingleQuotedString => self.step_string('\''),
                RegionKind::DoubleQuotedString => self.step_string('"'),
            }
        }
        self.finish();
    }

    fn step_code(&mut self) {
        let rest = self.tracker.rest();
        match self.classifier.opener_at(rest) {
            Some(opener) => {
                let kind = opener.kind;
                let len = opener.marker.len();
                self.switch_to(kind);
                self.tracker.bump_bytes(len);
            }
            None => {
                self.tracker.bump();
            }
        }
    }

    fn step_line_comment(&mut self) {
        let rest = self.tracker.rest();
        if rest.starts_with(['\r', '\n']) || self.classifier.closes_line_comment(rest) {
            // The terminator (or tag) belongs to the code that follows.
            self.switch_to(RegionKind::Code);
        } else {
            self.tracker.bump();
        }
    }

    fn step_block_comment(&mut self) {
        match &self.classifier.block_close {
            Some(close) if self.tracker.rest().starts_with(close.as_str()) => {
                self.tracker.bump_bytes(close.len());
                self.switch_to(RegionKind::Code);
            }
            _ => {
                self.tracker.bump();
            }
        }
    }

    fn step_string(&mut self, quote: char) {
        match self.tracker.bump() {
            // Escape pair: the escaped character is never inspected.
            Some('\\') => {
                self.tracker.bump();
            }
            Some(c) if c == quote => self.switch_to(RegionKind::Code),
            _ => {}
        }
    }

    /// Close the current region at the current offset and enter `next`.
    fn switch_to(&mut self, next: RegionKind) {
        self.close_region();
        tracing::trace!(
            offset = self.tracker.offset(),
            from = self.state.as_str(),
            to = next.as_str(),
            "region transition"
        );
        self.state = next;
    }

    fn close_region(&mut self) {
        let end = self.tracker.offset();
        if end > self.region_start.offset {
            self.out.regions.push(LexicalRegion {
                span: SourceSpan::new(self.region_start, end),
                kind: self.state,
            });
        }
        self.region_start = self.tracker.position();
    }

    fn finish(&mut self) {
        let start = self.region_start;
        let state = self.state;
        self.close_region();

        let end = self.tracker.offset();
        let (kind, what) = match state {
            RegionKind::Code | RegionKind::LineComment => return,
            RegionKind::BlockComment => (DiagnosticKind::UnterminatedComment, "block comment"),
            RegionKind::SingleQuotedString => {
                (DiagnosticKind::UnterminatedString, "single-quoted string")
            }
            RegionKind::DoubleQuotedString => {
                (DiagnosticKind::UnterminatedString, "double-quoted string")
            }
        };
        tracing::debug!(offset = start.offset, what, "unterminated region at end of input");
        self.out.diagnostics.push(Diagnostic::new(
            kind,
            format!("unterminated {what} starting here runs to end of input"),
            SourceSpan::new(start, end),
        ));
    }
}

/// Classify `src` with the given dialect.
pub fn classify(src: &str, dialect: &Dialect) -> Classification {
    Classifier::new(dialect).classify(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(RegionKind, &str)> {
        classify(src, &Dialect::php())
            .regions
            .iter()
            .map(|r| (r.kind, r.span.text(src)))
            .collect()
    }

    #[test]
    fn empty_markers_never_match() {
        let dialect = Dialect {
            line_comment_markers: vec![String::new(), "#".to_string()],
            block_comment_close: String::new(),
            closing_tag: Some(String::new()),
            ..Dialect::php()
        };
        let src = "a\nb # c \n/* d */ e";
        let c = classify(src, &dialect);
        let found: Vec<_> = c.regions.iter().map(|r| (r.kind, r.span.text(src))).collect();
        assert_eq!(
            found,
            vec![
                (RegionKind::Code, "a\nb "),
                (RegionKind::LineComment, "# c "),
                (RegionKind::Code, "\n"),
                (RegionKind::BlockComment, "/* d */ e"),
            ]
        );
        assert_eq!(c.diagnostics.len(), 1);
        assert_eq!(c.diagnostics[0].kind, DiagnosticKind::UnterminatedComment);
    }

    #[test]
    fn empty_block_open_is_dropped() {
        let dialect = Dialect {
            block_comment_open: String::new(),
            ..Dialect::php()
        };
        let c = classify("x /* y */", &dialect);
        assert_eq!(c.regions.len(), 1);
        assert_eq!(c.regions[0].kind, RegionKind::Code);
    }

    #[test]
    fn plain_code_is_one_region() {
        assert_eq!(kinds("echo 1;"), vec![(RegionKind::Code, "echo 1;")]);
    }

    #[test]
    fn empty_input_has_no_regions() {
        let c = classify("", &Dialect::php());
        assert!(c.regions.is_empty());
        assert!(c.diagnostics.is_empty());
    }

    #[test]
    fn escaped_quote_stays_in_string() {
        assert_eq!(
            kinds(r#"x = "foo\"bar";"#),
            vec![
                (RegionKind::Code, "x = "),
                (RegionKind::DoubleQuotedString, r#""foo\"bar""#),
                (RegionKind::Code, ";"),
            ]
        );
    }

    #[test]
    fn escaped_apostrophe_in_single_quotes() {
        assert_eq!(
            kinds(r"c = '\'';"),
            vec![
                (RegionKind::Code, "c = "),
                (RegionKind::SingleQuotedString, r"'\''"),
                (RegionKind::Code, ";"),
            ]
        );
    }

    #[test]
    fn comment_markers_inside_strings_are_inert() {
        assert_eq!(
            kinds(r#"a = "blaa /* blaa "; b = 'x // y';"#),
            vec![
                (RegionKind::Code, "a = "),
                (RegionKind::DoubleQuotedString, r#""blaa /* blaa ""#),
                (RegionKind::Code, "; b = "),
                (RegionKind::SingleQuotedString, "'x // y'"),
                (RegionKind::Code, ";"),
            ]
        );
    }

    #[test]
    fn quotes_inside_other_quotes_are_inert() {
        assert_eq!(
            kinds(r#"a = "foo'"; b = '"';"#),
            vec![
                (RegionKind::Code, "a = "),
                (RegionKind::DoubleQuotedString, r#""foo'""#),
                (RegionKind::Code, "; b = "),
                (RegionKind::SingleQuotedString, r#"'"'"#),
                (RegionKind::Code, ";"),
            ]
        );
    }

    #[test]
    fn block_comment_star_runs() {
        assert_eq!(
            kinds("/* a * ** *** b **/x"),
            vec![
                (RegionKind::BlockComment, "/* a * ** *** b **/"),
                (RegionKind::Code, "x"),
            ]
        );
    }

    #[test]
    fn block_open_marker_is_not_reused_as_close() {
        assert_eq!(
            kinds("/*/ still comment */;"),
            vec![
                (RegionKind::BlockComment, "/*/ still comment */"),
                (RegionKind::Code, ";"),
            ]
        );
    }

    #[test]
    fn code_resumes_after_block_comment_on_same_line() {
        assert_eq!(
            kinds("/* before */ int n = 0;"),
            vec![
                (RegionKind::BlockComment, "/* before */"),
                (RegionKind::Code, " int n = 0;"),
            ]
        );
    }

    #[test]
    fn line_comment_terminators() {
        for nl in ["\n", "\r", "\r\n"] {
            let src = format!("a // c{nl}b # d{nl}e");
            assert_eq!(
                kinds(&src),
                vec![
                    (RegionKind::Code, "a "),
                    (RegionKind::LineComment, "// c"),
                    (RegionKind::Code, format!("{nl}b ").as_str()),
                    (RegionKind::LineComment, "# d"),
                    (RegionKind::Code, format!("{nl}e").as_str()),
                ],
                "terminator {nl:?}"
            );
        }
    }

    #[test]
    fn line_comment_at_end_of_input_is_not_an_error() {
        let c = classify("x; // trailing", &Dialect::php());
        assert_eq!(c.regions.len(), 2);
        assert!(c.diagnostics.is_empty());
    }

    #[test]
    fn closing_tag_ends_line_comment_before_whitespace() {
        assert_eq!(
            kinds("# end ?> // more\nx"),
            vec![
                (RegionKind::LineComment, "# end "),
                (RegionKind::Code, "?> "),
                (RegionKind::LineComment, "// more"),
                (RegionKind::Code, "\nx"),
            ]
        );
    }

    #[test]
    fn closing_tag_followed_by_text_stays_in_comment() {
        assert_eq!(
            kinds("# end?>or now\nx"),
            vec![
                (RegionKind::LineComment, "# end?>or now"),
                (RegionKind::Code, "\nx"),
            ]
        );
    }

    #[test]
    fn closing_tag_rule_can_be_disabled() {
        let src = "# end ?> // more\nx";
        let c = classify(src, &Dialect::php().without_closing_tag());
        let texts: Vec<_> = c.regions.iter().map(|r| r.span.text(src)).collect();
        assert_eq!(texts, vec!["# end ?> // more", "\nx"]);
    }

    #[test]
    fn hash_is_code_in_c_family() {
        let src = "#include \"a.h\" // x";
        let c = classify(src, &Dialect::c_family());
        let kinds: Vec<_> = c.regions.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RegionKind::Code,
                RegionKind::DoubleQuotedString,
                RegionKind::Code,
                RegionKind::LineComment,
            ]
        );
    }

    #[test]
    fn longer_marker_wins() {
        let mut dialect = Dialect::php();
        dialect.line_comment_markers = vec!["-".to_string(), "--".to_string()];
        dialect.block_comment_open = "--[".to_string();
        dialect.block_comment_close = "]--".to_string();
        let src = "a --[ b ]-- c - d";
        let c = classify(src, &dialect);
        let texts: Vec<_> = c
            .regions
            .iter()
            .map(|r| (r.kind, r.span.text(src)))
            .collect();
        assert_eq!(
            texts,
            vec![
                (RegionKind::Code, "a "),
                (RegionKind::BlockComment, "--[ b ]--"),
                (RegionKind::Code, " c "),
                (RegionKind::LineComment, "- d"),
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let src = "x; /* never closed";
        let c = classify(src, &Dialect::php());
        assert_eq!(c.regions.last().unwrap().kind, RegionKind::BlockComment);
        assert_eq!(c.regions.last().unwrap().span.end, src.len());
        assert_eq!(c.diagnostics.len(), 1);
        assert_eq!(c.diagnostics[0].kind, DiagnosticKind::UnterminatedComment);
        assert_eq!(c.diagnostics[0].span.start, 3);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let c = classify("x = 'abc", &Dialect::php());
        assert_eq!(c.diagnostics.len(), 1);
        assert_eq!(c.diagnostics[0].kind, DiagnosticKind::UnterminatedString);
        assert!(c.diagnostics[0].is_error());
    }

    #[test]
    fn trailing_backslash_in_string() {
        let src = "'abc\\";
        let c = classify(src, &Dialect::php());
        assert_eq!(c.regions.len(), 1);
        assert_eq!(c.regions[0].span.end, src.len());
        assert_eq!(c.diagnostics.len(), 1);
    }

    #[test]
    fn regions_carry_line_and_column() {
        let src = "a;\r\n  /* c */ 'x'";
        let c = classify(src, &Dialect::php());
        let comment = c.regions[1];
        assert_eq!(comment.kind, RegionKind::BlockComment);
        assert_eq!((comment.span.line, comment.span.column), (2, 3));
        let string = c.regions[3];
        assert_eq!(string.kind, RegionKind::SingleQuotedString);
        assert_eq!((string.span.line, string.span.column), (2, 11));
    }
}
