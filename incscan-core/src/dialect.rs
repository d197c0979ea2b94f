//! Comment-marker dialects.
//!
//! A [`Dialect`] tells the classifier which markers open comments and whether
//! the closing-tag rule applies inside line comments. Two presets ship with
//! the crate; custom dialects can be loaded from a config file (see `io`).

use std::path::Path;

/// Name of the built-in PHP dialect.
pub const PHP: &str = "php";
/// Name of the built-in C-family dialect (C, C++, Java).
pub const C_FAMILY: &str = "c-family";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    pub name: String,
    /// Markers that start a comment running to the end of the line.
    pub line_comment_markers: Vec<String>,
    pub block_comment_open: String,
    pub block_comment_close: String,
    /// Tag that may end a line comment early (`?>` in PHP). `None` disables
    /// the rule.
    pub closing_tag: Option<String>,
    /// Whether `include`/`require` directives are extracted at all.
    pub extract_directives: bool,
}

impl Dialect {
    /// PHP: `//` and `#` line comments, `?>` closes a line comment.
    pub fn php() -> Self {
        Self {
            name: PHP.to_string(),
            line_comment_markers: vec!["//".to_string(), "#".to_string()],
            block_comment_open: "/*".to_string(),
            block_comment_close: "*/".to_string(),
            closing_tag: Some("?>".to_string()),
            extract_directives: true,
        }
    }

    /// C, C++ and Java: `//` line comments only, no closing tag, no directives.
    pub fn c_family() -> Self {
        Self {
            name: C_FAMILY.to_string(),
            line_comment_markers: vec!["//".to_string()],
            block_comment_open: "/*".to_string(),
            block_comment_close: "*/".to_string(),
            closing_tag: None,
            extract_directives: false,
        }
    }

    /// Look up a built-in dialect by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            PHP => Some(Self::php()),
            C_FAMILY => Some(Self::c_family()),
            _ => None,
        }
    }

    /// Same dialect with the closing-tag rule switched off.
    pub fn without_closing_tag(mut self) -> Self {
        self.closing_tag = None;
        self
    }

    /// Pick a built-in dialect from a file name's extension.
    ///
    /// Returns `None` for files that are not recognised source files.
    pub fn for_path(path: impl AsRef<Path>) -> Option<Self> {
        let name = dialect_name_for_extension(extension_of(path.as_ref())?.as_str())?;
        Self::builtin(name)
    }

    /// Check that the markers make a usable state machine.
    pub fn validate(&self) -> Result<(), DialectError> {
        if self.block_comment_open.is_empty() || self.block_comment_close.is_empty() {
            return Err(DialectError::EmptyBlockMarker);
        }
        if self.block_comment_open == self.block_comment_close {
            return Err(DialectError::SameBlockMarkers(self.block_comment_open.clone()));
        }
        if self.line_comment_markers.iter().any(String::is_empty) {
            return Err(DialectError::EmptyLineMarker);
        }
        if let Some(tag) = &self.closing_tag
            && tag.is_empty()
        {
            return Err(DialectError::EmptyClosingTag);
        }
        let markers = self
            .line_comment_markers
            .iter()
            .chain(std::iter::once(&self.block_comment_open));
        for marker in markers {
            if marker.starts_with(['\'', '"']) {
                return Err(DialectError::QuoteMarker(marker.clone()));
            }
        }
        Ok(())
    }
}

/// Why a dialect's markers are unusable.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DialectError {
    #[error("block comment markers must not be empty")]
    EmptyBlockMarker,

    #[error("block comment open and close markers are both '{0}'")]
    SameBlockMarkers(String),

    #[error("line comment markers must not be empty")]
    EmptyLineMarker,

    #[error("closing tag must not be empty")]
    EmptyClosingTag,

    #[error("comment marker '{0}' starts with a quote")]
    QuoteMarker(String),
}

impl Default for Dialect {
    fn default() -> Self {
        Self::php()
    }
}

/// Lower-cased extension of `path`, if any.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Built-in extension table.
pub fn dialect_name_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "php" => Some(PHP),
        "java" | "c" | "cc" | "cpp" | "h" | "hpp" => Some(C_FAMILY),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_dialect_from_extension() {
        assert_eq!(Dialect::for_path("src/index.php").unwrap().name, PHP);
        assert_eq!(Dialect::for_path("INDEX.PHP").unwrap().name, PHP);
        assert_eq!(Dialect::for_path("Main.java").unwrap().name, C_FAMILY);
        assert_eq!(Dialect::for_path("lib/util.hpp").unwrap().name, C_FAMILY);
        assert!(Dialect::for_path("README.md").is_none());
        assert!(Dialect::for_path("Makefile").is_none());
    }

    #[test]
    fn presets_are_valid() {
        assert!(Dialect::php().validate().is_ok());
        assert!(Dialect::c_family().validate().is_ok());
    }

    #[test]
    fn rejects_broken_markers() {
        let mut d = Dialect::php();
        d.block_comment_close = "/*".to_string();
        assert_eq!(
            d.validate(),
            Err(DialectError::SameBlockMarkers("/*".to_string()))
        );

        let mut d = Dialect::php();
        d.line_comment_markers.push(String::new());
        assert_eq!(d.validate(), Err(DialectError::EmptyLineMarker));

        let mut d = Dialect::php();
        d.line_comment_markers.push("'".to_string());
        assert_eq!(d.validate(), Err(DialectError::QuoteMarker("'".to_string())));

        let mut d = Dialect::php();
        d.closing_tag = Some(String::new());
        assert_eq!(d.validate(), Err(DialectError::EmptyClosingTag));
    }

    #[test]
    fn closing_tag_can_be_disabled() {
        assert!(Dialect::php().without_closing_tag().closing_tag.is_none());
    }
}
