pub mod argument;
pub mod classifier;
pub mod diagnostic;
pub mod dialect;
pub mod directive;
#[cfg(feature = "serde")]
pub mod io;
pub mod project;
pub mod scan;
pub mod search;
pub mod span;

// Re-exports for convenience
pub use argument::{ArgumentError, ArgumentExpr, DirectiveTarget, classify_target, parse_argument};
pub use classifier::{Classification, Classifier, LexicalRegion, RegionKind, classify};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use dialect::{Dialect, DialectError};
pub use directive::{Directive, DirectiveKind, Extraction, extract};
pub use span::{LineIndex, Position, SourceSpan};

#[cfg(feature = "serde")]
pub use io::{
    IoError, ScanConfig, load_config, parse_config, read_source, save_config, scan_path,
    scan_path_with, serialize_config,
};

// Scan exports
pub use scan::{CommentLine, ScanResult, Scanner, scan};

// Project exports
pub use project::{FileDirective, Project, ProjectBuilder, SourceFile};

// Search exports
pub use search::DirectiveSearchResult;
