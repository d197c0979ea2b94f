//! Configuration and source file I/O.
//!
//! Scanner configuration is a YAML document listing custom dialects and the
//! file extensions they apply to. The built-in `php` and `c-family` dialects
//! are always available and can be overridden by name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dialect::{self, Dialect, DialectError, dialect_name_for_extension, extension_of};
use crate::project::SourceFile;
use crate::scan::Scanner;

/// Error type for I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("invalid dialect '{name}': {source}")]
    InvalidDialect {
        name: String,
        #[source]
        source: DialectError,
    },

    #[error("duplicate dialect name: '{0}'")]
    DuplicateDialect(String),

    #[error("unknown dialect: '{0}'")]
    UnknownDialect(String),

    #[error("no dialect configured for '{0}'")]
    UnsupportedFile(String),
}

// ============================================================================
// Data Transfer Objects (DTOs) for YAML serialization
// ============================================================================

fn default_line_comments() -> Vec<String> {
    vec!["//".to_string()]
}

fn default_block_open() -> String {
    "/*".to_string()
}

fn default_block_close() -> String {
    "*/".to_string()
}

fn default_true() -> bool {
    true
}

/// DTO for Dialect.
#[derive(Debug, Serialize, Deserialize)]
pub struct DialectDto {
    pub name: String,
    #[serde(default = "default_line_comments")]
    pub line_comments: Vec<String>,
    #[serde(default = "default_block_open")]
    pub block_open: String,
    #[serde(default = "default_block_close")]
    pub block_close: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_tag: Option<String>,
    #[serde(default = "default_true")]
    pub directives: bool,
}

/// DTO for the whole config file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigDto {
    #[serde(default)]
    pub dialects: Vec<DialectDto>,
    /// Extension (without the dot) -> dialect name.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

impl From<DialectDto> for Dialect {
    fn from(dto: DialectDto) -> Self {
        Dialect {
            name: dto.name,
            line_comment_markers: dto.line_comments,
            block_comment_open: dto.block_open,
            block_comment_close: dto.block_close,
            closing_tag: dto.closing_tag,
            extract_directives: dto.directives,
        }
    }
}

impl From<&Dialect> for DialectDto {
    fn from(dialect: &Dialect) -> Self {
        DialectDto {
            name: dialect.name.clone(),
            line_comments: dialect.line_comment_markers.clone(),
            block_open: dialect.block_comment_open.clone(),
            block_close: dialect.block_comment_close.clone(),
            closing_tag: dialect.closing_tag.clone(),
            directives: dialect.extract_directives,
        }
    }
}

// ============================================================================
// ScanConfig
// ============================================================================

/// Resolved configuration: every available dialect plus extension overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    dialects: Vec<Dialect>,
    extensions: BTreeMap<String, String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dialects: vec![Dialect::php(), Dialect::c_family()],
            extensions: BTreeMap::new(),
        }
    }
}

impl ScanConfig {
    pub fn dialects(&self) -> &[Dialect] {
        &self.dialects
    }

    pub fn dialect(&self, name: &str) -> Option<&Dialect> {
        self.dialects.iter().find(|d| d.name == name)
    }

    /// Dialect for `path`: configured extensions first, then the built-in table.
    pub fn dialect_for_path(&self, path: &Path) -> Option<&Dialect> {
        let ext = extension_of(path)?;
        let name = match self.extensions.get(&ext) {
            Some(name) => name.as_str(),
            None => dialect_name_for_extension(&ext)?,
        };
        self.dialect(name)
    }

    /// The starter config written by `incscan init`.
    pub fn default_yaml() -> String {
        let mut extensions = BTreeMap::new();
        extensions.insert("inc".to_string(), dialect::PHP.to_string());
        let dto = ConfigDto {
            dialects: vec![(&Dialect::php()).into(), (&Dialect::c_family()).into()],
            extensions,
        };
        serde_yaml_ng::to_string(&dto).unwrap_or_default()
    }

    fn from_dto(dto: ConfigDto) -> Result<Self, IoError> {
        let mut config = ScanConfig::default();
        let mut seen = std::collections::HashSet::new();

        for dialect_dto in dto.dialects {
            if !seen.insert(dialect_dto.name.clone()) {
                return Err(IoError::DuplicateDialect(dialect_dto.name));
            }
            let dialect: Dialect = dialect_dto.into();
            dialect
                .validate()
                .map_err(|source| IoError::InvalidDialect {
                    name: dialect.name.clone(),
                    source,
                })?;

            match config.dialects.iter_mut().find(|d| d.name == dialect.name) {
                Some(existing) => *existing = dialect,
                None => config.dialects.push(dialect),
            }
        }

        for (ext, name) in dto.extensions {
            if config.dialect(&name).is_none() {
                return Err(IoError::UnknownDialect(name));
            }
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            config.extensions.insert(ext, name);
        }

        Ok(config)
    }

    fn to_dto(&self) -> ConfigDto {
        ConfigDto {
            dialects: self.dialects.iter().map(Into::into).collect(),
            extensions: self.extensions.clone(),
        }
    }
}

// ============================================================================
// Config I/O
// ============================================================================

/// Parse a config from a YAML string.
pub fn parse_config(yaml: &str) -> Result<ScanConfig, IoError> {
    let dto: ConfigDto = serde_yaml_ng::from_str(yaml)?;
    ScanConfig::from_dto(dto)
}

/// Load a config from a YAML file.
pub fn load_config(path: &Path) -> Result<ScanConfig, IoError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Serialize a config to a YAML string.
pub fn serialize_config(config: &ScanConfig) -> Result<String, IoError> {
    Ok(serde_yaml_ng::to_string(&config.to_dto())?)
}

/// Save a config to a YAML file.
pub fn save_config(config: &ScanConfig, path: &Path) -> Result<(), IoError> {
    fs::write(path, serialize_config(config)?)?;
    Ok(())
}

// ============================================================================
// Source files
// ============================================================================

/// Read a file as text. Bytes that are not UTF-8 are replaced, so offsets
/// refer to the decoded text.
pub fn read_source(path: &Path) -> Result<String, IoError> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Read and scan one file, picking its dialect from `config`.
pub fn scan_path(path: &Path, config: &ScanConfig) -> Result<SourceFile, IoError> {
    let dialect = config
        .dialect_for_path(path)
        .ok_or_else(|| IoError::UnsupportedFile(path.display().to_string()))?;
    scan_path_with(path, dialect)
}

/// Read and scan one file with an explicit dialect.
pub fn scan_path_with(path: &Path, dialect: &Dialect) -> Result<SourceFile, IoError> {
    let source = read_source(path)?;
    let scanner = Scanner::new(dialect.clone());
    Ok(SourceFile::scan(
        path.display().to_string(),
        source,
        &scanner,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TEST_CONFIG_YAML: &str = r##"
dialects:
  - name: shell
    line_comments: ["#"]
    directives: false
  - name: php
    line_comments: ["//", "#"]
    directives: true
extensions:
  sh: shell
  .INC: php
"##;

    #[test]
    fn test_parse_config() {
        let config = parse_config(TEST_CONFIG_YAML).unwrap();

        let shell = config.dialect("shell").unwrap();
        assert_eq!(shell.line_comment_markers, vec!["#"]);
        assert_eq!(shell.block_comment_open, "/*");
        assert!(!shell.extract_directives);

        // overriding php dropped its closing tag
        assert!(config.dialect("php").unwrap().closing_tag.is_none());
        // built-ins not mentioned survive
        assert!(config.dialect("c-family").is_some());
    }

    #[test]
    fn test_extension_lookup() {
        let config = parse_config(TEST_CONFIG_YAML).unwrap();
        assert_eq!(
            config.dialect_for_path(Path::new("run.sh")).unwrap().name,
            "shell"
        );
        assert_eq!(
            config.dialect_for_path(Path::new("lib/a.inc")).unwrap().name,
            "php"
        );
        assert_eq!(
            config.dialect_for_path(Path::new("x.cpp")).unwrap().name,
            "c-family"
        );
        assert!(config.dialect_for_path(Path::new("notes.txt")).is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let config = parse_config(TEST_CONFIG_YAML).unwrap();
        let yaml = serialize_config(&config).unwrap();
        let reloaded = parse_config(&yaml).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_default_yaml_parses() {
        let config = parse_config(&ScanConfig::default_yaml()).unwrap();
        assert_eq!(config.dialect("php").unwrap(), &Dialect::php());
        assert_eq!(
            config.dialect_for_path(Path::new("header.inc")).unwrap().name,
            "php"
        );
    }

    #[test]
    fn test_duplicate_dialect_error() {
        let yaml = r#"
dialects:
  - name: a
  - name: a
"#;
        let result = parse_config(yaml);
        assert!(matches!(result, Err(IoError::DuplicateDialect(name)) if name == "a"));
    }

    #[test]
    fn test_invalid_dialect_error() {
        let yaml = r#"
dialects:
  - name: broken
    block_open: "%%"
    block_close: "%%"
"#;
        let result = parse_config(yaml);
        assert!(matches!(
            result,
            Err(IoError::InvalidDialect { name, source: DialectError::SameBlockMarkers(_) })
                if name == "broken"
        ));
    }

    #[test]
    fn test_unknown_dialect_in_extensions() {
        let yaml = r#"
extensions:
  foo: nope
"#;
        let result = parse_config(yaml);
        assert!(matches!(result, Err(IoError::UnknownDialect(name)) if name == "nope"));
    }

    #[test]
    fn test_scan_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.php");
        fs::write(&path, "<?php\n// require 'no.php';\nrequire 'yes.php';\n").unwrap();

        let file = scan_path(&path, &ScanConfig::default()).unwrap();
        assert_eq!(file.dialect, "php");
        assert_eq!(file.result.directives.len(), 1);
        assert_eq!(file.result.directives[0].argument, "'yes.php'");
        assert_eq!(file.result.directives[0].span.line, 3);
    }

    #[test]
    fn test_scan_path_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "include 'x';").unwrap();

        let result = scan_path(&path, &ScanConfig::default());
        assert!(matches!(result, Err(IoError::UnsupportedFile(_))));
    }

    #[test]
    fn test_read_source_tolerates_latin1() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.php");
        fs::write(&path, b"// K\xe4\xe4ri\xe4inen\ninclude 'a.php';").unwrap();

        let file = scan_path(&path, &ScanConfig::default()).unwrap();
        assert_eq!(file.result.directives.len(), 1);
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("incscan.yml");
        let config = parse_config(TEST_CONFIG_YAML).unwrap();

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
