//! Shared test utilities for incscan tests.
//!
//! Provides:
//! - Cached scans of the annotated fixtures
//! - Helpers that check the region partition and directive containment

#![allow(dead_code)]

use incscan_core::{Dialect, Directive, DirectiveKind, RegionKind, ScanResult, scan};
use once_cell::sync::Lazy;

// ============================================================================
// Fixtures
// ============================================================================

pub const EXAMPLE_SOURCE: &str = include_str!("../fixtures/example_source.php");
pub const ALIASING: &str = include_str!("../fixtures/aliasing.php");

pub static EXAMPLE_SCAN: Lazy<ScanResult> = Lazy::new(|| scan(EXAMPLE_SOURCE, &Dialect::php()));
pub static ALIASING_SCAN: Lazy<ScanResult> = Lazy::new(|| scan(ALIASING, &Dialect::php()));

// ============================================================================
// Helpers
// ============================================================================

/// Scan with the php dialect.
pub fn php(src: &str) -> ScanResult {
    scan(src, &Dialect::php())
}

/// `(kind, argument)` for every directive.
pub fn directives(result: &ScanResult) -> Vec<(DirectiveKind, &str)> {
    result
        .directives
        .iter()
        .map(|d| (d.kind, d.argument.as_str()))
        .collect()
}

/// Arguments only.
pub fn arguments(result: &ScanResult) -> Vec<&str> {
    result.directives.iter().map(|d| d.argument.as_str()).collect()
}

/// `(kind, text)` for every region.
pub fn regions<'a>(src: &'a str, result: &ScanResult) -> Vec<(RegionKind, &'a str)> {
    result
        .regions
        .iter()
        .map(|r| (r.kind, r.span.text(src)))
        .collect()
}

/// Panics unless the regions tile the input exactly with no empty regions.
pub fn assert_partition(src: &str, result: &ScanResult) {
    assert!(
        result.covers(src.len()),
        "regions do not partition input of length {}: {:?}",
        src.len(),
        result.regions
    );
    let joined: String = result.regions.iter().map(|r| r.span.text(src)).collect();
    assert_eq!(joined, src);
}

/// Panics unless every directive keyword lies inside a single code region.
pub fn assert_contained(result: &ScanResult) {
    for d in &result.directives {
        assert!(
            in_code(result, d),
            "directive {:?} at {}:{} is not inside a code region",
            d.kind,
            d.span.line,
            d.span.column
        );
    }
}

fn in_code(result: &ScanResult, d: &Directive) -> bool {
    result
        .code_regions()
        .any(|r| r.span.contains(&d.span))
}
