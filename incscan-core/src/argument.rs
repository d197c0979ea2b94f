//! Classification of directive arguments.
//!
//! Directive arguments are stored verbatim. This module parses that text into
//! a small expression tree so callers can tell a plain literal path from one
//! built out of variables, constants or calls. Nothing is evaluated.

use chumsky::error::Simple;
use chumsky::extra;
use chumsky::prelude::*;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("cannot parse argument: {}", .0.join("; "))]
    Syntax(Vec<String>),
}

/// Parsed shape of a directive argument.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum ArgumentExpr {
    /// `'path'` or `"path"`, escapes decoded. `interpolated` is set when a
    /// double-quoted literal contains an unescaped `$`.
    Str { value: String, interpolated: bool },

    /// `$name`
    Variable { name: String },

    /// Bare identifier such as `ROOT_PATH` or `__DIR__`.
    Constant { name: String },

    /// `name(arg, ...)`
    Call { name: String, args: Vec<ArgumentExpr> },

    /// Operands joined by `.` or `+`.
    Concat { parts: Vec<ArgumentExpr> },
}

impl ArgumentExpr {
    /// The literal value, if this is a single non-interpolated string.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            ArgumentExpr::Str {
                value,
                interpolated: false,
            } => Some(value),
            _ => None,
        }
    }
}

/// What a directive points at, as far as can be told without resolving it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum DirectiveTarget {
    /// A literal local path.
    Static { path: String },
    /// A literal URL (`scheme://...`).
    Remote { url: String },
    /// Built from variables, constants, calls or concatenation.
    Dynamic { expr: ArgumentExpr },
    /// Not an expression this parser understands.
    Unparsable { reason: String },
}

impl DirectiveTarget {
    /// The literal path or URL, if there is one.
    pub fn literal(&self) -> Option<&str> {
        match self {
            DirectiveTarget::Static { path } => Some(path),
            DirectiveTarget::Remote { url } => Some(url),
            _ => None,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, DirectiveTarget::Static { .. })
    }
}

/// Classify raw argument text.
pub fn classify_target(argument: &str) -> DirectiveTarget {
    match parse_argument(argument) {
        Ok(expr) => match expr.as_literal() {
            Some(lit) if lit.contains("://") => DirectiveTarget::Remote {
                url: lit.to_string(),
            },
            Some(lit) => DirectiveTarget::Static {
                path: lit.to_string(),
            },
            None => DirectiveTarget::Dynamic { expr },
        },
        Err(e) => DirectiveTarget::Unparsable {
            reason: e.to_string(),
        },
    }
}

pub fn parse_argument(src: &str) -> Result<ArgumentExpr, ArgumentError> {
    argument_parser()
        .parse(src)
        .into_result()
        .map_err(|errs| ArgumentError::Syntax(errs.iter().map(|e| format!("{e:?}")).collect()))
}

fn argument_parser<'src>()
-> impl Parser<'src, &'src str, ArgumentExpr, extra::Err<Simple<'src, char>>> {
    let whitespace = any().filter(|c: &char| c.is_whitespace()).repeated();

    let ident = any()
        .filter(|c: &char| c.is_alphabetic() || *c == '_')
        .then(
            any()
                .filter(|c: &char| c.is_alphanumeric() || *c == '_')
                .repeated()
                .collect::<String>(),
        )
        .map(|(first, rest): (char, String)| format!("{first}{rest}"));

    // 'single quoted': only \' and \\ are escapes
    let single_piece = choice((
        just('\\').ignore_then(any()).map(|c: char| match c {
            '\'' | '\\' => c.to_string(),
            other => format!("\\{other}"),
        }),
        none_of("\\'").map(|c: char| c.to_string()),
    ));
    let single = just('\'')
        .ignore_then(single_piece.repeated().collect::<Vec<String>>())
        .then_ignore(just('\''))
        .map(|parts| ArgumentExpr::Str {
            value: parts.concat(),
            interpolated: false,
        });

    // "double quoted": the usual escapes, and `$` means interpolation
    let double_piece = choice((
        just('\\').ignore_then(any()).map(|c: char| {
            let decoded = match c {
                'n' => "\n".to_string(),
                't' => "\t".to_string(),
                'r' => "\r".to_string(),
                '"' | '\\' | '$' => c.to_string(),
                other => format!("\\{other}"),
            };
            (decoded, false)
        }),
        just('$').map(|_| ("$".to_string(), true)),
        none_of("\\\"$").map(|c: char| (c.to_string(), false)),
    ));
    let double = just('"')
        .ignore_then(double_piece.repeated().collect::<Vec<(String, bool)>>())
        .then_ignore(just('"'))
        .map(|parts| {
            let interpolated = parts.iter().any(|(_, dollar)| *dollar);
            let value = parts.into_iter().map(|(s, _)| s).collect::<String>();
            ArgumentExpr::Str {
                value,
                interpolated,
            }
        });

    let variable = just('$')
        .ignore_then(ident.clone())
        .map(|name| ArgumentExpr::Variable { name });

    let expr = recursive(|expr| {
        let args = expr
            .clone()
            .separated_by(just(',').padded_by(whitespace))
            .allow_trailing()
            .collect::<Vec<ArgumentExpr>>()
            .delimited_by(
                just('(').then(whitespace),
                whitespace.then(just(')')),
            );

        // `name(...)` is a call, a bare `name` is a constant
        let call_or_constant = ident
            .clone()
            .then(whitespace.ignore_then(args).or_not())
            .map(|(name, args)| match args {
                Some(args) => ArgumentExpr::Call { name, args },
                None => ArgumentExpr::Constant { name },
            });

        let group = expr.delimited_by(
            just('(').then(whitespace),
            whitespace.then(just(')')),
        );

        let term = choice((single, double, variable, call_or_constant, group));

        term.separated_by(one_of(".+").padded_by(whitespace))
            .at_least(1)
            .collect::<Vec<ArgumentExpr>>()
            .map(|mut parts| {
                if parts.len() == 1 {
                    parts.remove(0)
                } else {
                    ArgumentExpr::Concat { parts }
                }
            })
    });

    whitespace
        .ignore_then(expr)
        .then_ignore(whitespace)
        .then_ignore(end())
}
