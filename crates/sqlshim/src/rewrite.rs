//! Placeholder rewriting.
//!
//! Upstream statements use the generic `%s` positional marker; each dialect
//! expects its own syntax (`?`, `$1`, `@P1`, ...). The rewriter is a pure
//! text transform, aware of single-quoted string literals so a `%s` embedded
//! in a literal is never rewritten, and `%%` escapes a literal percent.

use crate::dialect::PlaceholderStyle;
use crate::error::{Result, ShimError};

/// The generic positional placeholder used in incoming SQL text.
pub const PLACEHOLDER: &str = "%s";

/// Rewrite generic placeholders to the dialect's native markers.
///
/// The number of markers found outside string literals must equal
/// `param_count`; a mismatch indicates a caller bug and fails with
/// [`ShimError::MalformedStatement`]. Statements without markers and without
/// parameters pass through untouched.
pub fn rewrite_placeholders(
    sql: &str,
    param_count: usize,
    style: PlaceholderStyle,
) -> Result<String> {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut found = 0usize;
    let mut in_literal = false;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_literal {
            out.push(ch);
            if ch == '\'' {
                // A doubled quote is an escape, not the end of the literal.
                if chars.next_if_eq(&'\'').is_some() {
                    out.push('\'');
                } else {
                    in_literal = false;
                }
            }
            continue;
        }
        match ch {
            '\'' => {
                in_literal = true;
                out.push(ch);
            }
            '%' => {
                if chars.next_if_eq(&'s').is_some() {
                    found += 1;
                    match style {
                        PlaceholderStyle::Positional => out.push('?'),
                        PlaceholderStyle::Numbered { prefix } => {
                            out.push_str(prefix);
                            out.push_str(&found.to_string());
                        }
                    }
                } else if chars.next_if_eq(&'%').is_some() {
                    out.push('%');
                } else {
                    out.push('%');
                }
            }
            _ => out.push(ch),
        }
    }

    if found != param_count {
        return Err(ShimError::malformed(format!(
            "statement has {found} placeholder(s) but {param_count} parameter(s) were bound"
        )));
    }
    Ok(out)
}
