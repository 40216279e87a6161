//! SQL text helpers

use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;

fn bare_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Single-quoted string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Path as a string literal
pub fn quote_path(path: &Path) -> String {
    quote_literal(&path.to_string_lossy())
}

/// Identifier, double-quoted only when it is not a plain word
pub fn quote_ident(name: &str) -> String {
    if bare_identifier().is_match(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
