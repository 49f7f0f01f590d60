//! Source positions for tokens, AST nodes and diagnostics.

use std::fmt;

/// A 1-based line/column position in the source text.
///
/// Columns count characters, not bytes, so positions stay meaningful for
/// non-ASCII text inside strings, comments and raw blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn new(line: u32, column: u32) -> Self {
        Span { line, column }
    }

    /// Position of the first character of a file.
    pub const fn start() -> Self {
        Span { line: 1, column: 1 }
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::start()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
