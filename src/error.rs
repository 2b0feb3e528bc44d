//! Error types produced while loading a script.
//!
//! Runtime conditions (an out-of-range reassembly index, a dangling link
//! keyword) never produce a `Result::Err` — they degrade to the `THINGY`
//! sentinel or a nomatch response, and are reported only through the
//! [`crate::trace::Tracer`].

use std::fmt;

/// The distinct kinds of malformed script the parser can detect. Carries
/// its own message text via `thiserror`; [`ScriptError`] adds the line
/// number (for the kinds that have one).
#[derive(Debug, thiserror::Error)]
pub enum ScriptErrorKind {
    #[error("expected '('")]
    ExpectedOpenParen,
    #[error("expected ')'")]
    ExpectedCloseParen,
    #[error("expected symbol")]
    ExpectedSymbol,
    #[error("expected keyword|MEMORY|NONE")]
    ExpectedKeyword,
    #[error("expected '='")]
    ExpectedEquals,
    #[error("expected equivalence class name")]
    ExpectedEquivalenceClassName,
    #[error("keyword '{0}' has no associated body")]
    EmptyKeywordBody(String),
    #[error("keyword rule already specified for keyword '{0}'")]
    DuplicateKeyword(String),
    #[error("decompose pattern cannot be empty")]
    EmptyDecomposition,
    #[error("malformed rule")]
    MalformedRule,
    #[error("expected '(=reference)' in PRE rule")]
    MalformedPreForm,
    #[error("multiple MEMORY rules specified")]
    MultipleMemoryRules,
    #[error("expected 'decompose_terms = reassemble_terms'")]
    EmptyMemoryTransform,
    #[error("expected keyword to follow MEMORY")]
    ExpectedMemoryKeyword,

    /// Reported without a line number: these are whole-script invariants
    /// checked after the token stream has been fully consumed.
    #[error("no NONE rule specified; see Jan 1966 CACM page 41")]
    NoNoneRule,
    #[error("no MEMORY rule specified; see Jan 1966 CACM page 41")]
    NoMemoryRule,
    #[error(
        "MEMORY rule keyword '{0}' is not also a keyword in its own right; \
         see Jan 1966 CACM page 41"
    )]
    UnknownMemoryKeyword(String),
}

impl ScriptErrorKind {
    /// Whole-script invariants are reported without "on line N" — they are
    /// not anchored to a single token.
    fn has_line(&self) -> bool {
        !matches!(
            self,
            ScriptErrorKind::NoNoneRule
                | ScriptErrorKind::NoMemoryRule
                | ScriptErrorKind::UnknownMemoryKeyword(_)
        )
    }
}

/// A fatal error encountered while parsing a script, carrying the line on
/// which it was detected (when the error kind is line-anchored).
#[derive(Debug)]
pub struct ScriptError {
    pub line: u32,
    pub kind: ScriptErrorKind,
}

impl ScriptError {
    pub fn new(line: u32, kind: ScriptErrorKind) -> ScriptError {
        ScriptError { line, kind }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.has_line() {
            write!(f, "Script error on line {}: {}", self.line, self.kind)
        } else {
            write!(f, "Script error: {}", self.kind)
        }
    }
}
