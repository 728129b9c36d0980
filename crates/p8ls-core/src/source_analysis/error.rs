// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical error types.
//!
//! Errors carry source locations ([`Span`]) for precise diagnostics and
//! integrate with [`miette`] for rendering. The lexer itself never fails:
//! malformed input becomes `TokenKind::Error` tokens carrying a
//! [`LexErrorKind`], which the parser surfaces as diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use super::Span;

/// A lexical error encountered during tokenization.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic()]
pub struct LexError {
    /// The kind of lexical error.
    #[source]
    pub kind: LexErrorKind,
    /// The source location of the error.
    #[label("here")]
    pub span: Span,
}

impl LexError {
    /// Creates a new lexical error.
    #[must_use]
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of lexical error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LexErrorKind {
    /// An unexpected character was encountered.
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    /// A quoted string literal ran to end of line or end of file.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// A `[=*[` string or comment never found its matching `]=*]`.
    #[error("unterminated long bracket")]
    UnterminatedLongBracket,

    /// A `\x` escape without two hex digits, or a decimal escape above 255.
    #[error("invalid escape sequence in string literal")]
    InvalidEscape,

    /// A numeric literal with no digits after its radix prefix.
    #[error("malformed number literal")]
    InvalidNumber,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = LexError::new(LexErrorKind::UnexpectedCharacter('§'), Span::new(0, 2));
        assert_eq!(err.to_string(), "unexpected character '§'");

        let err = LexError::new(LexErrorKind::UnterminatedString, Span::new(0, 10));
        assert_eq!(err.to_string(), "unterminated string literal");
    }

    #[test]
    fn lex_error_span() {
        let err = LexError::new(LexErrorKind::UnterminatedLongBracket, Span::new(5, 15));
        assert_eq!(err.span.start(), 5);
        assert_eq!(err.span.end(), 15);
    }
}
