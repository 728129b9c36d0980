// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for PICO-8 Lua lexical analysis.
//!
//! Each token consists of:
//! - A [`TokenKind`] indicating the type of token
//! - A [`Span`] indicating its location in source
//! - Leading and trailing [`Trivia`] (whitespace and comments)
//!
//! Newlines live in whitespace trivia rather than in a dedicated token kind.
//! [`Token::has_leading_newline`] is the parser's newline signal: it is
//! consulted only inside newline-sensitive contexts (the PICO-8 one-line
//! `if`/`while` bodies and the `?` print shorthand), where a leading newline
//! acts as a statement terminator.

use ecow::EcoString;

use super::{LexErrorKind, Span};

/// The reserved words of the language.
pub const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Returns `true` if `word` is a reserved keyword.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// The kind of token, not including source location or trivia.
///
/// Tokens are designed to be cheap to clone (using [`EcoString`] for string
/// data).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A reserved word: `if`, `function`, `nil`, ...
    Keyword(EcoString),

    /// An identifier: `foo`, `_update60`, `x1`
    Identifier(EcoString),

    /// A numeric literal, stored as raw source text: `42`, `0x1.8`, `0b1010`
    Number(EcoString),

    /// A short string literal with escapes decoded: `"hi\n"`, `'hi'`
    Str(EcoString),

    /// A long-bracket string literal, content verbatim: `[[...]]`, `[==[...]==]`
    LongStr(EcoString),

    /// An operator or punctuation mark: `+`, `..=`, `>><`, `(`
    Punctuator(EcoString),

    /// A `#include` directive with its path argument.
    Include(EcoString),

    /// Invalid input, carrying the lexical error for diagnostics.
    Error(LexErrorKind),

    /// End of file.
    Eof,
}

impl TokenKind {
    /// Returns `true` if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        matches!(self, Self::Keyword(k) if k == word)
    }

    /// Returns `true` if this token is the given punctuator.
    #[must_use]
    pub fn is_punct(&self, text: &str) -> bool {
        matches!(self, Self::Punctuator(p) if p == text)
    }

    /// Returns `true` if this is the end-of-file marker.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns `true` if this is an error token.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the string content if this token carries one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Keyword(s)
            | Self::Identifier(s)
            | Self::Number(s)
            | Self::Str(s)
            | Self::LongStr(s)
            | Self::Punctuator(s)
            | Self::Include(s) => Some(s),
            Self::Error(_) | Self::Eof => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword(s) | Self::Identifier(s) | Self::Number(s) | Self::Punctuator(s) => {
                write!(f, "{s}")
            }
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::LongStr(s) => write!(f, "[[{s}]]"),
            Self::Include(path) => write!(f, "#include {path}"),
            Self::Error(kind) => write!(f, "<error: {kind}>"),
            Self::Eof => write!(f, "<eof>"),
        }
    }
}

/// Trivia represents non-semantic content like whitespace and comments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trivia {
    /// Whitespace (spaces, tabs, newlines).
    Whitespace(EcoString),

    /// A line comment: `-- comment text`
    LineComment(EcoString),

    /// A block comment: `--[[ comment text ]]`
    BlockComment(EcoString),
}

impl Trivia {
    /// Returns the text content of this trivia.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Whitespace(s) | Self::LineComment(s) | Self::BlockComment(s) => s,
        }
    }

    /// Returns `true` if this trivia contains a newline.
    #[must_use]
    pub fn contains_newline(&self) -> bool {
        self.as_str().contains('\n')
    }

    /// Returns `true` if this is a comment.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_) | Self::BlockComment(_))
    }
}

/// A token with its source location and surrounding trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    span: Span,
    leading_trivia: Vec<Trivia>,
    trailing_trivia: Vec<Trivia>,
}

impl Token {
    /// Creates a new token with no trivia.
    #[must_use]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
        }
    }

    /// Creates a new token with trivia.
    #[must_use]
    pub fn with_trivia(
        kind: TokenKind,
        span: Span,
        leading_trivia: Vec<Trivia>,
        trailing_trivia: Vec<Trivia>,
    ) -> Self {
        Self {
            kind,
            span,
            leading_trivia,
            trailing_trivia,
        }
    }

    /// Returns the kind of this token.
    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Consumes the token and returns its kind.
    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    /// Returns the source span of this token (excluding trivia).
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns the trivia that precedes this token.
    #[must_use]
    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading_trivia
    }

    /// Returns the trivia that follows this token.
    #[must_use]
    pub fn trailing_trivia(&self) -> &[Trivia] {
        &self.trailing_trivia
    }

    /// Returns `true` if there's a newline in the leading trivia.
    ///
    /// In newline-sensitive parser contexts this marks a statement boundary.
    #[must_use]
    pub fn has_leading_newline(&self) -> bool {
        self.leading_trivia.iter().any(Trivia::contains_newline)
    }
}
