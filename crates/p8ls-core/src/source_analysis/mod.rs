// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing infrastructure for PICO-8 Lua source code.
//!
//! This module contains the lexer, parser, and span machinery.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s. Each token
//! carries its source location via [`Span`] and its surrounding trivia
//! (whitespace and comments), which is how the parser observes line breaks in
//! the dialect's newline-sensitive contexts.
//!
//! ```
//! use p8ls_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("x += 1").collect();
//! assert_eq!(tokens.len(), 3); // x, +=, 1
//! ```
//!
//! # Parsing
//!
//! The [`parse`] function converts tokens into a [`Chunk`](crate::ast::Chunk)
//! AST plus a list of [`Diagnostic`]s. Binary operator precedence uses Pratt
//! parsing (see the [`parser`](self::parse) module docs for the table).
//!
//! # Error Handling
//!
//! The lexer uses error recovery: invalid input becomes
//! [`TokenKind::Error`] tokens rather than stopping. The parser converts
//! those into diagnostics, records its own syntax errors, and always returns
//! a chunk; a document with errors still yields a best-effort AST.

mod error;
mod lexer;
mod line_index;
mod parser;
mod span;
mod token;


pub use error::{LexError, LexErrorKind};
pub use lexer::{Lexer, lex, lex_with_eof};
pub use line_index::{LineIndex, Position};
pub use parser::{Diagnostic, DiagnosticCategory, Severity, parse};
pub use span::Span;
pub use token::{KEYWORDS, Token, TokenKind, Trivia, is_keyword};
