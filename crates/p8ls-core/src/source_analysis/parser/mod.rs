// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for PICO-8 Lua source code.
//!
//! This parser builds an AST from a stream of tokens. It is designed for IDE
//! use with comprehensive error recovery and diagnostics.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** - The parser MUST always produce a chunk
//! - **Multiple errors** - Report all errors, don't stop at the first
//! - **Precise spans** - Every diagnostic points to an exact source location
//! - **Synchronization points** - Recover at statement boundaries
//!
//! # Operator Precedence (Pratt Parsing)
//!
//! Binary operator precedence is handled with a binding-power table
//! ([`binary_binding_power`]), lowest to highest:
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 10  | `or` | Left |
//! | 20  | `and` | Left |
//! | 30  | `< > <= >= == ~= !=` | Left |
//! | 40  | `\|` | Left |
//! | 50  | `^^` | Left |
//! | 60  | `&` | Left |
//! | 70  | `<< >> >>> <<> >><` | Left |
//! | 80  | `..` | Right |
//! | 90  | `+ -` | Left |
//! | 100 | `* / \ %` | Left |
//! | 110 | unary `not # - ~ @ % $` | Prefix |
//! | 120 | `^` | Right |
//!
//! # Newline Sensitivity
//!
//! The PICO-8 one-line `if`/`while` forms and the `?` print shorthand end at
//! the line break. The parser threads a `newline_terminated` mode flag: while
//! it is set, a token with leading-newline trivia terminates the current
//! statement list, expression, and `return` argument list. The flag is set on
//! entry to a one-line body and cleared when a bracketed block (`do`…`end`,
//! function bodies, …) begins, so nested multi-line constructs parse
//! normally.
//!
//! # Usage
//!
//! ```
//! use p8ls_core::source_analysis::{lex_with_eof, parse};
//!
//! let tokens = lex_with_eof("x += 1");
//! let (chunk, diagnostics) = parse(tokens);
//!
//! assert!(diagnostics.is_empty());
//! assert_eq!(chunk.block.statements.len(), 1);
//! ```

use crate::ast::{Block, Chunk, Identifier, Statement};
use crate::source_analysis::{LexErrorKind, Span, Token, TokenKind};
use ecow::EcoString;

// Submodules with additional impl blocks for Parser
mod expressions;
mod statements;

#[cfg(test)]
mod property_tests;

// ============================================================================
// Pratt Parsing for Binary Operator Precedence
// ============================================================================

/// Binding power of the unary operators (`not # - ~ @ % $`).
///
/// Sits between the multiplicative level and `^`, so `-x^2` parses as
/// `-(x^2)` while `-x*y` parses as `(-x)*y`.
pub(super) const UNARY_BINDING_POWER: u8 = 110;

/// Binding power for binary operators (Pratt parsing).
///
/// Higher values bind tighter. Left and right binding powers differ
/// for associativity:
/// - Left-associative: `left == right - 1` (e.g., `+`, `-`)
/// - Right-associative: `left == right + 1` (e.g., `..`, `^`)
#[derive(Debug, Clone, Copy)]
pub(super) struct BindingPower {
    /// How tightly this operator binds to its left operand.
    pub(super) left: u8,
    /// How tightly this operator binds to its right operand.
    pub(super) right: u8,
}

impl BindingPower {
    /// Creates a left-associative binding power.
    const fn left_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
        }
    }

    /// Creates a right-associative binding power.
    const fn right_assoc(precedence: u8) -> Self {
        Self {
            left: precedence + 1,
            right: precedence,
        }
    }
}

/// Gets the binding power for a binary operator token.
///
/// Returns `None` for anything that is not a binary operator, allowing the
/// parser to treat it as the end of an expression (useful for error
/// recovery).
pub(super) fn binary_binding_power(kind: &TokenKind) -> Option<BindingPower> {
    let text = match kind {
        TokenKind::Keyword(word) if word == "and" || word == "or" => word.as_str(),
        TokenKind::Punctuator(text) => text.as_str(),
        _ => return None,
    };
    match text {
        "or" => Some(BindingPower::left_assoc(10)),
        "and" => Some(BindingPower::left_assoc(20)),

        // Comparison; `!=` is the PICO-8 spelling of `~=`
        "<" | ">" | "<=" | ">=" | "==" | "~=" | "!=" => Some(BindingPower::left_assoc(30)),

        // Bitwise, loosest to tightest: | ^^ & then shifts/rotates
        "|" => Some(BindingPower::left_assoc(40)),
        "^^" => Some(BindingPower::left_assoc(50)),
        "&" => Some(BindingPower::left_assoc(60)),
        "<<" | ">>" | ">>>" | "<<>" | ">><" => Some(BindingPower::left_assoc(70)),

        // Concatenation is right-associative
        ".." => Some(BindingPower::right_assoc(80)),

        "+" | "-" => Some(BindingPower::left_assoc(90)),
        "*" | "/" | "\\" | "%" => Some(BindingPower::left_assoc(100)),

        // Exponentiation binds tighter than unary and is right-associative
        "^" => Some(BindingPower::right_assoc(120)),

        _ => None,
    }
}

/// Parse a sequence of tokens into a chunk.
///
/// This is the main entry point for parsing. It always returns a [`Chunk`],
/// even when there are syntax errors. Check the returned diagnostics.
///
/// # Examples
///
/// ```
/// use p8ls_core::source_analysis::{lex_with_eof, parse};
///
/// let tokens = lex_with_eof("print(\"hi\")");
/// let (chunk, diagnostics) = parse(tokens);
///
/// assert!(diagnostics.is_empty());
/// assert_eq!(chunk.block.statements.len(), 1);
/// ```
#[must_use]
pub fn parse(tokens: Vec<Token>) -> (Chunk, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let chunk = parser.parse_chunk();
    (chunk, parser.diagnostics)
}

/// A diagnostic message (error or warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The machine-readable kind.
    pub category: DiagnosticCategory,
    /// The error message.
    pub message: EcoString,
    /// The source location.
    pub span: Span,
    /// Optional hint for how to fix the issue.
    pub hint: Option<EcoString>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(category: DiagnosticCategory, message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(
        category: DiagnosticCategory,
        message: impl Into<EcoString>,
        span: Span,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Adds a hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A syntax error.
    Error,
    /// A recoverable issue that should be addressed.
    Warning,
}

/// The kind of diagnostic, independent of its message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// The lexer hit a character that starts no token.
    UnexpectedCharacter,
    /// A quoted string ran to end of line or file.
    UnterminatedString,
    /// A long-bracket string never found its matching close.
    UnterminatedLongBracket,
    /// A bad escape sequence inside a string literal.
    InvalidEscape,
    /// A malformed numeric literal.
    InvalidNumber,
    /// The parser found a token it cannot use here.
    UnexpectedToken,
    /// A statement that doesn't match any statement form.
    MalformedStatement,
    /// The left side of an assignment is not assignable.
    InvalidAssignmentTarget,
    /// A name that resolves to no definition (resolver warning).
    UndefinedIdentifier,
    /// A local that is never read or written again (resolver warning).
    UnusedLocal,
}

impl DiagnosticCategory {
    /// Maps a lexical error kind to its diagnostic category.
    #[must_use]
    pub fn from_lex(kind: LexErrorKind) -> Self {
        match kind {
            LexErrorKind::UnexpectedCharacter(_) => Self::UnexpectedCharacter,
            LexErrorKind::UnterminatedString => Self::UnterminatedString,
            LexErrorKind::UnterminatedLongBracket => Self::UnterminatedLongBracket,
            LexErrorKind::InvalidEscape => Self::InvalidEscape,
            LexErrorKind::InvalidNumber => Self::InvalidNumber,
        }
    }
}

/// The parser state.
pub(super) struct Parser {
    /// The tokens being parsed.
    pub(super) tokens: Vec<Token>,
    /// Current token index.
    pub(super) current: usize,
    /// Accumulated diagnostics.
    pub(super) diagnostics: Vec<Diagnostic>,
    /// Whether a leading newline terminates the current construct (the
    /// PICO-8 one-line `if`/`while` bodies and `?` shorthand).
    pub(super) newline_terminated: bool,
}

impl Parser {
    /// Creates a new parser for the given tokens.
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            newline_terminated: false,
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token.
    pub(super) fn current_token(&self) -> &Token {
        if self.current < self.tokens.len() {
            &self.tokens[self.current]
        } else {
            // Fall back to the last token (EOF in well-formed input) rather
            // than panicking if we've advanced past the end.
            self.tokens
                .last()
                .expect("parser has no tokens; expected at least an EOF token")
        }
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> &TokenKind {
        self.current_token().kind()
    }

    /// Returns the token at the given offset from the current position.
    pub(super) fn token_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset)
    }

    /// Peeks at the token kind at the given offset.
    pub(super) fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.token_at(offset).map(Token::kind)
    }

    /// Checks if we're at the end of input.
    pub(super) fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Advances to the next token and returns the previous one.
    pub(super) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current.saturating_sub(1)].clone()
    }

    /// Returns the span of the most recently consumed token.
    pub(super) fn prev_span(&self) -> Span {
        let index = self.current.saturating_sub(1);
        self.tokens[index.min(self.tokens.len() - 1)].span()
    }

    /// Checks whether the current token is the given punctuator.
    pub(super) fn check_punct(&self, text: &str) -> bool {
        self.current_kind().is_punct(text)
    }

    /// Consumes the current token if it is the given punctuator.
    pub(super) fn match_punct(&mut self, text: &str) -> bool {
        if self.check_punct(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the given punctuator, reporting an error if absent.
    pub(super) fn expect_punct(&mut self, text: &str, message: &str) -> Option<Token> {
        if self.check_punct(text) {
            Some(self.advance())
        } else {
            self.error(DiagnosticCategory::UnexpectedToken, message);
            None
        }
    }

    /// Checks whether the current token is the given keyword.
    pub(super) fn check_keyword(&self, word: &str) -> bool {
        self.current_kind().is_keyword(word)
    }

    /// Consumes the current token if it is the given keyword.
    pub(super) fn match_keyword(&mut self, word: &str) -> bool {
        if self.check_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the given keyword, reporting an error if absent.
    pub(super) fn expect_keyword(&mut self, word: &str, message: &str) -> Option<Token> {
        if self.check_keyword(word) {
            Some(self.advance())
        } else {
            self.error(DiagnosticCategory::UnexpectedToken, message);
            None
        }
    }

    /// Expects an identifier, reporting an error if absent.
    pub(super) fn expect_identifier(&mut self, message: &str) -> Option<Identifier> {
        if let TokenKind::Identifier(name) = self.current_kind() {
            let name = name.clone();
            let token = self.advance();
            Some(Identifier::new(name, token.span()))
        } else {
            self.error(DiagnosticCategory::UnexpectedToken, message);
            None
        }
    }

    // ========================================================================
    // Error Handling & Recovery
    // ========================================================================

    /// Reports an error at the current token.
    pub(super) fn error(&mut self, category: DiagnosticCategory, message: impl Into<EcoString>) {
        let span = self.current_token().span();
        self.error_at(span, category, message);
    }

    /// Reports an error at the given span.
    pub(super) fn error_at(
        &mut self,
        span: Span,
        category: DiagnosticCategory,
        message: impl Into<EcoString>,
    ) {
        self.diagnostics
            .push(Diagnostic::error(category, message, span));
    }

    /// Returns true in a newline-sensitive context when the current token
    /// starts a new line, i.e. the previous statement just ended.
    pub(super) fn at_line_break(&self) -> bool {
        self.newline_terminated && self.current_token().has_leading_newline()
    }

    /// Returns true if the current token closes an enclosing block.
    pub(super) fn at_block_end_keyword(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Keyword(word) if matches!(word.as_str(), "end" | "else" | "elseif" | "until")
        )
    }

    /// Synchronizes the parser to a safe recovery point.
    ///
    /// Skips tokens until a statement boundary: a statement-starting keyword,
    /// a block terminator (`end`, `else`, `elseif`, `until`), or the start of
    /// a new line. The failed parse has already consumed the offending token,
    /// so a token already at a recovery point is left in place.
    pub(super) fn synchronize(&mut self) {
        while !self.is_at_end() && !self.at_recovery_point() {
            self.advance();
        }
    }

    /// Returns true if the current token is at a recovery point.
    fn at_recovery_point(&self) -> bool {
        if self.current_token().has_leading_newline() {
            return true;
        }
        if self.at_block_end_keyword() {
            return true;
        }
        match self.current_kind() {
            TokenKind::Keyword(word) => matches!(
                word.as_str(),
                "local"
                    | "if"
                    | "while"
                    | "repeat"
                    | "for"
                    | "function"
                    | "return"
                    | "break"
                    | "goto"
                    | "do"
            ),
            TokenKind::Include(_) => true,
            kind => kind.is_punct("::") || kind.is_punct("?"),
        }
    }

    // ========================================================================
    // Chunk & Block Parsing
    // ========================================================================

    /// Parses a complete chunk (top-level).
    fn parse_chunk(&mut self) -> Chunk {
        let start = self.current_token().span();
        let statements = self.parse_statements(false);
        let end = self.tokens.last().map_or(start, Token::span);
        let span = Span::new(0, end.end());
        let block_span = statements_span(&statements).unwrap_or(Span::new(start.start(), start.start()));
        Chunk {
            block: Block::new(statements, block_span),
            span,
        }
    }

    /// Parses statements until a terminator.
    ///
    /// With `stop_at_block_end`, block-closing keywords end the list; the
    /// chunk-level caller instead treats them as stray tokens. In a
    /// newline-sensitive context a leading newline ends the list.
    pub(super) fn parse_statements(&mut self, stop_at_block_end: bool) -> Vec<Statement> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if stop_at_block_end && self.at_block_end_keyword() {
                break;
            }
            if self.at_line_break() {
                break;
            }
            if self.match_punct(";") {
                continue;
            }
            let before = self.current;
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => self.synchronize(),
            }
            if self.current == before {
                // A parse that consumed nothing would loop forever; skip the
                // offending token (it has already been diagnosed).
                self.advance();
            }
        }
        statements
    }

    /// Parses a bracketed block body (`do`…`end`, function bodies, clause
    /// bodies). Suspends newline termination for its duration, so multi-line
    /// constructs nested inside a one-line `if` parse normally.
    pub(super) fn parse_block(&mut self) -> Block {
        let saved = std::mem::replace(&mut self.newline_terminated, false);
        let start = self.current_token().span();
        let statements = self.parse_statements(true);
        self.newline_terminated = saved;
        let span = statements_span(&statements).unwrap_or(Span::new(start.start(), start.start()));
        Block::new(statements, span)
    }

    /// Parses a PICO-8 one-line body: statements up to the end of the
    /// current line (or a block-end keyword on the same line).
    pub(super) fn parse_line_body(&mut self) -> Block {
        let saved = std::mem::replace(&mut self.newline_terminated, true);
        let start = self.current_token().span();
        let statements = self.parse_statements(true);
        self.newline_terminated = saved;
        let span = statements_span(&statements).unwrap_or(Span::new(start.start(), start.start()));
        Block::new(statements, span)
    }
}

/// Returns the merged span of a statement list, if non-empty.
fn statements_span(statements: &[Statement]) -> Option<Span> {
    let first = statements.first()?.span();
    let last = statements.last()?.span();
    Some(first.merge(last))
}
