// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for PICO-8 Lua source code.
//!
//! This module converts source text into a stream of [`Token`]s. The lexer
//! is hand-written for maximum control over error recovery and IDE features.
//!
//! # Design Principles
//!
//! - **Error recovery**: Never panic on malformed input; emit [`TokenKind::Error`]
//! - **Trivia preservation**: Whitespace and comments attach to tokens, so the
//!   parser can detect newline boundaries in the dialect's newline-sensitive
//!   contexts
//! - **Precise spans**: Every token carries its exact source location
//!
//! # Dialect Notes
//!
//! Beyond standard Lua 5.1 tokens, the lexer understands the PICO-8
//! extensions: binary literals (`0b1010.01`), fractional hex literals
//! (`0x0.8`), the compound-assignment operator family (`+=` through `>><=`),
//! the extra bit operators (`^^`, `<<>`, `>><`, `>>>`), the peek/print
//! punctuators (`@`, `$`, `?`), `!=` as an alternate inequality spelling,
//! and `#include` directives.
//!
//! # Example
//!
//! ```
//! use p8ls_core::source_analysis::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("x += 1").collect();
//! assert_eq!(tokens.len(), 3); // x, +=, 1 (EOF excluded from iterator)
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{LexErrorKind, Span, Token, TokenKind, Trivia, is_keyword};

/// Multi-character operators, grouped by length, longest match first.
///
/// The four-character group is the tail of the PICO-8 compound-assignment
/// family (`>>>=` arithmetic-shift-assign, `<<>=`/`>><=` rotate-assign).
const OPERATORS_4: &[&str] = &["<<>=", ">><=", ">>>="];
const OPERATORS_3: &[&str] = &["...", "..=", "<<=", "<<>", ">>=", ">><", ">>>", "^^="];
const OPERATORS_2: &[&str] = &[
    "!=", "%=", "&=", "*=", "+=", "-=", "..", "/=", "::", "<<", "<=", "==", ">=", ">>", "\\=",
    "^=", "^^", "|=", "~=",
];
const OPERATORS_1: &[char] = &[
    '+', '-', '*', '/', '\\', '%', '^', '#', '&', '|', '~', '<', '>', '=', '(', ')', '{', '}',
    '[', ']', ';', ':', ',', '.', '@', '$', '?',
];

/// A lexer that tokenizes PICO-8 Lua source code.
///
/// The lexer produces tokens with their source spans and attached trivia
/// (whitespace and comments). It implements [`Iterator`] for easy consumption.
///
/// # Error Recovery
///
/// The lexer never fails completely. Unknown characters, unterminated strings,
/// and unterminated long brackets produce [`TokenKind::Error`] tokens carrying
/// a [`LexErrorKind`], allowing parsing to continue.
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
    /// Pending trivia to attach to the next token.
    pending_trivia: Vec<Trivia>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            pending_trivia: Vec::new(),
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming (n=0 is the same as
    /// `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    /// Creates a span from start to current position.
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current_position())
    }

    /// Extracts source text for a span.
    fn text_for(&self, span: Span) -> &'src str {
        &self.source[span.as_range()]
    }

    /// Returns the remaining source from the current position.
    fn rest(&self) -> &'src str {
        &self.source[self.position..]
    }

    /// Skips whitespace and comments, collecting them as trivia.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    let start = self.current_position();
                    self.advance_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
                    let text = self.text_for(self.span_from(start));
                    self.pending_trivia
                        .push(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('-') if self.peek_char_n(1) == Some('-') => {
                    self.lex_comment();
                }
                _ => break,
            }
        }
    }

    /// Lexes a comment: `-- ...` or `--[=*[ ... ]=*]`.
    fn lex_comment(&mut self) {
        let start = self.current_position();
        self.advance(); // -
        self.advance(); // -

        if let Some(level) = self.peek_long_bracket_level() {
            // Block comment; an unterminated one runs to EOF and is
            // recovered silently as trivia.
            let _ = self.consume_long_bracket(level);
            let text = self.text_for(self.span_from(start));
            self.pending_trivia
                .push(Trivia::BlockComment(EcoString::from(text)));
        } else {
            self.advance_while(|c| c != '\n');
            let text = self.text_for(self.span_from(start));
            self.pending_trivia
                .push(Trivia::LineComment(EcoString::from(text)));
        }
    }

    /// Collects trailing trivia (same-line whitespace and comments).
    fn collect_trailing_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t') => {
                    let start = self.current_position();
                    self.advance_while(|c| matches!(c, ' ' | '\t'));
                    let text = self.text_for(self.span_from(start));
                    self.pending_trivia
                        .push(Trivia::Whitespace(EcoString::from(text)));
                }
                Some('-')
                    if self.peek_char_n(1) == Some('-')
                        && self.long_bracket_level_at(2).is_none() =>
                {
                    // Line comment ends trailing trivia. Block comments stay
                    // leading so a multi-line comment's newline is visible to
                    // the next token.
                    self.lex_comment();
                    break;
                }
                _ => break,
            }
        }
    }

    /// Lexes the next token.
    fn lex_token(&mut self) -> Token {
        self.skip_trivia();
        let leading_trivia = std::mem::take(&mut self.pending_trivia);

        let start = self.current_position();

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => self.lex_token_kind(c),
        };

        let span = self.span_from(start);

        self.collect_trailing_trivia();
        let trailing_trivia = std::mem::take(&mut self.pending_trivia);

        Token::with_trivia(kind, span, leading_trivia, trailing_trivia)
    }

    /// Lexes a token kind based on the first character.
    fn lex_token_kind(&mut self, c: char) -> TokenKind {
        match c {
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier_or_keyword(),

            '0'..='9' => self.lex_number(),

            // A leading-dot fraction like `.5`; otherwise `.` is an operator.
            '.' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),

            '"' | '\'' => self.lex_short_string(c),

            '[' => {
                if let Some(level) = self.peek_long_bracket_level() {
                    self.lex_long_string(level)
                } else {
                    self.advance();
                    TokenKind::Punctuator(EcoString::from("["))
                }
            }

            '#' => self.lex_hash_or_include(),

            '!' if self.peek_char_n(1) == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::Punctuator(EcoString::from("!="))
            }

            _ => self.lex_operator(c),
        }
    }

    /// Lexes an identifier or keyword.
    fn lex_identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.current_position();
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = self.text_for(self.span_from(start));
        if is_keyword(text) {
            TokenKind::Keyword(EcoString::from(text))
        } else {
            TokenKind::Identifier(EcoString::from(text))
        }
    }

    /// Lexes a numeric literal: decimal, hexadecimal, or binary.
    ///
    /// The token stores raw source text; conversion to a value happens in the
    /// parser. Grammars:
    ///
    /// - decimal: `[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?` (also `.5`)
    /// - hex: `0x[0-9a-fA-F]+(\.[0-9a-fA-F]+)?(p[+-]?[0-9]+)?`
    /// - binary: `0b[01]+(\.[01]+)?`
    fn lex_number(&mut self) -> TokenKind {
        let start = self.current_position();

        if self.peek_char() == Some('0') && matches!(self.peek_char_n(1), Some('x' | 'X')) {
            self.advance(); // 0
            self.advance(); // x
            return self.lex_radix_digits(start, |c| c.is_ascii_hexdigit(), true);
        }
        if self.peek_char() == Some('0') && matches!(self.peek_char_n(1), Some('b' | 'B')) {
            self.advance(); // 0
            self.advance(); // b
            return self.lex_radix_digits(start, |c| matches!(c, '0' | '1'), false);
        }

        // Integer part (may be empty for `.5` forms).
        self.advance_while(|c| c.is_ascii_digit());

        // Fractional part: decimal point followed by a digit.
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit());
        }

        // Exponent, only when digits follow.
        if matches!(self.peek_char(), Some('e' | 'E')) && self.exponent_has_digits() {
            self.advance(); // e
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.advance_while(|c| c.is_ascii_digit());
        }

        let text = self.text_for(self.span_from(start));
        TokenKind::Number(EcoString::from(text))
    }

    /// Lexes the digits of a hex or binary literal after its radix prefix.
    fn lex_radix_digits(
        &mut self,
        start: u32,
        is_digit: impl Fn(char) -> bool + Copy,
        allow_binary_exponent: bool,
    ) -> TokenKind {
        if !self.peek_char().is_some_and(is_digit) {
            // `0x` or `0b` with nothing after it.
            return TokenKind::Error(LexErrorKind::InvalidNumber);
        }
        self.advance_while(is_digit);

        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(is_digit) {
            self.advance(); // .
            self.advance_while(is_digit);
        }

        // Hex floats take a binary exponent: 0x1p4, 0xA.8p-2.
        if allow_binary_exponent
            && matches!(self.peek_char(), Some('p' | 'P'))
            && self.exponent_has_digits()
        {
            self.advance(); // p
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.advance_while(|c| c.is_ascii_digit());
        }

        let text = self.text_for(self.span_from(start));
        TokenKind::Number(EcoString::from(text))
    }

    /// Returns true if the exponent marker at the current position is
    /// followed by digits (with an optional sign).
    fn exponent_has_digits(&self) -> bool {
        match self.peek_char_n(1) {
            Some('+' | '-') => self.peek_char_n(2).is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    /// Lexes a short string literal delimited by `"` or `'`, decoding escapes.
    fn lex_short_string(&mut self, quote: char) -> TokenKind {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return TokenKind::Error(LexErrorKind::UnterminatedString);
                }
                Some(c) if c == quote => {
                    self.advance(); // closing quote
                    return TokenKind::Str(EcoString::from(value.as_str()));
                }
                Some('\\') => {
                    self.advance(); // backslash
                    match self.lex_escape() {
                        Ok(decoded) => value.push(decoded),
                        Err(kind) => {
                            // Recover by skipping to the closing quote so the
                            // rest of the line still lexes cleanly.
                            self.skip_to_string_end(quote);
                            return TokenKind::Error(kind);
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }
    }

    /// Decodes one escape sequence after the backslash has been consumed.
    fn lex_escape(&mut self) -> Result<char, LexErrorKind> {
        match self.advance() {
            Some('n' | '\n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some('x') => {
                let hi = self.advance().and_then(|c| c.to_digit(16));
                let lo = self.advance().and_then(|c| c.to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        char::from_u32(hi * 16 + lo).ok_or(LexErrorKind::InvalidEscape)
                    }
                    _ => Err(LexErrorKind::InvalidEscape),
                }
            }
            Some(c) if c.is_ascii_digit() => {
                // Up to three decimal digits, value must fit in a byte.
                let mut value = c.to_digit(10).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek_char().and_then(|c| c.to_digit(10)) {
                        Some(digit) => {
                            self.advance();
                            value = value * 10 + digit;
                        }
                        None => break,
                    }
                }
                if value > 255 {
                    return Err(LexErrorKind::InvalidEscape);
                }
                char::from_u32(value).ok_or(LexErrorKind::InvalidEscape)
            }
            // Unknown escapes are preserved literally rather than rejected.
            Some(c) => Ok(c),
            None => Err(LexErrorKind::UnterminatedString),
        }
    }

    /// Skips to the end of a string after an escape error, consuming the
    /// closing quote if found on the same line.
    fn skip_to_string_end(&mut self, quote: char) {
        loop {
            match self.peek_char() {
                None | Some('\n') => break,
                Some('\\') => {
                    self.advance();
                    if self.peek_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some(c) => {
                    self.advance();
                    if c == quote {
                        break;
                    }
                }
            }
        }
    }

    /// Returns the `=`-count if a long bracket opener starts at the current
    /// position: `[[` is level 0, `[=[` level 1, and so on.
    fn peek_long_bracket_level(&self) -> Option<usize> {
        self.long_bracket_level_at(0)
    }

    /// Returns the `=`-count of a long bracket opener starting `offset`
    /// characters ahead, if one is there.
    fn long_bracket_level_at(&self, offset: usize) -> Option<usize> {
        if self.peek_char_n(offset) != Some('[') {
            return None;
        }
        let mut level = 0;
        while self.peek_char_n(offset + 1 + level) == Some('=') {
            level += 1;
        }
        (self.peek_char_n(offset + 1 + level) == Some('[')).then_some(level)
    }

    /// Consumes a long bracket (`[=*[` through the matching `]=*]`),
    /// returning the content span, or `Err(())` when unterminated.
    ///
    /// A closing bracket only matches with the exact same `=` count, so
    /// `]==]` does not terminate a `[=[` string.
    fn consume_long_bracket(&mut self, level: usize) -> Result<Span, ()> {
        self.advance(); // [
        for _ in 0..level {
            self.advance(); // =
        }
        self.advance(); // [

        let content_start = self.current_position();
        loop {
            match self.peek_char() {
                None => return Err(()),
                Some(']') => {
                    let mut close = 1;
                    while self.peek_char_n(close) == Some('=') {
                        close += 1;
                    }
                    if close - 1 == level && self.peek_char_n(close) == Some(']') {
                        let content_end = self.current_position();
                        for _ in 0..=close {
                            self.advance();
                        }
                        return Ok(Span::new(content_start, content_end));
                    }
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Lexes a long-bracket string literal, content preserved verbatim.
    fn lex_long_string(&mut self, level: usize) -> TokenKind {
        match self.consume_long_bracket(level) {
            Ok(content) => TokenKind::LongStr(EcoString::from(self.text_for(content))),
            Err(()) => TokenKind::Error(LexErrorKind::UnterminatedLongBracket),
        }
    }

    /// Lexes `#` as the length operator or a `#include` directive.
    ///
    /// The directive form requires the literal word `include` (with a
    /// non-identifier character after it); the rest of the line is the path.
    fn lex_hash_or_include(&mut self) -> TokenKind {
        let rest = self.rest();
        let is_directive = rest[1..].starts_with("include")
            && !rest
                .get(8..)
                .and_then(|after| after.chars().next())
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');

        if !is_directive {
            self.advance();
            return TokenKind::Punctuator(EcoString::from("#"));
        }

        for _ in 0.."#include".len() {
            self.advance();
        }
        self.advance_while(|c| matches!(c, ' ' | '\t'));
        let path_start = self.current_position();
        self.advance_while(|c| c != '\n');
        let path = self.text_for(self.span_from(path_start)).trim_end();
        TokenKind::Include(EcoString::from(path))
    }

    /// Lexes an operator with longest-match semantics.
    fn lex_operator(&mut self, c: char) -> TokenKind {
        for (len, table) in [(4, OPERATORS_4), (3, OPERATORS_3), (2, OPERATORS_2)] {
            let candidate: String = (0..len).filter_map(|n| self.peek_char_n(n)).collect();
            if candidate.chars().count() == len && table.contains(&candidate.as_str()) {
                for _ in 0..len {
                    self.advance();
                }
                return TokenKind::Punctuator(EcoString::from(candidate.as_str()));
            }
        }

        if OPERATORS_1.contains(&c) {
            self.advance();
            let mut text = EcoString::new();
            text.push(c);
            return TokenKind::Punctuator(text);
        }

        self.advance();
        TokenKind::Error(LexErrorKind::UnexpectedCharacter(c))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lex_token();
        if token.kind().is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

/// Convenience function to lex source into a vector of tokens (excluding EOF).
///
/// For most use cases, prefer using the `Lexer` iterator directly.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Convenience function to lex source into a vector of tokens including EOF.
#[must_use]
pub fn lex_with_eof(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.lex_token();
        let is_eof = token.kind().is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}
