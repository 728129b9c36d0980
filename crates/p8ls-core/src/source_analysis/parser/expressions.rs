// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing.
//!
//! Binary operators use Pratt parsing driven by the binding-power table in
//! the parent module. Prefix (suffixed) expressions, the only expressions
//! valid as assignment targets or call statements, are parsed by
//! [`Parser::parse_suffixed_expression`].
//!
//! Numeric literal conversion also lives here: the lexer stores raw text,
//! and [`parse_number`] turns it into the 64-bit float the AST carries,
//! including PICO-8's fractional hex and binary forms.

use crate::ast::{
    BinaryOp, Expression, Identifier, Indexer, LogicalOp, TableField, UnaryOp,
};
use crate::source_analysis::TokenKind;

use super::{DiagnosticCategory, Parser, UNARY_BINDING_POWER, binary_binding_power};

/// Converts a numeric literal's raw text to its value.
///
/// Handles the three literal families:
/// - decimal, including fractions and `e` exponents (delegated to Rust's
///   float parser)
/// - hexadecimal with optional fractional digits (Σ digit·16⁻ⁱ) and a `p`
///   binary exponent (×2ⁿ)
/// - binary with optional fractional bits (Σ bit·2⁻ⁱ)
#[must_use]
pub(super) fn parse_number(raw: &str) -> Option<f64> {
    if let Some(digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return parse_radix(digits, 16, true);
    }
    if let Some(digits) = raw.strip_prefix("0b").or_else(|| raw.strip_prefix("0B")) {
        return parse_radix(digits, 2, false);
    }
    raw.parse::<f64>().ok()
}

/// Parses `int[.frac][p±exp]` in the given radix.
fn parse_radix(text: &str, radix: u32, allow_exponent: bool) -> Option<f64> {
    let (mantissa, exponent) = if allow_exponent {
        match text.split_once(['p', 'P']) {
            Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().ok()?),
            None => (text, 0),
        }
    } else {
        (text, 0)
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value = 0.0f64;
    for c in int_part.chars() {
        value = value * f64::from(radix) + f64::from(c.to_digit(radix)?);
    }
    let mut scale = 1.0 / f64::from(radix);
    for c in frac_part.chars() {
        value += f64::from(c.to_digit(radix)?) * scale;
        scale /= f64::from(radix);
    }
    Some(value * 2.0f64.powi(exponent))
}

impl Parser {
    /// Parses a full expression.
    pub(super) fn parse_expression(&mut self) -> Expression {
        self.parse_sub_expression(0)
    }

    /// Parses a comma-separated expression list (at least one expression).
    pub(super) fn parse_expression_list(&mut self) -> Vec<Expression> {
        let mut expressions = vec![self.parse_expression()];
        while self.match_punct(",") {
            expressions.push(self.parse_expression());
        }
        expressions
    }

    /// Parses `( expr )`, producing a [`Expression::Paren`] node that spans
    /// the parentheses. Used for the PICO-8 one-line `if`/`while` condition,
    /// which is exactly the parenthesized group.
    pub(super) fn parse_paren_expression(&mut self) -> Expression {
        let open_span = self.current_token().span();
        self.expect_punct("(", "expected '('");
        let inner = self.parse_expression();
        self.expect_punct(")", "expected ')' to close expression");
        let span = open_span.merge(self.prev_span());
        Expression::Paren {
            expression: Box::new(inner),
            span,
        }
    }

    /// Pratt expression parser: operand, then operators while their left
    /// binding power is at least `min_bp`.
    fn parse_sub_expression(&mut self, min_bp: u8) -> Expression {
        if self.at_line_break() {
            let span = self.prev_span();
            self.error_at(
                span,
                DiagnosticCategory::UnexpectedToken,
                "expected expression before end of line",
            );
            return Expression::Error { span };
        }

        let mut lhs = if let Some(op) = self.current_unary_op() {
            let op_span = self.advance().span();
            let operand = self.parse_sub_expression(UNARY_BINDING_POWER);
            let span = op_span.merge(operand.span());
            Expression::Unary {
                op,
                operand: Box::new(operand),
                span,
            }
        } else {
            self.parse_simple_expression()
        };

        loop {
            // In a newline-sensitive context an operator on the next line
            // belongs to the next statement, not this expression.
            if self.at_line_break() {
                break;
            }
            let Some(power) = binary_binding_power(self.current_kind()) else {
                break;
            };
            if power.left < min_bp {
                break;
            }
            let op_token = self.advance();
            let rhs = self.parse_sub_expression(power.right);
            let span = lhs.span().merge(rhs.span());
            lhs = match op_token.kind() {
                TokenKind::Keyword(word) if word == "and" => Expression::Logical {
                    op: LogicalOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    span,
                },
                TokenKind::Keyword(word) if word == "or" => Expression::Logical {
                    op: LogicalOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    span,
                },
                kind => {
                    let op = kind
                        .as_str()
                        .and_then(binary_op_from)
                        .expect("binding power table and operator table agree");
                    Expression::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        span,
                    }
                }
            };
        }

        lhs
    }

    /// Returns the unary operator at the current token, if any.
    fn current_unary_op(&self) -> Option<UnaryOp> {
        match self.current_kind() {
            TokenKind::Keyword(word) if word == "not" => Some(UnaryOp::Not),
            TokenKind::Punctuator(text) => match text.as_str() {
                "-" => Some(UnaryOp::Minus),
                "#" => Some(UnaryOp::Length),
                "~" => Some(UnaryOp::BitNot),
                "@" => Some(UnaryOp::Peek),
                "%" => Some(UnaryOp::Peek2),
                "$" => Some(UnaryOp::Peek4),
                _ => None,
            },
            _ => None,
        }
    }

    /// Parses a literal, function expression, table constructor, or
    /// suffixed expression.
    fn parse_simple_expression(&mut self) -> Expression {
        match self.current_kind() {
            TokenKind::Keyword(word) => match word.as_str() {
                "nil" => {
                    let span = self.advance().span();
                    Expression::Nil { span }
                }
                "true" => {
                    let span = self.advance().span();
                    Expression::True { span }
                }
                "false" => {
                    let span = self.advance().span();
                    Expression::False { span }
                }
                "function" => {
                    let function_span = self.advance().span();
                    let body = self.parse_function_body(function_span, None);
                    Expression::Function(body)
                }
                _ => self.parse_suffixed_expression(),
            },
            TokenKind::Number(raw) => {
                let raw = raw.clone();
                let token = self.advance();
                match parse_number(&raw) {
                    Some(value) => Expression::Number {
                        value,
                        raw,
                        span: token.span(),
                    },
                    None => {
                        self.error_at(
                            token.span(),
                            DiagnosticCategory::InvalidNumber,
                            "malformed number literal",
                        );
                        Expression::Error { span: token.span() }
                    }
                }
            }
            TokenKind::Str(value) | TokenKind::LongStr(value) => {
                let value = value.clone();
                let token = self.advance();
                Expression::Str {
                    value,
                    span: token.span(),
                }
            }
            TokenKind::Punctuator(text) if text == "..." => {
                let span = self.advance().span();
                Expression::Vararg { span }
            }
            TokenKind::Punctuator(text) if text == "{" => self.parse_table_constructor(),
            _ => self.parse_suffixed_expression(),
        }
    }

    /// Parses a prefix expression and its suffixes: member access, indexing,
    /// and the three call forms.
    pub(super) fn parse_suffixed_expression(&mut self) -> Expression {
        let mut expression = self.parse_primary();

        loop {
            if self.at_line_break() {
                break;
            }
            match self.current_kind() {
                TokenKind::Punctuator(text) if text == "." => {
                    self.advance();
                    let Some(name) = self.expect_identifier("expected name after '.'") else {
                        break;
                    };
                    let span = expression.span().merge(name.span);
                    expression = Expression::Member {
                        base: Box::new(expression),
                        indexer: Indexer::Dot,
                        name,
                        span,
                    };
                }
                TokenKind::Punctuator(text) if text == ":" => {
                    self.advance();
                    let Some(name) = self.expect_identifier("expected method name after ':'")
                    else {
                        break;
                    };
                    let span = expression.span().merge(name.span);
                    expression = Expression::Member {
                        base: Box::new(expression),
                        indexer: Indexer::Colon,
                        name,
                        span,
                    };
                    // Method access is only valid as the base of a call.
                    if !(self.check_punct("(")
                        || self.check_punct("{")
                        || matches!(
                            self.current_kind(),
                            TokenKind::Str(_) | TokenKind::LongStr(_)
                        ))
                    {
                        self.error(
                            DiagnosticCategory::UnexpectedToken,
                            "method access must be called; expected arguments",
                        );
                    }
                }
                TokenKind::Punctuator(text) if text == "[" => {
                    self.advance();
                    let index = self.parse_expression();
                    self.expect_punct("]", "expected ']' to close index");
                    let span = expression.span().merge(self.prev_span());
                    expression = Expression::Index {
                        base: Box::new(expression),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Punctuator(text) if text == "(" => {
                    self.advance();
                    let arguments = if self.check_punct(")") {
                        Vec::new()
                    } else {
                        self.parse_expression_list()
                    };
                    self.expect_punct(")", "expected ')' to close arguments");
                    let span = expression.span().merge(self.prev_span());
                    expression = Expression::Call {
                        base: Box::new(expression),
                        arguments,
                        span,
                    };
                }
                TokenKind::Punctuator(text) if text == "{" => {
                    let argument = self.parse_table_constructor();
                    let span = expression.span().merge(argument.span());
                    expression = Expression::TableCall {
                        base: Box::new(expression),
                        argument: Box::new(argument),
                        span,
                    };
                }
                TokenKind::Str(value) | TokenKind::LongStr(value) => {
                    let value = value.clone();
                    let token = self.advance();
                    let argument = Expression::Str {
                        value,
                        span: token.span(),
                    };
                    let span = expression.span().merge(token.span());
                    expression = Expression::StringCall {
                        base: Box::new(expression),
                        argument: Box::new(argument),
                        span,
                    };
                }
                _ => break,
            }
        }

        expression
    }

    /// Parses a primary expression: a name or a parenthesized expression.
    fn parse_primary(&mut self) -> Expression {
        match self.current_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let token = self.advance();
                Expression::Identifier(Identifier::new(name, token.span()))
            }
            TokenKind::Punctuator(text) if text == "(" => self.parse_paren_expression(),
            TokenKind::Error(kind) => {
                let kind = *kind;
                let token = self.advance();
                self.error_at(
                    token.span(),
                    DiagnosticCategory::from_lex(kind),
                    kind.to_string(),
                );
                Expression::Error { span: token.span() }
            }
            kind => {
                let message = format!("unexpected token '{kind}', expected expression");
                let span = self.current_token().span();
                self.error_at(span, DiagnosticCategory::UnexpectedToken, message);
                // Structural keywords belong to the enclosing construct;
                // consuming them here would unbalance the block parser.
                if !self.is_at_end() && !self.at_structural_keyword() {
                    self.advance();
                }
                Expression::Error { span }
            }
        }
    }

    /// Returns true for keywords that close or continue an enclosing
    /// construct and must not be consumed during expression recovery.
    fn at_structural_keyword(&self) -> bool {
        self.at_block_end_keyword()
            || matches!(
                self.current_kind(),
                TokenKind::Keyword(word) if matches!(word.as_str(), "then" | "do" | "in")
            )
    }

    /// Parses a table constructor: `{ field {sep field} [sep] }` where
    /// `sep` is `,` or `;`.
    fn parse_table_constructor(&mut self) -> Expression {
        let open_span = self.advance().span(); // {
        let mut fields = Vec::new();

        while !self.is_at_end() && !self.check_punct("}") {
            let field = self.parse_table_field();
            fields.push(field);
            if !(self.match_punct(",") || self.match_punct(";")) {
                break;
            }
        }

        self.expect_punct("}", "expected '}' to close table constructor");
        let span = open_span.merge(self.prev_span());
        Expression::Table { fields, span }
    }

    /// Parses one table field: `[k] = v`, `name = v`, or a list value.
    fn parse_table_field(&mut self) -> TableField {
        if self.check_punct("[") {
            let open_span = self.advance().span();
            let key = self.parse_expression();
            self.expect_punct("]", "expected ']' to close table key");
            self.expect_punct("=", "expected '=' after table key");
            let value = self.parse_expression();
            let span = open_span.merge(value.span());
            return TableField::Keyed { key, value, span };
        }

        if matches!(self.current_kind(), TokenKind::Identifier(_))
            && self.peek_at(1).is_some_and(|kind| kind.is_punct("="))
        {
            let key = self
                .expect_identifier("expected field name")
                .expect("checked identifier");
            self.advance(); // =
            let value = self.parse_expression();
            let span = key.span.merge(value.span());
            return TableField::Named { key, value, span };
        }

        let value = self.parse_expression();
        let span = value.span();
        TableField::List { value, span }
    }
}

/// Maps a binary operator's spelling to [`BinaryOp`], normalizing `!=`.
fn binary_op_from(text: &str) -> Option<BinaryOp> {
    Some(match text {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "\\" => BinaryOp::IntDiv,
        "%" => BinaryOp::Mod,
        "^" => BinaryOp::Pow,
        ".." => BinaryOp::Concat,
        "==" => BinaryOp::Eq,
        "~=" | "!=" => BinaryOp::Ne,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "&" => BinaryOp::BitAnd,
        "|" => BinaryOp::BitOr,
        "^^" => BinaryOp::BitXor,
        "<<" => BinaryOp::ShiftLeft,
        ">>" => BinaryOp::ShiftRight,
        ">>>" => BinaryOp::LogicalShiftRight,
        "<<>" => BinaryOp::RotateLeft,
        ">><" => BinaryOp::RotateRight,
        _ => return None,
    })
}
