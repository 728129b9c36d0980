// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the parser.
//!
//! 1. **Parser never panics** — any token stream produces a chunk
//! 2. **Parsing is deterministic** — same input, same AST and diagnostics
//! 3. **Span containment** — every node's span contains its children's spans
//! 4. **Valid programs parse cleanly** — generated well-formed programs
//!    produce no diagnostics

use proptest::prelude::*;

use super::parse;
use crate::ast::{Block, Chunk, Expression, IfClause, Statement, TableField};
use crate::source_analysis::{Span, lex_with_eof};

// ============================================================================
// Generators
// ============================================================================

const IDENTIFIERS: &[&str] = &["x", "y", "count", "player", "_t"];
const LITERALS: &[&str] = &["1", "3.14", "0x1.8", "0b101", "\"s\"", "true", "false", "nil"];

fn identifier() -> impl Strategy<Value = String> {
    prop::sample::select(IDENTIFIERS).prop_map(str::to_string)
}

fn literal() -> impl Strategy<Value = String> {
    prop::sample::select(LITERALS).prop_map(str::to_string)
}

fn simple_statement() -> impl Strategy<Value = String> {
    let assign = (identifier(), literal()).prop_map(|(name, value)| format!("{name} = {value}"));
    let compound =
        (identifier(), literal()).prop_map(|(name, value)| format!("{name} += {value}"));
    let local = (identifier(), literal())
        .prop_map(|(name, value)| format!("local {name} = {value}"));
    let call = (identifier(), literal()).prop_map(|(name, value)| format!("print({name}, {value})"));
    let one_line_if =
        (identifier(), literal()).prop_map(|(name, value)| format!("if ({name}) {name} = {value}"));
    prop_oneof![assign, compound, local, call, one_line_if]
}

fn valid_program() -> impl Strategy<Value = String> {
    prop::collection::vec(simple_statement(), 0..8).prop_map(|lines| lines.join("\n"))
}

// ============================================================================
// Span containment walker (test-local)
// ============================================================================

fn assert_block_contained(block: &Block, parent: Span) {
    for statement in &block.statements {
        assert_statement_contained(statement, parent);
    }
}

fn assert_statement_contained(statement: &Statement, parent: Span) {
    let span = statement.span();
    assert!(
        parent.contains(span),
        "statement span {span:?} escapes parent {parent:?}"
    );
    match statement {
        Statement::Assignment {
            targets, values, ..
        } => {
            for expression in targets.iter().chain(values) {
                assert_expression_contained(expression, span);
            }
        }
        Statement::Local { names, values, .. } => {
            for name in names {
                assert!(span.contains(name.span));
            }
            for expression in values {
                assert_expression_contained(expression, span);
            }
        }
        Statement::Call { expression, .. } => assert_expression_contained(expression, span),
        Statement::If { clauses, .. } => {
            for IfClause {
                condition, body, ..
            } in clauses
            {
                if let Some(condition) = condition {
                    assert_expression_contained(condition, span);
                }
                assert_block_contained(body, span);
            }
        }
        Statement::While {
            condition, body, ..
        } => {
            assert_expression_contained(condition, span);
            assert_block_contained(body, span);
        }
        Statement::Repeat {
            body, condition, ..
        } => {
            assert_block_contained(body, span);
            assert_expression_contained(condition, span);
        }
        Statement::NumericFor {
            variable,
            start,
            end,
            step,
            body,
            ..
        } => {
            assert!(span.contains(variable.span));
            assert_expression_contained(start, span);
            assert_expression_contained(end, span);
            if let Some(step) = step {
                assert_expression_contained(step, span);
            }
            assert_block_contained(body, span);
        }
        Statement::GenericFor {
            variables,
            iterators,
            body,
            ..
        } => {
            for variable in variables {
                assert!(span.contains(variable.span));
            }
            for iterator in iterators {
                assert_expression_contained(iterator, span);
            }
            assert_block_contained(body, span);
        }
        Statement::Function { body, .. } => assert_block_contained(&body.body, span),
        Statement::Return { arguments, .. } => {
            for argument in arguments {
                assert_expression_contained(argument, span);
            }
        }
        Statement::Goto { label, .. } => assert!(span.contains(label.span)),
        Statement::Label { name, .. } => assert!(span.contains(name.span)),
        Statement::Do { body, .. } => assert_block_contained(body, span),
        Statement::Break { .. } | Statement::Include { .. } | Statement::Error { .. } => {}
    }
}

fn assert_expression_contained(expression: &Expression, parent: Span) {
    let span = expression.span();
    assert!(
        parent.contains(span),
        "expression span {span:?} escapes parent {parent:?}"
    );
    match expression {
        Expression::Binary { lhs, rhs, .. } | Expression::Logical { lhs, rhs, .. } => {
            assert_expression_contained(lhs, span);
            assert_expression_contained(rhs, span);
        }
        Expression::Unary { operand, .. } => assert_expression_contained(operand, span),
        Expression::Paren { expression, .. } => assert_expression_contained(expression, span),
        Expression::Index { base, index, .. } => {
            assert_expression_contained(base, span);
            assert_expression_contained(index, span);
        }
        Expression::Member { base, name, .. } => {
            assert_expression_contained(base, span);
            assert!(span.contains(name.span));
        }
        Expression::Call {
            base, arguments, ..
        } => {
            assert_expression_contained(base, span);
            for argument in arguments {
                assert_expression_contained(argument, span);
            }
        }
        Expression::StringCall { base, argument, .. }
        | Expression::TableCall { base, argument, .. } => {
            assert_expression_contained(base, span);
            assert_expression_contained(argument, span);
        }
        Expression::Table { fields, .. } => {
            for field in fields {
                match field {
                    TableField::List { value, .. } => assert_expression_contained(value, span),
                    TableField::Named { key, value, .. } => {
                        assert!(span.contains(key.span));
                        assert_expression_contained(value, span);
                    }
                    TableField::Keyed { key, value, .. } => {
                        assert_expression_contained(key, span);
                        assert_expression_contained(value, span);
                    }
                }
            }
        }
        Expression::Function(body) => assert_block_contained(&body.body, span),
        Expression::Nil { .. }
        | Expression::True { .. }
        | Expression::False { .. }
        | Expression::Vararg { .. }
        | Expression::Number { .. }
        | Expression::Str { .. }
        | Expression::Identifier(_)
        | Expression::Error { .. } => {}
    }
}

fn parse_source(source: &str) -> (Chunk, Vec<super::Diagnostic>) {
    parse(lex_with_eof(source))
}

proptest! {
    /// Property 1: Parser never panics on arbitrary input.
    #[test]
    fn parser_never_panics(input in "\\PC{0,400}") {
        let _ = parse_source(&input);
    }

    /// Property 2: Parsing is deterministic.
    #[test]
    fn parser_deterministic(input in "\\PC{0,300}") {
        let (chunk1, diagnostics1) = parse_source(&input);
        let (chunk2, diagnostics2) = parse_source(&input);
        prop_assert_eq!(chunk1, chunk2);
        prop_assert_eq!(diagnostics1, diagnostics2);
    }

    /// Property 3: Every node's span contains its children, even for inputs
    /// that needed error recovery.
    #[test]
    fn spans_contain_children(input in "\\PC{0,300}") {
        let (chunk, _) = parse_source(&input);
        for statement in &chunk.block.statements {
            assert_statement_contained(statement, chunk.span);
        }
    }

    /// Property 4: Generated well-formed programs produce no diagnostics.
    #[test]
    fn valid_programs_parse_cleanly(source in valid_program()) {
        let (chunk, diagnostics) = parse_source(&source);
        prop_assert!(
            diagnostics.is_empty(),
            "program {:?} produced {:?}",
            source,
            diagnostics,
        );
        let expected = source.lines().filter(|line| !line.trim().is_empty()).count();
        prop_assert_eq!(chunk.block.statements.len(), expected);
    }
}
