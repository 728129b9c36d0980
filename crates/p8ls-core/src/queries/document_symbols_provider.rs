// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Document symbols provider.
//!
//! Computes the hierarchical outline for a chunk in one pre-order walk:
//!
//! - function declarations (type Function), nested under their lexical
//!   parent function
//! - `local` declarations (type LocalVariable), children of the enclosing
//!   function, or of the chunk at top level
//! - global assignment targets on first write (type GlobalVariable),
//!   promoted to the chunk level regardless of textual nesting
//!
//! A `local`/assignment whose initializer is a function expression is
//! reported as a Function symbol under the variable's name, so
//! `f = function() end` outlines like `function f() end`.
//!
//! The walk keeps its own lightweight stack of declared local names, just
//! enough to tell a global first-write from a write to a local, so the
//! outline does not depend on the resolver.

use std::collections::HashSet;

use ecow::EcoString;

use crate::ast::{Block, Chunk, Expression, FunctionBody, Statement, TableField};
use crate::language_service::{CodeSymbol, SymbolKind};
use crate::source_analysis::Span;

/// Computes the document outline for a chunk.
#[must_use]
pub fn document_symbols(chunk: &Chunk) -> Vec<CodeSymbol> {
    let mut builder = SymbolBuilder {
        chunk_symbols: Vec::new(),
        function_stack: Vec::new(),
        scope_stack: vec![HashSet::new()],
        seen_globals: HashSet::new(),
    };
    builder.walk_block(&chunk.block);
    builder.chunk_symbols
}

struct SymbolBuilder {
    /// Completed top-level symbols.
    chunk_symbols: Vec<CodeSymbol>,
    /// Function symbols currently under construction.
    function_stack: Vec<CodeSymbol>,
    /// Names visible as locals, one set per lexical scope.
    scope_stack: Vec<HashSet<EcoString>>,
    /// Global names already promoted (first write wins).
    seen_globals: HashSet<EcoString>,
}

impl SymbolBuilder {
    fn is_local(&self, name: &str) -> bool {
        self.scope_stack.iter().any(|scope| scope.contains(name))
    }

    fn declare_local_name(&mut self, name: &EcoString) {
        if let Some(scope) = self.scope_stack.last_mut() {
            scope.insert(name.clone());
        }
    }

    /// Attaches a finished symbol to the enclosing function, or the chunk.
    fn attach(&mut self, symbol: CodeSymbol) {
        match self.function_stack.last_mut() {
            Some(parent) => parent.children.push(symbol),
            None => self.chunk_symbols.push(symbol),
        }
    }

    /// Builds `symbol`'s children by running `f` with it on the stack, then
    /// attaches it to the enclosing symbol (or promotes it to the chunk).
    fn with_symbol(
        &mut self,
        symbol: CodeSymbol,
        promote: bool,
        f: impl FnOnce(&mut Self),
    ) {
        self.function_stack.push(symbol);
        f(self);
        let symbol = self
            .function_stack
            .pop()
            .expect("symbol pushed above is still on the stack");
        if promote {
            self.chunk_symbols.push(symbol);
        } else {
            self.attach(symbol);
        }
    }

    fn in_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.scope_stack.push(HashSet::new());
        f(self);
        self.scope_stack.pop();
    }

    fn walk_block(&mut self, block: &Block) {
        for statement in &block.statements {
            self.walk_statement(statement);
        }
    }

    fn walk_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Local {
                names,
                values,
                span,
            } => {
                let mut consumed = vec![false; values.len()];
                for (index, name) in names.iter().enumerate() {
                    self.declare_local_name(&name.name);
                    match values.get(index) {
                        Some(Expression::Function(body)) => {
                            consumed[index] = true;
                            self.function_symbol(name.name.clone(), name.span, *span, body, false);
                        }
                        _ => self.attach(CodeSymbol {
                            name: name.name.clone(),
                            detail: None,
                            kind: SymbolKind::LocalVariable,
                            span: *span,
                            selection_span: name.span,
                            children: Vec::new(),
                        }),
                    }
                }
                for (value, consumed) in values.iter().zip(consumed) {
                    if !consumed {
                        self.walk_expression(value);
                    }
                }
            }

            Statement::Assignment {
                targets,
                values,
                span,
                ..
            } => {
                let mut consumed = vec![false; values.len()];
                for (index, target) in targets.iter().enumerate() {
                    let Expression::Identifier(identifier) = target else {
                        self.walk_expression(target);
                        continue;
                    };
                    let first_global_write = !self.is_local(&identifier.name)
                        && self.seen_globals.insert(identifier.name.clone());
                    if !first_global_write {
                        continue;
                    }
                    match values.get(index) {
                        Some(Expression::Function(body)) => {
                            consumed[index] = true;
                            self.function_symbol(
                                identifier.name.clone(),
                                identifier.span,
                                *span,
                                body,
                                true,
                            );
                        }
                        _ => self.chunk_symbols.push(CodeSymbol {
                            name: identifier.name.clone(),
                            detail: None,
                            kind: SymbolKind::GlobalVariable,
                            span: *span,
                            selection_span: identifier.span,
                            children: Vec::new(),
                        }),
                    }
                }
                for (value, consumed) in values.iter().zip(consumed) {
                    if !consumed {
                        self.walk_expression(value);
                    }
                }
            }

            Statement::Function {
                name,
                is_local,
                body,
                span,
            } => {
                if *is_local {
                    self.declare_local_name(&name.base.name);
                } else if name.is_simple() {
                    self.seen_globals.insert(name.base.name.clone());
                }
                self.function_symbol(name.display(), name.selection_span(), *span, body, false);
            }

            Statement::Call { expression, .. } => self.walk_expression(expression),

            Statement::If { clauses, .. } => {
                for clause in clauses {
                    if let Some(condition) = &clause.condition {
                        self.walk_expression(condition);
                    }
                    self.in_scope(|builder| builder.walk_block(&clause.body));
                }
            }

            Statement::While {
                condition, body, ..
            } => {
                self.walk_expression(condition);
                self.in_scope(|builder| builder.walk_block(body));
            }

            Statement::Repeat {
                body, condition, ..
            } => {
                self.in_scope(|builder| {
                    builder.walk_block(body);
                    builder.walk_expression(condition);
                });
            }

            Statement::NumericFor {
                variable,
                start,
                end,
                step,
                body,
                ..
            } => {
                self.walk_expression(start);
                self.walk_expression(end);
                if let Some(step) = step {
                    self.walk_expression(step);
                }
                self.in_scope(|builder| {
                    builder.declare_local_name(&variable.name);
                    builder.walk_block(body);
                });
            }

            Statement::GenericFor {
                variables,
                iterators,
                body,
                ..
            } => {
                for iterator in iterators {
                    self.walk_expression(iterator);
                }
                self.in_scope(|builder| {
                    for variable in variables {
                        builder.declare_local_name(&variable.name);
                    }
                    builder.walk_block(body);
                });
            }

            Statement::Do { body, .. } => self.in_scope(|builder| builder.walk_block(body)),

            Statement::Return { arguments, .. } => {
                for argument in arguments {
                    self.walk_expression(argument);
                }
            }

            Statement::Break { .. }
            | Statement::Goto { .. }
            | Statement::Label { .. }
            | Statement::Include { .. }
            | Statement::Error { .. } => {}
        }
    }

    /// Emits a Function symbol and walks its body for children.
    fn function_symbol(
        &mut self,
        name: EcoString,
        selection_span: Span,
        declaration_span: Span,
        body: &FunctionBody,
        promote: bool,
    ) {
        let symbol = CodeSymbol {
            name,
            detail: Some(body.signature()),
            kind: SymbolKind::Function,
            span: declaration_span,
            selection_span,
            children: Vec::new(),
        };
        self.with_symbol(symbol, promote, |builder| {
            builder.walk_function_body(body);
        });
    }

    fn walk_function_body(&mut self, body: &FunctionBody) {
        self.scope_stack.push(HashSet::new());
        for parameter in &body.parameters {
            self.declare_local_name(&parameter.name);
        }
        self.walk_block(&body.body);
        self.scope_stack.pop();
    }

    /// Descends into an expression looking for globals written inside
    /// anonymous function bodies.
    fn walk_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Function(body) => self.walk_function_body(body),
            Expression::Binary { lhs, rhs, .. } | Expression::Logical { lhs, rhs, .. } => {
                self.walk_expression(lhs);
                self.walk_expression(rhs);
            }
            Expression::Unary { operand, .. } => self.walk_expression(operand),
            Expression::Paren { expression, .. } => self.walk_expression(expression),
            Expression::Index { base, index, .. } => {
                self.walk_expression(base);
                self.walk_expression(index);
            }
            Expression::Member { base, .. } => self.walk_expression(base),
            Expression::Call {
                base, arguments, ..
            } => {
                self.walk_expression(base);
                for argument in arguments {
                    self.walk_expression(argument);
                }
            }
            Expression::StringCall { base, argument, .. }
            | Expression::TableCall { base, argument, .. } => {
                self.walk_expression(base);
                self.walk_expression(argument);
            }
            Expression::Table { fields, .. } => {
                for field in fields {
                    match field {
                        TableField::List { value, .. } | TableField::Named { value, .. } => {
                            self.walk_expression(value);
                        }
                        TableField::Keyed { key, value, .. } => {
                            self.walk_expression(key);
                            self.walk_expression(value);
                        }
                    }
                }
            }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{lex_with_eof, parse};

    fn symbols_for(source: &str) -> Vec<CodeSymbol> {
        let (chunk, diagnostics) = parse(lex_with_eof(source));
        assert!(diagnostics.is_empty(), "parse errors: {diagnostics:?}");
        document_symbols(&chunk)
    }

    #[test]
    fn empty_chunk_has_no_symbols() {
        assert!(symbols_for("").is_empty());
    }

    #[test]
    fn function_with_local_child() {
        let symbols = symbols_for("function update()\nlocal dx = 1\nreturn dx\nend");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "update");
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert_eq!(symbols[0].detail.as_deref(), Some("()"));
        assert_eq!(symbols[0].children.len(), 1);
        assert_eq!(symbols[0].children[0].name, "dx");
        assert_eq!(symbols[0].children[0].kind, SymbolKind::LocalVariable);
    }

    #[test]
    fn nested_functions_nest_in_outline() {
        let symbols = symbols_for(
            "function outer()\nlocal function inner()\nreturn 1\nend\nreturn inner\nend",
        );
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "outer");
        assert_eq!(symbols[0].children.len(), 1);
        assert_eq!(symbols[0].children[0].name, "inner");
        assert_eq!(symbols[0].children[0].kind, SymbolKind::Function);
    }

    #[test]
    fn global_write_promotes_to_chunk_level() {
        // First write inside a function still surfaces at the top level.
        let symbols = symbols_for("function init()\nscore = 0\nend");
        assert_eq!(symbols.len(), 2);
        let global = symbols
            .iter()
            .find(|symbol| symbol.kind == SymbolKind::GlobalVariable)
            .expect("promoted global");
        assert_eq!(global.name, "score");
        // Only the first write is reported.
        let symbols = symbols_for("score = 0\nscore = 1");
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn write_to_local_is_not_a_global() {
        let symbols = symbols_for("function f()\nlocal score = 0\nscore = 1\nend");
        assert!(
            symbols
                .iter()
                .all(|symbol| symbol.kind != SymbolKind::GlobalVariable)
        );
    }

    #[test]
    fn method_declaration_keeps_dotted_name() {
        let symbols = symbols_for("player = {}\nfunction player:move(dx, dy)\nend");
        let method = symbols
            .iter()
            .find(|symbol| symbol.kind == SymbolKind::Function)
            .expect("method symbol");
        assert_eq!(method.name, "player:move");
        // Signature elides the implicit self.
        assert_eq!(method.detail.as_deref(), Some("(dx, dy)"));
    }

    #[test]
    fn function_valued_assignment_outlines_as_function() {
        let symbols = symbols_for("update = function(dt)\nreturn dt\nend");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert_eq!(symbols[0].name, "update");
        assert_eq!(symbols[0].detail.as_deref(), Some("(dt)"));
    }

    #[test]
    fn local_function_value_nests() {
        let symbols = symbols_for("function f()\nlocal g = function() end\nreturn g\nend");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].children.len(), 1);
        assert_eq!(symbols[0].children[0].name, "g");
        assert_eq!(symbols[0].children[0].kind, SymbolKind::Function);
    }

    #[test]
    fn selection_span_is_identifier_declaration_span_is_statement() {
        let source = "local health = 100";
        let symbols = symbols_for(source);
        let symbol = &symbols[0];
        assert_eq!(&source[symbol.selection_span.as_range()], "health");
        assert_eq!(&source[symbol.span.as_range()], source);
        assert!(symbol.span.contains(symbol.selection_span));
    }

    #[test]
    fn loop_variables_are_not_symbols_but_mask_globals() {
        let symbols = symbols_for("for i = 1, 3 do\ni = i + 1\nend");
        assert!(symbols.is_empty(), "loop counter leaked: {symbols:?}");
    }
}
