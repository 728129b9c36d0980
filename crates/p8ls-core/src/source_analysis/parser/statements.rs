// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing.
//!
//! Statements are dispatched on their first token. The PICO-8 one-line
//! `if`/`while` forms are detected by scanning the rest of the logical line
//! for the `then`/`do` keyword before committing to either shape.

use crate::ast::{
    AssignOp, Expression, FunctionBody, FunctionName, Identifier, IfClause, IfClauseKind,
    Statement,
};
use crate::source_analysis::{Span, TokenKind};

use super::{DiagnosticCategory, Parser};

impl Parser {
    /// Parses a single statement, or `None` when the current token cannot
    /// start one (the caller synchronizes).
    pub(super) fn parse_statement(&mut self) -> Option<Statement> {
        match self.current_kind() {
            TokenKind::Keyword(word) => match word.as_str() {
                "local" => self.parse_local(),
                "if" => Some(self.parse_if()),
                "while" => Some(self.parse_while()),
                "repeat" => Some(self.parse_repeat()),
                "for" => self.parse_for(),
                "function" => Some(self.parse_function_statement()),
                "return" => Some(self.parse_return()),
                "break" => {
                    let token = self.advance();
                    Some(Statement::Break { span: token.span() })
                }
                "goto" => self.parse_goto(),
                "do" => Some(self.parse_do()),
                _ => self.parse_expression_statement(),
            },
            TokenKind::Punctuator(text) if text == "::" => self.parse_label(),
            TokenKind::Punctuator(text) if text == "?" => Some(self.parse_print_shorthand()),
            TokenKind::Include(path) => {
                let path = path.clone();
                let token = self.advance();
                if path.is_empty() {
                    self.error_at(
                        token.span(),
                        DiagnosticCategory::MalformedStatement,
                        "#include requires a file path",
                    );
                }
                Some(Statement::Include {
                    path,
                    span: token.span(),
                })
            }
            TokenKind::Error(kind) => {
                let kind = *kind;
                let token = self.advance();
                self.error_at(token.span(), DiagnosticCategory::from_lex(kind), kind.to_string());
                None
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Parses `local name {, name} [= exprs]` or `local function name body`.
    fn parse_local(&mut self) -> Option<Statement> {
        let local_span = self.advance().span(); // local

        if self.check_keyword("function") {
            let function_span = self.advance().span();
            let name = self.expect_identifier("expected function name after 'local function'")?;
            let body = self.parse_function_body(local_span.merge(function_span), None);
            let span = local_span.merge(body.span);
            return Some(Statement::Function {
                name: FunctionName::simple(name),
                is_local: true,
                body,
                span,
            });
        }

        let mut names = vec![self.expect_identifier("expected name after 'local'")?];
        while self.match_punct(",") {
            match self.expect_identifier("expected name after ','") {
                Some(name) => names.push(name),
                None => break,
            }
        }

        let values = if self.match_punct("=") {
            self.parse_expression_list()
        } else {
            Vec::new()
        };

        let span = local_span.merge(self.prev_span());
        Some(Statement::Local { names, values, span })
    }

    /// Parses an `if` statement, in either the standard or the PICO-8
    /// one-line shape.
    fn parse_if(&mut self) -> Statement {
        let if_span = self.advance().span(); // if

        if self.check_punct("(") && self.is_one_line_header("then") {
            return self.parse_one_line_if(if_span);
        }

        let mut clauses = Vec::new();

        let condition = self.parse_expression();
        self.expect_keyword("then", "expected 'then' after if condition");
        let body = self.parse_block();
        clauses.push(IfClause {
            kind: IfClauseKind::If,
            condition: Some(condition),
            body,
            span: if_span.merge(self.prev_span()),
        });

        loop {
            if self.check_keyword("elseif") {
                let clause_span = self.advance().span();
                let condition = self.parse_expression();
                self.expect_keyword("then", "expected 'then' after elseif condition");
                let body = self.parse_block();
                clauses.push(IfClause {
                    kind: IfClauseKind::Elseif,
                    condition: Some(condition),
                    body,
                    span: clause_span.merge(self.prev_span()),
                });
            } else if self.check_keyword("else") {
                let clause_span = self.advance().span();
                let body = self.parse_block();
                clauses.push(IfClause {
                    kind: IfClauseKind::Else,
                    condition: None,
                    body,
                    span: clause_span.merge(self.prev_span()),
                });
                break;
            } else {
                break;
            }
        }

        self.expect_keyword("end", "expected 'end' to close if statement");
        let span = if_span.merge(self.prev_span());
        Statement::If { clauses, span }
    }

    /// Parses the one-line `if (cond) body [else body]` form. The bodies run
    /// to the end of the line; no `end` is consumed.
    fn parse_one_line_if(&mut self, if_span: Span) -> Statement {
        let condition = self.parse_paren_expression();
        let mut clauses = Vec::new();

        let body = self.parse_line_body();
        clauses.push(IfClause {
            kind: IfClauseKind::If,
            condition: Some(condition),
            body,
            span: if_span.merge(self.prev_span()),
        });

        // A trailing `else` on the same line opens a clause that also ends
        // at the newline.
        if !self.current_token().has_leading_newline() && self.check_keyword("else") {
            let else_span = self.advance().span();
            let body = self.parse_line_body();
            clauses.push(IfClause {
                kind: IfClauseKind::Else,
                condition: None,
                body,
                span: else_span.merge(self.prev_span()),
            });
        }

        let span = if_span.merge(self.prev_span());
        Statement::If { clauses, span }
    }

    /// Parses a `while` statement, in either the standard or the PICO-8
    /// one-line shape.
    fn parse_while(&mut self) -> Statement {
        let while_span = self.advance().span(); // while

        if self.check_punct("(") && self.is_one_line_header("do") {
            let condition = self.parse_paren_expression();
            let body = self.parse_line_body();
            let span = while_span.merge(self.prev_span());
            return Statement::While {
                condition,
                body,
                span,
            };
        }

        let condition = self.parse_expression();
        self.expect_keyword("do", "expected 'do' after while condition");
        let body = self.parse_block();
        self.expect_keyword("end", "expected 'end' to close while loop");
        let span = while_span.merge(self.prev_span());
        Statement::While {
            condition,
            body,
            span,
        }
    }

    /// Decides whether an `if (`/`while (` header is the one-line form.
    ///
    /// The current token must be `(`. The one-line form applies when the
    /// logical line contains no `terminator` keyword (`then`/`do`), the
    /// parenthesized group closes on this line, and at least one more token
    /// follows it on the same line (otherwise the keyword is simply expected
    /// on a later line).
    fn is_one_line_header(&self, terminator: &str) -> bool {
        let mut depth = 0usize;
        let mut offset = 0usize;
        let mut close_offset = None;
        loop {
            let Some(token) = self.token_at(offset) else {
                break;
            };
            if token.kind().is_eof() || (offset > 0 && token.has_leading_newline()) {
                break;
            }
            if token.kind().is_keyword(terminator) {
                return false;
            }
            if token.kind().is_punct("(") {
                depth += 1;
            } else if token.kind().is_punct(")") {
                depth = depth.saturating_sub(1);
                if depth == 0 && close_offset.is_none() {
                    close_offset = Some(offset);
                }
            }
            offset += 1;
        }
        close_offset.is_some_and(|close| close + 1 < offset)
    }

    /// Parses `repeat ... until cond`.
    fn parse_repeat(&mut self) -> Statement {
        let repeat_span = self.advance().span(); // repeat
        let body = self.parse_block();
        self.expect_keyword("until", "expected 'until' to close repeat loop");
        let condition = self.parse_expression();
        let span = repeat_span.merge(self.prev_span());
        Statement::Repeat {
            body,
            condition,
            span,
        }
    }

    /// Parses a numeric or generic `for`, disambiguated by the token after
    /// the first name (`=` vs `,`/`in`).
    fn parse_for(&mut self) -> Option<Statement> {
        let for_span = self.advance().span(); // for
        let first = self.expect_identifier("expected loop variable after 'for'")?;

        if self.match_punct("=") {
            let start = self.parse_expression();
            self.expect_punct(",", "expected ',' after for start value");
            let end = self.parse_expression();
            let step = self.match_punct(",").then(|| self.parse_expression());
            self.expect_keyword("do", "expected 'do' after for range");
            let body = self.parse_block();
            self.expect_keyword("end", "expected 'end' to close for loop");
            let span = for_span.merge(self.prev_span());
            return Some(Statement::NumericFor {
                variable: first,
                start,
                end,
                step,
                body,
                span,
            });
        }

        let mut variables = vec![first];
        while self.match_punct(",") {
            match self.expect_identifier("expected name after ','") {
                Some(name) => variables.push(name),
                None => break,
            }
        }
        self.expect_keyword("in", "expected '=' or 'in' after for variables");
        let iterators = self.parse_expression_list();
        self.expect_keyword("do", "expected 'do' after for iterators");
        let body = self.parse_block();
        self.expect_keyword("end", "expected 'end' to close for loop");
        let span = for_span.merge(self.prev_span());
        Some(Statement::GenericFor {
            variables,
            iterators,
            body,
            span,
        })
    }

    /// Parses `function a.b.c:m(...) ... end`.
    ///
    /// A method segment (`:m`) makes the parser prepend an implicit `self`
    /// parameter to the function body.
    fn parse_function_statement(&mut self) -> Statement {
        let function_span = self.advance().span(); // function

        let Some(base) = self.expect_identifier("expected function name after 'function'") else {
            // Treat `function` with no name as an anonymous function in
            // statement position; recover with an error node.
            let body = self.parse_function_body(function_span, None);
            let span = function_span.merge(body.span);
            return Statement::Error { span };
        };

        let mut members = Vec::new();
        while self.match_punct(".") {
            match self.expect_identifier("expected name after '.'") {
                Some(name) => members.push(name),
                None => break,
            }
        }
        let method = if self.match_punct(":") {
            self.expect_identifier("expected method name after ':'")
        } else {
            None
        };

        let name_span = method
            .as_ref()
            .map(|m| m.span)
            .or_else(|| members.last().map(|m| m.span))
            .map_or(base.span, |last| base.span.merge(last));
        let self_span = method.as_ref().map(|m| m.span);
        let name = FunctionName {
            base,
            members,
            method,
            span: name_span,
        };

        let body = self.parse_function_body(function_span, self_span);
        let span = function_span.merge(body.span);
        Statement::Function {
            name,
            is_local: false,
            body,
            span,
        }
    }

    /// Parses a parameter list and body: `( params ) block end`.
    ///
    /// `implicit_self` carries the method-name span when a `self` parameter
    /// must be injected.
    pub(super) fn parse_function_body(
        &mut self,
        function_span: Span,
        implicit_self: Option<Span>,
    ) -> FunctionBody {
        self.expect_punct("(", "expected '(' to open parameter list");

        let mut parameters = Vec::new();
        let mut is_vararg = false;
        if !self.check_punct(")") {
            loop {
                if self.check_punct("...") {
                    self.advance();
                    is_vararg = true;
                    break;
                }
                match self.expect_identifier("expected parameter name") {
                    Some(name) => parameters.push(name),
                    None => break,
                }
                if !self.match_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct(")", "expected ')' to close parameter list");

        let body = self.parse_block();
        self.expect_keyword("end", "expected 'end' to close function");

        if let Some(self_span) = implicit_self {
            parameters.insert(0, Identifier::new("self", self_span));
        }

        FunctionBody {
            parameters,
            is_vararg,
            implicit_self: implicit_self.is_some(),
            body,
            span: function_span.merge(self.prev_span()),
        }
    }

    /// Parses `return [exprs]`.
    ///
    /// Arguments are omitted when the next token closes the enclosing block
    /// or, in a newline-sensitive context, starts a new line. That rule is
    /// what keeps a bare `return` inside a one-line `if` from swallowing the
    /// next line.
    fn parse_return(&mut self) -> Statement {
        let return_span = self.advance().span(); // return

        let arguments = if self.is_at_end()
            || self.at_block_end_keyword()
            || self.at_line_break()
            || self.check_punct(";")
        {
            Vec::new()
        } else {
            self.parse_expression_list()
        };

        let span = return_span.merge(self.prev_span());
        Statement::Return { arguments, span }
    }

    /// Parses `goto label`.
    fn parse_goto(&mut self) -> Option<Statement> {
        let goto_span = self.advance().span(); // goto
        let label = self.expect_identifier("expected label name after 'goto'")?;
        let span = goto_span.merge(label.span);
        Some(Statement::Goto { label, span })
    }

    /// Parses `::label::`.
    fn parse_label(&mut self) -> Option<Statement> {
        let open_span = self.advance().span(); // ::
        let name = self.expect_identifier("expected label name after '::'")?;
        self.expect_punct("::", "expected '::' to close label");
        let span = open_span.merge(self.prev_span());
        Some(Statement::Label { name, span })
    }

    /// Parses `do ... end`.
    fn parse_do(&mut self) -> Statement {
        let do_span = self.advance().span(); // do
        let body = self.parse_block();
        self.expect_keyword("end", "expected 'end' to close do block");
        let span = do_span.merge(self.prev_span());
        Statement::Do { body, span }
    }

    /// Parses the `?` print shorthand: `?expr {, expr}` up to the end of
    /// the line, producing an ordinary `print(...)` call statement.
    fn parse_print_shorthand(&mut self) -> Statement {
        let mark_span = self.advance().span(); // ?

        let saved = std::mem::replace(&mut self.newline_terminated, true);
        let arguments = if self.is_at_end() || self.at_line_break() || self.at_block_end_keyword()
        {
            Vec::new()
        } else {
            self.parse_expression_list()
        };
        self.newline_terminated = saved;

        let span = mark_span.merge(self.prev_span());
        let expression = Expression::Call {
            base: Box::new(Expression::Identifier(Identifier::new("print", mark_span))),
            arguments,
            span,
        };
        Statement::Call { expression, span }
    }

    /// Parses a statement that begins with an expression: an assignment
    /// (simple or compound) or a call.
    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let start_span = self.current_token().span();
        let first = self.parse_suffixed_expression();

        let mut targets = vec![first];
        while self.match_punct(",") {
            targets.push(self.parse_suffixed_expression());
        }

        let operator = match self.current_kind() {
            TokenKind::Punctuator(text) => AssignOp::from_str(text),
            _ => None,
        };

        if let Some(operator) = operator {
            self.advance();
            for target in &targets {
                if !target.is_assign_target() && !target.is_error() {
                    self.error_at(
                        target.span(),
                        DiagnosticCategory::InvalidAssignmentTarget,
                        "cannot assign to this expression",
                    );
                }
            }
            let values = self.parse_expression_list();
            let span = start_span.merge(self.prev_span());
            return Some(Statement::Assignment {
                targets,
                operator,
                values,
                span,
            });
        }

        if targets.len() == 1 {
            let expression = targets.into_iter().next().expect("one target");
            let span = expression.span();
            if expression.is_call() {
                return Some(Statement::Call { expression, span });
            }
            if !expression.is_error() {
                self.error_at(
                    span,
                    DiagnosticCategory::MalformedStatement,
                    "expected assignment or call",
                );
            }
            self.synchronize();
            return Some(Statement::Error { span });
        }

        let span = start_span.merge(self.prev_span());
        self.error_at(
            span,
            DiagnosticCategory::MalformedStatement,
            "expected assignment operator after targets",
        );
        self.synchronize();
        Some(Statement::Error { span })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_err, parse_ok};
    use crate::ast::{Expression, Statement};

    #[test]
    fn parse_local_with_fewer_values_than_names() {
        // Extra names default to nil at runtime; not a parse error.
        let chunk = parse_ok("local a, b, c = 1");
        match &chunk.block.statements[0] {
            Statement::Local { names, values, .. } => {
                assert_eq!(names.len(), 3);
                assert_eq!(values.len(), 1);
            }
            other => panic!("expected local, got {other:?}"),
        }
    }

    #[test]
    fn parse_local_without_values() {
        let chunk = parse_ok("local x");
        match &chunk.block.statements[0] {
            Statement::Local { names, values, .. } => {
                assert_eq!(names.len(), 1);
                assert!(values.is_empty());
            }
            other => panic!("expected local, got {other:?}"),
        }
    }

    #[test]
    fn parse_local_function() {
        let chunk = parse_ok("local function helper(n) return n end");
        match &chunk.block.statements[0] {
            Statement::Function {
                name, is_local, ..
            } => {
                assert!(is_local);
                assert_eq!(name.display(), "helper");
            }
            other => panic!("expected local function, got {other:?}"),
        }
    }

    #[test]
    fn parse_numeric_for() {
        let chunk = parse_ok("for i = 1, 10, 2 do print(i) end");
        match &chunk.block.statements[0] {
            Statement::NumericFor {
                variable, step, body, ..
            } => {
                assert_eq!(variable.name, "i");
                assert!(step.is_some());
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("expected numeric for, got {other:?}"),
        }
    }

    #[test]
    fn parse_generic_for() {
        let chunk = parse_ok("for k, v in pairs(t) do print(k, v) end");
        match &chunk.block.statements[0] {
            Statement::GenericFor {
                variables,
                iterators,
                ..
            } => {
                assert_eq!(variables.len(), 2);
                assert_eq!(iterators.len(), 1);
            }
            other => panic!("expected generic for, got {other:?}"),
        }
    }

    #[test]
    fn parse_repeat_until() {
        let chunk = parse_ok("repeat i += 1 until i > 10");
        match &chunk.block.statements[0] {
            Statement::Repeat { body, .. } => assert_eq!(body.statements.len(), 1),
            other => panic!("expected repeat, got {other:?}"),
        }
    }

    #[test]
    fn parse_method_declaration_injects_self() {
        let chunk = parse_ok("function t:m(a) end");
        match &chunk.block.statements[0] {
            Statement::Function { name, body, .. } => {
                assert_eq!(name.display(), "t:m");
                assert!(body.implicit_self);
                assert_eq!(body.parameters.len(), 2);
                assert_eq!(body.parameters[0].name, "self");
                assert_eq!(body.parameters[1].name, "a");
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn parse_dotted_function_name() {
        let chunk = parse_ok("function a.b.c(x) end");
        match &chunk.block.statements[0] {
            Statement::Function { name, body, .. } => {
                assert_eq!(name.display(), "a.b.c");
                assert!(!body.implicit_self);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn parse_vararg_function() {
        let chunk = parse_ok("function log(fmt, ...) end");
        match &chunk.block.statements[0] {
            Statement::Function { body, .. } => {
                assert!(body.is_vararg);
                assert_eq!(body.parameters.len(), 1);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn parse_include_statement() {
        let chunk = parse_ok("#include lib/helpers.lua\nx = 1");
        match &chunk.block.statements[0] {
            Statement::Include { path, .. } => assert_eq!(path, "lib/helpers.lua"),
            other => panic!("expected include, got {other:?}"),
        }
        assert_eq!(chunk.block.statements.len(), 2);
    }

    #[test]
    fn parse_include_without_path_is_error() {
        let (_, diagnostics) = parse_err("#include");
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn parse_label_and_goto() {
        let chunk = parse_ok("::top::\ngoto top");
        assert!(matches!(chunk.block.statements[0], Statement::Label { .. }));
        assert!(matches!(chunk.block.statements[1], Statement::Goto { .. }));
    }

    #[test]
    fn parse_print_shorthand() {
        let chunk = parse_ok("?\"hi\",x\ny = 1");
        assert_eq!(chunk.block.statements.len(), 2);
        match &chunk.block.statements[0] {
            Statement::Call { expression, .. } => match expression {
                Expression::Call {
                    base, arguments, ..
                } => {
                    assert!(matches!(&**base, Expression::Identifier(id) if id.name == "print"));
                    assert_eq!(arguments.len(), 2);
                }
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected call statement, got {other:?}"),
        }
    }

    #[test]
    fn parse_multiple_assignment() {
        let chunk = parse_ok("a, b = b, a");
        match &chunk.block.statements[0] {
            Statement::Assignment {
                targets, values, ..
            } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn parse_member_and_index_assignment_targets() {
        let chunk = parse_ok("t.x, t[1] = 1, 2");
        match &chunk.block.statements[0] {
            Statement::Assignment { targets, .. } => {
                assert!(matches!(targets[0], Expression::Member { .. }));
                assert!(matches!(targets[1], Expression::Index { .. }));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn parse_invalid_assignment_target_is_diagnosed() {
        let (chunk, diagnostics) = parse_err("f() = 1");
        assert!(
            diagnostics
                .iter()
                .any(|d| d.category == super::super::DiagnosticCategory::InvalidAssignmentTarget)
        );
        // Still produces an assignment node with the bad target.
        assert!(matches!(
            chunk.block.statements[0],
            Statement::Assignment { .. }
        ));
    }

    #[test]
    fn parse_bare_expression_statement_is_error() {
        let (_, diagnostics) = parse_err("x + 1");
        assert!(
            diagnostics
                .iter()
                .any(|d| d.category == super::super::DiagnosticCategory::MalformedStatement
                    || d.category == super::super::DiagnosticCategory::UnexpectedToken)
        );
    }

    #[test]
    fn parse_semicolons_are_skipped() {
        let chunk = parse_ok("x = 1;; y = 2;");
        assert_eq!(chunk.block.statements.len(), 2);
    }

    #[test]
    fn parse_method_call_statement() {
        let chunk = parse_ok("player:update(dt)");
        match &chunk.block.statements[0] {
            Statement::Call { expression, .. } => match expression {
                Expression::Call { base, .. } => {
                    assert!(matches!(&**base, Expression::Member { .. }));
                }
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected call statement, got {other:?}"),
        }
    }
}
