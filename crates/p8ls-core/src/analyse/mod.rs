// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Scope and definition-usage resolution.
//!
//! A single post-parse walk over the AST that simultaneously:
//!
//! - builds the nested [`ScopeTree`] (a scope per function body, `do` block,
//!   `if`/`elseif`/`else` clause body, and loop body),
//! - assigns every identifier use to a [`Definition`], creating implicit
//!   globals at the chunk scope on first write,
//! - records every declaration and usage site into the positional
//!   [`DefUseIndex`],
//! - emits warnings for undefined identifiers and unused locals.
//!
//! # Declaration rules
//!
//! - `local` names become visible *after* their statement, so `local x = x`
//!   reads the outer `x`.
//! - `local function f` registers `f` before walking the body, so the
//!   function may call itself.
//! - Function parameters (and the implicit `self` of method declarations)
//!   are locals of the function-body scope; loop variables are locals of
//!   the loop-body scope.
//! - An assignment to an unresolved name creates a global definition at the
//!   chunk scope; so does assigning to a member of an undeclared base
//!   (`foo.bar = 1` promotes `foo`).
//! - A read of an unresolved, non-builtin name warns and leaves a tentative
//!   global placeholder so later references resolve consistently.

mod builtins;
mod def_use;
mod scope;

pub use builtins::{BUILTINS, is_builtin};
pub use def_use::{DefUseIndex, DefinitionsUsages};
pub use scope::{DefId, Definition, DefinitionKind, ScopeId, ScopeTree};

use std::collections::HashMap;

use ecow::{EcoString, eco_format};

use crate::ast::{
    Block, Chunk, Expression, FunctionBody, Identifier, Statement, TableField,
};
use crate::source_analysis::{Diagnostic, DiagnosticCategory, LineIndex, Span};

/// The result of resolving a chunk.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The nested scope tree with its definition arena.
    pub scopes: ScopeTree,
    /// The positional definitions↔usages index.
    pub definitions_usages: DefUseIndex,
    /// Resolver warnings (undefined identifiers, unused locals).
    pub warnings: Vec<Diagnostic>,
}

/// Resolves scoping and definition/usage information for a parsed chunk.
///
/// Tolerates partial trees from error recovery: error placeholders resolve
/// to nothing and empty clause lists are fine.
#[must_use]
pub fn resolve(chunk: &Chunk, source: &str) -> Resolution {
    let mut resolver = Resolver::new(chunk.span);
    resolver.resolve_statements(&chunk.block.statements);
    resolver.warn_unused_locals();

    let definitions_usages = DefUseIndex::build(&resolver.tree, LineIndex::new(source));
    Resolution {
        scopes: resolver.tree,
        definitions_usages,
        warnings: resolver.warnings,
    }
}

struct Resolver {
    tree: ScopeTree,
    current: ScopeId,
    warnings: Vec<Diagnostic>,
    /// Last name segment of dotted/method function declarations, for
    /// best-effort member navigation (`a.b.c` registers `c`).
    member_functions: HashMap<EcoString, Vec<DefId>>,
}

impl Resolver {
    fn new(root_span: Span) -> Self {
        let tree = ScopeTree::new(root_span);
        let current = tree.root();
        Self {
            tree,
            current,
            warnings: Vec::new(),
            member_functions: HashMap::new(),
        }
    }

    /// Runs `f` inside a fresh child scope spanning `span`.
    fn in_scope(&mut self, span: Span, f: impl FnOnce(&mut Self)) {
        let parent = self.current;
        self.current = self.tree.push_scope(parent, span);
        f(self);
        self.current = parent;
    }

    /// Declares a local in the current scope.
    fn declare_local(&mut self, name: &Identifier, kind: DefinitionKind) -> DefId {
        let def = self
            .tree
            .new_definition(name.name.clone(), kind, Some(name.span));
        self.tree.bind_local(self.current, name.name.clone(), def);
        def
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn resolve_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.resolve_statement(statement);
        }
    }

    fn resolve_block(&mut self, block: &Block) {
        self.resolve_statements(&block.statements);
    }

    fn resolve_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Local { names, values, .. } => {
                // Initializers resolve in the outer context, so
                // `local x = x` reads the enclosing `x`.
                for value in values {
                    self.resolve_expression(value);
                }
                for name in names {
                    self.declare_local(name, DefinitionKind::Local);
                }
            }

            Statement::Assignment {
                targets, values, ..
            } => {
                for value in values {
                    self.resolve_expression(value);
                }
                for target in targets {
                    self.resolve_assignment_target(target);
                }
            }

            Statement::Call { expression, .. } => self.resolve_expression(expression),

            Statement::If { clauses, .. } => {
                for clause in clauses {
                    if let Some(condition) = &clause.condition {
                        self.resolve_expression(condition);
                    }
                    self.in_scope(clause.span, |resolver| {
                        resolver.resolve_block(&clause.body);
                    });
                }
            }

            Statement::While {
                condition,
                body,
                span,
            } => {
                self.resolve_expression(condition);
                self.in_scope(*span, |resolver| resolver.resolve_block(body));
            }

            Statement::Repeat {
                body,
                condition,
                span,
            } => {
                // The until condition sees the body's locals.
                self.in_scope(*span, |resolver| {
                    resolver.resolve_block(body);
                    resolver.resolve_expression(condition);
                });
            }

            Statement::NumericFor {
                variable,
                start,
                end,
                step,
                body,
                span,
            } => {
                self.resolve_expression(start);
                self.resolve_expression(end);
                if let Some(step) = step {
                    self.resolve_expression(step);
                }
                self.in_scope(*span, |resolver| {
                    resolver.declare_local(variable, DefinitionKind::Local);
                    resolver.resolve_block(body);
                });
            }

            Statement::GenericFor {
                variables,
                iterators,
                body,
                span,
            } => {
                for iterator in iterators {
                    self.resolve_expression(iterator);
                }
                self.in_scope(*span, |resolver| {
                    for variable in variables {
                        resolver.declare_local(variable, DefinitionKind::Local);
                    }
                    resolver.resolve_block(body);
                });
            }

            Statement::Function {
                name,
                is_local,
                body,
                span,
            } => {
                if *is_local {
                    // Registered before the body so the function can recurse.
                    self.declare_local(&name.base, DefinitionKind::Function);
                } else if name.is_simple() {
                    self.declare_global(&name.base, DefinitionKind::Function);
                } else {
                    self.resolve_base_write(&name.base);
                    let selection = name.selection_span();
                    let def = self.tree.new_definition(
                        name.display(),
                        DefinitionKind::Function,
                        Some(selection),
                    );
                    self.tree.bind_global(name.display(), def);
                    let last = name
                        .method
                        .as_ref()
                        .or_else(|| name.members.last())
                        .map(|segment| segment.name.clone())
                        .unwrap_or_else(|| name.base.name.clone());
                    self.member_functions.entry(last).or_default().push(def);
                }
                self.resolve_function(body, *span);
            }

            Statement::Return { arguments, .. } => {
                for argument in arguments {
                    self.resolve_expression(argument);
                }
            }

            Statement::Do { body, span } => {
                self.in_scope(*span, |resolver| resolver.resolve_block(body));
            }

            Statement::Break { .. }
            | Statement::Goto { .. }
            | Statement::Label { .. }
            | Statement::Include { .. }
            | Statement::Error { .. } => {}
        }
    }

    /// Resolves one assignment target, creating implicit globals on first
    /// write.
    fn resolve_assignment_target(&mut self, target: &Expression) {
        match target {
            Expression::Identifier(identifier) => self.resolve_write(identifier),
            Expression::Index { base, index, .. } => {
                self.resolve_expression(index);
                self.resolve_target_base(base);
            }
            Expression::Member { base, name, .. } => {
                self.resolve_target_base(base);
                self.resolve_member_name(name);
            }
            // Invalid targets were already diagnosed by the parser; resolve
            // whatever identifiers they contain.
            other => self.resolve_expression(other),
        }
    }

    /// Resolves the base of an index/member assignment target. An undeclared
    /// identifier base is promoted to an implicit global.
    fn resolve_target_base(&mut self, base: &Expression) {
        match base {
            Expression::Identifier(identifier) => self.resolve_base_write(identifier),
            other => self.resolve_expression(other),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn resolve_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Identifier(identifier) => self.resolve_read(identifier),

            Expression::Binary { lhs, rhs, .. } | Expression::Logical { lhs, rhs, .. } => {
                self.resolve_expression(lhs);
                self.resolve_expression(rhs);
            }
            Expression::Unary { operand, .. } => self.resolve_expression(operand),
            Expression::Paren { expression, .. } => self.resolve_expression(expression),

            Expression::Index { base, index, .. } => {
                self.resolve_expression(base);
                self.resolve_expression(index);
            }
            Expression::Member { base, name, .. } => {
                // `a.b.c` is a use of `a` only; member names are recorded
                // for best-effort navigation, not resolved as identifiers.
                self.resolve_expression(base);
                self.resolve_member_name(name);
            }

            Expression::Call {
                base, arguments, ..
            } => {
                self.resolve_expression(base);
                for argument in arguments {
                    self.resolve_expression(argument);
                }
            }
            Expression::StringCall { base, argument, .. }
            | Expression::TableCall { base, argument, .. } => {
                self.resolve_expression(base);
                self.resolve_expression(argument);
            }

            Expression::Table { fields, .. } => {
                for field in fields {
                    match field {
                        TableField::List { value, .. } | TableField::Named { value, .. } => {
                            self.resolve_expression(value);
                        }
                        TableField::Keyed { key, value, .. } => {
                            self.resolve_expression(key);
                            self.resolve_expression(value);
                        }
                    }
                }
            }

            Expression::Function(body) => self.resolve_function(body, body.span),

            Expression::Nil { .. }
            | Expression::True { .. }
            | Expression::False { .. }
            | Expression::Vararg { .. }
            | Expression::Number { .. }
            | Expression::Str { .. }
            | Expression::Error { .. } => {}
        }
    }

    /// Opens the function-body scope, declares parameters, walks the body.
    fn resolve_function(&mut self, body: &FunctionBody, construct_span: Span) {
        self.in_scope(construct_span, |resolver| {
            for (index, parameter) in body.parameters.iter().enumerate() {
                let kind = if body.implicit_self && index == 0 {
                    DefinitionKind::SelfParameter
                } else {
                    DefinitionKind::Parameter
                };
                resolver.declare_local(parameter, kind);
            }
            resolver.resolve_block(&body.body);
        });
    }

    // ========================================================================
    // Name resolution
    // ========================================================================

    /// Resolves a read of an identifier.
    fn resolve_read(&mut self, identifier: &Identifier) {
        if let Some(def) = self.tree.resolve(self.current, &identifier.name) {
            self.tree.definition_mut(def).usages.push(identifier.span);
            return;
        }

        if is_builtin(&identifier.name) {
            let def =
                self.tree
                    .new_definition(identifier.name.clone(), DefinitionKind::Global, None);
            self.tree.definition_mut(def).usages.push(identifier.span);
            self.tree.bind_global(identifier.name.clone(), def);
            return;
        }

        self.warnings.push(Diagnostic::warning(
            DiagnosticCategory::UndefinedIdentifier,
            eco_format!("undefined variable '{}'", identifier.name),
            identifier.span,
        ));
        // Tentative placeholder: later references resolve consistently and
        // warn only once per name.
        let def = self
            .tree
            .new_definition(identifier.name.clone(), DefinitionKind::Global, None);
        self.tree.definition_mut(def).usages.push(identifier.span);
        self.tree.bind_global(identifier.name.clone(), def);
    }

    /// Resolves a write to an identifier. Writes to locals are usages;
    /// writes to globals are (additional) declaration sites; a write to an
    /// unresolved name creates the global.
    fn resolve_write(&mut self, identifier: &Identifier) {
        if let Some(def) = self.tree.lookup_local(self.current, &identifier.name) {
            self.tree.definition_mut(def).usages.push(identifier.span);
            return;
        }
        if let Some(def) = self.tree.lookup_global(&identifier.name) {
            self.tree
                .definition_mut(def)
                .declarations
                .push(identifier.span);
            return;
        }
        let def = self.tree.new_definition(
            identifier.name.clone(),
            DefinitionKind::Global,
            Some(identifier.span),
        );
        self.tree.bind_global(identifier.name.clone(), def);
    }

    /// Declares (or re-declares) a simple global, upgrading a tentative
    /// placeholder left by an earlier unresolved read.
    fn declare_global(&mut self, identifier: &Identifier, kind: DefinitionKind) {
        if let Some(def) = self.tree.lookup_global(&identifier.name) {
            let definition = self.tree.definition_mut(def);
            let was_tentative = definition.declarations.is_empty();
            definition.declarations.push(identifier.span);
            if was_tentative {
                definition.kind = kind;
            }
            return;
        }
        let def = self
            .tree
            .new_definition(identifier.name.clone(), kind, Some(identifier.span));
        self.tree.bind_global(identifier.name.clone(), def);
    }

    /// Resolves the base of a member/index write (`foo` in `foo.bar = 1`).
    /// Known names record a usage; unknown names are promoted to implicit
    /// globals without a warning.
    fn resolve_base_write(&mut self, identifier: &Identifier) {
        if let Some(def) = self.tree.resolve(self.current, &identifier.name) {
            self.tree.definition_mut(def).usages.push(identifier.span);
            return;
        }
        let def = self.tree.new_definition(
            identifier.name.clone(),
            DefinitionKind::Global,
            Some(identifier.span),
        );
        self.tree.bind_global(identifier.name.clone(), def);
    }

    /// Records a member name at its position when exactly one member
    /// function with that name is known. Cross-chain resolution is
    /// best-effort only.
    fn resolve_member_name(&mut self, name: &Identifier) {
        if let Some(defs) = self.member_functions.get(&name.name) {
            if let [def] = defs.as_slice() {
                self.tree.definition_mut(*def).usages.push(name.span);
            }
        }
    }

    /// Emits warnings for locals that are never referenced. Names starting
    /// with `_` are exempt.
    fn warn_unused_locals(&mut self) {
        let unused: Vec<(EcoString, Span)> = self
            .tree
            .definitions()
            .filter(|(_, definition)| {
                definition.kind == DefinitionKind::Local
                    && definition.usages.is_empty()
                    && !definition.name.starts_with('_')
            })
            .filter_map(|(_, definition)| {
                definition
                    .declaration()
                    .map(|span| (definition.name.clone(), span))
            })
            .collect();

        for (name, span) in unused {
            self.warnings.push(Diagnostic::warning(
                DiagnosticCategory::UnusedLocal,
                eco_format!("unused local '{name}'"),
                span,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{lex_with_eof, parse};

    fn resolve_source(source: &str) -> Resolution {
        let (chunk, diagnostics) = parse(lex_with_eof(source));
        assert!(
            diagnostics.is_empty(),
            "parse errors in test source: {diagnostics:?}"
        );
        resolve(&chunk, source)
    }

    fn warning_messages(resolution: &Resolution) -> Vec<String> {
        resolution
            .warnings
            .iter()
            .map(|warning| warning.message.to_string())
            .collect()
    }

    #[test]
    fn implicit_global_created_on_first_write() {
        let source = "score = 0\nscore = score + 1";
        let resolution = resolve_source(source);

        let def = resolution
            .scopes
            .lookup_global("score")
            .expect("global created");
        let definition = resolution.scopes.definition(def);
        assert_eq!(definition.kind, DefinitionKind::Global);
        assert_eq!(definition.declarations.len(), 2);
        assert_eq!(definition.usages.len(), 1);
        assert!(warning_messages(&resolution).is_empty());
    }

    #[test]
    fn global_discoverable_via_def_use_index_at_use_site() {
        let source = "score = 0\nx = score";
        let resolution = resolve_source(source);

        // Position of `score` on line 2, column 4.
        let hit = resolution
            .definitions_usages
            .lookup(2, 4)
            .expect("use site indexed");
        assert_eq!(hit.definitions, vec![Span::new(0, 5)]);
        assert_eq!(hit.usages, vec![Span::new(14, 19)]);
    }

    #[test]
    fn local_init_binds_to_outer_scope() {
        // The init's `x` reads the outer local, not the new one.
        let source = "local x = 1\nfunction f()\nlocal x = x\nreturn x\nend";
        let resolution = resolve_source(source);
        assert!(warning_messages(&resolution).is_empty());

        let outer = resolution
            .scopes
            .lookup_local(resolution.scopes.root(), "x")
            .expect("outer local");
        let outer_def = resolution.scopes.definition(outer);
        // Declared at offset 6, read once by the shadowing init.
        assert_eq!(outer_def.declarations, vec![Span::new(6, 7)]);
        assert_eq!(outer_def.usages.len(), 1);

        let inner_scope = resolution.scopes.scope_at(30);
        let inner = resolution
            .scopes
            .lookup_local(inner_scope, "x")
            .expect("inner local");
        assert_ne!(inner, outer);
        // The `return x` reads the shadowing local.
        assert_eq!(resolution.scopes.definition(inner).usages.len(), 1);
    }

    #[test]
    fn method_declaration_registers_self() {
        let source = "thing = {}\nfunction thing:update(dt)\nreturn self, dt\nend";
        let resolution = resolve_source(source);
        assert!(warning_messages(&resolution).is_empty());

        // Inside the method body, `self` resolves to a SelfParameter.
        let body_scope = resolution.scopes.scope_at(45);
        let self_def = resolution
            .scopes
            .lookup_local(body_scope, "self")
            .expect("implicit self");
        assert_eq!(
            resolution.scopes.definition(self_def).kind,
            DefinitionKind::SelfParameter
        );
        assert_eq!(resolution.scopes.definition(self_def).usages.len(), 1);

        let dt = resolution
            .scopes
            .lookup_local(body_scope, "dt")
            .expect("parameter");
        assert_eq!(
            resolution.scopes.definition(dt).kind,
            DefinitionKind::Parameter
        );
    }

    #[test]
    fn undefined_identifier_warns_once() {
        let source = "x = missing + missing";
        let resolution = resolve_source(source);
        let messages = warning_messages(&resolution);
        assert_eq!(
            messages
                .iter()
                .filter(|message| message.contains("missing"))
                .count(),
            1,
            "placeholder should suppress repeat warnings: {messages:?}"
        );
    }

    #[test]
    fn builtins_do_not_warn() {
        let source = "print(\"hi\")\nx = flr(rnd(10))";
        let resolution = resolve_source(source);
        assert!(
            warning_messages(&resolution).is_empty(),
            "builtins warned: {:?}",
            warning_messages(&resolution)
        );
    }

    #[test]
    fn unused_local_warns_underscore_exempt() {
        let source = "local unused = 1\nlocal _ignored = 2\nlocal used = 3\nx = used";
        let resolution = resolve_source(source);
        let messages = warning_messages(&resolution);
        assert_eq!(messages.len(), 1, "{messages:?}");
        assert!(messages[0].contains("unused"));
    }

    #[test]
    fn local_function_can_recurse() {
        let source = "local function fib(n)\nif (n < 2) return n\nreturn fib(n - 1) + fib(n - 2)\nend";
        let resolution = resolve_source(source);
        assert!(warning_messages(&resolution).is_empty());

        let def = resolution
            .scopes
            .lookup_local(resolution.scopes.root(), "fib")
            .expect("local function");
        let definition = resolution.scopes.definition(def);
        assert_eq!(definition.kind, DefinitionKind::Function);
        assert_eq!(definition.usages.len(), 2);
    }

    #[test]
    fn member_assignment_promotes_undeclared_base() {
        let source = "foo.bar = 1";
        let resolution = resolve_source(source);
        assert!(warning_messages(&resolution).is_empty());

        let def = resolution
            .scopes
            .lookup_global("foo")
            .expect("base promoted to global");
        assert_eq!(
            resolution.scopes.definition(def).declarations,
            vec![Span::new(0, 3)]
        );
    }

    #[test]
    fn repeat_condition_sees_body_locals() {
        let source = "repeat\nlocal done = true\nuntil done";
        let resolution = resolve_source(source);
        assert!(warning_messages(&resolution).is_empty());
    }

    #[test]
    fn loop_variables_are_locals_of_the_body() {
        let source = "for i = 1, 10 do\nprint(i)\nend\nfor k, v in pairs(t) do\nprint(k, v)\nend\nt = {}";
        let resolution = resolve_source(source);
        // The iterator read of `t` precedes its assignment, so it warns once.
        let messages = warning_messages(&resolution);
        assert_eq!(messages.len(), 1, "{messages:?}");
        assert!(messages[0].contains("'t'"));

        assert!(
            resolution
                .scopes
                .lookup_local(resolution.scopes.root(), "i")
                .is_none(),
            "loop variable must not leak into the chunk scope"
        );
    }

    #[test]
    fn dotted_function_declaration_indexes_member_name() {
        let source = "util = {}\nfunction util.clamp(v)\nreturn v\nend\nx = util.clamp(2)";
        let resolution = resolve_source(source);
        assert!(warning_messages(&resolution).is_empty());

        let def = resolution
            .scopes
            .lookup_global("util.clamp")
            .expect("dotted function registered");
        let definition = resolution.scopes.definition(def);
        assert_eq!(definition.kind, DefinitionKind::Function);
        // The call site's `clamp` member is attached best-effort.
        assert_eq!(definition.usages.len(), 1);
    }

    #[test]
    fn if_clause_bodies_get_their_own_scopes() {
        let source = "if a then\nlocal x = 1\nprint(x)\nelse\nlocal y = 2\nprint(y)\nend\na = 1";
        let resolution = resolve_source(source);
        // x and y are confined to their clauses.
        assert!(
            resolution
                .scopes
                .lookup_local(resolution.scopes.root(), "x")
                .is_none()
        );
        assert!(
            resolution
                .scopes
                .lookup_local(resolution.scopes.root(), "y")
                .is_none()
        );
    }

    #[test]
    fn visible_symbols_include_outer_scopes_and_globals() {
        let source = "g = 1\nlocal top = 2\nfunction f(p)\nlocal inner = p\nprint(inner)\nend";
        let resolution = resolve_source(source);

        let body_scope = resolution.scopes.scope_at(50);
        let names: Vec<String> = resolution
            .scopes
            .visible_symbols(body_scope)
            .into_iter()
            .map(|id| resolution.scopes.definition(id).name.to_string())
            .collect();
        assert!(names.contains(&"inner".to_string()));
        assert!(names.contains(&"p".to_string()));
        assert!(names.contains(&"top".to_string()));
        assert!(names.contains(&"g".to_string()));
        assert!(names.contains(&"f".to_string()));
    }

    #[test]
    fn resolution_tolerates_parse_errors() {
        let (chunk, _) = parse(lex_with_eof("if x then\nlocal y = =\nend"));
        let resolution = resolve(&chunk, "if x then\nlocal y = =\nend");
        // No panic; x warns as undefined.
        assert!(
            warning_messages(&resolution)
                .iter()
                .any(|message| message.contains("'x'"))
        );
    }
}
