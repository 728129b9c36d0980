// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The scope tree and definition arena.
//!
//! Scopes form a tree rooted at the chunk. The tree owns every
//! [`Definition`]; scopes and other structures refer to definitions through
//! [`DefId`] arena indices, so there are no reference cycles and the whole
//! resolution result is a plain owned value.
//!
//! A scope's span is the span of its enclosing syntactic construct (the
//! whole `function` declaration, the `if` clause, the loop statement), so a
//! positional lookup for any point inside the construct (including
//! parameter lists) lands in the right scope.

use std::collections::HashMap;

use ecow::EcoString;

use crate::source_analysis::Span;

/// Arena index of a scope in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

/// Arena index of a definition in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefId(pub(crate) usize);

impl DefId {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// How a name was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// A `local` declaration or loop variable.
    Local,
    /// A global, implicit (first write) or built-in.
    Global,
    /// A function parameter.
    Parameter,
    /// A function declaration (local or global).
    Function,
    /// The implicit `self` of a method declaration.
    SelfParameter,
}

/// The binding site of a name, with every place it is referenced.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// The name as written.
    pub name: EcoString,
    /// How the name was introduced.
    pub kind: DefinitionKind,
    /// Declaration sites. The first entry is the primary declaration; a
    /// global written at several places records each write here. Empty for
    /// tentative placeholders created from undefined reads.
    pub declarations: Vec<Span>,
    /// Every reference to the name (reads, and writes to locals).
    pub usages: Vec<Span>,
}

impl Definition {
    /// Returns the primary declaration span, if the name was ever declared.
    #[must_use]
    pub fn declaration(&self) -> Option<Span> {
        self.declarations.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ScopeData {
    span: Span,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    locals: HashMap<EcoString, DefId>,
}

/// A nested scope tree with its definition arena.
///
/// Invariants: a scope's span contains the spans of all its children, and
/// sibling scopes do not overlap. Both follow from the parser's span
/// discipline, so [`ScopeTree::scope_at`] can descend greedily.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeTree {
    scopes: Vec<ScopeData>,
    definitions: Vec<Definition>,
    globals: HashMap<EcoString, DefId>,
}

impl ScopeTree {
    /// Creates a tree with a root scope covering the whole document.
    #[must_use]
    pub(crate) fn new(root_span: Span) -> Self {
        Self {
            scopes: vec![ScopeData {
                span: root_span,
                parent: None,
                children: Vec::new(),
                locals: HashMap::new(),
            }],
            definitions: Vec::new(),
            globals: HashMap::new(),
        }
    }

    /// Returns the root (chunk) scope.
    #[must_use]
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Returns a scope's span.
    #[must_use]
    pub fn span(&self, scope: ScopeId) -> Span {
        self.scopes[scope.0].span
    }

    /// Returns a scope's parent, or `None` for the root.
    #[must_use]
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    /// Opens a child scope.
    pub(crate) fn push_scope(&mut self, parent: ScopeId, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeData {
            span,
            parent: Some(parent),
            children: Vec::new(),
            locals: HashMap::new(),
        });
        self.scopes[parent.0].children.push(id);
        id
    }

    /// Allocates a definition.
    pub(crate) fn new_definition(
        &mut self,
        name: EcoString,
        kind: DefinitionKind,
        declaration: Option<Span>,
    ) -> DefId {
        let id = DefId(self.definitions.len());
        self.definitions.push(Definition {
            name,
            kind,
            declarations: declaration.into_iter().collect(),
            usages: Vec::new(),
        });
        id
    }

    /// Binds a name in a scope's local map, shadowing any outer binding.
    pub(crate) fn bind_local(&mut self, scope: ScopeId, name: EcoString, def: DefId) {
        self.scopes[scope.0].locals.insert(name, def);
    }

    /// Binds a name in the chunk-level globals map.
    pub(crate) fn bind_global(&mut self, name: EcoString, def: DefId) {
        self.globals.insert(name, def);
    }

    /// Returns the definition for an id.
    #[must_use]
    pub fn definition(&self, id: DefId) -> &Definition {
        &self.definitions[id.0]
    }

    pub(crate) fn definition_mut(&mut self, id: DefId) -> &mut Definition {
        &mut self.definitions[id.0]
    }

    /// Iterates over every definition in the tree.
    pub fn definitions(&self) -> impl Iterator<Item = (DefId, &Definition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (DefId(index), definition))
    }

    /// Looks a name up through the scope chain, innermost first.
    #[must_use]
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<DefId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(&def) = self.scopes[id.0].locals.get(name) {
                return Some(def);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    /// Looks a name up in the chunk-level globals map.
    #[must_use]
    pub fn lookup_global(&self, name: &str) -> Option<DefId> {
        self.globals.get(name).copied()
    }

    /// Resolves a name at a scope: locals first, then globals.
    #[must_use]
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<DefId> {
        self.lookup_local(scope, name)
            .or_else(|| self.lookup_global(name))
    }

    /// Finds the innermost scope containing the byte offset.
    #[must_use]
    pub fn scope_at(&self, offset: u32) -> ScopeId {
        let mut current = self.root();
        'descend: loop {
            for &child in &self.scopes[current.0].children {
                if self.scopes[child.0].span.contains_offset(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Lists every definition visible from a scope, innermost binding wins,
    /// globals last. This backs identifier completion.
    #[must_use]
    pub fn visible_symbols(&self, scope: ScopeId) -> Vec<DefId> {
        let mut seen: HashMap<&str, ()> = HashMap::new();
        let mut result = Vec::new();

        let mut current = Some(scope);
        while let Some(id) = current {
            for (name, &def) in &self.scopes[id.0].locals {
                if seen.insert(name.as_str(), ()).is_none() {
                    result.push(def);
                }
            }
            current = self.scopes[id.0].parent;
        }
        for (name, &def) in &self.globals {
            if seen.insert(name.as_str(), ()).is_none() {
                result.push(def);
            }
        }
        result
    }
}
