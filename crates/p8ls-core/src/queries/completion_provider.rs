// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Identifier completion provider.
//!
//! Completion at a position offers, in order:
//!
//! 1. every definition visible from the innermost scope containing the
//!    position (locals shadow outer bindings, globals last),
//! 2. the PICO-8 API surface,
//! 3. the language keywords.
//!
//! Names are deduplicated across the three sources, so a user function
//! shadowing a builtin appears once, with its user signature.

use std::collections::HashSet;

use crate::analyse::{BUILTINS, DefinitionKind, ScopeTree};
use crate::language_service::{Completion, CompletionKind};
use crate::source_analysis::KEYWORDS;

/// Returns completion items for the given byte offset.
#[must_use]
pub fn completions(scopes: &ScopeTree, offset: u32) -> Vec<Completion> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut items = Vec::new();

    let scope = scopes.scope_at(offset);
    for id in scopes.visible_symbols(scope) {
        let definition = scopes.definition(id);
        if !seen.insert(definition.name.as_str()) {
            continue;
        }
        let kind = match definition.kind {
            DefinitionKind::Function => CompletionKind::Function,
            DefinitionKind::Local
            | DefinitionKind::Global
            | DefinitionKind::Parameter
            | DefinitionKind::SelfParameter => CompletionKind::Variable,
        };
        items.push(Completion::new(definition.name.clone(), kind));
    }

    for &name in BUILTINS {
        if seen.insert(name) {
            items.push(Completion::new(name, CompletionKind::Function));
        }
    }
    for &keyword in KEYWORDS {
        if seen.insert(keyword) {
            items.push(Completion::new(keyword, CompletionKind::Keyword));
        }
    }

    items
}
