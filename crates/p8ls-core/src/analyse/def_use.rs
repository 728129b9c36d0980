// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The positional definitions↔usages index.
//!
//! Maps any source position to the complete set of declaration and usage
//! sites of the name at that position. Backs go-to-definition and
//! find-references.
//!
//! The index owns copies of the span lists (no pointers back into the scope
//! tree) plus a sorted entry table for binary-searched lookup. Entries can
//! nest (a dotted function name's declaration span contains its base
//! identifier's usage span), so lookup picks the smallest span containing
//! the position.

use crate::source_analysis::{LineIndex, Position, Span};

use super::scope::{DefId, ScopeTree};

/// Every declaration and usage site of one definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DefinitionsUsages {
    /// Declaration sites (a global written in several places has several).
    pub definitions: Vec<Span>,
    /// Usage sites.
    pub usages: Vec<Span>,
}

impl DefinitionsUsages {
    /// Iterates declarations and usages together.
    pub fn all(&self) -> impl Iterator<Item = Span> + '_ {
        self.definitions.iter().chain(self.usages.iter()).copied()
    }
}

/// A positional lookup from source positions to [`DefinitionsUsages`].
#[derive(Debug, Clone, PartialEq)]
pub struct DefUseIndex {
    /// Per-definition span sets, indexed by [`DefId`].
    defs: Vec<DefinitionsUsages>,
    /// Every declaration/usage span, sorted by start offset.
    entries: Vec<(Span, DefId)>,
    /// Length of the longest entry span, bounding the lookup scan.
    max_len: u32,
    /// Line-start table for position↔offset conversion.
    line_index: LineIndex,
}

impl DefUseIndex {
    /// Builds the index from a resolved scope tree.
    pub(crate) fn build(tree: &ScopeTree, line_index: LineIndex) -> Self {
        let mut defs = Vec::new();
        let mut entries = Vec::new();
        let mut max_len = 0;

        for (id, definition) in tree.definitions() {
            defs.push(DefinitionsUsages {
                definitions: definition.declarations.clone(),
                usages: definition.usages.clone(),
            });
            for span in definition
                .declarations
                .iter()
                .chain(definition.usages.iter())
            {
                max_len = max_len.max(span.len());
                entries.push((*span, id));
            }
        }

        entries.sort_by_key(|(span, _)| (span.start(), span.end()));
        Self {
            defs,
            entries,
            max_len,
            line_index,
        }
    }

    /// Looks up the definition at a position (1-indexed line, 0-indexed byte
    /// column), returning all of its declaration and usage sites.
    #[must_use]
    pub fn lookup(&self, line: u32, column: u32) -> Option<&DefinitionsUsages> {
        let offset = self.line_index.offset(Position::new(line, column))?;
        self.lookup_offset(offset).map(|id| &self.defs[id.index()])
    }

    /// Looks up the definition whose declaration or usage covers the byte
    /// offset. When entries nest, the smallest covering span wins.
    #[must_use]
    pub fn lookup_offset(&self, offset: u32) -> Option<DefId> {
        let end = self
            .entries
            .partition_point(|(span, _)| span.start() <= offset);

        let mut best: Option<(Span, DefId)> = None;
        for &(span, id) in self.entries[..end].iter().rev() {
            // Entries are sorted by start; once starts fall more than the
            // longest span behind the offset, nothing earlier can cover it.
            if offset - span.start() >= self.max_len {
                break;
            }
            if span.contains_offset(offset)
                && best.is_none_or(|(best_span, _)| span.len() < best_span.len())
            {
                best = Some((span, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Returns the span sets for a definition id.
    #[must_use]
    pub fn definitions_usages(&self, id: DefId) -> &DefinitionsUsages {
        &self.defs[id.index()]
    }

    /// Returns the line-start table used for position conversion.
    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }
}
