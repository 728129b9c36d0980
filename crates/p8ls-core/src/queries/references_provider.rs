// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Find-references provider.
//!
//! Returns every reference to the name at a position: all usage sites,
//! optionally with the declaration sites included (the LSP
//! `includeDeclaration` flag).

use crate::analyse::DefUseIndex;
use crate::source_analysis::Span;

/// Returns the reference spans for the name at the given position
/// (1-indexed line, 0-indexed byte column), sorted by source order.
#[must_use]
pub fn find_references(
    index: &DefUseIndex,
    line: u32,
    column: u32,
    include_declaration: bool,
) -> Vec<Span> {
    let Some(entry) = index.lookup(line, column) else {
        return Vec::new();
    };
    let mut spans = if include_declaration {
        entry.all().collect::<Vec<_>>()
    } else {
        entry.usages.clone()
    };
    spans.sort_by_key(|span| (span.start(), span.end()));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;

    #[test]
    fn references_from_declaration_site() {
        let source = "local hp = 3\nhp = hp - 1\nprint(hp)";
        let analysis = analyze(source);
        // Cursor on the declaration; writes to a local count as usages.
        let references = find_references(&analysis.definitions_usages, 1, 6, false);
        assert_eq!(references.len(), 3);

        let with_declaration = find_references(&analysis.definitions_usages, 1, 6, true);
        assert_eq!(with_declaration.len(), 4);
        assert_eq!(with_declaration[0].start(), 6);
    }

    #[test]
    fn references_are_sorted_by_position() {
        let source = "local hp = 3\nhp = hp - 1\nprint(hp)";
        let analysis = analyze(source);
        let references = find_references(&analysis.definitions_usages, 2, 0, true);
        for window in references.windows(2) {
            assert!(window[0].start() <= window[1].start());
        }
    }

    #[test]
    fn unknown_position_returns_nothing() {
        let analysis = analyze("local hp = 3");
        assert!(find_references(&analysis.definitions_usages, 1, 11, true).is_empty());
    }
}
