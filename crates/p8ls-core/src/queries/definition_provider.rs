// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Go-to-definition provider.
//!
//! Resolves a source position to the declaration sites of the name at that
//! position, via the definitions↔usages index. A global written in several
//! places reports every write site; a name with no declaration (an
//! undefined identifier, or a builtin) reports none.

use crate::analyse::DefUseIndex;
use crate::source_analysis::Span;

/// Returns the declaration spans for the name at the given position
/// (1-indexed line, 0-indexed byte column).
#[must_use]
pub fn find_definitions(index: &DefUseIndex, line: u32, column: u32) -> Vec<Span> {
    index
        .lookup(line, column)
        .map(|entry| entry.definitions.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;

    #[test]
    fn definition_from_use_site() {
        let source = "local speed = 2\nx = speed";
        let analysis = analyze(source);
        // Cursor on `speed` in line 2.
        let definitions = find_definitions(&analysis.definitions_usages, 2, 4);
        assert_eq!(definitions.len(), 1);
        assert_eq!(&source[definitions[0].as_range()], "speed");
        assert_eq!(definitions[0].start(), 6);
    }

    #[test]
    fn definition_from_declaration_site() {
        let source = "local speed = 2\nx = speed";
        let analysis = analyze(source);
        let definitions = find_definitions(&analysis.definitions_usages, 1, 6);
        assert_eq!(definitions.len(), 1);
    }

    #[test]
    fn global_reports_every_write_site() {
        let source = "score = 0\nscore = 1\nx = score";
        let analysis = analyze(source);
        let definitions = find_definitions(&analysis.definitions_usages, 3, 4);
        assert_eq!(definitions.len(), 2);
    }

    #[test]
    fn position_outside_any_name_returns_nothing() {
        let analysis = analyze("local speed = 2");
        assert!(find_definitions(&analysis.definitions_usages, 1, 12).is_empty());
    }
}
