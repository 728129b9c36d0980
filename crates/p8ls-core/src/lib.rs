// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Analysis core for the p8ls PICO-8 Lua language server.
//!
//! This crate contains the parsing and static-analysis pipeline:
//! - Lexical analysis (tokenization, including the PICO-8 dialect
//!   extensions)
//! - Parsing with error recovery (AST construction)
//! - Document outline extraction
//! - Scope and definition-usage resolution
//!
//! The pipeline is exposed as one pure function, [`analyze`]: source text
//! in, AST plus diagnostics plus the derived indices out. The language
//! server transport wraps it via
//! [`language_service::SimpleLanguageService`]; diagnostics presentation
//! and range conversion happen at that boundary.
//!
//! # Example
//!
//! ```
//! let analysis = p8ls_core::analyze("if (btn(0)) x -= 1\nprint(x)");
//!
//! assert!(analysis.diagnostics.is_empty());
//! assert_eq!(analysis.chunk.block.statements.len(), 2);
//! ```

pub mod analyse;
pub mod ast;
pub mod language_service;
pub mod queries;
pub mod source_analysis;

use analyse::{DefUseIndex, ScopeTree, resolve};
use ast::Chunk;
use language_service::CodeSymbol;
use source_analysis::{Diagnostic, DiagnosticCategory, Span, lex_with_eof, parse};

/// Everything derived from one parse of a document.
///
/// `analyze` is total and deterministic: a document with syntax errors
/// still yields a best-effort AST and downstream indices. The result is an
/// owned value with no hidden shared state, so independent analyses may run
/// on separate threads.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The parsed AST (partial after error recovery, never absent).
    pub chunk: Chunk,
    /// Syntax errors from the lexer and parser.
    pub diagnostics: Vec<Diagnostic>,
    /// Resolver warnings (undefined identifiers, unused locals).
    pub warnings: Vec<Diagnostic>,
    /// The hierarchical document outline.
    pub symbols: Vec<CodeSymbol>,
    /// The positional definitions↔usages index.
    pub definitions_usages: DefUseIndex,
    /// The nested scope tree.
    pub scopes: ScopeTree,
}

/// Parses and analyzes a document.
///
/// Runs the full pipeline: lexer → parser → outline → scope and
/// definition-usage resolution.
#[must_use]
pub fn analyze(source: &str) -> Analysis {
    let tokens = lex_with_eof(source);
    let (chunk, diagnostics) = parse(tokens);
    let symbols = queries::document_symbols(&chunk);
    let resolution = resolve(&chunk, source);

    Analysis {
        chunk,
        diagnostics,
        warnings: resolution.warnings,
        symbols,
        definitions_usages: resolution.definitions_usages,
        scopes: resolution.scopes,
    }
}

/// Analyzes a document that may not be valid UTF-8.
///
/// Invalid bytes are replaced with U+FFFD and a diagnostic is recorded at
/// the first offending offset.
#[must_use]
pub fn analyze_bytes(bytes: &[u8]) -> Analysis {
    match std::str::from_utf8(bytes) {
        Ok(source) => analyze(source),
        Err(error) => {
            let offset = u32::try_from(error.valid_up_to()).unwrap_or(u32::MAX - 1);
            let source = String::from_utf8_lossy(bytes);
            let mut analysis = analyze(&source);
            analysis.diagnostics.insert(
                0,
                Diagnostic::error(
                    DiagnosticCategory::UnexpectedCharacter,
                    "invalid UTF-8 replaced with U+FFFD",
                    Span::new(offset, offset + 1),
                ),
            );
            analysis
        }
    }
}

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::analyse::{
        DefId, DefUseIndex, Definition, DefinitionKind, DefinitionsUsages, ScopeId, ScopeTree,
    };
    pub use crate::ast::{Chunk, Expression, Identifier, Statement};
    pub use crate::language_service::{
        CodeSymbol, Completion, CompletionKind, LanguageService, Location,
        SimpleLanguageService, SymbolKind,
    };
    pub use crate::source_analysis::{Diagnostic, Position, Severity, Span};
    pub use crate::{Analysis, analyze};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_is_total_and_deterministic() {
        let source = "x = = 1\nif (a) return\nb += 2";
        let first = analyze(source);
        let second = analyze(source);
        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(first.chunk, second.chunk);
    }

    #[test]
    fn analyze_errors_still_yield_downstream_indices() {
        let analysis = analyze("function f(\nlocal ok = 1\nprint(ok)");
        assert!(!analysis.diagnostics.is_empty());
        // The resolver and outline still ran over the partial tree.
        assert!(analysis.scopes.definitions().count() > 0);
    }

    #[test]
    fn analyze_bytes_accepts_invalid_utf8() {
        let analysis = analyze_bytes(b"x = 1\n\xFF\nz = 2");
        assert!(
            analysis
                .diagnostics
                .iter()
                .any(|diagnostic| diagnostic.message.contains("UTF-8"))
        );
        // The rest of the document still analyzed.
        assert!(analysis.scopes.lookup_global("z").is_some());
    }

    #[test]
    fn analyze_bytes_passes_valid_utf8_through() {
        let analysis = analyze_bytes("x = 1".as_bytes());
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn analysis_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Analysis>();
    }
}
