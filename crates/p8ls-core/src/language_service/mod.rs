// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Language service API for IDE integration.
//!
//! The analyzer IS the language service: [`analyze`](crate::analyze) is a
//! pure function from source text to everything the IDE features need, and
//! this module only adds per-document caching around it. The JSON-RPC
//! transport, document syncing, and client capability negotiation live in
//! the host server, which calls into this facade.
//!
//! Every document is analyzed in isolation, with no cross-file
//! resolution, so `update_file` invalidates exactly one document.
//!
//! # Usage
//!
//! ```
//! use camino::Utf8PathBuf;
//! use p8ls_core::language_service::{LanguageService, SimpleLanguageService};
//!
//! let mut service = SimpleLanguageService::new();
//! let file = Utf8PathBuf::from("main.lua");
//! service.update_file(file.clone(), "x = 1".to_string());
//!
//! assert!(service.diagnostics(&file).is_empty());
//! assert_eq!(service.document_symbols(&file).len(), 1);
//! ```

mod value_objects;

pub use value_objects::{CodeSymbol, Completion, CompletionKind, Location, SymbolKind};

use std::collections::HashMap;

use camino::Utf8PathBuf;

use crate::queries;
use crate::source_analysis::{Diagnostic, Position};
use crate::{Analysis, analyze};

/// The language service trait.
///
/// Defines the per-document query interface for IDE features.
/// Implementations cache analysis results and re-analyze on update.
pub trait LanguageService {
    /// Updates the content of a file, re-analyzing it.
    fn update_file(&mut self, file: Utf8PathBuf, content: String);

    /// Removes a file from the service.
    fn remove_file(&mut self, file: &Utf8PathBuf);

    /// Returns all diagnostics for a file: parse errors first, then
    /// resolver warnings.
    fn diagnostics(&self, file: &Utf8PathBuf) -> Vec<Diagnostic>;

    /// Returns the document outline for a file.
    fn document_symbols(&self, file: &Utf8PathBuf) -> Vec<CodeSymbol>;

    /// Returns the declaration sites of the name at a position.
    fn goto_definition(&self, file: &Utf8PathBuf, position: Position) -> Vec<Location>;

    /// Returns every reference to the name at a position, declarations
    /// included.
    fn find_references(&self, file: &Utf8PathBuf, position: Position) -> Vec<Location>;

    /// Returns identifier completions at a position.
    fn completions(&self, file: &Utf8PathBuf, position: Position) -> Vec<Completion>;
}

/// A simple in-memory language service.
#[derive(Debug, Default)]
pub struct SimpleLanguageService {
    files: HashMap<Utf8PathBuf, FileData>,
}

#[derive(Debug)]
struct FileData {
    analysis: Analysis,
}

impl SimpleLanguageService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached analysis for a file, if any.
    #[must_use]
    pub fn analysis(&self, file: &Utf8PathBuf) -> Option<&Analysis> {
        self.files.get(file).map(|data| &data.analysis)
    }
}

impl LanguageService for SimpleLanguageService {
    fn update_file(&mut self, file: Utf8PathBuf, content: String) {
        let analysis = analyze(&content);
        self.files.insert(file, FileData { analysis });
    }

    fn remove_file(&mut self, file: &Utf8PathBuf) {
        self.files.remove(file);
    }

    fn diagnostics(&self, file: &Utf8PathBuf) -> Vec<Diagnostic> {
        let Some(analysis) = self.analysis(file) else {
            return Vec::new();
        };
        analysis
            .diagnostics
            .iter()
            .chain(analysis.warnings.iter())
            .cloned()
            .collect()
    }

    fn document_symbols(&self, file: &Utf8PathBuf) -> Vec<CodeSymbol> {
        self.analysis(file)
            .map(|analysis| analysis.symbols.clone())
            .unwrap_or_default()
    }

    fn goto_definition(&self, file: &Utf8PathBuf, position: Position) -> Vec<Location> {
        let Some(analysis) = self.analysis(file) else {
            return Vec::new();
        };
        queries::find_definitions(&analysis.definitions_usages, position.line, position.column)
            .into_iter()
            .map(|span| Location::new(file.clone(), span))
            .collect()
    }

    fn find_references(&self, file: &Utf8PathBuf, position: Position) -> Vec<Location> {
        let Some(analysis) = self.analysis(file) else {
            return Vec::new();
        };
        queries::find_references(
            &analysis.definitions_usages,
            position.line,
            position.column,
            true,
        )
        .into_iter()
        .map(|span| Location::new(file.clone(), span))
        .collect()
    }

    fn completions(&self, file: &Utf8PathBuf, position: Position) -> Vec<Completion> {
        let Some(analysis) = self.analysis(file) else {
            return Vec::new();
        };
        let Some(offset) = analysis.definitions_usages.line_index().offset(position) else {
            return Vec::new();
        };
        queries::completions(&analysis.scopes, offset)
    }
}
