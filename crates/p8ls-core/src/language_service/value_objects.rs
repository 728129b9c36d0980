// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Value objects for the language service.
//!
//! Immutable types defined by their attributes:
//!
//! - **`Location`** - A file path and span combination
//! - **`CodeSymbol`** - One node of the document outline
//! - **`Completion`** - An identifier completion suggestion
//!
//! Positions at this boundary use the analyzer's external convention:
//! 1-indexed lines, 0-indexed byte columns (see
//! [`Position`](crate::source_analysis::Position)).

use camino::Utf8PathBuf;
use ecow::EcoString;

use crate::source_analysis::Span;

/// A location in a source file (file path and span).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// The file path.
    pub file: Utf8PathBuf,
    /// The source span.
    pub span: Span,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(file: Utf8PathBuf, span: Span) -> Self {
        Self { file, span }
    }
}

/// The kind of an outline symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A function declaration (global, local, dotted, or method).
    Function,
    /// A `local` variable.
    LocalVariable,
    /// A global variable (first write).
    GlobalVariable,
}

/// One node of the hierarchical document outline.
///
/// Children express lexical containment: functions nest, and locals appear
/// under the function that declares them. Global variables are promoted to
/// the chunk level regardless of where the first write occurs.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSymbol {
    /// The symbol name as displayed (`update`, `util.clamp`, `t:m`).
    pub name: EcoString,
    /// A short rendering, e.g. a function signature `(x, y)`.
    pub detail: Option<EcoString>,
    /// The symbol kind.
    pub kind: SymbolKind,
    /// The span of the whole declaration.
    pub span: Span,
    /// The span of just the name, for cursor placement.
    pub selection_span: Span,
    /// Symbols lexically contained in this one.
    pub children: Vec<CodeSymbol>,
}

/// An identifier completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The text to insert.
    pub label: EcoString,
    /// The kind of completion.
    pub kind: CompletionKind,
    /// Optional detail (e.g. a function signature).
    pub detail: Option<EcoString>,
}

impl Completion {
    /// Creates a new completion.
    #[must_use]
    pub fn new(label: impl Into<EcoString>, kind: CompletionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
        }
    }

    /// Adds detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<EcoString>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// The kind of a completion item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    /// A function (user-defined or built-in).
    Function,
    /// A variable or parameter.
    Variable,
    /// A language keyword.
    Keyword,
}
