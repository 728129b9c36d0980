// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Query providers for IDE features.
//!
//! Each provider is a pure function over the outputs of [`analyze`]
//! (crate root): the outline from the AST, navigation from the
//! definitions↔usages index, completion from the scope tree. The
//! [`language_service`](crate::language_service) facade wraps these
//! per-document.
//!
//! [`analyze`]: crate::analyze

mod completion_provider;
mod definition_provider;
mod document_symbols_provider;
mod references_provider;

pub use completion_provider::completions;
pub use definition_provider::find_definitions;
pub use document_symbols_provider::document_symbols;
pub use references_provider::find_references;
