//! Error types for the AST crate.
//!
//! This module defines structured errors for parsing host-language source and
//! building the source syntax tree from the concrete syntax tree.

use thiserror::Error;

use crate::nodes::Location;

#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum AstError {
    /// The tree-sitter grammar could not be loaded.
    #[error("failed to load the host-language grammar: {reason}")]
    GrammarLoad { reason: String },

    /// Tree-sitter returned no tree at all.
    #[error("failed to parse source")]
    ParseError,

    /// An ERROR or MISSING node in the concrete syntax tree.
    #[error("{location}: invalid syntax near '{snippet}'")]
    Syntax { location: Location, snippet: String },

    /// A construct with a required child the builder could not find.
    #[error("{location}: malformed {construct}")]
    Malformed {
        construct: &'static str,
        location: Location,
    },

    /// A `NivsParam` decorator that does not match the function it decorates.
    #[error("{location}: invalid parameter declaration on `{function}`: {reason}")]
    ParameterDeclaration {
        function: String,
        reason: String,
        location: Location,
    },
}
