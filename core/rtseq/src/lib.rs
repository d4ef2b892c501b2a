#![warn(clippy::pedantic)]
//! Core orchestration crate for rtseq.
//!
//! rtseq translates functions written in a restricted Python subset into
//! [`SequenceDefinition`]s for a deterministic real-time engine, and can run
//! those definitions in-process with a reference evaluator.
//!
//! ```text
//! .py source → tree-sitter → AST → call graph → translate → SequenceDefinition → run
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rtseq::{compile, run};
//!
//! let source = r#"
//! @nivs_rt_sequence
//! def return_constant():
//!     a = DoubleValue(5)
//!     return a.value
//! "#;
//!
//! let sequence = compile(source, "return_constant")?;
//! let result = run(&sequence, &[])?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Phases
//!
//! ### Phase 1: Parse
//!
//! [`parse`] builds an [`Arena`] of source files. Functions decorated with
//! `@nivs_rt_sequence` are marked translatable and `@NivsParam` decorators give
//! parameters their type, default and passing mode.
//!
//! ### Phase 2: Translate
//!
//! [`translate`] resolves the entry function, rejects any recursion reachable
//! from it, and translates it together with every subroutine it calls. The first
//! violation aborts translation; its [`TranslateError::kind`] tells which class
//! of failure it is.
//!
//! ### Phase 3: Run
//!
//! [`run`] evaluates a definition with default [`ExecutorConfig`] and an empty
//! channel store. Use [`Executor`] directly to preset channels or inspect them
//! afterwards.
//!
//! ## Error Handling
//!
//! Phases return `anyhow::Result`. The underlying typed errors
//! ([`rtseq_ast::errors::AstError`], [`TranslateError`], [`RuntimeError`]) can be
//! recovered with `downcast_ref`.
//!
//! ```rust,no_run
//! use rtseq::{compile, TranslateError, ErrorKind};
//!
//! let source = "@nivs_rt_sequence\ndef f():\n    return f()\n";
//! let error = compile(source, "f").unwrap_err();
//! let kind = error.downcast_ref::<TranslateError>().map(TranslateError::kind);
//! assert_eq!(kind, Some(ErrorKind::CallGraphCycle));
//! ```
//!
//! [`Arena`]: rtseq_ast::arena::Arena

use rtseq_ast::{arena::Arena, builder::Builder};

pub use rtseq_runtime::{Executor, ExecutorConfig, RuntimeError};
pub use rtseq_sequence::{SequenceDefinition, SequencePrinter, Value, ValueType};
pub use rtseq_translator::{ErrorKind, TranslateError};

/// Parses source code into an [`Arena`].
///
/// # Errors
///
/// Returns an error if the grammar cannot be loaded, if tree-sitter produces no
/// tree, or if the source contains syntax errors. All syntax errors are
/// reported together.
pub fn parse(source_code: &str) -> anyhow::Result<Arena> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| anyhow::anyhow!("Failed to load Python grammar: {e}"))?;
    let tree = parser
        .parse(source_code, None)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse source code"))?;
    let mut builder = Builder::new();
    builder.add_source_code(tree.root_node(), source_code.as_bytes());
    builder.build_ast()
}

/// Translates the function `entry` and every subroutine it reaches.
///
/// # Errors
///
/// Returns the first [`TranslateError`], wrapped in `anyhow`.
pub fn translate(arena: &Arena, entry: &str) -> anyhow::Result<SequenceDefinition> {
    Ok(rtseq_translator::translate(arena, entry)?)
}

/// [`parse`] followed by [`translate`].
///
/// # Errors
///
/// See [`parse`] and [`translate`].
pub fn compile(source_code: &str, entry: &str) -> anyhow::Result<SequenceDefinition> {
    let arena = parse(source_code)?;
    translate(&arena, entry)
}

/// Runs `sequence` with the reference evaluator.
///
/// # Errors
///
/// Returns the [`RuntimeError`] that stopped the run, wrapped in `anyhow`.
pub fn run(sequence: &SequenceDefinition, arguments: &[Value]) -> anyhow::Result<Option<Value>> {
    Ok(Executor::new(sequence).run(arguments)?)
}
