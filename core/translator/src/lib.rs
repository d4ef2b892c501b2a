#![warn(clippy::pedantic)]
//! Translator and validator for real-time sequences.
//!
//! This crate turns functions written in a restricted host-language subset
//! into [`SequenceDefinition`]s: declared variables, channel references and an
//! ordered statement body that a deterministic real-time engine can execute.
//! Everything outside the subset is rejected at translation time.
//!
//! ## What is accepted
//!
//! **Declarations**:
//! - Typed variables: `a = I32Value(0)`, `d = DoubleValueArray([1, 2, 3])`
//! - Channel references: `ch = ChannelReference('Aliases/DesiredRPM')`
//! - Parameters, typed by their `NivsParam` default and passed by value or by reference
//!
//! **Statements**:
//! - Assignment and augmented assignment to variables and channels
//! - `if`/`elif`/`else`, `while`, `return`, `pass`
//! - Calls to other marked sequences and to the primitive library
//! - `with multitask() as mt:` blocks of zero-parameter tasks
//!
//! ## Failure classes
//!
//! Every failure is a [`errors::TranslateError`]; its
//! [`kind`](errors::TranslateError::kind) is one of undefined name,
//! redefinition, structural error, call-graph cycle or not implemented. The
//! first violation aborts the whole translation and no partial artifact is
//! produced.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rtseq_translator::SequenceAssembler;
//!
//! let arena = parse_source(source_code)?;
//! let sequence = SequenceAssembler::assemble(&arena, "main")?.sequence();
//! for variable in &sequence.variables {
//!     println!("{}: {}", variable.name, variable.value_type);
//! }
//! ```
//!
//! ## Phases
//!
//! 1. **Resolve Entry** - The entry must exist and be marked `nivs_rt_sequence`
//! 2. **Build Call Graph** - Discover every reachable subroutine
//! 3. **Check Cycles** - Reject any recursion before translating a statement
//! 4. **Translate** - Translate each function, callees first
//! 5. **Assemble** - Attach the subroutines to the entry definition
//!
//! Each assembly owns its symbol tables and call graph, so concurrent
//! translations never interfere.

use std::marker::PhantomData;

use indexmap::IndexMap;
use rtseq_ast::arena::Arena;
use rtseq_sequence::SequenceDefinition;
use tracing::debug;

use crate::{call_graph::CallGraph, translator::FunctionTranslator};

mod builtins;
pub mod call_graph;
mod channels;
pub mod errors;
mod multitask;
mod symbol_table;
mod translator;

pub use errors::{ErrorKind, TranslateError};

/// Marker state for an assembler that has not translated anything yet.
pub struct AssemblerInitState;

/// Marker state for an assembler holding a finished definition.
pub struct AssemblerCompleteState;

pub type CompletedSequenceAssembler = SequenceAssembler<AssemblerCompleteState>;

/// Drives translation of one entry sequence.
///
/// Uses the typestate pattern so the definition can only be taken once
/// assembly has succeeded.
pub struct SequenceAssembler<S> {
    sequence: SequenceDefinition,
    _state: PhantomData<S>,
}

impl Default for SequenceAssembler<AssemblerInitState> {
    fn default() -> Self {
        SequenceAssembler::new()
    }
}

impl SequenceAssembler<AssemblerInitState> {
    #[must_use]
    pub fn new() -> Self {
        SequenceAssembler {
            sequence: SequenceDefinition::new(String::new()),
            _state: PhantomData,
        }
    }

    /// Translates `entry` and every subroutine it reaches.
    ///
    /// # Errors
    ///
    /// Returns the first [`TranslateError`] found: an unknown or unmarked
    /// entry, an unresolved or recursive call, or an illegal construct in any
    /// reachable function.
    #[must_use = "returns the assembler holding the definition, extract it with .sequence()"]
    pub fn assemble(
        arena: &Arena,
        entry: &str,
    ) -> Result<SequenceAssembler<AssemblerCompleteState>, TranslateError> {
        let Some(function) = arena.find_function(entry) else {
            return Err(TranslateError::UnknownEntry {
                name: entry.to_string(),
            });
        };
        if !function.is_sequence {
            return Err(TranslateError::NotASequence {
                name: entry.to_string(),
                context: entry.to_string(),
                location: function.location,
            });
        }

        let graph = CallGraph::build(arena, &function)?;
        let order = graph.translation_order()?;
        debug!(entry, reachable = graph.len(), "call graph is acyclic");

        let mut translated: IndexMap<String, SequenceDefinition> = IndexMap::new();
        for name in order {
            let Some(function) = graph.function(&name) else {
                continue;
            };
            let sequence = FunctionTranslator::new(function, &translated).translate()?;
            translated.insert(name, sequence);
        }

        let Some(mut sequence) = translated.shift_remove(entry) else {
            return Err(TranslateError::UnknownEntry {
                name: entry.to_string(),
            });
        };
        sequence.subroutines = translated.into_values().collect();
        Ok(SequenceAssembler {
            sequence,
            _state: PhantomData,
        })
    }
}

impl SequenceAssembler<AssemblerCompleteState> {
    /// Consumes the assembler and returns the entry definition.
    #[must_use = "consumes the assembler and returns the sequence definition"]
    pub fn sequence(self) -> SequenceDefinition {
        self.sequence
    }
}

/// Translates `entry` into a [`SequenceDefinition`].
///
/// # Errors
///
/// See [`SequenceAssembler::assemble`].
pub fn translate(arena: &Arena, entry: &str) -> Result<SequenceDefinition, TranslateError> {
    Ok(SequenceAssembler::assemble(arena, entry)?.sequence())
}

#[cfg(test)]
pub(crate) mod test_utils {
    use rtseq_ast::{arena::Arena, builder::Builder};

    pub(crate) fn parse(source: &str) -> Arena {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("Error loading Python grammar");
        let tree = parser.parse(source, None).unwrap();
        let mut builder = Builder::new();
        builder.add_source_code(tree.root_node(), source.as_bytes());
        builder.build_ast().unwrap()
    }
}
