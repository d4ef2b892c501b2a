#![warn(clippy::pedantic)]
//! Sequence definition IR.
//!
//! This crate holds the artifact the translator emits and the execution engine
//! consumes: declared variables, channel references and an ordered statement
//! body, plus the closed set of value types and primitives the engine supports.
//! Every type is `serde`-serializable so an artifact can be handed to an engine
//! process as JSON.

pub mod primitive;
pub mod printer;
pub mod sequence;
pub mod value;

pub use primitive::{ErrorAction, Primitive};
pub use printer::SequencePrinter;
pub use sequence::{
    Argument, BinaryOperator, ChannelReferenceDeclaration, Expression, JoinPolicy, ParallelBlock,
    ParameterDeclaration, PassingMode, PrimitiveCall, PrimitiveStatement, SequenceDefinition,
    Statement, SubroutineCall, Task, UnaryOperator, VariableDeclaration,
};
pub use value::{Value, ValueType};
