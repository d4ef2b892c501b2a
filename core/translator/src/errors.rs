use std::fmt::{self, Display, Formatter};

use rtseq_ast::nodes::Location;
use rtseq_sequence::ValueType;
use thiserror::Error;

/// The failure classes every [`TranslateError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An unresolved variable, subroutine or entry name.
    UndefinedName,
    /// A name declared twice in one scope, or a task registered twice.
    Redefinition,
    /// A construct that is structurally illegal in the language subset.
    Structural,
    /// Direct or indirect recursion in the call graph.
    CallGraphCycle,
    /// A recognized pattern the translator does not implement yet.
    NotImplemented,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UndefinedName => write!(f, "undefined name"),
            ErrorKind::Redefinition => write!(f, "redefinition"),
            ErrorKind::Structural => write!(f, "translate error"),
            ErrorKind::CallGraphCycle => write!(f, "call graph cycle"),
            ErrorKind::NotImplemented => write!(f, "not implemented"),
        }
    }
}

/// What was being declared when a redefinition was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Variable,
    Parameter,
    ChannelReference,
    Task,
}

impl Display for DeclarationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationKind::Variable => write!(f, "variable"),
            DeclarationKind::Parameter => write!(f, "parameter"),
            DeclarationKind::ChannelReference => write!(f, "channel reference"),
            DeclarationKind::Task => write!(f, "task"),
        }
    }
}

/// Every way translation can fail.
///
/// `context` is the enclosing function, or `function::task` inside a task body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[must_use = "errors must not be silently ignored"]
pub enum TranslateError {
    #[error("unknown entry sequence `{name}`")]
    UnknownEntry { name: String },

    #[error("{location}: use of undeclared name `{name}` in `{context}`")]
    UndefinedName {
        name: String,
        context: String,
        location: Location,
    },

    #[error("{location}: call to undefined subroutine `{name}` in `{context}`")]
    UndefinedCall {
        name: String,
        context: String,
        location: Location,
    },

    #[error(
        "{location}: `{name}` is not a translatable sequence, mark it with `nivs_rt_sequence` (called from `{context}`)"
    )]
    NotASequence {
        name: String,
        context: String,
        location: Location,
    },

    #[error("{location}: {kind} `{name}` is already declared in `{context}`")]
    Redefinition {
        kind: DeclarationKind,
        name: String,
        context: String,
        location: Location,
    },

    #[error("{location}: recursive call chain {}", path.join(" -> "))]
    CallGraphCycle { path: Vec<String>, location: Location },

    #[error("{location}: `return` is not allowed inside task `{task}`")]
    ReturnInTask { task: String, location: Location },

    #[error("{location}: `return` is not allowed in a multitask block in `{context}`")]
    ReturnInMultitask { context: String, location: Location },

    #[error("{location}: task `{task}` cannot define the nested function `{name}`")]
    NestedDefinitionInTask {
        task: String,
        name: String,
        location: Location,
    },

    #[error(
        "{location}: nested function `{name}` in `{context}` is only allowed as a task of a multitask block"
    )]
    NestedDefinition {
        name: String,
        context: String,
        location: Location,
    },

    #[error("{location}: `multitask()` takes no arguments but {count} were given in `{context}`")]
    MultitaskArguments {
        count: usize,
        context: String,
        location: Location,
    },

    #[error("{location}: task `{task}` must not declare parameters")]
    TaskParameters { task: String, location: Location },

    #[error(
        "{location}: only task definitions and `append` registrations may appear in a multitask block in `{context}`"
    )]
    MultitaskBody { context: String, location: Location },

    #[error(
        "{location}: channel reference `{name}` cannot be returned from `{context}`, copy it into a local variable first"
    )]
    ChannelReturn {
        name: String,
        context: String,
        location: Location,
    },

    #[error("{location}: {construct} is not supported in `{context}`")]
    Unsupported {
        construct: String,
        context: String,
        location: Location,
    },

    #[error("{location}: `{callee}` expects {expected} argument(s) but {found} were given in `{context}`")]
    ArgumentCount {
        callee: String,
        expected: usize,
        found: usize,
        context: String,
        location: Location,
    },

    #[error(
        "{location}: argument {index} of `{callee}` is passed by reference and must name a `{expected}` variable in `{context}`"
    )]
    InvalidReferenceArgument {
        callee: String,
        index: usize,
        expected: ValueType,
        context: String,
        location: Location,
    },

    #[error("{location}: `{callee}` does not return a value but is used as one in `{context}`")]
    NoReturnValue {
        callee: String,
        context: String,
        location: Location,
    },

    #[error("{location}: {reason} in `{context}`")]
    InvalidDeclaration {
        reason: String,
        context: String,
        location: Location,
    },

    #[error("{location}: `{name}` is not an array in `{context}`")]
    NotAnArray {
        name: String,
        context: String,
        location: Location,
    },

    #[error("{location}: cannot convert `{found}` to `{expected}` in `{context}`")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
        context: String,
        location: Location,
    },

    #[error("{location}: {construct} is not implemented in `{context}`")]
    NotImplemented {
        construct: String,
        context: String,
        location: Location,
    },
}

impl TranslateError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::UnknownEntry { .. }
            | TranslateError::UndefinedName { .. }
            | TranslateError::UndefinedCall { .. }
            | TranslateError::NotASequence { .. } => ErrorKind::UndefinedName,
            TranslateError::Redefinition { .. } => ErrorKind::Redefinition,
            TranslateError::CallGraphCycle { .. } => ErrorKind::CallGraphCycle,
            TranslateError::NotImplemented { .. } => ErrorKind::NotImplemented,
            TranslateError::ReturnInTask { .. }
            | TranslateError::ReturnInMultitask { .. }
            | TranslateError::NestedDefinitionInTask { .. }
            | TranslateError::NestedDefinition { .. }
            | TranslateError::MultitaskArguments { .. }
            | TranslateError::TaskParameters { .. }
            | TranslateError::MultitaskBody { .. }
            | TranslateError::ChannelReturn { .. }
            | TranslateError::Unsupported { .. }
            | TranslateError::ArgumentCount { .. }
            | TranslateError::InvalidReferenceArgument { .. }
            | TranslateError::NoReturnValue { .. }
            | TranslateError::InvalidDeclaration { .. }
            | TranslateError::NotAnArray { .. }
            | TranslateError::TypeMismatch { .. } => ErrorKind::Structural,
        }
    }

    /// Source location of the offending construct, when there is one.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            TranslateError::UnknownEntry { .. } => None,
            TranslateError::UndefinedName { location, .. }
            | TranslateError::UndefinedCall { location, .. }
            | TranslateError::NotASequence { location, .. }
            | TranslateError::Redefinition { location, .. }
            | TranslateError::CallGraphCycle { location, .. }
            | TranslateError::ReturnInTask { location, .. }
            | TranslateError::ReturnInMultitask { location, .. }
            | TranslateError::NestedDefinitionInTask { location, .. }
            | TranslateError::NestedDefinition { location, .. }
            | TranslateError::MultitaskArguments { location, .. }
            | TranslateError::TaskParameters { location, .. }
            | TranslateError::MultitaskBody { location, .. }
            | TranslateError::ChannelReturn { location, .. }
            | TranslateError::Unsupported { location, .. }
            | TranslateError::ArgumentCount { location, .. }
            | TranslateError::InvalidReferenceArgument { location, .. }
            | TranslateError::NoReturnValue { location, .. }
            | TranslateError::InvalidDeclaration { location, .. }
            | TranslateError::NotAnArray { location, .. }
            | TranslateError::TypeMismatch { location, .. }
            | TranslateError::NotImplemented { location, .. } => Some(*location),
        }
    }
}
