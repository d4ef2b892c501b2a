//! Built-in primitives the execution engine provides.
//!
//! Value primitives appear in expressions; the statement-only library calls
//! (`fault`, `clearfault`, `clearlasterror`, `generate_error`, `nivs_yield`)
//! have dedicated statement forms in [`crate::sequence::PrimitiveStatement`].

use core::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::value::ValueType;

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Abs,
    AbsTime,
    ArraySize,
    DeltaT,
    DeltaTUs,
    Fix,
    GetLastError,
    Iteration,
    Quotient,
    Recip,
    Rem,
    SeqTime,
    SeqTimeUs,
    TickCountMs,
    TickCountUs,
}

impl Primitive {
    pub const ALL: &'static [Primitive] = &[
        Primitive::Abs,
        Primitive::AbsTime,
        Primitive::ArraySize,
        Primitive::DeltaT,
        Primitive::DeltaTUs,
        Primitive::Fix,
        Primitive::GetLastError,
        Primitive::Iteration,
        Primitive::Quotient,
        Primitive::Recip,
        Primitive::Rem,
        Primitive::SeqTime,
        Primitive::SeqTimeUs,
        Primitive::TickCountMs,
        Primitive::TickCountUs,
    ];

    /// Host-language name of the primitive.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Primitive::Abs => "abs",
            Primitive::AbsTime => "abstime",
            Primitive::ArraySize => "arraysize",
            Primitive::DeltaT => "deltat",
            Primitive::DeltaTUs => "deltatus",
            Primitive::Fix => "fix",
            Primitive::GetLastError => "getlasterror",
            Primitive::Iteration => "iteration",
            Primitive::Quotient => "quotient",
            Primitive::Recip => "recip",
            Primitive::Rem => "rem",
            Primitive::SeqTime => "seqtime",
            Primitive::SeqTimeUs => "seqtimeus",
            Primitive::TickCountMs => "tickcountms",
            Primitive::TickCountUs => "tickcountus",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|p| p.name() == name).copied()
    }

    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            Primitive::Abs | Primitive::ArraySize | Primitive::Fix | Primitive::Recip => 1,
            Primitive::Quotient | Primitive::Rem => 2,
            _ => 0,
        }
    }

    /// Result type given the argument types.
    #[must_use]
    pub fn result_type(&self, arguments: &[ValueType]) -> ValueType {
        match self {
            Primitive::Abs | Primitive::Fix => {
                arguments.first().copied().unwrap_or(ValueType::Double)
            }
            Primitive::Quotient | Primitive::Rem => match arguments {
                [left, right] => left.promote(*right),
                _ => ValueType::Double,
            },
            Primitive::ArraySize | Primitive::GetLastError => ValueType::Int32,
            Primitive::Iteration | Primitive::TickCountMs | Primitive::TickCountUs => {
                ValueType::UInt64
            }
            Primitive::DeltaTUs | Primitive::SeqTimeUs => ValueType::Int64,
            Primitive::AbsTime | Primitive::DeltaT | Primitive::Recip | Primitive::SeqTime => {
                ValueType::Double
            }
        }
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What the engine does after a sequence raises an error.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ErrorAction {
    ContinueSequenceExecution,
    StopSequence,
    AbortSequence,
}

impl ErrorAction {
    pub const ALL: &'static [ErrorAction] = &[
        ErrorAction::ContinueSequenceExecution,
        ErrorAction::StopSequence,
        ErrorAction::AbortSequence,
    ];

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ErrorAction::ContinueSequenceExecution => "ContinueSequenceExecution",
            ErrorAction::StopSequence => "StopSequence",
            ErrorAction::AbortSequence => "AbortSequence",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|a| a.name() == name).copied()
    }
}

impl Display for ErrorAction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "ErrorAction.{}", self.name())
    }
}
