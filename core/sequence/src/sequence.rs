//! The sequence definition IR.
//!
//! A [`SequenceDefinition`] is immutable once the assembler returns it. Names in
//! statements and expressions refer to the declarations of the definition that
//! contains them.

use serde::{Deserialize, Serialize};

use crate::{
    primitive::{ErrorAction, Primitive},
    value::{Value, ValueType},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDefinition {
    pub name: String,
    pub parameters: Vec<ParameterDeclaration>,
    pub return_type: Option<ValueType>,
    pub variables: Vec<VariableDeclaration>,
    pub channels: Vec<ChannelReferenceDeclaration>,
    pub body: Vec<Statement>,
    /// Every subroutine reachable from this sequence, callees before callers.
    /// Only the entry definition carries them.
    pub subroutines: Vec<SequenceDefinition>,
}

impl SequenceDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            variables: Vec::new(),
            channels: Vec::new(),
            body: Vec::new(),
            subroutines: Vec::new(),
        }
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&VariableDeclaration> {
        self.variables.iter().find(|v| v.name == name)
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.parameters.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&ChannelReferenceDeclaration> {
        self.channels.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn subroutine(&self, name: &str) -> Option<&SequenceDefinition> {
        self.subroutines.iter().find(|s| s.name == name)
    }

    /// Declared local variable names, in declaration order.
    #[must_use]
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Type of a local variable or parameter.
    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<ValueType> {
        self.variable(name)
            .map(|v| v.value_type)
            .or_else(|| self.parameter(name).map(|p| p.value_type))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassingMode {
    ByValue,
    ByReference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    pub value_type: ValueType,
    pub mode: PassingMode,
    pub default: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    pub value_type: ValueType,
    pub initial: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReferenceDeclaration {
    pub name: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Assign {
        target: String,
        value: Expression,
    },
    ChannelWrite {
        channel: String,
        value: Expression,
    },
    If {
        condition: Expression,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    Call(SubroutineCall),
    Parallel(ParallelBlock),
    Return(Option<Expression>),
    NoOp,
    Primitive(PrimitiveStatement),
}

/// Library calls that only make sense as statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveStatement {
    /// Suspends the current task until the scheduler resumes it.
    Yield,
    GenerateError {
        code: Expression,
        message: String,
        action: ErrorAction,
    },
    Fault {
        channel: String,
        value: Expression,
    },
    ClearFault {
        channel: String,
    },
    ClearLastError,
    /// A value primitive called for its effect, result discarded.
    Evaluate(PrimitiveCall),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelBlock {
    pub tasks: Vec<Task>,
    pub join: JoinPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinPolicy {
    WaitAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubroutineCall {
    pub name: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    ByValue(Expression),
    /// Name of a caller variable the callee may mutate.
    ByReference(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveCall {
    pub primitive: Primitive,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Value),
    Variable(String),
    ChannelRead(String),
    Element {
        array: String,
        index: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call(SubroutineCall),
    Primitive(PrimitiveCall),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOperator {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::FloorDiv => "//",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl UnaryOperator {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
        }
    }
}

impl Expression {
    #[must_use]
    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    #[must_use]
    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn unary(operator: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            operator,
            operand: Box::new(operand),
        }
    }
}

impl Statement {
    /// Visits this statement and every statement nested inside it, depth first.
    pub fn walk<'s>(&'s self, visit: &mut impl FnMut(&'s Statement)) {
        visit(self);
        match self {
            Statement::If {
                then_body,
                else_body,
                ..
            } => {
                for statement in then_body.iter().chain(else_body) {
                    statement.walk(visit);
                }
            }
            Statement::While { body, .. } => {
                for statement in body {
                    statement.walk(visit);
                }
            }
            Statement::Parallel(block) => {
                for statement in block.tasks.iter().flat_map(|task| &task.body) {
                    statement.walk(visit);
                }
            }
            _ => {}
        }
    }
}
