//! Text rendering of the IR.
//!
//! `Display` on [`Expression`] and [`Statement`] gives single-line forms
//! (compound statements print their header only). [`SequencePrinter`] renders a
//! whole definition with nested bodies indented.

use core::fmt;
use std::fmt::{Display, Formatter, Write};

use crate::sequence::{
    Argument, Expression, JoinPolicy, PrimitiveCall, PrimitiveStatement, SequenceDefinition,
    Statement, SubroutineCall,
};

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{value}"),
            Expression::Variable(name) | Expression::ChannelRead(name) => write!(f, "{name}"),
            Expression::Element { array, index } => write!(f, "{array}[{index}]"),
            Expression::Unary { operator, operand } => {
                write!(f, "{}", operator.as_str())?;
                write_operand(f, operand)
            }
            Expression::Binary {
                operator,
                left,
                right,
            } => {
                write_operand(f, left)?;
                write!(f, " {} ", operator.as_str())?;
                write_operand(f, right)
            }
            Expression::Call(call) => write!(f, "{call}"),
            Expression::Primitive(call) => write!(f, "{call}"),
        }
    }
}

fn write_operand(f: &mut Formatter, operand: &Expression) -> fmt::Result {
    if matches!(operand, Expression::Binary { .. }) {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

impl Display for SubroutineCall {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, argument) in self.arguments.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            match argument {
                Argument::ByValue(expression) => write!(f, "{expression}")?,
                Argument::ByReference(name) => write!(f, "ref {name}")?,
            }
        }
        write!(f, ")")
    }
}

impl Display for PrimitiveCall {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}(", self.primitive)?;
        for (index, argument) in self.arguments.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{argument}")?;
        }
        write!(f, ")")
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Statement::Assign { target, value } => write!(f, "{target} = {value}"),
            Statement::ChannelWrite { channel, value } => write!(f, "{channel} = {value}"),
            Statement::If { condition, .. } => write!(f, "if {condition}"),
            Statement::While { condition, .. } => write!(f, "while {condition}"),
            Statement::Call(call) => write!(f, "{call}"),
            Statement::Parallel(block) => match block.join {
                JoinPolicy::WaitAll => write!(f, "parallel wait_all"),
            },
            Statement::Return(Some(value)) => write!(f, "return {value}"),
            Statement::Return(None) => write!(f, "return"),
            Statement::NoOp => write!(f, "nop"),
            Statement::Primitive(primitive) => match primitive {
                PrimitiveStatement::Yield => write!(f, "nivs_yield()"),
                PrimitiveStatement::GenerateError {
                    code,
                    message,
                    action,
                } => write!(f, "generate_error({code}, {message:?}, {action})"),
                PrimitiveStatement::Fault { channel, value } => {
                    write!(f, "fault({channel}, {value})")
                }
                PrimitiveStatement::ClearFault { channel } => write!(f, "clearfault({channel})"),
                PrimitiveStatement::ClearLastError => write!(f, "clearlasterror()"),
                PrimitiveStatement::Evaluate(call) => write!(f, "{call}"),
            },
        }
    }
}

/// Renders a definition and its subroutines as indented text.
pub struct SequencePrinter {
    indent: usize,
}

impl Default for SequencePrinter {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl SequencePrinter {
    #[must_use]
    pub fn with_indent(indent: usize) -> Self {
        Self { indent }
    }

    #[must_use]
    pub fn print(&self, sequence: &SequenceDefinition) -> String {
        let mut out = String::new();
        for subroutine in &sequence.subroutines {
            self.print_definition(&mut out, subroutine);
            out.push('\n');
        }
        self.print_definition(&mut out, sequence);
        out
    }

    fn print_definition(&self, out: &mut String, sequence: &SequenceDefinition) {
        let parameters: Vec<String> = sequence
            .parameters
            .iter()
            .map(|p| match p.mode {
                crate::sequence::PassingMode::ByValue => format!("{}: {}", p.name, p.value_type),
                crate::sequence::PassingMode::ByReference => {
                    format!("ref {}: {}", p.name, p.value_type)
                }
            })
            .collect();
        let _ = write!(out, "sequence {}({})", sequence.name, parameters.join(", "));
        if let Some(return_type) = sequence.return_type {
            let _ = write!(out, " -> {return_type}");
        }
        out.push('\n');
        for variable in &sequence.variables {
            self.line(
                out,
                1,
                &format!(
                    "var {}: {} = {}",
                    variable.name, variable.value_type, variable.initial
                ),
            );
        }
        for channel in &sequence.channels {
            self.line(out, 1, &format!("channel {} = {:?}", channel.name, channel.alias));
        }
        self.print_body(out, &sequence.body, 1);
    }

    fn print_body(&self, out: &mut String, body: &[Statement], depth: usize) {
        for statement in body {
            self.line(out, depth, &statement.to_string());
            match statement {
                Statement::If {
                    then_body,
                    else_body,
                    ..
                } => {
                    self.print_body(out, then_body, depth + 1);
                    if !else_body.is_empty() {
                        self.line(out, depth, "else");
                        self.print_body(out, else_body, depth + 1);
                    }
                }
                Statement::While { body, .. } => self.print_body(out, body, depth + 1),
                Statement::Parallel(block) => {
                    for task in &block.tasks {
                        self.line(out, depth + 1, &format!("task {}", task.name));
                        self.print_body(out, &task.body, depth + 2);
                    }
                }
                _ => {}
            }
        }
    }

    fn line(&self, out: &mut String, depth: usize, text: &str) {
        out.push_str(&" ".repeat(depth * self.indent));
        out.push_str(text);
        out.push('\n');
    }
}
