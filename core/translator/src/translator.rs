//! Statement and expression translation for one function.
//!
//! A [`FunctionTranslator`] owns the symbol table and the definition under
//! construction. Channel references and multitask blocks are handled in
//! sibling modules that extend the same type.

use std::rc::Rc;

use indexmap::IndexMap;
use rtseq_ast::nodes::{self as ast, Identifier, Literal, Location, OperatorKind, UnaryOperatorKind};
use rtseq_sequence::{
    self as ir, Argument, BinaryOperator, ErrorAction, ParameterDeclaration, PassingMode,
    PrimitiveCall, PrimitiveStatement, SequenceDefinition, SubroutineCall, UnaryOperator, Value,
    ValueType, VariableDeclaration,
};
use tracing::trace;

use crate::{
    builtins::Builtin,
    errors::{DeclarationKind, TranslateError},
    symbol_table::{Symbol, SymbolTable, VariableSymbol},
};

pub(crate) struct FunctionTranslator<'a> {
    pub(crate) function: &'a ast::FunctionDefinition,
    /// Already translated callees, keyed by source name.
    pub(crate) callees: &'a IndexMap<String, SequenceDefinition>,
    pub(crate) symbols: SymbolTable,
    pub(crate) sequence: SequenceDefinition,
    /// Names of the task bodies being translated, innermost last.
    pub(crate) tasks: Vec<String>,
    /// Number of enclosing `if`, `while` and task bodies.
    pub(crate) block_depth: usize,
}

impl<'a> FunctionTranslator<'a> {
    pub(crate) fn new(
        function: &'a ast::FunctionDefinition,
        callees: &'a IndexMap<String, SequenceDefinition>,
    ) -> Self {
        Self {
            function,
            callees,
            symbols: SymbolTable::default(),
            sequence: SequenceDefinition::new(function.name()),
            tasks: Vec::new(),
            block_depth: 0,
        }
    }

    pub(crate) fn translate(mut self) -> Result<SequenceDefinition, TranslateError> {
        let function = self.function;
        let name = function.name();
        trace!(function = %name, "translating");
        self.symbols.push_scope(&name);
        self.declare_parameters()?;
        let body = self.translate_block(&function.body)?;
        self.symbols.pop_scope();
        self.sequence.body = body;
        Ok(self.sequence)
    }

    /// Enclosing function, or `function::task` inside a task body.
    pub(crate) fn context(&self) -> String {
        self.symbols.current_path()
    }

    fn declare_parameters(&mut self) -> Result<(), TranslateError> {
        let function = self.function;
        for parameter in &function.parameters {
            let name = parameter.name();
            let (value_type, default) = match &parameter.default {
                Some(default) => self.parameter_default(default)?,
                None => (ValueType::Double, ValueType::Double.default_value()),
            };
            let mode = if parameter.is_by_reference() {
                PassingMode::ByReference
            } else {
                PassingMode::ByValue
            };
            let ir_name = self.symbols.reserve_ir_name(&name);
            let symbol = Symbol::Variable(VariableSymbol {
                ir_name: ir_name.clone(),
                value_type,
            });
            self.declare_symbol(&name, symbol, DeclarationKind::Parameter, parameter.location)?;
            self.sequence.parameters.push(ParameterDeclaration {
                name: ir_name,
                value_type,
                mode,
                default,
            });
        }
        Ok(())
    }

    /// A default is either a typed constructor call or a bare constant.
    fn parameter_default(
        &self,
        default: &ast::Expression,
    ) -> Result<(ValueType, Value), TranslateError> {
        if let ast::Expression::Call(call) = default
            && let Some(Builtin::Constructor(value_type)) = Builtin::of_call(call)
        {
            let initial = match call.arguments.as_slice() {
                [] => value_type.default_value(),
                [argument] => {
                    let constant = constant_value(argument).ok_or_else(|| {
                        self.invalid_declaration("a parameter default must be a constant", call.location)
                    })?;
                    self.coerce(&constant, value_type, call.location)?
                }
                arguments => {
                    return Err(self.argument_count(
                        value_type.constructor_name(),
                        1,
                        arguments.len(),
                        call.location,
                    ));
                }
            };
            return Ok((value_type, initial));
        }
        let constant = constant_value(default).ok_or_else(|| {
            self.invalid_declaration("a parameter default must be a constant", default.location())
        })?;
        Ok((constant.value_type(), constant))
    }

    pub(crate) fn declare_symbol(
        &mut self,
        name: &str,
        symbol: Symbol,
        kind: DeclarationKind,
        location: Location,
    ) -> Result<(), TranslateError> {
        self.symbols
            .declare(name, symbol)
            .map_err(|_| TranslateError::Redefinition {
                kind,
                name: name.to_string(),
                context: self.context(),
                location,
            })
    }

    pub(crate) fn translate_block(
        &mut self,
        body: &[ast::Statement],
    ) -> Result<Vec<ir::Statement>, TranslateError> {
        let mut statements = Vec::with_capacity(body.len());
        for (index, statement) in body.iter().enumerate() {
            if index == 0 && statement.is_docstring() {
                continue;
            }
            statements.extend(self.translate_statement(statement)?);
        }
        Ok(statements)
    }

    /// Runs `translate` one block deeper.
    pub(crate) fn nested<T>(
        &mut self,
        translate: impl FnOnce(&mut Self) -> Result<T, TranslateError>,
    ) -> Result<T, TranslateError> {
        self.block_depth += 1;
        let result = translate(self);
        self.block_depth -= 1;
        result
    }

    fn translate_statement(
        &mut self,
        statement: &ast::Statement,
    ) -> Result<Vec<ir::Statement>, TranslateError> {
        let translated = match statement {
            ast::Statement::Assign(assign) => return self.translate_assign(assign),
            ast::Statement::AugmentedAssign(assign) => self.translate_augmented_assign(assign)?,
            ast::Statement::Expression(expression) => {
                self.translate_expression_statement(expression)?
            }
            ast::Statement::Return(ret) => self.translate_return(ret)?,
            ast::Statement::If(if_statement) => self.translate_if(if_statement)?,
            ast::Statement::While(while_statement) => {
                if while_statement.has_else {
                    return Err(self.unsupported("`while ... else`", while_statement.location));
                }
                let condition = self.translate_expression(&while_statement.condition)?;
                let body = self.nested(|t| t.translate_block(&while_statement.body))?;
                ir::Statement::While { condition, body }
            }
            ast::Statement::For(for_statement) => {
                return Err(self.unsupported("a `for` loop", for_statement.location));
            }
            ast::Statement::With(with) => self.translate_with(with)?,
            ast::Statement::FunctionDefinition(definition) => {
                return Err(match self.tasks.last() {
                    Some(task) => TranslateError::NestedDefinitionInTask {
                        task: task.clone(),
                        name: definition.name(),
                        location: definition.location,
                    },
                    None => TranslateError::NestedDefinition {
                        name: definition.name(),
                        context: self.context(),
                        location: definition.location,
                    },
                });
            }
            ast::Statement::Pass(_) => ir::Statement::NoOp,
            ast::Statement::Unsupported(node) => {
                return Err(self.unsupported(&format!("`{}`", node.kind), node.location));
            }
        };
        Ok(vec![translated])
    }

    fn translate_if(&mut self, if_statement: &ast::IfStatement) -> Result<ir::Statement, TranslateError> {
        let condition = self.translate_expression(&if_statement.condition)?;
        let (then_body, else_body) = self.nested(|t| {
            let then_body = t.translate_block(&if_statement.consequence)?;
            let else_body = match &if_statement.alternative {
                Some(alternative) => t.translate_block(alternative)?,
                None => Vec::new(),
            };
            Ok((then_body, else_body))
        })?;
        Ok(ir::Statement::If {
            condition,
            then_body,
            else_body,
        })
    }

    fn translate_assign(
        &mut self,
        assign: &ast::AssignStatement,
    ) -> Result<Vec<ir::Statement>, TranslateError> {
        if let ast::Expression::Identifier(target) = &assign.left
            && let ast::Expression::Call(call) = &assign.right
        {
            match Builtin::of_call(call) {
                Some(Builtin::Constructor(value_type)) => {
                    return self.translate_declaration(target, value_type, call);
                }
                Some(Builtin::ChannelReference) => {
                    self.declare_channel(target, call)?;
                    return Ok(Vec::new());
                }
                _ => {}
            }
        }
        if let ast::Expression::Subscript(subscript) = &assign.left {
            return Err(self.not_implemented("assignment to an array element", subscript.location));
        }
        let Some(target) = assign.left.value_target() else {
            return Err(self.unsupported("this assignment target", assign.left.location()));
        };
        let value = self.translate_expression(&assign.right)?;
        Ok(vec![self.write(target, value)?])
    }

    /// `x = I32Value(...)` declares `x` in the current scope.
    ///
    /// A constant argument becomes the declared initial value. Anything else
    /// declares the zero value and assigns the translated argument. Inside a
    /// nested block the variable is also reset each time the declaration runs.
    fn translate_declaration(
        &mut self,
        target: &Rc<Identifier>,
        value_type: ValueType,
        call: &ast::CallExpression,
    ) -> Result<Vec<ir::Statement>, TranslateError> {
        if !call.keyword_arguments.is_empty() {
            return Err(self.unsupported("keyword arguments", call.location));
        }
        let (initial, assigned) = match call.arguments.as_slice() {
            [] => (value_type.default_value(), None),
            [argument] => match constant_value(argument) {
                Some(constant) => (self.coerce(&constant, value_type, call.location)?, None),
                None if value_type.is_array() => {
                    return Err(self.invalid_declaration(
                        "an array must be initialized with a constant list",
                        call.location,
                    ));
                }
                None => (
                    value_type.default_value(),
                    Some(self.translate_expression(argument)?),
                ),
            },
            arguments => {
                return Err(self.argument_count(
                    value_type.constructor_name(),
                    1,
                    arguments.len(),
                    call.location,
                ));
            }
        };

        let name = target.name.as_str();
        if self.symbols.is_declared_locally(name) {
            return Err(TranslateError::Redefinition {
                kind: DeclarationKind::Variable,
                name: name.to_string(),
                context: self.context(),
                location: target.location,
            });
        }
        let ir_name = self.symbols.reserve_ir_name(name);
        let symbol = Symbol::Variable(VariableSymbol {
            ir_name: ir_name.clone(),
            value_type,
        });
        self.declare_symbol(name, symbol, DeclarationKind::Variable, target.location)?;
        trace!(name, ir_name = %ir_name, %value_type, "variable declared");
        self.sequence.variables.push(VariableDeclaration {
            name: ir_name.clone(),
            value_type,
            initial: initial.clone(),
        });

        let statements = match assigned {
            Some(value) => vec![ir::Statement::Assign {
                target: ir_name,
                value,
            }],
            None if self.block_depth > 0 => vec![ir::Statement::Assign {
                target: ir_name,
                value: ir::Expression::Literal(initial),
            }],
            None => Vec::new(),
        };
        Ok(statements)
    }

    fn translate_augmented_assign(
        &mut self,
        assign: &ast::AugmentedAssignStatement,
    ) -> Result<ir::Statement, TranslateError> {
        if let ast::Expression::Subscript(subscript) = &assign.left {
            return Err(self.not_implemented(
                "augmented assignment to an array element",
                subscript.location,
            ));
        }
        let Some(target) = assign.left.value_target() else {
            return Err(self.unsupported("this assignment target", assign.left.location()));
        };
        let current = self.read(target)?;
        let right = self.translate_expression(&assign.right)?;
        let value = ir::Expression::binary(binary_operator(assign.operator), current, right);
        self.write(target, value)
    }

    fn translate_return(&mut self, ret: &ast::ReturnStatement) -> Result<ir::Statement, TranslateError> {
        if let Some(task) = self.tasks.last() {
            return Err(TranslateError::ReturnInTask {
                task: task.clone(),
                location: ret.location,
            });
        }
        let Some(expression) = &ret.expression else {
            return Ok(ir::Statement::Return(None));
        };
        self.reject_channel_return(expression)?;
        let value = self.translate_expression(expression)?;
        if self.sequence.return_type.is_none() {
            self.sequence.return_type = Some(self.type_of(&value));
        }
        Ok(ir::Statement::Return(Some(value)))
    }

    fn translate_expression_statement(
        &mut self,
        expression: &ast::Expression,
    ) -> Result<ir::Statement, TranslateError> {
        let ast::Expression::Call(call) = expression else {
            return Err(self.unsupported("an expression statement", expression.location()));
        };
        let statement = match Builtin::of_call(call) {
            Some(Builtin::Yield) => {
                self.expect_arguments("nivs_yield", 0, call)?;
                ir::Statement::Primitive(PrimitiveStatement::Yield)
            }
            Some(Builtin::ClearLastError) => {
                self.expect_arguments("clearlasterror", 0, call)?;
                ir::Statement::Primitive(PrimitiveStatement::ClearLastError)
            }
            Some(Builtin::GenerateError) => self.translate_generate_error(call)?,
            Some(Builtin::Fault) => self.translate_fault(call)?,
            Some(Builtin::ClearFault) => self.translate_clear_fault(call)?,
            Some(Builtin::Primitive(primitive)) => ir::Statement::Primitive(
                PrimitiveStatement::Evaluate(self.primitive_call(primitive, call)?),
            ),
            Some(Builtin::Constructor(_) | Builtin::ChannelReference) => {
                return Err(self.invalid_declaration(
                    "a declaration must be assigned to a name",
                    call.location,
                ));
            }
            Some(Builtin::Multitask) => {
                return Err(self.unsupported("`multitask()` outside a `with` statement", call.location));
            }
            None => match call.callee_name() {
                Some(name) => ir::Statement::Call(self.subroutine_call(name, call)?),
                None => return Err(self.unsupported("a method call", call.location)),
            },
        };
        Ok(statement)
    }

    /// `generate_error(code, "message", ErrorAction.X)`
    fn translate_generate_error(
        &mut self,
        call: &ast::CallExpression,
    ) -> Result<ir::Statement, TranslateError> {
        self.expect_arguments("generate_error", 3, call)?;
        let [code, message, action] = call.arguments.as_slice() else {
            return Err(self.argument_count("generate_error", 3, call.arguments.len(), call.location));
        };
        let ast::Expression::Literal(Literal::String(message)) = message else {
            return Err(self.unsupported("a non-literal error message", message.location()));
        };
        let action = action
            .dotted_tail()
            .and_then(ErrorAction::from_name)
            .ok_or_else(|| self.unsupported("an unknown error action", action.location()))?;
        let code = self.translate_expression(code)?;
        Ok(ir::Statement::Primitive(PrimitiveStatement::GenerateError {
            code,
            message: message.value.clone(),
            action,
        }))
    }

    pub(crate) fn translate_expression(
        &mut self,
        expression: &ast::Expression,
    ) -> Result<ir::Expression, TranslateError> {
        match expression {
            ast::Expression::Identifier(identifier) => self.read(identifier),
            ast::Expression::Attribute(attribute) => match expression.value_target() {
                Some(identifier) => self.read(identifier),
                None => Err(self.unsupported(
                    &format!("attribute `{}`", attribute.attribute.name),
                    attribute.location,
                )),
            },
            ast::Expression::Subscript(subscript) => {
                let Some(identifier) = subscript.value.value_target() else {
                    return Err(self.unsupported("a subscript of an expression", subscript.location));
                };
                let array = match self.lookup(identifier)? {
                    Symbol::Variable(variable) if variable.value_type.is_array() => variable.ir_name,
                    _ => {
                        return Err(TranslateError::NotAnArray {
                            name: identifier.name.clone(),
                            context: self.context(),
                            location: subscript.location,
                        });
                    }
                };
                let index = self.translate_expression(&subscript.index)?;
                Ok(ir::Expression::Element {
                    array,
                    index: Box::new(index),
                })
            }
            ast::Expression::Call(call) => self.translate_call_expression(call),
            ast::Expression::Binary(binary) => {
                let left = self.translate_expression(&binary.left)?;
                let right = self.translate_expression(&binary.right)?;
                Ok(ir::Expression::binary(binary_operator(binary.operator), left, right))
            }
            ast::Expression::Unary(unary) => {
                let operand = self.translate_expression(&unary.expression)?;
                let operator = match unary.operator {
                    UnaryOperatorKind::Pos => return Ok(operand),
                    UnaryOperatorKind::Neg => UnaryOperator::Negate,
                    UnaryOperatorKind::Not => UnaryOperator::Not,
                    UnaryOperatorKind::BitNot => UnaryOperator::BitNot,
                };
                Ok(ir::Expression::unary(operator, operand))
            }
            ast::Expression::Literal(literal) => match literal_value(literal) {
                Some(value) => Ok(ir::Expression::Literal(value)),
                None => Err(self.unsupported("this literal", literal.location())),
            },
            ast::Expression::List(list) => {
                Err(self.unsupported("a list outside an array declaration", list.location))
            }
            ast::Expression::Unsupported(node) => {
                Err(self.unsupported(&format!("`{}`", node.kind), node.location))
            }
        }
    }

    fn translate_call_expression(
        &mut self,
        call: &ast::CallExpression,
    ) -> Result<ir::Expression, TranslateError> {
        match Builtin::of_call(call) {
            Some(Builtin::Primitive(primitive)) => {
                Ok(ir::Expression::Primitive(self.primitive_call(primitive, call)?))
            }
            Some(Builtin::Constructor(value_type)) => {
                let constant = match call.arguments.as_slice() {
                    [] => Some(value_type.default_value()),
                    [argument] => constant_value(argument),
                    _ => None,
                };
                match constant {
                    Some(constant) => Ok(ir::Expression::Literal(self.coerce(
                        &constant,
                        value_type,
                        call.location,
                    )?)),
                    None => Err(self.invalid_declaration(
                        "a declaration must be assigned to a name",
                        call.location,
                    )),
                }
            }
            Some(_) => Err(self.unsupported(
                &format!("`{}` as a value", call.callee_tail().unwrap_or("call")),
                call.location,
            )),
            None => {
                let Some(name) = call.callee_name() else {
                    return Err(self.unsupported("a method call", call.location));
                };
                let callees = self.callees;
                let returns = callees
                    .get(name)
                    .is_some_and(|callee| callee.return_type.is_some());
                let subroutine = self.subroutine_call(name, call)?;
                if !returns {
                    return Err(TranslateError::NoReturnValue {
                        callee: name.to_string(),
                        context: self.context(),
                        location: call.location,
                    });
                }
                Ok(ir::Expression::Call(subroutine))
            }
        }
    }

    fn primitive_call(
        &mut self,
        primitive: rtseq_sequence::Primitive,
        call: &ast::CallExpression,
    ) -> Result<PrimitiveCall, TranslateError> {
        self.expect_arguments(primitive.name(), primitive.arity(), call)?;
        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.translate_expression(argument))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PrimitiveCall {
            primitive,
            arguments,
        })
    }

    /// Matches arguments positionally against the callee's parameters.
    ///
    /// Missing trailing by-value arguments take the parameter default.
    fn subroutine_call(
        &mut self,
        name: &str,
        call: &ast::CallExpression,
    ) -> Result<SubroutineCall, TranslateError> {
        let callees = self.callees;
        let Some(callee) = callees.get(name) else {
            return Err(TranslateError::UndefinedCall {
                name: name.to_string(),
                context: self.context(),
                location: call.location,
            });
        };
        if !call.keyword_arguments.is_empty() {
            return Err(self.unsupported("keyword arguments", call.location));
        }
        if call.arguments.len() > callee.parameters.len() {
            return Err(self.argument_count(
                name,
                callee.parameters.len(),
                call.arguments.len(),
                call.location,
            ));
        }

        let mut arguments = Vec::with_capacity(callee.parameters.len());
        for (index, parameter) in callee.parameters.iter().enumerate() {
            let argument = match (call.arguments.get(index), parameter.mode) {
                (Some(argument), PassingMode::ByValue) => {
                    Argument::ByValue(self.translate_expression(argument)?)
                }
                (Some(argument), PassingMode::ByReference) => Argument::ByReference(
                    self.reference_argument(name, index, parameter.value_type, argument)?,
                ),
                (None, PassingMode::ByValue) => {
                    Argument::ByValue(ir::Expression::Literal(parameter.default.clone()))
                }
                (None, PassingMode::ByReference) => {
                    return Err(self.argument_count(
                        name,
                        callee.parameters.len(),
                        call.arguments.len(),
                        call.location,
                    ));
                }
            };
            arguments.push(argument);
        }
        Ok(SubroutineCall {
            name: name.to_string(),
            arguments,
        })
    }

    /// A by-reference argument must name a variable of exactly the parameter's type.
    fn reference_argument(
        &self,
        callee: &str,
        index: usize,
        expected: ValueType,
        argument: &ast::Expression,
    ) -> Result<String, TranslateError> {
        if let ast::Expression::Subscript(subscript) = argument {
            return Err(self.not_implemented(
                "passing an array element by reference",
                subscript.location,
            ));
        }
        let invalid = || TranslateError::InvalidReferenceArgument {
            callee: callee.to_string(),
            index,
            expected,
            context: self.context(),
            location: argument.location(),
        };
        let Some(identifier) = argument.value_target() else {
            return Err(invalid());
        };
        match self.lookup(identifier)? {
            Symbol::Variable(variable) if variable.value_type == expected => Ok(variable.ir_name),
            _ => Err(invalid()),
        }
    }

    pub(crate) fn lookup(&self, identifier: &Identifier) -> Result<Symbol, TranslateError> {
        self.symbols
            .lookup(&identifier.name)
            .ok_or_else(|| TranslateError::UndefinedName {
                name: identifier.name.clone(),
                context: self.context(),
                location: identifier.location,
            })
    }

    fn read(&self, identifier: &Identifier) -> Result<ir::Expression, TranslateError> {
        Ok(match self.lookup(identifier)? {
            Symbol::Variable(variable) => ir::Expression::Variable(variable.ir_name),
            Symbol::Channel(channel) => ir::Expression::ChannelRead(channel.ir_name),
        })
    }

    fn write(
        &self,
        identifier: &Identifier,
        value: ir::Expression,
    ) -> Result<ir::Statement, TranslateError> {
        Ok(match self.lookup(identifier)? {
            Symbol::Variable(variable) => ir::Statement::Assign {
                target: variable.ir_name,
                value,
            },
            Symbol::Channel(channel) => ir::Statement::ChannelWrite {
                channel: channel.ir_name,
                value,
            },
        })
    }

    /// Static type of a translated expression.
    pub(crate) fn type_of(&self, expression: &ir::Expression) -> ValueType {
        match expression {
            ir::Expression::Literal(value) => value.value_type(),
            ir::Expression::Variable(name) => {
                self.sequence.type_of(name).unwrap_or(ValueType::Double)
            }
            ir::Expression::ChannelRead(_) => ValueType::Double,
            ir::Expression::Element { array, .. } => self
                .sequence
                .type_of(array)
                .map_or(ValueType::Double, |array| array.element_type()),
            ir::Expression::Unary { operator, operand } => match operator {
                UnaryOperator::Not => ValueType::Boolean,
                UnaryOperator::Negate | UnaryOperator::BitNot => {
                    let operand = self.type_of(operand);
                    operand.promote(operand)
                }
            },
            ir::Expression::Binary {
                operator,
                left,
                right,
            } => {
                if operator.is_comparison() || operator.is_logical() {
                    ValueType::Boolean
                } else if *operator == BinaryOperator::Div {
                    ValueType::Double
                } else {
                    self.type_of(left).promote(self.type_of(right))
                }
            }
            ir::Expression::Call(call) => self
                .callees
                .get(&call.name)
                .and_then(|callee| callee.return_type)
                .unwrap_or(ValueType::Double),
            ir::Expression::Primitive(call) => {
                let arguments: Vec<ValueType> =
                    call.arguments.iter().map(|a| self.type_of(a)).collect();
                call.primitive.result_type(&arguments)
            }
        }
    }

    fn coerce(&self, value: &Value, ty: ValueType, location: Location) -> Result<Value, TranslateError> {
        value.coerce(ty).ok_or_else(|| TranslateError::TypeMismatch {
            expected: ty,
            found: value.value_type(),
            context: self.context(),
            location,
        })
    }

    pub(crate) fn expect_arguments(
        &self,
        callee: &str,
        expected: usize,
        call: &ast::CallExpression,
    ) -> Result<(), TranslateError> {
        if !call.keyword_arguments.is_empty() {
            return Err(self.unsupported("keyword arguments", call.location));
        }
        if call.arguments.len() != expected {
            return Err(self.argument_count(callee, expected, call.arguments.len(), call.location));
        }
        Ok(())
    }

    pub(crate) fn unsupported(&self, construct: &str, location: Location) -> TranslateError {
        TranslateError::Unsupported {
            construct: construct.to_string(),
            context: self.context(),
            location,
        }
    }

    fn not_implemented(&self, construct: &str, location: Location) -> TranslateError {
        TranslateError::NotImplemented {
            construct: construct.to_string(),
            context: self.context(),
            location,
        }
    }

    pub(crate) fn invalid_declaration(&self, reason: &str, location: Location) -> TranslateError {
        TranslateError::InvalidDeclaration {
            reason: reason.to_string(),
            context: self.context(),
            location,
        }
    }

    fn argument_count(&self, callee: &str, expected: usize, found: usize, location: Location) -> TranslateError {
        TranslateError::ArgumentCount {
            callee: callee.to_string(),
            expected,
            found,
            context: self.context(),
            location,
        }
    }
}

fn binary_operator(operator: OperatorKind) -> BinaryOperator {
    match operator {
        OperatorKind::Pow => BinaryOperator::Pow,
        OperatorKind::Add => BinaryOperator::Add,
        OperatorKind::Sub => BinaryOperator::Sub,
        OperatorKind::Mul => BinaryOperator::Mul,
        OperatorKind::Div => BinaryOperator::Div,
        OperatorKind::FloorDiv => BinaryOperator::FloorDiv,
        OperatorKind::Mod => BinaryOperator::Mod,
        OperatorKind::And => BinaryOperator::And,
        OperatorKind::Or => BinaryOperator::Or,
        OperatorKind::Eq => BinaryOperator::Eq,
        OperatorKind::Ne => BinaryOperator::Ne,
        OperatorKind::Lt => BinaryOperator::Lt,
        OperatorKind::Le => BinaryOperator::Le,
        OperatorKind::Gt => BinaryOperator::Gt,
        OperatorKind::Ge => BinaryOperator::Ge,
        OperatorKind::BitAnd => BinaryOperator::BitAnd,
        OperatorKind::BitOr => BinaryOperator::BitOr,
        OperatorKind::BitXor => BinaryOperator::BitXor,
        OperatorKind::Shl => BinaryOperator::Shl,
        OperatorKind::Shr => BinaryOperator::Shr,
    }
}

/// Value of a numeric or boolean literal. Strings and `None` have no value.
fn literal_value(literal: &Literal) -> Option<Value> {
    match literal {
        Literal::Bool(literal) => Some(Value::Boolean(literal.value)),
        Literal::Integer(literal) => parse_integer(&literal.value),
        Literal::Float(literal) => literal.value.replace('_', "").parse().ok().map(Value::Double),
        Literal::String(_) | Literal::None(_) => None,
    }
}

/// Folds literals, signs and lists of literals into a constant.
pub(crate) fn constant_value(expression: &ast::Expression) -> Option<Value> {
    match expression {
        ast::Expression::Literal(literal) => literal_value(literal),
        ast::Expression::Unary(unary) => {
            let operand = constant_value(&unary.expression)?;
            match unary.operator {
                UnaryOperatorKind::Pos => Some(operand),
                UnaryOperatorKind::Neg => match operand {
                    Value::Double(value) => Some(Value::Double(-value)),
                    Value::Array { .. } => None,
                    scalar => narrowest_integer(-scalar.as_i128()?),
                },
                UnaryOperatorKind::Not => Some(Value::Boolean(!operand.is_truthy())),
                UnaryOperatorKind::BitNot => match operand {
                    Value::Double(_) | Value::Array { .. } => None,
                    scalar => narrowest_integer(!scalar.as_i128()?),
                },
            }
        }
        ast::Expression::List(list) => {
            let elements = list
                .elements
                .iter()
                .map(constant_value)
                .collect::<Option<Vec<_>>>()?;
            if elements.iter().any(|element| element.value_type().is_array()) {
                return None;
            }
            let element_type = elements
                .iter()
                .map(Value::value_type)
                .reduce(ValueType::promote)
                .unwrap_or(ValueType::Double);
            let elements = elements
                .iter()
                .map(|element| element.coerce(element_type))
                .collect::<Option<Vec<_>>>()?;
            Some(Value::Array {
                element_type,
                elements,
            })
        }
        _ => None,
    }
}

fn parse_integer(text: &str) -> Option<Value> {
    let text = text.replace('_', "").to_ascii_lowercase();
    let value = if let Some(hex) = text.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()?
    } else if let Some(octal) = text.strip_prefix("0o") {
        i128::from_str_radix(octal, 8).ok()?
    } else if let Some(binary) = text.strip_prefix("0b") {
        i128::from_str_radix(binary, 2).ok()?
    } else {
        text.parse().ok()?
    };
    narrowest_integer(value)
}

/// `I32` when the value fits, then `I64`, then `U64`.
fn narrowest_integer(value: i128) -> Option<Value> {
    if let Ok(value) = i32::try_from(value) {
        Some(Value::Int32(value))
    } else if let Ok(value) = i64::try_from(value) {
        Some(Value::Int64(value))
    } else {
        u64::try_from(value).ok().map(Value::UInt64)
    }
}
