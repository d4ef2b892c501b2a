//! Channel references.
//!
//! `ch = ChannelReference('Aliases/DesiredRPM')` binds `ch` to an external
//! signal. Reads and writes of `ch` or `ch.value` become channel reads and
//! channel writes; the binding itself is a declaration and emits no statement.

use std::rc::Rc;

use rtseq_ast::nodes::{self as ast, Identifier, Literal};
use rtseq_sequence::{self as ir, ChannelReferenceDeclaration, PrimitiveStatement};
use tracing::debug;

use crate::{
    errors::{DeclarationKind, TranslateError},
    symbol_table::{ChannelSymbol, Symbol},
    translator::FunctionTranslator,
};

impl FunctionTranslator<'_> {
    pub(crate) fn declare_channel(
        &mut self,
        target: &Rc<Identifier>,
        call: &ast::CallExpression,
    ) -> Result<(), TranslateError> {
        let alias = match (call.arguments.as_slice(), call.keyword_arguments.is_empty()) {
            ([ast::Expression::Literal(Literal::String(alias))], true) => alias.value.clone(),
            _ => {
                return Err(self.invalid_declaration(
                    "`ChannelReference` takes exactly one string literal alias",
                    call.location,
                ));
            }
        };
        let name = target.name.as_str();
        if self.symbols.is_declared_locally(name) {
            return Err(TranslateError::Redefinition {
                kind: DeclarationKind::ChannelReference,
                name: name.to_string(),
                context: self.context(),
                location: target.location,
            });
        }
        let ir_name = self.symbols.reserve_ir_name(name);
        let symbol = Symbol::Channel(ChannelSymbol {
            ir_name: ir_name.clone(),
        });
        self.declare_symbol(name, symbol, DeclarationKind::ChannelReference, target.location)?;
        debug!(name, alias = %alias, "channel reference declared");
        self.sequence.channels.push(ChannelReferenceDeclaration {
            name: ir_name,
            alias,
        });
        Ok(())
    }

    /// `return ch` and `return ch.value` must copy into a variable first.
    pub(crate) fn reject_channel_return(
        &self,
        expression: &ast::Expression,
    ) -> Result<(), TranslateError> {
        let Some(identifier) = expression.value_target() else {
            return Ok(());
        };
        if let Some(Symbol::Channel(_)) = self.symbols.lookup(&identifier.name) {
            return Err(TranslateError::ChannelReturn {
                name: identifier.name.clone(),
                context: self.context(),
                location: expression.location(),
            });
        }
        Ok(())
    }

    /// `fault(channel, value)`
    pub(crate) fn translate_fault(
        &mut self,
        call: &ast::CallExpression,
    ) -> Result<ir::Statement, TranslateError> {
        self.expect_arguments("fault", 2, call)?;
        let [channel, value] = call.arguments.as_slice() else {
            return Err(self.unsupported("`fault` without a channel and a value", call.location));
        };
        let channel = self.channel_argument("fault", channel)?;
        let value = self.translate_expression(value)?;
        Ok(ir::Statement::Primitive(PrimitiveStatement::Fault {
            channel,
            value,
        }))
    }

    /// `clearfault(channel)`
    pub(crate) fn translate_clear_fault(
        &mut self,
        call: &ast::CallExpression,
    ) -> Result<ir::Statement, TranslateError> {
        self.expect_arguments("clearfault", 1, call)?;
        let [channel] = call.arguments.as_slice() else {
            return Err(self.unsupported("`clearfault` without a channel", call.location));
        };
        let channel = self.channel_argument("clearfault", channel)?;
        Ok(ir::Statement::Primitive(PrimitiveStatement::ClearFault {
            channel,
        }))
    }

    fn channel_argument(
        &self,
        callee: &str,
        argument: &ast::Expression,
    ) -> Result<String, TranslateError> {
        let not_a_channel = || {
            self.unsupported(
                &format!("`{callee}` on something other than a channel reference"),
                argument.location(),
            )
        };
        let Some(identifier) = argument.value_target() else {
            return Err(not_a_channel());
        };
        match self.lookup(identifier)? {
            Symbol::Channel(channel) => Ok(channel.ir_name),
            Symbol::Variable(_) => Err(not_a_channel()),
        }
    }
}
