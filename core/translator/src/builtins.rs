use rtseq_ast::nodes::CallExpression;
use rtseq_sequence::{Primitive, ValueType};

/// Names the translator understands without a user definition.
///
/// Builtins shadow user functions of the same name, and calls to them never
/// become call-graph edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Constructor(ValueType),
    ChannelReference,
    Primitive(Primitive),
    Yield,
    GenerateError,
    Fault,
    ClearFault,
    ClearLastError,
    Multitask,
}

impl Builtin {
    #[must_use]
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        if let Some(value_type) = ValueType::from_constructor(name) {
            return Some(Builtin::Constructor(value_type));
        }
        if let Some(primitive) = Primitive::from_name(name) {
            return Some(Builtin::Primitive(primitive));
        }
        let builtin = match name {
            "ChannelReference" => Builtin::ChannelReference,
            "nivs_yield" => Builtin::Yield,
            "generate_error" => Builtin::GenerateError,
            "fault" => Builtin::Fault,
            "clearfault" => Builtin::ClearFault,
            "clearlasterror" => Builtin::ClearLastError,
            "multitask" => Builtin::Multitask,
            _ => return None,
        };
        Some(builtin)
    }

    /// Resolves the callee of `call`, accepting module-qualified names such as
    /// `rtseqapi.I32Value`.
    #[must_use]
    pub(crate) fn of_call(call: &CallExpression) -> Option<Self> {
        call.callee_tail().and_then(Self::lookup)
    }
}
