use core::fmt;
use std::{
    fmt::{Display, Formatter},
    rc::Rc,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Location {
    pub offset_start: u32,
    pub offset_end: u32,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    #[must_use]
    pub fn new(
        offset_start: u32,
        offset_end: u32,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            offset_start,
            offset_end,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_column)
    }
}

#[macro_export]
macro_rules! ast_node {
    (
        $(#[$outer:meta])*
        $struct_vis:vis struct $name:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field_name:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, PartialEq, Eq, Debug)]
        $struct_vis struct $name {
            pub id: u32,
            pub location: $crate::nodes::Location,
            $(
                $(#[$field_attr])*
                $field_vis $field_name : $field_ty,
            )*
        }
    };
}

macro_rules! ast_nodes {
    (
        $(
            $(#[$outer:meta])*
            $struct_vis:vis struct $name:ident { $($fields:tt)* }
        )+
    ) => {
        $(
            ast_node! {
                $(#[$outer])*
                $struct_vis struct $name { $($fields)* }
            }
        )+
    };
}

macro_rules! ast_enum {
    (
        $(#[$outer:meta])*
        $enum_vis:vis enum $name:ident {
            $(
                $(#[$arm_attr:meta])*
                $(@$conv:ident)? $arm:ident $( ( $($tuple:tt)* ) )? ,
            )*
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, PartialEq, Eq, Debug)]
        $enum_vis enum $name {
            $(
                $(#[$arm_attr])*
                $arm $( ( $($tuple)* ) )? ,
            )*
        }

        impl $name {
            #[must_use]
            pub fn id(&self) -> u32 {
                match self {
                    $(
                        $name::$arm(n, ..) => { ast_enum!(@id_arm n, $($conv)?) }
                    )*
                }
            }

            #[must_use]
            pub fn location(&self) -> Location {
                match self {
                    $(
                        $name::$arm(n, ..) => { ast_enum!(@location_arm n, $($conv)?) }
                    )*
                }
            }
        }
    };

    (@id_arm $inner:ident, inner_enum) => {
        $inner.id()
    };

    (@id_arm $inner:ident, ) => {
        $inner.id
    };

    (@location_arm $inner:ident, inner_enum) => {
        $inner.location()
    };

    (@location_arm $inner:ident, ) => {
        $inner.location
    };
}

macro_rules! ast_enums {
    (
        $(
            $(#[$outer:meta])*
            $enum_vis:vis enum $name:ident { $($arms:tt)* }
        )+
    ) => {
        $(
            ast_enum! {
                $(#[$outer])*
                $enum_vis enum $name { $($arms)* }
            }
        )+

        #[derive(Clone, Debug)]
        pub enum AstNode {
            $(
                $name($name),
            )+
        }

        impl AstNode {
            #[must_use]
            pub fn id(&self) -> u32 {
                match self {
                    $(
                        AstNode::$name(node) => node.id(),
                    )+
                }
            }

            #[must_use]
            pub fn location(&self) -> Location {
                match self {
                    $(
                        AstNode::$name(node) => node.location(),
                    )+
                }
            }
        }
    };
}

ast_enums! {

    pub enum Ast {
        SourceFile(Rc<SourceFile>),
    }

    pub enum Definition {
        Function(Rc<FunctionDefinition>),
    }

    pub enum Statement {
        Assign(Rc<AssignStatement>),
        AugmentedAssign(Rc<AugmentedAssignStatement>),
        @inner_enum Expression(Expression),
        Return(Rc<ReturnStatement>),
        If(Rc<IfStatement>),
        While(Rc<WhileStatement>),
        For(Rc<ForStatement>),
        With(Rc<WithStatement>),
        FunctionDefinition(Rc<FunctionDefinition>),
        Pass(Rc<PassStatement>),
        Unsupported(Rc<UnsupportedNode>),
    }

    pub enum Expression {
        Identifier(Rc<Identifier>),
        Attribute(Rc<AttributeExpression>),
        Subscript(Rc<SubscriptExpression>),
        Call(Rc<CallExpression>),
        Binary(Rc<BinaryExpression>),
        Unary(Rc<UnaryExpression>),
        @inner_enum Literal(Literal),
        List(Rc<ListExpression>),
        Unsupported(Rc<UnsupportedNode>),
    }

    pub enum Literal {
        Bool(Rc<BoolLiteral>),
        Integer(Rc<IntegerLiteral>),
        Float(Rc<FloatLiteral>),
        String(Rc<StringLiteral>),
        None(Rc<NoneLiteral>),
    }
}

/// How an argument reaches a parameter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum PassMode {
    #[default]
    ByValue,
    ByReference,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOperatorKind {
    Neg,
    Pos,
    Not,
    BitNot,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperatorKind {
    Pow,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

ast_nodes! {

    pub struct SourceFile {
        pub source: String,
        pub definitions: Vec<Definition>,
    }

    /// A function together with the explicit metadata its decorators carried.
    ///
    /// `is_sequence` marks the function as translatable. Each parameter records
    /// its own passing mode and default, so the translator never inspects
    /// decorator syntax.
    pub struct FunctionDefinition {
        pub name: Rc<Identifier>,
        pub parameters: Vec<Rc<Parameter>>,
        pub body: Vec<Statement>,
        pub is_sequence: bool,
    }

    pub struct Parameter {
        pub name: Rc<Identifier>,
        pub default: Option<Expression>,
        pub mode: PassMode,
    }

    pub struct AssignStatement {
        pub left: Expression,
        pub right: Expression,
    }

    pub struct AugmentedAssignStatement {
        pub left: Expression,
        pub operator: OperatorKind,
        pub right: Expression,
    }

    pub struct ReturnStatement {
        pub expression: Option<Expression>,
    }

    /// `elif` chains are folded into a nested `IfStatement` inside `alternative`.
    pub struct IfStatement {
        pub condition: Expression,
        pub consequence: Vec<Statement>,
        pub alternative: Option<Vec<Statement>>,
    }

    pub struct WhileStatement {
        pub condition: Expression,
        pub body: Vec<Statement>,
        pub has_else: bool,
    }

    pub struct ForStatement {
        pub target: Expression,
        pub iterable: Expression,
        pub body: Vec<Statement>,
    }

    pub struct WithStatement {
        pub items: Vec<Rc<WithItem>>,
        pub body: Vec<Statement>,
    }

    pub struct WithItem {
        pub value: Expression,
        pub alias: Option<Rc<Identifier>>,
    }

    pub struct PassStatement {}

    /// A construct the front end recognizes but the language subset rejects.
    pub struct UnsupportedNode {
        pub kind: String,
    }

    pub struct Identifier {
        pub name: String,
    }

    pub struct AttributeExpression {
        pub object: Expression,
        pub attribute: Rc<Identifier>,
    }

    pub struct SubscriptExpression {
        pub value: Expression,
        pub index: Expression,
    }

    pub struct CallExpression {
        pub function: Expression,
        pub arguments: Vec<Expression>,
        pub keyword_arguments: Vec<(Rc<Identifier>, Expression)>,
    }

    pub struct BinaryExpression {
        pub left: Expression,
        pub operator: OperatorKind,
        pub right: Expression,
    }

    pub struct UnaryExpression {
        pub operator: UnaryOperatorKind,
        pub expression: Expression,
    }

    pub struct ListExpression {
        pub elements: Vec<Expression>,
    }

    pub struct BoolLiteral {
        pub value: bool,
    }

    pub struct IntegerLiteral {
        pub value: String,
    }

    pub struct FloatLiteral {
        pub value: String,
    }

    pub struct StringLiteral {
        pub value: String,
    }

    pub struct NoneLiteral {}
}
