use std::rc::Rc;

use super::nodes::{
    AssignStatement, AttributeExpression, AugmentedAssignStatement, BinaryExpression, BoolLiteral,
    CallExpression, Expression, FloatLiteral, ForStatement, FunctionDefinition, Identifier,
    IfStatement, IntegerLiteral, ListExpression, Literal, Location, NoneLiteral, OperatorKind,
    Parameter, PassMode, PassStatement, ReturnStatement, SourceFile, Statement, StringLiteral,
    SubscriptExpression, UnaryExpression, UnaryOperatorKind, UnsupportedNode, WhileStatement,
    WithItem, WithStatement,
};

impl SourceFile {
    #[must_use]
    pub fn new(id: u32, location: Location, source: String) -> Self {
        SourceFile {
            id,
            location,
            source,
            definitions: Vec::new(),
        }
    }

    #[must_use]
    pub fn functions(&self) -> Vec<Rc<FunctionDefinition>> {
        self.definitions
            .iter()
            .map(|definition| match definition {
                super::nodes::Definition::Function(function) => function.clone(),
            })
            .collect()
    }
}

impl FunctionDefinition {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        name: Rc<Identifier>,
        parameters: Vec<Rc<Parameter>>,
        body: Vec<Statement>,
        is_sequence: bool,
    ) -> Self {
        FunctionDefinition {
            id,
            location,
            name,
            parameters,
            body,
            is_sequence,
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Rc<Parameter>> {
        self.parameters.iter().find(|p| p.name.name == name)
    }
}

impl Parameter {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        name: Rc<Identifier>,
        default: Option<Expression>,
        mode: PassMode,
    ) -> Self {
        Parameter {
            id,
            location,
            name,
            default,
            mode,
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.name.name.clone()
    }

    #[must_use]
    pub fn is_by_reference(&self) -> bool {
        self.mode == PassMode::ByReference
    }
}

impl AssignStatement {
    #[must_use]
    pub fn new(id: u32, location: Location, left: Expression, right: Expression) -> Self {
        AssignStatement {
            id,
            location,
            left,
            right,
        }
    }
}

impl AugmentedAssignStatement {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        left: Expression,
        operator: OperatorKind,
        right: Expression,
    ) -> Self {
        AugmentedAssignStatement {
            id,
            location,
            left,
            operator,
            right,
        }
    }
}

impl ReturnStatement {
    #[must_use]
    pub fn new(id: u32, location: Location, expression: Option<Expression>) -> Self {
        ReturnStatement {
            id,
            location,
            expression,
        }
    }
}

impl IfStatement {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        condition: Expression,
        consequence: Vec<Statement>,
        alternative: Option<Vec<Statement>>,
    ) -> Self {
        IfStatement {
            id,
            location,
            condition,
            consequence,
            alternative,
        }
    }
}

impl WhileStatement {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        condition: Expression,
        body: Vec<Statement>,
        has_else: bool,
    ) -> Self {
        WhileStatement {
            id,
            location,
            condition,
            body,
            has_else,
        }
    }
}

impl ForStatement {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        target: Expression,
        iterable: Expression,
        body: Vec<Statement>,
    ) -> Self {
        ForStatement {
            id,
            location,
            target,
            iterable,
            body,
        }
    }
}

impl WithStatement {
    #[must_use]
    pub fn new(id: u32, location: Location, items: Vec<Rc<WithItem>>, body: Vec<Statement>) -> Self {
        WithStatement {
            id,
            location,
            items,
            body,
        }
    }
}

impl WithItem {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        value: Expression,
        alias: Option<Rc<Identifier>>,
    ) -> Self {
        WithItem {
            id,
            location,
            value,
            alias,
        }
    }
}

impl PassStatement {
    #[must_use]
    pub fn new(id: u32, location: Location) -> Self {
        PassStatement { id, location }
    }
}

impl UnsupportedNode {
    #[must_use]
    pub fn new(id: u32, location: Location, kind: String) -> Self {
        UnsupportedNode { id, location, kind }
    }
}

impl Identifier {
    #[must_use]
    pub fn new(id: u32, name: String, location: Location) -> Self {
        Identifier { id, location, name }
    }
}

impl AttributeExpression {
    #[must_use]
    pub fn new(id: u32, location: Location, object: Expression, attribute: Rc<Identifier>) -> Self {
        AttributeExpression {
            id,
            location,
            object,
            attribute,
        }
    }
}

impl SubscriptExpression {
    #[must_use]
    pub fn new(id: u32, location: Location, value: Expression, index: Expression) -> Self {
        SubscriptExpression {
            id,
            location,
            value,
            index,
        }
    }
}

impl CallExpression {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        function: Expression,
        arguments: Vec<Expression>,
        keyword_arguments: Vec<(Rc<Identifier>, Expression)>,
    ) -> Self {
        CallExpression {
            id,
            location,
            function,
            arguments,
            keyword_arguments,
        }
    }

    /// Name of the called function when the callee is a plain identifier.
    #[must_use]
    pub fn callee_name(&self) -> Option<&str> {
        match &self.function {
            Expression::Identifier(identifier) => Some(identifier.name.as_str()),
            _ => None,
        }
    }

    /// Last segment of a dotted callee: `decorators.NivsParam` gives `NivsParam`.
    #[must_use]
    pub fn callee_tail(&self) -> Option<&str> {
        self.function.dotted_tail()
    }
}

impl BinaryExpression {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        left: Expression,
        operator: OperatorKind,
        right: Expression,
    ) -> Self {
        BinaryExpression {
            id,
            location,
            left,
            operator,
            right,
        }
    }
}

impl UnaryExpression {
    #[must_use]
    pub fn new(
        id: u32,
        location: Location,
        operator: UnaryOperatorKind,
        expression: Expression,
    ) -> Self {
        UnaryExpression {
            id,
            location,
            operator,
            expression,
        }
    }
}

impl ListExpression {
    #[must_use]
    pub fn new(id: u32, location: Location, elements: Vec<Expression>) -> Self {
        ListExpression {
            id,
            location,
            elements,
        }
    }
}

impl BoolLiteral {
    #[must_use]
    pub fn new(id: u32, location: Location, value: bool) -> Self {
        BoolLiteral {
            id,
            location,
            value,
        }
    }
}

impl IntegerLiteral {
    #[must_use]
    pub fn new(id: u32, location: Location, value: String) -> Self {
        IntegerLiteral {
            id,
            location,
            value,
        }
    }
}

impl FloatLiteral {
    #[must_use]
    pub fn new(id: u32, location: Location, value: String) -> Self {
        FloatLiteral {
            id,
            location,
            value,
        }
    }
}

impl StringLiteral {
    #[must_use]
    pub fn new(id: u32, location: Location, value: String) -> Self {
        StringLiteral {
            id,
            location,
            value,
        }
    }
}

impl NoneLiteral {
    #[must_use]
    pub fn new(id: u32, location: Location) -> Self {
        NoneLiteral { id, location }
    }
}

impl Expression {
    /// The identifier this expression names, looking through a trailing `.value`.
    ///
    /// Both `a` and `a.value` name the variable `a`.
    #[must_use]
    pub fn value_target(&self) -> Option<&Rc<Identifier>> {
        match self {
            Expression::Identifier(identifier) => Some(identifier),
            Expression::Attribute(attribute) if attribute.attribute.name == "value" => {
                match &attribute.object {
                    Expression::Identifier(identifier) => Some(identifier),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Last segment of an identifier or attribute chain.
    #[must_use]
    pub fn dotted_tail(&self) -> Option<&str> {
        match self {
            Expression::Identifier(identifier) => Some(identifier.name.as_str()),
            Expression::Attribute(attribute) => Some(attribute.attribute.name.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_string_literal(&self) -> bool {
        matches!(self, Expression::Literal(Literal::String(_)))
    }
}

impl Statement {
    /// Docstrings are bare string expression statements.
    #[must_use]
    pub fn is_docstring(&self) -> bool {
        matches!(self, Statement::Expression(expression) if expression.is_string_literal())
    }
}

impl OperatorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::Pow => "**",
            OperatorKind::Add => "+",
            OperatorKind::Sub => "-",
            OperatorKind::Mul => "*",
            OperatorKind::Div => "/",
            OperatorKind::FloorDiv => "//",
            OperatorKind::Mod => "%",
            OperatorKind::And => "and",
            OperatorKind::Or => "or",
            OperatorKind::Eq => "==",
            OperatorKind::Ne => "!=",
            OperatorKind::Lt => "<",
            OperatorKind::Le => "<=",
            OperatorKind::Gt => ">",
            OperatorKind::Ge => ">=",
            OperatorKind::BitAnd => "&",
            OperatorKind::BitOr => "|",
            OperatorKind::BitXor => "^",
            OperatorKind::Shl => "<<",
            OperatorKind::Shr => ">>",
        }
    }

    /// Parses a binary, boolean or comparison operator token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let operator = match token {
            "**" => OperatorKind::Pow,
            "+" => OperatorKind::Add,
            "-" => OperatorKind::Sub,
            "*" => OperatorKind::Mul,
            "/" => OperatorKind::Div,
            "//" => OperatorKind::FloorDiv,
            "%" => OperatorKind::Mod,
            "and" => OperatorKind::And,
            "or" => OperatorKind::Or,
            "==" => OperatorKind::Eq,
            "!=" => OperatorKind::Ne,
            "<" => OperatorKind::Lt,
            "<=" => OperatorKind::Le,
            ">" => OperatorKind::Gt,
            ">=" => OperatorKind::Ge,
            "&" => OperatorKind::BitAnd,
            "|" => OperatorKind::BitOr,
            "^" => OperatorKind::BitXor,
            "<<" => OperatorKind::Shl,
            ">>" => OperatorKind::Shr,
            _ => return None,
        };
        Some(operator)
    }

    /// Parses the operator of an augmented assignment such as `+=`.
    #[must_use]
    pub fn from_augmented_token(token: &str) -> Option<Self> {
        token.strip_suffix('=').and_then(Self::from_token)
    }
}

impl UnaryOperatorKind {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "-" => Some(UnaryOperatorKind::Neg),
            "+" => Some(UnaryOperatorKind::Pos),
            "not" => Some(UnaryOperatorKind::Not),
            "~" => Some(UnaryOperatorKind::BitNot),
            _ => None,
        }
    }
}
