//! AST builder that converts tree-sitter-python concrete syntax trees (CST) into
//! the source syntax tree the translator consumes.
//!
//! The `Builder` walks each parsed module and constructs typed nodes. It handles:
//!
//! - Converting CST nodes to typed AST nodes
//! - Assigning sequential IDs to each node
//! - Recording top-level definitions in the arena
//! - Collecting parse errors from malformed syntax
//! - Turning `nivs_rt_sequence` and `NivsParam` decorators into explicit
//!   metadata on [`FunctionDefinition`] and [`Parameter`]
//!
//! # Example
//!
//! ```no_run
//! use rtseq_ast::builder::Builder;
//! use tree_sitter::Parser;
//!
//! let source = "@nivs_rt_sequence\ndef answer():\n    return 5\n";
//! let mut parser = Parser::new();
//! parser.set_language(&tree_sitter_python::LANGUAGE.into()).unwrap();
//! let tree = parser.parse(source, None).unwrap();
//!
//! let mut builder = Builder::new();
//! builder.add_source_code(tree.root_node(), source.as_bytes());
//! let arena = builder.build_ast().unwrap();
//! ```
//!
//! # Error Handling
//!
//! ERROR and MISSING nodes anywhere in the tree are collected as
//! [`AstError::Syntax`]. Constructs the language subset does not support are
//! *not* errors here: they become `Unsupported` nodes and the translator
//! rejects them with a precise location, since a function that is never
//! translated may legally use them.
//!
//! # Node ID Assignment
//!
//! IDs start at 1 and are counted per builder, so two builders never share
//! state and the same input always yields the same IDs.

use std::rc::Rc;

use crate::{
    arena::Arena,
    errors::AstError,
    nodes::{
        AssignStatement, AttributeExpression, AugmentedAssignStatement, BinaryExpression,
        BoolLiteral, CallExpression, Definition, Expression, FloatLiteral, ForStatement,
        FunctionDefinition, Identifier, IfStatement, IntegerLiteral, ListExpression, Literal,
        Location, NoneLiteral, OperatorKind, Parameter, PassMode, PassStatement, ReturnStatement,
        SourceFile, Statement, StringLiteral, SubscriptExpression, UnaryExpression,
        UnaryOperatorKind, UnsupportedNode, WhileStatement, WithItem, WithStatement,
    },
    nodes::{Ast, AstNode},
};
use tree_sitter::Node;

const SEQUENCE_DECORATOR: &str = "nivs_rt_sequence";
const PARAMETER_DECORATOR: &str = "NivsParam";

/// A `NivsParam('name', default, mode)` decorator, before it is matched to a parameter.
struct ParameterDeclaration {
    name: String,
    default: Expression,
    mode: PassMode,
    location: Location,
}

pub struct Builder<'a> {
    arena: Arena,
    source_code: Vec<(Node<'a>, &'a [u8])>,
    errors: Vec<AstError>,
    next_id: u32,
}

impl Default for Builder<'_> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<'a> Builder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: Arena::default(),
            source_code: Vec::new(),
            errors: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds a source code and CST to the builder.
    ///
    /// # Panics
    ///
    /// This function will panic if the `root` node is not of type `module`.
    pub fn add_source_code(&mut self, root: Node<'a>, code: &'a [u8]) {
        assert!(
            root.kind() == "module",
            "Expected a root node of type `module`"
        );
        self.source_code.push((root, code));
    }

    /// Builds the AST from every added module.
    ///
    /// # Errors
    ///
    /// Returns an error listing every syntax problem found if any module is malformed.
    pub fn build_ast(&'_ mut self) -> anyhow::Result<Arena> {
        for (root, code) in &self.source_code.clone() {
            self.collect_errors(root, code);
            let id = self.next_node_id();
            let location = Self::get_location(root);
            let source = String::from_utf8_lossy(code).into_owned();
            let mut ast = SourceFile::new(id, location, source);

            let mut cursor = root.walk();
            for child in root.named_children(&mut cursor) {
                match child.kind() {
                    "function_definition" => {
                        let function = self.build_function_definition(&child, code, &[]);
                        ast.definitions
                            .push(self.register_definition(id, function));
                    }
                    "decorated_definition" => {
                        if let Some(function) = self.build_decorated_definition(&child, code) {
                            ast.definitions
                                .push(self.register_definition(id, function));
                        }
                    }
                    // Imports, module constants and classes are host-only.
                    _ => {}
                }
            }
            self.arena
                .add_node(AstNode::Ast(Ast::SourceFile(Rc::new(ast))), u32::MAX);
        }
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
            return Err(anyhow::anyhow!(
                "AST building failed due to errors:\n{}",
                messages.join("\n")
            ));
        }
        Ok(self.arena.clone())
    }

    /// Errors collected by the last `build_ast` call.
    #[must_use]
    pub fn errors(&self) -> &[AstError] {
        &self.errors
    }

    fn register_definition(&mut self, parent_id: u32, function: Rc<FunctionDefinition>) -> Definition {
        let definition = Definition::Function(function);
        self.arena
            .add_node(AstNode::Definition(definition.clone()), parent_id);
        definition
    }

    fn build_decorated_definition(
        &mut self,
        node: &Node,
        code: &[u8],
    ) -> Option<Rc<FunctionDefinition>> {
        let definition = node.child_by_field_name("definition")?;
        if definition.kind() != "function_definition" {
            return None;
        }
        let mut cursor = node.walk();
        let decorators: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .collect();
        Some(self.build_function_definition(&definition, code, &decorators))
    }

    fn build_function_definition(
        &mut self,
        node: &Node,
        code: &[u8],
        decorators: &[Node],
    ) -> Rc<FunctionDefinition> {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let name = match node.child_by_field_name("name") {
            Some(name_node) => self.build_identifier(&name_node, code),
            None => {
                self.errors.push(AstError::Malformed {
                    construct: "function definition",
                    location,
                });
                Rc::new(Identifier::new(
                    self.next_node_id(),
                    "<error>".to_string(),
                    location,
                ))
            }
        };

        let mut is_sequence = false;
        let mut declarations = Vec::new();
        for decorator in decorators {
            let Some(expression_node) = Self::first_named_child(decorator) else {
                continue;
            };
            let expression = self.build_expression(&expression_node, code);
            if Self::is_sequence_decorator(&expression) {
                is_sequence = true;
            } else if let Some(declaration) =
                self.build_parameter_declaration(&name.name, &expression)
            {
                declarations.push(declaration);
            }
        }

        let mut parameters = match node.child_by_field_name("parameters") {
            Some(parameters_node) => self.build_parameters(&name.name, &parameters_node, code),
            None => Vec::new(),
        };
        for declaration in declarations {
            match parameters.iter_mut().find(|p| p.name.name == declaration.name) {
                Some(parameter) => {
                    parameter.default = Some(declaration.default);
                    parameter.mode = declaration.mode;
                }
                None => self.errors.push(AstError::ParameterDeclaration {
                    function: name.name.clone(),
                    reason: format!("no parameter named `{}`", declaration.name),
                    location: declaration.location,
                }),
            }
        }

        let body = match node.child_by_field_name("body") {
            Some(body_node) => self.build_block(&body_node, code),
            None => {
                self.errors.push(AstError::Malformed {
                    construct: "function body",
                    location,
                });
                Vec::new()
            }
        };

        Rc::new(FunctionDefinition::new(
            id,
            location,
            name,
            parameters.into_iter().map(Rc::new).collect(),
            body,
            is_sequence,
        ))
    }

    fn is_sequence_decorator(expression: &Expression) -> bool {
        match expression {
            Expression::Call(call) => call.callee_tail() == Some(SEQUENCE_DECORATOR),
            other => other.dotted_tail() == Some(SEQUENCE_DECORATOR),
        }
    }

    fn build_parameter_declaration(
        &mut self,
        function: &str,
        expression: &Expression,
    ) -> Option<ParameterDeclaration> {
        let Expression::Call(call) = expression else {
            return None;
        };
        if call.callee_tail() != Some(PARAMETER_DECORATOR) {
            return None;
        }
        let mut invalid = |reason: &str| {
            self.errors.push(AstError::ParameterDeclaration {
                function: function.to_string(),
                reason: reason.to_string(),
                location: call.location,
            });
            None
        };
        let (name, default, mode) = match call.arguments.as_slice() {
            [name, default] => (name, default, None),
            [name, default, mode] => (name, default, Some(mode)),
            _ => return invalid("expected a name, a default value and an optional mode"),
        };
        let Expression::Literal(Literal::String(name)) = name else {
            return invalid("the parameter name must be a string literal");
        };
        let mode = match mode.and_then(Expression::dotted_tail) {
            None if mode.is_none() => PassMode::ByValue,
            Some("BY_VALUE") => PassMode::ByValue,
            Some("BY_REF") => PassMode::ByReference,
            _ => return invalid("the mode must be `NivsParam.BY_REF` or `NivsParam.BY_VALUE`"),
        };
        Some(ParameterDeclaration {
            name: name.value.clone(),
            default: default.clone(),
            mode,
            location: call.location,
        })
    }

    fn build_parameters(&mut self, function: &str, node: &Node, code: &[u8]) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let location = Self::get_location(&child);
            let (name_node, default_node) = match child.kind() {
                "identifier" => (Some(child), None),
                "typed_parameter" => (Self::first_named_child(&child), None),
                "default_parameter" | "typed_default_parameter" => (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("value"),
                ),
                "comment" => continue,
                other => {
                    self.errors.push(AstError::ParameterDeclaration {
                        function: function.to_string(),
                        reason: format!("unsupported parameter form `{other}`"),
                        location,
                    });
                    continue;
                }
            };
            let Some(name_node) = name_node else {
                self.errors.push(AstError::Malformed {
                    construct: "parameter",
                    location,
                });
                continue;
            };
            let name = self.build_identifier(&name_node, code);
            let default = default_node.map(|value| self.build_expression(&value, code));
            parameters.push(Parameter::new(
                self.next_node_id(),
                location,
                name,
                default,
                PassMode::ByValue,
            ));
        }
        parameters
    }

    fn build_block(&mut self, node: &Node, code: &[u8]) -> Vec<Statement> {
        let mut statements = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            statements.push(self.build_statement(&child, code));
        }
        statements
    }

    fn build_statement(&mut self, node: &Node, code: &[u8]) -> Statement {
        match node.kind() {
            "expression_statement" => self.build_expression_statement(node, code),
            "return_statement" => {
                Statement::Return(self.build_return_statement(node, code))
            }
            "if_statement" => Statement::If(self.build_if_statement(node, code)),
            "while_statement" => Statement::While(self.build_while_statement(node, code)),
            "for_statement" => Statement::For(self.build_for_statement(node, code)),
            "with_statement" => Statement::With(self.build_with_statement(node, code)),
            "function_definition" => {
                Statement::FunctionDefinition(self.build_function_definition(node, code, &[]))
            }
            "decorated_definition" => match self.build_decorated_definition(node, code) {
                Some(function) => Statement::FunctionDefinition(function),
                None => self.build_unsupported_statement(node, "decorated class"),
            },
            "pass_statement" => Statement::Pass(Rc::new(PassStatement::new(
                self.next_node_id(),
                Self::get_location(node),
            ))),
            "ERROR" => {
                let location = Self::get_location(node);
                self.errors.push(AstError::Malformed {
                    construct: "statement",
                    location,
                });
                self.build_unsupported_statement(node, "<error>")
            }
            other => {
                let kind = other.trim_end_matches("_statement").replace('_', " ");
                self.build_unsupported_statement(node, &kind)
            }
        }
    }

    fn build_unsupported_statement(&mut self, node: &Node, kind: &str) -> Statement {
        Statement::Unsupported(self.build_unsupported(node, kind))
    }

    fn build_unsupported(&mut self, node: &Node, kind: &str) -> Rc<UnsupportedNode> {
        Rc::new(UnsupportedNode::new(
            self.next_node_id(),
            Self::get_location(node),
            kind.to_string(),
        ))
    }

    fn build_expression_statement(&mut self, node: &Node, code: &[u8]) -> Statement {
        let mut cursor = node.walk();
        let children: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect();
        let [child] = children.as_slice() else {
            return self.build_unsupported_statement(node, "expression list");
        };
        match child.kind() {
            "assignment" => self.build_assignment(child, code),
            "augmented_assignment" => self.build_augmented_assignment(child, code),
            _ => Statement::Expression(self.build_expression(child, code)),
        }
    }

    fn build_assignment(&mut self, node: &Node, code: &[u8]) -> Statement {
        if node.child_by_field_name("type").is_some() {
            return self.build_unsupported_statement(node, "annotated assignment");
        }
        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return self.build_unsupported_statement(node, "assignment");
        };
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let left = self.build_expression(&left, code);
        let right = self.build_expression(&right, code);
        Statement::Assign(Rc::new(AssignStatement::new(id, location, left, right)))
    }

    fn build_augmented_assignment(&mut self, node: &Node, code: &[u8]) -> Statement {
        let (Some(left), Some(operator), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) else {
            return self.build_unsupported_statement(node, "augmented assignment");
        };
        let Some(operator) = OperatorKind::from_augmented_token(operator.kind()) else {
            return self.build_unsupported_statement(node, "augmented assignment operator");
        };
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let left = self.build_expression(&left, code);
        let right = self.build_expression(&right, code);
        Statement::AugmentedAssign(Rc::new(AugmentedAssignStatement::new(
            id, location, left, operator, right,
        )))
    }

    fn build_return_statement(&mut self, node: &Node, code: &[u8]) -> Rc<ReturnStatement> {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let expression = Self::first_named_child(node).map(|child| self.build_expression(&child, code));
        Rc::new(ReturnStatement::new(id, location, expression))
    }

    fn build_if_statement(&mut self, node: &Node, code: &[u8]) -> Rc<IfStatement> {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let condition = self.build_required_expression(node, "condition", "if condition", code);
        let consequence = node
            .child_by_field_name("consequence")
            .map(|block| self.build_block(&block, code))
            .unwrap_or_default();
        let mut cursor = node.walk();
        let clauses: Vec<Node> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();
        let alternative = self.build_alternatives(&clauses, code);
        Rc::new(IfStatement::new(
            id,
            location,
            condition,
            consequence,
            alternative,
        ))
    }

    /// Folds `elif`/`else` clauses into nested statement lists.
    fn build_alternatives(&mut self, clauses: &[Node], code: &[u8]) -> Option<Vec<Statement>> {
        let (first, rest) = clauses.split_first()?;
        match first.kind() {
            "else_clause" => Some(
                first
                    .child_by_field_name("body")
                    .map(|block| self.build_block(&block, code))
                    .unwrap_or_default(),
            ),
            "elif_clause" => {
                let id = self.next_node_id();
                let location = Self::get_location(first);
                let condition =
                    self.build_required_expression(first, "condition", "elif condition", code);
                let consequence = first
                    .child_by_field_name("consequence")
                    .map(|block| self.build_block(&block, code))
                    .unwrap_or_default();
                let alternative = self.build_alternatives(rest, code);
                Some(vec![Statement::If(Rc::new(IfStatement::new(
                    id,
                    location,
                    condition,
                    consequence,
                    alternative,
                )))])
            }
            _ => None,
        }
    }

    fn build_while_statement(&mut self, node: &Node, code: &[u8]) -> Rc<WhileStatement> {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let condition = self.build_required_expression(node, "condition", "while condition", code);
        let body = node
            .child_by_field_name("body")
            .map(|block| self.build_block(&block, code))
            .unwrap_or_default();
        let has_else = node.child_by_field_name("alternative").is_some();
        Rc::new(WhileStatement::new(id, location, condition, body, has_else))
    }

    fn build_for_statement(&mut self, node: &Node, code: &[u8]) -> Rc<ForStatement> {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let target = self.build_required_expression(node, "left", "for target", code);
        let iterable = self.build_required_expression(node, "right", "for iterable", code);
        let body = node
            .child_by_field_name("body")
            .map(|block| self.build_block(&block, code))
            .unwrap_or_default();
        Rc::new(ForStatement::new(id, location, target, iterable, body))
    }

    fn build_with_statement(&mut self, node: &Node, code: &[u8]) -> Rc<WithStatement> {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let mut items = Vec::new();
        let mut cursor = node.walk();
        let clauses: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "with_clause")
            .collect();
        for clause in clauses {
            let mut clause_cursor = clause.walk();
            let with_items: Vec<Node> = clause
                .named_children(&mut clause_cursor)
                .filter(|child| child.kind() == "with_item")
                .collect();
            for item in with_items {
                items.push(self.build_with_item(&item, code));
            }
        }
        let body = node
            .child_by_field_name("body")
            .map(|block| self.build_block(&block, code))
            .unwrap_or_default();
        Rc::new(WithStatement::new(id, location, items, body))
    }

    fn build_with_item(&mut self, node: &Node, code: &[u8]) -> Rc<WithItem> {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let Some(value_node) = node.child_by_field_name("value") else {
            self.errors.push(AstError::Malformed {
                construct: "with item",
                location,
            });
            let value = Expression::Unsupported(self.build_unsupported(node, "<error>"));
            return Rc::new(WithItem::new(id, location, value, None));
        };
        let (value_node, alias_node) = if value_node.kind() == "as_pattern" {
            (
                Self::first_named_child(&value_node).unwrap_or(value_node),
                value_node.child_by_field_name("alias"),
            )
        } else {
            (value_node, node.child_by_field_name("alias"))
        };
        let value = self.build_expression(&value_node, code);
        let alias = alias_node.and_then(|alias| {
            let target = if alias.kind() == "identifier" {
                Some(alias)
            } else {
                Self::first_named_child(&alias).filter(|child| child.kind() == "identifier")
            };
            target.map(|identifier| self.build_identifier(&identifier, code))
        });
        Rc::new(WithItem::new(id, location, value, alias))
    }

    fn build_required_expression(
        &mut self,
        node: &Node,
        field: &str,
        construct: &'static str,
        code: &[u8],
    ) -> Expression {
        if let Some(child) = node.child_by_field_name(field) {
            self.build_expression(&child, code)
        } else {
            let location = Self::get_location(node);
            self.errors.push(AstError::Malformed {
                construct,
                location,
            });
            Expression::Unsupported(self.build_unsupported(node, "<error>"))
        }
    }

    fn build_expression(&mut self, node: &Node, code: &[u8]) -> Expression {
        match node.kind() {
            "identifier" => Expression::Identifier(self.build_identifier(node, code)),
            "attribute" => self.build_attribute_expression(node, code),
            "subscript" => self.build_subscript_expression(node, code),
            "call" => self.build_call_expression(node, code),
            "binary_operator" | "boolean_operator" => self.build_binary_expression(node, code),
            "comparison_operator" => self.build_comparison_expression(node, code),
            "not_operator" => {
                let id = self.next_node_id();
                let location = Self::get_location(node);
                let argument =
                    self.build_required_expression(node, "argument", "not operand", code);
                Expression::Unary(Rc::new(UnaryExpression::new(
                    id,
                    location,
                    UnaryOperatorKind::Not,
                    argument,
                )))
            }
            "unary_operator" => self.build_unary_expression(node, code),
            "parenthesized_expression" => match Self::first_named_child(node) {
                Some(inner) => self.build_expression(&inner, code),
                None => Expression::Unsupported(self.build_unsupported(node, "empty parentheses")),
            },
            "integer" => {
                let id = self.next_node_id();
                let location = Self::get_location(node);
                let value = Self::node_text(node, code).replace('_', "");
                Expression::Literal(Literal::Integer(Rc::new(IntegerLiteral::new(
                    id, location, value,
                ))))
            }
            "float" => {
                let id = self.next_node_id();
                let location = Self::get_location(node);
                let value = Self::node_text(node, code).replace('_', "");
                Expression::Literal(Literal::Float(Rc::new(FloatLiteral::new(
                    id, location, value,
                ))))
            }
            "true" | "false" => {
                let id = self.next_node_id();
                let location = Self::get_location(node);
                Expression::Literal(Literal::Bool(Rc::new(BoolLiteral::new(
                    id,
                    location,
                    node.kind() == "true",
                ))))
            }
            "none" => {
                let id = self.next_node_id();
                let location = Self::get_location(node);
                Expression::Literal(Literal::None(Rc::new(NoneLiteral::new(id, location))))
            }
            "string" => self.build_string_literal(node, code),
            "list" => {
                let id = self.next_node_id();
                let location = Self::get_location(node);
                let mut cursor = node.walk();
                let children: Vec<Node> = node
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() != "comment")
                    .collect();
                let elements = children
                    .iter()
                    .map(|child| self.build_expression(child, code))
                    .collect();
                Expression::List(Rc::new(ListExpression::new(id, location, elements)))
            }
            "ERROR" => {
                let location = Self::get_location(node);
                self.errors.push(AstError::Malformed {
                    construct: "expression",
                    location,
                });
                Expression::Unsupported(self.build_unsupported(node, "<error>"))
            }
            other => {
                let kind = other.replace('_', " ");
                Expression::Unsupported(self.build_unsupported(node, &kind))
            }
        }
    }

    fn build_attribute_expression(&mut self, node: &Node, code: &[u8]) -> Expression {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let object = self.build_required_expression(node, "object", "attribute object", code);
        let Some(attribute) = node.child_by_field_name("attribute") else {
            return Expression::Unsupported(self.build_unsupported(node, "attribute"));
        };
        let attribute = self.build_identifier(&attribute, code);
        Expression::Attribute(Rc::new(AttributeExpression::new(
            id, location, object, attribute,
        )))
    }

    fn build_subscript_expression(&mut self, node: &Node, code: &[u8]) -> Expression {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let value = self.build_required_expression(node, "value", "subscript target", code);
        let mut cursor = node.walk();
        let indices: Vec<Node> = node
            .children_by_field_name("subscript", &mut cursor)
            .collect();
        let [index] = indices.as_slice() else {
            return Expression::Unsupported(self.build_unsupported(node, "multi-index subscript"));
        };
        if index.kind() == "slice" {
            return Expression::Unsupported(self.build_unsupported(node, "slice"));
        }
        let index = self.build_expression(index, code);
        Expression::Subscript(Rc::new(SubscriptExpression::new(
            id, location, value, index,
        )))
    }

    fn build_call_expression(&mut self, node: &Node, code: &[u8]) -> Expression {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let function = self.build_required_expression(node, "function", "call target", code);
        let mut arguments = Vec::new();
        let mut keyword_arguments = Vec::new();
        if let Some(argument_list) = node.child_by_field_name("arguments") {
            if argument_list.kind() != "argument_list" {
                return Expression::Unsupported(
                    self.build_unsupported(&argument_list, "generator argument"),
                );
            }
            let mut cursor = argument_list.walk();
            let children: Vec<Node> = argument_list
                .named_children(&mut cursor)
                .filter(|child| child.kind() != "comment")
                .collect();
            for child in children {
                if child.kind() == "keyword_argument" {
                    let (Some(name), Some(value)) = (
                        child.child_by_field_name("name"),
                        child.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    let name = self.build_identifier(&name, code);
                    let value = self.build_expression(&value, code);
                    keyword_arguments.push((name, value));
                } else {
                    arguments.push(self.build_expression(&child, code));
                }
            }
        }
        Expression::Call(Rc::new(CallExpression::new(
            id,
            location,
            function,
            arguments,
            keyword_arguments,
        )))
    }

    fn build_binary_expression(&mut self, node: &Node, code: &[u8]) -> Expression {
        let Some(operator) = node
            .child_by_field_name("operator")
            .and_then(|operator| OperatorKind::from_token(operator.kind()))
        else {
            return Expression::Unsupported(self.build_unsupported(node, "operator"));
        };
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let left = self.build_required_expression(node, "left", "left operand", code);
        let right = self.build_required_expression(node, "right", "right operand", code);
        Expression::Binary(Rc::new(BinaryExpression::new(
            id, location, left, operator, right,
        )))
    }

    /// `a < b < c` becomes `(a < b) and (b < c)`.
    fn build_comparison_expression(&mut self, node: &Node, code: &[u8]) -> Expression {
        let mut cursor = node.walk();
        let mut operands = Vec::new();
        let mut operators = Vec::new();
        for child in node.children(&mut cursor) {
            if child.kind() == "comment" {
                continue;
            }
            if child.is_named() {
                operands.push(child);
            } else {
                operators.push(OperatorKind::from_token(child.kind()));
            }
        }
        if operands.len() < 2 || operators.len() + 1 != operands.len() {
            return Expression::Unsupported(self.build_unsupported(node, "comparison"));
        }
        let Some(operators) = operators.into_iter().collect::<Option<Vec<_>>>() else {
            return Expression::Unsupported(self.build_unsupported(node, "comparison operator"));
        };
        let location = Self::get_location(node);
        let operands: Vec<Expression> = operands
            .iter()
            .map(|operand| self.build_expression(operand, code))
            .collect();
        let mut result: Option<Expression> = None;
        for (index, operator) in operators.into_iter().enumerate() {
            let comparison = Expression::Binary(Rc::new(BinaryExpression::new(
                self.next_node_id(),
                location,
                operands[index].clone(),
                operator,
                operands[index + 1].clone(),
            )));
            result = Some(match result {
                None => comparison,
                Some(previous) => Expression::Binary(Rc::new(BinaryExpression::new(
                    self.next_node_id(),
                    location,
                    previous,
                    OperatorKind::And,
                    comparison,
                ))),
            });
        }
        result.unwrap_or_else(|| Expression::Unsupported(self.build_unsupported(node, "comparison")))
    }

    fn build_unary_expression(&mut self, node: &Node, code: &[u8]) -> Expression {
        let Some(operator) = node
            .child_by_field_name("operator")
            .and_then(|operator| UnaryOperatorKind::from_token(operator.kind()))
        else {
            return Expression::Unsupported(self.build_unsupported(node, "unary operator"));
        };
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let argument = self.build_required_expression(node, "argument", "unary operand", code);
        Expression::Unary(Rc::new(UnaryExpression::new(
            id, location, operator, argument,
        )))
    }

    fn build_string_literal(&mut self, node: &Node, code: &[u8]) -> Expression {
        let mut cursor = node.walk();
        let interpolated = node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "interpolation");
        if interpolated {
            return Expression::Unsupported(self.build_unsupported(node, "formatted string"));
        }
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let value = Self::unquote(&Self::node_text(node, code));
        Expression::Literal(Literal::String(Rc::new(StringLiteral::new(
            id, location, value,
        ))))
    }

    /// Strips prefixes and quotes from a Python string token and resolves simple escapes.
    fn unquote(text: &str) -> String {
        let prefix_len = text
            .find(|c: char| c == '\'' || c == '"')
            .unwrap_or(0);
        let (prefix, quoted) = text.split_at(prefix_len);
        let raw = prefix.chars().any(|c| c.eq_ignore_ascii_case(&'r'));
        let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
            3
        } else {
            1
        };
        let inner = quoted
            .get(quote_len..quoted.len().saturating_sub(quote_len))
            .unwrap_or_default();
        if raw {
            return inner.to_string();
        }
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                value.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some('0') => value.push('\0'),
                Some(other @ ('\\' | '\'' | '"')) => value.push(other),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => value.push('\\'),
            }
        }
        value
    }

    fn build_identifier(&mut self, node: &Node, code: &[u8]) -> Rc<Identifier> {
        let id = self.next_node_id();
        let location = Self::get_location(node);
        let name = Self::node_text(node, code);
        Rc::new(Identifier::new(id, name, location))
    }

    fn node_text(node: &Node, code: &[u8]) -> String {
        String::from_utf8_lossy(&code[node.start_byte()..node.end_byte()]).into_owned()
    }

    fn first_named_child<'t>(node: &Node<'t>) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .find(|child| child.kind() != "comment")
    }

    fn next_node_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[allow(clippy::cast_possible_truncation)]
    fn get_location(node: &Node) -> Location {
        let offset_start = node.start_byte() as u32;
        let offset_end = node.end_byte() as u32;
        let start_position = node.start_position();
        let end_position = node.end_position();
        let start_line = start_position.row as u32 + 1;
        let start_column = start_position.column as u32 + 1;
        let end_line = end_position.row as u32 + 1;
        let end_column = end_position.column as u32 + 1;

        Location {
            offset_start,
            offset_end,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    fn collect_errors(&mut self, node: &Node, code: &[u8]) {
        if !node.has_error() {
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.is_error() || child.is_missing() {
                let location = Self::get_location(&child);
                let snippet = Self::node_text(&child, code)
                    .chars()
                    .take(30)
                    .collect::<String>();
                self.errors.push(AstError::Syntax { location, snippet });
            } else {
                self.collect_errors(&child, code);
            }
        }
    }
}
