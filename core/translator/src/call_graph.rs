//! Call graph of the subroutines reachable from an entry sequence.
//!
//! # Construction
//!
//! 1. **Discovery** - Starting at the entry, every call whose callee is a plain
//!    name (and not a builtin) becomes an edge. Calls inside registered task
//!    bodies, conditions, arguments and `with` items all count; a task
//!    definition that no `append` registers contributes nothing.
//! 2. **Resolution** - A callee must be a top-level function marked with
//!    `nivs_rt_sequence`; anything else fails before any statement is translated.
//! 3. **Cycle Detection** - The reachable subgraph must be acyclic. Self-calls,
//!    direct and indirect recursion are all rejected, whether or not the
//!    recursion would terminate at runtime.
//! 4. **Order** - Functions are translated leaves first, so every callee's
//!    signature is known before a caller is translated.

use std::{collections::VecDeque, rc::Rc};

use indexmap::IndexMap;
use rtseq_ast::{
    arena::Arena,
    nodes::{Expression, FunctionDefinition, Location, Statement},
};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::{builtins::Builtin, errors::TranslateError, multitask::registered_tasks};

#[derive(Debug, Clone)]
pub struct CallGraphNode {
    pub name: String,
    pub function: Rc<FunctionDefinition>,
    /// Callee name to the location of its first call site, in discovery order.
    pub calls: IndexMap<String, Location>,
}

#[derive(Debug, Clone)]
pub struct CallGraph {
    entry: String,
    nodes: IndexMap<String, CallGraphNode>,
}

impl CallGraph {
    /// Discovers every subroutine reachable from `entry`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::UndefinedCall`] for a callee with no top-level
    /// definition and [`TranslateError::NotASequence`] for an unmarked one.
    pub fn build(arena: &Arena, entry: &Rc<FunctionDefinition>) -> Result<Self, TranslateError> {
        let mut graph = CallGraph {
            entry: entry.name(),
            nodes: IndexMap::new(),
        };
        let mut pending = VecDeque::from([entry.clone()]);

        while let Some(function) = pending.pop_front() {
            let name = function.name();
            if graph.nodes.contains_key(&name) {
                continue;
            }
            let calls = collect_calls(&function);
            for (callee, location) in &calls {
                if graph.nodes.contains_key(callee) || callee == &name {
                    continue;
                }
                let Some(definition) = arena.find_function(callee) else {
                    return Err(TranslateError::UndefinedCall {
                        name: callee.clone(),
                        context: name.clone(),
                        location: *location,
                    });
                };
                if !definition.is_sequence {
                    return Err(TranslateError::NotASequence {
                        name: callee.clone(),
                        context: name.clone(),
                        location: *location,
                    });
                }
                pending.push_back(definition);
            }
            debug!(function = %name, callees = calls.len(), "call graph node");
            graph.nodes.insert(
                name.clone(),
                CallGraphNode {
                    name,
                    function,
                    calls,
                },
            );
        }
        Ok(graph)
    }

    /// Rejects any cycle in the reachable subgraph.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::CallGraphCycle`] naming one cycle, e.g. `[a, b, a]`.
    pub fn check_acyclic(&self) -> Result<(), TranslateError> {
        self.translation_order().map(|_| ())
    }

    /// Function names in translation order: callees before callers, entry last.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::CallGraphCycle`] if the graph has a cycle.
    pub fn translation_order(&self) -> Result<Vec<String>, TranslateError> {
        let mut remaining: IndexMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(name, node)| (name.as_str(), node.calls.len()))
            .collect();
        let mut callers: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for (name, node) in &self.nodes {
            for callee in node.calls.keys() {
                callers.entry(callee.as_str()).or_default().push(name.as_str());
            }
        }

        let mut queue: VecDeque<&str> = remaining
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(name) = queue.pop_front() {
            order.push(name.to_string());
            for caller in callers.get(name).into_iter().flatten() {
                if let Some(degree) = remaining.get_mut(caller) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(caller);
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }
        let stuck: Vec<&str> = self
            .nodes
            .keys()
            .map(String::as_str)
            .filter(|name| !order.iter().any(|done| done == name))
            .collect();
        let path = self.trace_cycle_path(&stuck);
        let location = match path.as_slice() {
            [.., caller, callee] => self
                .nodes
                .get(caller)
                .and_then(|node| node.calls.get(callee))
                .copied()
                .unwrap_or_default(),
            _ => Location::default(),
        };
        Err(TranslateError::CallGraphCycle { path, location })
    }

    /// Follows edges between unsorted nodes until one repeats.
    ///
    /// Every unsorted node still calls another unsorted node, so the walk
    /// always closes. The prefix leading into the cycle is dropped.
    fn trace_cycle_path(&self, stuck: &[&str]) -> Vec<String> {
        let Some(start) = stuck.first() else {
            return Vec::new();
        };
        let stuck_set: FxHashSet<&str> = stuck.iter().copied().collect();
        let mut path: Vec<&str> = vec![*start];
        while let Some(current) = path.last().copied() {
            let next = self.nodes.get(current).and_then(|node| {
                node.calls
                    .keys()
                    .map(String::as_str)
                    .find(|callee| stuck_set.contains(callee))
            });
            let Some(next) = next else {
                break;
            };
            if let Some(cycle_start) = path.iter().position(|name| *name == next) {
                path.push(next);
                path.drain(..cycle_start);
                break;
            }
            path.push(next);
        }
        path.into_iter().map(str::to_string).collect()
    }

    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Rc<FunctionDefinition>> {
        self.nodes.get(name).map(|node| &node.function)
    }

    #[must_use]
    pub fn callees(&self, name: &str) -> Vec<&str> {
        self.nodes
            .get(name)
            .map(|node| node.calls.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn collect_calls(function: &FunctionDefinition) -> IndexMap<String, Location> {
    let mut calls = IndexMap::new();
    for parameter in &function.parameters {
        if let Some(default) = &parameter.default {
            collect_expression_calls(default, &mut calls);
        }
    }
    collect_block_calls(&function.body, &mut calls);
    calls
}

fn collect_block_calls(body: &[Statement], calls: &mut IndexMap<String, Location>) {
    for statement in body {
        collect_statement_calls(statement, calls);
    }
}

fn collect_statement_calls(statement: &Statement, calls: &mut IndexMap<String, Location>) {
    match statement {
        Statement::Assign(assign) => {
            collect_expression_calls(&assign.left, calls);
            collect_expression_calls(&assign.right, calls);
        }
        Statement::AugmentedAssign(assign) => {
            collect_expression_calls(&assign.left, calls);
            collect_expression_calls(&assign.right, calls);
        }
        Statement::Expression(expression) => collect_expression_calls(expression, calls),
        Statement::Return(ret) => {
            if let Some(expression) = &ret.expression {
                collect_expression_calls(expression, calls);
            }
        }
        Statement::If(if_statement) => {
            collect_expression_calls(&if_statement.condition, calls);
            collect_block_calls(&if_statement.consequence, calls);
            if let Some(alternative) = &if_statement.alternative {
                collect_block_calls(alternative, calls);
            }
        }
        Statement::While(while_statement) => {
            collect_expression_calls(&while_statement.condition, calls);
            collect_block_calls(&while_statement.body, calls);
        }
        Statement::For(for_statement) => {
            collect_expression_calls(&for_statement.iterable, calls);
            collect_block_calls(&for_statement.body, calls);
        }
        Statement::With(with) => {
            for item in &with.items {
                collect_expression_calls(&item.value, calls);
            }
            for statement in &with.body {
                if !matches!(statement, Statement::FunctionDefinition(_)) {
                    collect_statement_calls(statement, calls);
                }
            }
            for task in registered_tasks(with) {
                collect_block_calls(&task.body, calls);
            }
        }
        Statement::FunctionDefinition(task) => collect_block_calls(&task.body, calls),
        Statement::Pass(_) | Statement::Unsupported(_) => {}
    }
}

fn collect_expression_calls(expression: &Expression, calls: &mut IndexMap<String, Location>) {
    match expression {
        Expression::Call(call) => {
            if let Some(name) = call.callee_name()
                && Builtin::lookup(name).is_none()
            {
                calls.entry(name.to_string()).or_insert(call.location);
            }
            collect_expression_calls(&call.function, calls);
            for argument in &call.arguments {
                collect_expression_calls(argument, calls);
            }
            for (_, value) in &call.keyword_arguments {
                collect_expression_calls(value, calls);
            }
        }
        Expression::Attribute(attribute) => collect_expression_calls(&attribute.object, calls),
        Expression::Subscript(subscript) => {
            collect_expression_calls(&subscript.value, calls);
            collect_expression_calls(&subscript.index, calls);
        }
        Expression::Binary(binary) => {
            collect_expression_calls(&binary.left, calls);
            collect_expression_calls(&binary.right, calls);
        }
        Expression::Unary(unary) => collect_expression_calls(&unary.expression, calls),
        Expression::List(list) => {
            for element in &list.elements {
                collect_expression_calls(element, calls);
            }
        }
        Expression::Identifier(_) | Expression::Literal(_) | Expression::Unsupported(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::ErrorKind, test_utils::parse};

    fn graph(source: &str, entry: &str) -> Result<CallGraph, TranslateError> {
        let arena = parse(source);
        let function = arena.find_function(entry).expect("entry exists");
        CallGraph::build(&arena, &function)
    }

    #[test]
    fn order_puts_callees_first() {
        let source = r"
@nivs_rt_sequence
def leaf():
    return 1

@nivs_rt_sequence
def middle():
    return leaf()

@nivs_rt_sequence
def main():
    a = I32Value(0)
    a.value = middle() + leaf()
    return a.value
";
        let graph = graph(source, "main").unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.callees("main"), vec!["middle", "leaf"]);
        assert_eq!(
            graph.translation_order().unwrap(),
            vec!["leaf".to_string(), "middle".to_string(), "main".to_string()]
        );
    }

    #[test]
    fn self_call_is_a_cycle() {
        let source = r"
@nivs_rt_sequence
def again():
    again()
";
        let error = graph(source, "again").unwrap().check_acyclic().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CallGraphCycle);
        assert_eq!(
            error,
            TranslateError::CallGraphCycle {
                path: vec!["again".to_string(), "again".to_string()],
                location: error.location().unwrap(),
            }
        );
    }

    #[test]
    fn mutual_recursion_fails_from_either_entry() {
        let source = r"
@nivs_rt_sequence
def a():
    b()

@nivs_rt_sequence
def b():
    a()
";
        for entry in ["a", "b"] {
            let error = graph(source, entry).unwrap().check_acyclic().unwrap_err();
            let TranslateError::CallGraphCycle { path, .. } = error else {
                panic!("expected a cycle error, got {error:?}");
            };
            assert_eq!(path.len(), 3);
            assert_eq!(path.first(), path.last());
        }
    }

    #[test]
    fn calls_inside_tasks_are_edges() {
        let source = r"
@nivs_rt_sequence
def worker():
    pass

@nivs_rt_sequence
def main():
    with multitask() as mt:
        def f1():
            worker()
        mt.append(f1)
";
        let graph = graph(source, "main").unwrap();
        assert!(graph.contains("worker"));
    }

    #[test]
    fn undefined_callee_is_reported_at_build() {
        let source = r"
@nivs_rt_sequence
def invalid_call():
    fake_call()
";
        let error = graph(source, "invalid_call").unwrap_err();
        assert!(matches!(error, TranslateError::UndefinedCall { ref name, .. } if name == "fake_call"));
        assert_eq!(error.kind(), ErrorKind::UndefinedName);
    }

    #[test]
    fn unmarked_callee_is_rejected() {
        let source = r"
def helper():
    pass

@nivs_rt_sequence
def main():
    helper()
";
        let error = graph(source, "main").unwrap_err();
        assert!(matches!(error, TranslateError::NotASequence { .. }));
    }

    #[test]
    fn builtins_are_not_edges() {
        let source = r"
@nivs_rt_sequence
def main():
    a = DoubleValue(0)
    a.value = abs(-2.0) + seqtime()
    nivs_yield()
";
        let graph = graph(source, "main").unwrap();
        assert_eq!(graph.len(), 1);
        assert!(graph.callees("main").is_empty());
    }

    #[test]
    fn only_registered_tasks_contribute_edges() {
        let source = r"
@nivs_rt_sequence
def rec():
    rec()

@nivs_rt_sequence
def leaf():
    return 1

@nivs_rt_sequence
def main():
    with multitask() as mt:
        def f1():
            rec()

        def f1():
            leaf()

        def f2():
            rec()
        mt.append(f1)
";
        let graph = graph(source, "main").unwrap();
        assert_eq!(graph.callees("main"), vec!["leaf"]);
        assert!(!graph.contains("rec"));
        assert!(graph.translation_order().is_ok());
    }
}
