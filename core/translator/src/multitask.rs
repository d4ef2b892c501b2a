//! Multitask blocks.
//!
//! ```text
//! with multitask() as mt:
//!     def f1():
//!         a.value = 5
//!     def f2():
//!         a.value *= 7
//!     mt.append(f1)
//!     mt.append(f2)
//! ```
//!
//! becomes one parallel block whose tasks run in registration order and are
//! joined before the next statement. Task bodies share the enclosing function's
//! variables; declarations inside a task are local to it. A definition is
//! translated when `append` registers it; one that is never registered is
//! dropped untranslated.

use std::rc::Rc;

use indexmap::IndexMap;
use rtseq_ast::nodes::{self as ast, FunctionDefinition};
use rtseq_sequence::{self as ir, JoinPolicy, ParallelBlock, Task};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::{
    builtins::Builtin,
    errors::{DeclarationKind, TranslateError},
    translator::FunctionTranslator,
};

impl FunctionTranslator<'_> {
    pub(crate) fn translate_with(
        &mut self,
        with: &ast::WithStatement,
    ) -> Result<ir::Statement, TranslateError> {
        let [item] = with.items.as_slice() else {
            return Err(self.unsupported("a `with` statement with several items", with.location));
        };
        let ast::Expression::Call(call) = &item.value else {
            return Err(self.unsupported("a `with` statement", with.location));
        };
        if Builtin::of_call(call) != Some(Builtin::Multitask) {
            return Err(self.unsupported("a `with` statement", with.location));
        }
        let count = call.arguments.len() + call.keyword_arguments.len();
        if count > 0 {
            return Err(TranslateError::MultitaskArguments {
                count,
                context: self.context(),
                location: call.location,
            });
        }
        let handle = item.alias.as_ref().map(|alias| alias.name.as_str());

        let mut defined: IndexMap<String, Rc<FunctionDefinition>> = IndexMap::new();
        let mut registered: Vec<Task> = Vec::new();
        let mut registered_names: FxHashSet<String> = FxHashSet::default();
        for (index, statement) in with.body.iter().enumerate() {
            match statement {
                ast::Statement::FunctionDefinition(task) => {
                    if defined.insert(task.name(), task.clone()).is_some() {
                        debug!(task = %task.name(), context = %self.context(), "task redefined");
                    }
                }
                ast::Statement::Expression(ast::Expression::Call(append))
                    if is_append(append, handle) =>
                {
                    let [ast::Expression::Identifier(task)] = append.arguments.as_slice() else {
                        return Err(TranslateError::MultitaskBody {
                            context: self.context(),
                            location: append.location,
                        });
                    };
                    if !registered_names.insert(task.name.clone()) {
                        return Err(TranslateError::Redefinition {
                            kind: DeclarationKind::Task,
                            name: task.name.clone(),
                            context: self.context(),
                            location: task.location,
                        });
                    }
                    let Some(definition) = defined.get(&task.name).cloned() else {
                        return Err(TranslateError::UndefinedName {
                            name: task.name.clone(),
                            context: self.context(),
                            location: task.location,
                        });
                    };
                    registered.push(self.translate_task(&definition)?);
                }
                ast::Statement::Return(ret) => {
                    return Err(TranslateError::ReturnInMultitask {
                        context: self.context(),
                        location: ret.location,
                    });
                }
                ast::Statement::Pass(_) => {}
                statement if index == 0 && statement.is_docstring() => {}
                statement => {
                    return Err(TranslateError::MultitaskBody {
                        context: self.context(),
                        location: statement.location(),
                    });
                }
            }
        }

        for name in defined.keys().filter(|name| !registered_names.contains(*name)) {
            warn!(task = %name, context = %self.context(), "task is never appended and is dropped");
        }
        debug!(tasks = registered.len(), context = %self.context(), "multitask block");
        Ok(ir::Statement::Parallel(ParallelBlock {
            tasks: registered,
            join: JoinPolicy::WaitAll,
        }))
    }

    /// Translates one registered task body in its own scope.
    fn translate_task(&mut self, task: &FunctionDefinition) -> Result<Task, TranslateError> {
        let name = task.name();
        if !task.parameters.is_empty() {
            return Err(TranslateError::TaskParameters {
                task: name,
                location: task.location,
            });
        }
        self.symbols.push_scope(&name);
        self.tasks.push(name.clone());
        let body = self.nested(|t| t.translate_block(&task.body));
        self.tasks.pop();
        self.symbols.pop_scope();
        Ok(Task { name, body: body? })
    }
}

/// Task definitions a multitask block registers, each as bound when its
/// `append` ran. Definitions that are replaced before registration or never
/// registered are not part of the block.
pub(crate) fn registered_tasks(with: &ast::WithStatement) -> Vec<Rc<FunctionDefinition>> {
    let handle = match with.items.as_slice() {
        [item] => item.alias.as_ref().map(|alias| alias.name.as_str()),
        _ => None,
    };
    let mut defined: FxHashMap<&str, &Rc<FunctionDefinition>> = FxHashMap::default();
    let mut registered: Vec<Rc<FunctionDefinition>> = Vec::new();
    for statement in &with.body {
        match statement {
            ast::Statement::FunctionDefinition(task) => {
                defined.insert(task.name.name.as_str(), task);
            }
            ast::Statement::Expression(ast::Expression::Call(append))
                if is_append(append, handle) =>
            {
                if let [ast::Expression::Identifier(task)] = append.arguments.as_slice()
                    && let Some(definition) = defined.get(task.name.as_str())
                {
                    registered.push(Rc::clone(definition));
                }
            }
            _ => {}
        }
    }
    registered
}

/// `mt.append(...)` on the block's own handle.
fn is_append(call: &ast::CallExpression, handle: Option<&str>) -> bool {
    let ast::Expression::Attribute(attribute) = &call.function else {
        return false;
    };
    attribute.attribute.name == "append"
        && matches!(
            (&attribute.object, handle),
            (ast::Expression::Identifier(object), Some(handle)) if object.name == handle
        )
}

#[cfg(test)]
mod tests {
    use rtseq_sequence::Statement;

    use crate::{errors::ErrorKind, test_utils::parse, translate};

    use super::*;

    fn translate_source(source: &str, entry: &str) -> Result<ir::SequenceDefinition, TranslateError> {
        translate(&parse(source), entry)
    }

    #[test]
    fn tasks_keep_registration_order() {
        let sequence = translate_source(
            r"
@nivs_rt_sequence
def multitask_access_local():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            a.value = 5

        def f2():
            a.value *= 7
        mt.append(f2)
        mt.append(f1)
    return a.value
",
            "multitask_access_local",
        )
        .unwrap();
        let Statement::Parallel(block) = &sequence.body[0] else {
            panic!("expected a parallel block");
        };
        let names: Vec<&str> = block.tasks.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["f2", "f1"]);
        assert_eq!(block.join, JoinPolicy::WaitAll);
        assert_eq!(block.tasks[1].body[0].to_string(), "a = 5");
    }

    #[test]
    fn duplicate_registration_fails() {
        let error = translate_source(
            r"
@nivs_rt_sequence
def multitask_duplicate_name_fails():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            a.value = 1

        def f1():
            a.value = 2
        mt.append(f1)
        mt.append(f1)
    return a.value
",
            "multitask_duplicate_name_fails",
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Redefinition);
    }

    #[test]
    fn later_definition_replaces_earlier_one() {
        let sequence = translate_source(
            r"
@nivs_rt_sequence
def main():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            a.value = 1

        def f1():
            a.value = 2
        mt.append(f1)
    return a.value
",
            "main",
        )
        .unwrap();
        let Statement::Parallel(block) = &sequence.body[0] else {
            panic!("expected a parallel block");
        };
        assert_eq!(block.tasks.len(), 1);
        assert_eq!(block.tasks[0].body[0].to_string(), "a = 2");
    }

    #[test]
    fn multitask_with_arguments_fails() {
        let error = translate_source(
            r"
@nivs_rt_sequence
def multitask_with_param_fails():
    a = I32Value(1)
    with multitask(a) as mt:
        def f1():
            pass
        mt.append(f1)
    return a.value
",
            "multitask_with_param_fails",
        )
        .unwrap_err();
        assert!(matches!(error, TranslateError::MultitaskArguments { count: 1, .. }));
    }

    #[test]
    fn task_with_parameters_fails() {
        let error = translate_source(
            r"
@nivs_rt_sequence
def main():
    with multitask() as mt:
        def f1(x):
            pass
        mt.append(f1)
",
            "main",
        )
        .unwrap_err();
        assert!(matches!(error, TranslateError::TaskParameters { ref task, .. } if task == "f1"));
    }

    #[test]
    fn return_in_task_fails() {
        let error = translate_source(
            r"
@nivs_rt_sequence
def multitask_return_in_task_fails():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            a = I32Value(1)
            return a.value
        mt.append(f1)
    return a.value
",
            "multitask_return_in_task_fails",
        )
        .unwrap_err();
        assert!(matches!(error, TranslateError::ReturnInTask { .. }));
        assert_eq!(error.kind(), ErrorKind::Structural);
    }

    #[test]
    fn return_in_block_body_fails() {
        let error = translate_source(
            r"
@nivs_rt_sequence
def multitask_return_fails():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            a.value = 2
        mt.append(f1)
        return a.value
",
            "multitask_return_fails",
        )
        .unwrap_err();
        assert!(matches!(error, TranslateError::ReturnInMultitask { .. }));
    }

    #[test]
    fn function_definition_in_task_fails() {
        let error = translate_source(
            r"
@nivs_rt_sequence
def multitask_funcdef_in_task_fails():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            def f2():
                pass
        mt.append(f1)
    return a.value
",
            "multitask_funcdef_in_task_fails",
        )
        .unwrap_err();
        assert!(matches!(
            error,
            TranslateError::NestedDefinitionInTask { ref task, ref name, .. } if task == "f1" && name == "f2"
        ));
    }

    #[test]
    fn nested_blocks_recurse() {
        let sequence = translate_source(
            r"
@nivs_rt_sequence
def multitask_nested():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            with multitask() as mt:
                def fa():
                    a.value = 5

                def fb():
                    a.value *= 7
                mt.append(fa)
                mt.append(fb)

        def f2():
            a.value *= 13

        mt.append(f1)
        mt.append(f2)
    return a.value
",
            "multitask_nested",
        )
        .unwrap();
        let Statement::Parallel(outer) = &sequence.body[0] else {
            panic!("expected a parallel block");
        };
        assert!(matches!(&outer.tasks[0].body[0], Statement::Parallel(inner) if inner.tasks.len() == 2));
    }

    #[test]
    fn shadowing_in_a_task_gets_its_own_variable() {
        let sequence = translate_source(
            r"
@nivs_rt_sequence
def multitask_redefine_var():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            a = I32Value(1)
            a.value = 2
        mt.append(f1)
    return a.value
",
            "multitask_redefine_var",
        )
        .unwrap();
        assert_eq!(sequence.variable_names(), vec!["a", "f1_a"]);
        let Statement::Parallel(block) = &sequence.body[0] else {
            panic!("expected a parallel block");
        };
        assert_eq!(block.tasks[0].body[1].to_string(), "f1_a = 2");
    }

    #[test]
    fn unregistered_task_is_dropped() {
        let sequence = translate_source(
            r"
@nivs_rt_sequence
def main():
    with multitask() as mt:
        def f1():
            pass
",
            "main",
        )
        .unwrap();
        let Statement::Parallel(block) = &sequence.body[0] else {
            panic!("expected a parallel block");
        };
        assert!(block.tasks.is_empty());
    }

    #[test]
    fn only_registered_definitions_declare_variables() {
        let sequence = translate_source(
            r"
@nivs_rt_sequence
def main():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            x = I32Value(1)

        def f1():
            y = I32Value(2)

        def f2():
            z = I32Value(3)
        mt.append(f1)
    return a.value
",
            "main",
        )
        .unwrap();
        assert_eq!(sequence.variable_names(), vec!["a", "y"]);
    }

    #[test]
    fn registration_uses_the_definition_bound_at_append() {
        let sequence = translate_source(
            r"
@nivs_rt_sequence
def main():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            a.value = 1
        mt.append(f1)

        def f1():
            a.value = 2
    return a.value
",
            "main",
        )
        .unwrap();
        let Statement::Parallel(block) = &sequence.body[0] else {
            panic!("expected a parallel block");
        };
        assert_eq!(block.tasks.len(), 1);
        assert_eq!(block.tasks[0].body[0].to_string(), "a = 1");
    }

    #[test]
    fn unregistered_task_body_is_not_validated() {
        let sequence = translate_source(
            r"
@nivs_rt_sequence
def main():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            a.value = 1

        def unused():
            b.value = 2
        mt.append(f1)
    return a.value
",
            "main",
        );
        assert!(sequence.is_ok());
    }
}
