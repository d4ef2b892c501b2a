use crate::utils::build_ast;
use rtseq_ast::nodes::{Expression, Literal, PassMode, Statement};

#[test]
fn test_parse_sequence_functions() {
    let source = r#"
@nivs_rt_sequence
def first():
    return 1

def helper():
    pass

@decorators.nivs_rt_sequence
def second():
    return 2
"#;
    let arena = build_ast(source);
    let source_files = &arena.source_files();
    assert_eq!(source_files.len(), 1);
    assert_eq!(source_files[0].definitions.len(), 3);

    let marked: Vec<String> = arena
        .functions()
        .iter()
        .filter(|function| function.is_sequence)
        .map(|function| function.name())
        .collect();
    assert_eq!(marked, vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn test_module_level_statements_are_ignored() {
    let source = r#"
import sys
from niveristand import decorators

a = 1

class Helper:
    pass

@nivs_rt_sequence
def only():
    pass
"#;
    let arena = build_ast(source);
    assert_eq!(arena.functions().len(), 1);
}

#[test]
fn test_nivs_param_sets_mode_and_default() {
    let source = r#"
@NivsParam('by_ref', I32Value(0), NivsParam.BY_REF)
@NivsParam('by_value', DoubleValue(2.5), NivsParam.BY_VALUE)
@nivs_rt_sequence
def f(by_ref, by_value, plain):
    pass
"#;
    let arena = build_ast(source);
    let function = arena.find_function("f").unwrap();
    let modes: Vec<PassMode> = function.parameters.iter().map(|p| p.mode).collect();
    assert_eq!(
        modes,
        vec![PassMode::ByReference, PassMode::ByValue, PassMode::ByValue]
    );
    assert!(matches!(
        &function.parameters[0].default,
        Some(Expression::Call(call)) if call.callee_name() == Some("I32Value")
    ));
    assert!(function.parameters[2].default.is_none());
}

#[test]
fn test_last_definition_wins() {
    let source = r#"
@nivs_rt_sequence
def f():
    return 1

@nivs_rt_sequence
def f():
    return 2
"#;
    let arena = build_ast(source);
    let function = arena.find_function("f").unwrap();
    let Statement::Return(ret) = &function.body[0] else {
        panic!("expected a return statement");
    };
    assert!(matches!(
        &ret.expression,
        Some(Expression::Literal(Literal::Integer(literal))) if literal.value == "2"
    ));
}

#[test]
fn test_syntax_errors_are_collected() {
    let source = "@nivs_rt_sequence\ndef broken(:\n    return 1\n";
    let error = rtseq::parse(source).unwrap_err();
    assert!(error.to_string().contains("AST building failed"));
}

#[test]
fn test_nivs_param_for_unknown_parameter_fails() {
    let source = r#"
@NivsParam('missing', I32Value(0), NivsParam.BY_REF)
@nivs_rt_sequence
def f(x):
    pass
"#;
    let error = rtseq::parse(source).unwrap_err();
    assert!(error.to_string().contains("no parameter named `missing`"));
}
