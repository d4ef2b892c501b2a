use crate::utils::{translate_file, translate_source};
use rtseq_sequence::{Statement, Value, ValueType};
use rtseq_translator::{ErrorKind, TranslateError};
use rustc_hash::FxHashSet;

#[test]
fn test_declared_variables_match_body_declarations() {
    let sequence = translate_source(
        r#"
@nivs_rt_sequence
def declarations():
    a = I32Value(0)
    b = DoubleValue(1.5)
    c = BooleanValue(True)
    d = U64ValueArray([1, 2])
    if a.value == 0:
        e = I64Value(3)
    return b.value
"#,
        "declarations",
    )
    .unwrap();
    let declared: FxHashSet<&str> = sequence.variable_names().into_iter().collect();
    let expected: FxHashSet<&str> = ["a", "b", "c", "d", "e"].into_iter().collect();
    assert_eq!(declared, expected);
    assert_eq!(sequence.type_of("d"), Some(ValueType::UInt64Array));
    assert_eq!(sequence.variable("b").unwrap().initial, Value::Double(1.5));
}

#[test]
fn test_redefinition_in_same_scope_fails() {
    let error = translate_source(
        r#"
@nivs_rt_sequence
def twice():
    a = I32Value(0)
    a = DoubleValue(1)
"#,
        "twice",
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Redefinition);
}

#[test]
fn test_undeclared_name_fails() {
    let error = translate_source(
        r#"
@nivs_rt_sequence
def undeclared():
    a = I32Value(0)
    a.value = b.value
"#,
        "undeclared",
    )
    .unwrap_err();
    assert!(matches!(error, TranslateError::UndefinedName { ref name, .. } if name == "b"));
}

#[test]
fn test_task_shadowing_gets_renamed() {
    let sequence = translate_file("multitask", "multitask_redefine_var").unwrap();
    assert_eq!(sequence.variable_names(), vec!["a", "f1_a"]);
    let Statement::Parallel(block) = &sequence.body[0] else {
        panic!("expected a parallel block");
    };
    assert_eq!(block.tasks[0].body.last().unwrap().to_string(), "f1_a = 2");
    assert_eq!(sequence.body[1].to_string(), "return a");
}

#[test]
fn test_error_reports_task_path() {
    let error = translate_source(
        r#"
@nivs_rt_sequence
def outer():
    with multitask() as mt:
        def worker():
            x.value = 1
        mt.append(worker)
"#,
        "outer",
    )
    .unwrap_err();
    assert!(matches!(
        error,
        TranslateError::UndefinedName { ref context, .. } if context == "outer::worker"
    ));
}

#[test]
fn test_dropped_task_definitions_declare_nothing() {
    let sequence = translate_source(
        r#"
@nivs_rt_sequence
def rec():
    rec()

@nivs_rt_sequence
def multitask_dropped_definitions():
    a = I32Value(0)
    with multitask() as mt:
        def f1():
            x = I32Value(1)
            rec()

        def f1():
            y = I32Value(2)
            y.value = a.value

        def f2():
            z = I32Value(3)
            rec()
        mt.append(f1)
    return a.value
"#,
        "multitask_dropped_definitions",
    )
    .unwrap();
    let declared: FxHashSet<&str> = sequence.variable_names().into_iter().collect();
    let expected: FxHashSet<&str> = ["a", "y"].into_iter().collect();
    assert_eq!(declared, expected);
    assert!(sequence.subroutines.is_empty());
}
