use crate::utils::{translate_file, translate_source};
use rtseq_sequence::{Argument, PassingMode, Statement, ValueType};
use rtseq_translator::{ErrorKind, TranslateError};

#[test]
fn test_run_scenarios_translate() {
    for entry in [
        "return_constant",
        "call_return_constant_as_assignment",
        "call_return_constant_as_expr",
        "call_return_parameter",
        "call_parameter_nivsdatatype",
        "call_parameter_builtin_math",
        "call_parameter_array_elem_byref",
    ] {
        let result = translate_file("subroutines", entry);
        assert!(result.is_ok(), "{entry}: {:?}", result.err());
    }
}

#[test]
fn test_undecorated_parameter_is_by_value_double() {
    let sequence = translate_file("subroutines", "call_return_parameter").unwrap();
    let callee = sequence.subroutine("return_parameter").unwrap();
    assert_eq!(callee.parameters.len(), 1);
    assert_eq!(callee.parameters[0].mode, PassingMode::ByValue);
    assert_eq!(callee.parameters[0].value_type, ValueType::Double);
    assert_eq!(callee.return_type, Some(ValueType::Double));
}

#[test]
fn test_by_reference_call_passes_variable_name() {
    let sequence = translate_file("subroutines", "call_parameter_nivsdatatype").unwrap();
    let Statement::Call(call) = &sequence.body[0] else {
        panic!("expected a call statement");
    };
    assert_eq!(call.name, "return_parameter_plus1_byref");
    assert_eq!(call.arguments, vec![Argument::ByReference("a".to_string())]);
}

#[test]
fn test_call_used_as_statement_discards_value() {
    let sequence = translate_file("subroutines", "call_return_constant_as_expr").unwrap();
    assert!(matches!(&sequence.body[0], Statement::Call(call) if call.name == "return_constant"));
    assert_eq!(sequence.body[1].to_string(), "a = true");
}

#[test]
fn test_primitive_argument_is_translated() {
    let sequence = translate_file("subroutines", "call_parameter_builtin_math").unwrap();
    assert_eq!(sequence.body[0].to_string(), "a = return_parameter(abs(5))");
}

#[test]
fn test_undefined_call_fails() {
    let error = translate_file("subroutines", "invalid_call").unwrap_err();
    assert!(matches!(
        error,
        TranslateError::UndefinedCall { ref name, .. } if name == "fake_call"
    ));
    assert_eq!(error.kind(), ErrorKind::UndefinedName);
}

#[test]
fn test_array_element_mutation_is_not_implemented() {
    let error = translate_file("subroutines", "call_array_elem_increment").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotImplemented);
}

#[test]
fn test_array_parameter_element_read() {
    let sequence = translate_file("subroutines", "call_parameter_array_elem").unwrap();
    let callee = sequence.subroutine("return_arr_element").unwrap();
    assert_eq!(callee.parameters[0].value_type, ValueType::DoubleArray);
    assert_eq!(callee.parameters[0].mode, PassingMode::ByValue);
    assert_eq!(callee.return_type, Some(ValueType::Double));
    assert_eq!(sequence.body[0].to_string(), "b = return_arr_element(a)");
}

#[test]
fn test_undecorated_parameter_is_not_an_array() {
    let error = translate_source(
        r#"
@nivs_rt_sequence
def return_arr_element(param):
    return param[0]
"#,
        "return_arr_element",
    )
    .unwrap_err();
    assert!(matches!(error, TranslateError::NotAnArray { ref name, .. } if name == "param"));
    assert_eq!(error.kind(), ErrorKind::Structural);
}
