use crate::utils::{run_file, translate_file};
use rtseq_runtime::{Executor, RuntimeError, SequenceError};
use rtseq_sequence::{ErrorAction, Value};

#[test]
fn test_multitask_scenarios() {
    let cases = [
        ("multitask_pass", 1),
        ("multitask_access_local", 35),
        ("multitask_nested", 455),
        ("multitask_task_with_yield", 1),
        ("multitask_call_subroutine_params_byref", 3),
    ];
    for (entry, expected) in cases {
        let result = run_file("multitask", entry).unwrap();
        assert_eq!(result, Some(Value::Int32(expected)), "{entry}");
    }
}

#[test]
fn test_shadowed_task_variable_leaves_outer_untouched() {
    let result = run_file("multitask", "multitask_redefine_var").unwrap();
    assert_eq!(result, Some(Value::Int32(0)));
}

#[test]
fn test_subroutine_scenarios() {
    let cases = [
        ("return_constant", Value::Double(5.0)),
        ("call_return_constant_as_expr", Value::Boolean(true)),
        ("call_return_parameter", Value::Double(5.0)),
        ("call_parameter_nivsdatatype", Value::Double(6.0)),
        ("call_parameter_builtin_math", Value::Double(5.0)),
        ("call_parameter_array_elem", Value::Double(1.0)),
        ("call_parameter_array_elem_byref", Value::Double(2.0)),
    ];
    for (entry, expected) in cases {
        let result = run_file("subroutines", entry).unwrap();
        assert_eq!(result, Some(expected), "{entry}");
    }
}

#[test]
fn test_channel_getter_copies_written_value() {
    let result = run_file("channels", "channel_ref_validate_getter").unwrap();
    assert_eq!(result, Some(Value::Double(5.0)));
}

#[test]
fn test_engine_ramp_reaches_host_target() {
    let sequence = translate_file("channels", "engine_ramp").unwrap();
    let mut executor = Executor::new(&sequence);
    executor.set_channel("Aliases/TargetRPM", 1500.0);
    let result = executor.run(&[]).unwrap();
    assert_eq!(result, Some(Value::Int32(3)));
    assert_eq!(executor.channel("Targets/Engine/RPM"), Some(1500.0));
}

#[test]
fn test_fault_overrides_reads_until_cleared() {
    let result = run_file("channels", "fault_and_restore").unwrap();
    assert_eq!(result, Some(Value::Double(10000.0)));
}

#[test]
fn test_continued_error_is_observable() {
    assert_eq!(
        run_file("errors", "continue_after_error").unwrap(),
        Some(Value::Int32(5000))
    );
    assert_eq!(
        run_file("errors", "clear_error_state").unwrap(),
        Some(Value::Int32(0))
    );
}

#[test]
fn test_stopping_errors_end_the_run() {
    let error = run_file("errors", "stop_on_error").unwrap_err();
    assert_eq!(
        error,
        RuntimeError::Sequence(SequenceError::new(-100, "Stop now", ErrorAction::StopSequence))
    );

    let error = run_file("errors", "abort_on_error").unwrap_err();
    assert!(matches!(error, RuntimeError::Sequence(ref e) if e.code == -200));
}
