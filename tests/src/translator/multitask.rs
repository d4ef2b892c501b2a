use crate::utils::translate_file;
use rtseq_sequence::Statement;
use rtseq_translator::{ErrorKind, TranslateError};

fn parallel_block(statement: &Statement) -> &rtseq_sequence::ParallelBlock {
    let Statement::Parallel(block) = statement else {
        panic!("expected a parallel block, found `{statement}`");
    };
    block
}

#[test]
fn test_run_scenarios_translate() {
    for entry in [
        "multitask_pass",
        "multitask_access_local",
        "multitask_nested",
        "multitask_task_with_yield",
        "multitask_call_subroutine_params_byref",
        "multitask_redefine_var",
    ] {
        let result = translate_file("multitask", entry);
        assert!(result.is_ok(), "{entry}: {:?}", result.err());
    }
}

#[test]
fn test_empty_tasks_become_no_ops() {
    let sequence = translate_file("multitask", "multitask_pass").unwrap();
    let block = parallel_block(&sequence.body[0]);
    assert_eq!(block.tasks.len(), 2);
    for task in &block.tasks {
        assert_eq!(task.body, vec![Statement::NoOp]);
    }
    assert_eq!(sequence.body[1].to_string(), "return a");
}

#[test]
fn test_yield_is_kept_in_place() {
    let sequence = translate_file("multitask", "multitask_task_with_yield").unwrap();
    let block = parallel_block(&sequence.body[0]);
    let first: Vec<String> = block.tasks[0].body.iter().map(ToString::to_string).collect();
    let second: Vec<String> = block.tasks[1].body.iter().map(ToString::to_string).collect();
    assert_eq!(first, vec!["nivs_yield()", "a = 1"]);
    assert_eq!(second, vec!["a = 2", "nivs_yield()"]);
}

#[test]
fn test_task_calls_reach_subroutines() {
    let sequence = translate_file("multitask", "multitask_call_subroutine_params_byref").unwrap();
    assert_eq!(sequence.subroutines.len(), 1);
    assert_eq!(sequence.subroutines[0].name, "_increase_param_by_ref");
    let block = parallel_block(&sequence.body[0]);
    assert_eq!(block.tasks[0].body[0].to_string(), "_increase_param_by_ref(ref a)");
    assert_eq!(block.tasks[2].body[0].to_string(), "a = a + b");
}

#[test]
fn test_failures() {
    let cases = [
        ("multitask_duplicate_name_fails", ErrorKind::Redefinition),
        ("multitask_return_fails", ErrorKind::Structural),
        ("multitask_with_param_fails", ErrorKind::Structural),
        ("multitask_task_with_param_fails", ErrorKind::Structural),
        ("multitask_return_in_task_fails", ErrorKind::Structural),
        ("multitask_funcdef_in_task_fails", ErrorKind::Structural),
    ];
    for (entry, kind) in cases {
        let error = translate_file("multitask", entry).unwrap_err();
        assert_eq!(error.kind(), kind, "{entry}: {error}");
    }
}

#[test]
fn test_task_parameters_are_reported_by_name() {
    let error = translate_file("multitask", "multitask_task_with_param_fails").unwrap_err();
    assert!(matches!(error, TranslateError::TaskParameters { ref task, .. } if task == "f1"));
}
