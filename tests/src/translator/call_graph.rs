use crate::utils::{build_ast, translate_file, translate_source};
use rtseq_translator::{ErrorKind, TranslateError, call_graph::CallGraph};

#[test]
fn test_recursion_is_rejected() {
    for entry in [
        "recursive_call",
        "circular_call_a",
        "circular_call_b",
        "finite_recursion",
    ] {
        let error = translate_file("subroutines", entry).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CallGraphCycle, "{entry}: {error}");
    }
}

#[test]
fn test_cycle_path_starts_and_ends_at_the_same_function() {
    let error = translate_file("subroutines", "circular_call_a").unwrap_err();
    let TranslateError::CallGraphCycle { path, .. } = error else {
        panic!("expected a cycle");
    };
    assert_eq!(path.first(), path.last());
    assert!(path.contains(&"circular_call_a".to_string()));
    assert!(path.contains(&"circular_call_b".to_string()));
}

#[test]
fn test_cycle_below_the_entry_is_found() {
    let error = translate_source(
        r#"
@nivs_rt_sequence
def leaf_a():
    leaf_b()

@nivs_rt_sequence
def leaf_b():
    leaf_a()

@nivs_rt_sequence
def main():
    leaf_a()
"#,
        "main",
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CallGraphCycle);
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let source = r#"
@nivs_rt_sequence
def bottom():
    return 1

@nivs_rt_sequence
def left():
    bottom()

@nivs_rt_sequence
def right():
    bottom()

@nivs_rt_sequence
def top():
    left()
    right()
"#;
    let arena = build_ast(source);
    let entry = arena.find_function("top").unwrap();
    let graph = CallGraph::build(&arena, &entry).unwrap();
    assert_eq!(graph.len(), 4);
    let order = graph.translation_order().unwrap();
    assert_eq!(order.first().map(String::as_str), Some("bottom"));
    assert_eq!(order.last().map(String::as_str), Some("top"));

    let sequence = translate_source(source, "top").unwrap();
    assert_eq!(sequence.subroutines.len(), 3);
}

#[test]
fn test_translation_is_deterministic() {
    for (file, entry) in [
        ("multitask", "multitask_nested"),
        ("subroutines", "call_parameter_nivsdatatype"),
        ("channels", "engine_ramp"),
    ] {
        let first = translate_file(file, entry).unwrap();
        let second = translate_file(file, entry).unwrap();
        assert_eq!(first, second);
    }
}
