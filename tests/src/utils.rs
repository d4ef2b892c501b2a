use rtseq_ast::{arena::Arena, builder::Builder};
use rtseq_runtime::{Executor, RuntimeError};
use rtseq_sequence::{SequenceDefinition, Value};
use rtseq_translator::TranslateError;

pub(crate) fn get_test_data_path() -> std::path::PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::env::current_dir().unwrap());
    manifest_dir.join("test_data")
}

/// `tests/test_data/py/{name}.py`
pub(crate) fn get_test_file_path(name: &str) -> std::path::PathBuf {
    get_test_data_path().join("py").join(format!("{name}.py"))
}

pub(crate) fn build_ast(source_code: &str) -> Arena {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .expect("Error loading Python grammar");
    let tree = parser.parse(source_code, None).unwrap();
    let code = source_code.as_bytes();
    let root_node = tree.root_node();
    let mut builder = Builder::new();
    builder.add_source_code(root_node, code);
    builder.build_ast().unwrap()
}

pub(crate) fn translate_source(
    source_code: &str,
    entry: &str,
) -> Result<SequenceDefinition, TranslateError> {
    rtseq_translator::translate(&build_ast(source_code), entry)
}

pub(crate) fn translate_file(name: &str, entry: &str) -> Result<SequenceDefinition, TranslateError> {
    let source_code = std::fs::read_to_string(get_test_file_path(name)).unwrap();
    translate_source(&source_code, entry)
}

/// Translates `entry` from a data file and runs it with no arguments.
pub(crate) fn run_file(name: &str, entry: &str) -> Result<Option<Value>, RuntimeError> {
    let sequence = translate_file(name, entry).unwrap();
    Executor::new(&sequence).run(&[])
}
