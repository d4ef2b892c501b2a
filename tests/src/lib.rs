//! End to end tests: source text through translation and the reference evaluator.

#[cfg(test)]
mod utils;

#[cfg(test)]
mod ast;
#[cfg(test)]
mod runtime;
#[cfg(test)]
mod translator;

#[cfg(test)]
mod general_tests {
    use crate::utils::{get_test_data_path, translate_file};

    #[test]
    fn test_every_data_file_parses() -> anyhow::Result<()> {
        let directory = get_test_data_path().join("py");
        let mut parsed = 0;
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if path.extension().is_some_and(|extension| extension == "py") {
                let source_code = std::fs::read_to_string(&path)?;
                let arena = rtseq::parse(&source_code)?;
                assert!(!arena.functions().is_empty(), "{} has no functions", path.display());
                parsed += 1;
            }
        }
        assert!(parsed >= 4);
        Ok(())
    }

    #[test]
    fn test_artifact_serializes_to_json() -> anyhow::Result<()> {
        let sequence = translate_file("multitask", "multitask_nested").unwrap();
        let json = serde_json::to_string_pretty(&sequence)?;
        let back: rtseq_sequence::SequenceDefinition = serde_json::from_str(&json)?;
        assert_eq!(back, sequence);
        Ok(())
    }
}
