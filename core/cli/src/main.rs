#![warn(clippy::pedantic)]

//! # Real-Time Sequence Translator CLI
//!
//! Command line interface for rtseq.
//!
//! 1. Parse the source file.
//! 2. Translate `--entry` and every subroutine it reaches.
//! 3. Emit the definition as text or JSON (`--emit`, `-o`).
//! 4. Optionally run it with the reference evaluator (`--run`, `--channel`).
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default
//! `rtseqc=info`).
//!
//! ## Exit codes
//! * 0 – success.
//! * 1 – usage / IO / translation / runtime failure.
//!
//! ## Example
//! ```bash
//! rtseqc sequences.py --entry multitask_nested --run
//! ```

mod parser;
use clap::Parser;
use parser::{Cli, Emit};
use rtseq::{Executor, SequenceDefinition, SequencePrinter, TranslateError, compile};
use std::{fs, process};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rtseqc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();
    if !args.path.exists() {
        eprintln!("Error: path not found");
        process::exit(1);
    }
    let source_code = match fs::read_to_string(&args.path) {
        Ok(source_code) => source_code,
        Err(e) => {
            eprintln!("Error reading source file: {e}");
            process::exit(1);
        }
    };

    let sequence = match compile(&source_code, &args.entry) {
        Ok(sequence) => sequence,
        Err(e) => {
            match e.downcast_ref::<TranslateError>() {
                Some(error) => eprintln!("Translation failed [{}]: {error}", error.kind()),
                None => eprintln!("Parse error: {e}"),
            }
            process::exit(1);
        }
    };
    info!(
        entry = %args.entry,
        subroutines = sequence.subroutines.len(),
        "translated {}",
        args.path.display()
    );

    if let Some(format) = args.emit_format()
        && let Err(e) = emit(&sequence, format, &args)
    {
        eprintln!("Failed to emit sequence: {e}");
        process::exit(1);
    }

    if args.run && let Err(e) = run(&sequence, &args) {
        eprintln!("Run failed: {e}");
        process::exit(1);
    }
}

fn emit(sequence: &SequenceDefinition, format: Emit, args: &Cli) -> anyhow::Result<()> {
    let rendered = match format {
        Emit::Text => SequencePrinter::default().print(sequence),
        Emit::Json => serde_json::to_string_pretty(sequence)? + "\n",
    };
    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            println!("Sequence written to: {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn run(sequence: &SequenceDefinition, args: &Cli) -> anyhow::Result<()> {
    let mut executor = Executor::new(sequence);
    for (alias, value) in &args.channels {
        executor.set_channel(alias.clone(), *value);
    }
    let result = executor.run(&[])?;
    match result {
        Some(value) => println!("Result: {value}"),
        None => println!("Result: (none)"),
    }
    for (alias, value) in executor.channels() {
        println!("Channel {alias} = {value}");
    }
    Ok(())
}
