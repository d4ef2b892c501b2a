//! Command line argument parsing for `rtseqc`.

use clap::{Parser, ValueEnum};

/// Artifact formats `--emit` can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Emit {
    /// Indented, human-readable listing.
    Text,
    /// The serialized `SequenceDefinition`.
    Json,
}

/// Command line interface definition for the sequence translator.
///
/// ## Examples
///
/// Print the translated sequence:
/// ```bash
/// rtseqc engine_test.py --entry ramp_up
/// ```
///
/// Write JSON and run it against a preset channel:
/// ```bash
/// rtseqc engine_test.py --entry ramp_up --emit json -o ramp_up.json \
///     --run --channel Targets/Engine/RPM=1500
/// ```
#[derive(Parser)]
#[command(
    name = "rtseqc",
    author,
    version,
    about = "Real-time sequence translator (rtseqc)",
    long_about = "The 'rtseqc' command translates one entry function of a Python source file, and every \
subroutine it calls, into a real-time sequence definition. The definition can be printed, written as JSON \
or run with the reference evaluator."
)]
pub(crate) struct Cli {
    /// Path to the Python source file.
    pub(crate) path: std::path::PathBuf,

    /// Name of the `@nivs_rt_sequence` function to translate.
    #[clap(long = "entry", short = 'e')]
    pub(crate) entry: String,

    /// Artifact format. Defaults to `text` unless `--run` is given alone.
    #[clap(long = "emit", value_enum)]
    pub(crate) emit: Option<Emit>,

    /// Write the artifact to this file instead of stdout.
    #[clap(short = 'o', long = "output")]
    pub(crate) output: Option<std::path::PathBuf>,

    /// Run the translated sequence with the reference evaluator.
    #[clap(long = "run", action = clap::ArgAction::SetTrue)]
    pub(crate) run: bool,

    /// Preset a channel before running, as `alias=value`. Repeatable.
    #[clap(long = "channel", value_parser = parse_channel)]
    pub(crate) channels: Vec<(String, f64)>,
}

impl Cli {
    /// The format to emit, if any.
    pub(crate) fn emit_format(&self) -> Option<Emit> {
        match (self.emit, self.run) {
            (Some(emit), _) => Some(emit),
            (None, false) => Some(Emit::Text),
            (None, true) => None,
        }
    }
}

fn parse_channel(argument: &str) -> Result<(String, f64), String> {
    let Some((alias, value)) = argument.rsplit_once('=') else {
        return Err(format!("expected `alias=value`, found `{argument}`"));
    };
    if alias.is_empty() {
        return Err("channel alias is empty".to_string());
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for `{alias}`: {e}"))?;
    Ok((alias.to_string(), value))
}
