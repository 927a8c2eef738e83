//! Diff command
//!
//! Usage: patchplan diff --state <FILE> --plan <FILE> [--options <FILE>] [--output <FILE>]

use clap::{Args, ValueEnum};
use patchplan_core::logging_facility::{init, Profile};
use patchplan_core::{canonicalize, patch_trees, PatchOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable logs on stderr
    Human,
    /// JSON structured logs on stderr
    Json,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// JSON document holding the last observed state
    #[arg(long)]
    pub state: PathBuf,

    /// JSON document holding the desired plan
    #[arg(long)]
    pub plan: PathBuf,

    /// TOML file with patch options
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Ignore the state's value for fields ending with this path (repeatable)
    #[arg(long = "ignore-suffix")]
    pub ignore_suffix: Vec<String>,

    /// Ignore the state's value for this field and everything under it (repeatable)
    #[arg(long = "ignore-prefix")]
    pub ignore_prefix: Vec<String>,

    /// Re-admit the state's value for fields an ignore rule would suppress (repeatable)
    #[arg(long = "include-suffix")]
    pub include_suffix: Vec<String>,

    /// Always send this field, even when unchanged (repeatable)
    #[arg(long)]
    pub force: Vec<String>,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}

fn read_json(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))?;
    Ok(value)
}

fn load_options(args: &DiffArgs) -> Result<Vec<PatchOptions>, Box<dyn std::error::Error>> {
    let mut options = Vec::new();
    if let Some(path) = &args.options {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let from_file: PatchOptions = toml::from_str(&text)
            .map_err(|e| format!("invalid options in {}: {}", path.display(), e))?;
        options.push(from_file);
    }

    // Flags form one more option set on top of the file.
    options.push(
        PatchOptions::default()
            .ignore_in_state_suffix(args.ignore_suffix.iter().cloned())
            .ignore_in_state_prefix(args.ignore_prefix.iter().cloned())
            .include_in_state_suffix(args.include_suffix.iter().cloned())
            .force_update_attr(args.force.iter().cloned()),
    );
    Ok(options)
}

/// Execute diff command
pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    init(match args.log_format {
        LogFormat::Human => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let options = load_options(&args)?;
    let state = canonicalize(&read_json(&args.state)?)?;
    let plan = canonicalize(&read_json(&args.plan)?)?;

    let outcome = patch_trees(&state, &plan, &options)?;
    let rendered = match outcome.into_patch() {
        Some(patch) => serde_json::to_string_pretty(&patch.into_json())?,
        None => "no changes".to_string(),
    };

    if let Some(output_path) = args.output {
        std::fs::write(&output_path, format!("{}\n", rendered))?;
        println!("✓ Patch written to {}", output_path.display());
    } else {
        println!("{}", rendered);
    }

    Ok(())
}
