use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vigil_cli::{analyze_paths, collect_tree_paths, render_json, render_text};
use vigil_common::AnalysisOptions;
use vigil_common::diagnostics::Severity;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Static analyzer for PHP, driven by parser-produced `.ast.json` trees.
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about)]
struct Cli {
    /// Tree files or directories to scan for `.ast.json` inputs.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Diagnostic output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Leading array-literal elements sampled for element-type inference.
    #[arg(long)]
    sample_size: Option<usize>,

    /// Treat scalar-to-scalar coercion as always legal.
    #[arg(long)]
    scalar_implicit_cast: bool,

    /// Treat null as castable to any type.
    #[arg(long)]
    null_casts_as_any: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut options = AnalysisOptions {
        scalar_implicit_cast: cli.scalar_implicit_cast,
        null_casts_as_any: cli.null_casts_as_any,
        ..AnalysisOptions::default()
    };
    if let Some(sample_size) = cli.sample_size {
        options.array_literal_sample_size = sample_size;
    }

    let paths = collect_tree_paths(&cli.paths);
    let diagnostics = analyze_paths(&paths, &options)?;

    let mut failing = 0usize;
    for diagnostic in &diagnostics {
        match cli.format {
            OutputFormat::Text => println!("{}", render_text(diagnostic)),
            OutputFormat::Json => println!("{}", render_json(diagnostic)?),
        }
        if diagnostic.severity >= Severity::Normal {
            failing += 1;
        }
    }

    if failing > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
