//! Command-line driver for the vigil PHP analyzer.
//!
//! Consumes `.ast.json` trees produced by an external parser, runs the
//! declaration pass over every file and then the inference pass, and
//! prints the collected diagnostics as colored text or JSON lines.

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use vigil_ast::SourceTree;
use vigil_checker::{Plugin, analyze_file, declare_file};
use vigil_common::diagnostics::{Diagnostic, DiagnosticCollector, Severity};
use vigil_common::AnalysisOptions;
use vigil_solver::CodeBase;
use walkdir::WalkDir;

/// Collect `.ast.json` files from the given files and directories.
pub fn collect_tree_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_file() {
            found.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.file_type().is_file()
                && entry.path().to_string_lossy().ends_with(".ast.json")
            {
                found.push(entry.path().to_path_buf());
            }
        }
    }
    found
}

/// Load one serialized tree.
pub fn load_tree(path: &Path) -> Result<SourceTree> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading tree file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing tree file {}", path.display()))
}

/// Run both passes over the given tree files and return the collected
/// diagnostics.
pub fn analyze_paths(paths: &[PathBuf], options: &AnalysisOptions) -> Result<Vec<Diagnostic>> {
    let trees: Vec<SourceTree> = paths.iter().map(|p| load_tree(p)).collect::<Result<_>>()?;
    info!(files = trees.len(), "loaded syntax trees");

    let mut codebase = CodeBase::new();
    let mut sink = DiagnosticCollector::new();
    let plugins: Vec<Box<dyn Plugin>> = Vec::new();

    for tree in &trees {
        declare_file(&mut codebase, tree, &mut sink, &plugins);
    }
    for tree in &trees {
        analyze_file(&codebase, tree, options, &mut sink, &plugins);
    }
    Ok(sink.into_diagnostics())
}

/// One severity-tinted line per diagnostic.
pub fn render_text(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Severity::Critical => "critical".red().bold(),
        Severity::Normal => "normal".yellow(),
        Severity::Low => "low".dimmed(),
    };
    format!(
        "{}:{} {} {} {}",
        diagnostic.file,
        diagnostic.line,
        severity,
        diagnostic.name.bold(),
        diagnostic.rendered()
    )
}

/// One JSON object per line, machine-readable.
pub fn render_json(diagnostic: &Diagnostic) -> Result<String> {
    serde_json::to_string(diagnostic).context("serializing diagnostic")
}
