//! Common types and utilities for the vigil PHP analyzer.
//!
//! This crate provides foundational types used across all vigil crates:
//! - String interning (`Atom`, `Interner`)
//! - The diagnostic model (`Diagnostic`, `DiagnosticSink`, issue templates)
//! - Centralized limits and thresholds
//! - Analysis options (runtime toggles consumed by the type algebra)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Diagnostic model - issue codes, severities, sink
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCollector, DiagnosticSink, IssueTemplate, Severity, format_message,
};

// Centralized limits and thresholds
pub mod limits;

// Analysis options
pub mod options;
pub use options::AnalysisOptions;
