//! Output formatting for diagnostics.

use crate::cli::OutputFormat;
use crate::orchestrator::CheckResult;
use camino::Utf8Path;
use serde::Serialize;
use source_map::LineIndex;
use ts_runner::{TsDiagnostic, TsSeverity};
use vue_diagnostics::{Diagnostic, Severity};

/// One reported problem, in 1-based line and column coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
    pub severity: &'static str,
    pub code: String,
    pub message: String,
}

impl Report {
    pub fn from_diagnostic(file: &Utf8Path, lines: &LineIndex, diagnostic: &Diagnostic) -> Self {
        let position = lines.line_col(diagnostic.span.start);
        Self {
            file: Some(file.to_string()),
            line: position.line + 1,
            column: position.col + 1,
            severity: diagnostic.severity.as_str(),
            code: diagnostic.code.to_string(),
            message: diagnostic.message.clone(),
        }
    }

    pub fn from_type_check(diagnostic: &TsDiagnostic) -> Self {
        Self {
            file: diagnostic.file.as_ref().map(|f| f.display().to_string()),
            line: diagnostic.line.unwrap_or(0),
            column: diagnostic.column.unwrap_or(0),
            severity: match diagnostic.severity {
                TsSeverity::Error => Severity::Error.as_str(),
                TsSeverity::Warning => Severity::Warning.as_str(),
                TsSeverity::Suggestion | TsSeverity::Message => Severity::Hint.as_str(),
            },
            code: format!("TS{}", diagnostic.code),
            message: diagnostic.message.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error.as_str()
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning.as_str()
    }
}

/// Formatter for diagnostic output.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn print(&self, report: &Report) {
        println!("{}", self.format_report(report));
    }

    pub fn format_report(&self, report: &Report) -> String {
        match self.format {
            OutputFormat::Human => format_human(report),
            OutputFormat::Json => serde_json::json!({ "type": "diagnostic", "diagnostic": report }).to_string(),
            OutputFormat::Machine => format_machine(report),
        }
    }

    pub fn print_summary(&self, result: &CheckResult) {
        match self.format {
            OutputFormat::Human => print_summary_human(result),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "type": "summary",
                    "files": result.file_count,
                    "errors": result.error_count,
                    "warnings": result.warning_count,
                    "duration_ms": result.duration_ms
                });
                println!("{}", json);
            }
            // No summary for machine format
            OutputFormat::Machine => {}
        }
    }
}

fn location(report: &Report) -> String {
    match &report.file {
        Some(file) if report.line > 0 => format!("{}:{}:{}", file, report.line, report.column),
        Some(file) => file.clone(),
        None => "unknown".to_string(),
    }
}

fn format_human(report: &Report) -> String {
    let severity = match report.severity {
        "error" => "\x1b[31merror\x1b[0m",
        "warning" => "\x1b[33mwarning\x1b[0m",
        _ => "\x1b[34mhint\x1b[0m",
    };
    format!("{}: {} {}: {}", location(report), severity, report.code, report.message)
}

fn format_machine(report: &Report) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}",
        report.file.as_deref().unwrap_or("unknown"),
        report.line,
        report.column,
        report.severity,
        report.code,
        report.message.replace(':', "\\:")
    )
}

fn print_summary_human(result: &CheckResult) {
    println!();
    if result.error_count == 0 && result.warning_count == 0 {
        println!(
            "\x1b[32m✓\x1b[0m No issues found in {} files ({}ms)",
            result.file_count, result.duration_ms
        );
        return;
    }
    if result.error_count > 0 {
        println!(
            "\x1b[31m✗\x1b[0m Found {} error{} in {} files",
            result.error_count,
            if result.error_count == 1 { "" } else { "s" },
            result.file_count
        );
    }
    if result.warning_count > 0 {
        println!(
            "\x1b[33m⚠\x1b[0m Found {} warning{}",
            result.warning_count,
            if result.warning_count == 1 { "" } else { "s" }
        );
    }
    println!("Time: {}ms", result.duration_ms);
}
