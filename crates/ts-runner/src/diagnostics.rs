//! TypeScript diagnostics parsing and remapping.

use serde::{Deserialize, Serialize};
use source_map::{LineCol, LineIndex, OffsetMap, PositionMapper};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A collection of TypeScript diagnostics.
#[derive(Debug, Clone, Default)]
pub struct TsDiagnostics {
    /// All diagnostics.
    pub diagnostics: Vec<TsDiagnostic>,
    /// Total error count.
    pub error_count: usize,
    /// Total warning count.
    pub warning_count: usize,
}

impl TsDiagnostics {
    /// Create a new empty diagnostics collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: TsDiagnostic) {
        match diagnostic.severity {
            TsSeverity::Error => self.error_count += 1,
            TsSeverity::Warning => self.warning_count += 1,
            _ => {}
        }
        self.diagnostics.push(diagnostic);
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Sort diagnostics by file and line.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.file
                .is_none()
                .cmp(&b.file.is_none())
                .then_with(|| a.file.cmp(&b.file))
                .then(a.line.cmp(&b.line))
                .then(a.column.cmp(&b.column))
        });
    }

    fn recount(&mut self) {
        self.error_count = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == TsSeverity::Error)
            .count();
        self.warning_count = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == TsSeverity::Warning)
            .count();
    }
}

/// A single TypeScript diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsDiagnostic {
    /// The diagnostic message.
    pub message: String,
    /// The TypeScript error code.
    pub code: u32,
    /// The severity.
    pub severity: TsSeverity,
    /// The file path (if any).
    pub file: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: Option<u32>,
    /// Column number (1-indexed).
    pub column: Option<u32>,
    /// End line (1-indexed).
    pub end_line: Option<u32>,
    /// End column (1-indexed).
    pub end_column: Option<u32>,
}

impl TsDiagnostic {
    /// Format the diagnostic for display.
    pub fn format(&self) -> String {
        let mut result = String::new();

        if let Some(file) = &self.file {
            result.push_str(&file.to_string_lossy());
            if let (Some(line), Some(col)) = (self.line, self.column) {
                result.push_str(&format!(":{}:{}", line, col));
            }
            result.push_str(" - ");
        }

        result.push_str(&format!("{} TS{}: ", self.severity.as_str(), self.code));
        result.push_str(&self.message);
        result
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TsSeverity {
    /// Error.
    #[default]
    Error,
    /// Warning.
    Warning,
    /// Suggestion.
    Suggestion,
    /// Message.
    Message,
}

impl TsSeverity {
    /// Get the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Suggestion => "suggestion",
            Self::Message => "message",
        }
    }
}

/// A registered synthetic document.
#[derive(Debug)]
struct Registration {
    original: PathBuf,
    map: OffsetMap,
    original_lines: LineIndex,
    synthetic_lines: LineIndex,
}

/// Translates diagnostics on synthetic documents back to component files.
#[derive(Debug, Default)]
pub struct DiagnosticRemapper {
    files: HashMap<PathBuf, Registration>,
}

impl DiagnosticRemapper {
    /// Create a new remapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synthetic document written to `virtual_file`.
    pub fn register(
        &mut self,
        virtual_file: PathBuf,
        original_file: PathBuf,
        map: OffsetMap,
        original_text: &str,
        synthetic_text: &str,
    ) {
        self.files.insert(
            virtual_file,
            Registration {
                original: original_file,
                map,
                original_lines: LineIndex::new(original_text),
                synthetic_lines: LineIndex::new(synthetic_text),
            },
        );
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no document is registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remap a diagnostic in place. Returns `false` when it lands in a
    /// synthetic region with no counterpart in the original file.
    pub fn remap(&self, diagnostic: &mut TsDiagnostic) -> bool {
        let Some(file) = &diagnostic.file else {
            return true;
        };
        let Some(registration) = self.files.get(file) else {
            return true;
        };
        let mapper = PositionMapper::new(
            &registration.map,
            &registration.original_lines,
            &registration.synthetic_lines,
        );

        let (Some(line), Some(column)) = (diagnostic.line, diagnostic.column) else {
            // File-level diagnostics stay file-level.
            diagnostic.file = Some(registration.original.clone());
            return true;
        };
        let start = to_line_col(line, column);
        let reported_end = diagnostic
            .end_line
            .zip(diagnostic.end_column)
            .map(|(end_line, end_column)| to_line_col(end_line, end_column));
        // Without an end, the rest of the line stands in for the range.
        let lines = &registration.synthetic_lines;
        let reach = match reported_end {
            Some(end) => Some(end),
            None => lines
                .line_start(start.line)
                .zip(lines.line_end(start.line))
                .map(|(line_start, line_end)| LineCol::new(start.line, line_end - line_start)),
        };
        // Ranges starting in generated code keep their mapped part.
        let Some((start, end)) = reach.and_then(|reach| mapper.clamp_to_original(start, reach))
        else {
            return false;
        };
        let end = reported_end.map(|_| end);

        diagnostic.file = Some(registration.original.clone());
        diagnostic.line = Some(start.line + 1);
        diagnostic.column = Some(start.col + 1);
        diagnostic.end_line = end.map(|e| e.line + 1);
        diagnostic.end_column = end.map(|e| e.col + 1);
        true
    }

    /// Remap all diagnostics, dropping those with no original position.
    pub fn remap_all(&self, diagnostics: &mut TsDiagnostics) {
        diagnostics.diagnostics.retain_mut(|d| self.remap(d));
        diagnostics.recount();
    }
}

fn to_line_col(line: u32, column: u32) -> LineCol {
    LineCol::new(line.saturating_sub(1), column.saturating_sub(1))
}

/// Parse TypeScript compiler output.
pub fn parse_ts_output(output: &str) -> Vec<TsDiagnostic> {
    if let Ok(parsed) = serde_json::from_str::<Vec<TsDiagnosticJson>>(output) {
        return parsed.into_iter().map(TsDiagnostic::from).collect();
    }

    let mut diagnostics: Vec<TsDiagnostic> = Vec::new();
    for line in output.lines() {
        if let Some(diag) = parse_tsc_line(line) {
            diagnostics.push(diag);
        } else if line.starts_with("  ") && !line.trim().is_empty() {
            // Continuation of a multi-line message.
            if let Some(last) = diagnostics.last_mut() {
                last.message.push('\n');
                last.message.push_str(line.trim_end());
            }
        }
    }
    diagnostics
}

/// JSON format for TypeScript diagnostics.
#[derive(Debug, Deserialize)]
struct TsDiagnosticJson {
    #[serde(rename = "messageText")]
    message_text: StringOrNested,
    code: u32,
    category: u32,
    #[serde(rename = "fileName")]
    file_name: Option<String>,
    start: Option<Location>,
    end: Option<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrNested {
    String(String),
    Nested {
        #[serde(rename = "messageText")]
        message_text: String,
    },
}

impl StringOrNested {
    fn as_str(&self) -> &str {
        match self {
            Self::String(s) => s,
            Self::Nested { message_text } => message_text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Location {
    line: u32,
    character: u32,
}

impl From<TsDiagnosticJson> for TsDiagnostic {
    fn from(json: TsDiagnosticJson) -> Self {
        Self {
            message: json.message_text.as_str().to_string(),
            code: json.code,
            severity: match json.category {
                1 => TsSeverity::Error,
                0 => TsSeverity::Warning,
                2 => TsSeverity::Suggestion,
                _ => TsSeverity::Message,
            },
            file: json.file_name.map(PathBuf::from),
            line: json.start.as_ref().map(|l| l.line + 1),
            column: json.start.as_ref().map(|l| l.character + 1),
            end_line: json.end.as_ref().map(|l| l.line + 1),
            end_column: json.end.as_ref().map(|l| l.character + 1),
        }
    }
}

/// Parse a single line of tsc output.
///
/// Format: `file(line,col): severity TScode: message`.
fn parse_tsc_line(line: &str) -> Option<TsDiagnostic> {
    let line = line.trim_end();
    if line.is_empty() || line.starts_with(' ') {
        return None;
    }

    let marker = line.find("): ")?;
    let paren_start = line[..marker].rfind('(')?;
    let file = &line[..paren_start];
    let position = &line[paren_start + 1..marker];
    let rest = line[marker + 3..].trim();

    let mut pos_parts = position.split(',');
    let line_num: u32 = pos_parts.next()?.trim().parse().ok()?;
    let col_num: u32 = pos_parts.next()?.trim().parse().ok()?;

    let (severity_str, rest) = rest.split_once(' ')?;
    let rest = rest.strip_prefix("TS")?;
    let (code, message) = rest.split_once(':')?;
    let code: u32 = code.parse().ok()?;

    let severity = match severity_str {
        "error" => TsSeverity::Error,
        "warning" => TsSeverity::Warning,
        _ => TsSeverity::Message,
    };

    Some(TsDiagnostic {
        message: message.trim().to_string(),
        code,
        severity,
        file: Some(PathBuf::from(file)),
        line: Some(line_num),
        column: Some(col_num),
        end_line: None,
        end_column: None,
    })
}
