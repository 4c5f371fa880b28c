//! Diagnostics for class components.
//!
//! Every problem the workspace reports about a component file, whether it
//! comes from splitting, template compilation, script analysis, the
//! dependency graph or the type checker, is expressed as a [`Diagnostic`]
//! with a span in the original file.

pub mod component;
pub mod template;

use source_map::Span;
use std::fmt;
use vue_codegen::ScriptError;
use vue_parser::ParseError;
use vue_template_compiler::CompileError;

pub use component::{check_component_usages, check_sections, check_script};
pub use template::check_template;

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The diagnostic message.
    pub message: String,
    /// The span where the diagnostic applies.
    pub span: Span,
    /// The severity level.
    pub severity: Severity,
    /// The diagnostic code.
    pub code: DiagnosticCode,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>, span: Span, code: DiagnosticCode) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Error,
            code,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span, code: DiagnosticCode) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Warning,
            code,
        }
    }

    /// Create a new hint diagnostic.
    pub fn hint(message: impl Into<String>, span: Span, code: DiagnosticCode) -> Self {
        Self {
            message: message.into(),
            span,
            severity: Severity::Hint,
            code,
        }
    }

    /// A parent edge that would close an inheritance cycle.
    pub fn inheritance_cycle(path: &str, span: Span) -> Self {
        Self::error(
            format!("Inheritance cycle: '{}' already extends this component", path),
            span,
            DiagnosticCode::InheritanceCycle,
        )
    }

    /// A base component that could not be found.
    pub fn unresolved_base(specifier: &str, span: Span) -> Self {
        Self::warning(
            format!("Cannot resolve base component '{}'", specifier),
            span,
            DiagnosticCode::UnresolvedBase,
        )
    }

    /// A registered component whose module could not be found.
    pub fn unresolved_component(name: &str, specifier: &str, span: Span) -> Self {
        Self::warning(
            format!("Cannot resolve component '{}' from '{}'", name, specifier),
            span,
            DiagnosticCode::UnresolvedComponent,
        )
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Self::error(err.message.clone(), err.span, DiagnosticCode::SectionParse)
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(err: &CompileError) -> Self {
        Self::error(err.message.clone(), err.span, DiagnosticCode::TemplateSyntax)
    }
}

impl From<&ScriptError> for Diagnostic {
    fn from(err: &ScriptError) -> Self {
        Self::error(err.message.clone(), err.span, DiagnosticCode::ScriptSyntax)
    }
}

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// An error that should block type checking.
    Error,
    /// A warning that indicates a potential issue.
    Warning,
    /// A hint for improvement.
    Hint,
}

impl Severity {
    /// Get the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        }
    }
}

/// Diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Malformed top-level block structure.
    SectionParse,
    /// Malformed template markup or directive.
    TemplateSyntax,
    /// Script section that does not parse.
    ScriptSyntax,
    /// `v-model` on an element that cannot carry it.
    InvalidVModel,
    /// Parent edge rejected because it would close a cycle.
    InheritanceCycle,
    /// Base component that cannot be resolved.
    UnresolvedBase,
    /// Registered component that cannot be resolved.
    UnresolvedComponent,
    /// Template tag that is neither an element nor a registered component.
    UnknownComponent,
    /// Diagnostic reported by the type checker, with its numeric code.
    TypeCheck(u32),
}

impl DiagnosticCode {
    /// Get the code as a string. Type checker codes share one name; use
    /// `Display` for the numbered form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SectionParse => "section-parse",
            Self::TemplateSyntax => "template-syntax",
            Self::ScriptSyntax => "script-syntax",
            Self::InvalidVModel => "invalid-v-model",
            Self::InheritanceCycle => "inheritance-cycle",
            Self::UnresolvedBase => "unresolved-base",
            Self::UnresolvedComponent => "unresolved-component",
            Self::UnknownComponent => "unknown-component",
            Self::TypeCheck(_) => "type-check",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeCheck(code) => write!(f, "TS{}", code),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Options for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticOptions {
    /// Warn about component tags that are not registered.
    pub check_unknown_components: bool,
    /// Tag names accepted everywhere in addition to registered ones.
    pub known_components: Vec<String>,
}

/// Sort diagnostics by position, then severity.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.span.start, a.span.end, a.severity).cmp(&(b.span.start, b.span.end, b.severity))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vue_parser::split_sections;

    #[test]
    fn test_parse_error_becomes_diagnostic() {
        let sections = split_sections("<template><div></div>");
        let diagnostics = check_sections(&sections);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::SectionParse);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_type_check_code_display() {
        assert_eq!(DiagnosticCode::TypeCheck(2339).to_string(), "TS2339");
        assert_eq!(DiagnosticCode::UnresolvedBase.to_string(), "unresolved-base");
    }

    #[test]
    fn test_sort_diagnostics() {
        let mut diagnostics = vec![
            Diagnostic::hint("b", Span::new(10, 12), DiagnosticCode::UnknownComponent),
            Diagnostic::error("a", Span::new(2, 4), DiagnosticCode::ScriptSyntax),
            Diagnostic::warning("c", Span::new(10, 12), DiagnosticCode::UnresolvedBase),
        ];
        sort_diagnostics(&mut diagnostics);
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "c", "b"]);
    }
}
