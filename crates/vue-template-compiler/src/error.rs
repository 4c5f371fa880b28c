//! Error types for template compilation.

use source_map::Span;
use std::fmt;

/// A problem found while parsing or compiling a template.
///
/// Template problems never abort compilation; they travel next to the
/// partial output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// The span where the error occurred.
    pub span: Span,
    /// The error code.
    pub code: CompileErrorCode,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(message: impl Into<String>, span: Span, code: CompileErrorCode) -> Self {
        Self {
            message: message.into(),
            span,
            code,
        }
    }

    /// An element whose end tag never came.
    pub fn unclosed_element(tag: &str, span: Span) -> Self {
        Self::new(
            format!("Element is missing end tag: <{}>", tag),
            span,
            CompileErrorCode::UnclosedElement,
        )
    }

    /// An end tag that closes nothing.
    pub fn stray_end_tag(tag: &str, span: Span) -> Self {
        Self::new(
            format!("Invalid end tag: </{}>", tag),
            span,
            CompileErrorCode::InvalidEndTag,
        )
    }

    /// `{{` without `}}`.
    pub fn unterminated_interpolation(span: Span) -> Self {
        Self::new(
            "Interpolation is missing closing '}}'",
            span,
            CompileErrorCode::UnterminatedInterpolation,
        )
    }

    /// An attribute value with a missing closing quote.
    pub fn unterminated_attribute(span: Span) -> Self {
        Self::new(
            "Attribute value is missing its closing quote",
            span,
            CompileErrorCode::UnterminatedAttribute,
        )
    }

    /// A v-for value that does not read `alias in source`.
    pub fn invalid_v_for(value: &str, span: Span) -> Self {
        Self::new(
            format!("Invalid v-for expression: {}", value),
            span,
            CompileErrorCode::InvalidVFor,
        )
    }

    /// v-else / v-else-if without an adjacent v-if.
    pub fn orphan_else(directive: &str, span: Span) -> Self {
        Self::new(
            format!("v-{} has no adjacent v-if or v-else-if", directive),
            span,
            CompileErrorCode::MissingIf,
        )
    }

    /// A directive that requires a value but has none.
    pub fn missing_value(directive: &str, span: Span) -> Self {
        Self::new(
            format!("v-{} is missing expression", directive),
            span,
            CompileErrorCode::MissingExpression,
        )
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// Error codes for template compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompileErrorCode {
    /// Unclosed element.
    UnclosedElement,
    /// End tag without an open element.
    InvalidEndTag,
    /// Unterminated `{{`.
    UnterminatedInterpolation,
    /// Unterminated quoted attribute value.
    UnterminatedAttribute,
    /// Invalid v-for syntax.
    InvalidVFor,
    /// v-else without v-if.
    MissingIf,
    /// Directive without its required expression.
    MissingExpression,
}

impl CompileErrorCode {
    /// Get the error code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnclosedElement => "unclosed-element",
            Self::InvalidEndTag => "invalid-end-tag",
            Self::UnterminatedInterpolation => "unterminated-interpolation",
            Self::UnterminatedAttribute => "unterminated-attribute",
            Self::InvalidVFor => "invalid-v-for",
            Self::MissingIf => "missing-v-if",
            Self::MissingExpression => "missing-expression",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
