//! Error types for section splitting.

use source_map::Span;
use std::fmt;

/// A problem found while splitting a component file.
///
/// These never abort splitting; they are collected on [`crate::Sections`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// The span where the error occurred.
    pub span: Span,
    /// The error code.
    pub code: ErrorCode,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, span: Span, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            span,
            code,
        }
    }

    /// A block whose closing tag is missing.
    pub fn unclosed_block(tag: &str, span: Span) -> Self {
        Self::new(
            format!("Element is missing end tag: <{}>", tag),
            span,
            ErrorCode::UnclosedBlock,
        )
    }

    /// A start tag cut off by the end of the file.
    pub fn unterminated_tag(tag: &str, span: Span) -> Self {
        Self::new(
            format!("Unterminated start tag: <{}", tag),
            span,
            ErrorCode::UnterminatedTag,
        )
    }

    /// A second block of a kind that may only appear once.
    pub fn duplicate_block(block: &str, span: Span) -> Self {
        Self::new(
            format!("Duplicate <{}> block; only the first one is used", block),
            span,
            ErrorCode::DuplicateBlock,
        )
    }

    /// A comment without `-->`.
    pub fn unterminated_comment(span: Span) -> Self {
        Self::new("Unterminated comment", span, ErrorCode::UnterminatedComment)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Error codes for categorizing parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCode {
    /// Block without closing tag.
    UnclosedBlock,
    /// Start tag without `>`.
    UnterminatedTag,
    /// Duplicate block (e.g., two <template> blocks).
    DuplicateBlock,
    /// Comment without `-->`.
    UnterminatedComment,
}

impl ErrorCode {
    /// Get the error code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnclosedBlock => "unclosed-block",
            ErrorCode::UnterminatedTag => "unterminated-tag",
            ErrorCode::DuplicateBlock => "duplicate-block",
            ErrorCode::UnterminatedComment => "unterminated-comment",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
