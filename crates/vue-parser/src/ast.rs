//! Section types for component files.

use crate::error::ParseError;
use smol_str::SmolStr;
use source_map::Span;

/// The top-level regions of a component file.
///
/// Blocks only carry spans into the original text; the text itself stays
/// with whoever owns the document.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sections {
    /// Length of the split document.
    pub len: u32,
    /// The template block, if present.
    pub template: Option<TemplateBlock>,
    /// The script block, if present.
    pub script: Option<ScriptBlock>,
    /// All style blocks.
    pub styles: Vec<StyleBlock>,
    /// Custom blocks (e.g., <i18n>, <docs>).
    pub custom_blocks: Vec<CustomBlock>,
    /// Comments found at the root level.
    pub comments: Vec<Comment>,
    /// Problems found while splitting. Splitting never fails as a whole.
    pub errors: Vec<ParseError>,
}

impl Sections {
    /// Create an empty set of sections for a document of `len` bytes.
    pub fn new(len: u32) -> Self {
        Self {
            len,
            ..Default::default()
        }
    }

    /// Get the script language (ts, tsx, js, jsx).
    pub fn script_lang(&self) -> ScriptLang {
        self.script
            .as_ref()
            .and_then(|s| s.lang.as_deref())
            .and_then(ScriptLang::parse)
            .unwrap_or_default()
    }

    /// Check if the script uses TypeScript.
    pub fn is_typescript(&self) -> bool {
        self.script_lang().is_typescript()
    }

    /// Content spans of the composed sections, in document order.
    pub fn section_spans(&self) -> Vec<(SectionKind, Span)> {
        let mut spans = Vec::new();
        if let Some(template) = &self.template {
            spans.push((SectionKind::Template, template.content_span));
        }
        if let Some(script) = &self.script {
            spans.push((SectionKind::Script, script.content_span));
        }
        for style in &self.styles {
            spans.push((SectionKind::Style, style.content_span));
        }
        spans.sort_by_key(|(_, span)| span.start);
        spans
    }

    /// Tile the document into ordered segments: section contents and the
    /// untouched bytes between them. Concatenating the segments' text
    /// reproduces the document.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut cursor = 0;
        for (kind, span) in self.section_spans() {
            if span.start > cursor {
                segments.push(Segment {
                    kind: None,
                    span: Span::new(cursor, span.start),
                });
            }
            segments.push(Segment {
                kind: Some(kind),
                span,
            });
            cursor = span.end;
        }
        if cursor < self.len {
            segments.push(Segment {
                kind: None,
                span: Span::new(cursor, self.len),
            });
        }
        segments
    }

    /// The section whose content contains `offset`.
    pub fn section_at(&self, offset: u32) -> Option<SectionKind> {
        self.section_spans()
            .into_iter()
            .find(|(_, span)| span.contains_offset(offset) || span.end == offset)
            .map(|(kind, _)| kind)
    }
}

/// Which section a region belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionKind {
    /// The markup template.
    Template,
    /// The class-based script.
    Script,
    /// A style block.
    Style,
}

/// One tile of a split document. `kind` is `None` for untouched bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Section kind, or `None` for the bytes between sections.
    pub kind: Option<SectionKind>,
    /// Covered range.
    pub span: Span,
}

/// A block in the file with common properties.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SfcBlock {
    /// The span of the entire block including tags.
    pub span: Span,
    /// The span of the content only (excluding tags).
    pub content_span: Span,
    /// Block attributes.
    pub attrs: Vec<BlockAttr>,
    /// Whether the closing tag was found.
    pub closed: bool,
}

impl SfcBlock {
    /// Slice the block content out of the document text.
    pub fn content<'s>(&self, source: &'s str) -> &'s str {
        self.content_span.slice(source).unwrap_or("")
    }

    /// Get an attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(|a| a.value.as_deref())
    }

    /// Check if an attribute exists (for boolean attributes).
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// An attribute on a block tag.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockAttr {
    /// The attribute name.
    pub name: SmolStr,
    /// The attribute value (None for boolean attributes).
    pub value: Option<String>,
    /// The span of the attribute.
    pub span: Span,
    /// The span of the value (if present).
    pub value_span: Option<Span>,
}

impl BlockAttr {
    /// Create a new boolean attribute.
    pub fn boolean(name: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            name: name.into(),
            value: None,
            span,
            value_span: None,
        }
    }

    /// Create a new attribute with a value.
    pub fn with_value(
        name: impl Into<SmolStr>,
        value: impl Into<String>,
        span: Span,
        value_span: Span,
    ) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            span,
            value_span: Some(value_span),
        }
    }
}

/// The template block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateBlock {
    /// Common block properties.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub block: SfcBlock,
    /// The template language (html, pug, etc.).
    pub lang: Option<String>,
}

impl TemplateBlock {
    /// Only plain HTML templates are compiled.
    pub fn is_html(&self) -> bool {
        matches!(self.lang.as_deref(), None | Some("html"))
    }
}

impl std::ops::Deref for TemplateBlock {
    type Target = SfcBlock;
    fn deref(&self) -> &Self::Target {
        &self.block
    }
}

/// The script block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptBlock {
    /// Common block properties.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub block: SfcBlock,
    /// The script language (ts, tsx, js, jsx).
    pub lang: Option<String>,
    /// The src attribute for external scripts.
    pub src: Option<String>,
}

impl std::ops::Deref for ScriptBlock {
    type Target = SfcBlock;
    fn deref(&self) -> &Self::Target {
        &self.block
    }
}

/// A style block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleBlock {
    /// Common block properties.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub block: SfcBlock,
    /// The style language (css, scss, less, etc.).
    pub lang: Option<String>,
    /// Whether this is a scoped style.
    pub scoped: bool,
}

impl std::ops::Deref for StyleBlock {
    type Target = SfcBlock;
    fn deref(&self) -> &Self::Target {
        &self.block
    }
}

/// A custom block (e.g., <i18n>, <docs>).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomBlock {
    /// Common block properties.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub block: SfcBlock,
    /// The block type (tag name).
    pub block_type: SmolStr,
}

impl std::ops::Deref for CustomBlock {
    type Target = SfcBlock;
    fn deref(&self) -> &Self::Target {
        &self.block
    }
}

/// A comment at the root level.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comment {
    /// The span of the comment, delimiters included.
    pub span: Span,
}

/// Script language variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScriptLang {
    /// JavaScript
    #[default]
    Js,
    /// JavaScript with JSX
    Jsx,
    /// TypeScript
    Ts,
    /// TypeScript with JSX
    Tsx,
}

impl ScriptLang {
    /// Parse from a language string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "js" | "javascript" => Some(Self::Js),
            "jsx" => Some(Self::Jsx),
            "ts" | "typescript" => Some(Self::Ts),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    /// Check if this is TypeScript.
    pub fn is_typescript(&self) -> bool {
        matches!(self, Self::Ts | Self::Tsx)
    }
}
