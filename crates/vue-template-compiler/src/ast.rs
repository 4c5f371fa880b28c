//! AST types for templates.
//!
//! All spans are absolute offsets into the component file, not into the
//! template content, so compiled output can be mapped straight back.

use smol_str::SmolStr;
use source_map::Span;

/// The root of a parsed template.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateAst {
    /// Child nodes of the template.
    pub children: Vec<TemplateNode>,
    /// Source span of the entire template content.
    pub span: Span,
}

impl TemplateAst {
    /// Create a template AST with children.
    pub fn with_children(children: Vec<TemplateNode>, span: Span) -> Self {
        Self { children, span }
    }

    /// Visit every element in document order.
    pub fn walk_elements<'a>(&'a self, f: &mut impl FnMut(&'a ElementNode)) {
        fn walk<'a>(nodes: &'a [TemplateNode], f: &mut impl FnMut(&'a ElementNode)) {
            for node in nodes {
                match node {
                    TemplateNode::Element(el) => {
                        f(el);
                        walk(&el.children, f);
                    }
                    TemplateNode::If(if_node) => {
                        for branch in &if_node.branches {
                            f(&branch.element);
                            walk(&branch.element.children, f);
                        }
                    }
                    _ => {}
                }
            }
        }
        walk(&self.children, f);
    }
}

/// A node in the template AST.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemplateNode {
    /// An element (HTML or component).
    Element(ElementNode),
    /// A text node.
    Text(TextNode),
    /// An interpolation ({{ expr }}).
    Interpolation(InterpolationNode),
    /// A comment.
    Comment(CommentNode),
    /// A chain of sibling elements carrying v-if/v-else-if/v-else.
    If(IfNode),
}

impl TemplateNode {
    /// Get the span of this node.
    pub fn span(&self) -> Span {
        match self {
            Self::Element(n) => n.span,
            Self::Text(n) => n.span,
            Self::Interpolation(n) => n.span,
            Self::Comment(n) => n.span,
            Self::If(n) => n.span,
        }
    }
}

/// An element node (HTML element or component).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementNode {
    /// The tag name.
    pub tag: SmolStr,
    /// Whether this looks like a component (PascalCase or dashed).
    pub is_component: bool,
    /// Static attributes.
    pub attrs: Vec<Attribute>,
    /// Directives, including the `:`/`@`/`#` shorthands, in source order.
    pub directives: Vec<Directive>,
    /// Parsed v-for expression, when the element has a valid one.
    pub v_for: Option<ForExpression>,
    /// Child nodes.
    pub children: Vec<TemplateNode>,
    /// Self-closing tag.
    pub self_closing: bool,
    /// Whether a matching end tag was found (always true for void elements).
    pub closed: bool,
    /// Source span.
    pub span: Span,
    /// Span of the tag name.
    pub tag_span: Span,
    /// Span of the start tag from `<` up to its closing `>` or `/>`,
    /// which is not included.
    pub start_tag: Span,
}

impl ElementNode {
    /// Check if this element has a specific directive.
    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d.name == name)
    }

    /// Get a directive by name.
    pub fn get_directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }

    /// Get a static attribute by name.
    pub fn get_attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Spans of attribute values and dynamic arguments in the start tag.
    pub fn value_spans(&self) -> Vec<Span> {
        let mut spans: Vec<Span> = self
            .attrs
            .iter()
            .filter_map(|a| a.value.as_ref().map(|v| v.span))
            .chain(self.directives.iter().flat_map(|d| {
                let arg = match &d.arg {
                    Some(DirectiveArg::Dynamic(e)) => Some(e.span),
                    _ => None,
                };
                arg.into_iter().chain(d.value.as_ref().map(|v| v.span))
            }))
            .collect();
        spans.sort_by_key(|s| s.start);
        spans
    }

    /// The conditional directive carried by this element, if any.
    pub fn branch_directive(&self) -> Option<(IfBranchType, &Directive)> {
        self.directives.iter().find_map(|d| {
            let kind = match d.name.as_str() {
                "if" => IfBranchType::If,
                "else-if" => IfBranchType::ElseIf,
                "else" => IfBranchType::Else,
                _ => return None,
            };
            Some((kind, d))
        })
    }
}

/// A static attribute.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    /// Attribute name.
    pub name: SmolStr,
    /// Attribute value, when present.
    pub value: Option<Expression>,
    /// Source span.
    pub span: Span,
}

/// A directive (v-*, :, @, #).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Directive {
    /// Directive name (without v- prefix); shorthands are normalized to
    /// `bind`, `on` and `slot`.
    pub name: SmolStr,
    /// Directive argument (e.g., v-bind:arg).
    pub arg: Option<DirectiveArg>,
    /// Modifiers (e.g., .prevent, .stop).
    pub modifiers: Vec<SmolStr>,
    /// Expression value.
    pub value: Option<Expression>,
    /// Source span.
    pub span: Span,
}

impl Directive {
    /// Check if this is a v-slot directive.
    pub fn is_slot(&self) -> bool {
        self.name == "slot"
    }

    /// The static argument, if the directive has one.
    pub fn static_arg(&self) -> Option<&str> {
        self.arg.as_ref().and_then(DirectiveArg::as_static)
    }
}

/// A directive argument.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectiveArg {
    /// Static argument (e.g., v-bind:foo).
    Static(SmolStr, Span),
    /// Dynamic argument (e.g., v-bind:[foo]).
    Dynamic(Expression),
}

impl DirectiveArg {
    /// Get the argument as a static string, if it is one.
    pub fn as_static(&self) -> Option<&str> {
        match self {
            Self::Static(s, _) => Some(s.as_str()),
            Self::Dynamic(_) => None,
        }
    }
}

/// A text node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextNode {
    /// Source span.
    pub span: Span,
}

/// An interpolation node ({{ expr }}).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpolationNode {
    /// The expression.
    pub expression: Expression,
    /// Source span.
    pub span: Span,
}

/// A comment node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommentNode {
    /// Source span.
    pub span: Span,
}

/// A conditional chain (v-if/v-else-if/v-else).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IfNode {
    /// Branches of the conditional.
    pub branches: Vec<IfBranch>,
    /// Source span.
    pub span: Span,
}

/// A branch in a conditional.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IfBranch {
    /// The branch type.
    pub branch_type: IfBranchType,
    /// The element carrying the branch directive.
    pub element: ElementNode,
}

impl IfBranch {
    /// The condition (None for v-else).
    pub fn condition(&self) -> Option<&Expression> {
        self.element
            .branch_directive()
            .and_then(|(_, d)| d.value.as_ref())
    }
}

/// Type of if branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IfBranchType {
    /// v-if
    If,
    /// v-else-if
    ElseIf,
    /// v-else
    Else,
}

/// A parsed v-for value: `alias in source` or `(a, b, c) of source`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForExpression {
    /// Value, key and index aliases, in order. Patterns are kept verbatim.
    pub aliases: Vec<Expression>,
    /// The iterated expression.
    pub source: Expression,
}

/// A script expression embedded in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    /// The raw expression text, exactly as written.
    pub content: String,
    /// Absolute span of `content`.
    pub span: Span,
}

impl Expression {
    /// Create a new expression.
    pub fn new(content: impl Into<String>, span: Span) -> Self {
        Self {
            content: content.into(),
            span,
        }
    }

    /// Build an expression from `raw` at `offset`, dropping surrounding
    /// whitespace while keeping the span exact.
    pub fn trimmed(raw: &str, offset: u32) -> Self {
        let leading = raw.len() - raw.trim_start().len();
        let content = raw.trim();
        let start = offset + leading as u32;
        Self::new(content, Span::new(start, start + content.len() as u32))
    }

    /// Whether the expression has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Element types for categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// Native HTML element.
    Element,
    /// Component.
    Component,
    /// Built-in element (slot, template, etc.).
    Builtin,
}

/// Determine the element type from a tag name.
pub fn get_element_type(tag: &str) -> ElementType {
    if matches!(
        tag,
        "template"
            | "slot"
            | "component"
            | "keep-alive"
            | "transition"
            | "transition-group"
            | "router-view"
            | "router-link"
    ) {
        return ElementType::Builtin;
    }

    // Components are PascalCase or have dashes
    if tag.chars().next().is_some_and(|c| c.is_uppercase()) || tag.contains('-') {
        return ElementType::Component;
    }

    ElementType::Element
}
