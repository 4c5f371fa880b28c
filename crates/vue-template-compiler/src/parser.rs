//! Tolerant parser for templates.
//!
//! The parser never gives up: unclosed elements, stray end tags and broken
//! directives are recorded as [`CompileError`]s and parsing continues with
//! whatever structure could be recovered.

use crate::ast::*;
use crate::error::CompileError;
use smol_str::SmolStr;
use source_map::Span;

/// A parsed template plus every problem found along the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedTemplate {
    /// The recovered AST.
    pub ast: TemplateAst,
    /// Problems found while parsing.
    pub errors: Vec<CompileError>,
}

/// Parse template content that starts at absolute offset `base` in its file.
pub fn parse_template(source: &str, base: u32) -> ParsedTemplate {
    let mut parser = TemplateParser::new(source, base);
    let (children, _) = parser.parse_children(None);
    let span = Span::new(base, base + source.len() as u32);
    ParsedTemplate {
        ast: TemplateAst::with_children(children, span),
        errors: parser.errors,
    }
}

/// Parser for templates.
struct TemplateParser<'a> {
    source: &'a str,
    pos: usize,
    base: u32,
    errors: Vec<CompileError>,
    /// Tags of the elements currently being parsed, outermost first.
    open_tags: Vec<SmolStr>,
}

impl<'a> TemplateParser<'a> {
    fn new(source: &'a str, base: u32) -> Self {
        Self {
            source,
            pos: 0,
            base,
            errors: Vec::new(),
            open_tags: Vec::new(),
        }
    }

    /// Absolute span for local offsets.
    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.base + start as u32, self.base + end as u32)
    }

    /// Get remaining source.
    fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Check if at end.
    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Peek at next char.
    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume next char.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Check if remaining starts with string.
    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Consume string if it matches.
    fn consume(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Skip whitespace.
    fn skip_whitespace(&mut self) {
        self.read_while(char::is_whitespace);
    }

    /// Read until predicate is false.
    fn read_while<F: Fn(char) -> bool>(&mut self, pred: F) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Whether an element start tag begins here.
    fn at_element_start(&self) -> bool {
        let mut chars = self.remaining().chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    /// Name of the end tag starting here, if any.
    fn peek_end_tag_name(&self) -> Option<&'a str> {
        let rest = self.remaining().strip_prefix("</")?;
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        Some(&rest[..len])
    }

    /// Parse children until the end tag of `end_tag` (not consumed), an end
    /// tag of an enclosing element, or EOF. The flag tells whether the
    /// expected end tag was reached.
    fn parse_children(&mut self, end_tag: Option<&str>) -> (Vec<TemplateNode>, bool) {
        let mut children = Vec::new();

        loop {
            if self.is_eof() {
                return (children, end_tag.is_none());
            }

            if let Some(name) = self.peek_end_tag_name() {
                if end_tag.is_some_and(|tag| tag.eq_ignore_ascii_case(name)) {
                    return (children, true);
                }
                if self.open_tags.iter().any(|t| t.eq_ignore_ascii_case(name)) {
                    return (children, false);
                }
                let start = self.pos;
                self.consume("</");
                self.read_while(|c| c != '>');
                self.consume(">");
                self.errors
                    .push(CompileError::stray_end_tag(name, self.span(start, self.pos)));
                continue;
            }

            if let Some(node) = self.parse_node() {
                self.push_child(&mut children, node);
            }
        }
    }

    /// Append a node, folding v-else-if/v-else elements into the preceding
    /// conditional chain.
    fn push_child(&mut self, children: &mut Vec<TemplateNode>, node: TemplateNode) {
        let TemplateNode::Element(element) = node else {
            children.push(node);
            return;
        };
        let Some((branch_type, directive)) = element.branch_directive() else {
            children.push(TemplateNode::Element(element));
            return;
        };
        let directive_span = directive.span;

        match branch_type {
            // v-for binds tighter than v-if; the element compiles both itself.
            IfBranchType::If if element.v_for.is_some() => {
                children.push(TemplateNode::Element(element));
            }
            IfBranchType::If => {
                let span = element.span;
                children.push(TemplateNode::If(IfNode {
                    branches: vec![IfBranch {
                        branch_type,
                        element,
                    }],
                    span,
                }));
            }
            IfBranchType::ElseIf | IfBranchType::Else => {
                let chain = children.iter_mut().rev().find(|n| {
                    !matches!(n, TemplateNode::Comment(_))
                });
                match chain {
                    Some(TemplateNode::If(if_node))
                        if if_node
                            .branches
                            .last()
                            .is_some_and(|b| b.branch_type != IfBranchType::Else) =>
                    {
                        if_node.span = if_node.span.merge(element.span);
                        if_node.branches.push(IfBranch {
                            branch_type,
                            element,
                        });
                    }
                    _ => {
                        let name = if branch_type == IfBranchType::Else {
                            "else"
                        } else {
                            "else-if"
                        };
                        self.errors
                            .push(CompileError::orphan_else(name, directive_span));
                        let span = element.span;
                        children.push(TemplateNode::If(IfNode {
                            branches: vec![IfBranch {
                                branch_type,
                                element,
                            }],
                            span,
                        }));
                    }
                }
            }
        }
    }

    /// Parse a single node.
    fn parse_node(&mut self) -> Option<TemplateNode> {
        if self.starts_with("<!--") {
            return Some(TemplateNode::Comment(self.parse_comment()));
        }

        if self.at_element_start() {
            return Some(TemplateNode::Element(self.parse_element()));
        }

        if self.starts_with("{{") {
            return self.parse_interpolation().map(TemplateNode::Interpolation);
        }

        self.parse_text().map(TemplateNode::Text)
    }

    /// Parse a comment.
    fn parse_comment(&mut self) -> CommentNode {
        let start = self.pos;
        self.consume("<!--");
        match self.remaining().find("-->") {
            Some(i) => self.pos += i + 3,
            None => self.pos = self.source.len(),
        }
        CommentNode {
            span: self.span(start, self.pos),
        }
    }

    /// Parse an interpolation.
    fn parse_interpolation(&mut self) -> Option<InterpolationNode> {
        let start = self.pos;
        self.consume("{{");
        let expr_start = self.pos;
        let Some(len) = self.remaining().find("}}") else {
            // Treat the rest of the text run as plain text.
            self.read_while(|c| c != '<');
            self.errors.push(CompileError::unterminated_interpolation(
                self.span(start, self.pos),
            ));
            return None;
        };
        let raw = &self.source[expr_start..expr_start + len];
        self.pos = expr_start + len + 2;
        Some(InterpolationNode {
            expression: Expression::trimmed(raw, self.base + expr_start as u32),
            span: self.span(start, self.pos),
        })
    }

    /// Parse a text run. Whitespace-only runs produce no node.
    fn parse_text(&mut self) -> Option<TextNode> {
        let start = self.pos;
        self.advance();
        while !self.is_eof()
            && !self.starts_with("{{")
            && !self.at_element_start()
            && !self.starts_with("</")
            && !self.starts_with("<!--")
        {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        (!text.trim().is_empty()).then(|| TextNode {
            span: self.span(start, self.pos),
        })
    }

    /// Parse an element.
    fn parse_element(&mut self) -> ElementNode {
        let start = self.pos;
        self.consume("<");

        let tag_start = self.pos;
        let tag: SmolStr = self
            .read_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.')
            .into();
        let tag_span = self.span(tag_start, self.pos);

        let (attrs, directives) = self.parse_attributes();
        let v_for = directives
            .iter()
            .find(|d| d.name == "for")
            .and_then(|d| self.parse_for_directive(d));

        self.skip_whitespace();
        let start_tag = self.span(start, self.pos);
        let self_closing = self.consume("/>");
        let tag_terminated = self_closing || self.consume(">");

        let mut children = Vec::new();
        let mut closed = true;
        if !tag_terminated {
            closed = false;
            self.errors
                .push(CompileError::unclosed_element(&tag, self.span(start, self.pos)));
        } else if !self_closing && !is_void_element(&tag) {
            self.open_tags.push(tag.clone());
            let (nodes, found) = self.parse_children(Some(tag.as_str()));
            self.open_tags.pop();
            children = nodes;
            if found {
                self.consume("</");
                self.read_while(|c| c != '>');
                self.consume(">");
            } else {
                closed = false;
                self.errors
                    .push(CompileError::unclosed_element(&tag, tag_span));
            }
        }

        let is_component = get_element_type(&tag) == ElementType::Component;
        ElementNode {
            tag,
            is_component,
            attrs,
            directives,
            v_for,
            children,
            self_closing,
            closed,
            span: self.span(start, self.pos),
            tag_span,
            start_tag,
        }
    }

    /// Parse attributes and directives, keeping source order.
    fn parse_attributes(&mut self) -> (Vec<Attribute>, Vec<Directive>) {
        let mut attrs = Vec::new();
        let mut directives = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_eof() || self.starts_with(">") || self.starts_with("/>") || self.starts_with("<")
            {
                break;
            }

            let attr_start = self.pos;
            let name = self.read_while(|c| {
                !c.is_whitespace() && c != '=' && c != '>' && c != '/' && c != '"' && c != '\''
            });

            if name.is_empty() {
                self.advance();
                continue;
            }

            self.skip_whitespace();

            let value = if self.consume("=") {
                self.skip_whitespace();
                Some(self.parse_attribute_value())
            } else {
                None
            };

            let span = self.span(attr_start, self.pos);
            let name_offset = self.base + attr_start as u32;
            match parse_directive(name, name_offset, value.clone(), span) {
                Some(directive) => {
                    if matches!(directive.name.as_str(), "if" | "else-if" | "for")
                        && directive.value.as_ref().map_or(true, Expression::is_empty)
                    {
                        self.errors
                            .push(CompileError::missing_value(&directive.name, span));
                    }
                    directives.push(directive);
                }
                None => attrs.push(Attribute {
                    name: name.into(),
                    value,
                    span,
                }),
            }
        }

        (attrs, directives)
    }

    /// Parse an attribute value. The expression keeps the raw value text.
    fn parse_attribute_value(&mut self) -> Expression {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let value_start = self.pos;
                let value = match self.remaining().find(quote) {
                    Some(len) => {
                        self.pos += len;
                        let value = &self.source[value_start..self.pos];
                        self.advance();
                        value
                    }
                    None => {
                        self.pos = self.source.len();
                        self.errors.push(CompileError::unterminated_attribute(
                            self.span(value_start, self.pos),
                        ));
                        &self.source[value_start..]
                    }
                };
                Expression::new(
                    value,
                    Span::new(
                        self.base + value_start as u32,
                        self.base + (value_start + value.len()) as u32,
                    ),
                )
            }
            _ => {
                let start = self.pos;
                let value = self.read_while(|c| !c.is_whitespace() && c != '>');
                Expression::new(value, self.span(start, self.pos))
            }
        }
    }

    /// Parse the value of a v-for directive, recording an error when it
    /// does not have the `alias in source` shape.
    fn parse_for_directive(&mut self, directive: &Directive) -> Option<ForExpression> {
        let value = directive.value.as_ref().filter(|v| !v.is_empty())?;
        let parsed = parse_for_expression(value);
        if parsed.is_none() {
            self.errors
                .push(CompileError::invalid_v_for(&value.content, value.span));
        }
        parsed
    }
}

/// Parse a directive attribute name (`v-name:arg.mod`, `:arg`, `@arg`,
/// `#arg`). Returns `None` for plain attributes.
fn parse_directive(
    name: &str,
    name_offset: u32,
    value: Option<Expression>,
    span: Span,
) -> Option<Directive> {
    let (directive_name, rest, rest_offset): (&str, &str, usize) =
        if let Some(rest) = name.strip_prefix("v-") {
            let end = rest.find([':', '.']).unwrap_or(rest.len());
            let directive_name = &rest[..end];
            let after = &rest[end..];
            let (after, skip) = match after.strip_prefix(':') {
                Some(arg) => (arg, 1),
                None => (after, 0),
            };
            // `v-name.mod` keeps the dot so modifiers split below.
            if skip == 0 {
                return Some(Directive {
                    name: directive_name.into(),
                    arg: None,
                    modifiers: split_modifiers(after),
                    value,
                    span,
                });
            }
            (directive_name, after, 2 + end + skip)
        } else if let Some(rest) = name.strip_prefix(':') {
            ("bind", rest, 1)
        } else if let Some(rest) = name.strip_prefix('@') {
            ("on", rest, 1)
        } else if let Some(rest) = name.strip_prefix('#') {
            ("slot", rest, 1)
        } else {
            return None;
        };

    let arg_offset = name_offset + rest_offset as u32;
    let (arg, modifiers) = if let Some(inner) = rest.strip_prefix('[') {
        let close = inner.find(']').unwrap_or(inner.len());
        let expr = Expression::trimmed(&inner[..close], arg_offset + 1);
        let after = inner.get(close + 1..).unwrap_or("");
        (Some(DirectiveArg::Dynamic(expr)), split_modifiers(after))
    } else {
        let end = rest.find('.').unwrap_or(rest.len());
        let arg_name = &rest[..end];
        let arg = (!arg_name.is_empty()).then(|| {
            DirectiveArg::Static(
                arg_name.into(),
                Span::new(arg_offset, arg_offset + arg_name.len() as u32),
            )
        });
        (arg, split_modifiers(&rest[end..]))
    };

    Some(Directive {
        name: directive_name.into(),
        arg,
        modifiers,
        value,
        span,
    })
}

fn split_modifiers(s: &str) -> Vec<SmolStr> {
    s.split('.')
        .filter(|m| !m.is_empty())
        .map(SmolStr::from)
        .collect()
}

/// Parse `alias in source`, `(value, key, index) of source` and friends,
/// keeping exact spans for every alias and the source.
pub fn parse_for_expression(value: &Expression) -> Option<ForExpression> {
    let text = value.content.as_str();
    let base = value.span.start;
    let sep = find_for_separator(text)?;

    let alias = Expression::trimmed(&text[..sep], base);
    let source = Expression::trimmed(&text[sep + 2..], base + sep as u32 + 2);
    if alias.is_empty() || source.is_empty() {
        return None;
    }

    let aliases: Vec<Expression> =
        if alias.content.len() >= 2 && alias.content.starts_with('(') && alias.content.ends_with(')') {
            let inner = &alias.content[1..alias.content.len() - 1];
            let inner_base = alias.span.start + 1;
            split_top_level(inner, b',')
                .into_iter()
                .map(|(part, offset)| Expression::trimmed(part, inner_base + offset as u32))
                .filter(|e| !e.is_empty())
                .collect()
        } else {
            vec![alias]
        };

    (!aliases.is_empty()).then_some(ForExpression { aliases, source })
}

/// Find the `in`/`of` keyword separating aliases from the source.
fn find_for_separator(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'i' | b'o' if depth == 0 && i > 0 => {
                let keyword = &bytes[i..(i + 2).min(bytes.len())];
                let before = bytes[i - 1];
                let after = bytes.get(i + 2).copied();
                if (keyword == b"in" || keyword == b"of")
                    && (before.is_ascii_whitespace() || matches!(before, b')' | b']' | b'}'))
                    && after.is_some_and(|a| a.is_ascii_whitespace())
                {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split on `sep` outside brackets and strings, returning each part with
/// its offset.
fn split_top_level(text: &str, sep: u8) -> Vec<(&str, usize)> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                _ if b == sep && depth == 0 => {
                    parts.push((&text[start..i], start));
                    start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    parts.push((&text[start..], start));
    parts
}

/// Check if an element is a void element (no end tag).
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorCode;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParsedTemplate {
        parse_template(source, 0)
    }

    fn first_element(parsed: &ParsedTemplate) -> &ElementNode {
        match &parsed.ast.children[0] {
            TemplateNode::Element(el) => el,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_element() {
        let parsed = parse("<div>Hello</div>");
        assert_eq!(parsed.ast.children.len(), 1);
        assert!(parsed.errors.is_empty());
        assert!(first_element(&parsed).closed);
    }

    #[test]
    fn test_interpolation_span_is_absolute_and_trimmed() {
        let parsed = parse_template("<p>{{  message }}</p>", 100);
        let el = first_element(&parsed);
        match &el.children[0] {
            TemplateNode::Interpolation(node) => {
                assert_eq!(node.expression.content, "message");
                assert_eq!(node.expression.span, Span::new(107, 114));
            }
            other => panic!("expected interpolation, got {:?}", other),
        }
    }

    #[test]
    fn test_directive_shorthands() {
        let parsed = parse(r#"<MyComponent :prop.sync="value" @click.stop="go" #item="{ row }" v-model="x" />"#);
        let el = first_element(&parsed);
        assert!(el.is_component);
        let names: Vec<_> = el.directives.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["bind", "on", "slot", "model"]);
        assert_eq!(el.directives[0].static_arg(), Some("prop"));
        assert_eq!(el.directives[0].modifiers, vec![SmolStr::from("sync")]);
        assert_eq!(el.directives[1].modifiers, vec![SmolStr::from("stop")]);
        assert_eq!(el.directives[2].value.as_ref().unwrap().content, "{ row }");
    }

    #[test]
    fn test_dynamic_argument_span() {
        let source = r#"<a v-bind:[ key ]="v"></a>"#;
        let parsed = parse(source);
        let el = first_element(&parsed);
        match &el.directives[0].arg {
            Some(DirectiveArg::Dynamic(expr)) => {
                assert_eq!(expr.content, "key");
                assert_eq!(&source[expr.span.to_range()], "key");
            }
            other => panic!("expected dynamic arg, got {:?}", other),
        }
    }

    #[test]
    fn test_start_tag_ignores_gt_in_values() {
        let source = r#"<Card :show="a > b" title='x'>body</Card>"#;
        let parsed = parse(source);
        let el = first_element(&parsed);
        assert_eq!(&source[el.start_tag.to_range()], r#"<Card :show="a > b" title='x'"#);
        let values: Vec<_> = el
            .value_spans()
            .into_iter()
            .map(|s| &source[s.to_range()])
            .collect();
        assert_eq!(values, vec!["a > b", "x"]);
    }

    #[test]
    fn test_parse_v_for_aliases() {
        let source = r#"<li v-for="(value, key, index) in object">{{ value }}</li>"#;
        let parsed = parse(source);
        let el = first_element(&parsed);
        let v_for = el.v_for.as_ref().unwrap();
        let aliases: Vec<_> = v_for.aliases.iter().map(|a| a.content.as_str()).collect();
        assert_eq!(aliases, vec!["value", "key", "index"]);
        for alias in &v_for.aliases {
            assert_eq!(&source[alias.span.to_range()], alias.content);
        }
        assert_eq!(&source[v_for.source.span.to_range()], "object");
    }

    #[test]
    fn test_parse_v_for_destructuring() {
        let value = Expression::new("({ id, name }, i) of list", Span::new(10, 35));
        let parsed = parse_for_expression(&value).unwrap();
        assert_eq!(parsed.aliases[0].content, "{ id, name }");
        assert_eq!(parsed.aliases[0].span.start, 11);
        assert_eq!(parsed.aliases[1].content, "i");
        assert_eq!(parsed.source.content, "list");
    }

    #[test]
    fn test_invalid_v_for_is_reported() {
        let parsed = parse(r#"<li v-for="items"></li>"#);
        assert!(first_element(&parsed).v_for.is_none());
        assert_eq!(parsed.errors[0].code, CompileErrorCode::InvalidVFor);
    }

    #[test]
    fn test_if_chain_groups_siblings() {
        let parsed = parse(r#"<a v-if="x"></a>
  <!-- note -->
  <b v-else-if="y"></b>
  <c v-else></c>"#);
        assert_eq!(parsed.ast.children.len(), 2);
        match &parsed.ast.children[0] {
            TemplateNode::If(node) => {
                let kinds: Vec<_> = node.branches.iter().map(|b| b.branch_type).collect();
                assert_eq!(
                    kinds,
                    vec![IfBranchType::If, IfBranchType::ElseIf, IfBranchType::Else]
                );
                assert_eq!(node.branches[1].condition().unwrap().content, "y");
            }
            other => panic!("expected if chain, got {:?}", other),
        }
    }

    #[test]
    fn test_orphan_else_is_reported() {
        let parsed = parse(r#"<div><p v-else>no</p></div>"#);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].code, CompileErrorCode::MissingIf);
    }

    #[test]
    fn test_v_for_with_v_if_stays_element() {
        let parsed = parse(r#"<li v-for="i in xs" v-if="i.ok"></li>"#);
        assert!(matches!(parsed.ast.children[0], TemplateNode::Element(_)));
    }

    #[test]
    fn test_unclosed_element_recovers() {
        let parsed = parse("<div><span>{{ a }}</div><p>{{ b }}</p>");
        assert_eq!(parsed.ast.children.len(), 2);
        let div = first_element(&parsed);
        assert!(div.closed);
        match &div.children[0] {
            TemplateNode::Element(span) => assert!(!span.closed),
            other => panic!("expected span element, got {:?}", other),
        }
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].code, CompileErrorCode::UnclosedElement);
    }

    #[test]
    fn test_stray_end_tag() {
        let parsed = parse("<div></span></div>");
        assert_eq!(parsed.errors[0].code, CompileErrorCode::InvalidEndTag);
        assert!(first_element(&parsed).closed);
    }

    #[test]
    fn test_unterminated_interpolation() {
        let parsed = parse("<p>{{ broken</p><i>{{ ok }}</i>");
        assert_eq!(parsed.errors[0].code, CompileErrorCode::UnterminatedInterpolation);
        assert_eq!(parsed.ast.children.len(), 2);
    }

    #[test]
    fn test_less_than_in_text() {
        let parsed = parse("<p>a < b</p>");
        assert!(parsed.errors.is_empty());
        assert_eq!(first_element(&parsed).children.len(), 1);
    }
}
