//! Compiles a template into a type-checkable function body.
//!
//! Every expression copied from the template is recorded in the offset map
//! with its exact length. Everything else in the output (statement glue,
//! structural headers that could not keep source order, `this.` prefixes)
//! is synthetic and unmapped.

use crate::ast::*;
use crate::error::CompileError;
use crate::parser::parse_template;
use smol_str::SmolStr;
use source_map::{CodeBuilder, OffsetMap, Span};

/// Name of the helper the compiled body uses to iterate `v-for` sources.
pub const FOR_HELPER: &str = "__vcFor";

/// A tag used in the template that may designate a component.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentUsage {
    /// Tag name as written.
    pub tag: SmolStr,
    /// Absolute span of the tag name in the start tag.
    pub tag_span: Span,
    /// Absolute span of the whole element.
    pub span: Span,
    /// Absolute span of the start tag, without its closing `>` or `/>`.
    pub start_tag: Span,
    /// Attribute values and dynamic arguments inside the start tag.
    pub values: Vec<Span>,
}

/// Result of compiling a template.
#[derive(Debug, Clone, Default)]
pub struct CompiledTemplate {
    /// The compiled function body.
    pub code: String,
    /// Compiled offsets to absolute offsets in the component file.
    pub map: OffsetMap,
    /// Component tags in document order.
    pub components: Vec<ComponentUsage>,
    /// Problems found while parsing the template.
    pub errors: Vec<CompileError>,
}

/// Compile template content located at absolute offset `base`.
pub fn compile_template(source: &str, base: u32) -> CompiledTemplate {
    let parsed = parse_template(source, base);
    let mut compiled = compile_ast(&parsed.ast);
    compiled.errors = parsed.errors;
    compiled
}

/// Compile an already parsed template.
pub fn compile_ast(ast: &TemplateAst) -> CompiledTemplate {
    let mut compiler = TemplateCompiler::default();
    compiler.compile_nodes(&ast.children);
    let (code, map) = compiler.builder.finish();
    CompiledTemplate {
        code,
        map,
        components: compiler.components,
        errors: Vec::new(),
    }
}

/// One expression-bearing piece of an element, in source order.
#[derive(Debug, Clone, Copy)]
enum Piece<'a> {
    /// Emitted as `(expr);`.
    Value(&'a Expression),
    /// Emitted as `()=>{expr};`.
    Handler(&'a Expression),
    /// A binding pattern, re-emitted as `(pattern);` when it is a plain
    /// pattern without defaults.
    Binding(&'a Expression),
}

impl<'a> Piece<'a> {
    fn expression(&self) -> &'a Expression {
        match self {
            Self::Value(e) | Self::Handler(e) | Self::Binding(e) => e,
        }
    }
}

#[derive(Default)]
struct TemplateCompiler {
    builder: CodeBuilder,
    components: Vec<ComponentUsage>,
}

impl TemplateCompiler {
    fn compile_nodes(&mut self, nodes: &[TemplateNode]) {
        for node in nodes {
            match node {
                TemplateNode::Element(el) => self.compile_element(el, None),
                TemplateNode::If(if_node) => {
                    for (i, branch) in if_node.branches.iter().enumerate() {
                        self.compile_element(&branch.element, Some((branch.branch_type, i == 0)));
                    }
                }
                TemplateNode::Interpolation(interp) => {
                    self.builder.push('(');
                    self.push_expression(&interp.expression, true);
                    self.builder.push_str(");");
                }
                TemplateNode::Text(_) | TemplateNode::Comment(_) => {}
            }
        }
    }

    /// Compile an element. `branch` is the element's place in an if chain:
    /// its branch type and whether it opens the chain.
    fn compile_element(&mut self, el: &ElementNode, branch: Option<(IfBranchType, bool)>) {
        if el.is_component {
            self.components.push(ComponentUsage {
                tag: el.tag.clone(),
                tag_span: el.tag_span,
                span: el.span,
                start_tag: el.start_tag,
                values: el.value_spans(),
            });
        }

        let branch_condition = branch
            .and_then(|_| el.branch_directive())
            .and_then(|(_, d)| d.value.as_ref())
            .filter(|e| !e.is_empty());
        let inner_condition = branch
            .is_none()
            .then(|| el.get_directive("if"))
            .flatten()
            .and_then(|d| d.value.as_ref())
            .filter(|e| !e.is_empty());
        let slot_pattern = slot_pattern(el);

        // Header expressions in the order the headers are written.
        let mut structural: Vec<&Expression> = Vec::new();
        structural.extend(branch_condition);
        if let Some(v_for) = &el.v_for {
            structural.extend(v_for.aliases.iter());
            structural.push(&v_for.source);
        }
        structural.extend(inner_condition);
        structural.extend(slot_pattern);

        let pieces = element_pieces(el);
        let headers_mapped = pieces.len() >= structural.len()
            && pieces
                .iter()
                .zip(&structural)
                .all(|(piece, expr)| piece.expression().span == expr.span);

        let mut blocks = 0;
        if let Some((branch_type, first)) = branch {
            let keyword = match (branch_type, first) {
                (IfBranchType::Else, true) => "{",
                (IfBranchType::Else, false) => "else{",
                (_, true) => "if(",
                (_, false) => "else if(",
            };
            self.builder.push_str(keyword);
            if branch_type != IfBranchType::Else {
                match branch_condition {
                    Some(condition) => self.push_expression(condition, headers_mapped),
                    None => self.builder.push_str("true"),
                }
                self.builder.push_str("){");
            }
            blocks += 1;
        }

        if let Some(v_for) = &el.v_for {
            self.builder.push_str("for(const [");
            for (i, alias) in v_for.aliases.iter().enumerate() {
                if i > 0 {
                    self.builder.push_str(", ");
                }
                self.push_binding(alias, headers_mapped);
            }
            self.builder.push_str("] of ");
            self.builder.push_str(FOR_HELPER);
            self.builder.push('(');
            self.push_expression(&v_for.source, headers_mapped);
            self.builder.push_str(")){");
            blocks += 1;
        }

        if let Some(condition) = inner_condition {
            self.builder.push_str("if(");
            self.push_expression(condition, headers_mapped);
            self.builder.push_str("){");
            blocks += 1;
        }

        if let Some(pattern) = slot_pattern {
            self.builder.push_str("{const ");
            self.push_binding(pattern, headers_mapped);
            self.builder.push_str(" = {} as Record<string, any>;");
            blocks += 1;
        }

        let rest = if headers_mapped {
            &pieces[structural.len()..]
        } else {
            &pieces[..]
        };
        for piece in rest {
            self.compile_piece(*piece);
        }

        if !el.has_directive("pre") {
            self.compile_nodes(&el.children);
        }

        for _ in 0..blocks {
            self.builder.push('}');
        }
    }

    fn compile_piece(&mut self, piece: Piece<'_>) {
        match piece {
            Piece::Value(expr) => {
                self.builder.push('(');
                self.push_expression(expr, true);
                self.builder.push_str(");");
            }
            Piece::Handler(expr) => {
                self.builder.push_str("()=>{");
                self.push_expression(expr, true);
                self.builder.push_str("};");
            }
            Piece::Binding(expr) => {
                if !expr.content.contains('=') {
                    self.builder.push('(');
                    self.push_binding(expr, true);
                    self.builder.push_str(");");
                }
            }
        }
    }

    /// Push an expression, prefixing `$` instance members with `this.`.
    fn push_expression(&mut self, expr: &Expression, mapped: bool) {
        let mut last = 0;
        for start in dollar_identifier_starts(&expr.content) {
            self.push_source(&expr.content[last..start], expr.span.start + last as u32, mapped);
            self.builder.push_str("this.");
            last = start;
        }
        self.push_source(&expr.content[last..], expr.span.start + last as u32, mapped);
    }

    /// Push a binding pattern verbatim.
    fn push_binding(&mut self, expr: &Expression, mapped: bool) {
        self.push_source(&expr.content, expr.span.start, mapped);
    }

    fn push_source(&mut self, text: &str, offset: u32, mapped: bool) {
        if text.is_empty() {
            return;
        }
        if mapped {
            self.builder.push_mapped(text, offset);
        } else {
            self.builder.push_str(text);
        }
    }
}

/// The scoped-slot pattern of an element (`v-slot`, `#name`, `slot-scope`).
fn slot_pattern(el: &ElementNode) -> Option<&Expression> {
    let directive = el
        .directives
        .iter()
        .filter(|d| d.is_slot())
        .filter_map(|d| d.value.as_ref());
    let attribute = el
        .attrs
        .iter()
        .filter(|a| a.name == "slot-scope" || a.name == "scope")
        .filter_map(|a| a.value.as_ref());
    directive
        .chain(attribute)
        .filter(|e| !e.is_empty())
        .min_by_key(|e| e.span.start)
}

/// All expression-bearing pieces of an element, sorted by source position.
fn element_pieces(el: &ElementNode) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();

    for directive in &el.directives {
        let value = directive.value.as_ref().filter(|v| !v.is_empty());
        match directive.name.as_str() {
            "else" | "pre" | "cloak" | "once" => {}
            "for" => {
                if let Some(v_for) = &el.v_for {
                    pieces.extend(v_for.aliases.iter().map(Piece::Binding));
                    pieces.push(Piece::Value(&v_for.source));
                }
            }
            "slot" => pieces.extend(value.map(Piece::Binding)),
            "on" => {
                if let Some(DirectiveArg::Dynamic(arg)) = &directive.arg {
                    pieces.push(Piece::Value(arg));
                }
                if let Some(value) = value {
                    if directive.arg.is_some() {
                        pieces.push(Piece::Handler(value));
                    } else {
                        pieces.push(Piece::Value(value));
                    }
                }
            }
            _ => {
                if let Some(DirectiveArg::Dynamic(arg)) = &directive.arg {
                    pieces.push(Piece::Value(arg));
                }
                pieces.extend(value.map(Piece::Value));
            }
        }
    }

    for attr in &el.attrs {
        if attr.name == "slot-scope" || attr.name == "scope" {
            if let Some(value) = attr.value.as_ref().filter(|v| !v.is_empty()) {
                pieces.push(Piece::Binding(value));
            }
        }
    }

    pieces.sort_by_key(|p| p.expression().span.start);
    pieces
}

/// Byte offsets of `$`-prefixed identifiers that refer to instance members:
/// at an identifier start, outside string literals, not after `.`, not
/// `$event` and not an object key.
fn dollar_identifier_starts(expr: &str) -> Vec<usize> {
    #[derive(PartialEq)]
    enum Mode {
        Code,
        Quote(u8),
        Template,
    }

    let bytes = expr.as_bytes();
    let mut starts = Vec::new();
    let mut modes = vec![Mode::Code];
    // Open braces per code context; a `}` at zero closes a `${`.
    let mut braces = vec![0usize];
    let mut prev: Option<u8> = None;
    let mut i = 0;

    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80;

    while i < bytes.len() {
        let b = bytes[i];
        match modes.last() {
            Some(Mode::Quote(q)) => {
                if b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == *q {
                    modes.pop();
                    prev = Some(b);
                }
                i += 1;
            }
            Some(Mode::Template) => {
                if b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == b'`' {
                    modes.pop();
                    prev = Some(b);
                    i += 1;
                } else if bytes[i..].starts_with(b"${") {
                    modes.push(Mode::Code);
                    braces.push(0);
                    prev = Some(b'{');
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => {
                match b {
                    b'\'' | b'"' => modes.push(Mode::Quote(b)),
                    b'`' => modes.push(Mode::Template),
                    b'{' => {
                        if let Some(depth) = braces.last_mut() {
                            *depth += 1;
                        }
                    }
                    b'}' => {
                        if braces.last() == Some(&0) && modes.len() > 1 {
                            modes.pop();
                            braces.pop();
                        } else if let Some(depth) = braces.last_mut() {
                            *depth = depth.saturating_sub(1);
                        }
                    }
                    _ if is_ident(b) && !b.is_ascii_digit() => {
                        let start = i;
                        while i < bytes.len() && is_ident(bytes[i]) {
                            i += 1;
                        }
                        let ident = &expr[start..i];
                        let next = bytes[i..].iter().find(|c| !c.is_ascii_whitespace());
                        let object_key =
                            matches!(prev, Some(b'{' | b',')) && next == Some(&b':');
                        if b == b'$' && prev != Some(b'.') && ident != "$event" && !object_key {
                            starts.push(start);
                        }
                        prev = Some(bytes[i - 1]);
                        continue;
                    }
                    _ if b.is_ascii_digit() => {
                        // Numbers may contain identifier characters (`1e5`).
                        while i < bytes.len() && (is_ident(bytes[i]) || bytes[i] == b'.') {
                            i += 1;
                        }
                        prev = Some(b'0');
                        continue;
                    }
                    _ => {}
                }
                if !b.is_ascii_whitespace() {
                    prev = Some(b);
                }
                i += 1;
            }
        }
    }

    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorCode;
    use pretty_assertions::assert_eq;

    /// Every mapped span must copy the original text exactly.
    fn assert_map_matches(source: &str, base: u32, compiled: &CompiledTemplate) {
        assert!(compiled.map.is_monotonic());
        for span in compiled.map.spans() {
            let synthetic = span.synthetic_span().to_range();
            let original = span.original_span();
            let local = (original.start - base) as usize..(original.end - base) as usize;
            assert_eq!(&compiled.code[synthetic], &source[local]);
        }
    }

    #[test]
    fn test_compile_bindings_and_events() {
        let source = r#"<div :class="cls" @click="onClick">{{ msg }}</div>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(compiled.code, @"(cls);()=>{onClick};(msg);");
        assert_map_matches(source, 0, &compiled);
        assert_eq!(compiled.map.len(), 3);
    }

    #[test]
    fn test_compile_if_chain() {
        let source = r#"<p v-if="a">x</p><p v-else-if="b">y</p><p v-else>{{ c }}</p>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(compiled.code, @"if(a){}else if(b){}else{(c);}");
        assert_map_matches(source, 0, &compiled);
    }

    #[test]
    fn test_compile_v_for() {
        let source = r#"<li v-for="(item, i) in items" :key="item.id">{{ i }}</li>"#;
        let compiled = compile_template(source, 10);
        insta::assert_snapshot!(
            compiled.code,
            @"for(const [item, i] of __vcFor(items)){(item.id);(i);}"
        );
        assert_map_matches(source, 10, &compiled);
    }

    #[test]
    fn test_v_for_wraps_v_if() {
        let source = r#"<li v-for="x in xs" v-if="x.ok">{{ x }}</li>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(compiled.code, @"for(const [x] of __vcFor(xs)){if(x.ok){(x);}}");
        assert_map_matches(source, 0, &compiled);
    }

    #[test]
    fn test_out_of_order_headers_are_unmapped() {
        let source = r#"<li :key="k" v-for="x in xs">{{ x }}</li>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(compiled.code, @"for(const [x] of __vcFor(xs)){(k);(x);(xs);(x);}");
        assert_map_matches(source, 0, &compiled);
        // k, x, xs and the interpolation are mapped; the header copies are not.
        assert_eq!(compiled.map.len(), 4);
    }

    #[test]
    fn test_compile_scoped_slot() {
        let source = r#"<DataTable><template #item="{ row }">{{ row.name }}</template></DataTable>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(
            compiled.code,
            @"{const { row } = {} as Record<string, any>;(row.name);}"
        );
        assert_map_matches(source, 0, &compiled);
        assert_eq!(compiled.components.len(), 1);
        assert_eq!(compiled.components[0].tag, "DataTable");
        assert_eq!(compiled.components[0].tag_span, Span::new(1, 10));
    }

    #[test]
    fn test_slot_scope_attribute() {
        let source = r#"<my-list><span slot-scope="props">{{ props.x }}</span></my-list>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(
            compiled.code,
            @"{const props = {} as Record<string, any>;(props.x);}"
        );
    }

    #[test]
    fn test_dollar_members_get_this_prefix() {
        let source = r#"<p @click="$emit('go', $event)">{{ $route.path + foo.$x }}</p>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(
            compiled.code,
            @"()=>{this.$emit('go', $event)};(this.$route.path + foo.$x);"
        );
        assert_map_matches(source, 0, &compiled);
    }

    #[test]
    fn test_dollar_inside_strings_is_untouched() {
        assert_eq!(dollar_identifier_starts("'$a' + `x${$b}` + $c"), vec![11, 18]);
        assert_eq!(dollar_identifier_starts("{ $key: 1 }"), Vec::<usize>::new());
        assert_eq!(dollar_identifier_starts("ok ? $a : $b"), vec![5, 10]);
    }

    #[test]
    fn test_dynamic_argument_is_emitted_first() {
        let source = r#"<a :[attr]="val"></a>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(compiled.code, @"(attr);(val);");
        assert_map_matches(source, 0, &compiled);
    }

    #[test]
    fn test_orphan_else_compiles_to_block() {
        let source = r#"<p v-else>{{ a }}</p>"#;
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(compiled.code, @"{(a);}");
        assert_eq!(compiled.errors[0].code, CompileErrorCode::MissingIf);
    }

    #[test]
    fn test_malformed_template_compiles_partially() {
        let source = "<div>{{ a }}<span :title=\"b\">{{ c }}</div>{{ d }}";
        let compiled = compile_template(source, 0);
        insta::assert_snapshot!(compiled.code, @"(a);(b);(c);(d);");
        assert_eq!(compiled.errors.len(), 1);
        assert_map_matches(source, 0, &compiled);
    }

    #[test]
    fn test_v_pre_skips_children() {
        let compiled = compile_template("<div v-pre>{{ raw }}</div>", 0);
        assert_eq!(compiled.code, "");
    }
}
