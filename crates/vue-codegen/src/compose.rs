//! Virtual document composition.
//!
//! A composed document is the component file with everything outside the
//! script blanked to whitespace, a render method embedding the compiled
//! template spliced into the class body, and a trailer declaring inherited
//! members and the template helpers.

use crate::helpers::{is_identifier, names, FOR_HELPER_DECLARATION};
use crate::script::{PropertyDecl, ScriptAnalysis};
use indexmap::IndexMap;
use source_map::{CodeBuilder, OffsetMap, Span};
use vue_parser::Sections;
use vue_template_compiler::CompiledTemplate;

/// A member visible on a component, local or inherited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatProperty {
    /// Member name.
    pub name: String,
    /// Declared type text.
    pub type_text: Option<String>,
    /// Span of the declaration in the file that declares it.
    pub span: Span,
    /// 0 for local members, 1 for the parent's, and so on.
    pub depth: u32,
    /// Whether it is a component prop.
    pub is_prop: bool,
}

impl FlatProperty {
    /// Whether the member comes from an ancestor.
    pub fn is_inherited(&self) -> bool {
        self.depth > 0
    }
}

/// The members of a component after inheritance flattening, in first
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedProperties {
    entries: IndexMap<String, FlatProperty>,
}

impl FlattenedProperties {
    /// Get a member by name.
    pub fn get(&self, name: &str) -> Option<&FlatProperty> {
        self.entries.get(name)
    }

    /// All members.
    pub fn iter(&self) -> impl Iterator<Item = &FlatProperty> {
        self.entries.values()
    }

    /// Members that come from ancestors.
    pub fn inherited(&self) -> impl Iterator<Item = &FlatProperty> {
        self.iter().filter(|p| p.is_inherited())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merge local declarations over the parent's flattened members. Local
/// declarations shadow inherited ones of the same name.
pub fn flatten(local: &[PropertyDecl], parent: Option<&FlattenedProperties>) -> FlattenedProperties {
    let mut entries = IndexMap::new();
    if let Some(parent) = parent {
        for property in parent.iter() {
            entries.insert(
                property.name.clone(),
                FlatProperty {
                    depth: property.depth + 1,
                    ..property.clone()
                },
            );
        }
    }
    for decl in local {
        entries.insert(
            decl.name.clone(),
            FlatProperty {
                name: decl.name.clone(),
                type_text: decl.effective_type().map(String::from),
                span: decl.span,
                depth: 0,
                is_prop: decl.is_prop(),
            },
        );
    }
    FlattenedProperties { entries }
}

/// A synthetic document ready for the type checker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedDocument {
    /// The document text.
    pub text: String,
    /// Synthetic offsets to offsets in the original file.
    pub map: OffsetMap,
    /// The members the document was composed with.
    pub properties: FlattenedProperties,
}

impl ComposedDocument {
    /// A document that is its own source, for plain scripts and
    /// declaration files.
    pub fn identity(text: &str) -> Self {
        Self {
            text: text.to_string(),
            map: OffsetMap::identity(Span::new(0, text.len() as u32)),
            properties: FlattenedProperties::default(),
        }
    }
}

/// Inputs of [`compose`].
#[derive(Debug, Clone, Copy)]
pub struct ComposeInput<'a> {
    /// The component file.
    pub text: &'a str,
    /// Its sections.
    pub sections: &'a Sections,
    /// Analysis of its script section.
    pub script: &'a ScriptAnalysis,
    /// The compiled template, if there is a template.
    pub template: Option<&'a CompiledTemplate>,
}

/// Compose the synthetic document of a component with its flattened
/// members.
pub fn compose(input: ComposeInput<'_>, properties: FlattenedProperties) -> ComposedDocument {
    let text = input.text;
    let mut builder = CodeBuilder::new();
    let script = input.sections.script.as_ref().map(|s| s.content_span);
    let insert = input
        .script
        .insert_offset
        .filter(|offset| script.is_some_and(|span| span.start <= *offset && *offset <= span.end));

    match (script, insert) {
        (Some(span), Some(insert)) => {
            builder.push_blank(&text[..span.start as usize]);
            builder.push_region(&text[span.start as usize..insert as usize], span.start);
            push_render(&mut builder, input.template, &properties, true);
            builder.push_region(&text[insert as usize..span.end as usize], insert);
            builder.push_blank(&text[span.end as usize..]);
        }
        (Some(span), None) => {
            builder.push_blank(&text[..span.start as usize]);
            builder.push_region(span.slice(text).unwrap_or_default(), span.start);
            builder.push_blank(&text[span.end as usize..]);
            builder.newline();
            push_render(&mut builder, input.template, &properties, false);
        }
        (None, _) => {
            builder.push_blank(text);
            builder.newline();
            push_render(&mut builder, input.template, &properties, false);
        }
    }

    builder.newline();
    push_trailer(&mut builder, &properties);

    let (text, map) = builder.finish();
    ComposedDocument {
        text,
        map,
        properties,
    }
}

/// The render method (inside the class) or a standalone render function.
fn push_render(
    builder: &mut CodeBuilder,
    template: Option<&CompiledTemplate>,
    properties: &FlattenedProperties,
    in_class: bool,
) {
    if in_class {
        builder.push_str("protected ");
        builder.push_str(names::RENDER);
        builder.push_str("() {");
    } else {
        builder.push_str("function ");
        builder.push_str(names::RENDER);
        builder.push_str("(this: any) {");
    }
    builder.push_str("let $event: any;");

    let bindings: Vec<&str> = properties
        .iter()
        .map(|p| p.name.as_str())
        .filter(|name| is_identifier(name))
        .collect();
    if !bindings.is_empty() {
        builder.push_str("const {");
        builder.push_str(&bindings.join(", "));
        builder.push_str("} = this as this & ");
        builder.push_str(names::INHERITED);
        builder.push(';');
    }

    if let Some(template) = template {
        builder.push_fragment(&template.code, &template.map);
    }
    builder.push('}');
}

fn push_trailer(builder: &mut CodeBuilder, properties: &FlattenedProperties) {
    builder.push_str("type ");
    builder.push_str(names::INHERITED);
    builder.push_str(" = {");
    for property in properties.inherited() {
        builder.push(' ');
        builder.push_str(&quote_key(&property.name));
        builder.push_str(": ");
        builder.push_str(property.type_text.as_deref().unwrap_or("any"));
        builder.push(';');
    }
    builder.push_str(" };");
    builder.newline();
    builder.push_str(FOR_HELPER_DECLARATION);
    builder.newline();
}

fn quote_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        format!("{:?}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::analyze_script;
    use pretty_assertions::assert_eq;
    use vue_parser::split_sections;
    use vue_template_compiler::compile_template;

    struct Fixture {
        text: String,
        sections: Sections,
        script: ScriptAnalysis,
        template: Option<CompiledTemplate>,
    }

    fn fixture(text: &str) -> Fixture {
        let sections = split_sections(text);
        let script = sections
            .script
            .as_ref()
            .map(|s| analyze_script(text, s.content_span))
            .unwrap_or_default();
        let template = sections.template.as_ref().map(|t| {
            compile_template(t.content(text), t.content_span.start)
        });
        Fixture {
            text: text.to_string(),
            sections,
            script,
            template,
        }
    }

    fn compose_fixture(f: &Fixture, parent: Option<&FlattenedProperties>) -> ComposedDocument {
        let properties = flatten(&f.script.properties, parent);
        compose(
            ComposeInput {
                text: &f.text,
                sections: &f.sections,
                script: &f.script,
                template: f.template.as_ref(),
            },
            properties,
        )
    }

    const PARENT: &str = r#"<script lang="ts">
@Component
export default class A extends Vue {
  x: string = ''
  shared = 1
}
</script>"#;

    const CHILD: &str = r#"<template>
  <p :title="x">{{ y }}</p>
</template>
<script lang="ts">
import A from './A.vue'
@Component
export default class B extends A {
  y = 2
}
</script>"#;

    #[test]
    fn test_flatten_child_shadows_parent() {
        let parent = flatten(&fixture(PARENT).script.properties, None);
        let child_source = PARENT.replace("class A", "class B").replace("x: string", "x: number");
        let child = flatten(&fixture(&child_source).script.properties, Some(&parent));
        let x = child.get("x").unwrap();
        assert_eq!(x.type_text.as_deref(), Some("number"));
        assert!(!x.is_inherited());
        assert_eq!(child.inherited().count(), 0);
    }

    #[test]
    fn test_flatten_inherits_parent_members() {
        let parent = flatten(&fixture(PARENT).script.properties, None);
        let child = fixture(CHILD);
        let flat = flatten(&child.script.properties, Some(&parent));
        let names: Vec<_> = flat.iter().map(|p| (p.name.as_str(), p.depth)).collect();
        assert_eq!(names, vec![("x", 1), ("shared", 1), ("y", 0)]);
        assert_eq!(flat.get("x").unwrap().type_text.as_deref(), Some("string"));
    }

    #[test]
    fn test_compose_splices_render_method() {
        let parent = flatten(&fixture(PARENT).script.properties, None);
        let child = fixture(CHILD);
        let doc = compose_fixture(&child, Some(&parent));

        assert!(doc.text.contains(
            "protected __vcRender() {let $event: any;const {x, shared, y} = this as this & __VcInherited;(x);(y);}}"
        ));
        assert!(doc.text.contains("type __VcInherited = { x: string; shared: any; };"));
        assert!(doc.text.contains("declare function __vcFor<T>"));
        // The template is blanked in place.
        assert!(doc.text.starts_with("          \n"));
    }

    #[test]
    fn test_compose_maps_template_and_script() {
        let child = fixture(CHILD);
        let doc = compose_fixture(&child, None);

        // Template expression round trip.
        let y = CHILD.find("{{ y }}").unwrap() as u32 + 3;
        let synthetic = doc.map.to_synthetic(y).unwrap();
        assert_eq!(&doc.text[synthetic as usize..synthetic as usize + 1], "y");
        assert_eq!(doc.map.to_original(synthetic), Some(y));

        // Script text keeps its offsets before the insertion point.
        let import = CHILD.find("import A").unwrap() as u32;
        assert_eq!(doc.map.to_synthetic(import), Some(import));

        // Script text after the insertion point is shifted but mapped.
        let close = child.script.insert_offset.unwrap();
        let synthetic = doc.map.to_synthetic(close).unwrap();
        assert_eq!(&doc.text[synthetic as usize..synthetic as usize + 1], "}");

        // Tags are unmapped.
        let tag = CHILD.find("<p").unwrap() as u32;
        assert_eq!(doc.map.to_synthetic(tag), None);
    }

    #[test]
    fn test_compose_without_class_appends_function() {
        let text = "<template><b>{{ n }}</b></template>\n<script>\nexport const n = 1\n</script>";
        let doc = compose_fixture(&fixture(text), None);
        assert!(doc.text.contains("\nfunction __vcRender(this: any) {let $event: any;(n);}"));
        let n = text.find("{{ n }}").unwrap() as u32 + 3;
        assert!(doc.map.to_synthetic(n).is_some());
    }

    #[test]
    fn test_compose_without_script() {
        let text = "<template><b>{{ $route.path }}</b></template>";
        let doc = compose_fixture(&fixture(text), None);
        assert!(doc.text.contains("{let $event: any;(this.$route.path);}"));
        assert_eq!(doc.text.find("<template>"), None);
    }

    #[test]
    fn test_identity_document() {
        let doc = ComposedDocument::identity("export const a = 1;");
        assert_eq!(doc.map.to_synthetic(7), Some(7));
        assert_eq!(doc.map.to_original(17), Some(17));
    }
}
