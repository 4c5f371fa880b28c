//! Language features on component files.
//!
//! Requests arrive with offsets into the original file. They are moved into
//! the composed document, answered by the type checker, and moved back;
//! anything that lands in generated code is dropped.

use crate::loader::FileLoader;
use crate::node::{FileId, FileNode};
use crate::workspace::{Workspace, WorkspaceError};
use camino::{Utf8Path, Utf8PathBuf};
use source_map::{OffsetMap, Span};
use tracing::trace;
use ts_runner::{EngineLocation, TsSeverity, TypeCheckEngine};
use vue_diagnostics::{check_component_usages, sort_diagnostics, Diagnostic, DiagnosticCode, Severity};
use vue_template_compiler::ComponentUsage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hover {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub label: String,
    pub kind: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: Utf8PathBuf,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticToken {
    pub span: Span,
    pub kind: String,
    pub modifiers: u32,
}

/// Token kind for template tags that resolve to a component.
pub const COMPONENT_TOKEN: &str = "class";

const GENERATED_PREFIX: &str = "__vc";
const GENERATED_TYPE_PREFIX: &str = "__Vc";

impl<E: TypeCheckEngine, L: FileLoader> Workspace<E, L> {
    pub async fn hover(&self, path: &Utf8Path, offset: u32) -> Result<Option<Hover>, WorkspaceError> {
        let id = FileId::from_path(path);
        let (file, composition) = self.sync(&id).await?;
        let map = &composition.document.map;
        let Some(synthetic) = map.to_synthetic(offset) else {
            trace!(%path, offset, "hover outside mapped code");
            return Ok(None);
        };
        let hover = self.engine.hover(&file, synthetic).await?;
        Ok(hover.and_then(|hover| {
            let span = map.clamp_to_original(hover.span)?;
            Some(Hover {
                text: hover.text,
                span,
            })
        }))
    }

    pub async fn completion(
        &self,
        path: &Utf8Path,
        offset: u32,
    ) -> Result<Vec<Completion>, WorkspaceError> {
        let id = FileId::from_path(path);
        let node = self.ensure_node(&id).await?;
        if let Some(usage) = start_tag_at(&node, offset) {
            return self.attribute_completions(&node, usage).await;
        }

        let (file, composition) = self.sync(&id).await?;
        let Some(synthetic) = cursor_to_synthetic(&composition.document.map, offset) else {
            return Ok(Vec::new());
        };
        let items = self.engine.completions(&file, synthetic).await?;
        Ok(items
            .into_iter()
            .filter(|item| !is_generated_name(&item.label))
            .map(|item| Completion {
                label: item.label,
                kind: item.kind,
                detail: item.detail,
            })
            .collect())
    }

    /// Members of the component used at a start tag.
    async fn attribute_completions(
        &self,
        node: &FileNode,
        usage: &ComponentUsage,
    ) -> Result<Vec<Completion>, WorkspaceError> {
        let Some(target) = self.lookup_tag(node, &usage.tag) else {
            return Ok(Vec::new());
        };
        let composition = self.composed(&target).await?;
        let properties = &composition.document.properties;
        let has_props = properties.iter().any(|p| p.is_prop);
        Ok(properties
            .iter()
            .filter(|p| p.is_prop || !has_props)
            .map(|p| Completion {
                label: p.name.clone(),
                kind: Some(if p.is_prop { "prop" } else { "property" }.to_string()),
                detail: p.type_text.clone(),
            })
            .collect())
    }

    pub async fn definition(
        &self,
        path: &Utf8Path,
        offset: u32,
    ) -> Result<Vec<Location>, WorkspaceError> {
        let id = FileId::from_path(path);
        let node = self.ensure_node(&id).await?;
        if let Some(usage) = tag_at(&node, offset) {
            return Ok(self.tag_definition(&node, usage).await.into_iter().collect());
        }

        let (file, composition) = self.sync(&id).await?;
        let Some(synthetic) = composition.document.map.to_synthetic(offset) else {
            return Ok(Vec::new());
        };
        let mut locations = Vec::new();
        for location in self.engine.definition(&file, synthetic).await? {
            if let Some(mapped) = self.map_location(&location).await {
                locations.push(mapped);
            }
        }

        if locations.is_empty() {
            // Inherited members are declared in generated code; point at
            // the ancestor that declares them instead.
            if let Some(word) = word_at(&node.text, offset) {
                if composition.document.properties.get(word).is_some() {
                    locations.extend(self.declaring_location(&id, word).await);
                }
            }
        }
        Ok(locations)
    }

    /// The class of the component a template tag designates.
    pub async fn tag_definition(&self, node: &FileNode, usage: &ComponentUsage) -> Option<Location> {
        let target = self.lookup_tag(node, &usage.tag)?;
        let target = self.ensure_node(&target).await.ok()?;
        Some(Location {
            file: target.source_file()?.to_path_buf(),
            span: target.class_span.unwrap_or_default(),
        })
    }

    async fn map_location(&self, location: &EngineLocation) -> Option<Location> {
        let id = original_id(&location.file);
        let composition = match self.node(&id) {
            Some(_) => self.composed(&id).await.ok()?,
            // A file the workspace does not track maps to itself.
            None => {
                return Some(Location {
                    file: Utf8PathBuf::from(&location.file),
                    span: location.span,
                })
            }
        };
        let span = composition.document.map.to_original_span(location.span)?;
        Some(Location {
            file: id.path()?.to_path_buf(),
            span,
        })
    }

    /// The declaration of member `name` in `id` or its nearest ancestor
    /// declaring it.
    async fn declaring_location(&self, id: &FileId, name: &str) -> Option<Location> {
        let chain = std::iter::once(id.clone()).chain(self.forest().ancestors(id));
        for node in chain {
            let Ok(node) = self.ensure_node(&node).await else {
                continue;
            };
            if let Some(property) = node.property(name) {
                return Some(Location {
                    file: property.file.clone(),
                    span: property.decl.span,
                });
            }
        }
        None
    }

    /// Problems of the file itself, without asking the type checker.
    pub fn node_diagnostics(&self, node: &FileNode) -> Vec<Diagnostic> {
        let mut diagnostics = node.diagnostics.clone();
        if let Some(links) = self.links(&node.id) {
            diagnostics.extend(links.diagnostics);
        }
        if let Some(template) = &node.template {
            diagnostics.extend(check_component_usages(
                &template.components,
                |tag| self.is_registered(node, tag),
                &self.config().diagnostics,
            ));
        }
        diagnostics
    }

    /// File diagnostics merged with the type checker's, in original
    /// coordinates.
    pub async fn diagnostics(&self, path: &Utf8Path) -> Result<Vec<Diagnostic>, WorkspaceError> {
        let id = FileId::from_path(path);
        let node = self.ensure_node(&id).await?;
        let mut diagnostics = self.node_diagnostics(&node);

        let (file, composition) = self.sync(&id).await?;
        let reported = self.engine.diagnostics(&file).await?;
        let total = reported.len();
        diagnostics.extend(reported.into_iter().filter_map(|d| {
            // Only diagnostics wholly inside generated code are dropped.
            let span = composition.document.map.clamp_to_original(d.span)?;
            Some(Diagnostic {
                message: d.message,
                span,
                severity: severity(d.severity),
                code: DiagnosticCode::TypeCheck(d.code),
            })
        }));
        trace!(%path, total, "merged type checker diagnostics");
        sort_diagnostics(&mut diagnostics);
        Ok(diagnostics)
    }

    pub async fn semantic_tokens(&self, path: &Utf8Path) -> Result<Vec<SemanticToken>, WorkspaceError> {
        let id = FileId::from_path(path);
        let node = self.ensure_node(&id).await?;
        let (file, composition) = self.sync(&id).await?;
        let map = &composition.document.map;

        let mut tokens: Vec<SemanticToken> = self
            .engine
            .semantic_tokens(&file)
            .await?
            .into_iter()
            .filter_map(|token| {
                Some(SemanticToken {
                    span: map.clamp_to_original(token.span)?,
                    kind: token.kind,
                    modifiers: token.modifiers,
                })
            })
            .collect();
        if let Some(template) = &node.template {
            tokens.extend(
                template
                    .components
                    .iter()
                    .filter(|usage| self.lookup_tag(&node, &usage.tag).is_some())
                    .map(|usage| SemanticToken {
                        span: usage.tag_span,
                        kind: COMPONENT_TOKEN.to_string(),
                        modifiers: 0,
                    }),
            );
        }
        tokens.sort_by_key(|t| (t.span.start, t.span.end));
        Ok(tokens)
    }
}

fn severity(severity: TsSeverity) -> Severity {
    match severity {
        TsSeverity::Error => Severity::Error,
        TsSeverity::Warning => Severity::Warning,
        TsSeverity::Suggestion | TsSeverity::Message => Severity::Hint,
    }
}

/// Names the composer generates, hidden from completion lists.
fn is_generated_name(label: &str) -> bool {
    label.starts_with(GENERATED_PREFIX) || label.starts_with(GENERATED_TYPE_PREFIX)
}

/// The node id behind an engine file name.
fn original_id(file: &str) -> FileId {
    match file.strip_suffix(".ts") {
        Some(original) if !original.ends_with(".d") && original.contains('.') => {
            FileId::new(original)
        }
        _ => FileId::new(file),
    }
}

/// A cursor sits between characters; at the end of a mapped span it still
/// belongs to that span.
fn cursor_to_synthetic(map: &OffsetMap, offset: u32) -> Option<u32> {
    map.to_synthetic(offset).or_else(|| {
        let before = offset.checked_sub(1)?;
        map.to_synthetic(before).map(|s| s + 1)
    })
}

fn tag_at(node: &FileNode, offset: u32) -> Option<&ComponentUsage> {
    node.template
        .as_ref()?
        .components
        .iter()
        .find(|usage| usage.tag_span.contains_offset(offset))
}

/// The component whose start tag has `offset` in attribute name position.
/// Offsets inside attribute values belong to the expression there.
fn start_tag_at(node: &FileNode, offset: u32) -> Option<&ComponentUsage> {
    node.template.as_ref()?.components.iter().find(|usage| {
        usage.tag_span.end < offset
            && offset <= usage.start_tag.end
            && !usage
                .values
                .iter()
                .any(|value| value.start <= offset && offset <= value.end)
    })
}

fn word_at(text: &str, offset: u32) -> Option<&str> {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$';
    let at = offset as usize;
    if !text.is_char_boundary(at) {
        return None;
    }
    let start = text[..at]
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_word(c))
        .last()
        .map_or(at, |(i, _)| i);
    let end = text[at..]
        .char_indices()
        .find(|&(_, c)| !is_word(c))
        .map_or(text.len(), |(i, _)| at + i);
    (start < end).then(|| &text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::workspace::WorkspaceConfig;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use ts_runner::{synthetic_file_name, EngineDiagnostic, RecordingEngine};
    use vue_diagnostics::DiagnosticOptions;

    const PARENT: &str = "<script lang=\"ts\">\n@Component\nexport default class A extends Vue {\n  x: string = ''\n}\n</script>\n";

    const CHILD: &str = r#"<template>
  <div>
    <p>{{ x }} {{ y }}</p>
    <Card title="t" />
    <missing-thing />
  </div>
</template>
<script lang="ts">
import A from './A.vue'
import Card from './Card.vue'
@Component({ components: { Card } })
export default class B extends A {
  y = 2
}
</script>
"#;

    const CARD: &str = "<script lang=\"ts\">\n@Component\nexport default class Card extends Vue {\n  @Prop(String) title!: string\n  @Prop({ type: Number }) size!: number\n  open = false\n}\n</script>\n";

    fn workspace() -> Workspace<RecordingEngine, MemoryLoader> {
        let loader = MemoryLoader::with_files([("/w/A.vue", PARENT), ("/w/Card.vue", CARD)]);
        let mut config = WorkspaceConfig::new("/w");
        config.diagnostics = DiagnosticOptions {
            check_unknown_components: true,
            known_components: Vec::new(),
        };
        let ws = Workspace::new(config, Arc::new(loader), Arc::new(RecordingEngine::new()));
        ws.did_open(Utf8Path::new("/w/B.vue"), CHILD, 1);
        ws
    }

    fn child() -> &'static Utf8Path {
        Utf8Path::new("/w/B.vue")
    }

    fn offset_of(needle: &str, delta: u32) -> u32 {
        CHILD.find(needle).unwrap() as u32 + delta
    }

    #[tokio::test]
    async fn test_hover_round_trip() {
        let ws = workspace();
        let x = offset_of("{{ x }}", 3);
        let hover = ws.hover(child(), x).await.unwrap().unwrap();
        assert_eq!(hover.text, "x");
        assert_eq!(hover.span, Span::new(x, x + 1));
    }

    #[tokio::test]
    async fn test_hover_on_markup_is_none() {
        let ws = workspace();
        let tag = offset_of("<p>", 1);
        assert_eq!(ws.hover(child(), tag).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_definition_of_inherited_member() {
        let ws = workspace();
        let x = offset_of("{{ x }}", 3);
        let locations = ws.definition(child(), x).await.unwrap();
        // The engine answers inside the generated destructuring first; that
        // is unmapped, so the declaring ancestor is used.
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].file, Utf8PathBuf::from("/w/A.vue"));
        let declared = PARENT.find("x: string").unwrap() as u32;
        assert_eq!(locations[0].span, Span::new(declared, declared + 1));
    }

    #[tokio::test]
    async fn test_tag_definition_and_attribute_completion() {
        let ws = workspace();
        let tag = offset_of("<Card", 2);
        let locations = ws.definition(child(), tag).await.unwrap();
        assert_eq!(locations[0].file, Utf8PathBuf::from("/w/Card.vue"));
        let class = CARD.find("Card extends").unwrap() as u32;
        assert_eq!(locations[0].span, Span::new(class, class + 4));

        let attribute = offset_of("<Card ", 6);
        let labels: Vec<_> = ws
            .completion(child(), attribute)
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.label, c.detail))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("title".to_string(), Some("string".to_string())),
                ("size".to_string(), Some("number".to_string())),
            ]
        );
    }

    const BOUND: &str = r#"<template>
  <Card :show="open > 1" :title="userName" />
</template>
<script lang="ts">
import Card from './Card.vue'
@Component({ components: { Card } })
export default class U extends Vue {
  userName = ''
  open = 0
}
</script>
"#;

    async fn labels_at(ws: &Workspace<RecordingEngine, MemoryLoader>, offset: u32) -> Vec<String> {
        ws.completion(Utf8Path::new("/w/U.vue"), offset)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.label)
            .collect()
    }

    #[tokio::test]
    async fn test_completion_inside_component_binding_uses_engine() {
        let ws = workspace();
        ws.did_open(Utf8Path::new("/w/U.vue"), BOUND, 1);

        let inside_value = BOUND.find("userName\"").unwrap() as u32 + 4;
        let labels = labels_at(&ws, inside_value).await;
        assert!(labels.contains(&"userName".to_string()));
        assert!(ws
            .engine()
            .calls()
            .iter()
            .any(|c| matches!(c, ts_runner::EngineCall::Completions { .. })));

        // A `>` inside an earlier value does not end the start tag.
        let attribute = BOUND.find(":title").unwrap() as u32;
        assert_eq!(labels_at(&ws, attribute).await, vec!["title", "size"]);
    }

    #[tokio::test]
    async fn test_completion_hides_generated_names() {
        let ws = workspace();
        let y = offset_of("{{ y }}", 4);
        let labels: Vec<_> = ws
            .completion(child(), y)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert!(labels.contains(&"y".to_string()));
        assert!(!labels.iter().any(|l| l.starts_with("__vc") || l.starts_with("__Vc")));
    }

    #[tokio::test]
    async fn test_diagnostics_merge_and_filter() {
        let ws = workspace();
        let id = FileId::new("/w/B.vue");
        let (file, composition) = ws.sync(&id).await.unwrap();
        let y = offset_of("{{ y }}", 3);
        let mapped = composition.document.map.to_synthetic(y).unwrap();
        let generated = composition.document.text.find("__VcInherited").unwrap() as u32;
        ws.engine().set_diagnostics(
            &file,
            vec![
                EngineDiagnostic {
                    message: "mapped".into(),
                    code: 2322,
                    severity: TsSeverity::Error,
                    span: Span::new(mapped, mapped + 1),
                },
                EngineDiagnostic {
                    message: "generated".into(),
                    code: 2304,
                    severity: TsSeverity::Error,
                    span: Span::new(generated, generated + 4),
                },
            ],
        );

        let diagnostics = ws.diagnostics(child()).await.unwrap();
        let summary: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.message.as_str(), d.code.to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("mapped", "TS2322".to_string()),
                ("Unknown component: <missing-thing>", "unknown-component".to_string()),
            ]
        );
        assert_eq!(diagnostics[0].span, Span::new(y, y + 1));
    }

    #[tokio::test]
    async fn test_diagnostic_starting_in_generated_prefix_is_kept() {
        let source = "<template>\n  <p>{{ $refs.box }}</p>\n</template>\n<script lang=\"ts\">\n@Component\nexport default class R extends Vue {}\n</script>\n";
        let ws = workspace();
        let path = Utf8Path::new("/w/R.vue");
        ws.did_open(path, source, 1);
        let (file, composition) = ws.sync(&FileId::from_path(path)).await.unwrap();
        let access = composition.document.text.find("this.$refs.box").unwrap() as u32;
        ws.engine().set_diagnostics(
            &file,
            vec![EngineDiagnostic {
                message: "Property 'box' does not exist".into(),
                code: 2339,
                severity: TsSeverity::Error,
                span: Span::new(access, access + "this.$refs.box".len() as u32),
            }],
        );

        let diagnostics = ws.diagnostics(path).await.unwrap();
        assert_eq!(diagnostics.len(), 1);
        let refs = source.find("$refs.box").unwrap() as u32;
        assert_eq!(diagnostics[0].span, Span::new(refs, refs + "$refs.box".len() as u32));
        assert_eq!(diagnostics[0].code, DiagnosticCode::TypeCheck(2339));
    }

    #[tokio::test]
    async fn test_semantic_tokens_include_component_tags() {
        let ws = workspace();
        let tokens = ws.semantic_tokens(child()).await.unwrap();
        let card = offset_of("<Card", 1);
        assert!(tokens
            .iter()
            .any(|t| t.kind == COMPONENT_TOKEN && t.span == Span::new(card, card + 4)));
        // Engine tokens only survive where they land on source words.
        assert!(tokens
            .iter()
            .filter(|t| t.kind != COMPONENT_TOKEN)
            .all(|t| CHILD[t.span.to_range()]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')));
        assert!(tokens.windows(2).all(|w| w[0].span.start <= w[1].span.start));
    }

    #[test]
    fn test_original_id() {
        assert_eq!(original_id(&synthetic_file_name("/w/B.vue")), FileId::new("/w/B.vue"));
        assert_eq!(original_id("/w/util.ts"), FileId::new("/w/util.ts"));
        assert_eq!(original_id("/w/types.d.ts"), FileId::new("/w/types.d.ts"));
    }

    #[test]
    fn test_word_at() {
        assert_eq!(word_at("{{ count + 1 }}", 5), Some("count"));
        assert_eq!(word_at("{{ count + 1 }}", 3), Some("count"));
        assert_eq!(word_at("{{ count + 1 }}", 8), Some("count"));
        assert_eq!(word_at("a + b", 2), None);
    }

    #[test]
    fn test_cursor_at_end_of_span() {
        let mut map = OffsetMap::new();
        map.push(10, 100, 3);
        assert_eq!(cursor_to_synthetic(&map, 101), Some(11));
        assert_eq!(cursor_to_synthetic(&map, 103), Some(13));
        assert_eq!(cursor_to_synthetic(&map, 105), None);
    }
}
