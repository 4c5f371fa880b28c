//! Per-file state of the workspace.

use camino::{Utf8Path, Utf8PathBuf};
use smol_str::SmolStr;
use source_map::{LineIndex, Span};
use std::fmt;
use std::sync::Arc;
use vue_codegen::{
    analyze_declarations, analyze_script, BaseRef, ComposedDocument, PropertyDecl,
    RegisteredComponent, ScriptAnalysis,
};
use vue_diagnostics::{check_script, check_sections, check_template, Diagnostic};
use vue_parser::{split_sections, Sections};
use vue_template_compiler::{compile_ast, parse_template, CompiledTemplate};

/// Identity of a node: a file path, or `<package>#<Export>` for library
/// components. The two never compare equal, whatever the path contains.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId {
    key: SmolStr,
    library: bool,
}

impl FileId {
    /// The id of a workspace file.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            key: SmolStr::new(path),
            library: false,
        }
    }

    pub fn from_path(path: &Utf8Path) -> Self {
        Self::new(path.as_str())
    }

    pub fn library(package: &str, export: &str) -> Self {
        Self {
            key: format!("{}#{}", package, export).into(),
            library: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn is_library(&self) -> bool {
        self.library
    }

    /// The file path, for nodes backed by a workspace file.
    pub fn path(&self) -> Option<&Utf8Path> {
        (!self.library).then(|| Utf8Path::new(self.as_str()))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A component file with sections.
    Component,
    /// A script or declaration file whose default class is a component.
    ComponentDeclaration,
    /// Any other script.
    PlainScript,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Workspace,
    /// A class found in the declarations of a component library.
    Library {
        package: String,
        export: String,
        /// Declaration file that holds the class.
        file: Utf8PathBuf,
    },
}

/// A member together with the file declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeProperty {
    pub decl: PropertyDecl,
    pub file: Utf8PathBuf,
}

/// Everything derived from the text of one file.
#[derive(Debug, Clone)]
pub struct FileNode {
    pub id: FileId,
    pub kind: NodeKind,
    pub origin: Origin,
    /// Bumped on every edit and invalidation. Unique across the workspace.
    pub version: u64,
    /// Version reported by the editor for the text, if it owns the file.
    pub editor_version: Option<i32>,
    pub text: Arc<str>,
    pub lines: LineIndex,
    /// Present for [`NodeKind::Component`].
    pub sections: Option<Sections>,
    pub script: ScriptAnalysis,
    pub template: Option<CompiledTemplate>,
    /// Members declared locally, or merged at scan time for library classes.
    pub properties: Vec<NodeProperty>,
    /// Span of the component class name.
    pub class_span: Option<Span>,
    /// Problems found in the file itself.
    pub diagnostics: Vec<Diagnostic>,
}

impl FileNode {
    /// Split and analyze `text`. Files ending in `.vue` or one of
    /// `extensions` are components. Never fails; problems become
    /// diagnostics.
    pub fn analyze(
        id: FileId,
        text: Arc<str>,
        extensions: &[String],
        version: u64,
        editor_version: Option<i32>,
    ) -> Self {
        let path = id.path().map(Utf8Path::to_path_buf).unwrap_or_default();
        let kind = kind_for(path.as_str(), extensions);
        let mut node = FileNode {
            lines: LineIndex::new(&text),
            id,
            kind,
            origin: Origin::Workspace,
            version,
            editor_version,
            text: text.clone(),
            sections: None,
            script: ScriptAnalysis::default(),
            template: None,
            properties: Vec::new(),
            class_span: None,
            diagnostics: Vec::new(),
        };

        match kind {
            NodeKind::Component => node.analyze_component(&text),
            _ if path.as_str().ends_with(".d.ts") => node.analyze_declaration(&text, &path),
            _ => node.analyze_plain_script(&text),
        }
        node.properties = node
            .script
            .properties
            .iter()
            .map(|decl| NodeProperty {
                decl: decl.clone(),
                file: path.clone(),
            })
            .collect();
        node
    }

    fn analyze_component(&mut self, text: &str) {
        let sections = split_sections(text);
        self.diagnostics.extend(check_sections(&sections));

        if let Some(script) = &sections.script {
            self.script = analyze_script(text, script.content_span);
            self.diagnostics.extend(check_script(&self.script));
        }
        if let Some(template) = &sections.template {
            let parsed = parse_template(template.content(text), template.content_span.start);
            self.diagnostics
                .extend(check_template(&parsed.ast, &parsed.errors));
            let mut compiled = compile_ast(&parsed.ast);
            compiled.errors = parsed.errors;
            self.template = Some(compiled);
        }
        self.class_span = self.script.name_span;
        self.sections = Some(sections);
    }

    fn analyze_plain_script(&mut self, text: &str) {
        let script = analyze_script(text, Span::new(0, text.len() as u32));
        self.diagnostics.extend(check_script(&script));
        if script.is_decorated {
            self.kind = NodeKind::ComponentDeclaration;
            self.class_span = script.name_span;
            self.script = script;
        } else {
            // Only the diagnostics of an undecorated script matter.
            self.script = ScriptAnalysis {
                errors: script.errors,
                ..Default::default()
            };
        }
    }

    fn analyze_declaration(&mut self, text: &str, path: &Utf8Path) {
        let analysis = analyze_declarations(text);
        self.diagnostics
            .extend(analysis.errors.iter().map(Diagnostic::from));
        let class = analysis
            .classes
            .iter()
            .find(|c| c.export.is_none())
            .or_else(|| analysis.classes.first());
        let Some(class) = class else {
            return;
        };
        tracing::trace!(%path, class = %class.name, "declaration file declares a component");
        self.kind = NodeKind::ComponentDeclaration;
        self.class_span = Some(class.span);
        self.script = ScriptAnalysis {
            class_name: Some(class.name.clone()),
            name_span: Some(class.span),
            properties: class.properties.clone(),
            ..Default::default()
        };
    }

    /// The base component reference, if this node can have a parent.
    pub fn base(&self) -> Option<&BaseRef> {
        match self.origin {
            Origin::Workspace => self.script.base.as_ref(),
            Origin::Library { .. } => None,
        }
    }

    pub fn registered(&self) -> &[RegisteredComponent] {
        &self.script.registered
    }

    pub fn is_library(&self) -> bool {
        matches!(self.origin, Origin::Library { .. })
    }

    /// File that holds the text of this node.
    pub fn source_file(&self) -> Option<&Utf8Path> {
        match &self.origin {
            Origin::Workspace => self.id.path(),
            Origin::Library { file, .. } => Some(file),
        }
    }

    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.decl.name == name)
    }

    pub fn local_declarations(&self) -> Vec<PropertyDecl> {
        self.properties.iter().map(|p| p.decl.clone()).collect()
    }
}

/// Classify a file by its name.
pub fn kind_for(path: &str, extensions: &[String]) -> NodeKind {
    let component = path.ends_with(".vue")
        || extensions
            .iter()
            .any(|ext| !ext.is_empty() && path.ends_with(ext.as_str()));
    if component {
        NodeKind::Component
    } else {
        NodeKind::PlainScript
    }
}

/// A composition together with the node versions it was built from, self
/// first, then each ancestor.
#[derive(Debug, Clone)]
pub struct Composition {
    pub document: ComposedDocument,
    pub versions: Vec<(FileId, u64)>,
    /// Increases with every stored composition; used as the engine version.
    pub serial: u64,
}
