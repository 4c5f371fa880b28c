//! Components shipped as type declarations by third-party packages.
//!
//! A package opts in through `vueCompilerOptions.componentLibraries` or a
//! `"vueClassComponents"` field in its own `package.json`. Every exported
//! class under its declaration glob becomes a parent-less node registered
//! globally under its class name and its kebab-case name.

use crate::node::{FileId, FileNode, NodeKind, NodeProperty, Origin};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobMatcher};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Deserialize;
use source_map::{LineIndex, Span};
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace, warn};
use vue_codegen::helpers::{to_kebab_case, to_pascal_case};
use vue_codegen::{analyze_declarations, DeclaredClass, ScriptAnalysis};
use walkdir::WalkDir;

pub const DEFAULT_DECLARATIONS: &str = "types/**/*.d.ts";

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid package manifest {path}: {message}")]
    Manifest { path: Utf8PathBuf, message: String },

    #[error("invalid declaration glob '{glob}': {source}")]
    Glob {
        glob: String,
        #[source]
        source: globset::Error,
    },
}

/// A package contributing components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPackage {
    pub name: String,
    pub dir: Utf8PathBuf,
    /// Glob of declaration files, relative to `dir`.
    pub declarations: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    peer_dependencies: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    vue_class_components: Option<LibraryFlag>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LibraryFlag {
    Enabled(bool),
    Options { declarations: Option<String> },
}

impl PackageManifest {
    fn read(path: &Utf8Path) -> Result<Option<Self>, LibraryError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LibraryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| LibraryError::Manifest {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// The declaration glob if the package flags itself as a library.
    fn library_glob(&self) -> Option<String> {
        match self.vue_class_components.as_ref()? {
            LibraryFlag::Enabled(true) => Some(DEFAULT_DECLARATIONS.to_string()),
            LibraryFlag::Enabled(false) => None,
            LibraryFlag::Options { declarations } => Some(
                declarations
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DECLARATIONS.to_string()),
            ),
        }
    }

    /// Like `read`, but a manifest that cannot be read or parsed is logged
    /// and treated as absent.
    fn read_or_skip(path: &Utf8Path) -> Option<Self> {
        Self::read(path).unwrap_or_else(|err| {
            warn!(%err, "skipping package manifest");
            None
        })
    }

    fn dependency_names(&self) -> impl Iterator<Item = &String> {
        self.dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .chain(self.peer_dependencies.keys())
    }
}

/// Find library packages of the workspace at `root`, in precedence order:
/// the configured list first, then flagged dependencies in the order the
/// workspace `package.json` lists them. Broken manifests are skipped.
pub fn discover_packages(
    root: &Utf8Path,
    configured: &[String],
    declarations: &IndexMap<String, String>,
) -> Vec<LibraryPackage> {
    let node_modules = root.join("node_modules");
    let mut packages = Vec::new();
    let mut seen = HashSet::new();

    for name in configured {
        if !seen.insert(name.clone()) {
            continue;
        }
        let dir = node_modules.join(name);
        let manifest = PackageManifest::read_or_skip(&dir.join("package.json"));
        let glob = declarations
            .get(name)
            .cloned()
            .or_else(|| manifest.and_then(|m| m.library_glob()))
            .unwrap_or_else(|| DEFAULT_DECLARATIONS.to_string());
        packages.push(LibraryPackage {
            name: name.clone(),
            dir,
            declarations: glob,
        });
    }

    let Some(workspace) = PackageManifest::read_or_skip(&root.join("package.json")) else {
        return packages;
    };
    for name in workspace.dependency_names() {
        if seen.contains(name) {
            continue;
        }
        let dir = node_modules.join(name);
        let Some(manifest) = PackageManifest::read_or_skip(&dir.join("package.json")) else {
            trace!(package = %name, "dependency is not installed or unreadable");
            continue;
        };
        if let Some(glob) = manifest.library_glob() {
            seen.insert(name.clone());
            packages.push(LibraryPackage {
                name: name.clone(),
                declarations: declarations.get(name).cloned().unwrap_or(glob),
                dir,
            });
        }
    }
    packages
}

/// A class exported by a library package.
#[derive(Debug, Clone)]
pub struct LibraryComponent {
    pub id: FileId,
    pub package: String,
    pub export: String,
    pub file: Utf8PathBuf,
    pub text: Arc<str>,
    /// Span of the class name in `file`.
    pub span: Span,
    /// Own members merged over those of same-package base classes.
    pub properties: Vec<NodeProperty>,
}

impl LibraryComponent {
    /// The parent-less node standing for this class.
    pub fn to_node(&self, version: u64) -> FileNode {
        FileNode {
            id: self.id.clone(),
            kind: NodeKind::ComponentDeclaration,
            origin: Origin::Library {
                package: self.package.clone(),
                export: self.export.clone(),
                file: self.file.clone(),
            },
            version,
            editor_version: None,
            lines: LineIndex::new(&self.text),
            text: self.text.clone(),
            sections: None,
            script: ScriptAnalysis {
                class_name: Some(self.export.clone()),
                name_span: Some(self.span),
                ..Default::default()
            },
            template: None,
            properties: self.properties.clone(),
            class_span: Some(self.span),
            diagnostics: Vec::new(),
        }
    }
}

/// A tag claimed by an earlier package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedTag {
    pub tag: String,
    pub kept: FileId,
    pub shadowed: FileId,
}

/// All library components of the workspace.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    components: IndexMap<FileId, LibraryComponent>,
    tags: HashMap<String, FileId>,
    shadowed: Vec<ShadowedTag>,
    packages: Vec<String>,
}

impl LibraryIndex {
    /// Scan `packages` in precedence order. A package that cannot be
    /// scanned is logged and left out.
    pub fn scan(packages: &[LibraryPackage]) -> Self {
        let mut index = Self::default();
        for package in packages {
            let components = match scan_package(package) {
                Ok(components) => components,
                Err(err) => {
                    warn!(package = %package.name, %err, "skipping component library");
                    continue;
                }
            };
            index.packages.push(package.name.clone());
            debug!(package = %package.name, components = components.len(), "scanned component library");
            for component in components {
                index.add(component);
            }
        }
        index
    }

    fn add(&mut self, component: LibraryComponent) {
        if self.components.contains_key(&component.id) {
            return;
        }
        let mut tags = vec![component.export.clone()];
        let kebab = to_kebab_case(&component.export);
        if kebab != component.export {
            tags.push(kebab);
        }
        for tag in tags {
            match self.tags.get(&tag) {
                Some(kept) => {
                    debug!(%tag, kept = %kept, shadowed = %component.id, "library tag already registered");
                    self.shadowed.push(ShadowedTag {
                        tag,
                        kept: kept.clone(),
                        shadowed: component.id.clone(),
                    });
                }
                None => {
                    self.tags.insert(tag, component.id.clone());
                }
            }
        }
        self.components.insert(component.id.clone(), component);
    }

    pub fn component(&self, id: &FileId) -> Option<&LibraryComponent> {
        self.components.get(id)
    }

    pub fn components(&self) -> impl Iterator<Item = &LibraryComponent> {
        self.components.values()
    }

    /// The component registered for a template tag.
    pub fn lookup_tag(&self, tag: &str) -> Option<&FileId> {
        self.tags
            .get(tag)
            .or_else(|| self.tags.get(&to_pascal_case(tag)))
    }

    /// The component exported as `export` by `package`.
    pub fn export(&self, package: &str, export: &str) -> Option<&FileId> {
        self.components
            .get_key_value(&FileId::library(package, export))
            .map(|(id, _)| id)
    }

    /// Whether `name` was scanned as a component library.
    pub fn has_package(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p == name)
    }

    pub fn shadowed(&self) -> &[ShadowedTag] {
        &self.shadowed
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

fn declaration_matcher(glob: &str) -> Result<GlobMatcher, LibraryError> {
    Glob::new(glob)
        .map(|g| g.compile_matcher())
        .map_err(|source| LibraryError::Glob {
            glob: glob.to_string(),
            source,
        })
}

fn declaration_files(package: &LibraryPackage) -> Result<Vec<Utf8PathBuf>, LibraryError> {
    let matcher = declaration_matcher(&package.declarations)?;
    let mut files: Vec<Utf8PathBuf> = WalkDir::new(&package.dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != "node_modules")
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::from_path_buf(e.into_path()).ok())
        .filter(|path| {
            path.strip_prefix(&package.dir)
                .is_ok_and(|relative| matcher.is_match(relative))
        })
        .collect();
    files.sort();
    Ok(files)
}

struct ScannedClass<'a> {
    class: &'a DeclaredClass,
    file: &'a Utf8Path,
}

fn scan_package(package: &LibraryPackage) -> Result<Vec<LibraryComponent>, LibraryError> {
    let files = declaration_files(package)?;
    let parsed = files
        .par_iter()
        .filter_map(|path| {
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%path, %err, "skipping unreadable declaration file");
                    return None;
                }
            };
            let analysis = analyze_declarations(&text);
            if !analysis.errors.is_empty() {
                debug!(%path, errors = analysis.errors.len(), "declaration file has syntax errors");
            }
            Some((path.clone(), Arc::<str>::from(text), analysis))
        })
        .collect::<Vec<_>>();

    let mut classes: IndexMap<&str, ScannedClass<'_>> = IndexMap::new();
    for (path, _, analysis) in &parsed {
        for class in &analysis.classes {
            classes.entry(class.name.as_str()).or_insert(ScannedClass { class, file: path });
        }
    }

    let mut components = Vec::new();
    for (path, text, analysis) in &parsed {
        for class in &analysis.classes {
            let export = class.export.clone().unwrap_or_else(|| class.name.clone());
            let mut visited = HashSet::new();
            components.push(LibraryComponent {
                id: FileId::library(&package.name, &export),
                package: package.name.clone(),
                export,
                file: path.clone(),
                text: text.clone(),
                span: class.span,
                properties: merged_properties(&classes, class, path, &mut visited),
            });
        }
    }
    Ok(components)
}

/// Members of `class` over those of the same-package classes it extends.
fn merged_properties(
    classes: &IndexMap<&str, ScannedClass<'_>>,
    class: &DeclaredClass,
    file: &Utf8Path,
    visited: &mut HashSet<String>,
) -> Vec<NodeProperty> {
    let mut merged: IndexMap<String, NodeProperty> = IndexMap::new();
    visited.insert(class.name.clone());
    if let Some(base) = class.extends.as_deref().and_then(|name| classes.get(name)) {
        if !visited.contains(&base.class.name) {
            for property in merged_properties(classes, base.class, base.file, visited) {
                merged.insert(property.decl.name.clone(), property);
            }
        }
    }
    for decl in &class.properties {
        merged.insert(
            decl.name.clone(),
            NodeProperty {
                decl: decl.clone(),
                file: file.to_path_buf(),
            },
        );
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(root: &Utf8Path, path: &str, content: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        write(
            &root,
            "package.json",
            r#"{ "dependencies": { "ui-kit": "1.0.0", "plain": "1.0.0" }, "devDependencies": { "other-kit": "2.0.0" } }"#,
        );
        write(&root, "node_modules/ui-kit/package.json", r#"{ "vueClassComponents": true }"#);
        write(
            &root,
            "node_modules/ui-kit/types/base.d.ts",
            "export declare class UiBase extends Vue { size: string; disabled: boolean; }",
        );
        write(
            &root,
            "node_modules/ui-kit/types/button.d.ts",
            "import { UiBase } from './base';\nexport declare class UiButton extends UiBase { label: string; size: 'small' | 'large'; }",
        );
        write(&root, "node_modules/plain/package.json", r#"{ "name": "plain" }"#);
        write(&root, "node_modules/plain/types/x.d.ts", "export declare class Plain {}");
        write(
            &root,
            "node_modules/other-kit/package.json",
            r#"{ "vueClassComponents": { "declarations": "dist/*.d.ts" } }"#,
        );
        write(
            &root,
            "node_modules/other-kit/dist/index.d.ts",
            "export declare class UiButton { variant: string; }\nexport declare class OtherCard { title: string; }",
        );
        (dir, root)
    }

    #[test]
    fn test_discover_flagged_packages_in_dependency_order() {
        let (_dir, root) = workspace();
        let packages = discover_packages(&root, &[], &IndexMap::new());
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ui-kit", "other-kit"]);
        assert_eq!(packages[0].declarations, DEFAULT_DECLARATIONS);
        assert_eq!(packages[1].declarations, "dist/*.d.ts");
    }

    #[test]
    fn test_configured_packages_come_first() {
        let (_dir, root) = workspace();
        let packages = discover_packages(&root, &["other-kit".to_string()], &IndexMap::new());
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["other-kit", "ui-kit"]);

        let index = LibraryIndex::scan(&packages);
        assert_eq!(
            index.lookup_tag("UiButton"),
            Some(&FileId::library("other-kit", "UiButton"))
        );
    }

    #[test]
    fn test_scan_registers_tags_and_inherits_within_package() {
        let (_dir, root) = workspace();
        let packages = discover_packages(&root, &[], &IndexMap::new());
        let index = LibraryIndex::scan(&packages);
        assert_eq!(index.len(), 4);
        assert!(index.has_package("other-kit"));
        assert!(!index.has_package("plain"));

        let button = FileId::library("ui-kit", "UiButton");
        assert_eq!(index.lookup_tag("ui-button"), Some(&button));
        assert_eq!(index.lookup_tag("UiButton"), Some(&button));
        assert_eq!(
            index.lookup_tag("other-card"),
            Some(&FileId::library("other-kit", "OtherCard"))
        );

        let component = index.component(&button).unwrap();
        let members: Vec<_> = component
            .properties
            .iter()
            .map(|p| (p.decl.name.as_str(), p.file.file_name().unwrap()))
            .collect();
        assert_eq!(
            members,
            vec![("size", "button.d.ts"), ("disabled", "base.d.ts"), ("label", "button.d.ts")]
        );

        let shadowed: Vec<_> = index.shadowed().iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(shadowed, vec!["UiButton", "ui-button"]);
        assert_eq!(index.shadowed()[0].kept, button);

        let node = component.to_node(3);
        assert!(node.is_library());
        assert_eq!(node.base(), None);
        assert_eq!(node.source_file(), Some(component.file.as_path()));
    }

    #[test]
    fn test_broken_manifests_are_skipped() {
        let (_dir, root) = workspace();
        write(
            &root,
            "package.json",
            r#"{ "dependencies": { "broken": "1.0.0", "ui-kit": "1.0.0", "garbled": "1.0.0" } }"#,
        );
        write(&root, "node_modules/broken/package.json", r#"{ "vueClassComponents": "yes" }"#);
        write(&root, "node_modules/garbled/package.json", "{ not json");

        let packages = discover_packages(&root, &["garbled".to_string()], &IndexMap::new());
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["garbled", "ui-kit"]);
        assert_eq!(packages[0].declarations, DEFAULT_DECLARATIONS);

        let index = LibraryIndex::scan(&packages);
        assert_eq!(
            index.lookup_tag("UiButton"),
            Some(&FileId::library("ui-kit", "UiButton"))
        );
    }

    #[test]
    fn test_invalid_glob_skips_only_that_package() {
        let (_dir, root) = workspace();
        let mut declarations = IndexMap::new();
        declarations.insert("other-kit".to_string(), "dist/[.d.ts".to_string());
        let packages = discover_packages(&root, &[], &declarations);
        let index = LibraryIndex::scan(&packages);
        assert!(index.has_package("ui-kit"));
        assert!(!index.has_package("other-kit"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_missing_workspace_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let packages = discover_packages(&root, &["kit".to_string()], &IndexMap::new());
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].dir, root.join("node_modules/kit"));
        assert!(LibraryIndex::scan(&packages).is_empty());
    }
}
