//! The component workspace.
//!
//! Holds one [`FileNode`] per tracked file, the inheritance forest between
//! them, and the cached composition of each node. Compositions are built
//! lazily, parents first; concurrent requests for the same node version
//! share one composition through the [`Scheduler`].

use crate::graph::{Forest, GraphError};
use crate::library::{LibraryIndex, LibraryPackage};
use crate::loader::FileLoader;
use crate::node::{Composition, FileId, FileNode, NodeKind};
use crate::resolve::{Resolved, Resolver};
use crate::scheduler::{Role, Scheduler};
use crate::{lock, read, write};
use camino::{Utf8Path, Utf8PathBuf};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};
use ts_runner::{synthetic_file_name, TsConfig, TsError, TypeCheckEngine};
use vue_codegen::{compose, flatten, ComposeInput, ComposedDocument};
use vue_diagnostics::{Diagnostic, DiagnosticOptions};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("{0} is not part of the workspace")]
    NotFound(FileId),

    #[error("failed to read {path}: {message}")]
    Io { path: Utf8PathBuf, message: String },

    #[error("type checker request failed: {0}")]
    Engine(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl From<TsError> for WorkspaceError {
    fn from(err: TsError) -> Self {
        WorkspaceError::Engine(err.to_string())
    }
}

pub type CompositionResult = Result<Arc<Composition>, WorkspaceError>;

/// Settings derived from tsconfig.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    pub root: Utf8PathBuf,
    pub base_url: Option<Utf8PathBuf>,
    /// `paths` aliases and the directory their targets are relative to.
    pub aliases: IndexMap<String, Vec<String>>,
    pub paths_base: Option<Utf8PathBuf>,
    /// Component file extensions besides `.vue`.
    pub extensions: Vec<String>,
    pub diagnostics: DiagnosticOptions,
}

impl WorkspaceConfig {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn from_tsconfig(root: &Utf8Path, config: &TsConfig) -> Self {
        let options = &config.compiler_options;
        let dir = options
            .config_dir
            .as_deref()
            .and_then(|d| Utf8Path::from_path(d).map(Utf8Path::to_path_buf))
            .unwrap_or_else(|| root.to_path_buf());
        let vue = &config.vue_compiler_options;
        Self {
            root: root.to_path_buf(),
            base_url: options.base_url.as_ref().map(|base| dir.join(base)),
            aliases: options.paths.clone(),
            paths_base: options
                .paths_base()
                .and_then(|p| Utf8PathBuf::from_path_buf(p).ok()),
            extensions: vue.extensions.clone(),
            diagnostics: DiagnosticOptions {
                check_unknown_components: vue.check_unknown_components.unwrap_or(false),
                known_components: Vec::new(),
            },
        }
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(&self.root)
            .with_base_url(self.base_url.clone())
            .with_aliases(
                self.paths_base.clone().unwrap_or_else(|| self.root.clone()),
                self.aliases.clone(),
            )
            .with_extensions(self.extensions.clone())
    }
}

/// Links of a node to other nodes, recomputed whenever its text or the
/// set of files changes.
#[derive(Debug, Clone, Default)]
pub struct LinkState {
    /// Registration name -> registered component.
    pub components: HashMap<String, FileId>,
    /// Cycle and resolution problems.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkspaceStats {
    /// Compositions built.
    pub compositions: usize,
    /// Files read through the loader.
    pub loads: usize,
    /// Compositions thrown away because a node changed meanwhile.
    pub discarded: usize,
}

#[derive(Debug, Default)]
struct Counters {
    compositions: AtomicUsize,
    loads: AtomicUsize,
    discarded: AtomicUsize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    composition: Arc<Composition>,
    stale: bool,
}

/// Where new text for a file comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextSource {
    /// The editor, with its document version.
    Editor(i32),
    /// Read on demand; never replaces a tracked file.
    Loader,
    /// Re-read after the editor closed the file.
    Disk,
}

pub struct Workspace<E, L> {
    config: WorkspaceConfig,
    resolver: Resolver,
    pub(crate) engine: Arc<E>,
    loader: Arc<L>,
    nodes: RwLock<HashMap<FileId, Arc<FileNode>>>,
    forest: RwLock<Arc<Forest>>,
    links: RwLock<HashMap<FileId, LinkState>>,
    /// Nodes whose base file does not exist yet.
    pending: RwLock<BTreeSet<FileId>>,
    cache: RwLock<HashMap<FileId, CacheEntry>>,
    library: RwLock<Arc<LibraryIndex>>,
    compositions: Arc<Scheduler<(FileId, u64), CompositionResult>>,
    loads: Arc<Scheduler<FileId, Result<(), WorkspaceError>>>,
    /// Serial of the composition last sent to the engine, per node.
    synced: Mutex<HashMap<FileId, u64>>,
    next_version: AtomicU64,
    next_serial: AtomicU64,
    counters: Counters,
}

impl<E: TypeCheckEngine, L: FileLoader> Workspace<E, L> {
    pub fn new(config: WorkspaceConfig, loader: Arc<L>, engine: Arc<E>) -> Self {
        Self {
            resolver: config.resolver(),
            config,
            engine,
            loader,
            nodes: RwLock::default(),
            forest: RwLock::default(),
            links: RwLock::default(),
            pending: RwLock::default(),
            cache: RwLock::default(),
            library: RwLock::default(),
            compositions: Scheduler::new(),
            loads: Scheduler::new(),
            synced: Mutex::default(),
            next_version: AtomicU64::new(1),
            next_serial: AtomicU64::new(1),
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn node(&self, id: &FileId) -> Option<Arc<FileNode>> {
        read(&self.nodes).get(id).cloned()
    }

    /// Every tracked node id, in no particular order.
    pub fn file_ids(&self) -> Vec<FileId> {
        read(&self.nodes).keys().cloned().collect()
    }

    /// A snapshot of the inheritance forest.
    pub fn forest(&self) -> Arc<Forest> {
        read(&self.forest).clone()
    }

    pub fn library(&self) -> Arc<LibraryIndex> {
        read(&self.library).clone()
    }

    pub fn links(&self, id: &FileId) -> Option<LinkState> {
        read(&self.links).get(id).cloned()
    }

    pub fn stats(&self) -> WorkspaceStats {
        WorkspaceStats {
            compositions: self.counters.compositions.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
        }
    }

    fn bump(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed)
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        read(&self.nodes).contains_key(&FileId::from_path(path)) || self.loader.exists(path)
    }

    /// The editor opened a file.
    #[instrument(skip(self, text), fields(path = %path))]
    pub fn did_open(&self, path: &Utf8Path, text: &str, version: i32) -> bool {
        self.set_text(path, text, TextSource::Editor(version))
    }

    /// The editor changed a file. Changes carrying a version not newer
    /// than the stored one are ignored; returns whether the change applied.
    #[instrument(skip(self, text), fields(path = %path))]
    pub fn did_change(&self, path: &Utf8Path, text: &str, version: i32) -> bool {
        self.set_text(path, text, TextSource::Editor(version))
    }

    /// The editor closed a file; its text falls back to the disk contents.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn did_close(&self, path: &Utf8Path) -> Result<(), WorkspaceError> {
        self.reload(path).await
    }

    /// Re-read `path` from the loader, dropping it when it is gone.
    pub async fn reload(&self, path: &Utf8Path) -> Result<(), WorkspaceError> {
        if !self.loader.exists(path) {
            return self.did_delete(path).await;
        }
        let text = self.loader.load(path).await.map_err(|e| io_error(path, e))?;
        self.set_text(path, &text, TextSource::Disk);
        Ok(())
    }

    /// A file was deleted. Files extending it become roots.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn did_delete(&self, path: &Utf8Path) -> Result<(), WorkspaceError> {
        let id = FileId::from_path(path);
        if write(&self.nodes).remove(&id).is_none() {
            return Ok(());
        }
        let orphans = {
            let mut forest = write(&self.forest);
            Arc::make_mut(&mut forest).remove(&id)
        };
        write(&self.links).remove(&id);
        write(&self.pending).remove(&id);
        write(&self.cache).remove(&id);
        let synced = lock(&self.synced).remove(&id).is_some();

        // Files registering the deleted one as a component.
        let registering: Vec<FileId> = read(&self.links)
            .iter()
            .filter(|(_, state)| state.components.values().any(|target| *target == id))
            .map(|(node, _)| node.clone())
            .collect();
        for node in orphans.iter().chain(&registering) {
            self.link(node);
            self.invalidate(node);
        }
        debug!(orphans = orphans.len(), "removed file");

        if synced {
            self.engine
                .remove_document(&synthetic_file_name(id.as_str()))
                .await?;
        }
        Ok(())
    }

    fn set_text(&self, path: &Utf8Path, text: &str, source: TextSource) -> bool {
        let id = FileId::from_path(path);
        let editor_version = match source {
            TextSource::Editor(version) => Some(version),
            TextSource::Loader | TextSource::Disk => None,
        };
        let node = FileNode::analyze(
            id.clone(),
            Arc::from(text),
            &self.config.extensions,
            self.bump(),
            editor_version,
        );

        let is_new = {
            let mut nodes = write(&self.nodes);
            let existing = nodes.get(&id);
            let accepted = match (source, existing) {
                (TextSource::Loader, Some(_)) => false,
                (TextSource::Editor(version), Some(old)) => {
                    old.editor_version.map_or(true, |old| version > old)
                }
                _ => true,
            };
            if !accepted {
                debug!(path = %id, "ignoring outdated text");
                return false;
            }
            nodes.insert(id.clone(), Arc::new(node)).is_none()
        };

        self.link(&id);
        self.mark_stale(&id);
        if is_new {
            self.relink_pending();
        }
        true
    }

    /// Bump the version of `id` and mark its composition and those of its
    /// descendants stale. Nothing is recomposed until requested.
    #[instrument(skip(self), fields(path = %id))]
    pub fn invalidate(&self, id: &FileId) {
        {
            let mut nodes = write(&self.nodes);
            if let Some(node) = nodes.get_mut(id) {
                Arc::make_mut(node).version = self.bump();
            }
        }
        self.mark_stale(id);
    }

    fn mark_stale(&self, id: &FileId) {
        let descendants = self.forest().descendants(id);
        let mut cache = write(&self.cache);
        for node in std::iter::once(id).chain(&descendants) {
            if let Some(entry) = cache.get_mut(node) {
                entry.stale = true;
            }
        }
        if !descendants.is_empty() {
            trace!(path = %id, descendants = descendants.len(), "marked descendants stale");
        }
    }

    /// Resolve the base and the registered components of `id`.
    fn link(&self, id: &FileId) {
        let Some(node) = self.node(id) else {
            return;
        };
        let mut state = LinkState::default();
        let from = node.id.path();

        let mut parent = None;
        let mut is_pending = false;
        if let Some(base) = node.base() {
            let names: Vec<&str> = base.export.iter().map(String::as_str).collect();
            match self.resolve_target(from, &base.specifier, &names) {
                Target::Node(target) => parent = Some((target, base.span)),
                Target::External => {
                    trace!(path = %id, specifier = %base.specifier, "base component outside the workspace");
                }
                Target::Missing => {
                    debug!(path = %id, specifier = %base.specifier, "unresolved base component");
                    is_pending = true;
                    state
                        .diagnostics
                        .push(Diagnostic::unresolved_base(&base.specifier, base.span));
                }
            }
        }

        {
            let mut forest = write(&self.forest);
            let forest = Arc::make_mut(&mut forest);
            let result = match &parent {
                Some((target, _)) => forest.set_parent(id, Some(target)),
                None => forest.set_parent(id, None),
            };
            if let (Err(err), Some((target, span))) = (result, &parent) {
                warn!(%err, "rejected inheritance edge");
                state
                    .diagnostics
                    .push(Diagnostic::inheritance_cycle(target.as_str(), *span));
                // Detaching a node cannot fail.
                let _ = forest.set_parent(id, None);
            }
        }

        if is_pending {
            write(&self.pending).insert(id.clone());
        } else {
            write(&self.pending).remove(id);
        }

        for registered in node.registered() {
            let names: Vec<&str> = registered
                .member
                .iter()
                .chain(&registered.export)
                .map(String::as_str)
                .collect();
            match self.resolve_target(from, &registered.specifier, &names) {
                Target::Node(target) => {
                    state.components.insert(registered.name.clone(), target);
                }
                Target::External => {}
                Target::Missing => state.diagnostics.push(Diagnostic::unresolved_component(
                    &registered.name,
                    &registered.specifier,
                    registered.span,
                )),
            }
        }

        write(&self.links).insert(id.clone(), state);
    }

    /// Retry the links of nodes whose base did not exist.
    fn relink_pending(&self) {
        let pending: Vec<FileId> = read(&self.pending).iter().cloned().collect();
        for id in pending {
            self.link(&id);
            if !read(&self.pending).contains(&id) {
                debug!(path = %id, "linked pending base component");
                self.invalidate(&id);
            }
        }
    }

    fn resolve_target(&self, from: Option<&Utf8Path>, specifier: &str, exports: &[&str]) -> Target {
        let Some(from) = from else {
            return Target::External;
        };
        match self.resolver.resolve(from, specifier, |p| self.exists(p)) {
            Some(Resolved::File(path)) => Target::Node(FileId::from_path(&path)),
            Some(Resolved::Package { name, .. }) => {
                let library = self.library();
                if !library.has_package(&name) {
                    return Target::External;
                }
                exports
                    .iter()
                    .find_map(|export| library.export(&name, export))
                    .map_or(Target::Missing, |id| Target::Node(id.clone()))
            }
            None => Target::Missing,
        }
    }

    /// Replace the library components. Every workspace file is relinked.
    #[instrument(skip_all, fields(components = index.len()))]
    pub fn set_library(&self, index: LibraryIndex) {
        let index = Arc::new(index);
        let old = std::mem::replace(&mut *write(&self.library), index.clone());
        {
            let mut nodes = write(&self.nodes);
            let mut forest = write(&self.forest);
            let forest = Arc::make_mut(&mut forest);
            for component in old.components() {
                nodes.remove(&component.id);
                forest.remove(&component.id);
            }
            for component in index.components() {
                nodes.insert(component.id.clone(), Arc::new(component.to_node(self.bump())));
                forest.insert(component.id.clone());
            }
        }
        {
            let mut cache = write(&self.cache);
            cache.retain(|id, _| !id.is_library());
        }
        for shadowed in index.shadowed() {
            debug!(tag = %shadowed.tag, kept = %shadowed.kept, shadowed = %shadowed.shadowed, "library tag shadowed");
        }

        let workspace: Vec<FileId> = self
            .file_ids()
            .into_iter()
            .filter(|id| !id.is_library())
            .collect();
        for id in workspace {
            self.link(&id);
            self.invalidate(&id);
        }
    }

    /// Discover and scan the component libraries of the workspace.
    /// Packages that cannot be read are logged and skipped.
    pub fn load_libraries(
        &self,
        configured: &[String],
        declarations: &IndexMap<String, String>,
    ) -> Vec<LibraryPackage> {
        let packages = crate::library::discover_packages(&self.config.root, configured, declarations);
        self.set_library(LibraryIndex::scan(&packages));
        packages
    }

    /// The parent of `id`, loaded on demand.
    pub async fn resolve(&self, id: &FileId) -> Option<Arc<FileNode>> {
        let parent = self.forest().parent(id).cloned()?;
        self.ensure_node(&parent).await.ok()
    }

    /// The node for `id`, reading the file if it is not tracked yet.
    pub async fn ensure_node(&self, id: &FileId) -> Result<Arc<FileNode>, WorkspaceError> {
        loop {
            if let Some(node) = self.node(id) {
                return Ok(node);
            }
            let Some(path) = id.path() else {
                return Err(WorkspaceError::NotFound(id.clone()));
            };
            match self.loads.join(id.clone()) {
                Role::Waiter(waiter) => {
                    if let Some(Err(err)) = waiter.wait().await {
                        return Err(err);
                    }
                }
                Role::Leader(guard) => {
                    let result = self.load_file(path).await;
                    guard.complete(result.clone());
                    result?;
                }
            }
        }
    }

    async fn load_file(&self, path: &Utf8Path) -> Result<(), WorkspaceError> {
        if !self.loader.exists(path) {
            return Err(WorkspaceError::NotFound(FileId::from_path(path)));
        }
        let text = self.loader.load(path).await.map_err(|e| io_error(path, e))?;
        self.counters.loads.fetch_add(1, Ordering::Relaxed);
        trace!(%path, "loaded file on demand");
        self.set_text(path, &text, TextSource::Loader);
        Ok(())
    }

    /// The current composition of `id`, composing it and its ancestors as
    /// needed.
    pub fn composed<'a>(&'a self, id: &FileId) -> BoxFuture<'a, CompositionResult> {
        let id = id.clone();
        async move {
            loop {
                let node = self.ensure_node(&id).await?;
                if let Some(fresh) = self.fresh_composition(&id) {
                    return Ok(fresh);
                }

                match self.compositions.join((id.clone(), node.version)) {
                    Role::Waiter(waiter) => match waiter.wait().await {
                        Some(Ok(composition)) if self.is_current(&composition) => {
                            return Ok(composition)
                        }
                        Some(Err(err)) => return Err(err),
                        // Stale or abandoned; look again.
                        _ => {}
                    },
                    Role::Leader(guard) => {
                        let result = self.compose_node(&node).await;
                        let stored = match &result {
                            Ok(composition) => self.store(&id, composition.clone()),
                            Err(_) => false,
                        };
                        guard.complete(result.clone());
                        match result {
                            Ok(composition) if stored => return Ok(composition),
                            Ok(_) => {
                                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                                debug!(path = %id, version = node.version, "discarded stale composition");
                            }
                            Err(err) => return Err(err),
                        }
                    }
                }
            }
        }
        .boxed()
    }

    async fn compose_node(&self, node: &FileNode) -> CompositionResult {
        let parent = match self.forest().parent(&node.id).cloned() {
            Some(parent) => match self.composed(&parent).await {
                Ok(composition) => Some(composition),
                Err(err) => {
                    debug!(path = %node.id, %err, "composing without the base component");
                    None
                }
            },
            None => None,
        };

        let properties = flatten(
            &node.local_declarations(),
            parent.as_ref().map(|p| &p.document.properties),
        );
        let document = match (node.kind, &node.sections) {
            (NodeKind::Component, Some(sections)) => compose(
                ComposeInput {
                    text: &node.text,
                    sections,
                    script: &node.script,
                    template: node.template.as_ref(),
                },
                properties,
            ),
            _ => ComposedDocument {
                properties,
                ..ComposedDocument::identity(&node.text)
            },
        };

        let mut versions = vec![(node.id.clone(), node.version)];
        if let Some(parent) = &parent {
            versions.extend(parent.versions.iter().cloned());
        }
        self.counters.compositions.fetch_add(1, Ordering::Relaxed);
        trace!(path = %node.id, version = node.version, "composed");
        Ok(Arc::new(Composition {
            document,
            versions,
            serial: self.next_serial.fetch_add(1, Ordering::Relaxed),
        }))
    }

    /// Whether every node a composition was built from is unchanged.
    fn is_current(&self, composition: &Composition) -> bool {
        let nodes = read(&self.nodes);
        composition
            .versions
            .iter()
            .all(|(id, version)| nodes.get(id).is_some_and(|n| n.version == *version))
    }

    fn fresh_composition(&self, id: &FileId) -> Option<Arc<Composition>> {
        let entry = read(&self.cache).get(id).cloned()?;
        (!entry.stale && self.is_current(&entry.composition)).then_some(entry.composition)
    }

    /// Cache a composition unless something it was built from changed.
    fn store(&self, id: &FileId, composition: Arc<Composition>) -> bool {
        if !self.is_current(&composition) {
            return false;
        }
        write(&self.cache).insert(
            id.clone(),
            CacheEntry {
                composition,
                stale: false,
            },
        );
        true
    }

    /// The last composition built for `id`, current or not.
    pub fn last_composition(&self, id: &FileId) -> Option<Arc<Composition>> {
        read(&self.cache).get(id).map(|e| e.composition.clone())
    }

    /// Compose every tracked node. Unrelated nodes compose concurrently.
    pub async fn compose_all(&self) -> Vec<(FileId, CompositionResult)> {
        let mut ids = self.forest().topological_order();
        let known: BTreeSet<FileId> = ids.iter().cloned().collect();
        let mut rest: Vec<FileId> = self
            .file_ids()
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect();
        rest.sort();
        ids.extend(rest);

        join_all(ids.into_iter().map(|id| async move {
            let result = self.composed(&id).await;
            (id, result)
        }))
        .await
    }

    /// Compose `id` and hand the result to the engine if it has not seen
    /// it. Returns the engine file name and the composition.
    pub async fn sync(&self, id: &FileId) -> Result<(String, Arc<Composition>), WorkspaceError> {
        let composition = self.composed(id).await?;
        let file = synthetic_file_name(id.as_str());
        let seen = lock(&self.synced).get(id).copied();
        if seen != Some(composition.serial) {
            self.engine
                .update_document(&file, &composition.document.text, composition.serial)
                .await?;
            let mut synced = lock(&self.synced);
            let entry = synced.entry(id.clone()).or_insert(0);
            *entry = (*entry).max(composition.serial);
        }
        Ok((file, composition))
    }

    /// The component a template tag of `node` designates: a registered
    /// component first, then a library component.
    pub fn lookup_tag(&self, node: &FileNode, tag: &str) -> Option<FileId> {
        if let Some(registration) = node.script.registration(tag) {
            return read(&self.links)
                .get(&node.id)
                .and_then(|state| state.components.get(&registration.name))
                .cloned();
        }
        self.library().lookup_tag(tag).cloned()
    }

    /// Whether `tag` is registered for `node`, resolved or not.
    pub fn is_registered(&self, node: &FileNode, tag: &str) -> bool {
        node.script.registration(tag).is_some() || self.library().lookup_tag(tag).is_some()
    }
}

enum Target {
    Node(FileId),
    /// A package that contributes no components.
    External,
    Missing,
}

fn io_error(path: &Utf8Path, err: std::io::Error) -> WorkspaceError {
    WorkspaceError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use pretty_assertions::assert_eq;
    use std::io;
    use tokio::sync::Semaphore;
    use ts_runner::RecordingEngine;
    use vue_diagnostics::DiagnosticCode;

    /// A loader that blocks every read until a permit is released.
    struct GatedLoader {
        inner: MemoryLoader,
        gate: Semaphore,
    }

    impl GatedLoader {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                inner: MemoryLoader::with_files(files.iter().copied()),
                gate: Semaphore::new(0),
            }
        }
    }

    impl FileLoader for GatedLoader {
        async fn load(&self, path: &Utf8Path) -> io::Result<String> {
            let permit = self.gate.acquire().await.map_err(io::Error::other)?;
            permit.forget();
            self.inner.load(path).await
        }

        fn exists(&self, path: &Utf8Path) -> bool {
            self.inner.exists(path)
        }
    }

    type TestWorkspace<L = MemoryLoader> = Workspace<RecordingEngine, L>;

    fn workspace(files: &[(&str, &str)]) -> TestWorkspace {
        Workspace::new(
            WorkspaceConfig::new("/w"),
            Arc::new(MemoryLoader::with_files(files.iter().copied())),
            Arc::new(RecordingEngine::new()),
        )
    }

    fn component(class: &str, base: Option<&str>, members: &str) -> String {
        let (import, extends) = match base {
            Some(base) => (format!("import {0} from './{0}.vue'\n", base), base.to_string()),
            None => (String::new(), "Vue".to_string()),
        };
        format!(
            "<template><p>{{{{ {class_lower} }}}}</p></template>\n<script lang=\"ts\">\n{import}@Component\nexport default class {class} extends {extends} {{\n{members}\n}}\n</script>\n",
            class_lower = class.to_lowercase(),
        )
    }

    fn path(name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("/w/{}.vue", name))
    }

    fn id(name: &str) -> FileId {
        FileId::from_path(&path(name))
    }

    #[tokio::test]
    async fn test_child_composes_with_inherited_members() {
        let ws = workspace(&[("/w/A.vue", component("A", None, "  x: string = ''").as_str())]);
        ws.did_open(&path("B"), &component("B", Some("A"), "  b = 1"), 1);

        let composition = ws.composed(&id("B")).await.unwrap();
        let inherited = composition.document.properties.get("x").unwrap();
        assert_eq!(inherited.type_text.as_deref(), Some("string"));
        assert_eq!(inherited.depth, 1);
        assert!(composition
            .document
            .text
            .contains("type __VcInherited = { x: string; };"));
        assert_eq!(composition.versions.len(), 2);
        // A was read from the loader on demand.
        assert_eq!(ws.stats().loads, 1);
        assert_eq!(ws.forest().parent(&id("B")), Some(&id("A")));
    }

    #[tokio::test]
    async fn test_cached_composition_is_reused() {
        let ws = workspace(&[]);
        ws.did_open(&path("A"), &component("A", None, "  x = 1"), 1);
        let first = ws.composed(&id("A")).await.unwrap();
        let second = ws.composed(&id("A")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(ws.stats().compositions, 1);
    }

    #[tokio::test]
    async fn test_parent_edit_recomposes_child() {
        let ws = workspace(&[]);
        ws.did_open(&path("A"), &component("A", None, "  x: string = ''"), 1);
        ws.did_open(&path("B"), &component("B", Some("A"), ""), 1);
        let before = ws.composed(&id("B")).await.unwrap();
        let child_version = ws.node(&id("B")).unwrap().version;

        assert!(ws.did_change(&path("A"), &component("A", None, "  x: number = 0"), 2));
        let after = ws.composed(&id("B")).await.unwrap();

        assert_ne!(before.document.text, after.document.text);
        assert_eq!(
            after.document.properties.get("x").unwrap().type_text.as_deref(),
            Some("number")
        );
        // The child itself was not touched.
        assert_eq!(ws.node(&id("B")).unwrap().version, child_version);
    }

    #[tokio::test]
    async fn test_outdated_editor_version_is_ignored() {
        let ws = workspace(&[]);
        assert!(ws.did_open(&path("A"), &component("A", None, "  x = 1"), 3));
        assert!(!ws.did_change(&path("A"), &component("A", None, "  y = 1"), 3));
        assert!(!ws.did_change(&path("A"), &component("A", None, "  y = 1"), 2));
        assert_eq!(ws.node(&id("A")).unwrap().properties[0].decl.name, "x");
        assert!(ws.did_change(&path("A"), &component("A", None, "  y = 1"), 4));
        assert_eq!(ws.node(&id("A")).unwrap().properties[0].decl.name, "y");
    }

    #[tokio::test]
    async fn test_cycle_is_reported_and_node_stays_root() {
        let ws = workspace(&[]);
        ws.did_open(&path("A"), &component("A", None, ""), 1);
        ws.did_open(&path("B"), &component("B", Some("A"), ""), 1);
        ws.did_change(&path("A"), &component("A", Some("B"), ""), 2);

        assert_eq!(ws.forest().parent(&id("A")), None);
        assert_eq!(ws.forest().parent(&id("B")), Some(&id("A")));
        let links = ws.links(&id("A")).unwrap();
        assert_eq!(links.diagnostics.len(), 1);
        assert_eq!(links.diagnostics[0].code, DiagnosticCode::InheritanceCycle);

        // Both still compose.
        assert!(ws.composed(&id("A")).await.is_ok());
        assert!(ws.composed(&id("B")).await.is_ok());
    }

    #[tokio::test]
    async fn test_pending_parent_is_linked_when_opened() {
        let ws = workspace(&[]);
        ws.did_open(&path("B"), &component("B", Some("A"), ""), 1);
        let links = ws.links(&id("B")).unwrap();
        assert_eq!(links.diagnostics[0].code, DiagnosticCode::UnresolvedBase);
        let lonely = ws.composed(&id("B")).await.unwrap();
        assert!(lonely.document.properties.get("x").is_none());

        ws.did_open(&path("A"), &component("A", None, "  x = 1"), 1);
        assert_eq!(ws.forest().parent(&id("B")), Some(&id("A")));
        assert!(ws.links(&id("B")).unwrap().diagnostics.is_empty());
        let linked = ws.composed(&id("B")).await.unwrap();
        assert!(linked.document.properties.get("x").is_some());
    }

    #[tokio::test]
    async fn test_deleting_parent_orphans_children() {
        let ws = workspace(&[]);
        ws.did_open(&path("A"), &component("A", None, "  x = 1"), 1);
        ws.did_open(&path("B"), &component("B", Some("A"), ""), 1);
        ws.composed(&id("B")).await.unwrap();

        ws.did_delete(&path("A")).await.unwrap();
        assert_eq!(ws.forest().parent(&id("B")), None);
        assert_eq!(
            ws.links(&id("B")).unwrap().diagnostics[0].code,
            DiagnosticCode::UnresolvedBase
        );
        let composition = ws.composed(&id("B")).await.unwrap();
        assert!(composition.document.properties.get("x").is_none());
    }

    #[tokio::test]
    async fn test_close_reverts_to_disk_text() {
        let ws = workspace(&[("/w/A.vue", component("A", None, "  disk = 1").as_str())]);
        ws.did_open(&path("A"), &component("A", None, "  edited = 1"), 1);
        ws.did_close(&path("A")).await.unwrap();
        let node = ws.node(&id("A")).unwrap();
        assert_eq!(node.properties[0].decl.name, "disk");
        assert_eq!(node.editor_version, None);
    }

    #[tokio::test]
    async fn test_waiters_share_one_parent_composition() {
        let loader = Arc::new(GatedLoader::new(&[("/w/Q.vue", component("Q", None, "  q = 1").as_str())]));
        let ws: Arc<TestWorkspace<GatedLoader>> = Arc::new(Workspace::new(
            WorkspaceConfig::new("/w"),
            loader.clone(),
            Arc::new(RecordingEngine::new()),
        ));
        ws.did_open(&path("P"), &component("P", Some("Q"), "  p = 1"), 1);
        ws.did_open(&path("B"), &component("B", Some("P"), ""), 1);
        ws.did_open(&path("C"), &component("C", Some("P"), ""), 1);

        let b = tokio::spawn({
            let ws = ws.clone();
            async move { ws.composed(&id("B")).await }
        });
        let c = tokio::spawn({
            let ws = ws.clone();
            async move { ws.composed(&id("C")).await }
        });
        // Let both children reach the wait on P, which is stuck reading Q.
        while !ws.compositions.is_in_flight(&(id("P"), ws.node(&id("P")).unwrap().version)) {
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        loader.gate.add_permits(1);

        let b = b.await.unwrap().unwrap();
        let c = c.await.unwrap().unwrap();
        assert!(b.document.properties.get("q").is_some());
        assert!(c.document.properties.get("p").is_some());
        // Q, P, B and C once each.
        let stats = ws.stats();
        assert_eq!(stats.compositions, 4);
        assert_eq!(stats.loads, 1);
        assert_eq!(ws.compositions.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_edit_during_composition_discards_result() {
        let loader = Arc::new(GatedLoader::new(&[("/w/Q.vue", component("Q", None, "  q = 1").as_str())]));
        let ws: Arc<TestWorkspace<GatedLoader>> = Arc::new(Workspace::new(
            WorkspaceConfig::new("/w"),
            loader.clone(),
            Arc::new(RecordingEngine::new()),
        ));
        ws.did_open(&path("B"), &component("B", Some("Q"), "  old = 1"), 1);
        let pending = tokio::spawn({
            let ws = ws.clone();
            async move { ws.composed(&id("B")).await }
        });
        while ws.compositions.in_flight() == 0 {
            tokio::task::yield_now().await;
        }

        ws.did_change(&path("B"), &component("B", Some("Q"), "  new = 1"), 2);
        loader.gate.add_permits(1);

        let composition = pending.await.unwrap().unwrap();
        assert!(composition.document.properties.get("new").is_some());
        assert!(composition.document.properties.get("q").is_some());
        assert_eq!(ws.stats().discarded, 1);
    }

    #[tokio::test]
    async fn test_sync_pushes_each_composition_once() {
        let ws = workspace(&[]);
        ws.did_open(&path("A"), &component("A", None, "  x = 1"), 1);
        let (file, composition) = ws.sync(&id("A")).await.unwrap();
        ws.sync(&id("A")).await.unwrap();
        assert_eq!(file, "/w/A.vue.ts");
        assert_eq!(
            ws.engine().document(&file),
            Some((composition.document.text.clone(), composition.serial))
        );
        let updates = ws
            .engine()
            .calls()
            .iter()
            .filter(|call| matches!(call, ts_runner::EngineCall::Update { .. }))
            .count();
        assert_eq!(updates, 1);
    }

    #[tokio::test]
    async fn test_compose_all_in_dependency_order() {
        let ws = workspace(&[]);
        ws.did_open(&path("B"), &component("B", Some("A"), ""), 1);
        ws.did_open(&path("A"), &component("A", None, "  x = 1"), 1);
        ws.did_open(&Utf8PathBuf::from("/w/util.ts"), "export const n = 1;", 1);
        let results = ws.compose_all().await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        let position = |name: &FileId| results.iter().position(|(id, _)| id == name).unwrap();
        assert!(position(&id("A")) < position(&id("B")));
    }

    #[tokio::test]
    async fn test_hash_in_directory_name_is_a_workspace_file() {
        let ws = workspace(&[("/w/C#/A.vue", component("A", None, "  x = 1").as_str())]);
        let child = Utf8PathBuf::from("/w/C#/B.vue");
        ws.did_open(&child, &component("B", Some("A"), ""), 1);

        let child_id = FileId::from_path(&child);
        assert!(!child_id.is_library());
        let composition = ws.composed(&child_id).await.unwrap();
        assert!(composition.document.properties.get("x").is_some());
        assert_eq!(
            ws.forest().parent(&child_id),
            Some(&FileId::new("/w/C#/A.vue"))
        );
    }

    #[tokio::test]
    async fn test_configured_extension_opens_as_component() {
        let mut config = WorkspaceConfig::new("/w");
        config.extensions = vec![".cvue".into()];
        let ws: TestWorkspace = Workspace::new(
            config,
            Arc::new(MemoryLoader::default()),
            Arc::new(RecordingEngine::new()),
        );
        let file = Utf8PathBuf::from("/w/X.cvue");
        ws.did_open(&file, &component("X", None, "  n = 1"), 1);

        let node = ws.node(&FileId::from_path(&file)).unwrap();
        assert_eq!(node.kind, NodeKind::Component);
        assert!(node.template.is_some());
    }
}
