//! Batch checking of a workspace.

use crate::cli::Args;
use crate::config::{Config, FileRole};
use crate::output::{OutputFormatter, Report};
use camino::{Utf8Path, Utf8PathBuf};
use futures::future::join_all;
use miette::{IntoDiagnostic, Result, WrapErr};
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use ts_runner::{
    EngineCompletion, EngineDiagnostic, EngineHover, EngineLocation, EngineToken, TsDiagnostics,
    TsResult, TsRunner, TsRunnerOptions, TypeCheckEngine,
};
use vue_diagnostics::sort_diagnostics;
use vue_workspace::{CompositionResult, DiskLoader, FileId, NodeKind, Workspace};

/// Quiet period after a change before re-checking.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Result of a check run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub file_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub duration_ms: u64,
}

/// Engine for batch runs. Documents are checked by `tsc` over the virtual
/// tree, so no interactive request is ever answered.
#[derive(Debug, Default)]
pub struct OfflineEngine;

impl TypeCheckEngine for OfflineEngine {
    async fn update_document(&self, _file: &str, _text: &str, _version: u64) -> TsResult<()> {
        Ok(())
    }

    async fn remove_document(&self, _file: &str) -> TsResult<()> {
        Ok(())
    }

    async fn hover(&self, _file: &str, _offset: u32) -> TsResult<Option<EngineHover>> {
        Ok(None)
    }

    async fn completions(&self, _file: &str, _offset: u32) -> TsResult<Vec<EngineCompletion>> {
        Ok(Vec::new())
    }

    async fn definition(&self, _file: &str, _offset: u32) -> TsResult<Vec<EngineLocation>> {
        Ok(Vec::new())
    }

    async fn diagnostics(&self, _file: &str) -> TsResult<Vec<EngineDiagnostic>> {
        Ok(Vec::new())
    }

    async fn semantic_tokens(&self, _file: &str) -> TsResult<Vec<EngineToken>> {
        Ok(Vec::new())
    }
}

/// Files taking part in a check.
#[derive(Debug, Default)]
pub struct Discovered {
    pub components: Vec<Utf8PathBuf>,
    pub scripts: Vec<Utf8PathBuf>,
}

pub struct Orchestrator {
    config: Config,
    args: Args,
    formatter: OutputFormatter,
    workspace: Workspace<OfflineEngine, DiskLoader>,
}

impl Orchestrator {
    pub fn new(root: Utf8PathBuf, args: Args) -> Result<Self> {
        let config = Config::load(&root, &args)?;
        let workspace = Workspace::new(
            config.workspace_config.clone(),
            Arc::new(DiskLoader),
            Arc::new(OfflineEngine),
        );
        let packages = workspace.load_libraries(
            config.component_libraries(),
            &config.tsconfig.vue_compiler_options.library_declarations,
        );
        debug!(
            tsconfig = ?config.tsconfig_path,
            packages = packages.len(),
            components = workspace.library().len(),
            "component libraries loaded"
        );

        Ok(Self {
            formatter: OutputFormatter::new(args.output),
            config,
            args,
            workspace,
        })
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub async fn run_single_check(&mut self) -> Result<CheckResult> {
        let start = Instant::now();
        let files = self.find_files();
        info!(
            components = files.components.len(),
            scripts = files.scripts.len(),
            "discovered files"
        );

        let ids: Vec<FileId> = files
            .components
            .iter()
            .map(|path| FileId::from_path(path))
            .collect();
        let opened = join_all(ids.iter().map(|id| self.workspace.ensure_node(id)))
        .await;
        for (path, result) in files.components.iter().zip(opened) {
            if let Err(err) = result {
                warn!(%path, %err, "cannot read component");
            }
        }
        let compositions = self.workspace.compose_all().await;

        let mut reports = Vec::new();
        for path in &files.components {
            let Some(node) = self.workspace.node(&FileId::from_path(path)) else {
                continue;
            };
            let mut diagnostics = self.workspace.node_diagnostics(&node);
            sort_diagnostics(&mut diagnostics);
            reports.extend(
                diagnostics
                    .iter()
                    .map(|d| Report::from_diagnostic(path, &node.lines, d)),
            );
        }

        if !self.args.skip_typecheck {
            let checked = self.type_check(&files, &compositions).await?;
            reports.extend(checked.diagnostics.iter().map(Report::from_type_check));
        }

        for report in &reports {
            self.formatter.print(report);
        }
        let result = CheckResult {
            file_count: files.components.len(),
            error_count: reports.iter().filter(|r| r.is_error()).count(),
            warning_count: reports.iter().filter(|r| r.is_warning()).count(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        self.formatter.print_summary(&result);
        Ok(result)
    }

    /// Write the composed documents and scripts to the virtual tree and run
    /// the type checker over it.
    async fn type_check(
        &self,
        files: &Discovered,
        compositions: &[(FileId, CompositionResult)],
    ) -> Result<TsDiagnostics> {
        let options = TsRunnerOptions {
            use_tsgo: self.args.use_tsgo,
            tsc_args: Vec::new(),
            out_dir: None,
        };
        let mut runner = TsRunner::new(self.config.workspace.as_std_path(), options);

        for (id, result) in compositions {
            let Some(node) = self.workspace.node(id) else {
                continue;
            };
            if node.kind != NodeKind::Component || node.is_library() {
                continue;
            }
            let Some(path) = id.path() else {
                continue;
            };
            match result {
                Ok(composition) => {
                    runner
                        .add_document(
                            path.as_std_path(),
                            &node.text,
                            &composition.document.text,
                            composition.document.map.clone(),
                        )
                        .into_diagnostic()?;
                }
                Err(err) => warn!(%id, %err, "composition failed"),
            }
        }
        for path in &files.scripts {
            let text = tokio::fs::read_to_string(path)
                .await
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read {}", path))?;
            runner.add_script(path.as_std_path(), &text).into_diagnostic()?;
        }

        let diagnostics = runner
            .run(&self.config.tsconfig)
            .await
            .into_diagnostic()
            .wrap_err("type checking failed")?;
        if self.args.emit_virtual {
            eprintln!("Virtual tree kept at {}", runner.vfs().root().display());
        } else if let Err(err) = runner.cleanup() {
            warn!(%err, "cannot remove the virtual tree");
        }
        Ok(diagnostics)
    }

    /// Check once, then again after every relevant change.
    pub async fn run_watch_mode(&mut self) -> Result<()> {
        eprintln!("Starting watch mode...\n");
        if let Err(err) = self.run_single_check().await {
            eprintln!("{:?}", err);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .into_diagnostic()?;
        watcher
            .watch(self.config.workspace.as_std_path(), RecursiveMode::Recursive)
            .into_diagnostic()?;

        while let Some(event) = rx.recv().await {
            let mut changed = self.relevant_paths(&event);
            // Coalesce bursts of events into one re-check.
            while let Ok(Some(event)) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                changed.extend(self.relevant_paths(&event));
            }
            if changed.is_empty() {
                continue;
            }
            changed.sort();
            changed.dedup();

            for path in &changed {
                if let Err(err) = self.workspace.reload(path).await {
                    warn!(%path, %err, "cannot reload");
                }
            }
            eprintln!("File change detected. Rerunning...\n");
            if let Err(err) = self.run_single_check().await {
                eprintln!("{:?}", err);
            }
        }
        Ok(())
    }

    fn relevant_paths(&self, event: &Event) -> Vec<Utf8PathBuf> {
        event
            .paths
            .iter()
            .filter_map(|p| Utf8PathBuf::from_path_buf(p.clone()).ok())
            .filter(|p| self.config.role(p).is_some())
            .collect()
    }

    /// Component and script files under the workspace root.
    pub fn find_files(&self) -> Discovered {
        discover(&self.config)
    }
}

pub fn discover(config: &Config) -> Discovered {
    let mut found = Discovered::default();
    let walker = walkdir::WalkDir::new(&config.workspace)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != "node_modules");
    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            continue;
        };
        match config.role(path) {
            Some(FileRole::Component) => found.components.push(path.to_path_buf()),
            Some(FileRole::Script) => found.scripts.push(path.to_path_buf()),
            None => {}
        }
    }
    found
}
