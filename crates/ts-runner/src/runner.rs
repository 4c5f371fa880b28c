//! TypeScript compiler runner.

use crate::config::TsConfig;
use crate::diagnostics::{parse_ts_output, DiagnosticRemapper, TsDiagnostics};
use crate::virtual_files::VirtualFileSystem;
use crate::{TsError, TsResult};
use source_map::{OffsetMap, Span};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Options for the TypeScript runner.
#[derive(Debug, Clone, Default)]
pub struct TsRunnerOptions {
    /// Use tsgo instead of tsc.
    pub use_tsgo: bool,
    /// Additional compiler arguments.
    pub tsc_args: Vec<String>,
    /// Directory for the virtual tree. Defaults to `.vue-class-check` in
    /// the workspace so that `node_modules` lookups still succeed.
    pub out_dir: Option<PathBuf>,
}

/// Runs `tsc` or `tsgo` over a virtual tree of synthetic documents.
#[derive(Debug)]
pub struct TsRunner {
    /// Workspace root.
    workspace: PathBuf,
    /// Options.
    options: TsRunnerOptions,
    /// Virtual file system.
    vfs: VirtualFileSystem,
    /// Diagnostic remapper.
    remapper: DiagnosticRemapper,
}

impl TsRunner {
    /// Create a new runner.
    pub fn new(workspace: &Path, options: TsRunnerOptions) -> Self {
        let out_dir = options
            .out_dir
            .clone()
            .unwrap_or_else(|| workspace.join(".vue-class-check"));
        Self {
            workspace: workspace.to_path_buf(),
            vfs: VirtualFileSystem::new(out_dir, workspace.to_path_buf()),
            options,
            remapper: DiagnosticRemapper::new(),
        }
    }

    /// The virtual tree.
    pub fn vfs(&self) -> &VirtualFileSystem {
        &self.vfs
    }

    /// Write a synthetic document for `original` and remember how to map
    /// diagnostics on it back.
    pub fn add_document(
        &mut self,
        original: &Path,
        original_text: &str,
        synthetic_text: &str,
        map: OffsetMap,
    ) -> TsResult<PathBuf> {
        let path = self.vfs.add(original, synthetic_text)?;
        self.remapper.register(
            path.clone(),
            original.to_path_buf(),
            map,
            original_text,
            synthetic_text,
        );
        Ok(path)
    }

    /// Copy a script file into the tree unchanged.
    pub fn add_script(&mut self, original: &Path, text: &str) -> TsResult<PathBuf> {
        let map = OffsetMap::identity(Span::new(0, text.len() as u32));
        self.add_document(original, text, text, map)
    }

    /// Drop a file from the tree.
    pub fn remove(&mut self, original: &Path) -> TsResult<()> {
        self.vfs.remove(original)
    }

    /// Delete the virtual tree.
    pub fn cleanup(&mut self) -> TsResult<()> {
        self.remapper = DiagnosticRemapper::new();
        self.vfs.cleanup()
    }

    /// Run type checking over everything added so far.
    pub async fn run(&self, config: &TsConfig) -> TsResult<TsDiagnostics> {
        let tsconfig = self.vfs.write_tsconfig(config)?;
        let output = self.run_compiler(&tsconfig).await?;

        let mut diagnostics = TsDiagnostics::new();
        for mut diag in parse_ts_output(&output) {
            // Paths are reported relative to the tree root.
            if let Some(file) = diag.file.take() {
                diag.file = Some(if file.is_absolute() {
                    file
                } else {
                    self.vfs.root().join(file)
                });
            }
            diagnostics.add(diag);
        }
        let reported = diagnostics.diagnostics.len();

        self.remapper.remap_all(&mut diagnostics);
        debug!(
            reported,
            kept = diagnostics.diagnostics.len(),
            "remapped checker diagnostics"
        );
        diagnostics.sort();
        Ok(diagnostics)
    }

    async fn run_compiler(&self, tsconfig: &Path) -> TsResult<String> {
        let mut cmd = if self.options.use_tsgo {
            self.tsgo_command()?
        } else {
            self.tsc_command()?
        };
        cmd.current_dir(self.vfs.root());
        cmd.arg("--noEmit").arg("--pretty").arg("false");
        cmd.arg("--project").arg(tsconfig);
        cmd.args(&self.options.tsc_args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        info!(project = %tsconfig.display(), "running type checker");
        let output = cmd
            .output()
            .await
            .map_err(|e| TsError::Process(format!("failed to run the type checker: {}", e)))?;

        // A non-zero exit only means diagnostics were reported.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(format!("{}{}", stdout, stderr))
    }

    fn tsc_command(&self) -> TsResult<Command> {
        let local = self.workspace.join("node_modules/.bin/tsc");
        if local.exists() {
            return Ok(Command::new(local));
        }
        if let Ok(global) = which::which("tsc") {
            return Ok(Command::new(global));
        }
        if let Ok(npx) = which::which("npx") {
            let mut cmd = Command::new(npx);
            cmd.arg("--no-install").arg("tsc");
            return Ok(cmd);
        }
        Err(TsError::NotFound {
            tool: "tsc",
            hint: "npm install -D typescript",
        })
    }

    fn tsgo_command(&self) -> TsResult<Command> {
        let local = self.workspace.join("node_modules/.bin/tsgo");
        if local.exists() {
            return Ok(Command::new(local));
        }
        which::which("tsgo")
            .map(Command::new)
            .map_err(|_| TsError::NotFound {
                tool: "tsgo",
                hint: "npm install -D @typescript/native-preview",
            })
    }
}
