//! Configuration loading.

use crate::cli::Args;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::{IntoDiagnostic, Result, WrapErr};
use ts_runner::TsConfig;
use vue_workspace::WorkspaceConfig;

const DEFAULT_IGNORES: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/.git/**",
    ".vue-class-check/**",
];

/// Extensions of plain scripts copied into the checked tree.
const SCRIPT_EXTENSIONS: &[&str] = &[".ts", ".tsx"];

/// What a discovered file is checked as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Component,
    Script,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: Utf8PathBuf,
    pub tsconfig_path: Option<Utf8PathBuf>,
    /// The parsed tsconfig, or defaults when there is none.
    pub tsconfig: TsConfig,
    pub workspace_config: WorkspaceConfig,
    /// Component extensions, `.vue` included.
    pub extensions: Vec<String>,
    ignore: GlobSet,
}

impl Config {
    pub fn load(workspace: &Utf8Path, args: &Args) -> Result<Self> {
        let tsconfig_path = match &args.project {
            Some(path) => Some(
                Utf8PathBuf::from_path_buf(path.clone())
                    .map_err(|path| miette::miette!("{} is not valid UTF-8", path.display()))?,
            ),
            None => TsConfig::find(workspace.as_std_path()),
        };
        let tsconfig = match &tsconfig_path {
            Some(path) => TsConfig::load(path.as_std_path())
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to load {}", path))?,
            None => TsConfig::default(),
        };

        let extensions = tsconfig
            .vue_compiler_options
            .file_extensions()
            .into_iter()
            .map(String::from)
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_IGNORES.iter().copied().chain(args.ignore.iter().map(String::as_str)) {
            let glob = Glob::new(pattern)
                .into_diagnostic()
                .wrap_err_with(|| format!("invalid ignore pattern `{}`", pattern))?;
            builder.add(glob);
        }
        let ignore = builder.build().into_diagnostic()?;

        Ok(Self {
            workspace: workspace.to_path_buf(),
            workspace_config: WorkspaceConfig::from_tsconfig(workspace, &tsconfig),
            tsconfig_path,
            tsconfig,
            extensions,
            ignore,
        })
    }

    /// How `path` takes part in the check, if at all.
    pub fn role(&self, path: &Utf8Path) -> Option<FileRole> {
        let relative = path.strip_prefix(&self.workspace).unwrap_or(path);
        if self.ignore.is_match(relative.as_std_path()) {
            return None;
        }
        let name = path.file_name()?;
        if self.extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            Some(FileRole::Component)
        } else if SCRIPT_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            Some(FileRole::Script)
        } else {
            None
        }
    }

    /// Packages configured to contribute components.
    pub fn component_libraries(&self) -> &[String] {
        &self.tsconfig.vue_compiler_options.component_libraries
    }
}
