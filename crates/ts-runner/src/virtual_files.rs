//! Virtual file tree of synthetic documents.
//!
//! The tree mirrors the workspace below its root: `src/App.vue` becomes
//! `<root>/src/App.vue.ts`, and script files are copied under their own
//! name so that relative imports between them keep resolving.

use crate::config::TsConfig;
use crate::{TsError, TsResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Virtual file system for managing generated TypeScript files.
#[derive(Debug)]
pub struct VirtualFileSystem {
    /// Root directory for virtual files.
    root: PathBuf,
    /// Workspace the tree mirrors.
    workspace: PathBuf,
    /// Original file to virtual file.
    files: HashMap<PathBuf, PathBuf>,
    /// Virtual file to original file.
    originals: HashMap<PathBuf, PathBuf>,
}

impl VirtualFileSystem {
    /// Create a virtual tree at `root` mirroring `workspace`.
    pub fn new(root: PathBuf, workspace: PathBuf) -> Self {
        Self {
            root,
            workspace,
            files: HashMap::new(),
            originals: HashMap::new(),
        }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The virtual path of an original file.
    pub fn virtual_path(&self, original: &Path) -> PathBuf {
        let relative = match original.strip_prefix(&self.workspace) {
            Ok(relative) => relative.to_path_buf(),
            // Outside the workspace: flatten into a hashed name.
            Err(_) => {
                let name = original
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "unnamed".to_string());
                let parent_hash = hash_path(original.parent().unwrap_or(Path::new("")));
                PathBuf::from(format!("__external/{}/{}", parent_hash, name))
            }
        };
        let mut path = self.root.join(relative);
        if !is_script_path(&path) {
            let mut name = path.file_name().unwrap_or_default().to_os_string();
            name.push(".ts");
            path.set_file_name(name);
        }
        path
    }

    /// Mirror a workspace directory (such as a `baseUrl`) into the tree.
    pub fn mirror_dir(&self, dir: &Path) -> PathBuf {
        match dir.strip_prefix(&self.workspace) {
            Ok(relative) => self.root.join(relative),
            Err(_) => dir.to_path_buf(),
        }
    }

    /// Write `content` as the virtual counterpart of `original`.
    pub fn add(&mut self, original: &Path, content: &str) -> TsResult<PathBuf> {
        let path = self.virtual_path(original);
        self.write(&path, content)?;
        self.files.insert(original.to_path_buf(), path.clone());
        self.originals.insert(path.clone(), original.to_path_buf());
        Ok(path)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, path: &Path, content: &str) -> TsResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| TsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| TsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Remove the virtual counterpart of `original`.
    pub fn remove(&mut self, original: &Path) -> TsResult<()> {
        let Some(path) = self.files.remove(original) else {
            return Ok(());
        };
        self.originals.remove(&path);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| TsError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Remove the whole tree.
    pub fn cleanup(&mut self) -> TsResult<()> {
        self.files.clear();
        self.originals.clear();
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|source| TsError::Io {
                path: self.root.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Get the original file for a virtual file.
    pub fn get_original(&self, virtual_path: &Path) -> Option<&Path> {
        self.originals.get(virtual_path).map(PathBuf::as_path)
    }

    /// Number of files in the tree.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write the tsconfig that checks the tree and return its path.
    pub fn write_tsconfig(&self, config: &TsConfig) -> TsResult<PathBuf> {
        let path = self.root.join("tsconfig.json");
        let content = generate_virtual_tsconfig(self, config);
        self.write(&path, &content)?;
        Ok(path)
    }
}

fn is_script_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "mts" | "cts" | "js" | "jsx")
    )
}

/// Generate a short hash for a path.
fn hash_path(path: &Path) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    format!("{:06x}", hasher.finish() & 0xFF_FFFF)
}

/// A tsconfig for the virtual tree carrying over the settings that affect
/// checking of synthetic documents.
pub fn generate_virtual_tsconfig(vfs: &VirtualFileSystem, config: &TsConfig) -> String {
    let options = &config.compiler_options;
    let mut compiler_options = serde_json::json!({
        "noEmit": true,
        "skipLibCheck": options.skip_lib_check.unwrap_or(true),
        "strict": options.is_strict(),
        "experimentalDecorators": options.experimental_decorators.unwrap_or(true),
        "target": options.target.as_deref().unwrap_or("ES2020"),
        "module": options.module.as_deref().unwrap_or("ESNext"),
        "moduleResolution": options.module_resolution.as_deref().unwrap_or("Node"),
    });
    if let Some(base) = options.paths_base() {
        compiler_options["baseUrl"] =
            serde_json::Value::String(vfs.mirror_dir(&base).to_string_lossy().to_string());
        compiler_options["paths"] = serde_json::json!(options.paths);
    }

    let config = serde_json::json!({
        "compilerOptions": compiler_options,
        "include": ["**/*.ts", "**/*.tsx"],
    });
    serde_json::to_string_pretty(&config).unwrap_or_default()
}
