//! Reading files that are not open in the editor.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::RwLock;

/// Source of file contents for files the editor has not opened.
pub trait FileLoader: Send + Sync + 'static {
    fn load(&self, path: &Utf8Path) -> impl Future<Output = io::Result<String>> + Send;

    /// Whether `path` names an existing file. Used while probing import
    /// candidates, so it must be cheap.
    fn exists(&self, path: &Utf8Path) -> bool;
}

/// Reads from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskLoader;

impl FileLoader for DiskLoader {
    async fn load(&self, path: &Utf8Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }
}

/// Files held in memory.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: RwLock<HashMap<Utf8PathBuf, String>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<P, T>(files: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: Into<Utf8PathBuf>,
        T: Into<String>,
    {
        let loader = Self::new();
        for (path, text) in files {
            loader.insert(path, text);
        }
        loader
    }

    pub fn insert(&self, path: impl Into<Utf8PathBuf>, text: impl Into<String>) {
        crate::write(&self.files).insert(path.into(), text.into());
    }

    pub fn remove(&self, path: &Utf8Path) -> Option<String> {
        crate::write(&self.files).remove(path)
    }
}

impl FileLoader for MemoryLoader {
    async fn load(&self, path: &Utf8Path) -> io::Result<String> {
        crate::read(&self.files).get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path))
        })
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        crate::read(&self.files).contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_memory_loader() {
        let loader = MemoryLoader::with_files([("/w/A.vue", "<template />")]);
        assert!(loader.exists(Utf8Path::new("/w/A.vue")));
        assert_eq!(loader.load(Utf8Path::new("/w/A.vue")).await.unwrap(), "<template />");

        let err = loader.load(Utf8Path::new("/w/B.vue")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        loader.remove(Utf8Path::new("/w/A.vue"));
        assert!(!loader.exists(Utf8Path::new("/w/A.vue")));
    }

    #[tokio::test]
    async fn test_disk_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("a.ts")).unwrap();
        std::fs::write(&path, "export {}").unwrap();
        assert!(DiskLoader.exists(&path));
        assert_eq!(DiskLoader.load(&path).await.unwrap(), "export {}");
        assert!(!DiskLoader.exists(&path.with_file_name("b.ts")));
    }
}
