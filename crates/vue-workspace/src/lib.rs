//! Cross-file component workspace.
//!
//! Tracks every component, declaration and script file of a project, links
//! each class to the class it extends, and composes the virtual document of
//! a component once its ancestors are composed. Editor requests are answered
//! through a [`TypeCheckEngine`](ts_runner::TypeCheckEngine) on the composed
//! documents.

pub mod features;
pub mod graph;
pub mod library;
pub mod loader;
pub mod node;
pub mod resolve;
pub mod scheduler;
pub mod workspace;

pub use features::{Completion, Hover, Location, SemanticToken};
pub use graph::{Forest, GraphError};
pub use library::{discover_packages, LibraryComponent, LibraryError, LibraryIndex, LibraryPackage};
pub use loader::{DiskLoader, FileLoader, MemoryLoader};
pub use node::{Composition, FileId, FileNode, NodeKind, Origin};
pub use resolve::{Resolved, Resolver};
pub use scheduler::Scheduler;
pub use workspace::{
    CompositionResult, LinkState, Workspace, WorkspaceConfig, WorkspaceError, WorkspaceStats,
};

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Poisoned locks are recovered; no critical section leaves its data half
// written.

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
