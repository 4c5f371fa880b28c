//! Type checker integration for class components.
//!
//! This crate provides:
//! - The [`TypeCheckEngine`] boundary for checkers working on synthetic
//!   documents
//! - tsconfig loading, including the component compiler options
//! - A virtual file tree of synthetic documents and a `tsc`/`tsgo` runner
//! - Remapping of checker diagnostics back to component files

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod runner;
pub mod virtual_files;

pub use config::{CompilerOptions, TsConfig, VueCompilerOptions};
pub use diagnostics::{DiagnosticRemapper, TsDiagnostic, TsDiagnostics, TsSeverity};
pub use engine::{
    synthetic_file_name, EngineCall, EngineCompletion, EngineDiagnostic, EngineHover,
    EngineLocation, EngineToken, RecordingEngine, TypeCheckEngine,
};
pub use runner::{TsRunner, TsRunnerOptions};
pub use virtual_files::VirtualFileSystem;

use std::path::PathBuf;

/// Result type for TypeScript operations.
pub type TsResult<T> = Result<T, TsError>;

/// An error from TypeScript operations.
#[derive(Debug, thiserror::Error)]
pub enum TsError {
    /// A file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A config file is malformed.
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    /// The checker process failed to run.
    #[error("{0}")]
    Process(String),
    /// No checker executable was found.
    #[error("{tool} not found. Install it with: {hint}")]
    NotFound {
        tool: &'static str,
        hint: &'static str,
    },
    /// An engine request failed.
    #[error("type checker request failed: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_error_display() {
        let err = TsError::Config {
            path: PathBuf::from("tsconfig.json"),
            message: "expected value".into(),
        };
        assert_eq!(err.to_string(), "invalid config tsconfig.json: expected value");
    }
}
