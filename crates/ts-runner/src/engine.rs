//! The boundary to a type checker that works on synthetic documents.
//!
//! Every offset crossing this boundary is an offset into the synthetic
//! document registered under [`synthetic_file_name`]; callers translate
//! positions on both sides.

use crate::diagnostics::TsSeverity;
use crate::TsResult;
use source_map::Span;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

/// The logical file a synthetic document is registered under.
pub fn synthetic_file_name(original: &str) -> String {
    if original.ends_with(".ts") || original.ends_with(".tsx") {
        original.to_string()
    } else {
        format!("{}.ts", original)
    }
}

/// Hover information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineHover {
    /// Rendered type or documentation.
    pub text: String,
    /// The hovered range.
    pub span: Span,
}

/// A completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCompletion {
    /// Inserted label.
    pub label: String,
    /// Kind reported by the checker (`property`, `method`, ...).
    pub kind: Option<String>,
    /// Type or signature detail.
    pub detail: Option<String>,
}

/// A location in some synthetic document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLocation {
    /// Logical file name.
    pub file: String,
    /// Range in that file.
    pub span: Span,
}

/// A diagnostic in a synthetic document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDiagnostic {
    /// Message text.
    pub message: String,
    /// Numeric checker code.
    pub code: u32,
    /// Severity.
    pub severity: TsSeverity,
    /// Range in the synthetic document.
    pub span: Span,
}

/// A classified range for semantic highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineToken {
    /// Range in the synthetic document.
    pub span: Span,
    /// Token type (`property`, `variable`, `class`, ...).
    pub kind: String,
    /// Modifier bit set.
    pub modifiers: u32,
}

/// A type checker fed with synthetic documents.
///
/// Implementations are shared between tasks; calls for different files may
/// run concurrently.
pub trait TypeCheckEngine: Send + Sync + 'static {
    /// Register or replace a document.
    fn update_document(
        &self,
        file: &str,
        text: &str,
        version: u64,
    ) -> impl Future<Output = TsResult<()>> + Send;

    /// Forget a document.
    fn remove_document(&self, file: &str) -> impl Future<Output = TsResult<()>> + Send;

    /// Hover at `offset`.
    fn hover(
        &self,
        file: &str,
        offset: u32,
    ) -> impl Future<Output = TsResult<Option<EngineHover>>> + Send;

    /// Completions at `offset`.
    fn completions(
        &self,
        file: &str,
        offset: u32,
    ) -> impl Future<Output = TsResult<Vec<EngineCompletion>>> + Send;

    /// Definitions of the symbol at `offset`.
    fn definition(
        &self,
        file: &str,
        offset: u32,
    ) -> impl Future<Output = TsResult<Vec<EngineLocation>>> + Send;

    /// All diagnostics of a document.
    fn diagnostics(&self, file: &str)
        -> impl Future<Output = TsResult<Vec<EngineDiagnostic>>> + Send;

    /// Semantic tokens of a document.
    fn semantic_tokens(&self, file: &str) -> impl Future<Output = TsResult<Vec<EngineToken>>> + Send;
}

/// A call observed by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Update { file: String, version: u64 },
    Remove { file: String },
    Hover { file: String, offset: u32 },
    Completions { file: String, offset: u32 },
    Definition { file: String, offset: u32 },
    Diagnostics { file: String },
    SemanticTokens { file: String },
}

#[derive(Debug, Default)]
struct RecordingState {
    documents: HashMap<String, (String, u64)>,
    diagnostics: HashMap<String, Vec<EngineDiagnostic>>,
    calls: Vec<EngineCall>,
}

/// An in-memory engine that answers from document text alone and records
/// every call.
///
/// Hover reports the identifier under the cursor, definition finds its
/// first occurrence in the same document, completions list the words of
/// the document, and diagnostics are whatever was injected with
/// [`RecordingEngine::set_diagnostics`].
#[derive(Debug, Default)]
pub struct RecordingEngine {
    state: Mutex<RecordingState>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Diagnostics returned for `file`, in synthetic offsets.
    pub fn set_diagnostics(&self, file: &str, diagnostics: Vec<EngineDiagnostic>) {
        self.lock().diagnostics.insert(file.to_string(), diagnostics);
    }

    /// Text and version of a registered document.
    pub fn document(&self, file: &str) -> Option<(String, u64)> {
        self.lock().documents.get(file).cloned()
    }

    /// Number of registered documents.
    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    /// Calls observed so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    fn record(&self, call: EngineCall) -> MutexGuard<'_, RecordingState> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }

    fn word_at(&self, file: &str, offset: u32) -> Option<(String, Span)> {
        let state = self.lock();
        let (text, _) = state.documents.get(file)?;
        let span = word_span(text, offset)?;
        Some((text[span.to_range()].to_string(), span))
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn word_span(text: &str, offset: u32) -> Option<Span> {
    let bytes = text.as_bytes();
    let at = offset as usize;
    if at >= bytes.len() || !is_word_byte(bytes[at]) {
        return None;
    }
    let start = bytes[..at].iter().rposition(|&b| !is_word_byte(b)).map_or(0, |i| i + 1);
    let end = bytes[at..].iter().position(|&b| !is_word_byte(b)).map_or(bytes.len(), |i| at + i);
    Some(Span::new(start as u32, end as u32))
}

fn words(text: &str) -> impl Iterator<Item = (&str, usize)> {
    text.char_indices()
        .filter(|&(i, c)| {
            (c.is_ascii_alphabetic() || c == '_' || c == '$')
                && (i == 0 || !is_word_byte(text.as_bytes()[i - 1]))
        })
        .map(move |(i, _)| {
            let len = text.as_bytes()[i..]
                .iter()
                .position(|&b| !is_word_byte(b))
                .unwrap_or(text.len() - i);
            (&text[i..i + len], i)
        })
}

impl TypeCheckEngine for RecordingEngine {
    async fn update_document(&self, file: &str, text: &str, version: u64) -> TsResult<()> {
        let mut state = self.record(EngineCall::Update {
            file: file.to_string(),
            version,
        });
        state
            .documents
            .insert(file.to_string(), (text.to_string(), version));
        Ok(())
    }

    async fn remove_document(&self, file: &str) -> TsResult<()> {
        let mut state = self.record(EngineCall::Remove {
            file: file.to_string(),
        });
        state.documents.remove(file);
        Ok(())
    }

    async fn hover(&self, file: &str, offset: u32) -> TsResult<Option<EngineHover>> {
        drop(self.record(EngineCall::Hover {
            file: file.to_string(),
            offset,
        }));
        Ok(self
            .word_at(file, offset)
            .map(|(word, span)| EngineHover { text: word, span }))
    }

    async fn completions(&self, file: &str, offset: u32) -> TsResult<Vec<EngineCompletion>> {
        let state = self.record(EngineCall::Completions {
            file: file.to_string(),
            offset,
        });
        let Some((text, _)) = state.documents.get(file) else {
            return Ok(Vec::new());
        };
        let mut seen = std::collections::HashSet::new();
        Ok(words(text)
            .filter(|(word, _)| seen.insert(*word))
            .map(|(word, _)| EngineCompletion {
                label: word.to_string(),
                kind: None,
                detail: None,
            })
            .collect())
    }

    async fn definition(&self, file: &str, offset: u32) -> TsResult<Vec<EngineLocation>> {
        drop(self.record(EngineCall::Definition {
            file: file.to_string(),
            offset,
        }));
        let Some((word, _)) = self.word_at(file, offset) else {
            return Ok(Vec::new());
        };
        let state = self.lock();
        let Some((text, _)) = state.documents.get(file) else {
            return Ok(Vec::new());
        };
        let locations = words(text)
            .find(|(w, _)| *w == word)
            .map(|(w, at)| EngineLocation {
                file: file.to_string(),
                span: Span::new(at as u32, (at + w.len()) as u32),
            })
            .into_iter()
            .collect();
        Ok(locations)
    }

    async fn diagnostics(&self, file: &str) -> TsResult<Vec<EngineDiagnostic>> {
        let state = self.record(EngineCall::Diagnostics {
            file: file.to_string(),
        });
        Ok(state.diagnostics.get(file).cloned().unwrap_or_default())
    }

    async fn semantic_tokens(&self, file: &str) -> TsResult<Vec<EngineToken>> {
        let state = self.record(EngineCall::SemanticTokens {
            file: file.to_string(),
        });
        let Some((text, _)) = state.documents.get(file) else {
            return Ok(Vec::new());
        };
        Ok(words(text)
            .map(|(w, at)| EngineToken {
                span: Span::new(at as u32, (at + w.len()) as u32),
                kind: "variable".to_string(),
                modifiers: 0,
            })
            .collect())
    }
}
