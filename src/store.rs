//! In-memory document and chat stores.
//!
//! Both stores live for the process lifetime and are shared across
//! request handlers as explicitly owned objects behind `Arc` — no
//! process-wide singletons. Writes are last-write-wins under an
//! `RwLock`; a given document id is only ever written by the upload
//! that created it, and chat appends take the write lock for the whole
//! pair so a transcript never interleaves mid-exchange.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::models::{ChatTurn, DocumentRecord, DocumentSummary, SessionSummary};

/// Process-lifetime mapping from document id to its record.
#[derive(Default)]
pub struct DocumentStore {
    inner: RwLock<DocumentsInner>,
}

#[derive(Default)]
struct DocumentsInner {
    records: HashMap<String, DocumentRecord>,
    /// Ids in insertion order, for stable listing.
    order: Vec<String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a record. An overwrite keeps the id's
    /// original position in listing order.
    pub fn put(&self, record: DocumentRecord) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.records.contains_key(&record.id) {
            inner.order.push(record.id.clone());
        }
        inner.records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<DocumentRecord> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.records.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.records.contains_key(id)
    }

    /// Lightweight summaries in insertion order.
    pub fn list(&self) -> Vec<DocumentSummary> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .map(|record| DocumentSummary {
                id: record.id.clone(),
                file_name: record.file_name.clone(),
                uploaded_at: record.uploaded_at,
                document_type: record.analysis.summary.document_type.clone(),
                overall_risk: record.analysis.risk_assessment.overall_risk.clone(),
            })
            .collect()
    }
}

/// Process-lifetime mapping from document id to its chat transcript.
#[derive(Default)]
pub struct ChatStore {
    inner: RwLock<ChatsInner>,
}

#[derive(Default)]
struct ChatsInner {
    transcripts: HashMap<String, Vec<ChatTurn>>,
    order: Vec<String>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty transcript for a freshly uploaded document.
    /// A transcript exists for an id iff a document record does; the
    /// upload handler calls this right after `DocumentStore::put`.
    pub fn init(&self, id: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.transcripts.contains_key(id) {
            inner.order.push(id.to_string());
            inner.transcripts.insert(id.to_string(), Vec::new());
        }
    }

    /// Transcript for an id, empty if unknown.
    pub fn history(&self, id: &str) -> Vec<ChatTurn> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.transcripts.get(id).cloned().unwrap_or_default()
    }

    /// Appends turns under a single write lock, so a question/answer
    /// pair lands atomically from the reader's perspective.
    pub fn append(&self, id: &str, turns: Vec<ChatTurn>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.transcripts.contains_key(id) {
            inner.order.push(id.to_string());
        }
        inner.transcripts.entry(id.to_string()).or_default().extend(turns);
    }

    /// Resets a transcript to the empty sequence. The session itself
    /// survives; only its turns are discarded.
    pub fn clear(&self, id: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(turns) = inner.transcripts.get_mut(id) {
            turns.clear();
        }
    }

    /// Session summaries in creation order.
    pub fn sessions(&self) -> Vec<SessionSummary> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.transcripts.get(id).map(|turns| (id, turns)))
            .map(|(id, turns)| SessionSummary {
                id: id.clone(),
                message_count: turns.len(),
                last_timestamp: turns.last().map(|t| t.timestamp),
            })
            .collect()
    }
}
