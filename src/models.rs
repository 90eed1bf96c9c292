//! Core data types for document analysis and chat.
//!
//! The JSON wire names are camelCase throughout; absent fields in an LLM
//! reply deserialize to empty containers or `"Unknown"`, never to nulls
//! that leak to API clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured analysis of a legal document, as instructed to the LLM.
///
/// Every field is defaulted so that a partial JSON object still
/// deserializes into a complete, renderable value. The fallback variant
/// (produced when no parse attempt succeeds) is an ordinary member of
/// this type with `raw_response` populated — callers can only tell it
/// apart by inspecting field contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentAnalysis {
    pub summary: AnalysisSummary,
    pub clauses: Vec<Clause>,
    pub key_terms: Vec<KeyTerm>,
    pub risk_assessment: RiskAssessment,
    /// Verbatim LLM reply, present only on the fallback variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSummary {
    pub overview: String,
    pub document_type: String,
    pub parties: String,
    pub purpose: String,
}

impl Default for AnalysisSummary {
    fn default() -> Self {
        Self {
            overview: String::new(),
            document_type: "Unknown".to_string(),
            parties: String::new(),
            purpose: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Clause {
    pub title: String,
    pub description: String,
    pub benefits: Vec<String>,
    pub risks: Vec<String>,
    /// One of `High`, `Medium`, `Low`. Kept as a string because the LLM
    /// is instructed but not guaranteed to stay inside that set.
    pub importance: String,
}

impl Default for Clause {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            benefits: Vec::new(),
            risks: Vec::new(),
            importance: "Medium".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyTerm {
    pub term: String,
    pub explanation: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskAssessment {
    /// One of `Low`, `Medium`, `High`, `Unknown`.
    pub overall_risk: String,
    pub critical_points: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            overall_risk: "Unknown".to_string(),
            critical_points: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

/// A stored document: extracted text plus its analysis.
///
/// Created exactly once per successful upload, never mutated afterwards,
/// dropped only on process exit.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: String,
    pub original_text: String,
    pub analysis: DocumentAnalysis,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Lightweight listing row for `GET /api/documents`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub document_type: String,
    pub overall_risk: String,
}

/// One message in a document's chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Listing row for `GET /api/chat/sessions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub message_count: usize,
    pub last_timestamp: Option<DateTime<Utc>>,
}
