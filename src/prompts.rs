//! Prompt builders for document analysis and follow-up chat.
//!
//! Both builders are deterministic string templates; no parsing logic
//! lives here. The analysis prompt pins the LLM to the JSON shape the
//! normalizer expects, and the chat prompt packs the stored analysis,
//! a truncated slice of the original text, and the prior transcript
//! into a single conversational context.

use crate::models::{ChatTurn, DocumentAnalysis};

/// How much of the original document text is carried into each chat
/// prompt. Hard truncation, not summarization; later sections of a long
/// document are simply absent from chat context.
pub const CHAT_CONTEXT_CHARS: usize = 3000;

/// JSON shape the LLM is instructed to return for document analysis.
const ANALYSIS_SCHEMA: &str = r#"{
  "summary": {
    "overview": "Brief overview of the document",
    "documentType": "Type of legal document (e.g. Lease Agreement, NDA, Employment Contract)",
    "parties": "The parties involved",
    "purpose": "Primary purpose of the document"
  },
  "clauses": [
    {
      "title": "Clause name",
      "description": "What the clause means in plain language",
      "benefits": ["Benefit to the reader"],
      "risks": ["Risk to the reader"],
      "importance": "High | Medium | Low"
    }
  ],
  "keyTerms": [
    {
      "term": "Legal term as written",
      "explanation": "Plain-language explanation",
      "impact": "How it affects the reader"
    }
  ],
  "riskAssessment": {
    "overallRisk": "Low | Medium | High",
    "criticalPoints": ["Points requiring close attention"],
    "recommendations": ["Suggested actions before signing"]
  }
}"#;

/// Builds the analysis prompt for a freshly extracted document.
pub fn analysis_prompt(document_text: &str) -> String {
    format!(
        "You are a legal document analyst. Analyze the following legal document \
and return ONLY a JSON object, with no surrounding prose or markdown fencing, \
matching exactly this shape:\n\n{schema}\n\n\
Base every field strictly on the document content. If a field cannot be \
determined from the document, use an empty string or empty array.\n\n\
DOCUMENT:\n{text}",
        schema = ANALYSIS_SCHEMA,
        text = document_text,
    )
}

/// Builds the chat prompt for a follow-up question about a document.
///
/// Context layout: serialized analysis, then the first
/// [`CHAT_CONTEXT_CHARS`] characters of the original text, then the full
/// prior transcript as `role: content` lines, then the new question.
pub fn chat_prompt(
    analysis: &DocumentAnalysis,
    original_text: &str,
    history: &[ChatTurn],
    question: &str,
) -> String {
    let analysis_json =
        serde_json::to_string_pretty(analysis).unwrap_or_else(|_| "{}".to_string());

    let excerpt: String = original_text.chars().take(CHAT_CONTEXT_CHARS).collect();

    let transcript = if history.is_empty() {
        "(no prior conversation)".to_string()
    } else {
        history
            .iter()
            .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a helpful legal assistant answering follow-up questions about a \
document the user uploaded. Answer conversationally, referencing specific \
document content where relevant. Do not invent terms that are not in the \
document.\n\n\
DOCUMENT ANALYSIS:\n{analysis}\n\n\
DOCUMENT TEXT (may be truncated):\n{excerpt}\n\n\
CONVERSATION SO FAR:\n{transcript}\n\n\
QUESTION: {question}",
        analysis = analysis_json,
        excerpt = excerpt,
        transcript = transcript,
        question = question,
    )
}
