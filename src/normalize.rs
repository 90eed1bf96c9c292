//! Response normalization: LLM text reply → [`DocumentAnalysis`].
//!
//! LLM replies nominally follow the instructed JSON format but arrive
//! wrapped in markdown fencing or explanatory prose inconsistently. This
//! module coerces whatever came back into a well-typed analysis value
//! through an ordered cascade of recovery stages:
//!
//! 1. **Direct parse** — strip any surrounding code fence and parse.
//! 2. **Fenced-block extraction** — pull the first ```` ```json ```` block
//!    out of the reply and parse its interior.
//! 3. **Fallback construction** — wrap the verbatim reply in a valid
//!    analysis value with `rawResponse` set.
//!
//! [`normalize`] is total: it never fails, for any input string. The
//! cascade trades strictness for availability — the caller always gets a
//! renderable object, never a parse error.

use crate::models::{AnalysisSummary, DocumentAnalysis};

/// Converts a raw LLM reply into a [`DocumentAnalysis`].
///
/// Each stage is attempted only if the previous one produced nothing;
/// the fallback constructor is the guaranteed-success terminal stage.
pub fn normalize(reply: &str) -> DocumentAnalysis {
    attempt_direct(reply)
        .or_else(|| attempt_fenced(reply))
        .unwrap_or_else(|| fallback(reply))
}

/// Stage 1: trim, strip surrounding fence markers, parse.
///
/// Stripping runs twice — once for a `` ```json ``-tagged fence and once
/// for a bare `` ``` `` fence — so either tagging style is tolerated.
/// When no fence is present the stripping is a no-op and bare JSON
/// parses directly.
fn attempt_direct(reply: &str) -> Option<DocumentAnalysis> {
    let mut text = reply.trim();
    for opener in ["```json", "```"] {
        if let Some(rest) = text.strip_prefix(opener) {
            text = rest;
        }
        if let Some(rest) = text.strip_suffix("```") {
            text = rest;
        }
        text = text.trim();
    }
    serde_json::from_str(text).ok()
}

/// Stage 2: extract the interior of the *first* ```` ```json ```` block.
///
/// The closing fence is the nearest one after the opener, so a reply
/// containing several fenced blocks never has the match span across
/// block boundaries.
fn attempt_fenced(reply: &str) -> Option<DocumentAnalysis> {
    let start = reply.find("```json")?;
    let interior = &reply[start + "```json".len()..];
    let end = interior.find("```")?;
    serde_json::from_str(interior[..end].trim()).ok()
}

/// Stage 3: the always-producible fallback variant.
///
/// The entire reply lands verbatim in both `summary.overview` and
/// `rawResponse`; sequences are empty and the overall risk is `Unknown`.
/// No size cap is applied to the embedded reply.
pub fn fallback(reply: &str) -> DocumentAnalysis {
    DocumentAnalysis {
        summary: AnalysisSummary {
            overview: reply.to_string(),
            ..AnalysisSummary::default()
        },
        raw_response: Some(reply.to_string()),
        ..DocumentAnalysis::default()
    }
}
