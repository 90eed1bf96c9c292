//! End-to-end tests for the HTTP surface, driven in-process with a
//! scripted LLM stub so no network access is needed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use clause_lens::llm::{LlmError, TextGenerator};
use clause_lens::server::{router, AppState};

/// Pops pre-scripted replies in order; falls back to a fixed answer
/// when the script runs dry.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("scripted answer".to_string()))
    }
}

fn app(replies: Vec<Result<String, LlmError>>) -> Router {
    let llm = Arc::new(ScriptedGenerator {
        replies: Mutex::new(replies.into_iter().collect()),
    });
    router(AppState::new(llm))
}

const LEASE_ANALYSIS: &str = r#"{
    "summary": {
        "overview": "A 12-month residential lease.",
        "documentType": "Lease Agreement",
        "parties": "A (landlord) and B (tenant)",
        "purpose": "Rental of a residential unit"
    },
    "clauses": [
        {
            "title": "Termination",
            "description": "60 days notice required.",
            "benefits": ["Predictable exit"],
            "risks": ["Locked in for the notice period"],
            "importance": "High"
        }
    ],
    "keyTerms": [
        {"term": "Security deposit", "explanation": "One month rent", "impact": "Refundable at move-out"}
    ],
    "riskAssessment": {
        "overallRisk": "Medium",
        "criticalPoints": ["Automatic renewal"],
        "recommendations": ["Calendar the renewal deadline"]
    }
}"#;

fn fenced(json: &str) -> String {
    format!("```json\n{}\n```", json)
}

fn multipart_request(path: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let boundary = "clauselensboundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn upload_lease(app: &Router) -> String {
    let (status, body) = send(
        app,
        multipart_request("/upload", "lease.txt", b"Lease Agreement between A and B..."),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["documentId"].as_str().unwrap().to_string()
}

/// Minimal valid PDF containing the given phrase, with correct xref
/// byte offsets so the extractor can parse it.
fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET\n", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!("4 0 obj << /Length {} >> stream\n{}endstream endobj\n", stream.len(), stream)
            .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

#[tokio::test]
async fn upload_with_fenced_reply_surfaces_document_type() {
    let app = app(vec![Ok(fenced(LEASE_ANALYSIS))]);

    let (status, body) = send(
        &app,
        multipart_request("/upload", "lease.txt", b"Lease Agreement between A and B..."),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["summary"]["documentType"], "Lease Agreement");
    assert!(body["analysis"].get("rawResponse").is_none());
    let id = body["documentId"].as_str().unwrap();

    let (status, body) = send(&app, get(&format!("/api/document/{id}/summary"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["documentType"], "Lease Agreement");

    let (status, body) = send(&app, get("/api/documents")).await;
    assert_eq!(status, StatusCode::OK);
    let documents = body["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["documentType"], "Lease Agreement");
    assert_eq!(documents[0]["overallRisk"], "Medium");
    assert_eq!(documents[0]["fileName"], "lease.txt");
}

#[tokio::test]
async fn upload_with_prose_reply_returns_fallback() {
    let prose = "This looks like a fairly standard lease with no unusual terms.";
    let app = app(vec![Ok(prose.to_string())]);

    let (status, body) = send(
        &app,
        multipart_request("/upload", "lease.txt", b"Lease text"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["rawResponse"], prose);
    assert_eq!(body["analysis"]["summary"]["overview"], prose);
    assert_eq!(body["analysis"]["riskAssessment"]["overallRisk"], "Unknown");
}

#[tokio::test]
async fn upload_of_pdf_extracts_text() {
    let app = app(vec![Ok(fenced(LEASE_ANALYSIS))]);
    let pdf = minimal_pdf("Lease Agreement between A and B");

    let (status, body) = send(&app, multipart_request("/upload", "lease.pdf", &pdf)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["summary"]["documentType"], "Lease Agreement");
}

#[tokio::test]
async fn upload_without_file_field_is_bad_request() {
    let app = app(vec![]);
    let boundary = "clauselensboundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nnot a file\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn upload_with_empty_text_is_bad_request() {
    let app = app(vec![]);
    let (status, body) = send(
        &app,
        multipart_request("/upload", "blank.txt", b"   \n\t  "),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn upstream_failure_surfaces_as_500() {
    let app = app(vec![Err(LlmError::Api {
        status: 503,
        detail: "model overloaded".to_string(),
    })]);
    let (status, body) = send(
        &app,
        multipart_request("/upload", "lease.txt", b"Lease text"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "upstream");
}

#[tokio::test]
async fn unknown_document_reads_are_404_but_history_is_empty() {
    let app = app(vec![]);

    for path in [
        "/api/document/missing",
        "/api/document/missing/summary",
        "/api/document/missing/clauses",
        "/api/document/missing/risks",
        "/api/document/missing/terms",
    ] {
        let (status, body) = send(&app, get(path)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "expected 404 for {path}");
        assert_eq!(body["error"]["code"], "not_found");
    }

    // The history read is deliberately asymmetric: empty, never 404.
    let (status, body) = send(&app, get("/api/chat/missing/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messageCount"], 0);
    assert!(body["chatHistory"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn chat_exchanges_grow_history_in_pairs() {
    let app = app(vec![
        Ok(fenced(LEASE_ANALYSIS)),
        Ok("Yes, clause 3 allows early termination.".to_string()),
        Ok("The deposit is one month of rent.".to_string()),
    ]);
    let id = upload_lease(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/chat/{id}"),
            serde_json::json!({"question": "Can I terminate early?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["answer"], "Yes, clause 3 allows early termination.");
    assert_eq!(body["chatHistory"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/chat/{id}"),
            serde_json::json!({"question": "How much is the deposit?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["chatHistory"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    for (i, turn) in history.iter().enumerate() {
        let expected = if i % 2 == 0 { "user" } else { "assistant" };
        assert_eq!(turn["role"], expected);
    }

    let (status, body) = send(&app, get(&format!("/api/chat/{id}/history"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messageCount"], 4);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/chat/{id}/history"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, get(&format!("/api/chat/{id}/history"))).await;
    assert_eq!(body["messageCount"], 0);
}

#[tokio::test]
async fn chat_without_question_is_bad_request() {
    let app = app(vec![Ok(fenced(LEASE_ANALYSIS))]);
    let id = upload_lease(&app).await;

    for payload in [serde_json::json!({}), serde_json::json!({"question": "  "})] {
        let (status, body) = send(
            &app,
            json_request("POST", &format!("/api/chat/{id}"), payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn chat_with_unknown_document_is_not_found() {
    let app = app(vec![]);
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/chat/missing",
            serde_json::json!({"question": "hello?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn missing_candidate_text_becomes_no_response() {
    let app = app(vec![
        Ok(fenced(LEASE_ANALYSIS)),
        Err(LlmError::NoCandidate),
    ]);
    let id = upload_lease(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/chat/{id}"),
            serde_json::json!({"question": "Anything else?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "No response");
}

#[tokio::test]
async fn legacy_chat_aliases_delegate_to_current_handlers() {
    let app = app(vec![
        Ok(fenced(LEASE_ANALYSIS)),
        Ok("Answer via the legacy route.".to_string()),
    ]);
    let id = upload_lease(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/chat/{id}"),
            serde_json::json!({"question": "Still working?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Answer via the legacy route.");

    let (status, body) = send(&app, get(&format!("/chat/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messageCount"], 2);
}

#[tokio::test]
async fn sessions_list_reflects_uploads_and_chats() {
    let app = app(vec![
        Ok(fenced(LEASE_ANALYSIS)),
        Ok(fenced(LEASE_ANALYSIS)),
        Ok("An answer.".to_string()),
    ]);
    let first = upload_lease(&app).await;
    let second = upload_lease(&app).await;

    send(
        &app,
        json_request(
            "POST",
            &format!("/api/chat/{first}"),
            serde_json::json!({"question": "One question"}),
        ),
    )
    .await;

    let (status, body) = send(&app, get("/api/chat/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["id"], first.as_str());
    assert_eq!(sessions[0]["messageCount"], 2);
    assert_eq!(sessions[1]["id"], second.as_str());
    assert_eq!(sessions[1]["messageCount"], 0);
    assert!(sessions[1]["lastTimestamp"].is_null());
}

#[tokio::test]
async fn test_parse_reports_both_outcomes() {
    let app = app(vec![]);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/test-parse",
            serde_json::json!({"testResponse": fenced(LEASE_ANALYSIS)}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["parsed"]["summary"]["documentType"], "Lease Agreement");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/test-parse",
            serde_json::json!({"testResponse": "no json here"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["rawResponse"], "no json here");

    let (status, body) = send(
        &app,
        json_request("POST", "/api/test-parse", serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn health_reports_version() {
    let app = app(vec![]);
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
