//! HTTP server and route handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Upload a document (multipart, one file field) |
//! | `GET`  | `/api/documents` | List uploaded documents |
//! | `GET`  | `/api/document/{id}` | Full stored record |
//! | `GET`  | `/api/document/{id}/summary` | Analysis summary slice |
//! | `GET`  | `/api/document/{id}/clauses` | Clause breakdown slice |
//! | `GET`  | `/api/document/{id}/risks` | Risk assessment slice |
//! | `GET`  | `/api/document/{id}/terms` | Key terms slice |
//! | `POST` | `/api/chat/{id}` | Ask a follow-up question |
//! | `GET`  | `/api/chat/{id}/history` | Read chat transcript (empty if unknown) |
//! | `DELETE` | `/api/chat/{id}/history` | Reset chat transcript |
//! | `GET`  | `/api/chat/sessions` | List chat sessions |
//! | `POST` | `/api/test-parse` | Run the response normalizer directly |
//! | `POST` | `/chat/{id}` | Legacy alias for `POST /api/chat/{id}` |
//! | `GET`  | `/chat/{id}` | Legacy alias for the history read |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one body shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "no file uploaded" } }
//! ```
//!
//! Codes: `bad_request` (400), `not_found` (404), `upstream` (500, LLM
//! transport/API failure), `internal` (500, upload pipeline failure).
//!
//! Unknown document ids 404 on every read endpoint except
//! `GET /api/chat/{id}/history`, which returns an empty transcript.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::config::Config;
use crate::extract::extract_text;
use crate::llm::{GeminiClient, LlmError, TextGenerator};
use crate::models::{
    ChatRole, ChatTurn, DocumentAnalysis, DocumentRecord, DocumentSummary, SessionSummary,
};
use crate::normalize::normalize;
use crate::prompts::{analysis_prompt, chat_prompt};
use crate::store::{ChatStore, DocumentStore};

/// Multipart uploads are capped at 25 MiB.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor. Stores are owned here and injected, never global.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentStore>,
    pub chats: Arc<ChatStore>,
    pub llm: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self {
            documents: Arc::new(DocumentStore::new()),
            chats: Arc::new(ChatStore::new()),
            llm,
        }
    }
}

/// Builds the application router. Separated from [`run`] so tests can
/// drive the full HTTP surface in-process with a stubbed [`TextGenerator`].
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/api/documents", get(handle_list_documents))
        .route("/api/document/{id}", get(handle_document))
        .route("/api/document/{id}/summary", get(handle_document_summary))
        .route("/api/document/{id}/clauses", get(handle_document_clauses))
        .route("/api/document/{id}/risks", get(handle_document_risks))
        .route("/api/document/{id}/terms", get(handle_document_terms))
        .route("/api/chat/sessions", get(handle_list_sessions))
        .route("/api/chat/{id}", post(handle_chat))
        .route(
            "/api/chat/{id}/history",
            get(handle_chat_history).delete(handle_clear_history),
        )
        .route("/api/test-parse", post(handle_test_parse))
        // Legacy aliases delegate straight to the current handlers.
        .route("/chat/{id}", post(handle_chat).get(handle_chat_history))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on the configured port and serves until the
/// process is terminated.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let llm: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(&config));
    let app = router(AppState::new(llm));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, model = %config.model, "clause-lens listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn upstream(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "upstream".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Runs a prompt through the LLM, substituting the literal
/// `"No response"` when the call succeeded but carried no candidate
/// text. Transport and API failures surface as 500s.
async fn generate_or_default(
    llm: &Arc<dyn TextGenerator>,
    prompt: &str,
) -> Result<String, AppError> {
    match llm.generate(prompt).await {
        Ok(text) => Ok(text),
        Err(LlmError::NoCandidate) => Ok("No response".to_string()),
        Err(e) => Err(upstream(e.to_string())),
    }
}

// ============ POST /upload ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    message: String,
    document_id: String,
    analysis: DocumentAnalysis,
}

/// Handler for `POST /upload`.
///
/// Pipeline: multipart file field → text extraction → analysis prompt →
/// LLM → normalizer → document record + empty chat session.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| bad_request("no file uploaded"))?;

    let text =
        extract_text(&bytes, &file_name).map_err(|e| internal(format!("processing failed: {}", e)))?;
    if text.trim().is_empty() {
        return Err(bad_request("document contains no extractable text"));
    }

    tracing::info!(
        file_name = %file_name,
        extracted_chars = text.len(),
        "document text extracted"
    );

    let reply = generate_or_default(&state.llm, &analysis_prompt(&text)).await?;
    let analysis = normalize(&reply);

    tracing::info!(
        file_name = %file_name,
        structured = analysis.raw_response.is_none(),
        clauses = analysis.clauses.len(),
        "analysis normalized"
    );

    let id = Uuid::new_v4().to_string();
    let record = DocumentRecord {
        id: id.clone(),
        original_text: text,
        analysis: analysis.clone(),
        file_name,
        uploaded_at: Utc::now(),
    };
    state.documents.put(record);
    state.chats.init(&id);

    Ok(Json(UploadResponse {
        message: "Document analyzed successfully".to_string(),
        document_id: id,
        analysis,
    }))
}

// ============ Document reads ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentListResponse {
    documents: Vec<DocumentSummary>,
}

async fn handle_list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    Json(DocumentListResponse {
        documents: state.documents.list(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentResponse {
    document_id: String,
    file_name: String,
    uploaded_at: DateTime<Utc>,
    analysis: DocumentAnalysis,
}

fn lookup(state: &AppState, id: &str) -> Result<DocumentRecord, AppError> {
    state
        .documents
        .get(id)
        .ok_or_else(|| not_found(format!("document not found: {}", id)))
}

async fn handle_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let record = lookup(&state, &id)?;
    Ok(Json(DocumentResponse {
        document_id: record.id,
        file_name: record.file_name,
        uploaded_at: record.uploaded_at,
        analysis: record.analysis,
    }))
}

async fn handle_document_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = lookup(&state, &id)?;
    Ok(Json(serde_json::json!({
        "documentId": record.id,
        "summary": record.analysis.summary,
    })))
}

async fn handle_document_clauses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = lookup(&state, &id)?;
    Ok(Json(serde_json::json!({
        "documentId": record.id,
        "clauses": record.analysis.clauses,
    })))
}

async fn handle_document_risks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = lookup(&state, &id)?;
    Ok(Json(serde_json::json!({
        "documentId": record.id,
        "riskAssessment": record.analysis.risk_assessment,
    })))
}

async fn handle_document_terms(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = lookup(&state, &id)?;
    Ok(Json(serde_json::json!({
        "documentId": record.id,
        "keyTerms": record.analysis.key_terms,
    })))
}

// ============ Chat ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    success: bool,
    answer: String,
    document_id: String,
    chat_history: Vec<ChatTurn>,
    timestamp: DateTime<Utc>,
}

/// Handler for `POST /api/chat/{id}` (and the legacy `POST /chat/{id}`).
async fn handle_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let question = request
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| bad_request("question is required"))?;

    let record = lookup(&state, &id)?;
    let history = state.chats.history(&id);

    let prompt = chat_prompt(&record.analysis, &record.original_text, &history, &question);
    let answer = generate_or_default(&state.llm, &prompt).await?;

    let now = Utc::now();
    state.chats.append(
        &id,
        vec![
            ChatTurn {
                role: ChatRole::User,
                content: question,
                timestamp: now,
            },
            ChatTurn {
                role: ChatRole::Assistant,
                content: answer.clone(),
                timestamp: now,
            },
        ],
    );

    Ok(Json(ChatResponse {
        success: true,
        answer,
        document_id: id.clone(),
        chat_history: state.chats.history(&id),
        timestamp: now,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatHistoryResponse {
    document_id: String,
    chat_history: Vec<ChatTurn>,
    message_count: usize,
}

/// Handler for `GET /api/chat/{id}/history` (and the legacy `GET /chat/{id}`).
///
/// Unknown ids return an empty transcript rather than 404 — a deliberate
/// asymmetry with the document read endpoints.
async fn handle_chat_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ChatHistoryResponse> {
    let history = state.chats.history(&id);
    Json(ChatHistoryResponse {
        document_id: id,
        message_count: history.len(),
        chat_history: history,
    })
}

async fn handle_clear_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    state.chats.clear(&id);
    Json(serde_json::json!({
        "success": true,
        "message": "chat history cleared",
        "documentId": id,
    }))
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummary>,
}

async fn handle_list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.chats.sessions(),
    })
}

// ============ POST /api/test-parse ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestParseRequest {
    #[serde(default)]
    test_response: Option<String>,
}

/// Handler for `POST /api/test-parse`.
///
/// Diagnostic endpoint exposing the normalizer directly. Structured
/// output reports `success: true`; a fallback result reports
/// `success: false` with the raw reply attached.
async fn handle_test_parse(
    Json(request): Json<TestParseRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let text = request
        .test_response
        .ok_or_else(|| bad_request("testResponse is required"))?;

    let analysis = normalize(&text);
    if let Some(raw) = &analysis.raw_response {
        Ok(Json(serde_json::json!({
            "success": false,
            "error": "response did not contain parseable structured JSON",
            "rawResponse": raw,
        })))
    } else {
        Ok(Json(serde_json::json!({
            "success": true,
            "message": "parsed structured analysis",
            "parsed": analysis,
        })))
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
