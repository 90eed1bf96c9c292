//! # Clause Lens
//!
//! An LLM-backed legal document analysis and Q&A service.
//!
//! Clause Lens accepts an uploaded legal document, extracts its text,
//! asks a remote LLM for a structured analysis, keeps the result in
//! memory, and answers follow-up questions about the document over a
//! JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌────────────┐
//! │  Upload  │──▶│  Extract  │──▶│   LLM   │──▶│ Normalizer │
//! │ (HTTP)   │   │ PDF/DOCX  │   │ Gemini  │   │  cascade   │
//! └──────────┘   └───────────┘   └─────────┘   └─────┬──────┘
//!                                                    │
//!                             ┌──────────────────────┤
//!                             ▼                      ▼
//!                       ┌───────────┐         ┌───────────┐
//!                       │ Documents │         │   Chats   │
//!                       │ (memory)  │         │ (memory)  │
//!                       └───────────┘         └───────────┘
//! ```
//!
//! The normalizer is the resilience core: LLM replies that fail every
//! parse attempt are wrapped into a schema-conforming fallback value
//! instead of surfacing as errors.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment-driven configuration |
//! | [`models`] | Core data types |
//! | [`extract`] | Document text extraction |
//! | [`normalize`] | Reply → analysis cascade |
//! | [`prompts`] | Analysis and chat prompt builders |
//! | [`llm`] | `TextGenerator` trait and Gemini client |
//! | [`store`] | In-memory document and chat stores |
//! | [`server`] | Axum router and handlers |

pub mod config;
pub mod extract;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod server;
pub mod store;
