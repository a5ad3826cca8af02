//! AI request pipeline
//!
//! Wraps a hosted language model behind typed request/response shapes, with
//! bounded exponential-backoff retry for rate-limit errors. Two operations:
//! free-text destination extraction (with a declared GPS tool) and
//! schema-constrained structured destination generation.

pub mod client;
pub mod pipeline;
pub mod retry;
pub mod schema;

pub use client::{
    Candidate, Content, DEFAULT_MODEL, FunctionCall, FunctionDeclaration, FunctionResponse,
    GeminiClient, GenerateRequest, GenerateResponse, GenerationConfig, LanguageModel, Part,
    SystemInstruction, Tool,
};
pub use pipeline::{AssistantPipeline, GPS_TOOL_NAME, GpsResolver, NO_DESTINATION_TOKEN};
pub use retry::{DEFAULT_MAX_ATTEMPTS, call_with_retry};
pub use schema::{destination_list_schema, parse_destinations};
