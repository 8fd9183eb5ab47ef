//! Documentation-only schemas for response bodies that are built as ad-hoc JSON.

use serde::Serialize;
use utoipa::ToSchema;

/// Error envelope returned by every endpoint
#[derive(Serialize, ToSchema)]
#[allow(dead_code)]
pub struct ErrorResponse {
    /// Human-readable message, safe to show to users
    #[schema(example = "Validation failed.")]
    pub message: String,
    /// Field problems for validation failures, or extra context
    #[schema(value_type = Option<Object>, example = json!(["front is required"]))]
    pub details: Option<serde_json::Value>,
}

/// Error envelope for failures reported by the chat completion provider
#[derive(Serialize, ToSchema)]
#[allow(dead_code)]
pub struct UpstreamErrorResponse {
    #[schema(example = "Rate limited upstream")]
    pub message: String,
    /// Provider status; `null` when the provider could not be reached
    pub status: Option<u16>,
    /// Provider error code
    pub code: Option<String>,
    /// Raw provider response body
    pub details: Option<String>,
}
