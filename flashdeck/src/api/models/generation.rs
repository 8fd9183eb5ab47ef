//! API request model for notes-to-flashcards generation.
//!
//! The response is the [`GenerationReport`](crate::generation::GenerationReport) produced by the
//! pipeline.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Free-text study notes, trimmed before use
    pub notes: Option<String>,
}
