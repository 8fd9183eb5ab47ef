//! Notes in, saved flashcards out.
//!
//! One chat completion turns the notes into candidate cards. The candidates are then written one
//! at a time through a [`FlashcardSink`]. Writing stops at the first failure that would affect
//! every later card too (lost authentication, server error); cards already written stay written.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::parse::{GeneratedCard, ParsedCards, parse_generated_cards};
use super::SYSTEM_PROMPT;
use crate::api::models::flashcards::FlashcardResponse;
use crate::chat::{ChatCompletion, ChatCompletionClient, ChatCompletionRequest, ChatError, ChatMessage};
use crate::config::GenerationConfig;

/// Failure to write a single card
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// The caller's session is no longer accepted
    #[error("{message}")]
    Unauthorized { message: String },

    /// This card was refused; later cards may still succeed
    #[error("{message}")]
    Rejected { message: String },

    /// Storage or the remote service failed
    #[error("{message}")]
    Failed { message: String },
}

impl SinkError {
    pub fn stops_pipeline(&self) -> bool {
        !matches!(self, SinkError::Rejected { .. })
    }
}

/// Destination for generated cards. Implemented over the store on the server and over the HTTP
/// API by [`FlashdeckClient`](crate::client::FlashdeckClient).
#[async_trait]
pub trait FlashcardSink: Send + Sync {
    /// Persist one card with `source_type = ai`
    async fn create_card(&self, card: &GeneratedCard) -> Result<FlashcardResponse, SinkError>;
}

/// Reasons the pipeline produced no cards at all
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("notes are required")]
    EmptyNotes,

    #[error("notes must be at most {max} characters")]
    NotesTooLong { max: usize },

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("The model returned an empty response.")]
    EmptyResponse,

    /// The response could not be turned into any card
    #[error("{reason}")]
    Unusable { reason: String },
}

/// What happened to one generated card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome {
    Created { flashcard: FlashcardResponse },
    Failed { reason: String },
    /// Not attempted because an earlier card stopped the run
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationItem {
    pub front: String,
    pub back: String,
    pub outcome: ItemOutcome,
}

/// Per-card outcome of a generation run, in model order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationReport {
    pub items: Vec<GenerationItem>,
    /// Number of cards created
    pub created: usize,
    /// Set when writing stopped before the last card
    pub stop_reason: Option<String>,
}

impl GenerationReport {
    pub fn created_cards(&self) -> impl Iterator<Item = &FlashcardResponse> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ItemOutcome::Created { flashcard } => Some(flashcard),
            _ => None,
        })
    }
}

/// Trim and bound the notes, then build the completion request
pub fn build_request(settings: &GenerationConfig, notes: &str) -> Result<ChatCompletionRequest, GenerationError> {
    let notes = notes.trim();
    if notes.is_empty() {
        return Err(GenerationError::EmptyNotes);
    }
    if notes.chars().count() > settings.max_notes_chars {
        return Err(GenerationError::NotesTooLong {
            max: settings.max_notes_chars,
        });
    }

    Ok(ChatCompletionRequest {
        model: settings.model.clone(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(format!("Notes:\n{notes}"))],
        temperature: Some(settings.temperature),
        max_tokens: Some(settings.max_tokens),
        top_p: None,
    })
}

/// Extract cards from the first choice of a completion
pub fn cards_from_completion(completion: &ChatCompletion) -> Result<Vec<GeneratedCard>, GenerationError> {
    let content = completion.first_content().map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    match parse_generated_cards(content) {
        ParsedCards::Cards(cards) => Ok(cards),
        ParsedCards::Invalid { reason } => Err(GenerationError::Unusable { reason }),
    }
}

/// Write cards in order, stopping at the first failure that affects the whole run
#[instrument(skip_all, fields(count = cards.len()))]
pub async fn save_cards(cards: Vec<GeneratedCard>, sink: &dyn FlashcardSink) -> GenerationReport {
    let mut items = Vec::with_capacity(cards.len());
    let mut stop_reason: Option<String> = None;
    let mut created = 0;

    for card in cards {
        let outcome = if stop_reason.is_some() {
            ItemOutcome::Skipped
        } else {
            match sink.create_card(&card).await {
                Ok(flashcard) => {
                    created += 1;
                    ItemOutcome::Created { flashcard }
                }
                Err(e) => {
                    if e.stops_pipeline() {
                        warn!("Stopping generation run: {e}");
                        stop_reason = Some(e.to_string());
                    }
                    ItemOutcome::Failed { reason: e.to_string() }
                }
            }
        };

        items.push(GenerationItem {
            front: card.front,
            back: card.back,
            outcome,
        });
    }

    info!(created, total = items.len(), "Generation run finished");
    GenerationReport {
        items,
        created,
        stop_reason,
    }
}

/// Full server-side run: complete, decode, save
pub async fn generate_flashcards(
    chat: &ChatCompletionClient,
    settings: &GenerationConfig,
    notes: &str,
    sink: &dyn FlashcardSink,
) -> Result<GenerationReport, GenerationError> {
    let request = build_request(settings, notes)?;
    let completion = chat.create_chat_completion(&request).await?;
    let cards = cards_from_completion(&completion)?;
    Ok(save_cards(cards, sink).await)
}
