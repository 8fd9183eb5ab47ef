use std::sync::Arc;

use crate::{
    AppState,
    api::models::{flashcards::FlashcardResponse, generation::GenerateRequest},
    auth::CurrentUser,
    chat::{ChatError, ChatErrorKind},
    db::{
        models::flashcards::{FlashcardCreateDBRequest, SourceType},
        store::FlashcardStore,
    },
    errors::{Error, Result},
    generation::{FlashcardSink, GeneratedCard, GenerationError, GenerationReport, SinkError, generate_flashcards},
    types::{UserId, abbrev_uuid},
};
use async_trait::async_trait;
use axum::{extract::State, extract::rejection::JsonRejection, response::Json};
use tracing::{error, instrument};

/// Writes generated cards into the store on behalf of one user
struct StoreSink {
    store: Arc<dyn FlashcardStore>,
    owner: UserId,
}

#[async_trait]
impl FlashcardSink for StoreSink {
    async fn create_card(&self, card: &GeneratedCard) -> std::result::Result<FlashcardResponse, SinkError> {
        let request = FlashcardCreateDBRequest {
            front: card.front.clone(),
            back: card.back.clone(),
            source_type: SourceType::Ai,
            source_generation_card_id: None,
        };

        match self.store.create(self.owner, &request).await {
            Ok(row) => Ok(row.into()),
            Err(e) => {
                error!("Failed to store generated flashcard: {e:#}");
                Err(SinkError::Failed {
                    message: "Failed to create flashcard.".to_string(),
                })
            }
        }
    }
}

impl From<GenerationError> for Error {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::EmptyNotes | GenerationError::NotesTooLong { .. } => Error::validation(vec![err.to_string()]),
            GenerationError::Chat(chat_err) => Error::Upstream(chat_err),
            // The provider answered but nothing usable came back
            GenerationError::EmptyResponse | GenerationError::Unusable { .. } => Error::Upstream(ChatError {
                kind: ChatErrorKind::Upstream,
                message: err.to_string(),
                status: None,
                code: None,
                details: None,
            }),
        }
    }
}

/// Generate flashcards from notes and save them for the current user
#[utoipa::path(
    post,
    path = "/api/flashcards/generate",
    request_body = GenerateRequest,
    tag = "flashcards",
    summary = "Generate flashcards",
    description = "Ask the configured model for flashcards covering the notes, then save each one with `source_type = ai`. \
Saving stops at the first storage failure; the report lists every card as created, failed or skipped.",
    responses(
        (status = 200, description = "Per-card outcome of the run", body = GenerationReport),
        (status = 400, description = "Malformed JSON"),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 422, description = "Notes missing or too long"),
        (status = 500, description = "OpenRouter API key is not configured"),
        (status = 502, description = "The model response could not be used"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn generate(
    State(state): State<AppState>,
    current_user: CurrentUser,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerationReport>> {
    let Json(request) = payload?;
    let Some(chat) = state.chat.as_ref() else {
        return Err(Error::Misconfigured {
            message: "OpenRouter API key is not configured.".to_string(),
        });
    };

    let sink = StoreSink {
        store: state.flashcards.clone(),
        owner: current_user.id,
    };
    let notes = request.notes.unwrap_or_default();
    let report = generate_flashcards(chat, &state.config.generation, &notes, &sink).await?;

    Ok(Json(report))
}
