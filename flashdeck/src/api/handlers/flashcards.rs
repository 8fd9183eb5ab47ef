use crate::{
    AppState,
    api::models::flashcards::{
        FlashcardCreate, FlashcardListResponse, FlashcardResponse, FlashcardUpdate, FlashcardUpdateResponse, ListFlashcardsQuery,
        MessageResponse,
    },
    auth::CurrentUser,
    errors::{Error, Result},
    types::{FlashcardId, abbrev_uuid},
};
use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use tracing::{debug, instrument};
use uuid::Uuid;

fn parse_flashcard_id(raw: &str) -> Result<FlashcardId> {
    Uuid::parse_str(raw).map_err(|_| Error::Validation {
        message: "Invalid flashcard id.".to_string(),
        details: None,
    })
}

fn flashcard_not_found(id: FlashcardId) -> Error {
    Error::NotFound {
        resource: "Flashcard".to_string(),
        id: id.to_string(),
    }
}

/// List the current user's flashcards, newest first by default.
#[utoipa::path(
    get,
    path = "/api/flashcards",
    tag = "flashcards",
    summary = "List flashcards",
    description = "Cursor-paginated list of the caller's flashcards. Pass `next_cursor` back as `cursor` for the next page.",
    params(ListFlashcardsQuery),
    responses(
        (status = 200, description = "One page of flashcards", body = FlashcardListResponse),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 422, description = "Invalid query parameters"),
        (status = 500, description = "Failed to load flashcards"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn list_flashcards(
    State(state): State<AppState>,
    current_user: CurrentUser,
    query: std::result::Result<Query<ListFlashcardsQuery>, QueryRejection>,
) -> Result<Json<FlashcardListResponse>> {
    let Query(query) = query?;
    let filter = query.into_filter().map_err(Error::validation)?;

    let rows = state
        .flashcards
        .list(current_user.id, &filter)
        .await
        .map_err(Error::storage("load flashcards"))?;

    debug!(count = rows.len(), "Listed flashcards");
    Ok(Json(FlashcardListResponse::from_page(rows, filter.limit)))
}

/// Create a flashcard for the current user.
#[utoipa::path(
    post,
    path = "/api/flashcards",
    tag = "flashcards",
    summary = "Create flashcard",
    request_body = FlashcardCreate,
    responses(
        (status = 201, description = "Flashcard created", body = FlashcardResponse),
        (status = 400, description = "Malformed JSON body"),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "Failed to create flashcard"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn create_flashcard(
    State(state): State<AppState>,
    current_user: CurrentUser,
    payload: std::result::Result<Json<FlashcardCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<FlashcardResponse>)> {
    let Json(data) = payload?;
    let request = data.validate().map_err(Error::validation)?;

    let card = state
        .flashcards
        .create(current_user.id, &request)
        .await
        .map_err(Error::storage("create flashcard"))?;

    Ok((StatusCode::CREATED, Json(FlashcardResponse::from(card))))
}

/// Fetch one of the current user's flashcards.
#[utoipa::path(
    get,
    path = "/api/flashcards/{id}",
    tag = "flashcards",
    summary = "Get flashcard",
    params(("id" = String, Path, description = "Flashcard ID (UUID)")),
    responses(
        (status = 200, description = "The flashcard", body = FlashcardResponse),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 404, description = "Flashcard not found"),
        (status = 422, description = "Invalid flashcard id"),
        (status = 500, description = "Failed to load flashcard"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn get_flashcard(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<FlashcardResponse>> {
    let id = parse_flashcard_id(&id)?;

    let card = state
        .flashcards
        .get(current_user.id, id)
        .await
        .map_err(Error::storage("load flashcard"))?
        .ok_or_else(|| flashcard_not_found(id))?;

    Ok(Json(FlashcardResponse::from(card)))
}

/// Replace the front and back of a flashcard.
#[utoipa::path(
    patch,
    path = "/api/flashcards/{id}",
    tag = "flashcards",
    summary = "Update flashcard",
    params(("id" = String, Path, description = "Flashcard ID (UUID)")),
    request_body = FlashcardUpdate,
    responses(
        (status = 200, description = "Flashcard updated", body = FlashcardUpdateResponse),
        (status = 400, description = "Malformed JSON body"),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 404, description = "Flashcard not found"),
        (status = 422, description = "Invalid flashcard id or validation failed"),
        (status = 500, description = "Failed to update flashcard"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn update_flashcard(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
    payload: std::result::Result<Json<FlashcardUpdate>, JsonRejection>,
) -> Result<Json<FlashcardUpdateResponse>> {
    let id = parse_flashcard_id(&id)?;
    let Json(data) = payload?;
    let request = data.validate().map_err(Error::validation)?;

    let card = state
        .flashcards
        .update(current_user.id, id, &request)
        .await
        .map_err(Error::storage("update flashcard"))?
        .ok_or_else(|| flashcard_not_found(id))?;

    Ok(Json(FlashcardUpdateResponse::from(card)))
}

/// Soft-delete a flashcard.
#[utoipa::path(
    delete,
    path = "/api/flashcards/{id}",
    tag = "flashcards",
    summary = "Delete flashcard",
    params(("id" = String, Path, description = "Flashcard ID (UUID)")),
    responses(
        (status = 200, description = "Flashcard deleted", body = MessageResponse),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 404, description = "Flashcard not found or already deleted"),
        (status = 422, description = "Invalid flashcard id"),
        (status = 500, description = "Failed to delete flashcard"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&current_user.id)))]
pub async fn delete_flashcard(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_flashcard_id(&id)?;

    let deleted = state
        .flashcards
        .soft_delete(current_user.id, id)
        .await
        .map_err(Error::storage("delete flashcard"))?;
    if !deleted {
        return Err(flashcard_not_found(id));
    }

    Ok(Json(MessageResponse {
        message: "Deleted.".to_string(),
    }))
}
