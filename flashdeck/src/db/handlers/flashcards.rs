use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::flashcards::{
    FlashcardCreateDBRequest, FlashcardDBResponse, FlashcardFilter, FlashcardUpdateDBRequest, SortOrder, SourceType,
};
use crate::types::{FlashcardId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const FLASHCARD_COLUMNS: &str =
    "id, user_id, front, back, source_type, source_generation_card_id, created_at, updated_at, deleted_at";

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Flashcard {
    pub id: FlashcardId,
    pub user_id: UserId,
    pub front: String,
    pub back: String,
    pub source_type: String,
    pub source_generation_card_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Flashcard> for FlashcardDBResponse {
    fn from(card: Flashcard) -> Self {
        Self {
            id: card.id,
            user_id: card.user_id,
            front: card.front,
            back: card.back,
            source_type: SourceType::from_stored(&card.source_type),
            source_generation_card_id: card.source_generation_card_id,
            created_at: card.created_at,
            updated_at: card.updated_at,
            deleted_at: card.deleted_at,
        }
    }
}

/// Escape `%`, `_` and the escape character itself for use inside an ILIKE pattern
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Flashcards repository. Every query is restricted to the owner passed at construction.
pub struct Flashcards<'c> {
    db: &'c mut PgConnection,
    owner: UserId,
}

impl<'c> Flashcards<'c> {
    pub fn new(db: &'c mut PgConnection, owner: UserId) -> Self {
        Self { db, owner }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Flashcards<'c> {
    type CreateRequest = FlashcardCreateDBRequest;
    type UpdateRequest = FlashcardUpdateDBRequest;
    type Response = FlashcardDBResponse;
    type Id = FlashcardId;
    type Filter = FlashcardFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&self.owner), source_type = request.source_type.as_str()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let card = sqlx::query_as::<_, Flashcard>(&format!(
            "INSERT INTO flashcards (user_id, front, back, source_type, source_generation_card_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {FLASHCARD_COLUMNS}"
        ))
        .bind(self.owner)
        .bind(&request.front)
        .bind(&request.back)
        .bind(request.source_type.as_str())
        .bind(request.source_generation_card_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(card.into())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&self.owner), flashcard_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let card = sqlx::query_as::<_, Flashcard>(&format!(
            "SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(self.owner)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(card.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&self.owner), limit = filter.limit), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE user_id = "));
        query.push_bind(self.owner);

        if !filter.include_deleted {
            query.push(" AND deleted_at IS NULL");
        }

        if let Some(source_type) = filter.source_type {
            query.push(" AND source_type = ");
            query.push_bind(source_type.as_str());
        }

        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", escape_like(search));
            query.push(" AND (front ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR back ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        if let Some(cursor) = filter.cursor {
            query.push(match filter.order {
                SortOrder::Asc => " AND created_at > ",
                SortOrder::Desc => " AND created_at < ",
            });
            query.push_bind(cursor);
        }

        let direction = filter.order.as_sql();
        query.push(format!(" ORDER BY created_at {direction}, id {direction} LIMIT "));
        query.push_bind(filter.limit);

        let cards = query.build_query_as::<Flashcard>().fetch_all(&mut *self.db).await?;

        Ok(cards.into_iter().map(Into::into).collect())
    }

    /// Soft delete: stamps `deleted_at` on a live row owned by this user.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&self.owner), flashcard_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("UPDATE flashcards SET deleted_at = NOW() WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL")
            .bind(id)
            .bind(self.owner)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&self.owner), flashcard_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let card = sqlx::query_as::<_, Flashcard>(&format!(
            "UPDATE flashcards SET front = $1, back = $2, updated_at = NOW()
             WHERE id = $3 AND user_id = $4 AND deleted_at IS NULL
             RETURNING {FLASHCARD_COLUMNS}"
        ))
        .bind(&request.front)
        .bind(&request.back)
        .bind(id)
        .bind(self.owner)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(card.into())
    }
}
