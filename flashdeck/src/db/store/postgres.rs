use sqlx::PgPool;

use super::FlashcardStore;
use crate::db::errors::{DbError, Result};
use crate::db::handlers::{Flashcards, Repository};
use crate::db::models::flashcards::{FlashcardCreateDBRequest, FlashcardDBResponse, FlashcardFilter, FlashcardUpdateDBRequest};
use crate::types::{FlashcardId, UserId};

/// [`FlashcardStore`] backed by a Postgres pool. Each call acquires one connection and runs a
/// single statement through the [`Flashcards`] repository.
#[derive(Clone)]
pub struct PgFlashcardStore {
    pool: PgPool,
}

impl PgFlashcardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl FlashcardStore for PgFlashcardStore {
    async fn create(&self, owner: UserId, request: &FlashcardCreateDBRequest) -> Result<FlashcardDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Flashcards::new(&mut conn, owner).create(request).await
    }

    async fn get(&self, owner: UserId, id: FlashcardId) -> Result<Option<FlashcardDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Flashcards::new(&mut conn, owner).get_by_id(id).await
    }

    async fn list(&self, owner: UserId, filter: &FlashcardFilter) -> Result<Vec<FlashcardDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Flashcards::new(&mut conn, owner).list(filter).await
    }

    async fn update(
        &self,
        owner: UserId,
        id: FlashcardId,
        request: &FlashcardUpdateDBRequest,
    ) -> Result<Option<FlashcardDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        match Flashcards::new(&mut conn, owner).update(id, request).await {
            Ok(card) => Ok(Some(card)),
            Err(DbError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn soft_delete(&self, owner: UserId, id: FlashcardId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Flashcards::new(&mut conn, owner).delete(id).await
    }
}
