//! Owner-scoped flashcard storage.
//!
//! Handlers never touch a connection directly; they go through [`FlashcardStore`], which takes
//! the requesting user on every call so no operation can cross users.
//!
//! - [`PgFlashcardStore`]: pooled Postgres backend built on the [`Flashcards`] repository
//! - [`InMemoryFlashcardStore`]: process-local backend for tests and local development
//!
//! [`Flashcards`]: crate::db::handlers::Flashcards

mod in_memory;
mod postgres;

pub use in_memory::InMemoryFlashcardStore;
pub use postgres::PgFlashcardStore;

use crate::db::errors::Result;
use crate::db::models::flashcards::{FlashcardCreateDBRequest, FlashcardDBResponse, FlashcardFilter, FlashcardUpdateDBRequest};
use crate::types::{FlashcardId, UserId};

/// Storage interface for flashcards.
///
/// Every method is scoped to `owner`. Reads and writes never see rows belonging to another user,
/// and only `list` with `include_deleted` ever returns soft-deleted rows.
#[async_trait::async_trait]
pub trait FlashcardStore: Send + Sync {
    /// Insert a card for `owner` and return the stored row
    async fn create(&self, owner: UserId, request: &FlashcardCreateDBRequest) -> Result<FlashcardDBResponse>;

    /// Fetch a live card
    async fn get(&self, owner: UserId, id: FlashcardId) -> Result<Option<FlashcardDBResponse>>;

    /// One page of cards ordered by `created_at` in `filter.order`
    async fn list(&self, owner: UserId, filter: &FlashcardFilter) -> Result<Vec<FlashcardDBResponse>>;

    /// Replace the text of a live card; `None` when no live card matched
    async fn update(
        &self,
        owner: UserId,
        id: FlashcardId,
        request: &FlashcardUpdateDBRequest,
    ) -> Result<Option<FlashcardDBResponse>>;

    /// Stamp `deleted_at` on a live card; `false` when nothing matched
    async fn soft_delete(&self, owner: UserId, id: FlashcardId) -> Result<bool>;
}
