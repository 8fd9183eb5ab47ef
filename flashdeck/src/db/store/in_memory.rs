//! In-memory flashcard storage.
//!
//! Cards live in a shared map and are lost on restart. Suitable for tests and for running the
//! service without a database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::FlashcardStore;
use crate::db::errors::Result;
use crate::db::models::flashcards::{
    FlashcardCreateDBRequest, FlashcardDBResponse, FlashcardFilter, FlashcardUpdateDBRequest, SortOrder,
};
use crate::types::{FlashcardId, UserId};

#[derive(Default)]
struct Inner {
    cards: HashMap<FlashcardId, FlashcardDBResponse>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Strictly increasing timestamps so cursor pagination stays deterministic
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(next);
        next
    }
}

/// In-memory implementation of [`FlashcardStore`].
///
/// # Example
/// ```ignore
/// let store = InMemoryFlashcardStore::new();
/// let card = store.create(user_id, &request).await?;
/// assert!(store.get(user_id, card.id).await?.is_some());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryFlashcardStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryFlashcardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows across all users, including soft-deleted ones
    pub fn len(&self) -> usize {
        self.inner.read().cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl FlashcardStore for InMemoryFlashcardStore {
    async fn create(&self, owner: UserId, request: &FlashcardCreateDBRequest) -> Result<FlashcardDBResponse> {
        let mut inner = self.inner.write();
        let now = inner.next_timestamp();
        let card = FlashcardDBResponse {
            id: Uuid::new_v4(),
            user_id: owner,
            front: request.front.clone(),
            back: request.back.clone(),
            source_type: request.source_type,
            source_generation_card_id: request.source_generation_card_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn get(&self, owner: UserId, id: FlashcardId) -> Result<Option<FlashcardDBResponse>> {
        let inner = self.inner.read();
        Ok(inner
            .cards
            .get(&id)
            .filter(|card| card.user_id == owner && card.deleted_at.is_none())
            .cloned())
    }

    async fn list(&self, owner: UserId, filter: &FlashcardFilter) -> Result<Vec<FlashcardDBResponse>> {
        let inner = self.inner.read();
        let mut cards: Vec<FlashcardDBResponse> = inner
            .cards
            .values()
            .filter(|card| card.user_id == owner && filter.matches(card))
            .cloned()
            .collect();

        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if filter.order == SortOrder::Desc {
            cards.reverse();
        }
        cards.truncate(usize::try_from(filter.limit).unwrap_or(0));
        Ok(cards)
    }

    async fn update(
        &self,
        owner: UserId,
        id: FlashcardId,
        request: &FlashcardUpdateDBRequest,
    ) -> Result<Option<FlashcardDBResponse>> {
        let mut inner = self.inner.write();
        let now = inner.next_timestamp();
        let Some(card) = inner
            .cards
            .get_mut(&id)
            .filter(|card| card.user_id == owner && card.deleted_at.is_none())
        else {
            return Ok(None);
        };

        card.front = request.front.clone();
        card.back = request.back.clone();
        card.updated_at = now;
        Ok(Some(card.clone()))
    }

    async fn soft_delete(&self, owner: UserId, id: FlashcardId) -> Result<bool> {
        let mut inner = self.inner.write();
        let now = inner.next_timestamp();
        match inner
            .cards
            .get_mut(&id)
            .filter(|card| card.user_id == owner && card.deleted_at.is_none())
        {
            Some(card) => {
                card.deleted_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
